// ==========================================
// 蛋鸡场运营 ERP - API 参数解析
// ==========================================
// 职责: 外部字符串参数 → 领域类型, 失败统一返回 InvalidInput
// ==========================================

use chrono::NaiveDate;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::calendar::{parse_date, parse_month_key};
use crate::domain::types::AllocationMode;

/// 解析 YYYY-MM-DD 日期参数
pub fn parse_date_param(name: &str, value: &str) -> ApiResult<NaiveDate> {
    parse_date(value).ok_or_else(|| {
        ApiError::InvalidInput(format!("{}格式错误(应为YYYY-MM-DD): {}", name, value))
    })
}

/// 校验 YYYY-MM 月份参数, 返回规整后的月份键
pub fn parse_month_param(value: &str) -> ApiResult<String> {
    match parse_month_key(value) {
        Some(_) => Ok(value.trim().to_string()),
        None => Err(ApiError::InvalidInput(format!(
            "月份格式错误(应为YYYY-MM): {}",
            value
        ))),
    }
}

/// 解析分摊模式, 缺省为 per_egg
pub fn parse_allocation_param(value: Option<&str>) -> ApiResult<AllocationMode> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(AllocationMode::default()),
        Some(raw) => AllocationMode::parse(raw).ok_or_else(|| {
            ApiError::InvalidInput(format!("分摊模式无效(per_egg/per_house): {}", raw))
        }),
    }
}

pub fn require_non_empty(name: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidInput(format!("{}不能为空", name)));
    }
    Ok(())
}

pub fn require_non_negative(name: &str, value: f64) -> ApiResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ApiError::InvalidInput(format!("{}不能为负数: {}", name, value)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_params() {
        assert!(parse_date_param("日期", "2025-08-01").is_ok());
        assert!(matches!(
            parse_date_param("日期", "08/01/2025"),
            Err(ApiError::InvalidInput(_))
        ));
        assert_eq!(parse_month_param(" 2025-08 ").unwrap(), "2025-08");
        assert!(parse_month_param("2025-8").is_err());
        assert_eq!(parse_allocation_param(None).unwrap(), AllocationMode::PerEgg);
        assert_eq!(
            parse_allocation_param(Some("per_house")).unwrap(),
            AllocationMode::PerHouse
        );
        assert!(parse_allocation_param(Some("per_farm")).is_err());
        assert!(require_non_negative("库存", -1.0).is_err());
        assert!(require_non_empty("名称", "  ").is_err());
    }
}
