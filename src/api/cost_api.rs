// ==========================================
// 蛋鸡场运营 ERP - 成本 API
// ==========================================
// 职责: 日成本计算、范围重算、已存结果查询
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::api::params::{parse_allocation_param, parse_date_param};
use crate::domain::cost::{DailyCost, DailyCostResult};
use crate::engine::CostAllocationEngine;
use crate::repository::DailyCostRepository;

pub struct CostApi {
    engine: Arc<CostAllocationEngine>,
    daily_cost_repo: Arc<DailyCostRepository>,
}

impl CostApi {
    pub fn new(engine: Arc<CostAllocationEngine>, daily_cost_repo: Arc<DailyCostRepository>) -> Self {
        Self {
            engine,
            daily_cost_repo,
        }
    }

    /// 计算并写入单日成本
    ///
    /// # 参数
    /// - date: YYYY-MM-DD
    /// - allocation: per_egg / per_house, 缺省 per_egg
    pub fn compute_daily_cost(
        &self,
        date: &str,
        allocation: Option<&str>,
    ) -> ApiResult<DailyCostResult> {
        let date = parse_date_param("日期", date)?;
        let allocation = parse_allocation_param(allocation)?;
        Ok(self.engine.compute_daily_cost(date, allocation)?)
    }

    /// 按日期范围重算（含两端）
    pub fn recalculate_range(
        &self,
        start_date: &str,
        end_date: &str,
        allocation: Option<&str>,
    ) -> ApiResult<Vec<DailyCostResult>> {
        let start = parse_date_param("开始日期", start_date)?;
        let end = parse_date_param("结束日期", end_date)?;
        let allocation = parse_allocation_param(allocation)?;
        Ok(self.engine.recalculate_range(start, end, allocation)?)
    }

    /// 查询已写入的日成本
    pub fn get_daily_cost(&self, date: &str) -> ApiResult<DailyCost> {
        let parsed = parse_date_param("日期", date)?;
        self.daily_cost_repo
            .find_by_date(parsed)?
            .ok_or_else(|| ApiError::NotFound(format!("日成本(date={})不存在", parsed)))
    }

    pub fn list_daily_costs(&self, start_date: &str, end_date: &str) -> ApiResult<Vec<DailyCost>> {
        let start = parse_date_param("开始日期", start_date)?;
        let end = parse_date_param("结束日期", end_date)?;
        if start > end {
            return Err(ApiError::InvalidInput(format!(
                "开始日期{}晚于结束日期{}",
                start, end
            )));
        }
        Ok(self.daily_cost_repo.find_by_date_range(start, end)?)
    }
}
