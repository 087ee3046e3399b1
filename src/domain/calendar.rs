// ==========================================
// 蛋鸡场运营 ERP - 日历工具
// ==========================================
// 月份键格式: YYYY-MM (operating_cost / monthly_payroll 的主键口径)
// ==========================================

use chrono::{Datelike, NaiveDate};

/// 日期格式
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 日期所属月份键 (YYYY-MM)
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// 解析月份键
///
/// # 返回
/// - Some(月初日期)
/// - None: 格式错误
pub fn parse_month_key(month: &str) -> Option<NaiveDate> {
    let (y, m) = month.trim().split_once('-')?;
    if y.len() != 4 || m.len() != 2 {
        return None;
    }
    let year = y.parse::<i32>().ok()?;
    let month = m.parse::<u32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// 当月天数
pub fn days_in_month(date: NaiveDate) -> u32 {
    let (next_year, next_month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(30)
}

/// 月份的首日与末日
pub fn month_bounds(first_day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = first_day.with_day(1).unwrap_or(first_day);
    let last = first
        .with_day(days_in_month(first))
        .unwrap_or(first);
    (first, last)
}

/// 解析 YYYY-MM-DD
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}
