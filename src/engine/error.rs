// ==========================================
// 蛋鸡场运营 ERP - 引擎层错误类型
// ==========================================

use crate::repository::error::RepositoryError;
use chrono::NaiveDate;
use thiserror::Error;

/// 引擎层错误类型
///
/// 数据访问错误原样向上传递，引擎不做重试
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("无效日期范围: start={start} 晚于 end={end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("无效月份: {0} (应为 YYYY-MM)")]
    InvalidMonth(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
