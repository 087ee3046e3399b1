// ==========================================
// 蛋鸡场运营 ERP - 导入层
// ==========================================
// 职责: 外部 CSV 文件 → 生产日志
// 流程: 解析 → 逐行校验 → 写入, 坏行记入报告不中断
// ==========================================

pub mod daily_log_csv;
pub mod error;

pub use daily_log_csv::{DailyLogCsvImporter, DailyLogImportReport, RowIssue};
pub use error::{ImportError, ImportResult};
