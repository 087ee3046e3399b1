// ==========================================
// 蛋鸡场运营 ERP - 引擎层
// ==========================================
// 职责: 成本分摊、阈值告警、工资汇总
// 红线: Engine 不拼 SQL, 数据访问只经由 data_source trait
// ==========================================

pub mod cost_allocation;
pub mod data_source;
pub mod dedup;
pub mod error;
pub mod notification;
pub mod payroll;
pub mod repositories;
pub mod threshold_alert;

// 重导出核心引擎
pub use cost_allocation::{CostAllocationEngine, CostEngineConfig};
pub use data_source::{AlertDataSource, CostDataSource, PayrollDataSource};
pub use dedup::{AlertDedupStore, InMemoryDedupStore};
pub use error::{EngineError, EngineResult};
pub use notification::{
    DispatchError, DispatchQueue, LoggingDispatcher, NoOpDispatcher, NotificationDispatcher,
};
pub use payroll::{PayrollEngine, PayrollRunResult};
pub use repositories::FarmRepositories;
pub use threshold_alert::{AlertEngineConfig, AlertPassResult, ThresholdAlertEngine};
