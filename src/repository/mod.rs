// ==========================================
// 蛋鸡场运营 ERP - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod alert_repo;
pub mod daily_cost_repo;
pub mod daily_log_repo;
pub mod error;
pub mod feed_batch_repo;
pub mod inventory_repo;
pub mod operating_cost_repo;
pub mod payroll_repo;
pub mod threshold_repo;

// 重导出核心仓储
pub use alert_repo::AlertRepository;
pub use daily_cost_repo::DailyCostRepository;
pub use daily_log_repo::DailyLogRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use feed_batch_repo::FeedBatchRepository;
pub use inventory_repo::InventoryRepository;
pub use operating_cost_repo::OperatingCostRepository;
pub use payroll_repo::PayrollRepository;
pub use threshold_repo::AlertThresholdRepository;
