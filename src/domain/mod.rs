// ==========================================
// 蛋鸡场运营 ERP - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod activity;
pub mod alert;
pub mod calendar;
pub mod cost;
pub mod inventory;
pub mod payroll;
pub mod types;

// 重导出核心类型
pub use activity::{DailyLog, FeedBatch};
pub use alert::{Alert, AlertThreshold, NewAlert};
pub use cost::{DailyCost, DailyCostResult, HouseAllocation, OperatingCost};
pub use inventory::InventoryItem;
pub use payroll::{Laborer, MonthlyPayroll, WorkAssignment};
pub use types::{AllocationMode, AttendanceStatus, ComparisonType, ThresholdKind};
