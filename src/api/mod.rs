// ==========================================
// 蛋鸡场运营 ERP - API 层
// ==========================================
// 职责: 参数校验 + 调用引擎/仓储, 供 CLI 或上层服务调用
// ==========================================

pub mod activity_api;
pub mod alert_api;
pub mod cost_api;
pub mod error;
pub mod params;
pub mod payroll_api;

// 重导出核心类型
pub use activity_api::ActivityApi;
pub use alert_api::AlertApi;
pub use cost_api::CostApi;
pub use error::{ApiError, ApiResult};
pub use payroll_api::PayrollApi;
