// ==========================================
// 蛋鸡场运营 ERP - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 核心: 日成本分摊 + 库存阈值告警 + 月度工资汇总
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{AllocationMode, AttendanceStatus, ComparisonType, ThresholdKind};

// 领域实体
pub use domain::{
    Alert, AlertThreshold, DailyCost, DailyCostResult, DailyLog, FeedBatch, HouseAllocation,
    InventoryItem, Laborer, MonthlyPayroll, NewAlert, OperatingCost, WorkAssignment,
};

// 引擎
pub use engine::{
    AlertEngineConfig, AlertPassResult, CostAllocationEngine, CostEngineConfig, PayrollEngine,
    ThresholdAlertEngine,
};

// API
pub use api::{ActivityApi, AlertApi, CostApi, PayrollApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "蛋鸡场运营 ERP";
