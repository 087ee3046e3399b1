// ==========================================
// 蛋鸡场运营 ERP - 引擎数据访问接口
// ==========================================
// 职责: 定义引擎所需的最小数据访问能力，实现依赖倒置
// 说明: Engine 层定义 trait，Repository 聚合 (FarmRepositories) 实现
// ==========================================

use crate::domain::activity::{DailyLog, FeedBatch};
use crate::domain::alert::{Alert, AlertThreshold, NewAlert};
use crate::domain::cost::{DailyCost, OperatingCost};
use crate::domain::inventory::InventoryItem;
use crate::domain::payroll::{Laborer, MonthlyPayroll, WorkAssignment};
use crate::repository::error::RepositoryResult;
use chrono::{NaiveDate, NaiveDateTime};

/// 成本引擎数据源
pub trait CostDataSource: Send + Sync {
    /// 指定日期的全部生产日志
    fn get_logs_for_date(&self, date: NaiveDate) -> RepositoryResult<Vec<DailyLog>>;

    /// 不晚于指定日期的最近 limit 个饲料批次（日期倒序）
    fn get_recent_batches(
        &self,
        on_or_before: NaiveDate,
        limit: usize,
    ) -> RepositoryResult<Vec<FeedBatch>>;

    /// 月度运营成本（无记录返回 None）
    fn get_operating_cost(&self, month: &str) -> RepositoryResult<Option<OperatingCost>>;

    /// 月度实发工资合计（无记录返回 0）
    fn get_payroll_total(&self, month: &str) -> RepositoryResult<f64>;

    /// 按日期幂等写入日成本
    fn upsert_daily_cost(&self, record: &DailyCost) -> RepositoryResult<()>;
}

/// 告警引擎数据源
pub trait AlertDataSource: Send + Sync {
    fn get_inventory_items(&self) -> RepositoryResult<Vec<InventoryItem>>;

    /// 启用中且类型以 type_prefix 开头的阈值
    fn get_active_thresholds(&self, type_prefix: &str) -> RepositoryResult<Vec<AlertThreshold>>;

    fn insert_alert(&self, alert: &NewAlert, created_at: NaiveDateTime) -> RepositoryResult<Alert>;
}

/// 工资汇总数据源
pub trait PayrollDataSource: Send + Sync {
    fn get_active_laborers(&self) -> RepositoryResult<Vec<Laborer>>;

    /// 日期范围内（含两端）的考勤记录
    fn get_assignments_between(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> RepositoryResult<Vec<WorkAssignment>>;

    fn upsert_monthly_payroll(&self, payroll: &MonthlyPayroll) -> RepositoryResult<()>;
}
