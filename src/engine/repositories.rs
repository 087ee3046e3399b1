// ==========================================
// 蛋鸡场运营 ERP - 引擎层仓储聚合
// ==========================================
// 职责: 聚合引擎所需的所有 Repository，并实现引擎数据源 trait
// ==========================================

use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;

use crate::domain::activity::{DailyLog, FeedBatch};
use crate::domain::alert::{Alert, AlertThreshold, NewAlert};
use crate::domain::cost::{DailyCost, OperatingCost};
use crate::domain::inventory::InventoryItem;
use crate::domain::payroll::{Laborer, MonthlyPayroll, WorkAssignment};
use crate::engine::data_source::{AlertDataSource, CostDataSource, PayrollDataSource};
use crate::repository::{
    AlertRepository, AlertThresholdRepository, DailyCostRepository, DailyLogRepository,
    FeedBatchRepository, InventoryRepository, OperatingCostRepository, PayrollRepository,
    RepositoryResult,
};

/// 农场仓储集合
///
/// 所有仓储共享同一个连接
#[derive(Clone)]
pub struct FarmRepositories {
    pub daily_log_repo: Arc<DailyLogRepository>,
    pub feed_batch_repo: Arc<FeedBatchRepository>,
    pub operating_cost_repo: Arc<OperatingCostRepository>,
    pub payroll_repo: Arc<PayrollRepository>,
    pub daily_cost_repo: Arc<DailyCostRepository>,
    pub inventory_repo: Arc<InventoryRepository>,
    pub threshold_repo: Arc<AlertThresholdRepository>,
    pub alert_repo: Arc<AlertRepository>,
}

impl FarmRepositories {
    /// 基于共享连接创建全部仓储
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            daily_log_repo: Arc::new(DailyLogRepository::from_connection(conn.clone())),
            feed_batch_repo: Arc::new(FeedBatchRepository::from_connection(conn.clone())),
            operating_cost_repo: Arc::new(OperatingCostRepository::from_connection(conn.clone())),
            payroll_repo: Arc::new(PayrollRepository::from_connection(conn.clone())),
            daily_cost_repo: Arc::new(DailyCostRepository::from_connection(conn.clone())),
            inventory_repo: Arc::new(InventoryRepository::from_connection(conn.clone())),
            threshold_repo: Arc::new(AlertThresholdRepository::from_connection(conn.clone())),
            alert_repo: Arc::new(AlertRepository::from_connection(conn)),
        }
    }
}

impl CostDataSource for FarmRepositories {
    fn get_logs_for_date(&self, date: NaiveDate) -> RepositoryResult<Vec<DailyLog>> {
        self.daily_log_repo.find_by_date(date)
    }

    fn get_recent_batches(
        &self,
        on_or_before: NaiveDate,
        limit: usize,
    ) -> RepositoryResult<Vec<FeedBatch>> {
        self.feed_batch_repo.find_recent_on_or_before(on_or_before, limit)
    }

    fn get_operating_cost(&self, month: &str) -> RepositoryResult<Option<OperatingCost>> {
        self.operating_cost_repo.find_by_month(month)
    }

    fn get_payroll_total(&self, month: &str) -> RepositoryResult<f64> {
        self.payroll_repo.sum_final_salary(month)
    }

    fn upsert_daily_cost(&self, record: &DailyCost) -> RepositoryResult<()> {
        self.daily_cost_repo.upsert(record)
    }
}

impl AlertDataSource for FarmRepositories {
    fn get_inventory_items(&self) -> RepositoryResult<Vec<InventoryItem>> {
        self.inventory_repo.find_all()
    }

    fn get_active_thresholds(&self, type_prefix: &str) -> RepositoryResult<Vec<AlertThreshold>> {
        self.threshold_repo.find_active_by_prefix(type_prefix)
    }

    fn insert_alert(&self, alert: &NewAlert, created_at: NaiveDateTime) -> RepositoryResult<Alert> {
        self.alert_repo.insert(alert, created_at)
    }
}

impl PayrollDataSource for FarmRepositories {
    fn get_active_laborers(&self) -> RepositoryResult<Vec<Laborer>> {
        self.payroll_repo.find_active_laborers()
    }

    fn get_assignments_between(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> RepositoryResult<Vec<WorkAssignment>> {
        self.payroll_repo.find_assignments_in_range(start_date, end_date)
    }

    fn upsert_monthly_payroll(&self, payroll: &MonthlyPayroll) -> RepositoryResult<()> {
        self.payroll_repo.upsert_monthly_payroll(payroll)
    }
}
