// ==========================================
// 蛋鸡场运营 ERP - 日常活动 API
// ==========================================
// 职责: 生产日志、饲料批次、运营成本、库存的录入与查询
// 说明: 录入边界负责校验, 下游引擎假定数据已合法
// ==========================================

use std::path::Path;
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::api::params::{
    parse_date_param, parse_month_param, require_non_empty, require_non_negative,
};
use crate::domain::activity::{DailyLog, FeedBatch};
use crate::domain::cost::OperatingCost;
use crate::domain::inventory::InventoryItem;
use crate::importer::{DailyLogCsvImporter, DailyLogImportReport};
use crate::repository::{
    DailyLogRepository, FeedBatchRepository, InventoryRepository, OperatingCostRepository,
};

pub struct ActivityApi {
    daily_log_repo: Arc<DailyLogRepository>,
    feed_batch_repo: Arc<FeedBatchRepository>,
    operating_cost_repo: Arc<OperatingCostRepository>,
    inventory_repo: Arc<InventoryRepository>,
    importer: DailyLogCsvImporter,
}

impl ActivityApi {
    pub fn new(
        daily_log_repo: Arc<DailyLogRepository>,
        feed_batch_repo: Arc<FeedBatchRepository>,
        operating_cost_repo: Arc<OperatingCostRepository>,
        inventory_repo: Arc<InventoryRepository>,
    ) -> Self {
        let importer = DailyLogCsvImporter::new(daily_log_repo.clone());
        Self {
            daily_log_repo,
            feed_batch_repo,
            operating_cost_repo,
            inventory_repo,
            importer,
        }
    }

    // ===== 生产日志 =====

    /// 录入生产日志（同日期同鸡舍覆写）
    ///
    /// # 校验
    /// - 各计数非负, 饲料量非负
    /// - eggs_total == A + B + C
    pub fn record_daily_log(&self, log: &DailyLog) -> ApiResult<i64> {
        for (field, value) in [
            ("产蛋总数", log.eggs_total),
            ("A级蛋", log.eggs_grade_a),
            ("B级蛋", log.eggs_grade_b),
            ("C级蛋", log.eggs_grade_c),
            ("死亡数", log.mortality_count),
        ] {
            if value < 0 {
                return Err(ApiError::InvalidInput(format!("{}不能为负数: {}", field, value)));
            }
        }
        require_non_negative("饲料量", log.feed_given_kg)?;

        if !log.grades_consistent() {
            return Err(ApiError::ValidationError(format!(
                "分级合计不一致: 总数{}，A+B+C={}",
                log.eggs_total,
                log.eggs_grade_a + log.eggs_grade_b + log.eggs_grade_c
            )));
        }

        let log_id = self.daily_log_repo.upsert(log)?;
        tracing::debug!(log_id, log_date = %log.log_date, "生产日志已保存");
        Ok(log_id)
    }

    pub fn delete_daily_log(&self, log_id: i64) -> ApiResult<()> {
        self.daily_log_repo.delete(log_id)?;
        Ok(())
    }

    pub fn list_daily_logs(&self, start_date: &str, end_date: &str) -> ApiResult<Vec<DailyLog>> {
        let start = parse_date_param("开始日期", start_date)?;
        let end = parse_date_param("结束日期", end_date)?;
        if start > end {
            return Err(ApiError::InvalidInput(format!(
                "开始日期{}晚于结束日期{}",
                start, end
            )));
        }
        Ok(self.daily_log_repo.find_by_date_range(start, end)?)
    }

    /// 从 CSV 批量导入生产日志
    pub fn import_daily_logs_csv(&self, path: &Path) -> ApiResult<DailyLogImportReport> {
        Ok(self.importer.import_file(path)?)
    }

    // ===== 饲料批次 =====

    pub fn record_feed_batch(&self, batch: &FeedBatch) -> ApiResult<i64> {
        require_non_negative("批量", batch.batch_size_kg)?;
        require_non_negative("单价", batch.cost_per_kg)?;
        Ok(self.feed_batch_repo.insert(batch)?)
    }

    pub fn list_feed_batches(&self) -> ApiResult<Vec<FeedBatch>> {
        Ok(self.feed_batch_repo.list_all()?)
    }

    // ===== 月度运营成本 =====

    /// 录入月度运营成本（同月覆写）, 合计由各分项求和
    pub fn upsert_operating_cost(
        &self,
        month: &str,
        electricity: f64,
        water: f64,
        maintenance: f64,
        other: f64,
    ) -> ApiResult<OperatingCost> {
        let month = parse_month_param(month)?;
        require_non_negative("电费", electricity)?;
        require_non_negative("水费", water)?;
        require_non_negative("维修费", maintenance)?;
        require_non_negative("其他费用", other)?;

        let cost = OperatingCost::from_components(&month, electricity, water, maintenance, other);
        self.operating_cost_repo.upsert(&cost)?;
        Ok(cost)
    }

    pub fn get_operating_cost(&self, month: &str) -> ApiResult<Option<OperatingCost>> {
        let month = parse_month_param(month)?;
        Ok(self.operating_cost_repo.find_by_month(&month)?)
    }

    // ===== 库存 =====

    pub fn upsert_inventory_item(&self, item: &InventoryItem) -> ApiResult<()> {
        require_non_empty("物料ID", &item.item_id)?;
        require_non_empty("物料名称", &item.name)?;
        require_non_negative("库存", item.current_stock)?;
        if let Some(rp) = item.reorder_point {
            require_non_negative("再订货点", rp)?;
        }
        self.inventory_repo.upsert(item)?;
        Ok(())
    }

    pub fn list_inventory_items(&self) -> ApiResult<Vec<InventoryItem>> {
        Ok(self.inventory_repo.find_all()?)
    }

    /// 出入库调整（入库为正、出库为负）
    ///
    /// 调整后库存不得为负
    pub fn adjust_stock(&self, item_id: &str, delta: f64) -> ApiResult<f64> {
        require_non_empty("物料ID", item_id)?;
        if !delta.is_finite() {
            return Err(ApiError::InvalidInput(format!("调整量无效: {}", delta)));
        }

        let item = self
            .inventory_repo
            .find_by_id(item_id)?
            .ok_or_else(|| ApiError::NotFound(format!("物料(id={})不存在", item_id)))?;
        if item.current_stock + delta < 0.0 {
            return Err(ApiError::BusinessRuleViolation(format!(
                "库存不足: {} 当前 {} {}，出库 {}",
                item.name,
                item.current_stock,
                item.unit,
                -delta
            )));
        }

        Ok(self.inventory_repo.adjust_stock(item_id, delta)?)
    }
}
