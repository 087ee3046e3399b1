// ==========================================
// 蛋鸡场运营 ERP - 告警 API
// ==========================================
// 职责: 触发阈值评估、告警列表/已读、阈值维护
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::api::params::{require_non_empty, require_non_negative};
use crate::domain::alert::{Alert, AlertThreshold};
use crate::domain::types::ComparisonType;
use crate::engine::{AlertPassResult, ThresholdAlertEngine};
use crate::repository::{AlertRepository, AlertThresholdRepository};

/// 告警列表默认条数
pub const DEFAULT_ALERT_LIST_LIMIT: usize = 100;

pub struct AlertApi {
    engine: Arc<ThresholdAlertEngine>,
    alert_repo: Arc<AlertRepository>,
    threshold_repo: Arc<AlertThresholdRepository>,
}

impl AlertApi {
    pub fn new(
        engine: Arc<ThresholdAlertEngine>,
        alert_repo: Arc<AlertRepository>,
        threshold_repo: Arc<AlertThresholdRepository>,
    ) -> Self {
        Self {
            engine,
            alert_repo,
            threshold_repo,
        }
    }

    /// 立即执行一次阈值评估
    pub fn evaluate_alerts(&self) -> ApiResult<AlertPassResult> {
        Ok(self.engine.evaluate_now()?)
    }

    /// 等待本进程已提交的告警外发全部完成
    pub async fn flush_notifications(&self) -> usize {
        self.engine.flush_dispatches().await
    }

    /// 告警列表（按创建时间倒序）
    pub fn list_alerts(&self, unread_only: bool, limit: Option<usize>) -> ApiResult<Vec<Alert>> {
        let limit = limit.unwrap_or(DEFAULT_ALERT_LIST_LIMIT);
        if limit == 0 {
            return Err(ApiError::InvalidInput("limit必须大于0".to_string()));
        }
        Ok(self.alert_repo.list(unread_only, limit)?)
    }

    pub fn mark_alert_read(&self, alert_id: &str) -> ApiResult<()> {
        require_non_empty("告警ID", alert_id)?;
        self.alert_repo.mark_read(alert_id.trim())?;
        tracing::info!(alert_id, "告警已标记为已读");
        Ok(())
    }

    /// 全部标记已读, 返回本次标记条数
    pub fn mark_all_read(&self) -> ApiResult<usize> {
        let affected = self.alert_repo.mark_all_read()?;
        tracing::info!(affected, "全部告警已标记为已读");
        Ok(affected)
    }

    // ===== 阈值维护 =====

    /// 新增阈值
    ///
    /// 比较方式目前只有 lte 会参与判定, 其他取值会被保存但永不命中
    pub fn create_threshold(
        &self,
        threshold_type: &str,
        threshold_value: f64,
        comparison_type: &str,
        alert_level: &str,
    ) -> ApiResult<i64> {
        require_non_empty("阈值类型", threshold_type)?;
        require_non_empty("比较方式", comparison_type)?;
        require_non_empty("告警级别", alert_level)?;
        require_non_negative("阈值", threshold_value)?;

        if let ComparisonType::Unsupported(raw) = ComparisonType::parse(comparison_type) {
            tracing::warn!(
                threshold_type,
                comparison = %raw,
                "阈值比较方式暂不支持, 该阈值不会触发告警"
            );
        }

        let id = self.threshold_repo.insert(
            threshold_type.trim(),
            threshold_value,
            comparison_type.trim(),
            alert_level.trim(),
        )?;
        tracing::info!(threshold_id = id, threshold_type, threshold_value, "阈值已创建");
        Ok(id)
    }

    pub fn set_threshold_active(&self, threshold_id: i64, is_active: bool) -> ApiResult<()> {
        self.threshold_repo.set_active(threshold_id, is_active)?;
        Ok(())
    }

    pub fn list_thresholds(&self) -> ApiResult<Vec<AlertThreshold>> {
        Ok(self.threshold_repo.list_all()?)
    }
}
