// ==========================================
// 蛋鸡场运营 ERP - 阈值告警引擎
// ==========================================
// 职责: 库存快照 × 阈值 → 去重后的低库存告警
// 输入: 库存物料 + 启用中的 low_stock 阈值
// 输出: alert 表 (未读) + 通知分发 (发出即忘)
// ==========================================
// 流程 (单次评估):
// 1. 清除去重窗口外的标记
// 2. 逐 (阈值, 物料) 判定是否命中
// 3. 命中后检查并标记去重 key, 加入候选 (受单次上限约束)
// 4. 逐条持久化; 失败记日志并释放 key
// 5. 已持久化的告警交给分发队列 (运行时内后台发送, 运行时外同步发送)
// ==========================================
// 说明: 超出上限的命中不做标记, 写入失败的告警释放 key,
//       两者都会在下一次评估时重试
// ==========================================

use crate::domain::alert::{Alert, AlertThreshold, NewAlert};
use crate::domain::inventory::InventoryItem;
use crate::domain::types::{ComparisonType, ThresholdKind};
use crate::engine::data_source::AlertDataSource;
use crate::engine::dedup::AlertDedupStore;
use crate::engine::error::EngineResult;
use crate::engine::notification::{DispatchQueue, NotificationDispatcher};
use chrono::{Duration, NaiveDateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;

/// 低库存告警类型
pub const LOW_STOCK_ALERT_TYPE: &str = "low_stock";

// ==========================================
// AlertEngineConfig - 告警引擎配置
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct AlertEngineConfig {
    pub dedup_window: Duration,         // 去重窗口: 60 分钟
    pub max_alerts_per_pass: usize,     // 单次评估告警上限: 20
    pub low_stock_type_prefix: String,  // 参与评估的阈值类型前缀
}

impl Default for AlertEngineConfig {
    fn default() -> Self {
        Self {
            dedup_window: Duration::minutes(60),
            max_alerts_per_pass: 20,
            low_stock_type_prefix: "low_stock".to_string(),
        }
    }
}

// ==========================================
// AlertPassResult - 单次评估结果
// ==========================================
#[derive(Debug, Clone, Default, Serialize)]
pub struct AlertPassResult {
    pub evaluated_pairs: usize,     // 参与判定的 (阈值, 物料) 组合数
    pub breaches: usize,            // 命中数
    pub suppressed: usize,          // 因去重跳过
    pub capped: usize,              // 超出单次上限, 留待下次评估
    pub failed: usize,              // 持久化失败
    pub dispatched: usize,          // 已提交分发
    pub alerts_created: Vec<Alert>,
}

// ==========================================
// 判定函数
// ==========================================

/// 判定物料是否命中阈值
///
/// 命中时返回库存百分比 (用于告警文案); 再订货点缺失/为 0、
/// 阈值类型未知或比较方式不支持时返回 None
pub fn breach_percent(item: &InventoryItem, threshold: &AlertThreshold) -> Option<f64> {
    let percent = item.percent_remaining()?;

    let comparison = ComparisonType::parse(&threshold.comparison_type);
    if let ComparisonType::Unsupported(ref raw) = comparison {
        tracing::debug!(
            threshold_id = threshold.threshold_id,
            comparison = %raw,
            "不支持的比较方式, 视为不命中"
        );
        return None;
    }

    let actual = match ThresholdKind::from_threshold_type(&threshold.threshold_type) {
        ThresholdKind::Percent => percent,
        ThresholdKind::Absolute => item.current_stock,
        ThresholdKind::Unsupported => {
            tracing::debug!(
                threshold_id = threshold.threshold_id,
                threshold_type = %threshold.threshold_type,
                "未知阈值类型, 视为不命中"
            );
            return None;
        }
    };

    if comparison.matches(actual, threshold.threshold_value) {
        Some(percent)
    } else {
        None
    }
}

/// 去重 key: 阈值类型:物料:阈值:级别
pub fn dedup_key(threshold: &AlertThreshold, item: &InventoryItem) -> String {
    format!(
        "{}:{}:{}:{}",
        threshold.threshold_type, item.item_id, threshold.threshold_value, threshold.alert_level
    )
}

fn build_low_stock_alert(
    item: &InventoryItem,
    threshold: &AlertThreshold,
    percent: f64,
) -> NewAlert {
    NewAlert {
        alert_type: LOW_STOCK_ALERT_TYPE.to_string(),
        severity: threshold.alert_level.clone(),
        title: format!("库存不足: {}", item.name),
        message: format!(
            "当前库存 {} {}，为再订货点的 {:.1}%，阈值 {}",
            item.current_stock, item.unit, percent, threshold.threshold_value
        ),
        farm_section: item.storage_location.clone(),
    }
}

// ==========================================
// ThresholdAlertEngine - 阈值告警引擎
// ==========================================
pub struct ThresholdAlertEngine {
    data: Arc<dyn AlertDataSource>,
    dedup: Arc<dyn AlertDedupStore>,
    notifier: DispatchQueue,
    config: AlertEngineConfig,
}

impl ThresholdAlertEngine {
    pub fn new(
        data: Arc<dyn AlertDataSource>,
        dedup: Arc<dyn AlertDedupStore>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        config: AlertEngineConfig,
    ) -> Self {
        Self {
            data,
            dedup,
            notifier: DispatchQueue::new(dispatcher),
            config,
        }
    }

    /// 后台分发固定使用指定运行时
    pub fn with_runtime(mut self, runtime: tokio::runtime::Handle) -> Self {
        let dispatcher = self.notifier.dispatcher();
        self.notifier = DispatchQueue::with_runtime(dispatcher, runtime);
        self
    }

    pub fn config(&self) -> &AlertEngineConfig {
        &self.config
    }

    /// 尚未完成的后台分发数
    pub fn pending_dispatches(&self) -> usize {
        self.notifier.pending()
    }

    /// 等待已提交的后台分发全部完成
    pub async fn flush_dispatches(&self) -> usize {
        self.notifier.flush().await
    }

    /// 以当前时间执行一次评估
    pub fn evaluate_now(&self) -> EngineResult<AlertPassResult> {
        self.evaluate(Utc::now().naive_utc())
    }

    /// 读取库存与阈值后执行一次评估
    ///
    /// 只有读取失败会返回错误; 单条告警写入失败不会中断评估
    #[instrument(skip_all, fields(now = %now))]
    pub fn evaluate(&self, now: NaiveDateTime) -> EngineResult<AlertPassResult> {
        let items = self.data.get_inventory_items()?;
        let thresholds = self
            .data
            .get_active_thresholds(&self.config.low_stock_type_prefix)?;

        Ok(self.evaluate_snapshot(&items, &thresholds, now))
    }

    /// 对给定快照执行一次评估
    ///
    /// 阈值会再次按启用状态和类型前缀过滤
    pub fn evaluate_snapshot(
        &self,
        items: &[InventoryItem],
        thresholds: &[AlertThreshold],
        now: NaiveDateTime,
    ) -> AlertPassResult {
        let mut result = AlertPassResult::default();

        // 1. 清除窗口外标记
        let purged = self.dedup.purge_older_than(now - self.config.dedup_window);
        if purged > 0 {
            tracing::debug!(purged, "已清除过期去重标记");
        }

        // 2~3. 判定 + 去重 + 上限
        let mut candidates: Vec<(String, NewAlert)> = Vec::new();
        let active = thresholds.iter().filter(|t| {
            t.is_active && t.threshold_type.starts_with(&self.config.low_stock_type_prefix)
        });

        for threshold in active {
            for item in items {
                if item.percent_remaining().is_none() {
                    continue;
                }
                result.evaluated_pairs += 1;

                let Some(percent) = breach_percent(item, threshold) else {
                    continue;
                };
                result.breaches += 1;

                // 超出上限的命中不做标记, 下次评估仍可告警
                if candidates.len() >= self.config.max_alerts_per_pass {
                    result.capped += 1;
                    continue;
                }

                let key = dedup_key(threshold, item);
                if !self.dedup.try_mark(&key, now) {
                    result.suppressed += 1;
                    continue;
                }

                candidates.push((key, build_low_stock_alert(item, threshold, percent)));
            }
        }

        // 4~5. 持久化 + 分发
        for (key, new_alert) in candidates {
            match self.data.insert_alert(&new_alert, now) {
                Ok(alert) => result.alerts_created.push(alert),
                Err(e) => {
                    tracing::warn!(
                        dedup_key = %key,
                        title = %new_alert.title,
                        error = %e,
                        "告警写入失败, 已跳过"
                    );
                    self.dedup.release(&key);
                    result.failed += 1;
                }
            }
        }

        result.dispatched = self.notifier.submit(result.alerts_created.clone());

        if result.capped > 0 {
            tracing::warn!(
                capped = result.capped,
                max_alerts_per_pass = self.config.max_alerts_per_pass,
                "单次评估告警数已达上限"
            );
        }

        tracing::info!(
            evaluated_pairs = result.evaluated_pairs,
            breaches = result.breaches,
            suppressed = result.suppressed,
            created = result.alerts_created.len(),
            failed = result.failed,
            "阈值告警评估完成"
        );

        result
    }
}
