// ==========================================
// 阈值告警引擎集成测试
// ==========================================
// 测试范围:
// 1. 低库存命中 → 告警入库 + 分发
// 2. 去重窗口内不重复告警, 窗口外再次告警
// 3. 阈值停用后不再评估
// 4. 外发失败只记日志, 告警照常入库
// ==========================================

mod test_helpers;

use async_trait::async_trait;
use chrono::Duration;
use poultry_farm_erp::domain::Alert;
use poultry_farm_erp::engine::{
    AlertEngineConfig, DispatchError, FarmRepositories, InMemoryDedupStore,
    NotificationDispatcher, ThresholdAlertEngine,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use test_helpers::{datetime, inventory_item, setup_repositories};
use tokio::sync::mpsc;

struct ChannelDispatcher {
    tx: mpsc::UnboundedSender<Alert>,
}

#[async_trait]
impl NotificationDispatcher for ChannelDispatcher {
    async fn dispatch(&self, alert: &Alert) -> Result<(), DispatchError> {
        self.tx
            .send(alert.clone())
            .map_err(|e| DispatchError::ChannelUnavailable(e.to_string()))
    }
}

struct FailingDispatcher {
    attempts: AtomicUsize,
}

#[async_trait]
impl NotificationDispatcher for FailingDispatcher {
    async fn dispatch(&self, _alert: &Alert) -> Result<(), DispatchError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(DispatchError::SendFailed("短信网关超时".to_string()))
    }
}

fn build_engine(
    repos: &FarmRepositories,
) -> (ThresholdAlertEngine, mpsc::UnboundedReceiver<Alert>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let engine = ThresholdAlertEngine::new(
        Arc::new(repos.clone()),
        Arc::new(InMemoryDedupStore::new()),
        Arc::new(ChannelDispatcher { tx }),
        AlertEngineConfig::default(),
    );
    (engine, rx)
}

#[tokio::test]
async fn test_low_stock_alert_persisted_and_dispatched() {
    let (_tmp, repos) = setup_repositories();
    repos
        .inventory_repo
        .upsert(&inventory_item("corn", 20.0, Some(100.0)))
        .unwrap();
    repos
        .inventory_repo
        .upsert(&inventory_item("soy", 90.0, Some(100.0)))
        .unwrap();
    repos
        .threshold_repo
        .insert("low_stock_percent", 25.0, "lte", "critical")
        .unwrap();

    let (engine, mut rx) = build_engine(&repos);
    let result = engine.evaluate(datetime(2025, 8, 1, 8, 0)).unwrap();

    assert_eq!(result.breaches, 1);
    assert_eq!(result.alerts_created.len(), 1);
    assert_eq!(result.dispatched, 1);

    let stored = repos.alert_repo.list(true, 10).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].severity, "critical");
    assert_eq!(stored[0].farm_section.as_deref(), Some("饲料库"));
    assert!(stored[0].message.contains("20.0%"));
    assert!(!stored[0].is_read);

    let dispatched = rx.recv().await.unwrap();
    assert_eq!(dispatched.alert_id, stored[0].alert_id);
}

#[tokio::test]
async fn test_dedup_window_across_passes() {
    let (_tmp, repos) = setup_repositories();
    repos
        .inventory_repo
        .upsert(&inventory_item("corn", 5.0, Some(100.0)))
        .unwrap();
    repos
        .threshold_repo
        .insert("low_stock_absolute", 10.0, "<=", "warning")
        .unwrap();

    let (engine, _rx) = build_engine(&repos);
    let t0 = datetime(2025, 8, 1, 8, 0);

    assert_eq!(engine.evaluate(t0).unwrap().alerts_created.len(), 1);
    assert_eq!(
        engine
            .evaluate(t0 + Duration::minutes(30))
            .unwrap()
            .alerts_created
            .len(),
        0
    );
    assert_eq!(repos.alert_repo.count().unwrap(), 1);

    assert_eq!(
        engine
            .evaluate(t0 + Duration::minutes(61))
            .unwrap()
            .alerts_created
            .len(),
        1
    );
    assert_eq!(repos.alert_repo.count().unwrap(), 2);
}

#[tokio::test]
async fn test_inactive_threshold_not_evaluated() {
    let (_tmp, repos) = setup_repositories();
    repos
        .inventory_repo
        .upsert(&inventory_item("corn", 1.0, Some(100.0)))
        .unwrap();
    let id = repos
        .threshold_repo
        .insert("low_stock_percent", 50.0, "lte", "warning")
        .unwrap();
    repos.threshold_repo.set_active(id, false).unwrap();

    let (engine, _rx) = build_engine(&repos);
    let result = engine.evaluate(datetime(2025, 8, 1, 8, 0)).unwrap();

    assert_eq!(result.evaluated_pairs, 0);
    assert_eq!(repos.alert_repo.count().unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_dispatch_failure_does_not_affect_pass() {
    let (_tmp, repos) = setup_repositories();
    repos
        .inventory_repo
        .upsert(&inventory_item("corn", 10.0, Some(100.0)))
        .unwrap();
    repos
        .threshold_repo
        .insert("low_stock_percent", 30.0, "lte", "warning")
        .unwrap();

    let dispatcher = Arc::new(FailingDispatcher {
        attempts: AtomicUsize::new(0),
    });
    let engine = ThresholdAlertEngine::new(
        Arc::new(repos.clone()),
        Arc::new(InMemoryDedupStore::new()),
        dispatcher.clone(),
        AlertEngineConfig::default(),
    );

    let result = engine.evaluate(datetime(2025, 8, 1, 8, 0)).unwrap();
    assert_eq!(result.alerts_created.len(), 1);
    assert_eq!(result.dispatched, 1);
    assert_eq!(result.failed, 0);

    assert_eq!(engine.flush_dispatches().await, 1);
    assert_eq!(dispatcher.attempts.load(Ordering::SeqCst), 1);

    let stored = repos.alert_repo.list(false, 10).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].alert_id, result.alerts_created[0].alert_id);
}

#[test]
fn test_dispatch_without_runtime_still_reaches_dispatcher() {
    let (_tmp, repos) = setup_repositories();
    repos
        .inventory_repo
        .upsert(&inventory_item("corn", 10.0, Some(100.0)))
        .unwrap();
    repos
        .threshold_repo
        .insert("low_stock_percent", 30.0, "lte", "warning")
        .unwrap();

    let (engine, mut rx) = build_engine(&repos);
    let result = engine.evaluate(datetime(2025, 8, 1, 8, 0)).unwrap();

    assert_eq!(result.dispatched, 1);
    let dispatched = rx.try_recv().unwrap();
    assert_eq!(dispatched.alert_id, result.alerts_created[0].alert_id);
}
