// ==========================================
// 蛋鸡场运营 ERP - 告警通知分发
// ==========================================
// 职责: 定义告警外发 trait (推送/短信/邮件等渠道由实现方提供)
// 说明: 分发是"发出即忘"的, 失败只记日志, 不影响告警持久化
// ==========================================

use crate::domain::alert::Alert;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinSet;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("通知渠道不可用: {0}")]
    ChannelUnavailable(String),

    #[error("通知发送失败: {0}")]
    SendFailed(String),
}

/// 告警通知分发器
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(&self, alert: &Alert) -> Result<(), DispatchError>;
}

/// 空操作分发器 (测试或无外发渠道时使用)
#[derive(Debug, Clone, Default)]
pub struct NoOpDispatcher;

#[async_trait]
impl NotificationDispatcher for NoOpDispatcher {
    async fn dispatch(&self, alert: &Alert) -> Result<(), DispatchError> {
        tracing::debug!(alert_id = %alert.alert_id, "NoOpDispatcher: 跳过告警外发");
        Ok(())
    }
}

/// 仅写日志的分发器
#[derive(Debug, Clone, Default)]
pub struct LoggingDispatcher;

#[async_trait]
impl NotificationDispatcher for LoggingDispatcher {
    async fn dispatch(&self, alert: &Alert) -> Result<(), DispatchError> {
        tracing::info!(
            alert_id = %alert.alert_id,
            alert_type = %alert.alert_type,
            severity = %alert.severity,
            farm_section = alert.farm_section.as_deref().unwrap_or("-"),
            "告警通知: {}",
            alert.title
        );
        Ok(())
    }
}

// ==========================================
// DispatchQueue - 告警分发队列
// ==========================================
// 运行时内: 任务挂在 JoinSet 上, flush() 等待全部完成
// 运行时外: 临时建一个单线程运行时同步发送
// 两种情况下每条告警都会交给分发器
// ==========================================
pub struct DispatchQueue {
    dispatcher: Arc<dyn NotificationDispatcher>,
    runtime: Option<Handle>,
    pending: Mutex<JoinSet<()>>,
}

impl DispatchQueue {
    /// 创建分发队列; 构造时处于 tokio 运行时内则记住该运行时
    pub fn new(dispatcher: Arc<dyn NotificationDispatcher>) -> Self {
        Self {
            dispatcher,
            runtime: Handle::try_current().ok(),
            pending: Mutex::new(JoinSet::new()),
        }
    }

    /// 指定后台分发使用的运行时
    pub fn with_runtime(dispatcher: Arc<dyn NotificationDispatcher>, runtime: Handle) -> Self {
        Self {
            dispatcher,
            runtime: Some(runtime),
            pending: Mutex::new(JoinSet::new()),
        }
    }

    pub fn dispatcher(&self) -> Arc<dyn NotificationDispatcher> {
        self.dispatcher.clone()
    }

    fn guard(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 提交告警, 返回交给分发器的条数
    pub fn submit(&self, alerts: Vec<Alert>) -> usize {
        if alerts.is_empty() {
            return 0;
        }

        let runtime = self.runtime.clone().or_else(|| Handle::try_current().ok());
        match runtime {
            Some(handle) => {
                let mut pending = self.guard();
                // 回收已完成的任务
                while pending.try_join_next().is_some() {}

                let count = alerts.len();
                for alert in alerts {
                    let dispatcher = self.dispatcher.clone();
                    pending.spawn_on(
                        async move { dispatch_logged(dispatcher.as_ref(), &alert).await },
                        &handle,
                    );
                }
                count
            }
            None => self.dispatch_blocking(alerts),
        }
    }

    fn dispatch_blocking(&self, alerts: Vec<Alert>) -> usize {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    count = alerts.len(),
                    "无法创建分发运行时, 告警未外发"
                );
                return 0;
            }
        };

        tracing::debug!(count = alerts.len(), "无 tokio 运行时, 同步外发告警");
        let dispatcher = self.dispatcher.as_ref();
        runtime.block_on(async {
            for alert in &alerts {
                dispatch_logged(dispatcher, alert).await;
            }
        });
        alerts.len()
    }

    /// 尚未完成的后台分发任务数
    pub fn pending(&self) -> usize {
        self.guard().len()
    }

    /// 等待全部后台分发完成, 返回完成的任务数
    pub async fn flush(&self) -> usize {
        let mut pending = std::mem::take(&mut *self.guard());
        let mut completed = 0;
        while let Some(joined) = pending.join_next().await {
            if let Err(e) = joined {
                tracing::warn!(error = %e, "告警分发任务异常结束");
            }
            completed += 1;
        }
        completed
    }
}

async fn dispatch_logged(dispatcher: &dyn NotificationDispatcher, alert: &Alert) {
    if let Err(e) = dispatcher.dispatch(alert).await {
        tracing::warn!(alert_id = %alert.alert_id, error = %e, "告警外发失败");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sample_alert() -> Alert {
        Alert {
            alert_id: "a-1".to_string(),
            alert_type: "low_stock".to_string(),
            severity: "warning".to_string(),
            title: "库存不足: 玉米".to_string(),
            message: "test".to_string(),
            farm_section: None,
            is_read: false,
            created_at: NaiveDate::from_ymd_opt(2025, 8, 1)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
        }
    }

    struct CountingDispatcher {
        sent: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl NotificationDispatcher for CountingDispatcher {
        async fn dispatch(&self, _alert: &Alert) -> Result<(), DispatchError> {
            self.sent.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(DispatchError::ChannelUnavailable("sms".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn counting(fail: bool) -> Arc<CountingDispatcher> {
        Arc::new(CountingDispatcher {
            sent: AtomicUsize::new(0),
            fail,
        })
    }

    #[test]
    fn test_submit_without_runtime_dispatches_synchronously() {
        let dispatcher = counting(false);
        let queue = DispatchQueue::new(dispatcher.clone());

        let handed = queue.submit(vec![sample_alert(), sample_alert()]);

        assert_eq!(handed, 2);
        assert_eq!(dispatcher.sent.load(Ordering::SeqCst), 2);
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn test_failed_dispatch_without_runtime_is_logged_only() {
        let dispatcher = counting(true);
        let queue = DispatchQueue::new(dispatcher.clone());

        assert_eq!(queue.submit(vec![sample_alert()]), 1);
        assert_eq!(dispatcher.sent.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_submit_inside_runtime_then_flush() {
        let dispatcher = counting(false);
        let queue = DispatchQueue::new(dispatcher.clone());

        assert_eq!(queue.submit(vec![sample_alert(), sample_alert()]), 2);
        assert_eq!(queue.flush().await, 2);
        assert_eq!(dispatcher.sent.load(Ordering::SeqCst), 2);
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn test_submit_on_injected_runtime() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let dispatcher = counting(false);
        let queue = DispatchQueue::with_runtime(dispatcher.clone(), runtime.handle().clone());

        assert_eq!(queue.submit(vec![sample_alert()]), 1);
        assert_eq!(runtime.block_on(queue.flush()), 1);
        assert_eq!(dispatcher.sent.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_logging_dispatcher_ok() {
        assert!(LoggingDispatcher.dispatch(&sample_alert()).await.is_ok());
    }
}
