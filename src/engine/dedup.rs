// ==========================================
// 蛋鸡场运营 ERP - 告警去重存储
// ==========================================
// 职责: 记录 (阈值, 物料) 组合最近一次告警时间
// 说明: 进程内状态, 重启后清空; 引擎通过 trait 注入
// ==========================================

use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::sync::Mutex;

/// 告警去重存储
///
/// `try_mark` 必须是原子的"检查并标记": 并发评估中同一 key
/// 只有一方能拿到 true
pub trait AlertDedupStore: Send + Sync {
    /// 清除 cutoff 之前标记的 key, 返回清除数量
    fn purge_older_than(&self, cutoff: NaiveDateTime) -> usize;

    /// key 不存在时标记并返回 true; 已存在返回 false
    fn try_mark(&self, key: &str, now: NaiveDateTime) -> bool;

    /// 释放 key (告警持久化失败时回滚标记)
    fn release(&self, key: &str);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 基于 HashMap 的内存去重存储
#[derive(Debug, Default)]
pub struct InMemoryDedupStore {
    entries: Mutex<HashMap<String, NaiveDateTime>>,
}

impl InMemoryDedupStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 最近一次标记时间
    pub fn marked_at(&self, key: &str) -> Option<NaiveDateTime> {
        self.guard().get(key).copied()
    }

    // 中毒的锁仍可继续使用: 内部只有简单的 map 操作, 不存在半更新状态
    fn guard(&self) -> std::sync::MutexGuard<'_, HashMap<String, NaiveDateTime>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl AlertDedupStore for InMemoryDedupStore {
    fn purge_older_than(&self, cutoff: NaiveDateTime) -> usize {
        let mut entries = self.guard();
        let before = entries.len();
        entries.retain(|_, marked| *marked >= cutoff);
        before - entries.len()
    }

    fn try_mark(&self, key: &str, now: NaiveDateTime) -> bool {
        let mut entries = self.guard();
        if entries.contains_key(key) {
            return false;
        }
        entries.insert(key.to_string(), now);
        true
    }

    fn release(&self, key: &str) {
        self.guard().remove(key);
    }

    fn len(&self) -> usize {
        self.guard().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use std::sync::Arc;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 8, 1)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn test_try_mark_is_exclusive() {
        let store = InMemoryDedupStore::new();
        assert!(store.try_mark("k", at(8, 0)));
        assert!(!store.try_mark("k", at(8, 5)));
        assert_eq!(store.marked_at("k"), Some(at(8, 0)));

        store.release("k");
        assert!(store.is_empty());
        assert!(store.try_mark("k", at(8, 10)));
    }

    #[test]
    fn test_purge_older_than() {
        let store = InMemoryDedupStore::new();
        store.try_mark("old", at(6, 0));
        store.try_mark("new", at(7, 30));

        let purged = store.purge_older_than(at(8, 0) - Duration::minutes(60));
        assert_eq!(purged, 1);
        assert_eq!(store.len(), 1);
        assert!(store.marked_at("new").is_some());
    }

    #[test]
    fn test_concurrent_marks_single_winner() {
        let store = Arc::new(InMemoryDedupStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || store.try_mark("shared", at(9, 0)))
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }
}
