// ==========================================
// 蛋鸡场运营 ERP - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::db::open_sqlite_connection;
use crate::engine::cost_allocation::CostEngineConfig;
use crate::engine::threshold_alert::AlertEngineConfig;
use chrono::Duration;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at) VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        tracing::info!(config_key = key, value = value, "配置已更新");
        Ok(())
    }

    /// 读取数值配置，缺失或格式错误时返回默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> Result<T, Box<dyn Error>>
    where
        T: FromStr + Copy + std::fmt::Display,
    {
        match self.get_config_value(key)? {
            None => Ok(default),
            Some(raw) => match raw.trim().parse::<T>() {
                Ok(v) => Ok(v),
                Err(_) => {
                    tracing::warn!(
                        config_key = key,
                        raw_value = %raw,
                        default = %default,
                        "配置格式错误，使用默认值"
                    );
                    Ok(default)
                }
            },
        }
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key"
        )?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
            ))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }

    // ===== 成本引擎配置 =====

    /// 加载成本引擎配置
    ///
    /// # 默认值
    /// - feed_batch_lookback: 5
    /// - grade_a/b/c_markup: 1.2 / 1.1 / 1.0
    pub fn load_cost_engine_config(&self) -> Result<CostEngineConfig, Box<dyn Error>> {
        let defaults = CostEngineConfig::default();

        let mut lookback =
            self.get_parsed_or_default(config_keys::FEED_BATCH_LOOKBACK, defaults.feed_batch_lookback)?;
        if lookback == 0 {
            tracing::warn!(
                config_key = config_keys::FEED_BATCH_LOOKBACK,
                "批次回看数量不能为 0，使用默认值"
            );
            lookback = defaults.feed_batch_lookback;
        }

        Ok(CostEngineConfig {
            feed_batch_lookback: lookback,
            grade_a_markup: self
                .get_parsed_or_default(config_keys::GRADE_A_MARKUP, defaults.grade_a_markup)?,
            grade_b_markup: self
                .get_parsed_or_default(config_keys::GRADE_B_MARKUP, defaults.grade_b_markup)?,
            grade_c_markup: self
                .get_parsed_or_default(config_keys::GRADE_C_MARKUP, defaults.grade_c_markup)?,
        })
    }

    // ===== 告警引擎配置 =====

    /// 加载告警引擎配置
    ///
    /// # 默认值
    /// - alert_dedup_window_minutes: 60
    /// - max_alerts_per_pass: 20
    /// - low_stock_type_prefix: low_stock
    pub fn load_alert_engine_config(&self) -> Result<AlertEngineConfig, Box<dyn Error>> {
        let defaults = AlertEngineConfig::default();

        let window_minutes = self.get_parsed_or_default(
            config_keys::ALERT_DEDUP_WINDOW_MINUTES,
            defaults.dedup_window.num_minutes(),
        )?;
        let max_alerts =
            self.get_parsed_or_default(config_keys::MAX_ALERTS_PER_PASS, defaults.max_alerts_per_pass)?;
        let prefix = self
            .get_config_value(config_keys::LOW_STOCK_TYPE_PREFIX)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.low_stock_type_prefix);

        let dedup_window = match Duration::try_minutes(window_minutes) {
            Some(window) if (0..=MAX_DEDUP_WINDOW_MINUTES).contains(&window_minutes) => window,
            _ => {
                tracing::warn!(
                    config_key = config_keys::ALERT_DEDUP_WINDOW_MINUTES,
                    value = window_minutes,
                    max = MAX_DEDUP_WINDOW_MINUTES,
                    "去重窗口超出范围, 使用默认值"
                );
                defaults.dedup_window
            }
        };

        Ok(AlertEngineConfig {
            dedup_window,
            max_alerts_per_pass: max_alerts,
            low_stock_type_prefix: prefix,
        })
    }
}

/// 去重窗口上限 (分钟): 7 天
pub const MAX_DEDUP_WINDOW_MINUTES: i64 = 7 * 24 * 60;

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 成本引擎
    pub const FEED_BATCH_LOOKBACK: &str = "feed_batch_lookback";
    pub const GRADE_A_MARKUP: &str = "grade_a_markup";
    pub const GRADE_B_MARKUP: &str = "grade_b_markup";
    pub const GRADE_C_MARKUP: &str = "grade_c_markup";

    // 告警引擎
    pub const ALERT_DEDUP_WINDOW_MINUTES: &str = "alert_dedup_window_minutes";
    pub const MAX_ALERTS_PER_PASS: &str = "max_alerts_per_pass";
    pub const LOW_STOCK_TYPE_PREFIX: &str = "low_stock_type_prefix";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = setup();

        let cost = config.load_cost_engine_config().unwrap();
        assert_eq!(cost.feed_batch_lookback, 5);
        assert_eq!(cost.grade_a_markup, 1.2);

        let alert = config.load_alert_engine_config().unwrap();
        assert_eq!(alert.dedup_window, Duration::minutes(60));
        assert_eq!(alert.max_alerts_per_pass, 20);
        assert_eq!(alert.low_stock_type_prefix, "low_stock");
    }

    #[test]
    fn test_overrides_and_malformed_values() {
        let config = setup();
        config.set_config_value(config_keys::FEED_BATCH_LOOKBACK, "3").unwrap();
        config.set_config_value(config_keys::GRADE_B_MARKUP, "abc").unwrap();
        config.set_config_value(config_keys::ALERT_DEDUP_WINDOW_MINUTES, "15").unwrap();

        let cost = config.load_cost_engine_config().unwrap();
        assert_eq!(cost.feed_batch_lookback, 3);
        assert_eq!(cost.grade_b_markup, 1.1);

        let alert = config.load_alert_engine_config().unwrap();
        assert_eq!(alert.dedup_window, Duration::minutes(15));

        // 0 视为非法
        config.set_config_value(config_keys::FEED_BATCH_LOOKBACK, "0").unwrap();
        assert_eq!(config.load_cost_engine_config().unwrap().feed_batch_lookback, 5);

        let snapshot = config.get_config_snapshot().unwrap();
        assert!(snapshot.contains("alert_dedup_window_minutes"));
    }

    #[test]
    fn test_out_of_range_dedup_window_falls_back() {
        let config = setup();

        for raw in ["9223372036854775807", "-5", "10081"] {
            config
                .set_config_value(config_keys::ALERT_DEDUP_WINDOW_MINUTES, raw)
                .unwrap();
            let alert = config.load_alert_engine_config().unwrap();
            assert_eq!(alert.dedup_window, Duration::minutes(60), "value {}", raw);
        }

        config
            .set_config_value(config_keys::ALERT_DEDUP_WINDOW_MINUTES, "10080")
            .unwrap();
        assert_eq!(
            config.load_alert_engine_config().unwrap().dedup_window,
            Duration::minutes(MAX_DEDUP_WINDOW_MINUTES)
        );
    }
}
