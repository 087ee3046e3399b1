// ==========================================
// 蛋鸡场运营 ERP - 告警阈值仓储
// ==========================================
// 阈值由管理员维护, 告警引擎只读
// ==========================================

use crate::domain::alert::AlertThreshold;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

fn map_row(row: &Row<'_>) -> SqliteResult<AlertThreshold> {
    Ok(AlertThreshold {
        threshold_id: row.get(0)?,
        threshold_type: row.get(1)?,
        threshold_value: row.get(2)?,
        comparison_type: row.get(3)?,
        alert_level: row.get(4)?,
        is_active: row.get::<_, i64>(5)? != 0,
    })
}

/// 告警阈值仓储
pub struct AlertThresholdRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AlertThresholdRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增阈值（默认启用）
    pub fn insert(
        &self,
        threshold_type: &str,
        threshold_value: f64,
        comparison_type: &str,
        alert_level: &str,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO alert_threshold (
                threshold_type, threshold_value, comparison_type, alert_level, is_active
            ) VALUES (?1, ?2, ?3, ?4, 1)
            "#,
            params![threshold_type, threshold_value, comparison_type, alert_level],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 查询启用中且类型以指定前缀开头的阈值
    pub fn find_active_by_prefix(&self, type_prefix: &str) -> RepositoryResult<Vec<AlertThreshold>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT threshold_id, threshold_type, threshold_value, comparison_type,
                   alert_level, is_active
            FROM alert_threshold
            WHERE is_active = 1 AND substr(threshold_type, 1, length(?1)) = ?1
            ORDER BY threshold_id
            "#,
        )?;
        let thresholds = stmt
            .query_map(params![type_prefix], map_row)?
            .collect::<SqliteResult<Vec<AlertThreshold>>>()?;
        Ok(thresholds)
    }

    /// 查询全部阈值
    pub fn list_all(&self) -> RepositoryResult<Vec<AlertThreshold>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT threshold_id, threshold_type, threshold_value, comparison_type,
                   alert_level, is_active
            FROM alert_threshold
            ORDER BY threshold_id
            "#,
        )?;
        let thresholds = stmt
            .query_map([], map_row)?
            .collect::<SqliteResult<Vec<AlertThreshold>>>()?;
        Ok(thresholds)
    }

    /// 启用/停用阈值
    pub fn set_active(&self, threshold_id: i64, is_active: bool) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE alert_threshold SET is_active = ?2 WHERE threshold_id = ?1",
            params![threshold_id, is_active as i64],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "AlertThreshold".to_string(),
                id: threshold_id.to_string(),
            });
        }
        Ok(())
    }
}
