// ==========================================
// 蛋鸡场运营 ERP - 告警仓储
// ==========================================
// 告警生命周期: 未读 → 已读 (只能单向)
// ==========================================

use crate::domain::alert::{Alert, NewAlert};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

fn map_row(row: &Row<'_>) -> SqliteResult<Alert> {
    Ok(Alert {
        alert_id: row.get(0)?,
        alert_type: row.get(1)?,
        severity: row.get(2)?,
        title: row.get(3)?,
        message: row.get(4)?,
        farm_section: row.get(5)?,
        is_read: row.get::<_, i64>(6)? != 0,
        created_at: row.get(7)?,
    })
}

/// 告警仓储
pub struct AlertRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AlertRepository {
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

    /// 新增告警（未读）
    pub fn insert(&self, alert: &NewAlert, created_at: NaiveDateTime) -> RepositoryResult<Alert> {
        let conn = self.get_conn()?;
        let alert_id = Uuid::new_v4().to_string();

        conn.execute(
            r#"
            INSERT INTO alert (
                alert_id, alert_type, severity, title, message, farm_section, is_read, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)
            "#,
            params![
                alert_id,
                alert.alert_type,
                alert.severity,
                alert.title,
                alert.message,
                alert.farm_section,
                created_at,
            ],
        )?;

        Ok(Alert {
            alert_id,
            alert_type: alert.alert_type.clone(),
            severity: alert.severity.clone(),
            title: alert.title.clone(),
            message: alert.message.clone(),
            farm_section: alert.farm_section.clone(),
            is_read: false,
            created_at,
        })
    }

    /// 查询告警（按创建时间倒序）
    ///
    /// # 参数
    /// - unread_only: 仅未读
    /// - limit: 最大条数
    pub fn list(&self, unread_only: bool, limit: usize) -> RepositoryResult<Vec<Alert>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT alert_id, alert_type, severity, title, message, farm_section, is_read, created_at
            FROM alert
            WHERE (?1 = 0 OR is_read = 0)
            ORDER BY created_at DESC, alert_id
            LIMIT ?2
            "#,
        )?;
        let alerts = stmt
            .query_map(params![unread_only as i64, limit as i64], map_row)?
            .collect::<SqliteResult<Vec<Alert>>>()?;
        Ok(alerts)
    }

    /// 标记已读
    pub fn mark_read(&self, alert_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE alert SET is_read = 1 WHERE alert_id = ?1",
            params![alert_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Alert".to_string(),
                id: alert_id.to_string(),
            });
        }
        Ok(())
    }

    /// 全部标记已读
    ///
    /// # 返回
    /// - Ok(本次被标记的条数)
    pub fn mark_all_read(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let affected = conn.execute("UPDATE alert SET is_read = 1 WHERE is_read = 0", [])?;
        Ok(affected)
    }

    /// 告警总数
    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM alert", [], |row| row.get(0))?;
        Ok(count)
    }
}
