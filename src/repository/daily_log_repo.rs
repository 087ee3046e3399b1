// ==========================================
// 蛋鸡场运营 ERP - 生产日志仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 未标注鸡舍的日志以空串落库, 保证 (日期, 鸡舍) 唯一约束对其生效
// ==========================================

use crate::domain::activity::DailyLog;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    SELECT log_id, log_date, house_id, eggs_total, eggs_grade_a, eggs_grade_b,
           eggs_grade_c, feed_given_kg, mortality_count, notes
    FROM daily_log
"#;

fn map_row(row: &Row<'_>) -> SqliteResult<DailyLog> {
    Ok(DailyLog {
        log_id: row.get(0)?,
        log_date: row.get(1)?,
        house_id: Some(row.get::<_, String>(2)?).filter(|h| !h.is_empty()),
        eggs_total: row.get(3)?,
        eggs_grade_a: row.get(4)?,
        eggs_grade_b: row.get(5)?,
        eggs_grade_c: row.get(6)?,
        feed_given_kg: row.get(7)?,
        mortality_count: row.get(8)?,
        notes: row.get(9)?,
    })
}

fn house_key(log: &DailyLog) -> &str {
    log.house_id.as_deref().map(str::trim).unwrap_or("")
}

// ==========================================
// DailyLogRepository - 生产日志仓储
// ==========================================

/// 生产日志仓储
/// 职责: 管理 daily_log 表的读写
pub struct DailyLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DailyLogRepository {
    /// 创建新的仓储实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入或更新日志（按 日期+鸡舍 覆写）
    ///
    /// # 返回
    /// - Ok(log_id)
    pub fn upsert(&self, log: &DailyLog) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;

        let log_id = conn.query_row(
            r#"
            INSERT INTO daily_log (
                log_date, house_id, eggs_total, eggs_grade_a, eggs_grade_b,
                eggs_grade_c, feed_given_kg, mortality_count, notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(log_date, house_id) DO UPDATE SET
                eggs_total = excluded.eggs_total,
                eggs_grade_a = excluded.eggs_grade_a,
                eggs_grade_b = excluded.eggs_grade_b,
                eggs_grade_c = excluded.eggs_grade_c,
                feed_given_kg = excluded.feed_given_kg,
                mortality_count = excluded.mortality_count,
                notes = excluded.notes
            RETURNING log_id
            "#,
            params![
                log.log_date,
                house_key(log),
                log.eggs_total,
                log.eggs_grade_a,
                log.eggs_grade_b,
                log.eggs_grade_c,
                log.feed_given_kg,
                log.mortality_count,
                log.notes,
            ],
            |row| row.get::<_, i64>(0),
        )?;

        Ok(log_id)
    }

    /// 查询指定日期的全部日志
    pub fn find_by_date(&self, date: NaiveDate) -> RepositoryResult<Vec<DailyLog>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE log_date = ?1 ORDER BY house_id, log_id", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;

        let logs = stmt
            .query_map(params![date], map_row)?
            .collect::<SqliteResult<Vec<DailyLog>>>()?;

        Ok(logs)
    }

    /// 按日期范围查询（含两端）
    pub fn find_by_date_range(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> RepositoryResult<Vec<DailyLog>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE log_date BETWEEN ?1 AND ?2 ORDER BY log_date, house_id, log_id",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        let logs = stmt
            .query_map(params![start_date, end_date], map_row)?
            .collect::<SqliteResult<Vec<DailyLog>>>()?;

        Ok(logs)
    }

    /// 删除日志
    pub fn delete(&self, log_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM daily_log WHERE log_id = ?1", params![log_id])?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "DailyLog".to_string(),
                id: log_id.to_string(),
            });
        }
        Ok(())
    }
}
