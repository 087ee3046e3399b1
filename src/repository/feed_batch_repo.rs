// ==========================================
// 蛋鸡场运营 ERP - 饲料批次仓储
// ==========================================

use crate::domain::activity::FeedBatch;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

fn map_row(row: &Row<'_>) -> SqliteResult<FeedBatch> {
    Ok(FeedBatch {
        batch_id: row.get(0)?,
        batch_date: row.get(1)?,
        batch_size_kg: row.get(2)?,
        cost_per_kg: row.get(3)?,
        recipe_name: row.get(4)?,
    })
}

/// 饲料批次仓储
/// 职责: 管理 feed_batch 表（只增不改）
pub struct FeedBatchRepository {
    conn: Arc<Mutex<Connection>>,
}

impl FeedBatchRepository {
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

    /// 新增批次
    pub fn insert(&self, batch: &FeedBatch) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO feed_batch (batch_date, batch_size_kg, cost_per_kg, recipe_name)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                batch.batch_date,
                batch.batch_size_kg,
                batch.cost_per_kg,
                batch.recipe_name,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 查询不晚于指定日期的最近 N 个批次（按日期倒序）
    ///
    /// 同一天多个批次时，后录入的排在前面
    pub fn find_recent_on_or_before(
        &self,
        date: NaiveDate,
        limit: usize,
    ) -> RepositoryResult<Vec<FeedBatch>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT batch_id, batch_date, batch_size_kg, cost_per_kg, recipe_name
            FROM feed_batch
            WHERE batch_date <= ?1
            ORDER BY batch_date DESC, batch_id DESC
            LIMIT ?2
            "#,
        )?;

        let batches = stmt
            .query_map(params![date, limit as i64], map_row)?
            .collect::<SqliteResult<Vec<FeedBatch>>>()?;

        Ok(batches)
    }

    /// 查询全部批次（按日期倒序）
    pub fn list_all(&self) -> RepositoryResult<Vec<FeedBatch>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT batch_id, batch_date, batch_size_kg, cost_per_kg, recipe_name
            FROM feed_batch
            ORDER BY batch_date DESC, batch_id DESC
            "#,
        )?;

        let batches = stmt
            .query_map([], map_row)?
            .collect::<SqliteResult<Vec<FeedBatch>>>()?;

        Ok(batches)
    }
}
