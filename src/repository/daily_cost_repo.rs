// ==========================================
// 蛋鸡场运营 ERP - 日成本仓储
// ==========================================
// 写入口径: INSERT ... ON CONFLICT(cost_date) DO UPDATE
// 单条语句完成"存在则覆写, 否则插入", 同一日期不会出现重复行
// 数值与分摊模式均未变化时保留原 updated_at, 重算结果逐字段一致
// ==========================================

use crate::domain::cost::DailyCost;
use crate::domain::types::AllocationMode;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    SELECT cost_date, total_feed_cost, total_eggs_produced, feed_cost_per_egg,
           fixed_cost_per_egg, total_cost_per_egg, suggested_price_grade_a,
           suggested_price_grade_b, suggested_price_grade_c, allocation, updated_at
    FROM daily_cost
"#;

fn map_row(row: &Row<'_>) -> SqliteResult<DailyCost> {
    let raw_allocation: String = row.get(9)?;
    let allocation = AllocationMode::parse(&raw_allocation).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            9,
            Type::Text,
            format!("未知分摊模式: {}", raw_allocation).into(),
        )
    })?;

    Ok(DailyCost {
        cost_date: row.get(0)?,
        total_feed_cost: row.get(1)?,
        total_eggs_produced: row.get(2)?,
        feed_cost_per_egg: row.get(3)?,
        fixed_cost_per_egg: row.get(4)?,
        total_cost_per_egg: row.get(5)?,
        suggested_price_grade_a: row.get(6)?,
        suggested_price_grade_b: row.get(7)?,
        suggested_price_grade_c: row.get(8)?,
        allocation,
        updated_at: row.get(10)?,
    })
}

/// 日成本仓储
pub struct DailyCostRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DailyCostRepository {
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

    /// 原子 upsert 日成本
    pub fn upsert(&self, record: &DailyCost) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO daily_cost (
                cost_date, total_feed_cost, total_eggs_produced, feed_cost_per_egg,
                fixed_cost_per_egg, total_cost_per_egg, suggested_price_grade_a,
                suggested_price_grade_b, suggested_price_grade_c, allocation, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT(cost_date) DO UPDATE SET
                total_feed_cost = excluded.total_feed_cost,
                total_eggs_produced = excluded.total_eggs_produced,
                feed_cost_per_egg = excluded.feed_cost_per_egg,
                fixed_cost_per_egg = excluded.fixed_cost_per_egg,
                total_cost_per_egg = excluded.total_cost_per_egg,
                suggested_price_grade_a = excluded.suggested_price_grade_a,
                suggested_price_grade_b = excluded.suggested_price_grade_b,
                suggested_price_grade_c = excluded.suggested_price_grade_c,
                allocation = excluded.allocation,
                updated_at = CASE
                    WHEN daily_cost.total_feed_cost IS excluded.total_feed_cost
                     AND daily_cost.total_eggs_produced IS excluded.total_eggs_produced
                     AND daily_cost.feed_cost_per_egg IS excluded.feed_cost_per_egg
                     AND daily_cost.fixed_cost_per_egg IS excluded.fixed_cost_per_egg
                     AND daily_cost.total_cost_per_egg IS excluded.total_cost_per_egg
                     AND daily_cost.suggested_price_grade_a IS excluded.suggested_price_grade_a
                     AND daily_cost.suggested_price_grade_b IS excluded.suggested_price_grade_b
                     AND daily_cost.suggested_price_grade_c IS excluded.suggested_price_grade_c
                     AND daily_cost.allocation IS excluded.allocation
                    THEN daily_cost.updated_at
                    ELSE excluded.updated_at
                END
            "#,
            params![
                record.cost_date,
                record.total_feed_cost,
                record.total_eggs_produced,
                record.feed_cost_per_egg,
                record.fixed_cost_per_egg,
                record.total_cost_per_egg,
                record.suggested_price_grade_a,
                record.suggested_price_grade_b,
                record.suggested_price_grade_c,
                record.allocation.as_str(),
                record.updated_at,
            ],
        )?;
        Ok(())
    }

    /// 按日期查询
    pub fn find_by_date(&self, date: NaiveDate) -> RepositoryResult<Option<DailyCost>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE cost_date = ?1", SELECT_COLUMNS);
        let record = conn.query_row(&sql, params![date], map_row).optional()?;
        Ok(record)
    }

    /// 按日期范围查询（含两端）
    pub fn find_by_date_range(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> RepositoryResult<Vec<DailyCost>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE cost_date BETWEEN ?1 AND ?2 ORDER BY cost_date",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![start_date, end_date], map_row)?
            .collect::<SqliteResult<Vec<DailyCost>>>()?;
        Ok(records)
    }

    /// 指定日期的行数（用于幂等性校验）
    pub fn count_by_date(&self, date: NaiveDate) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM daily_cost WHERE cost_date = ?1",
            params![date],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
