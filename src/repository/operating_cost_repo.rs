// ==========================================
// 蛋鸡场运营 ERP - 月度运营成本仓储
// ==========================================

use crate::domain::cost::OperatingCost;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

/// 月度运营成本仓储
/// 职责: operating_cost 表，每月至多一行（按月份 upsert）
pub struct OperatingCostRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OperatingCostRepository {
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

    /// 插入或覆盖某月成本
    pub fn upsert(&self, cost: &OperatingCost) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO operating_cost (
                month, electricity, water, maintenance, other, total_monthly_cost, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, datetime('now'))
            ON CONFLICT(month) DO UPDATE SET
                electricity = excluded.electricity,
                water = excluded.water,
                maintenance = excluded.maintenance,
                other = excluded.other,
                total_monthly_cost = excluded.total_monthly_cost,
                updated_at = excluded.updated_at
            "#,
            params![
                cost.month,
                cost.electricity,
                cost.water,
                cost.maintenance,
                cost.other,
                cost.total_monthly_cost,
            ],
        )?;
        Ok(())
    }

    /// 按月份查询
    pub fn find_by_month(&self, month: &str) -> RepositoryResult<Option<OperatingCost>> {
        let conn = self.get_conn()?;
        let cost = conn
            .query_row(
                r#"
                SELECT month, electricity, water, maintenance, other, total_monthly_cost
                FROM operating_cost
                WHERE month = ?1
                "#,
                params![month],
                |row| {
                    Ok(OperatingCost {
                        month: row.get(0)?,
                        electricity: row.get(1)?,
                        water: row.get(2)?,
                        maintenance: row.get(3)?,
                        other: row.get(4)?,
                        total_monthly_cost: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(cost)
    }
}
