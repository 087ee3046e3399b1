// ==========================================
// 蛋鸡场运营 ERP - 库存仓储
// ==========================================

use crate::domain::inventory::InventoryItem;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    SELECT item_id, name, category, current_stock, unit, reorder_point, storage_location
    FROM inventory_item
"#;

fn map_row(row: &Row<'_>) -> SqliteResult<InventoryItem> {
    Ok(InventoryItem {
        item_id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        current_stock: row.get(3)?,
        unit: row.get(4)?,
        reorder_point: row.get(5)?,
        storage_location: row.get(6)?,
    })
}

/// 库存仓储
pub struct InventoryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl InventoryRepository {
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

    /// 新增或更新物料
    pub fn upsert(&self, item: &InventoryItem) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO inventory_item (
                item_id, name, category, current_stock, unit, reorder_point,
                storage_location, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, datetime('now'))
            ON CONFLICT(item_id) DO UPDATE SET
                name = excluded.name,
                category = excluded.category,
                current_stock = excluded.current_stock,
                unit = excluded.unit,
                reorder_point = excluded.reorder_point,
                storage_location = excluded.storage_location,
                updated_at = excluded.updated_at
            "#,
            params![
                item.item_id,
                item.name,
                item.category,
                item.current_stock,
                item.unit,
                item.reorder_point,
                item.storage_location,
            ],
        )?;
        Ok(())
    }

    /// 查询全部物料
    pub fn find_all(&self) -> RepositoryResult<Vec<InventoryItem>> {
        let conn = self.get_conn()?;
        let sql = format!("{} ORDER BY item_id", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let items = stmt
            .query_map([], map_row)?
            .collect::<SqliteResult<Vec<InventoryItem>>>()?;
        Ok(items)
    }

    /// 按ID查询
    pub fn find_by_id(&self, item_id: &str) -> RepositoryResult<Option<InventoryItem>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE item_id = ?1", SELECT_COLUMNS);
        let item = conn.query_row(&sql, params![item_id], map_row).optional()?;
        Ok(item)
    }

    /// 调整库存（入库为正、出库为负）
    ///
    /// # 返回
    /// - Ok(调整后的库存)
    /// - Err(NotFound): 物料不存在
    pub fn adjust_stock(&self, item_id: &str, delta: f64) -> RepositoryResult<f64> {
        let conn = self.get_conn()?;
        let stock = conn
            .query_row(
                r#"
                UPDATE inventory_item
                SET current_stock = current_stock + ?2, updated_at = datetime('now')
                WHERE item_id = ?1
                RETURNING current_stock
                "#,
                params![item_id, delta],
                |row| row.get::<_, f64>(0),
            )
            .optional()?;

        stock.ok_or_else(|| RepositoryError::NotFound {
            entity: "InventoryItem".to_string(),
            id: item_id.to_string(),
        })
    }
}
