// ==========================================
// 蛋鸡场运营 ERP - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 提供幂等建表 (init_schema)
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 初始化全部业务表（幂等）
///
/// 所有表均使用 `CREATE TABLE IF NOT EXISTS`，可在每次启动时调用。
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        -- 鸡舍日生产日志
        CREATE TABLE IF NOT EXISTS daily_log (
            log_id INTEGER PRIMARY KEY AUTOINCREMENT,
            log_date TEXT NOT NULL,
            house_id TEXT NOT NULL DEFAULT '', -- 空串表示未标注鸡舍
            eggs_total INTEGER NOT NULL DEFAULT 0,
            eggs_grade_a INTEGER NOT NULL DEFAULT 0,
            eggs_grade_b INTEGER NOT NULL DEFAULT 0,
            eggs_grade_c INTEGER NOT NULL DEFAULT 0,
            feed_given_kg REAL NOT NULL DEFAULT 0,
            mortality_count INTEGER NOT NULL DEFAULT 0,
            notes TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE (log_date, house_id)
        );
        CREATE INDEX IF NOT EXISTS idx_daily_log_date ON daily_log(log_date);

        -- 饲料配制批次（历史价格序列）
        CREATE TABLE IF NOT EXISTS feed_batch (
            batch_id INTEGER PRIMARY KEY AUTOINCREMENT,
            batch_date TEXT NOT NULL,
            batch_size_kg REAL NOT NULL,
            cost_per_kg REAL NOT NULL,
            recipe_name TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_feed_batch_date ON feed_batch(batch_date);

        -- 月度运营成本（每月一行）
        CREATE TABLE IF NOT EXISTS operating_cost (
            month TEXT PRIMARY KEY,
            electricity REAL NOT NULL DEFAULT 0,
            water REAL NOT NULL DEFAULT 0,
            maintenance REAL NOT NULL DEFAULT 0,
            other REAL NOT NULL DEFAULT 0,
            total_monthly_cost REAL NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS laborer (
            laborer_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            monthly_salary REAL NOT NULL DEFAULT 0,
            is_active INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS work_assignment (
            work_date TEXT NOT NULL,
            laborer_id TEXT NOT NULL REFERENCES laborer(laborer_id) ON DELETE CASCADE,
            attendance TEXT NOT NULL,
            task TEXT,
            PRIMARY KEY (work_date, laborer_id)
        );

        CREATE TABLE IF NOT EXISTS monthly_payroll (
            month TEXT NOT NULL,
            laborer_id TEXT NOT NULL,
            days_worked REAL NOT NULL DEFAULT 0,
            days_absent INTEGER NOT NULL DEFAULT 0,
            base_salary REAL NOT NULL DEFAULT 0,
            bonus REAL NOT NULL DEFAULT 0,
            deductions REAL NOT NULL DEFAULT 0,
            final_salary REAL NOT NULL DEFAULT 0,
            generated_at TEXT NOT NULL,
            PRIMARY KEY (month, laborer_id)
        );

        -- 成本引擎输出（每日一行）
        CREATE TABLE IF NOT EXISTS daily_cost (
            cost_date TEXT PRIMARY KEY,
            total_feed_cost REAL NOT NULL,
            total_eggs_produced INTEGER NOT NULL,
            feed_cost_per_egg REAL NOT NULL,
            fixed_cost_per_egg REAL NOT NULL,
            total_cost_per_egg REAL NOT NULL,
            suggested_price_grade_a REAL NOT NULL,
            suggested_price_grade_b REAL NOT NULL,
            suggested_price_grade_c REAL NOT NULL,
            allocation TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS inventory_item (
            item_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            category TEXT NOT NULL,
            current_stock REAL NOT NULL DEFAULT 0,
            unit TEXT NOT NULL,
            reorder_point REAL,
            storage_location TEXT,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS alert_threshold (
            threshold_id INTEGER PRIMARY KEY AUTOINCREMENT,
            threshold_type TEXT NOT NULL,
            threshold_value REAL NOT NULL,
            comparison_type TEXT NOT NULL DEFAULT 'lte',
            alert_level TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS alert (
            alert_id TEXT PRIMARY KEY,
            alert_type TEXT NOT NULL,
            severity TEXT NOT NULL,
            title TEXT NOT NULL,
            message TEXT NOT NULL,
            farm_section TEXT,
            is_read INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_alert_created_at ON alert(created_at);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}
