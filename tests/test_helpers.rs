// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据生成等功能
// ==========================================

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use poultry_farm_erp::db::{init_schema, open_sqlite_connection};
use poultry_farm_erp::domain::{DailyLog, FeedBatch, InventoryItem, Laborer};
use poultry_farm_erp::engine::FarmRepositories;
use rusqlite::Connection;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_string_lossy().to_string();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开测试连接（统一 PRAGMA）
pub fn open_test_connection(db_path: &str) -> Result<Connection, Box<dyn Error>> {
    Ok(open_sqlite_connection(db_path)?)
}

/// 创建测试数据库并返回共享连接上的仓储集合
pub fn setup_repositories() -> (NamedTempFile, FarmRepositories) {
    let (temp_file, db_path) = create_test_db().expect("创建测试数据库失败");
    let conn = open_test_connection(&db_path).expect("打开数据库失败");
    let repos = FarmRepositories::from_connection(Arc::new(Mutex::new(conn)));
    (temp_file, repos)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn datetime(y: i32, m: u32, d: u32, hour: u32, minute: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(hour, minute, 0).unwrap()
}

/// 生产日志 (全部记为 A 级)
pub fn daily_log(log_date: NaiveDate, house: Option<&str>, eggs: i64, feed_kg: f64) -> DailyLog {
    DailyLog {
        log_id: None,
        log_date,
        house_id: house.map(|h| h.to_string()),
        eggs_total: eggs,
        eggs_grade_a: eggs,
        eggs_grade_b: 0,
        eggs_grade_c: 0,
        feed_given_kg: feed_kg,
        mortality_count: 0,
        notes: None,
    }
}

pub fn feed_batch(batch_date: NaiveDate, size_kg: f64, cost_per_kg: f64) -> FeedBatch {
    FeedBatch {
        batch_id: None,
        batch_date,
        batch_size_kg: size_kg,
        cost_per_kg,
        recipe_name: Some("layer_mash".to_string()),
    }
}

pub fn inventory_item(item_id: &str, stock: f64, reorder_point: Option<f64>) -> InventoryItem {
    InventoryItem {
        item_id: item_id.to_string(),
        name: format!("物料{}", item_id),
        category: "feed_ingredient".to_string(),
        current_stock: stock,
        unit: "kg".to_string(),
        reorder_point,
        storage_location: Some("饲料库".to_string()),
    }
}

pub fn laborer(id: &str, salary: f64) -> Laborer {
    Laborer {
        laborer_id: id.to_string(),
        name: format!("工人{}", id),
        monthly_salary: salary,
        is_active: true,
    }
}
