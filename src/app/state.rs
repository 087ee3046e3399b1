// ==========================================
// 蛋鸡场运营 ERP - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use rusqlite::Connection;
use std::sync::{Arc, Mutex};

use crate::api::{ActivityApi, AlertApi, CostApi, PayrollApi};
use crate::config::config_manager::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection};
use crate::engine::{
    AlertDedupStore, CostAllocationEngine, FarmRepositories, InMemoryDedupStore,
    LoggingDispatcher, NotificationDispatcher, PayrollEngine, ThresholdAlertEngine,
};

/// 应用状态
///
/// 所有仓储共享同一个数据库连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    pub config_manager: Arc<ConfigManager>,
    pub repositories: FarmRepositories,

    pub cost_engine: Arc<CostAllocationEngine>,
    pub alert_engine: Arc<ThresholdAlertEngine>,
    pub payroll_engine: Arc<PayrollEngine>,

    pub activity_api: Arc<ActivityApi>,
    pub cost_api: Arc<CostApi>,
    pub alert_api: Arc<AlertApi>,
    pub payroll_api: Arc<PayrollApi>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径（不存在时自动创建并建表）
    ///
    /// # 返回
    /// - Ok(AppState)
    /// - Err(String): 初始化错误
    pub fn new(db_path: String) -> Result<Self, String> {
        Self::with_dispatcher(db_path, Arc::new(LoggingDispatcher))
    }

    /// 使用指定的告警分发器创建 AppState
    pub fn with_dispatcher(
        db_path: String,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        let conn: Arc<Mutex<Connection>> = Arc::new(Mutex::new(conn));

        // ==========================================
        // 配置 + Repository层
        // ==========================================
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        let repositories = FarmRepositories::from_connection(conn);

        // ==========================================
        // Engine层
        // ==========================================
        let cost_config = config_manager
            .load_cost_engine_config()
            .map_err(|e| format!("成本引擎配置加载失败: {}", e))?;
        let alert_config = config_manager
            .load_alert_engine_config()
            .map_err(|e| format!("告警引擎配置加载失败: {}", e))?;

        let data = Arc::new(repositories.clone());
        let cost_engine = Arc::new(CostAllocationEngine::new(data.clone(), cost_config));

        let dedup: Arc<dyn AlertDedupStore> = Arc::new(InMemoryDedupStore::new());
        let alert_engine = Arc::new(ThresholdAlertEngine::new(
            data.clone(),
            dedup,
            dispatcher,
            alert_config,
        ));
        let payroll_engine = Arc::new(PayrollEngine::new(data));

        // ==========================================
        // API层
        // ==========================================
        let activity_api = Arc::new(ActivityApi::new(
            repositories.daily_log_repo.clone(),
            repositories.feed_batch_repo.clone(),
            repositories.operating_cost_repo.clone(),
            repositories.inventory_repo.clone(),
        ));
        let cost_api = Arc::new(CostApi::new(
            cost_engine.clone(),
            repositories.daily_cost_repo.clone(),
        ));
        let alert_api = Arc::new(AlertApi::new(
            alert_engine.clone(),
            repositories.alert_repo.clone(),
            repositories.threshold_repo.clone(),
        ));
        let payroll_api = Arc::new(PayrollApi::new(
            payroll_engine.clone(),
            repositories.payroll_repo.clone(),
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            config_manager,
            repositories,
            cost_engine,
            alert_engine,
            payroll_engine,
            activity_api,
            cost_api,
            alert_api,
            payroll_api,
        })
    }
}

/// 默认数据库路径
///
/// 优先级: POULTRY_ERP_DB_PATH 环境变量 > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("POULTRY_ERP_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./poultry_farm_erp.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("poultry-farm-erp");
        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("poultry_farm_erp.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::NoOpDispatcher;
    use tempfile::TempDir;

    #[test]
    fn test_app_state_initializes_fresh_database() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("erp.db").to_string_lossy().to_string();

        let state = AppState::with_dispatcher(db_path.clone(), Arc::new(NoOpDispatcher)).unwrap();
        assert_eq!(state.db_path, db_path);
        assert_eq!(state.cost_engine.config().feed_batch_lookback, 5);

        // 重复打开同一库（建表幂等）
        assert!(AppState::new(db_path).is_ok());
    }
}
