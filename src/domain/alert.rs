// ==========================================
// 蛋鸡场运营 ERP - 告警领域模型
// ==========================================
// AlertThreshold: 管理员维护, 告警引擎只读
// Alert:          引擎创建 (未读), 之后仅由"标记已读"修改
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// AlertThreshold - 告警阈值配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertThreshold {
    pub threshold_id: i64,
    pub threshold_type: String,     // 如 low_stock_percent / low_stock_absolute
    pub threshold_value: f64,
    pub comparison_type: String,    // 目前仅 lte 有效
    pub alert_level: String,        // info / warning / critical
    pub is_active: bool,
}

// ==========================================
// NewAlert - 待入库告警
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAlert {
    pub alert_type: String,
    pub severity: String,
    pub title: String,
    pub message: String,
    pub farm_section: Option<String>,
}

// ==========================================
// Alert - 告警记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub alert_id: String,
    pub alert_type: String,
    pub severity: String,
    pub title: String,
    pub message: String,
    pub farm_section: Option<String>,
    pub is_read: bool,
    pub created_at: NaiveDateTime,
}
