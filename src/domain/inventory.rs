// ==========================================
// 蛋鸡场运营 ERP - 库存物料
// ==========================================

use serde::{Deserialize, Serialize};

/// 库存物料 (饲料原料、药品、包装等)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub item_id: String,
    pub name: String,
    pub category: String,
    pub current_stock: f64,
    pub unit: String,
    pub reorder_point: Option<f64>,         // 再订货点, 缺失或为 0 时不参与告警
    pub storage_location: Option<String>,   // 存放区域, 作为告警 farm_section
}

impl InventoryItem {
    /// 库存占再订货点的百分比
    ///
    /// 再订货点缺失或为 0 时返回 None
    pub fn percent_remaining(&self) -> Option<f64> {
        match self.reorder_point {
            Some(rp) if rp != 0.0 => Some(self.current_stock / rp * 100.0),
            _ => None,
        }
    }
}
