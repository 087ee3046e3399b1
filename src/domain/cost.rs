// ==========================================
// 蛋鸡场运营 ERP - 成本领域模型
// ==========================================
// OperatingCost: 月度固定成本 (每月至多一行)
// DailyCost:     引擎持久化输出 (每日一行, 幂等覆写)
// DailyCostResult / HouseAllocation: 引擎返回值
// ==========================================

use crate::domain::types::AllocationMode;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// OperatingCost - 月度运营成本
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatingCost {
    pub month: String,              // YYYY-MM
    pub electricity: f64,
    pub water: f64,
    pub maintenance: f64,
    pub other: f64,
    pub total_monthly_cost: f64,    // 汇总口径 (成本引擎只读此字段)
}

impl OperatingCost {
    /// 由分项构造, total 为分项之和
    pub fn from_components(
        month: &str,
        electricity: f64,
        water: f64,
        maintenance: f64,
        other: f64,
    ) -> Self {
        Self {
            month: month.to_string(),
            electricity,
            water,
            maintenance,
            other,
            total_monthly_cost: electricity + water + maintenance + other,
        }
    }
}

// ==========================================
// DailyCost - 日成本记录 (持久化)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCost {
    pub cost_date: NaiveDate,
    pub total_feed_cost: f64,
    pub total_eggs_produced: i64,
    pub feed_cost_per_egg: f64,
    pub fixed_cost_per_egg: f64,
    pub total_cost_per_egg: f64,
    pub suggested_price_grade_a: f64,
    pub suggested_price_grade_b: f64,
    pub suggested_price_grade_c: f64,
    pub allocation: AllocationMode,
    pub updated_at: NaiveDateTime,
}

// ==========================================
// HouseAllocation - 鸡舍级分摊 (仅返回, 不持久化)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseAllocation {
    pub house_id: String,           // 无鸡舍的日志归入 "unknown"
    pub eggs: i64,
    pub feed_kg: f64,
    pub egg_share: f64,             // 占全场产蛋比例
    pub feed_cost: f64,
    pub operating_cost: f64,
    pub payroll_cost: f64,
    pub feed_cost_per_egg: f64,
    pub fixed_cost_per_egg: f64,
    pub total_cost_per_egg: f64,
}

// ==========================================
// DailyCostResult - 日成本计算结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCostResult {
    pub date: NaiveDate,
    pub total_feed_cost: f64,
    pub total_eggs_produced: i64,
    pub feed_cost_per_kg: f64,
    pub fixed_costs_total: f64,
    pub feed_cost_per_egg: f64,
    pub fixed_cost_per_egg: f64,
    pub total_cost_per_egg: f64,
    pub suggested_price_grade_a: f64,
    pub suggested_price_grade_b: f64,
    pub suggested_price_grade_c: f64,
    pub allocation: AllocationMode,
    pub house_allocations: Vec<HouseAllocation>,
}

impl DailyCostResult {
    /// 转换为待持久化记录
    pub fn to_record(&self, updated_at: NaiveDateTime) -> DailyCost {
        DailyCost {
            cost_date: self.date,
            total_feed_cost: self.total_feed_cost,
            total_eggs_produced: self.total_eggs_produced,
            feed_cost_per_egg: self.feed_cost_per_egg,
            fixed_cost_per_egg: self.fixed_cost_per_egg,
            total_cost_per_egg: self.total_cost_per_egg,
            suggested_price_grade_a: self.suggested_price_grade_a,
            suggested_price_grade_b: self.suggested_price_grade_b,
            suggested_price_grade_c: self.suggested_price_grade_c,
            allocation: self.allocation,
            updated_at,
        }
    }
}
