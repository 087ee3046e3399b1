// ==========================================
// 蛋鸡场运营 ERP - 领域类型定义
// ==========================================
// 职责: 分摊模式、考勤状态、阈值类型、比较方式
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 成本分摊模式 (Allocation Mode)
// ==========================================
// per_egg: 全场汇总; per_house: 额外按鸡舍拆分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationMode {
    PerEgg,
    PerHouse,
}

impl AllocationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationMode::PerEgg => "per_egg",
            AllocationMode::PerHouse => "per_house",
        }
    }

    /// 从字符串解析（大小写不敏感）
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "per_egg" => Some(AllocationMode::PerEgg),
            "per_house" => Some(AllocationMode::PerHouse),
            _ => None,
        }
    }
}

impl Default for AllocationMode {
    fn default() -> Self {
        AllocationMode::PerEgg
    }
}

impl fmt::Display for AllocationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 考勤状态 (Attendance)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    HalfDay,
    Late,
    Absent,
}

impl AttendanceStatus {
    /// 折算出勤天数
    pub fn day_weight(&self) -> f64 {
        match self {
            AttendanceStatus::Present => 1.0,
            AttendanceStatus::HalfDay => 0.5,
            AttendanceStatus::Late => 0.75,
            AttendanceStatus::Absent => 0.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::HalfDay => "half_day",
            AttendanceStatus::Late => "late",
            AttendanceStatus::Absent => "absent",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "present" => Some(AttendanceStatus::Present),
            "half_day" => Some(AttendanceStatus::HalfDay),
            "late" => Some(AttendanceStatus::Late),
            "absent" => Some(AttendanceStatus::Absent),
            _ => None,
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 阈值类型 (Threshold Kind)
// ==========================================
// 由 threshold_type 后缀推导: low_stock_percent / low_stock_absolute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdKind {
    /// 库存占再订货点的百分比
    Percent,
    /// 库存绝对数量
    Absolute,
    /// 未定义的类型,不参与判定
    Unsupported,
}

impl ThresholdKind {
    pub fn from_threshold_type(threshold_type: &str) -> Self {
        let t = threshold_type.trim().to_lowercase();
        if t.ends_with("percent") {
            ThresholdKind::Percent
        } else if t.ends_with("absolute") {
            ThresholdKind::Absolute
        } else {
            ThresholdKind::Unsupported
        }
    }
}

// ==========================================
// 比较方式 (Comparison Type)
// ==========================================
// 目前仅实现"小于等于"; 其他取值一律视为不命中
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComparisonType {
    LessThanOrEqual,
    Unsupported(String),
}

impl ComparisonType {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "lte" | "<=" | "less_than_or_equal" | "less_than_or_equal_to" => {
                ComparisonType::LessThanOrEqual
            }
            other => ComparisonType::Unsupported(other.to_string()),
        }
    }

    /// 判定 actual 是否命中阈值
    pub fn matches(&self, actual: f64, threshold: f64) -> bool {
        match self {
            ComparisonType::LessThanOrEqual => actual <= threshold,
            ComparisonType::Unsupported(_) => false,
        }
    }
}
