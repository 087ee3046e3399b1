// ==========================================
// 蛋鸡场运营 ERP - 工资领域模型
// ==========================================

use crate::domain::types::AttendanceStatus;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// Laborer - 工人
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Laborer {
    pub laborer_id: String,
    pub name: String,
    pub monthly_salary: f64,
    pub is_active: bool,
}

// ==========================================
// WorkAssignment - 每日派工/考勤
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkAssignment {
    pub work_date: NaiveDate,
    pub laborer_id: String,
    pub attendance: AttendanceStatus,
    pub task: Option<String>,
}

// ==========================================
// MonthlyPayroll - 月度工资 (每 (月份, 工人) 一行)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPayroll {
    pub month: String,              // YYYY-MM
    pub laborer_id: String,
    pub days_worked: f64,           // 考勤折算天数
    pub days_absent: i64,
    pub base_salary: f64,           // 月薪
    pub bonus: f64,                 // 预留, 当前恒为 0
    pub deductions: f64,            // 预留, 当前恒为 0
    pub final_salary: f64,
    pub generated_at: NaiveDateTime,
}
