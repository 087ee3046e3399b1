// ==========================================
// 蛋鸡场运营 ERP - 月度工资汇总
// ==========================================
// 职责: 考勤折算 → 月度实发工资 (每 (月份, 工人) 一行, 幂等覆写)
// 口径: 实发 = 月薪 × 折算出勤天数 / 当月天数 + 奖金 - 扣款
// ==========================================

use crate::domain::calendar::{days_in_month, month_bounds, parse_month_key};
use crate::domain::payroll::{Laborer, MonthlyPayroll, WorkAssignment};
use crate::domain::types::AttendanceStatus;
use crate::engine::data_source::PayrollDataSource;
use crate::engine::error::{EngineError, EngineResult};
use chrono::{NaiveDateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;

#[derive(Debug, Clone, Serialize)]
pub struct PayrollRunResult {
    pub month: String,
    pub payrolls: Vec<MonthlyPayroll>,
    pub total_final_salary: f64,
}

/// 计算单个工人的月度工资
pub fn calculate_payroll(
    month: &str,
    laborer: &Laborer,
    assignments: &[WorkAssignment],
    days_in_month: u32,
    generated_at: NaiveDateTime,
) -> MonthlyPayroll {
    let mut days_worked = 0.0;
    let mut days_absent = 0;

    for assignment in assignments
        .iter()
        .filter(|a| a.laborer_id == laborer.laborer_id)
    {
        if assignment.attendance == AttendanceStatus::Absent {
            days_absent += 1;
        }
        days_worked += assignment.attendance.day_weight();
    }

    let bonus = 0.0;
    let deductions = 0.0;
    let final_salary = if days_in_month > 0 {
        laborer.monthly_salary * days_worked / days_in_month as f64 + bonus - deductions
    } else {
        0.0
    };

    MonthlyPayroll {
        month: month.to_string(),
        laborer_id: laborer.laborer_id.clone(),
        days_worked,
        days_absent,
        base_salary: laborer.monthly_salary,
        bonus,
        deductions,
        final_salary,
        generated_at,
    }
}

pub struct PayrollEngine {
    data: Arc<dyn PayrollDataSource>,
}

impl PayrollEngine {
    pub fn new(data: Arc<dyn PayrollDataSource>) -> Self {
        Self { data }
    }

    /// 生成并写入指定月份 (YYYY-MM) 的工资
    ///
    /// 仅在职工人参与计算; 重复生成覆写同月记录
    #[instrument(skip(self))]
    pub fn generate_monthly_payroll(&self, month: &str) -> EngineResult<PayrollRunResult> {
        let first_day =
            parse_month_key(month).ok_or_else(|| EngineError::InvalidMonth(month.to_string()))?;
        let (start, end) = month_bounds(first_day);
        let month = month.trim();

        let laborers = self.data.get_active_laborers()?;
        let assignments = self.data.get_assignments_between(start, end)?;
        let generated_at = Utc::now().naive_utc();
        let days = days_in_month(first_day);

        let mut payrolls = Vec::with_capacity(laborers.len());
        for laborer in laborers.iter().filter(|l| l.is_active) {
            let payroll = calculate_payroll(month, laborer, &assignments, days, generated_at);
            self.data.upsert_monthly_payroll(&payroll)?;
            payrolls.push(payroll);
        }

        let total_final_salary = payrolls.iter().map(|p| p.final_salary).sum();

        tracing::info!(
            laborers = payrolls.len(),
            assignments = assignments.len(),
            total_final_salary,
            "月度工资已生成"
        );

        Ok(PayrollRunResult {
            month: month.to_string(),
            payrolls,
            total_final_salary,
        })
    }
}
