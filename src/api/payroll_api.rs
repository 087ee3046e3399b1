// ==========================================
// 蛋鸡场运营 ERP - 工资 API
// ==========================================
// 职责: 工人档案、考勤录入、月度工资生成与查询
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::api::params::{parse_date_param, parse_month_param, require_non_empty, require_non_negative};
use crate::domain::payroll::{Laborer, MonthlyPayroll, WorkAssignment};
use crate::domain::types::AttendanceStatus;
use crate::engine::{PayrollEngine, PayrollRunResult};
use crate::repository::PayrollRepository;

pub struct PayrollApi {
    engine: Arc<PayrollEngine>,
    payroll_repo: Arc<PayrollRepository>,
}

impl PayrollApi {
    pub fn new(engine: Arc<PayrollEngine>, payroll_repo: Arc<PayrollRepository>) -> Self {
        Self {
            engine,
            payroll_repo,
        }
    }

    pub fn upsert_laborer(&self, laborer: &Laborer) -> ApiResult<()> {
        require_non_empty("工人ID", &laborer.laborer_id)?;
        require_non_empty("姓名", &laborer.name)?;
        require_non_negative("月薪", laborer.monthly_salary)?;
        self.payroll_repo.upsert_laborer(laborer)?;
        Ok(())
    }

    /// 录入考勤（同一工人同一天覆写）
    ///
    /// # 参数
    /// - attendance: present / half_day / late / absent
    pub fn record_assignment(
        &self,
        work_date: &str,
        laborer_id: &str,
        attendance: &str,
        task: Option<&str>,
    ) -> ApiResult<()> {
        let work_date = parse_date_param("考勤日期", work_date)?;
        require_non_empty("工人ID", laborer_id)?;
        let attendance = AttendanceStatus::parse(attendance).ok_or_else(|| {
            ApiError::InvalidInput(format!(
                "考勤状态无效(present/half_day/late/absent): {}",
                attendance
            ))
        })?;

        self.payroll_repo.upsert_assignment(&WorkAssignment {
            work_date,
            laborer_id: laborer_id.trim().to_string(),
            attendance,
            task: task.map(str::trim).filter(|t| !t.is_empty()).map(str::to_string),
        })?;
        Ok(())
    }

    /// 生成月度工资 (YYYY-MM)
    pub fn generate_monthly_payroll(&self, month: &str) -> ApiResult<PayrollRunResult> {
        let month = parse_month_param(month)?;
        Ok(self.engine.generate_monthly_payroll(&month)?)
    }

    pub fn list_monthly_payroll(&self, month: &str) -> ApiResult<Vec<MonthlyPayroll>> {
        let month = parse_month_param(month)?;
        Ok(self.payroll_repo.find_payroll_by_month(&month)?)
    }
}
