// ==========================================
// 蛋鸡场运营 ERP - 工人/考勤/工资仓储
// ==========================================
// 涉及表: laborer, work_assignment, monthly_payroll
// ==========================================

use crate::domain::payroll::{Laborer, MonthlyPayroll, WorkAssignment};
use crate::domain::types::AttendanceStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

fn map_laborer(row: &Row<'_>) -> SqliteResult<Laborer> {
    Ok(Laborer {
        laborer_id: row.get(0)?,
        name: row.get(1)?,
        monthly_salary: row.get(2)?,
        is_active: row.get::<_, i64>(3)? != 0,
    })
}

fn map_assignment(row: &Row<'_>) -> SqliteResult<WorkAssignment> {
    let raw: String = row.get(2)?;
    let attendance = AttendanceStatus::parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            Type::Text,
            format!("未知考勤状态: {}", raw).into(),
        )
    })?;

    Ok(WorkAssignment {
        work_date: row.get(0)?,
        laborer_id: row.get(1)?,
        attendance,
        task: row.get(3)?,
    })
}

fn map_payroll(row: &Row<'_>) -> SqliteResult<MonthlyPayroll> {
    Ok(MonthlyPayroll {
        month: row.get(0)?,
        laborer_id: row.get(1)?,
        days_worked: row.get(2)?,
        days_absent: row.get(3)?,
        base_salary: row.get(4)?,
        bonus: row.get(5)?,
        deductions: row.get(6)?,
        final_salary: row.get(7)?,
        generated_at: row.get(8)?,
    })
}

/// 工资相关仓储
pub struct PayrollRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PayrollRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ===== 工人 =====

    /// 新增或更新工人
    pub fn upsert_laborer(&self, laborer: &Laborer) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO laborer (laborer_id, name, monthly_salary, is_active)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(laborer_id) DO UPDATE SET
                name = excluded.name,
                monthly_salary = excluded.monthly_salary,
                is_active = excluded.is_active
            "#,
            params![
                laborer.laborer_id,
                laborer.name,
                laborer.monthly_salary,
                laborer.is_active as i64,
            ],
        )?;
        Ok(())
    }

    /// 查询在职工人
    pub fn find_active_laborers(&self) -> RepositoryResult<Vec<Laborer>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT laborer_id, name, monthly_salary, is_active
            FROM laborer
            WHERE is_active = 1
            ORDER BY laborer_id
            "#,
        )?;
        let laborers = stmt
            .query_map([], map_laborer)?
            .collect::<SqliteResult<Vec<Laborer>>>()?;
        Ok(laborers)
    }

    // ===== 考勤 =====

    /// 记录派工/考勤（同一天同一工人覆写）
    pub fn upsert_assignment(&self, assignment: &WorkAssignment) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO work_assignment (work_date, laborer_id, attendance, task)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(work_date, laborer_id) DO UPDATE SET
                attendance = excluded.attendance,
                task = excluded.task
            "#,
            params![
                assignment.work_date,
                assignment.laborer_id,
                assignment.attendance.as_str(),
                assignment.task,
            ],
        )?;
        Ok(())
    }

    /// 查询日期范围内的考勤（含两端）
    pub fn find_assignments_in_range(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> RepositoryResult<Vec<WorkAssignment>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT work_date, laborer_id, attendance, task
            FROM work_assignment
            WHERE work_date BETWEEN ?1 AND ?2
            ORDER BY work_date, laborer_id
            "#,
        )?;
        let rows = stmt
            .query_map(params![start_date, end_date], map_assignment)?
            .collect::<SqliteResult<Vec<WorkAssignment>>>()?;
        Ok(rows)
    }

    // ===== 月度工资 =====

    /// 插入或覆盖 (月份, 工人) 工资行
    pub fn upsert_monthly_payroll(&self, payroll: &MonthlyPayroll) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO monthly_payroll (
                month, laborer_id, days_worked, days_absent, base_salary,
                bonus, deductions, final_salary, generated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(month, laborer_id) DO UPDATE SET
                days_worked = excluded.days_worked,
                days_absent = excluded.days_absent,
                base_salary = excluded.base_salary,
                bonus = excluded.bonus,
                deductions = excluded.deductions,
                final_salary = excluded.final_salary,
                generated_at = excluded.generated_at
            "#,
            params![
                payroll.month,
                payroll.laborer_id,
                payroll.days_worked,
                payroll.days_absent,
                payroll.base_salary,
                payroll.bonus,
                payroll.deductions,
                payroll.final_salary,
                payroll.generated_at,
            ],
        )?;
        Ok(())
    }

    /// 查询某月全部工资行
    pub fn find_payroll_by_month(&self, month: &str) -> RepositoryResult<Vec<MonthlyPayroll>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT month, laborer_id, days_worked, days_absent, base_salary,
                   bonus, deductions, final_salary, generated_at
            FROM monthly_payroll
            WHERE month = ?1
            ORDER BY laborer_id
            "#,
        )?;
        let rows = stmt
            .query_map(params![month], map_payroll)?
            .collect::<SqliteResult<Vec<MonthlyPayroll>>>()?;
        Ok(rows)
    }

    /// 某月实发工资合计（无记录时为 0）
    pub fn sum_final_salary(&self, month: &str) -> RepositoryResult<f64> {
        let conn = self.get_conn()?;
        let total: f64 = conn.query_row(
            "SELECT COALESCE(SUM(final_salary), 0.0) FROM monthly_payroll WHERE month = ?1",
            params![month],
            |row| row.get(0),
        )?;
        Ok(total)
    }
}
