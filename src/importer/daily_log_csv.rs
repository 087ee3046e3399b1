// ==========================================
// 蛋鸡场运营 ERP - 生产日志 CSV 导入
// ==========================================
// 表头: log_date,house_id,eggs_total,eggs_grade_a,eggs_grade_b,
//       eggs_grade_c,feed_given_kg,mortality_count[,notes]
// 规则:
// - 日期 YYYY-MM-DD, 数值非负
// - eggs_total == A + B + C
// - 同 (日期, 鸡舍) 重复导入时覆写
// ==========================================

use crate::domain::activity::DailyLog;
use crate::domain::calendar::parse_date;
use crate::importer::error::{ImportError, ImportResult};
use crate::repository::DailyLogRepository;
use csv::ReaderBuilder;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::instrument;

/// 必需列
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "log_date",
    "eggs_total",
    "eggs_grade_a",
    "eggs_grade_b",
    "eggs_grade_c",
    "feed_given_kg",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowIssue {
    pub row: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DailyLogImportReport {
    pub total_rows: usize,
    pub imported: usize,
    pub issues: Vec<RowIssue>,
}

pub struct DailyLogCsvImporter {
    repo: Arc<DailyLogRepository>,
}

impl DailyLogCsvImporter {
    pub fn new(repo: Arc<DailyLogRepository>) -> Self {
        Self { repo }
    }

    /// 导入 CSV 文件
    ///
    /// # 返回
    /// - Ok(report): 文件可读; 行级错误在 report.issues 中
    /// - Err: 文件不存在 / 格式不支持 / 缺少必需列 / CSV 结构损坏
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn import_file(&self, path: &Path) -> ImportResult<DailyLogImportReport> {
        let rows = read_csv_rows(path)?;
        let mut report = DailyLogImportReport {
            total_rows: rows.len(),
            ..Default::default()
        };

        for (row, fields) in rows {
            let outcome = parse_row(row, &fields).and_then(|log| {
                self.repo
                    .upsert(&log)
                    .map_err(|source| ImportError::RowWriteError { row, source })
            });

            match outcome {
                Ok(_) => report.imported += 1,
                Err(e) => {
                    tracing::warn!(row, error = %e, "导入行被跳过");
                    report.issues.push(RowIssue {
                        row,
                        message: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            total_rows = report.total_rows,
            imported = report.imported,
            rejected = report.issues.len(),
            "生产日志导入完成"
        );
        Ok(report)
    }
}

/// 读取 CSV 为 (行号, 列名 → 值) 列表
///
/// 行号按文件行计 (表头为第 1 行); 全空行跳过
fn read_csv_rows(path: &Path) -> ImportResult<Vec<(usize, HashMap<String, String>)>> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    if let Some(ext) = path.extension() {
        if !ext.eq_ignore_ascii_case("csv") {
            return Err(ImportError::UnsupportedFormat(
                ext.to_string_lossy().to_string(),
            ));
        }
    }

    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // 允许行长度不一致
        .from_reader(file);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(ImportError::MissingColumn(column.to_string()));
        }
    }

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result?;
        let mut row_map = HashMap::new();
        for (col_idx, value) in record.iter().enumerate() {
            if let Some(header) = headers.get(col_idx) {
                row_map.insert(header.clone(), value.trim().to_string());
            }
        }

        if row_map.values().all(|v| v.is_empty()) {
            continue;
        }

        rows.push((idx + 2, row_map));
    }

    Ok(rows)
}

fn field<'a>(fields: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    fields
        .get(name)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
}

fn required<'a>(
    row: usize,
    fields: &'a HashMap<String, String>,
    name: &str,
) -> ImportResult<&'a str> {
    field(fields, name).ok_or_else(|| ImportError::MissingField {
        row,
        field: name.to_string(),
    })
}

fn parse_count(row: usize, name: &str, raw: &str) -> ImportResult<i64> {
    let value = raw
        .parse::<i64>()
        .map_err(|e| ImportError::TypeConversionError {
            row,
            field: name.to_string(),
            message: format!("{} ({})", e, raw),
        })?;
    if value < 0 {
        return Err(ImportError::NegativeValue {
            row,
            field: name.to_string(),
            value: value as f64,
        });
    }
    Ok(value)
}

fn parse_quantity(row: usize, name: &str, raw: &str) -> ImportResult<f64> {
    let value = raw
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ImportError::TypeConversionError {
            row,
            field: name.to_string(),
            message: format!("无法解析为数值 ({})", raw),
        })?;
    if value < 0.0 {
        return Err(ImportError::NegativeValue {
            row,
            field: name.to_string(),
            value,
        });
    }
    Ok(value)
}

/// 单行 → DailyLog
pub fn parse_row(row: usize, fields: &HashMap<String, String>) -> ImportResult<DailyLog> {
    let raw_date = required(row, fields, "log_date")?;
    let log_date = parse_date(raw_date).ok_or_else(|| ImportError::DateFormatError {
        row,
        field: "log_date".to_string(),
        value: raw_date.to_string(),
    })?;

    let eggs_total = parse_count(row, "eggs_total", required(row, fields, "eggs_total")?)?;
    let eggs_grade_a = parse_count(row, "eggs_grade_a", required(row, fields, "eggs_grade_a")?)?;
    let eggs_grade_b = parse_count(row, "eggs_grade_b", required(row, fields, "eggs_grade_b")?)?;
    let eggs_grade_c = parse_count(row, "eggs_grade_c", required(row, fields, "eggs_grade_c")?)?;
    let feed_given_kg =
        parse_quantity(row, "feed_given_kg", required(row, fields, "feed_given_kg")?)?;
    let mortality_count = match field(fields, "mortality_count") {
        Some(raw) => parse_count(row, "mortality_count", raw)?,
        None => 0,
    };

    let log = DailyLog {
        log_id: None,
        log_date,
        house_id: field(fields, "house_id").map(str::to_string),
        eggs_total,
        eggs_grade_a,
        eggs_grade_b,
        eggs_grade_c,
        feed_given_kg,
        mortality_count,
        notes: field(fields, "notes").map(str::to_string),
    };

    if !log.grades_consistent() {
        return Err(ImportError::GradeMismatch {
            row,
            total: eggs_total,
            graded: eggs_grade_a + eggs_grade_b + eggs_grade_c,
        });
    }

    Ok(log)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rusqlite::Connection;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    fn setup_repo() -> Arc<DailyLogRepository> {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        Arc::new(DailyLogRepository::from_connection(Arc::new(Mutex::new(conn))))
    }

    fn csv_file(lines: &[&str]) -> NamedTempFile {
        let mut temp_file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        for line in lines {
            writeln!(temp_file, "{}", line).unwrap();
        }
        temp_file
    }

    const HEADER: &str =
        "log_date,house_id,eggs_total,eggs_grade_a,eggs_grade_b,eggs_grade_c,feed_given_kg,mortality_count";

    #[test]
    fn test_import_valid_and_invalid_rows() {
        let repo = setup_repo();
        let importer = DailyLogCsvImporter::new(repo.clone());
        let file = csv_file(&[
            HEADER,
            "2025-08-01,H1,100,70,20,10,12.5,0",
            "2025-08-01,H2,100,70,20,5,12.5,0",
            "2025/08/01,H3,10,10,0,0,1.0,0",
            ",,,,,,,",
            "2025-08-01,H4,-5,0,0,0,1.0,0",
            "2025-08-01,,50,50,0,0,6,1",
        ]);

        let report = importer.import_file(file.path()).unwrap();

        assert_eq!(report.total_rows, 5);
        assert_eq!(report.imported, 2);
        let bad_rows: Vec<usize> = report.issues.iter().map(|i| i.row).collect();
        assert_eq!(bad_rows, vec![3, 4, 6]);

        let logs = repo
            .find_by_date(NaiveDate::from_ymd_opt(2025, 8, 1).unwrap())
            .unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs.iter().map(|l| l.eggs_total).sum::<i64>(), 150);
    }

    #[test]
    fn test_missing_required_column() {
        let importer = DailyLogCsvImporter::new(setup_repo());
        let file = csv_file(&["log_date,house_id,eggs_total", "2025-08-01,H1,100"]);

        let err = importer.import_file(file.path()).unwrap_err();
        assert!(matches!(err, ImportError::MissingColumn(ref c) if c == "eggs_grade_a"));
    }

    #[test]
    fn test_file_not_found() {
        let importer = DailyLogCsvImporter::new(setup_repo());
        let err = importer
            .import_file(Path::new("no_such_daily_log.csv"))
            .unwrap_err();
        assert!(matches!(err, ImportError::FileNotFound(_)));
    }

    #[test]
    fn test_parse_row_grade_mismatch() {
        let fields: HashMap<String, String> = [
            ("log_date", "2025-08-01"),
            ("eggs_total", "10"),
            ("eggs_grade_a", "5"),
            ("eggs_grade_b", "2"),
            ("eggs_grade_c", "1"),
            ("feed_given_kg", "1.5"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let err = parse_row(7, &fields).unwrap_err();
        assert!(matches!(
            err,
            ImportError::GradeMismatch { row: 7, total: 10, graded: 8 }
        ));
        assert_eq!(err.row(), Some(7));
    }
}
