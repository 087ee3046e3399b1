// ==========================================
// 蛋鸡场运营 ERP - 生产日志与饲料批次
// ==========================================
// 用途: 成本引擎的只读输入
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// DailyLog - 鸡舍日生产日志
// ==========================================
// 每 (日期, 鸡舍) 一行
// 不变量 eggs_total == grade_a + grade_b + grade_c 由录入边界保证
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyLog {
    pub log_id: Option<i64>,        // 数据库主键 (未入库时为 None)
    pub log_date: NaiveDate,        // 日期
    pub house_id: Option<String>,   // 鸡舍 (可能缺失)
    pub eggs_total: i64,            // 产蛋总数
    pub eggs_grade_a: i64,          // A 级蛋
    pub eggs_grade_b: i64,          // B 级蛋
    pub eggs_grade_c: i64,          // C 级蛋
    pub feed_given_kg: f64,         // 投喂饲料 (kg)
    pub mortality_count: i64,       // 死亡数
    pub notes: Option<String>,
}

impl DailyLog {
    /// 分级合计是否与总数一致
    pub fn grades_consistent(&self) -> bool {
        self.eggs_grade_a + self.eggs_grade_b + self.eggs_grade_c == self.eggs_total
    }
}

// ==========================================
// FeedBatch - 饲料配制批次
// ==========================================
// 创建后不可变, 作为历史价格序列使用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedBatch {
    pub batch_id: Option<i64>,
    pub batch_date: NaiveDate,
    pub batch_size_kg: f64,
    pub cost_per_kg: f64,
    pub recipe_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grades_consistent() {
        let mut log = DailyLog {
            log_id: None,
            log_date: NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
            house_id: Some("H1".to_string()),
            eggs_total: 100,
            eggs_grade_a: 70,
            eggs_grade_b: 20,
            eggs_grade_c: 10,
            feed_given_kg: 12.5,
            mortality_count: 0,
            notes: None,
        };
        assert!(log.grades_consistent());

        log.eggs_grade_c = 11;
        assert!(!log.grades_consistent());
    }
}
