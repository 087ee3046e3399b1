// ==========================================
// 蛋鸡场运营 ERP - 日成本分摊引擎
// ==========================================
// 职责: 计算并持久化每日单蛋成本
// 输入: 生产日志 + 饲料批次 + 月度运营成本 + 月度工资
// 输出: daily_cost (每日一行, 幂等覆写) + 可选的鸡舍级分摊
// ==========================================
// 口径:
// - 饲料单价 = 最近 N 个批次按批量加权的平均单价
// - 固定成本 = (月运营成本 + 月工资) / 当月天数
// - 单蛋成本 = (饲料成本 + 固定成本) / 当日产蛋数, 无产蛋时为 0
// ==========================================

use crate::domain::activity::{DailyLog, FeedBatch};
use crate::domain::calendar::{days_in_month, month_key};
use crate::domain::cost::{DailyCostResult, HouseAllocation};
use crate::domain::types::AllocationMode;
use crate::engine::data_source::CostDataSource;
use crate::engine::error::{EngineError, EngineResult};
use chrono::{NaiveDate, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::instrument;

/// 无鸡舍编号的日志归入此分组
pub const UNKNOWN_HOUSE: &str = "unknown";

// ==========================================
// CostEngineConfig - 成本引擎配置
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct CostEngineConfig {
    pub feed_batch_lookback: usize, // 加权平均回看批次数: 5
    pub grade_a_markup: f64,        // A 级蛋建议价倍率: 1.2
    pub grade_b_markup: f64,        // B 级蛋建议价倍率: 1.1
    pub grade_c_markup: f64,        // C 级蛋建议价倍率: 1.0
}

impl Default for CostEngineConfig {
    fn default() -> Self {
        Self {
            feed_batch_lookback: 5,
            grade_a_markup: 1.2,
            grade_b_markup: 1.1,
            grade_c_markup: 1.0,
        }
    }
}

// ==========================================
// 日志汇总 (内部)
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
struct HouseBucket {
    eggs: i64,
    feed_kg: f64,
}

#[derive(Debug, Clone, Default)]
struct LogTotals {
    total_eggs: i64,
    total_feed_kg: f64,
    houses: BTreeMap<String, HouseBucket>,
}

fn aggregate_logs(logs: &[DailyLog], group_by_house: bool) -> LogTotals {
    let mut totals = LogTotals::default();

    for log in logs {
        totals.total_eggs += log.eggs_total;
        totals.total_feed_kg += log.feed_given_kg;

        if group_by_house {
            let house = log
                .house_id
                .as_deref()
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .unwrap_or(UNKNOWN_HOUSE)
                .to_string();
            let bucket = totals.houses.entry(house).or_default();
            bucket.eggs += log.eggs_total;
            bucket.feed_kg += log.feed_given_kg;
        }
    }

    totals
}

// ==========================================
// 纯计算函数
// ==========================================

/// 按批量加权的饲料单价
///
/// `batches` 须按日期倒序（首个为最近批次）
/// - 无批次: 0
/// - 批量合计为 0: 取最近批次的单价
pub fn weighted_feed_cost_per_kg(batches: &[FeedBatch]) -> f64 {
    let Some(most_recent) = batches.first() else {
        return 0.0;
    };

    let total_weight: f64 = batches.iter().map(|b| b.batch_size_kg).sum();
    if total_weight <= 0.0 {
        return most_recent.cost_per_kg;
    }

    let weighted_sum: f64 = batches
        .iter()
        .map(|b| b.batch_size_kg * b.cost_per_kg)
        .sum();
    weighted_sum / total_weight
}

/// 单蛋分摊, 产蛋数为 0 时返回 0
pub fn per_egg(amount: f64, eggs: i64) -> f64 {
    if eggs > 0 {
        amount / eggs as f64
    } else {
        0.0
    }
}

/// 保留两位小数
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A/B/C 级建议售价
pub fn suggested_prices(total_cost_per_egg: f64, config: &CostEngineConfig) -> (f64, f64, f64) {
    (
        round2(total_cost_per_egg * config.grade_a_markup),
        round2(total_cost_per_egg * config.grade_b_markup),
        round2(total_cost_per_egg * config.grade_c_markup),
    )
}

fn allocate_houses(
    totals: &LogTotals,
    feed_cost_per_kg: f64,
    daily_op_share: f64,
    daily_payroll_share: f64,
) -> Vec<HouseAllocation> {
    totals
        .houses
        .iter()
        .map(|(house_id, bucket)| {
            let egg_share = if totals.total_eggs > 0 {
                bucket.eggs as f64 / totals.total_eggs as f64
            } else {
                0.0
            };
            let feed_cost = bucket.feed_kg * feed_cost_per_kg;
            let operating_cost = daily_op_share * egg_share;
            let payroll_cost = daily_payroll_share * egg_share;
            let feed_cost_per_egg = per_egg(feed_cost, bucket.eggs);
            let fixed_cost_per_egg = per_egg(operating_cost + payroll_cost, bucket.eggs);

            HouseAllocation {
                house_id: house_id.clone(),
                eggs: bucket.eggs,
                feed_kg: bucket.feed_kg,
                egg_share,
                feed_cost,
                operating_cost,
                payroll_cost,
                feed_cost_per_egg,
                fixed_cost_per_egg,
                total_cost_per_egg: feed_cost_per_egg + fixed_cost_per_egg,
            }
        })
        .collect()
}

// ==========================================
// CostAllocationEngine - 日成本分摊引擎
// ==========================================
pub struct CostAllocationEngine {
    data: Arc<dyn CostDataSource>,
    config: CostEngineConfig,
}

impl CostAllocationEngine {
    pub fn new(data: Arc<dyn CostDataSource>, config: CostEngineConfig) -> Self {
        Self { data, config }
    }

    pub fn config(&self) -> &CostEngineConfig {
        &self.config
    }

    /// 计算并写入指定日期的日成本
    ///
    /// # 参数
    /// - `date`: 成本日期
    /// - `allocation`: 分摊模式; PerHouse 时额外返回鸡舍级分摊 (不持久化)
    ///
    /// # 返回
    /// - Ok(DailyCostResult)
    /// - Err: 任一数据访问失败 (不重试)
    ///
    /// 同一日期重复计算会覆写已有行, 不会产生重复记录
    #[instrument(skip_all, fields(date = %date, allocation = %allocation))]
    pub fn compute_daily_cost(
        &self,
        date: NaiveDate,
        allocation: AllocationMode,
    ) -> EngineResult<DailyCostResult> {
        // 1. 汇总当日生产日志
        let logs = self.data.get_logs_for_date(date)?;
        let totals = aggregate_logs(&logs, allocation == AllocationMode::PerHouse);

        // 2. 饲料加权单价
        let batches = self
            .data
            .get_recent_batches(date, self.config.feed_batch_lookback)?;
        let feed_cost_per_kg = weighted_feed_cost_per_kg(&batches);
        let total_feed_cost = feed_cost_per_kg * totals.total_feed_kg;

        // 3. 月度固定成本按天摊销 (缺失按 0 计)
        let month = month_key(date);
        let days = days_in_month(date) as f64;
        let operating_total = self
            .data
            .get_operating_cost(&month)?
            .map(|c| c.total_monthly_cost)
            .unwrap_or(0.0);
        let payroll_total = self.data.get_payroll_total(&month)?;
        let daily_op_share = operating_total / days;
        let daily_payroll_share = payroll_total / days;
        let fixed_costs_total = daily_op_share + daily_payroll_share;

        // 4. 单蛋成本
        let feed_cost_per_egg = per_egg(total_feed_cost, totals.total_eggs);
        let fixed_cost_per_egg = per_egg(fixed_costs_total, totals.total_eggs);
        let total_cost_per_egg = feed_cost_per_egg + fixed_cost_per_egg;

        // 5. 鸡舍级分摊
        let house_allocations = match allocation {
            AllocationMode::PerHouse => {
                allocate_houses(&totals, feed_cost_per_kg, daily_op_share, daily_payroll_share)
            }
            AllocationMode::PerEgg => Vec::new(),
        };

        // 6. 建议售价
        let (price_a, price_b, price_c) = suggested_prices(total_cost_per_egg, &self.config);

        let result = DailyCostResult {
            date,
            total_feed_cost,
            total_eggs_produced: totals.total_eggs,
            feed_cost_per_kg,
            fixed_costs_total,
            feed_cost_per_egg,
            fixed_cost_per_egg,
            total_cost_per_egg,
            suggested_price_grade_a: price_a,
            suggested_price_grade_b: price_b,
            suggested_price_grade_c: price_c,
            allocation,
            house_allocations,
        };

        // 7. 幂等写入
        self.data
            .upsert_daily_cost(&result.to_record(Utc::now().naive_utc()))?;

        tracing::info!(
            logs = logs.len(),
            batches = batches.len(),
            total_eggs = result.total_eggs_produced,
            total_cost_per_egg = result.total_cost_per_egg,
            "日成本已计算并写入"
        );

        Ok(result)
    }

    /// 按日期范围逐日重算（含两端, 顺序执行）
    ///
    /// 任一日失败即中止, 已写入的日期不回滚
    #[instrument(skip_all, fields(start = %start_date, end = %end_date, allocation = %allocation))]
    pub fn recalculate_range(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        allocation: AllocationMode,
    ) -> EngineResult<Vec<DailyCostResult>> {
        if start_date > end_date {
            return Err(EngineError::InvalidDateRange {
                start: start_date,
                end: end_date,
            });
        }

        let mut results = Vec::new();
        let mut current = start_date;
        loop {
            results.push(self.compute_daily_cost(current, allocation)?);
            if current >= end_date {
                break;
            }
            current = match current.succ_opt() {
                Some(next) => next,
                None => break,
            };
        }

        tracing::info!(days = results.len(), "日期范围重算完成");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cost::{DailyCost, OperatingCost};
    use crate::repository::error::{RepositoryError, RepositoryResult};
    use std::sync::Mutex;

    // ==========================================
    // 测试辅助
    // ==========================================

    #[derive(Default)]
    struct MockCostData {
        logs: Vec<DailyLog>,
        batches: Vec<FeedBatch>,
        operating: Option<OperatingCost>,
        payroll_total: f64,
        fail_logs: bool,
        requested_limits: Mutex<Vec<usize>>,
        upserts: Mutex<Vec<DailyCost>>,
    }

    impl CostDataSource for MockCostData {
        fn get_logs_for_date(&self, date: NaiveDate) -> RepositoryResult<Vec<DailyLog>> {
            if self.fail_logs {
                return Err(RepositoryError::DatabaseQueryError("disk I/O error".to_string()));
            }
            Ok(self.logs.iter().filter(|l| l.log_date == date).cloned().collect())
        }

        fn get_recent_batches(
            &self,
            on_or_before: NaiveDate,
            limit: usize,
        ) -> RepositoryResult<Vec<FeedBatch>> {
            self.requested_limits.lock().unwrap().push(limit);
            let mut batches: Vec<FeedBatch> = self
                .batches
                .iter()
                .filter(|b| b.batch_date <= on_or_before)
                .cloned()
                .collect();
            batches.sort_by(|a, b| b.batch_date.cmp(&a.batch_date));
            batches.truncate(limit);
            Ok(batches)
        }

        fn get_operating_cost(&self, month: &str) -> RepositoryResult<Option<OperatingCost>> {
            Ok(self.operating.clone().filter(|c| c.month == month))
        }

        fn get_payroll_total(&self, _month: &str) -> RepositoryResult<f64> {
            Ok(self.payroll_total)
        }

        fn upsert_daily_cost(&self, record: &DailyCost) -> RepositoryResult<()> {
            self.upserts.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn log(day: NaiveDate, house: Option<&str>, eggs: i64, feed_kg: f64) -> DailyLog {
        DailyLog {
            log_id: None,
            log_date: day,
            house_id: house.map(|h| h.to_string()),
            eggs_total: eggs,
            eggs_grade_a: eggs,
            eggs_grade_b: 0,
            eggs_grade_c: 0,
            feed_given_kg: feed_kg,
            mortality_count: 0,
            notes: None,
        }
    }

    fn batch(day: NaiveDate, size: f64, cost: f64) -> FeedBatch {
        FeedBatch {
            batch_id: None,
            batch_date: day,
            batch_size_kg: size,
            cost_per_kg: cost,
            recipe_name: None,
        }
    }

    fn engine(data: MockCostData) -> (CostAllocationEngine, Arc<MockCostData>) {
        let data = Arc::new(data);
        let engine = CostAllocationEngine::new(data.clone(), CostEngineConfig::default());
        (engine, data)
    }

    // ==========================================
    // 纯函数测试
    // ==========================================

    #[test]
    fn test_weighted_feed_cost_per_kg() {
        let d = date(2025, 8, 1);
        let batches = vec![batch(d, 30.0, 4.0), batch(d, 10.0, 2.0)];
        assert_eq!(weighted_feed_cost_per_kg(&batches), 3.5);
    }

    #[test]
    fn test_weighted_feed_cost_zero_weight_uses_most_recent() {
        let batches = vec![
            batch(date(2025, 8, 2), 0.0, 4.2),
            batch(date(2025, 8, 1), 0.0, 3.0),
        ];
        assert_eq!(weighted_feed_cost_per_kg(&batches), 4.2);
        assert_eq!(weighted_feed_cost_per_kg(&[]), 0.0);
    }

    #[test]
    fn test_suggested_prices_markup() {
        let (a, b, c) = suggested_prices(1.0, &CostEngineConfig::default());
        assert_eq!(a, 1.2);
        assert_eq!(b, 1.1);
        assert_eq!(c, 1.0);

        let (a, _, _) = suggested_prices(0.123456, &CostEngineConfig::default());
        assert_eq!(a, 0.15);
    }

    #[test]
    fn test_per_egg_guards_zero() {
        assert_eq!(per_egg(10.0, 0), 0.0);
        assert_eq!(per_egg(10.0, 4), 2.5);
    }

    // ==========================================
    // 引擎测试
    // ==========================================

    #[test]
    fn test_zero_eggs_yields_zero_figures() {
        let d = date(2025, 8, 10);
        let (engine, data) = engine(MockCostData {
            batches: vec![batch(d, 100.0, 3.0)],
            operating: Some(OperatingCost::from_components("2025-08", 3100.0, 0.0, 0.0, 0.0)),
            payroll_total: 620.0,
            ..Default::default()
        });

        let result = engine.compute_daily_cost(d, AllocationMode::PerEgg).unwrap();

        assert_eq!(result.total_eggs_produced, 0);
        assert_eq!(result.feed_cost_per_egg, 0.0);
        assert_eq!(result.fixed_cost_per_egg, 0.0);
        assert_eq!(result.total_cost_per_egg, 0.0);
        assert_eq!(result.suggested_price_grade_a, 0.0);
        assert!(!result.total_cost_per_egg.is_nan());
        assert_eq!(data.upserts.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_fixed_costs_amortized_over_month() {
        let d = date(2025, 8, 10);
        let (engine, _data) = engine(MockCostData {
            logs: vec![log(d, Some("H1"), 1000, 0.0)],
            operating: Some(OperatingCost::from_components("2025-08", 3100.0, 0.0, 0.0, 0.0)),
            payroll_total: 620.0,
            ..Default::default()
        });

        let result = engine.compute_daily_cost(d, AllocationMode::PerEgg).unwrap();

        // 3100/31 + 620/31 = 120 / 1000 枚
        assert!((result.fixed_costs_total - 120.0).abs() < 1e-9);
        assert!((result.fixed_cost_per_egg - 0.12).abs() < 1e-12);
        assert_eq!(result.feed_cost_per_egg, 0.0);
    }

    #[test]
    fn test_missing_fixed_cost_rows_default_to_zero() {
        let d = date(2025, 8, 10);
        let (engine, _data) = engine(MockCostData {
            logs: vec![log(d, None, 200, 20.0)],
            batches: vec![batch(date(2025, 8, 1), 10.0, 2.0)],
            // 运营成本属于其他月份
            operating: Some(OperatingCost::from_components("2025-07", 999.0, 0.0, 0.0, 0.0)),
            ..Default::default()
        });

        let result = engine.compute_daily_cost(d, AllocationMode::PerEgg).unwrap();

        assert_eq!(result.fixed_costs_total, 0.0);
        assert_eq!(result.total_feed_cost, 40.0);
        assert_eq!(result.feed_cost_per_egg, 0.2);
    }

    #[test]
    fn test_lookback_is_configurable() {
        let d = date(2025, 8, 10);
        let data = Arc::new(MockCostData::default());
        let config = CostEngineConfig {
            feed_batch_lookback: 3,
            ..CostEngineConfig::default()
        };
        let engine = CostAllocationEngine::new(data.clone(), config);

        engine.compute_daily_cost(d, AllocationMode::PerEgg).unwrap();

        assert_eq!(*data.requested_limits.lock().unwrap(), vec![3]);
    }

    #[test]
    fn test_per_house_allocation_sums_to_aggregate() {
        let d = date(2025, 8, 10);
        let (engine, _data) = engine(MockCostData {
            logs: vec![
                log(d, Some("H1"), 600, 70.0),
                log(d, Some("H2"), 300, 35.5),
                log(d, None, 100, 10.25),
            ],
            batches: vec![batch(date(2025, 8, 9), 10.0, 2.0), batch(date(2025, 8, 8), 30.0, 4.0)],
            operating: Some(OperatingCost::from_components("2025-08", 1550.0, 0.0, 0.0, 0.0)),
            payroll_total: 3100.0,
            ..Default::default()
        });

        let result = engine.compute_daily_cost(d, AllocationMode::PerHouse).unwrap();

        assert_eq!(result.allocation, AllocationMode::PerHouse);
        assert_eq!(result.house_allocations.len(), 3);
        let ids: Vec<&str> = result
            .house_allocations
            .iter()
            .map(|h| h.house_id.as_str())
            .collect();
        assert_eq!(ids, vec!["H1", "H2", UNKNOWN_HOUSE]);

        let feed_sum: f64 = result.house_allocations.iter().map(|h| h.feed_cost).sum();
        assert!((feed_sum - result.total_feed_cost).abs() < 1e-9);

        let fixed_sum: f64 = result
            .house_allocations
            .iter()
            .map(|h| h.operating_cost + h.payroll_cost)
            .sum();
        assert!((fixed_sum - result.fixed_costs_total).abs() < 1e-9);

        let h1 = &result.house_allocations[0];
        assert!((h1.egg_share - 0.6).abs() < 1e-12);
        assert!((h1.feed_cost - 70.0 * 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_per_egg_mode_has_no_house_breakdown() {
        let d = date(2025, 8, 10);
        let (engine, _data) = engine(MockCostData {
            logs: vec![log(d, Some("H1"), 10, 1.0)],
            ..Default::default()
        });

        let result = engine.compute_daily_cost(d, AllocationMode::PerEgg).unwrap();
        assert!(result.house_allocations.is_empty());
    }

    #[test]
    fn test_recalculate_range_in_order() {
        let (engine, data) = engine(MockCostData::default());

        let results = engine
            .recalculate_range(date(2025, 8, 1), date(2025, 8, 3), AllocationMode::PerEgg)
            .unwrap();

        let dates: Vec<NaiveDate> = results.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![date(2025, 8, 1), date(2025, 8, 2), date(2025, 8, 3)]);
        assert_eq!(data.upserts.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_recalculate_range_rejects_inverted_range() {
        let (engine, _data) = engine(MockCostData::default());
        let err = engine
            .recalculate_range(date(2025, 8, 3), date(2025, 8, 1), AllocationMode::PerEgg)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidDateRange { .. }));
    }

    #[test]
    fn test_data_access_error_propagates() {
        let (engine, data) = engine(MockCostData {
            fail_logs: true,
            ..Default::default()
        });

        let err = engine
            .compute_daily_cost(date(2025, 8, 1), AllocationMode::PerEgg)
            .unwrap_err();
        assert!(matches!(err, EngineError::Repository(_)));
        assert!(data.upserts.lock().unwrap().is_empty());
    }
}
