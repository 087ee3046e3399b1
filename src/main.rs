// ==========================================
// 蛋鸡场运营 ERP - 命令行入口
// ==========================================
// 用法:
//   poultry-farm-erp [--db <path>] <command> [args]
//
// 命令:
//   cost <YYYY-MM-DD> [per_egg|per_house]
//   recalc <start> <end> [per_egg|per_house]
//   alerts                        执行一次阈值评估
//   list-alerts [--unread]
//   mark-read <alert_id>
//   mark-all-read
//   payroll <YYYY-MM>
//   import-logs <csv_path>
//   config                        输出配置快照
// ==========================================

use anyhow::{anyhow, bail, Context};
use poultry_farm_erp::app::{get_default_db_path, AppState};
use serde::Serialize;
use std::path::Path;

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_usage() {
    println!("{} {}", poultry_farm_erp::APP_NAME, poultry_farm_erp::VERSION);
    println!();
    println!("用法: poultry-farm-erp [--db <path>] <command> [args]");
    println!();
    println!("  cost <YYYY-MM-DD> [per_egg|per_house]");
    println!("  recalc <start> <end> [per_egg|per_house]");
    println!("  alerts");
    println!("  list-alerts [--unread]");
    println!("  mark-read <alert_id>");
    println!("  mark-all-read");
    println!("  payroll <YYYY-MM>");
    println!("  import-logs <csv_path>");
    println!("  config");
}

fn required_arg(args: &[String], idx: usize, name: &str) -> anyhow::Result<String> {
    args.get(idx)
        .cloned()
        .ok_or_else(|| anyhow!("缺少参数: {}", name))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    poultry_farm_erp::logging::init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();

    let db_path = match args.iter().position(|a| a == "--db") {
        Some(idx) => {
            if idx + 1 >= args.len() {
                bail!("--db 需要数据库路径");
            }
            let path = args.remove(idx + 1);
            args.remove(idx);
            path
        }
        None => get_default_db_path(),
    };

    let Some(command) = args.first().cloned() else {
        print_usage();
        return Ok(());
    };
    let rest = &args[1..];

    tracing::info!("使用数据库: {}", db_path);
    let state = AppState::new(db_path).map_err(|e| anyhow!(e))?;

    match command.as_str() {
        "cost" => {
            let date = required_arg(rest, 0, "date")?;
            let result = state
                .cost_api
                .compute_daily_cost(&date, rest.get(1).map(String::as_str))?;
            print_json(&result)?;
        }
        "recalc" => {
            let start = required_arg(rest, 0, "start")?;
            let end = required_arg(rest, 1, "end")?;
            let results = state.cost_api.recalculate_range(
                &start,
                &end,
                rest.get(2).map(String::as_str),
            )?;
            print_json(&results)?;
        }
        "alerts" => {
            let result = state.alert_api.evaluate_alerts()?;
            print_json(&result)?;
            // 退出前等待告警外发完成
            let flushed = state.alert_api.flush_notifications().await;
            tracing::debug!(flushed, "告警外发已完成");
        }
        "list-alerts" => {
            let unread_only = rest.iter().any(|a| a == "--unread");
            print_json(&state.alert_api.list_alerts(unread_only, None)?)?;
        }
        "mark-read" => {
            let alert_id = required_arg(rest, 0, "alert_id")?;
            state.alert_api.mark_alert_read(&alert_id)?;
        }
        "mark-all-read" => {
            let affected = state.alert_api.mark_all_read()?;
            println!("{}", affected);
        }
        "payroll" => {
            let month = required_arg(rest, 0, "month")?;
            print_json(&state.payroll_api.generate_monthly_payroll(&month)?)?;
        }
        "import-logs" => {
            let path = required_arg(rest, 0, "csv_path")?;
            let report = state
                .activity_api
                .import_daily_logs_csv(Path::new(&path))
                .with_context(|| format!("导入失败: {}", path))?;
            print_json(&report)?;
        }
        "config" => {
            let snapshot = state
                .config_manager
                .get_config_snapshot()
                .map_err(|e| anyhow!("读取配置失败: {}", e))?;
            println!("{}", snapshot);
        }
        other => {
            print_usage();
            bail!("未知命令: {}", other);
        }
    }

    Ok(())
}
