// ==========================================
// 机器人 OEE 数据处理系统 - 命令行入口
// ==========================================
// 用法:
//   robot-oee-etl <robot_id> <stoppage_file> <production_file> <classification_file> [out_dir] [db_path]
//
// 输出:
//   <out_dir>/<robot_id>_hourly_fact.csv
//   <out_dir>/<robot_id>_diagnostics.json
//   hourly_fact 表（db_path，默认见 get_default_db_path）
// ==========================================

use anyhow::{anyhow, Context};
use robot_oee_etl::api::{EtlApi, RobotJob};
use robot_oee_etl::exporter::{export_diagnostics_json, export_facts_csv};
use robot_oee_etl::importer::RobotLogFiles;
use robot_oee_etl::{get_default_db_path, logging, APP_NAME, VERSION};
use std::path::PathBuf;

const USAGE: &str = "用法: robot-oee-etl <robot_id> <stoppage_file> <production_file> <classification_file> [out_dir] [db_path]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let mut required = || args.next().ok_or_else(|| anyhow!(USAGE));
    let robot_id = required()?;
    let stoppage_path = PathBuf::from(required()?);
    let production_path = PathBuf::from(required()?);
    let classification_path = PathBuf::from(required()?);
    let out_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let db_path = args
        .next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(get_default_db_path);

    tracing::info!("{} v{}", APP_NAME, VERSION);
    tracing::info!(db_path = %db_path, out_dir = %out_dir.display(), "使用数据库与输出目录");

    let api = EtlApi::with_database(&db_path).with_context(|| format!("无法打开数据库: {}", db_path))?;
    let job = RobotJob {
        robot_id: robot_id.clone(),
        files: RobotLogFiles {
            stoppage_path,
            production_path,
            classification_path,
        },
    };
    let report = api
        .run_robot(&job)
        .await
        .with_context(|| format!("机器人 {} 处理失败", robot_id))?;

    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("无法创建输出目录: {}", out_dir.display()))?;
    let fact_path = out_dir.join(format!("{}_hourly_fact.csv", robot_id));
    let diagnostics_path = out_dir.join(format!("{}_diagnostics.json", robot_id));
    export_facts_csv(&fact_path, &report.facts, &report.no_data_marker)?;
    export_diagnostics_json(&diagnostics_path, &report.diagnostics)?;

    println!(
        "robot_id={} hours={} persisted={} run_id={}",
        report.robot_id,
        report.facts.len(),
        report.persisted_rows,
        report.diagnostics.run_id
    );
    Ok(())
}
