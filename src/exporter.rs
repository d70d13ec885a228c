// ==========================================
// 机器人 OEE 数据处理系统 - 结果导出
// ==========================================
// 输出: 小时事实表 CSV + 运行诊断 JSON
// 缺失产量字段写入配置的占位标记（默认 NO_DATA）
// ==========================================

use crate::domain::diagnostics::RunDiagnostics;
use crate::domain::fact::HourlyFact;
use csv::Writer;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// 导出错误
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("文件写入失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV 写入失败: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON 序列化失败: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ExportResult<T> = Result<T, ExportError>;

/// 事实表 CSV 表头
pub const FACT_CSV_HEADER: [&str; 11] = [
    "hour_start",
    "part_number",
    "lot_number",
    "lot_count",
    "parts_made",
    "total_rejects",
    "total_down_minutes",
    "planned_minutes",
    "unplanned_minutes",
    "availability",
    "production_rows",
];

const HOUR_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn fmt_minutes(value: f64) -> String {
    format!("{:.3}", value)
}

fn fmt_count(value: f64) -> String {
    // 计数列多为整数，整数时不带小数位
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        value.to_string()
    }
}

/// 事实行 → CSV 记录
pub fn fact_to_row(fact: &HourlyFact, no_data_marker: &str) -> Vec<String> {
    let marker = || no_data_marker.to_string();
    let text = |v: &Option<String>| v.clone().unwrap_or_else(marker);

    let mut row = vec![fact.hour_start.format(HOUR_FORMAT).to_string()];
    match &fact.production {
        Some(p) => {
            row.push(text(&p.part_number));
            row.push(text(&p.lot_number));
            row.push(p.lot_count.map(fmt_count).unwrap_or_else(marker));
            row.push(fmt_count(p.parts_made));
            row.push(fmt_count(p.total_rejects));
        }
        None => row.extend(std::iter::repeat_with(marker).take(5)),
    }
    row.push(fmt_minutes(fact.total_down_minutes));
    row.push(fmt_minutes(fact.planned_minutes));
    row.push(fmt_minutes(fact.unplanned_minutes));
    row.push(
        fact.availability
            .map(|a| format!("{:.4}", a))
            .unwrap_or_default(),
    );
    row.push(
        fact.production
            .as_ref()
            .map(|p| p.source_rows)
            .unwrap_or(0)
            .to_string(),
    );
    row
}

/// 写出事实表到任意 Writer
pub fn write_facts<W: Write>(writer: W, facts: &[HourlyFact], no_data_marker: &str) -> ExportResult<()> {
    let mut wtr = Writer::from_writer(writer);
    wtr.write_record(FACT_CSV_HEADER)?;
    for fact in facts {
        wtr.write_record(&fact_to_row(fact, no_data_marker))?;
    }
    wtr.flush()?;
    Ok(())
}

/// 写出事实表 CSV 文件
pub fn export_facts_csv(path: &Path, facts: &[HourlyFact], no_data_marker: &str) -> ExportResult<()> {
    let file = File::create(path)?;
    write_facts(file, facts, no_data_marker)?;
    tracing::info!(file = %path.display(), rows = facts.len(), "事实表已导出");
    Ok(())
}

/// 写出运行诊断 JSON 文件
pub fn export_diagnostics_json(path: &Path, diagnostics: &RunDiagnostics) -> ExportResult<()> {
    let json = serde_json::to_string_pretty(diagnostics)?;
    std::fs::write(path, json)?;
    tracing::info!(file = %path.display(), run_id = %diagnostics.run_id, "诊断报告已导出");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::production::HourlyProduction;
    use chrono::{NaiveDate, NaiveDateTime};

    fn hour(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2022, 2, 3)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn fact(h: u32, production: Option<HourlyProduction>) -> HourlyFact {
        HourlyFact {
            hour_start: hour(h),
            production,
            total_down_minutes: 30.0,
            planned_minutes: 10.0,
            unplanned_minutes: 20.0,
            availability: crate::domain::fact::availability(30.0, 10.0),
        }
    }

    #[test]
    fn test_fact_row_without_production_uses_marker() {
        let row = fact_to_row(&fact(10, None), "NO_DATA");
        assert_eq!(row.len(), FACT_CSV_HEADER.len());
        assert_eq!(row[0], "2022-02-03 10:00:00");
        assert!(row[1..6].iter().all(|v| v == "NO_DATA"));
        assert_eq!(row[6], "30.000");
        assert_eq!(row[8], "20.000");
        assert_eq!(row[9], "0.6000");
        assert_eq!(row[10], "0");
    }

    #[test]
    fn test_fact_row_with_production() {
        let production = HourlyProduction {
            hour_start: hour(11),
            part_number: Some("7781".to_string()),
            lot_number: None,
            lot_count: Some(3.0),
            parts_made: 118.0,
            total_rejects: 2.0,
            source_rows: 1,
        };
        let row = fact_to_row(&fact(11, Some(production)), "NO_DATA");
        assert_eq!(row[1], "7781");
        assert_eq!(row[2], "NO_DATA");
        assert_eq!(row[3], "3");
        assert_eq!(row[4], "118");
        assert_eq!(row[5], "2");
        assert_eq!(row[10], "1");
    }

    #[test]
    fn test_write_facts_header_and_rows() {
        let mut buf = Vec::new();
        write_facts(&mut buf, &[fact(10, None), fact(11, None)], "-").unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("hour_start,part_number"));
    }

    #[test]
    fn test_export_diagnostics_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diag.json");
        let diagnostics = RunDiagnostics {
            robot_id: "R1".to_string(),
            unclassified_rows: 2,
            ..Default::default()
        };
        export_diagnostics_json(&path, &diagnostics).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["robot_id"], "R1");
        assert_eq!(value["unclassified_rows"], 2);
    }
}
