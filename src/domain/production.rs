// ==========================================
// 机器人 OEE 数据处理系统 - 小时产量实体
// ==========================================
// 对应数据源: RejectDataLog（每小时一行，产量 + 各类废品计数）
// 红线: 对核心引擎只读
// ==========================================

use crate::domain::hour::truncate_to_hour;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// ProductionRecord - 原始产量记录（导入层产出）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionRecord {
    pub row_number: usize,
    pub timestamp: NaiveDateTime,
    pub part_number: Option<String>,
    pub lot_number: Option<String>,
    pub lot_count: Option<f64>,
    pub parts_made: f64,
    /// 各废品计数列之和（导入阶段预处理）
    pub total_rejects: f64,
}

// ==========================================
// HourlyProduction - 按整点归并后的产量
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyProduction {
    pub hour_start: NaiveDateTime,
    pub part_number: Option<String>,
    pub lot_number: Option<String>,
    pub lot_count: Option<f64>,
    pub parts_made: f64,
    pub total_rejects: f64,
    /// 归并进该小时的源记录数
    pub source_rows: usize,
}

impl HourlyProduction {
    pub fn from_record(record: &ProductionRecord) -> Self {
        Self {
            hour_start: truncate_to_hour(record.timestamp),
            part_number: record.part_number.clone(),
            lot_number: record.lot_number.clone(),
            lot_count: record.lot_count,
            parts_made: record.parts_made,
            total_rejects: record.total_rejects,
            source_rows: 1,
        }
    }

    /// 同一小时内的后续记录: 计数累加，标识取最后一行
    pub fn absorb(&mut self, record: &ProductionRecord) {
        self.parts_made += record.parts_made;
        self.total_rejects += record.total_rejects;
        self.lot_count = match (self.lot_count, record.lot_count) {
            (Some(a), Some(b)) => Some(a + b),
            (a, b) => a.or(b),
        };
        if record.part_number.is_some() {
            self.part_number = record.part_number.clone();
        }
        if record.lot_number.is_some() {
            self.lot_number = record.lot_number.clone();
        }
        self.source_rows += 1;
    }
}
