// ==========================================
// 机器人 OEE 数据处理系统 - 字段映射器
// ==========================================
// 职责: 原始行 → 停机记录 / 产量记录 / 分类表条目
// 列名来自 EtlConfig（可被 config_kv 覆写）
// ==========================================

use crate::config::EtlConfig;
use crate::domain::production::ProductionRecord;
use crate::domain::stoppage::RawStoppageRecord;
use crate::domain::types::DowntimeKind;
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::RawRow;
use chrono::NaiveDateTime;

pub struct FieldMapper<'a> {
    config: &'a EtlConfig,
    cleaner: DataCleaner,
}

impl<'a> FieldMapper<'a> {
    pub fn new(config: &'a EtlConfig) -> Self {
        Self {
            config,
            cleaner: DataCleaner::new(config.datetime_formats.clone()),
        }
    }

    // ==========================================
    // 停机日志
    // ==========================================

    /// 映射停机记录（开始/结束时间、大类、小类必填）
    pub fn map_stoppage(&self, row: &RawRow) -> ImportResult<RawStoppageRecord> {
        let cols = &self.config.stoppage;
        Ok(RawStoppageRecord {
            row_number: row.row_number,
            start: self.required_datetime(row, &cols.start)?,
            end: self.required_datetime(row, &cols.end)?,
            major_reason: self.required_text(row, &cols.major)?,
            minor_reason: self.required_text(row, &cols.minor)?,
            part_number: self.cleaner.normalize_null(row.get(&cols.part)),
            lot_number: self.cleaner.normalize_null(row.get(&cols.lot)),
        })
    }

    // ==========================================
    // 产量日志
    // ==========================================

    /// 映射产量记录；废品合计 = 各废品计数列之和（缺失按 0）
    pub fn map_production(&self, row: &RawRow) -> ImportResult<ProductionRecord> {
        let cols = &self.config.production;

        let mut total_rejects = 0.0;
        for column in &cols.reject_columns {
            total_rejects += self.count(row, column)?.unwrap_or(0.0);
        }

        Ok(ProductionRecord {
            row_number: row.row_number,
            timestamp: self.required_datetime(row, &cols.timestamp)?,
            part_number: self.cleaner.normalize_null(row.get(&cols.part)),
            lot_number: self.cleaner.normalize_null(row.get(&cols.lot)),
            lot_count: self.count(row, &cols.lot_count)?,
            parts_made: self.count(row, &cols.parts_made)?.unwrap_or(0.0),
            total_rejects,
        })
    }

    // ==========================================
    // 停机分类表
    // ==========================================

    /// 映射分类条目；大类或小类为空时返回 None
    pub fn map_classification(
        &self,
        row: &RawRow,
    ) -> ImportResult<Option<(String, String, DowntimeKind)>> {
        let cols = &self.config.classification;
        let major = self.cleaner.normalize_null(row.get(&cols.major));
        let minor = self.cleaner.normalize_null(row.get(&cols.minor));
        let (major, minor) = match (major, minor) {
            (Some(major), Some(minor)) => (major, minor),
            _ => return Ok(None),
        };

        let label = self.required_text(row, &cols.label)?;
        let kind = DowntimeKind::from_label(&label, &cols.planned_label);
        Ok(Some((major, minor, kind)))
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    fn required_text(&self, row: &RawRow, column: &str) -> ImportResult<String> {
        self.cleaner
            .normalize_null(row.get(column))
            .ok_or_else(|| ImportError::RequiredFieldMissing {
                row: row.row_number,
                field: column.to_string(),
            })
    }

    fn required_datetime(&self, row: &RawRow, column: &str) -> ImportResult<NaiveDateTime> {
        let value = self.required_text(row, column)?;
        self.cleaner
            .parse_datetime(&value)
            .ok_or_else(|| ImportError::DateTimeFormatError {
                row: row.row_number,
                field: column.to_string(),
                value,
            })
    }

    fn count(&self, row: &RawRow, column: &str) -> ImportResult<Option<f64>> {
        self.cleaner
            .parse_count(row.get(column))
            .map_err(|value| ImportError::TypeConversionError {
                row: row.row_number,
                field: column.to_string(),
                message: format!("无法解析为数值: {}", value),
            })
    }
}
