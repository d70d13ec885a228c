// ==========================================
// 机器人 OEE 数据处理系统 - 运行日志数据源
// ==========================================
// 职责: 提供单台机器人的停机日志 / 产量日志 / 分类参考表
// 流程: 解析 → 校验必需列 → 字段映射（失败行跳过并记录）
// 说明: 不排序；排序是调用方前置条件，由引擎校验
// ==========================================

use crate::config::EtlConfig;
use crate::domain::production::ProductionRecord;
use crate::domain::stoppage::RawStoppageRecord;
use crate::domain::types::DowntimeKind;
use crate::importer::error::ImportResult;
use crate::importer::field_mapper::FieldMapper;
use crate::importer::file_parser::{FileParser, ParsedTable, RawRow, UniversalFileParser};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// 分类条目 (大类, 小类, 类型)
pub type ClassificationEntry = (String, String, DowntimeKind);

/// 映射失败被跳过的行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRow {
    pub row_number: usize,
    pub reason: String,
}

/// 加载结果
#[derive(Debug, Clone)]
pub struct LoadedRecords<T> {
    pub records: Vec<T>,
    pub skipped: Vec<SkippedRow>,
}

// ==========================================
// RobotLogSource Trait
// ==========================================
// 实现者: FileLogSource（文件共享目录中的 CSV / Excel）
#[async_trait]
pub trait RobotLogSource: Send + Sync {
    /// 停机日志（按文件顺序）
    async fn load_stoppages(&self) -> ImportResult<LoadedRecords<RawStoppageRecord>>;

    /// 小时产量日志
    async fn load_production(&self) -> ImportResult<LoadedRecords<ProductionRecord>>;

    /// 停机分类参考表
    async fn load_classification(&self) -> ImportResult<LoadedRecords<ClassificationEntry>>;
}

/// 单台机器人的输入文件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotLogFiles {
    pub stoppage_path: PathBuf,
    pub production_path: PathBuf,
    pub classification_path: PathBuf,
}

// ==========================================
// FileLogSource
// ==========================================
pub struct FileLogSource {
    files: RobotLogFiles,
    config: EtlConfig,
    parser: Box<dyn FileParser>,
}

impl FileLogSource {
    pub fn new(files: RobotLogFiles, config: EtlConfig) -> Self {
        Self {
            files,
            config,
            parser: Box::new(UniversalFileParser),
        }
    }

    pub fn config(&self) -> &EtlConfig {
        &self.config
    }

    fn parse(&self, path: &Path, required: &[&str]) -> ImportResult<ParsedTable> {
        let table = self.parser.parse(path)?;
        table.require_columns(&path.display().to_string(), required)?;
        info!(file = %path.display(), rows = table.rows.len(), "文件解析完成");
        Ok(table)
    }
}

/// 逐行映射，失败行跳过并记录
fn map_rows<T, F>(path: &Path, rows: &[RawRow], mut map: F) -> LoadedRecords<T>
where
    F: FnMut(&RawRow) -> ImportResult<Option<T>>,
{
    let mut records = Vec::with_capacity(rows.len());
    let mut skipped = Vec::new();

    for row in rows {
        match map(row) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => skipped.push(SkippedRow {
                row_number: row.row_number,
                reason: "关键字段为空".to_string(),
            }),
            Err(e) => skipped.push(SkippedRow {
                row_number: row.row_number,
                reason: e.to_string(),
            }),
        }
    }

    if !skipped.is_empty() {
        warn!(
            file = %path.display(),
            skipped = skipped.len(),
            first_row = skipped[0].row_number,
            "部分行映射失败，已跳过"
        );
    }

    LoadedRecords { records, skipped }
}

#[async_trait]
impl RobotLogSource for FileLogSource {
    #[instrument(skip(self), fields(file = %self.files.stoppage_path.display()))]
    async fn load_stoppages(&self) -> ImportResult<LoadedRecords<RawStoppageRecord>> {
        let cols = &self.config.stoppage;
        let path = &self.files.stoppage_path;
        let table = self.parse(path, &[
            cols.start.as_str(),
            cols.end.as_str(),
            cols.major.as_str(),
            cols.minor.as_str(),
        ])?;

        let mapper = FieldMapper::new(&self.config);
        Ok(map_rows(path, &table.rows, |row| mapper.map_stoppage(row).map(Some)))
    }

    #[instrument(skip(self), fields(file = %self.files.production_path.display()))]
    async fn load_production(&self) -> ImportResult<LoadedRecords<ProductionRecord>> {
        let cols = &self.config.production;
        let path = &self.files.production_path;
        let table = self.parse(path, &[cols.timestamp.as_str(), cols.parts_made.as_str()])?;

        let mapper = FieldMapper::new(&self.config);
        Ok(map_rows(path, &table.rows, |row| mapper.map_production(row).map(Some)))
    }

    #[instrument(skip(self), fields(file = %self.files.classification_path.display()))]
    async fn load_classification(&self) -> ImportResult<LoadedRecords<ClassificationEntry>> {
        let cols = &self.config.classification;
        let path = &self.files.classification_path;
        let table = self.parse(path, &[cols.major.as_str(), cols.minor.as_str(), cols.label.as_str()])?;

        let mapper = FieldMapper::new(&self.config);
        Ok(map_rows(path, &table.rows, |row| mapper.map_classification(row)))
    }
}
