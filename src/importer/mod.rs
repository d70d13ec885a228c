// ==========================================
// 机器人 OEE 数据处理系统 - 导入层
// ==========================================
// 职责: 外部运行日志 → 已解析的停机 / 产量 / 分类记录
// 支持: CSV, Excel
// ==========================================

// 模块声明
pub mod data_cleaner;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod log_source;

// 重导出核心类型
pub use data_cleaner::DataCleaner;
pub use error::{ImportError, ImportResult};
pub use field_mapper::FieldMapper;
pub use file_parser::{CsvParser, ExcelParser, FileParser, ParsedTable, RawRow, UniversalFileParser};
pub use log_source::{
    ClassificationEntry, FileLogSource, LoadedRecords, RobotLogFiles, RobotLogSource, SkippedRow,
};
