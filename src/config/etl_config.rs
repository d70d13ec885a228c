use serde::{Deserialize, Serialize};

/// 停机日志（RobotFailureLog）列名
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoppageColumns {
    pub start: String,
    pub end: String,
    pub major: String,
    pub minor: String,
    pub part: String,
    pub lot: String,
}

impl Default for StoppageColumns {
    fn default() -> Self {
        Self {
            start: "LPM DateTime".to_string(),
            end: "Rst DateTime".to_string(),
            major: "Major".to_string(),
            minor: "Minor0".to_string(),
            part: "Part #".to_string(),
            lot: "Lot #".to_string(),
        }
    }
}

/// 产量日志（RejectDataLog）列名
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductionColumns {
    pub timestamp: String,
    pub part: String,
    pub lot: String,
    pub lot_count: String,
    pub parts_made: String,
    /// 参与合计的废品计数列
    pub reject_columns: Vec<String>,
}

impl Default for ProductionColumns {
    fn default() -> Self {
        Self {
            timestamp: "DateTime".to_string(),
            part: "Part #".to_string(),
            lot: "Lot #".to_string(),
            lot_count: "Lot Count".to_string(),
            parts_made: "Parts Made".to_string(),
            reject_columns: DEFAULT_REJECT_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// RejectDataLog 的废品计数列（部分列在源文件中没有表头，按位置命名）
pub const DEFAULT_REJECT_COLUMNS: [&str; 22] = [
    "Cable Rejects",
    "Swager Misses",
    "FitCut Misses",
    "Lead Rejects",
    "Tail Rejects",
    "HypoRejects",
    "Stuck Rejects",
    "OL Rejects #",
    "UZ Rejects",
    "FL Rejects",
    "Knots",
    "ENFORCER!",
    "Bad Hypo Insert",
    "FL OL Rejects",
    "Cam Faults",
    "Ejected Ftgs",
    "StakePulls",
    "StakePullUnder",
    "TailSlideJog",
    "TailUnstick",
    "TailSlideJogRejects",
    "TailUnstickRejects",
];

/// 停机分类表列名
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationColumns {
    pub major: String,
    pub minor: String,
    pub label: String,
    /// 表示计划停机的标签（忽略大小写）
    pub planned_label: String,
}

impl Default for ClassificationColumns {
    fn default() -> Self {
        Self {
            major: "majorStoppageReason".to_string(),
            minor: "minorStoppageReason".to_string(),
            label: "classificationStoppageReason".to_string(),
            planned_label: "planned".to_string(),
        }
    }
}

/// ETL 运行配置
///
/// 默认值对应机器人运行数据的原始日志格式，可被 config_kv 逐项覆写。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EtlConfig {
    pub stoppage: StoppageColumns,
    pub production: ProductionColumns,
    pub classification: ClassificationColumns,
    /// 缺失产量字段在导出中的占位标记
    pub no_data_marker: String,
    /// 可接受的日期时间格式（按顺序尝试）
    pub datetime_formats: Vec<String>,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            stoppage: StoppageColumns::default(),
            production: ProductionColumns::default(),
            classification: ClassificationColumns::default(),
            no_data_marker: "NO_DATA".to_string(),
            datetime_formats: vec![
                "%Y-%m-%d %H:%M:%S".to_string(),
                "%Y-%m-%d %H:%M:%S%.f".to_string(),
                "%Y-%m-%d %H:%M".to_string(),
                "%Y-%m-%dT%H:%M:%S".to_string(),
                "%m/%d/%Y %H:%M:%S".to_string(),
                "%m/%d/%Y %H:%M".to_string(),
                "%m/%d/%Y %I:%M:%S %p".to_string(),
                "%m/%d/%Y %I:%M %p".to_string(),
                "%Y%m%d%H%M%S".to_string(),
            ],
        }
    }
}
