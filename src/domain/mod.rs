// ==========================================
// 机器人 OEE 数据处理系统 - 领域模型层
// ==========================================
// 职责: 定义停机事件、产量、小时事实与诊断实体
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod diagnostics;
pub mod fact;
pub mod hour;
pub mod production;
pub mod stoppage;
pub mod types;

// 重导出核心类型
pub use diagnostics::{
    AllocationReport, NegativeUnplannedHour, NormalizationStats, RunDiagnostics,
    UnclassifiedPair,
};
pub use fact::{HourBucket, HourlyFact};
pub use hour::{HourRange, HOUR_BUCKET_CAPACITY_MINUTES};
pub use production::{HourlyProduction, ProductionRecord};
pub use stoppage::{RawStoppageRecord, StoppageEvent, SubEvent, SubEventOrigin};
pub use types::DowntimeKind;
