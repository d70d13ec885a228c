// ==========================================
// 机器人 OEE 数据处理系统 - 引擎层
// ==========================================
// 职责: 停机分类 → 区间规范化 → 跨小时拆分 → 小时分摊 → OEE 汇总
// 红线: 纯函数式批处理，不做 I/O，不读系统时钟
// ==========================================

pub mod aggregator;
pub mod allocator;
pub mod classification;
pub mod error;
pub mod normalizer;
pub mod orchestrator;
pub mod splitter;

// 重导出核心引擎
pub use aggregator::{AggregationResult, OeeAggregator};
pub use allocator::{DowntimeSeries, DowntimeSeriesKind, HourlyAllocator};
pub use classification::{ClassificationOutcome, ClassificationTable, StoppageClassifier};
pub use error::{EngineError, EngineResult};
pub use normalizer::{IntervalNormalizer, NormalizedTimeline};
pub use orchestrator::{EtlOrchestrator, EtlRunResult, RobotRunInput};
pub use splitter::{IntervalSplitter, SplitResult};
