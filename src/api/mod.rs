// ==========================================
// 机器人 OEE 数据处理系统 - API 层
// ==========================================
// 职责: 提供运行入口，供命令行与批处理调用
// ==========================================

pub mod error;
pub mod etl_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use etl_api::{EtlApi, RobotJob, RobotRunReport, SkippedRowCounts};
