// ==========================================
// 机器人 OEE 数据处理系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 唯一的致命错误是停机序列未按开始时间排序
// ==========================================

use chrono::NaiveDateTime;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error(
        "停机记录未按开始时间排序: 第 {index} 条 (源行 {source_row}) 开始于 {start}，早于前一条的 {previous_start}"
    )]
    OrderingViolation {
        index: usize,
        source_row: usize,
        previous_start: NaiveDateTime,
        start: NaiveDateTime,
    },
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
