// ==========================================
// 机器人 OEE 数据处理系统 - 停机事件实体
// ==========================================
// 对应数据源: RobotFailureLog（LPM DateTime → Rst DateTime）
// 红线: 事件创建后不可变，所有变换都生成新事件
// ==========================================

use crate::domain::hour::{minutes_between, truncate_to_hour};
use crate::domain::types::DowntimeKind;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// RawStoppageRecord - 原始停机记录（导入层产出）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawStoppageRecord {
    pub row_number: usize,             // 源文件行号（1 起）
    pub start: NaiveDateTime,          // 停机开始
    pub end: NaiveDateTime,            // 恢复时间
    pub major_reason: String,          // 大类原因
    pub minor_reason: String,          // 小类原因
    pub part_number: Option<String>,   // 透传: 零件号
    pub lot_number: Option<String>,    // 透传: 批次号
}

// ==========================================
// StoppageEvent - 已分类停机事件
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoppageEvent {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub major_reason: String,
    pub minor_reason: String,
    pub kind: DowntimeKind,
    pub part_number: Option<String>,
    pub lot_number: Option<String>,
    pub source_row: usize,
}

impl StoppageEvent {
    /// 由原始记录与分类结果创建
    pub fn from_raw(raw: &RawStoppageRecord, kind: DowntimeKind) -> Self {
        Self {
            start: raw.start,
            end: raw.end,
            major_reason: raw.major_reason.clone(),
            minor_reason: raw.minor_reason.clone(),
            kind,
            part_number: raw.part_number.clone(),
            lot_number: raw.lot_number.clone(),
            source_row: raw.row_number,
        }
    }

    /// 生成区间被替换后的新事件（其余字段继承）
    pub fn with_interval(&self, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            start,
            end,
            ..self.clone()
        }
    }

    /// 单次停机时长（分钟，负值按 0 计）
    pub fn duration_minutes(&self) -> f64 {
        minutes_between(self.start, self.end).max(0.0)
    }

    /// 开始与结束是否落在不同小时
    pub fn spans_hour_boundary(&self) -> bool {
        truncate_to_hour(self.start) != truncate_to_hour(self.end)
    }
}

// ==========================================
// SubEvent - 拆分后的单小时子事件
// ==========================================

/// 子事件来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubEventOrigin {
    /// 由第 parent_index 个规范化事件拆分而来
    Split { parent_index: usize },
    /// 零时长哨兵，只用于确定小时序列的上界
    Sentinel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubEvent {
    pub event: StoppageEvent,
    pub origin: SubEventOrigin,
}

impl SubEvent {
    /// 子事件所属小时（按开始时间截断）
    pub fn hour_start(&self) -> NaiveDateTime {
        truncate_to_hour(self.event.start)
    }

    pub fn duration_minutes(&self) -> f64 {
        self.event.duration_minutes()
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(self.origin, SubEventOrigin::Sentinel)
    }
}
