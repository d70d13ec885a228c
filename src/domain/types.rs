// ==========================================
// 机器人 OEE 数据处理系统 - 领域类型定义
// ==========================================
// 停机类型: 计划停机 / 非计划停机 / 未分类
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 停机类型 (Downtime Kind)
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DowntimeKind {
    Planned,      // 计划停机
    Unplanned,    // 非计划停机
    Unclassified, // 分类表未命中
}

impl DowntimeKind {
    /// 是否计入计划停机
    pub fn is_planned(&self) -> bool {
        matches!(self, DowntimeKind::Planned)
    }

    /// 汇总口径: 未分类按非计划停机处理
    pub fn aggregation_kind(&self) -> DowntimeKind {
        match self {
            DowntimeKind::Planned => DowntimeKind::Planned,
            DowntimeKind::Unplanned | DowntimeKind::Unclassified => DowntimeKind::Unplanned,
        }
    }

    /// 从分类表标签解析
    ///
    /// 与 `planned_label` 相同（忽略大小写与首尾空白）即为计划停机，
    /// 其余任何标签均视为非计划停机。
    pub fn from_label(label: &str, planned_label: &str) -> DowntimeKind {
        if label.trim().eq_ignore_ascii_case(planned_label.trim()) {
            DowntimeKind::Planned
        } else {
            DowntimeKind::Unplanned
        }
    }
}

impl fmt::Display for DowntimeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DowntimeKind::Planned => write!(f, "PLANNED"),
            DowntimeKind::Unplanned => write!(f, "UNPLANNED"),
            DowntimeKind::Unclassified => write!(f, "UNCLASSIFIED"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_label() {
        assert_eq!(DowntimeKind::from_label("planned", "planned"), DowntimeKind::Planned);
        assert_eq!(DowntimeKind::from_label(" Planned ", "planned"), DowntimeKind::Planned);
        assert_eq!(
            DowntimeKind::from_label("non-planned", "planned"),
            DowntimeKind::Unplanned
        );
        assert_eq!(DowntimeKind::from_label("", "planned"), DowntimeKind::Unplanned);
    }

    #[test]
    fn test_unclassified_aggregates_as_unplanned() {
        assert_eq!(
            DowntimeKind::Unclassified.aggregation_kind(),
            DowntimeKind::Unplanned
        );
        assert!(!DowntimeKind::Unclassified.is_planned());
    }

    #[test]
    fn test_display() {
        assert_eq!(DowntimeKind::Unclassified.to_string(), "UNCLASSIFIED");
    }
}
