// ==========================================
// 机器人 OEE 数据处理系统 - 停机区间规范化引擎
// ==========================================
// 输入: 已分类、按开始时间排序的停机事件
// 输出: 无重叠、时间单调的停机时间线
// ==========================================
// 规则（单次从左到右）:
// 1) 去重: 相邻事件开始时间相同且类型相同，只保留后一条
// 2) 重叠修复: start <= 前一条(已修复) end 时，start 改为前一条 end
//    必须用 <=，且严格按顺序处理，保证修复可级联
// 3) 修复后 end < start 的事件压缩为零时长并保留（保持事件数稳定）
// ==========================================

use crate::domain::diagnostics::NormalizationStats;
use crate::domain::stoppage::StoppageEvent;
use crate::engine::error::{EngineError, EngineResult};
use chrono::NaiveDateTime;
use tracing::{debug, instrument};

/// 规范化结果
#[derive(Debug, Clone)]
pub struct NormalizedTimeline {
    pub events: Vec<StoppageEvent>,
    pub stats: NormalizationStats,
}

impl NormalizedTimeline {
    /// 时间线最后一个真实时间点
    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.events.last().map(|e| e.end)
    }

    /// 规范化后停机分钟合计
    pub fn total_minutes(&self) -> f64 {
        self.events.iter().map(StoppageEvent::duration_minutes).sum()
    }
}

// ==========================================
// IntervalNormalizer
// ==========================================
pub struct IntervalNormalizer {
    // 无状态引擎
}

impl IntervalNormalizer {
    pub fn new() -> Self {
        Self {}
    }

    /// 校验前置条件: 开始时间单调不减
    pub fn check_ordering(&self, events: &[StoppageEvent]) -> EngineResult<()> {
        for (idx, pair) in events.windows(2).enumerate() {
            let (prev, curr) = (&pair[0], &pair[1]);
            if curr.start < prev.start {
                return Err(EngineError::OrderingViolation {
                    index: idx + 1,
                    source_row: curr.source_row,
                    previous_start: prev.start,
                    start: curr.start,
                });
            }
        }
        Ok(())
    }

    /// 规范化停机时间线
    ///
    /// # 错误
    /// - `EngineError::OrderingViolation`: 输入未按开始时间排序（快速失败）
    #[instrument(skip_all, fields(events = events.len()))]
    pub fn normalize(&self, events: &[StoppageEvent]) -> EngineResult<NormalizedTimeline> {
        self.check_ordering(events)?;

        let mut stats = NormalizationStats {
            input_events: events.len(),
            ..Default::default()
        };
        let mut output: Vec<StoppageEvent> = Vec::with_capacity(events.len());
        // 上一条保留事件的原始开始时间（去重按原始时间比较）
        let mut last_raw_start: Option<NaiveDateTime> = None;

        for event in events {
            // 1) 去重
            let is_duplicate = match (output.last(), last_raw_start) {
                (Some(last), Some(raw_start)) => {
                    raw_start == event.start && last.kind == event.kind
                }
                _ => false,
            };
            if is_duplicate {
                output.pop();
                stats.duplicates_removed += 1;
            }

            // 2) 重叠修复（基于已修复的前一条）
            let mut start = event.start;
            if let Some(prev) = output.last() {
                if start <= prev.end {
                    if start < prev.end {
                        stats.overlaps_repaired += 1;
                    }
                    start = prev.end;
                }
            }

            // 3) 零/负时长保留为零时长
            let mut end = event.end;
            if end < start {
                end = start;
                stats.collapsed_to_zero += 1;
            }

            output.push(event.with_interval(start, end));
            last_raw_start = Some(event.start);
        }

        stats.output_events = output.len();
        debug!(
            duplicates_removed = stats.duplicates_removed,
            overlaps_repaired = stats.overlaps_repaired,
            collapsed_to_zero = stats.collapsed_to_zero,
            "停机时间线规范化完成"
        );

        Ok(NormalizedTimeline {
            events: output,
            stats,
        })
    }
}

impl Default for IntervalNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::DowntimeKind;
    use chrono::NaiveDate;

    fn ts(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2022, 2, 3)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn event(start: NaiveDateTime, end: NaiveDateTime, kind: DowntimeKind) -> StoppageEvent {
        StoppageEvent {
            start,
            end,
            major_reason: "Robot".to_string(),
            minor_reason: "Fault".to_string(),
            kind,
            part_number: None,
            lot_number: None,
            source_row: 0,
        }
    }

    fn assert_no_overlap(events: &[StoppageEvent]) {
        for pair in events.windows(2) {
            assert!(pair[1].start >= pair[0].end, "{:?} overlaps {:?}", pair[1], pair[0]);
        }
        for e in events {
            assert!(e.end >= e.start);
        }
    }

    #[test]
    fn test_duplicate_start_keeps_later_event() {
        let events = vec![
            event(ts(11, 50), ts(13, 40), DowntimeKind::Unplanned),
            event(ts(11, 50), ts(13, 50), DowntimeKind::Unplanned),
            event(ts(13, 50), ts(13, 55), DowntimeKind::Unplanned),
        ];

        let timeline = IntervalNormalizer::new().normalize(&events).unwrap();
        assert_eq!(timeline.events.len(), 2);
        assert_eq!(timeline.events[0].start, ts(11, 50));
        assert_eq!(timeline.events[0].end, ts(13, 50));
        assert_eq!(timeline.events[1].start, ts(13, 50));
        assert_eq!(timeline.events[1].end, ts(13, 55));
        assert_eq!(timeline.stats.duplicates_removed, 1);
        assert_eq!(timeline.stats.overlaps_repaired, 0);
    }

    #[test]
    fn test_same_start_different_kind_is_repaired_not_removed() {
        let events = vec![
            event(ts(10, 0), ts(10, 20), DowntimeKind::Planned),
            event(ts(10, 0), ts(10, 30), DowntimeKind::Unplanned),
        ];

        let timeline = IntervalNormalizer::new().normalize(&events).unwrap();
        assert_eq!(timeline.events.len(), 2);
        assert_eq!(timeline.events[1].start, ts(10, 20));
        assert_eq!(timeline.events[1].end, ts(10, 30));
        assert_eq!(timeline.stats.overlaps_repaired, 1);
    }

    #[test]
    fn test_overlap_repair_cascades() {
        // 第二条修复后开始于 10:30，进而与第三条重叠
        let events = vec![
            event(ts(10, 0), ts(10, 30), DowntimeKind::Unplanned),
            event(ts(10, 10), ts(10, 40), DowntimeKind::Planned),
            event(ts(10, 35), ts(10, 50), DowntimeKind::Unplanned),
        ];

        let timeline = IntervalNormalizer::new().normalize(&events).unwrap();
        assert_no_overlap(&timeline.events);
        assert_eq!(timeline.events[1].start, ts(10, 30));
        assert_eq!(timeline.events[2].start, ts(10, 40));
        assert_eq!(timeline.stats.overlaps_repaired, 2);
    }

    #[test]
    fn test_contained_event_collapses_to_zero_and_is_retained() {
        let events = vec![
            event(ts(10, 0), ts(11, 0), DowntimeKind::Unplanned),
            event(ts(10, 15), ts(10, 45), DowntimeKind::Planned),
            event(ts(10, 50), ts(11, 10), DowntimeKind::Unplanned),
        ];

        let timeline = IntervalNormalizer::new().normalize(&events).unwrap();
        assert_eq!(timeline.events.len(), 3);
        assert_eq!(timeline.events[1].start, ts(11, 0));
        assert_eq!(timeline.events[1].end, ts(11, 0));
        assert_eq!(timeline.events[1].duration_minutes(), 0.0);
        assert_eq!(timeline.events[2].start, ts(11, 0));
        assert_eq!(timeline.stats.collapsed_to_zero, 1);
        assert_no_overlap(&timeline.events);
    }

    #[test]
    fn test_unsorted_input_fails_fast() {
        let mut late = event(ts(12, 0), ts(12, 10), DowntimeKind::Unplanned);
        late.source_row = 7;
        let mut early = event(ts(11, 0), ts(11, 10), DowntimeKind::Unplanned);
        early.source_row = 8;

        let err = IntervalNormalizer::new()
            .normalize(&[late, early])
            .unwrap_err();
        match err {
            EngineError::OrderingViolation {
                index, source_row, ..
            } => {
                assert_eq!(index, 1);
                assert_eq!(source_row, 8);
            }
        }
    }

    #[test]
    fn test_empty_input() {
        let timeline = IntervalNormalizer::new().normalize(&[]).unwrap();
        assert!(timeline.events.is_empty());
        assert_eq!(timeline.last_timestamp(), None);
    }

    #[test]
    fn test_gapped_events_untouched() {
        let events = vec![
            event(ts(8, 0), ts(8, 10), DowntimeKind::Unplanned),
            event(ts(9, 0), ts(9, 5), DowntimeKind::Unplanned),
        ];
        let timeline = IntervalNormalizer::new().normalize(&events).unwrap();
        assert_eq!(timeline.events, events);
        assert_eq!(timeline.total_minutes(), 15.0);
    }
}
