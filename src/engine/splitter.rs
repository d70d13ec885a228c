// ==========================================
// 机器人 OEE 数据处理系统 - 跨小时区间拆分引擎
// ==========================================
// 输入: 规范化后的停机时间线
// 输出: 每个子事件只落在一个小时内（flat-map，生成新序列）
// ==========================================
// 规则:
// - 首段: 原始 start → 下一个整点
// - 中间段: 整小时
// - 末段: 最后一个整点 → 原始 end
// - 子事件继承父事件的类型与原因
// - 末尾追加零时长哨兵（总停机 / 计划停机各一条），确定小时序列上界
// ==========================================

use crate::domain::hour::next_hour_boundary;
use crate::domain::stoppage::{StoppageEvent, SubEvent, SubEventOrigin};
use crate::domain::types::DowntimeKind;
use crate::engine::normalizer::NormalizedTimeline;
use chrono::NaiveDateTime;
use tracing::{debug, instrument};

/// 哨兵对应的序列: 总停机（任意类型）与计划停机
const SENTINEL_KINDS: [DowntimeKind; 2] = [DowntimeKind::Unplanned, DowntimeKind::Planned];

/// 拆分结果
#[derive(Debug, Clone)]
pub struct SplitResult {
    pub sub_events: Vec<SubEvent>,
    /// 被拆成多段的父事件数
    pub split_events: usize,
    /// 哨兵所在时间点（最后一个真实时间点）
    pub horizon: Option<NaiveDateTime>,
}

impl SplitResult {
    /// 非哨兵子事件
    pub fn real_sub_events(&self) -> impl Iterator<Item = &SubEvent> {
        self.sub_events.iter().filter(|s| !s.is_sentinel())
    }
}

// ==========================================
// IntervalSplitter
// ==========================================
pub struct IntervalSplitter {
    // 无状态引擎
}

impl IntervalSplitter {
    pub fn new() -> Self {
        Self {}
    }

    /// 拆分单个事件
    ///
    /// 不跨整点（或零时长）的事件原样返回一条。
    pub fn split_event(&self, event: &StoppageEvent) -> Vec<StoppageEvent> {
        if event.end <= event.start || !event.spans_hour_boundary() {
            return vec![event.clone()];
        }

        let mut parts = Vec::new();
        let mut cursor = event.start;
        while cursor < event.end {
            let segment_end = next_hour_boundary(cursor).min(event.end);
            parts.push(event.with_interval(cursor, segment_end));
            cursor = segment_end;
        }
        parts
    }

    /// 拆分整条时间线并追加哨兵
    #[instrument(skip_all, fields(events = timeline.events.len()))]
    pub fn split(&self, timeline: &NormalizedTimeline) -> SplitResult {
        let mut split_events = 0;
        let mut sub_events: Vec<SubEvent> = timeline
            .events
            .iter()
            .enumerate()
            .flat_map(|(parent_index, event)| {
                let parts = self.split_event(event);
                if parts.len() > 1 {
                    split_events += 1;
                }
                parts.into_iter().map(move |part| SubEvent {
                    event: part,
                    origin: SubEventOrigin::Split { parent_index },
                })
            })
            .collect();

        let horizon = timeline.last_timestamp();
        if let Some(at) = horizon {
            sub_events.extend(SENTINEL_KINDS.iter().map(|&kind| sentinel(at, kind)));
        }

        debug!(
            split_events,
            sub_events = sub_events.len(),
            "跨小时拆分完成"
        );

        SplitResult {
            sub_events,
            split_events,
            horizon,
        }
    }
}

impl Default for IntervalSplitter {
    fn default() -> Self {
        Self::new()
    }
}

fn sentinel(at: NaiveDateTime, kind: DowntimeKind) -> SubEvent {
    SubEvent {
        event: StoppageEvent {
            start: at,
            end: at,
            major_reason: String::new(),
            minor_reason: String::new(),
            kind,
            part_number: None,
            lot_number: None,
            source_row: 0,
        },
        origin: SubEventOrigin::Sentinel,
    }
}
