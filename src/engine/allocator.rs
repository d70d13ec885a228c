// ==========================================
// 机器人 OEE 数据处理系统 - 小时停机分摊引擎
// ==========================================
// 输入: 单小时子事件（含哨兵） + 连续小时区间
// 输出: 每小时停机分钟（∈ [0, 60]） + 分摊报告
// ==========================================
// 溢出扩散:
// - 按小时顺序处理，某小时可用分钟 = 原始合计 + 前序溢出
// - 本小时最多放 60 分钟，其余向后一小时结转（算术级联，不回读已定稿的桶）
// - 孤立的 130 分钟 → 60 / 60 / 10（即 floor(t/60) 个整桶 + 余数）
// - 越过区间末尾仍未放完的分钟记为区间耗尽，不丢弃、不中断
// 运行两次: 全部子事件 → 总停机；计划停机子事件 → 计划停机
// ==========================================

use crate::domain::diagnostics::AllocationReport;
use crate::domain::hour::{HourRange, HOUR_BUCKET_CAPACITY_MINUTES};
use crate::domain::stoppage::SubEvent;
use crate::domain::types::DowntimeKind;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use tracing::{instrument, warn};

/// 分摊目标序列
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DowntimeSeriesKind {
    /// 全部停机（计划 + 非计划 + 未分类）
    Total,
    /// 仅计划停机
    Planned,
}

impl DowntimeSeriesKind {
    fn includes(&self, sub_event: &SubEvent) -> bool {
        match self {
            DowntimeSeriesKind::Total => true,
            DowntimeSeriesKind::Planned => {
                sub_event.event.kind.aggregation_kind() == DowntimeKind::Planned
            }
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            DowntimeSeriesKind::Total => "total",
            DowntimeSeriesKind::Planned => "planned",
        }
    }
}

/// 连续小时停机序列
#[derive(Debug, Clone, PartialEq)]
pub struct DowntimeSeries {
    pub range: HourRange,
    /// minutes[i] 对应 range.hour_at(i)
    pub minutes: Vec<f64>,
}

impl DowntimeSeries {
    pub fn minutes_at(&self, hour_start: NaiveDateTime) -> f64 {
        self.range
            .index_of(hour_start)
            .and_then(|idx| self.minutes.get(idx).copied())
            .unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.minutes.iter().sum()
    }
}

// ==========================================
// HourlyAllocator
// ==========================================
pub struct HourlyAllocator {
    // 无状态引擎
}

impl HourlyAllocator {
    pub fn new() -> Self {
        Self {}
    }

    /// 按整点汇总子事件时长（原始合计，可能超过 60）
    pub fn raw_hourly_totals(
        &self,
        sub_events: &[SubEvent],
        kind: DowntimeSeriesKind,
    ) -> BTreeMap<NaiveDateTime, f64> {
        let mut totals = BTreeMap::new();
        for sub_event in sub_events.iter().filter(|s| kind.includes(s)) {
            *totals.entry(sub_event.hour_start()).or_insert(0.0) += sub_event.duration_minutes();
        }
        totals
    }

    /// 将原始小时合计分摊到区间内的小时桶
    pub fn spread(
        &self,
        raw_totals: &BTreeMap<NaiveDateTime, f64>,
        range: HourRange,
    ) -> (DowntimeSeries, AllocationReport) {
        let mut raw = vec![0.0; range.hour_count()];
        let mut report = AllocationReport::default();

        for (&hour, &minutes) in raw_totals {
            report.raw_minutes += minutes;
            match range.index_of(hour) {
                Some(idx) => raw[idx] += minutes,
                // 区间外的原始分钟无处可放，按截断计
                None => report.truncated_minutes += minutes,
            }
        }

        let mut minutes = Vec::with_capacity(raw.len());
        let mut carry = 0.0;
        for raw_minutes in raw {
            let available = raw_minutes + carry;
            if available > HOUR_BUCKET_CAPACITY_MINUTES {
                report.overflowing_hours += 1;
            }
            let placed = available.min(HOUR_BUCKET_CAPACITY_MINUTES);
            minutes.push(placed);
            report.allocated_minutes += placed;
            carry = available - placed;
        }
        report.truncated_minutes += carry;

        (DowntimeSeries { range, minutes }, report)
    }

    /// 分摊一类序列
    #[instrument(skip(self, sub_events), fields(kind = kind.as_str(), sub_events = sub_events.len()))]
    pub fn allocate(
        &self,
        sub_events: &[SubEvent],
        kind: DowntimeSeriesKind,
        range: HourRange,
    ) -> (DowntimeSeries, AllocationReport) {
        let raw_totals = self.raw_hourly_totals(sub_events, kind);
        let (series, report) = self.spread(&raw_totals, range);

        if report.is_range_exhausted() {
            warn!(
                kind = kind.as_str(),
                truncated_minutes = report.truncated_minutes,
                range_last = %range.last,
                "停机分钟溢出越过小时区间末尾"
            );
        }

        (series, report)
    }
}

impl Default for HourlyAllocator {
    fn default() -> Self {
        Self::new()
    }
}
