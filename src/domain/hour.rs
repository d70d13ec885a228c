// ==========================================
// 机器人 OEE 数据处理系统 - 小时桶时间工具
// ==========================================
// 职责: 整点截断 / 小时边界 / 连续小时区间
// 红线: 只依赖输入时间戳，不读取系统时钟
// ==========================================

use chrono::{Duration, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// 单个小时桶容量（分钟）
pub const HOUR_BUCKET_CAPACITY_MINUTES: f64 = 60.0;

/// 截断到整点
pub fn truncate_to_hour(ts: NaiveDateTime) -> NaiveDateTime {
    ts.date()
        .and_hms_opt(ts.hour(), 0, 0)
        .unwrap_or(ts)
}

/// 下一个整点边界（严格大于所在小时的起点）
pub fn next_hour_boundary(ts: NaiveDateTime) -> NaiveDateTime {
    truncate_to_hour(ts) + Duration::hours(1)
}

/// 两个时间点之间的分钟数（纳秒精度，可为负）
///
/// 超出纳秒可表示范围（约 292 年）时退回毫秒精度。
pub fn minutes_between(start: NaiveDateTime, end: NaiveDateTime) -> f64 {
    let delta = end - start;
    match delta.num_nanoseconds() {
        Some(nanos) => nanos as f64 / 60_000_000_000.0,
        None => delta.num_milliseconds() as f64 / 60_000.0,
    }
}

// ==========================================
// HourRange - 连续小时区间（闭区间）
// ==========================================
// 不变量: first <= last 且两端均为整点，区间至少包含一个小时
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourRange {
    pub first: NaiveDateTime,
    pub last: NaiveDateTime,
}

impl HourRange {
    /// 构造区间，两端均截断到整点；first > last 时交换
    pub fn new(a: NaiveDateTime, b: NaiveDateTime) -> Self {
        let (a, b) = (truncate_to_hour(a), truncate_to_hour(b));
        if a <= b {
            Self { first: a, last: b }
        } else {
            Self { first: b, last: a }
        }
    }

    /// 覆盖给定时间点集合的最小区间
    pub fn covering<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = NaiveDateTime>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(lo, hi), ts| (lo.min(ts), hi.max(ts)));
        Some(Self::new(min, max))
    }

    /// 两个区间的并集（取外包络，保证连续）
    pub fn union(&self, other: &HourRange) -> HourRange {
        HourRange {
            first: self.first.min(other.first),
            last: self.last.max(other.last),
        }
    }

    /// 小时数（至少为 1）
    pub fn hour_count(&self) -> usize {
        ((self.last - self.first).num_hours() + 1) as usize
    }

    /// 时间点所在小时在区间中的下标
    pub fn index_of(&self, ts: NaiveDateTime) -> Option<usize> {
        let hour = truncate_to_hour(ts);
        if hour < self.first || hour > self.last {
            return None;
        }
        Some((hour - self.first).num_hours() as usize)
    }

    /// 第 idx 个小时的起点
    pub fn hour_at(&self, idx: usize) -> NaiveDateTime {
        self.first + Duration::hours(idx as i64)
    }

    /// 按时间顺序遍历所有小时起点
    pub fn hours(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        (0..self.hour_count()).map(move |idx| self.hour_at(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2022, 2, 3)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_truncate_and_boundary() {
        assert_eq!(truncate_to_hour(ts(11, 50)), ts(11, 0));
        assert_eq!(next_hour_boundary(ts(11, 50)), ts(12, 0));
        assert_eq!(next_hour_boundary(ts(12, 0)), ts(13, 0));
    }

    #[test]
    fn test_minutes_between() {
        assert_eq!(minutes_between(ts(11, 50), ts(13, 50)), 120.0);
        assert_eq!(minutes_between(ts(11, 50), ts(11, 40)), -10.0);
    }

    #[test]
    fn test_minutes_between_keeps_sub_millisecond_precision() {
        let start = ts(11, 50) + Duration::microseconds(200);
        let end = ts(11, 50) + Duration::microseconds(500);
        let minutes = minutes_between(start, end);
        assert!((minutes - 300.0 / 60_000_000.0).abs() < 1e-15);
        assert!(minutes > 0.0);
    }

    #[test]
    fn test_hour_range() {
        let range = HourRange::covering(vec![ts(13, 10), ts(11, 50), ts(12, 5)]).unwrap();
        assert_eq!(range.first, ts(11, 0));
        assert_eq!(range.last, ts(13, 0));
        assert_eq!(range.hour_count(), 3);
        assert_eq!(range.index_of(ts(12, 59)), Some(1));
        assert_eq!(range.index_of(ts(14, 0)), None);
        assert_eq!(range.hours().collect::<Vec<_>>(), vec![ts(11, 0), ts(12, 0), ts(13, 0)]);
    }

    #[test]
    fn test_hour_range_across_midnight() {
        let late = ts(23, 30);
        let early = NaiveDate::from_ymd_opt(2022, 2, 4)
            .unwrap()
            .and_hms_opt(1, 15, 0)
            .unwrap();
        let range = HourRange::new(late, early);
        assert_eq!(range.hour_count(), 3);
    }

    #[test]
    fn test_union() {
        let a = HourRange::new(ts(8, 0), ts(10, 0));
        let b = HourRange::new(ts(12, 0), ts(13, 0));
        let u = a.union(&b);
        assert_eq!(u.hour_count(), 6);
    }
}
