// ==========================================
// 机器人 OEE 数据处理系统 - OEE 小时汇总引擎
// ==========================================
// 输入: 小时停机桶（总 / 计划） + 小时产量
// 输出: 覆盖完整连续小时区间的事实表
// ==========================================
// 规则:
// - 以完整小时区间为左表连接（不以任一输入表为准）
// - 缺失停机 → 0（无停机记录即无停机）
// - 缺失产量 → None（"无数据"，区别于产量为 0）
// - 非计划停机 = max(总 - 计划, 0)；为负时标记该小时
// ==========================================

use crate::domain::diagnostics::NegativeUnplannedHour;
use crate::domain::fact::{availability, HourBucket, HourlyFact};
use crate::domain::hour::{truncate_to_hour, HourRange};
use crate::domain::production::{HourlyProduction, ProductionRecord};
use crate::engine::allocator::DowntimeSeries;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use tracing::{debug, instrument, warn};

/// 汇总结果
#[derive(Debug, Clone)]
pub struct AggregationResult {
    pub facts: Vec<HourlyFact>,
    pub negative_unplanned_hours: Vec<NegativeUnplannedHour>,
    pub hours_without_production: usize,
}

// ==========================================
// OeeAggregator
// ==========================================
pub struct OeeAggregator {
    // 无状态引擎
}

impl OeeAggregator {
    pub fn new() -> Self {
        Self {}
    }

    /// 产量记录按整点归并
    ///
    /// # 返回
    /// (按小时排序的产量, 发生归并的小时数)
    pub fn merge_production(&self, records: &[ProductionRecord]) -> (Vec<HourlyProduction>, usize) {
        let mut by_hour: BTreeMap<NaiveDateTime, HourlyProduction> = BTreeMap::new();
        for record in records {
            let hour = truncate_to_hour(record.timestamp);
            match by_hour.get_mut(&hour) {
                Some(existing) => existing.absorb(record),
                None => {
                    by_hour.insert(hour, HourlyProduction::from_record(record));
                }
            }
        }

        let merged_hours = by_hour.values().filter(|p| p.source_rows > 1).count();
        (by_hour.into_values().collect(), merged_hours)
    }

    /// 两条停机序列合并为小时桶（同一区间）
    pub fn combine_series(&self, total: &DowntimeSeries, planned: &DowntimeSeries) -> Vec<HourBucket> {
        total
            .range
            .hours()
            .map(|hour| HourBucket {
                hour_start: hour,
                total_down_minutes: total.minutes_at(hour),
                planned_minutes: planned.minutes_at(hour),
            })
            .collect()
    }

    /// 连接停机桶与产量，生成事实表
    #[instrument(skip_all, fields(hours = range.hour_count(), buckets = buckets.len(), production = production.len()))]
    pub fn aggregate(
        &self,
        range: HourRange,
        buckets: &[HourBucket],
        production: &[HourlyProduction],
    ) -> AggregationResult {
        let bucket_by_hour: BTreeMap<NaiveDateTime, &HourBucket> = buckets
            .iter()
            .map(|b| (truncate_to_hour(b.hour_start), b))
            .collect();
        let production_by_hour: BTreeMap<NaiveDateTime, &HourlyProduction> = production
            .iter()
            .map(|p| (truncate_to_hour(p.hour_start), p))
            .collect();

        let mut facts = Vec::with_capacity(range.hour_count());
        let mut negative_unplanned_hours = Vec::new();
        let mut hours_without_production = 0;

        for hour in range.hours() {
            let bucket = bucket_by_hour
                .get(&hour)
                .map(|b| **b)
                .unwrap_or_else(|| HourBucket::empty(hour));
            let production = production_by_hour.get(&hour).map(|p| (*p).clone());
            if production.is_none() {
                hours_without_production += 1;
            }

            let raw_unplanned = bucket.total_down_minutes - bucket.planned_minutes;
            if raw_unplanned < 0.0 {
                negative_unplanned_hours.push(NegativeUnplannedHour {
                    hour_start: hour,
                    total_down_minutes: bucket.total_down_minutes,
                    planned_minutes: bucket.planned_minutes,
                });
            }

            facts.push(HourlyFact {
                hour_start: hour,
                production,
                total_down_minutes: bucket.total_down_minutes,
                planned_minutes: bucket.planned_minutes,
                unplanned_minutes: raw_unplanned.max(0.0),
                availability: availability(bucket.total_down_minutes, bucket.planned_minutes),
            });
        }

        if !negative_unplanned_hours.is_empty() {
            warn!(
                hours = negative_unplanned_hours.len(),
                "存在计划停机大于总停机的小时，非计划停机已截为 0"
            );
        }
        debug!(facts = facts.len(), hours_without_production, "小时汇总完成");

        AggregationResult {
            facts,
            negative_unplanned_hours,
            hours_without_production,
        }
    }

    /// 从事实表还原汇总输入（用于重算校验）
    pub fn decompose(&self, facts: &[HourlyFact]) -> (Vec<HourBucket>, Vec<HourlyProduction>) {
        let buckets = facts.iter().map(HourlyFact::bucket).collect();
        let production = facts.iter().filter_map(|f| f.production.clone()).collect();
        (buckets, production)
    }
}

impl Default for OeeAggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(h: u32, m: u32) -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2022, 2, 3)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn record(row: usize, at: NaiveDateTime, parts: f64, rejects: f64) -> ProductionRecord {
        ProductionRecord {
            row_number: row,
            timestamp: at,
            part_number: Some(format!("P-{}", row)),
            lot_number: None,
            lot_count: Some(1.0),
            parts_made: parts,
            total_rejects: rejects,
        }
    }

    fn bucket(hour: NaiveDateTime, total: f64, planned: f64) -> HourBucket {
        HourBucket {
            hour_start: hour,
            total_down_minutes: total,
            planned_minutes: planned,
        }
    }

    #[test]
    fn test_negative_unplanned_is_clamped_and_flagged() {
        let aggregator = OeeAggregator::new();
        let range = HourRange::new(ts(9, 0), ts(9, 0));
        let result = aggregator.aggregate(range, &[bucket(ts(9, 0), 45.0, 50.0)], &[]);

        assert_eq!(result.facts[0].unplanned_minutes, 0.0);
        assert_eq!(result.negative_unplanned_hours.len(), 1);
        assert_eq!(result.negative_unplanned_hours[0].hour_start, ts(9, 0));
        assert_eq!(result.negative_unplanned_hours[0].planned_minutes, 50.0);
    }

    #[test]
    fn test_hour_without_production_is_marked_no_data() {
        let aggregator = OeeAggregator::new();
        let (production, _) = aggregator.merge_production(&[record(1, ts(8, 2), 100.0, 3.0)]);
        let range = HourRange::new(ts(8, 0), ts(10, 0));
        let result = aggregator.aggregate(range, &[bucket(ts(10, 0), 25.0, 10.0)], &production);

        assert_eq!(result.facts.len(), 3);
        // 08:00 有产量无停机
        assert!(result.facts[0].has_production_data());
        assert_eq!(result.facts[0].total_down_minutes, 0.0);
        // 09:00 两边都没有
        assert!(result.facts[1].production.is_none());
        // 10:00 有停机无产量
        assert!(result.facts[2].production.is_none());
        assert_eq!(result.facts[2].total_down_minutes, 25.0);
        assert_eq!(result.facts[2].unplanned_minutes, 15.0);
        assert_eq!(result.hours_without_production, 2);
    }

    #[test]
    fn test_merge_production_sums_same_hour() {
        let aggregator = OeeAggregator::new();
        let (production, merged) = aggregator.merge_production(&[
            record(1, ts(8, 2), 100.0, 3.0),
            record(2, ts(8, 40), 20.0, 1.0),
            record(3, ts(9, 1), 90.0, 0.0),
        ]);

        assert_eq!(production.len(), 2);
        assert_eq!(merged, 1);
        assert_eq!(production[0].parts_made, 120.0);
        assert_eq!(production[0].total_rejects, 4.0);
        assert_eq!(production[0].lot_count, Some(2.0));
        assert_eq!(production[0].part_number.as_deref(), Some("P-2"));
        assert_eq!(production[0].source_rows, 2);
    }

    #[test]
    fn test_reaggregation_is_idempotent() {
        let aggregator = OeeAggregator::new();
        let (production, _) = aggregator.merge_production(&[
            record(1, ts(8, 0), 100.0, 3.0),
            record(2, ts(11, 0), 80.0, 2.0),
        ]);
        let range = HourRange::new(ts(8, 0), ts(11, 0));
        let buckets = vec![bucket(ts(9, 0), 60.0, 20.0), bucket(ts(10, 0), 10.0, 0.0)];

        let first = aggregator.aggregate(range, &buckets, &production);
        let (buckets_again, production_again) = aggregator.decompose(&first.facts);
        let second = aggregator.aggregate(range, &buckets_again, &production_again);

        assert_eq!(first.facts, second.facts);
    }

    #[test]
    fn test_combine_series() {
        let aggregator = OeeAggregator::new();
        let range = HourRange::new(ts(8, 0), ts(9, 0));
        let total = DowntimeSeries {
            range,
            minutes: vec![30.0, 60.0],
        };
        let planned = DowntimeSeries {
            range,
            minutes: vec![10.0, 0.0],
        };

        let buckets = aggregator.combine_series(&total, &planned);
        assert_eq!(buckets, vec![bucket(ts(8, 0), 30.0, 10.0), bucket(ts(9, 0), 60.0, 0.0)]);
    }
}
