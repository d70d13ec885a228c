// ==========================================
// 机器人 OEE 数据处理系统 - 小时事实表
// ==========================================
// 小时桶: 总停机 / 计划停机（分钟，∈ [0, 60]）
// 事实行: 小时桶 + 产量字段 + 非计划停机 + 可用率
// ==========================================

use crate::domain::hour::HOUR_BUCKET_CAPACITY_MINUTES;
use crate::domain::production::HourlyProduction;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// HourBucket - 单小时停机汇总
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourBucket {
    pub hour_start: NaiveDateTime,
    pub total_down_minutes: f64,
    pub planned_minutes: f64,
}

impl HourBucket {
    pub fn empty(hour_start: NaiveDateTime) -> Self {
        Self {
            hour_start,
            total_down_minutes: 0.0,
            planned_minutes: 0.0,
        }
    }
}

// ==========================================
// HourlyFact - 输出事实行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyFact {
    pub hour_start: NaiveDateTime,
    /// None = 该小时没有上报产量（区别于产量为 0）
    pub production: Option<HourlyProduction>,
    pub total_down_minutes: f64,
    pub planned_minutes: f64,
    pub unplanned_minutes: f64,
    /// 可用率 = 运行时间 / 计划生产时间；整小时计划停机时无定义
    pub availability: Option<f64>,
}

impl HourlyFact {
    pub fn has_production_data(&self) -> bool {
        self.production.is_some()
    }

    pub fn bucket(&self) -> HourBucket {
        HourBucket {
            hour_start: self.hour_start,
            total_down_minutes: self.total_down_minutes,
            planned_minutes: self.planned_minutes,
        }
    }
}

/// 可用率计算
///
/// `(60 - total) / (60 - planned)`，planned 占满整小时时返回 None。
pub fn availability(total_down_minutes: f64, planned_minutes: f64) -> Option<f64> {
    let planned_time = HOUR_BUCKET_CAPACITY_MINUTES - planned_minutes;
    if planned_time <= 0.0 {
        return None;
    }
    let run_time = (HOUR_BUCKET_CAPACITY_MINUTES - total_down_minutes).max(0.0);
    Some((run_time / planned_time).clamp(0.0, 1.0))
}
