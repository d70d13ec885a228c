// ==========================================
// 机器人 OEE 数据处理系统 - 单次运行诊断汇总
// ==========================================
// 红线: 非致命异常只汇总，不逐行上报，不中断运行
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 分类表未命中的 (大类, 小类) 组合
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnclassifiedPair {
    pub major_reason: String,
    pub minor_reason: String,
    pub rows: usize,
}

/// 规范化统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationStats {
    pub input_events: usize,
    pub output_events: usize,
    pub duplicates_removed: usize,
    pub overlaps_repaired: usize,
    /// 修复后开始时间越过结束时间，被压缩为零时长的事件数
    pub collapsed_to_zero: usize,
}

/// 小时分摊报告（总停机 / 计划停机各一份）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocationReport {
    /// 输入原始分钟数合计
    pub raw_minutes: f64,
    /// 落入小时桶的分钟数合计
    pub allocated_minutes: f64,
    /// 原始合计超过 60 分钟、需要向后溢出的小时数
    pub overflowing_hours: usize,
    /// 溢出越过区间末尾而截断的分钟数
    pub truncated_minutes: f64,
}

impl AllocationReport {
    /// 区间耗尽（守恒被打破）
    pub fn is_range_exhausted(&self) -> bool {
        self.truncated_minutes > 0.0
    }
}

/// 非计划停机为负（总停机 < 计划停机）的小时
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegativeUnplannedHour {
    pub hour_start: NaiveDateTime,
    pub total_down_minutes: f64,
    pub planned_minutes: f64,
}

// ==========================================
// RunDiagnostics - 单次运行诊断
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunDiagnostics {
    pub run_id: String,
    pub robot_id: String,

    // ===== 分类 =====
    pub stoppage_rows: usize,
    pub unclassified_rows: usize,
    pub unclassified_pairs: Vec<UnclassifiedPair>,

    // ===== 规范化 / 拆分 =====
    pub normalization: NormalizationStats,
    pub split_events: usize,
    pub sub_events: usize,

    // ===== 分摊 =====
    pub total_allocation: AllocationReport,
    pub planned_allocation: AllocationReport,

    // ===== 汇总 =====
    pub hours: usize,
    pub hours_without_production: usize,
    pub merged_production_hours: usize,
    pub negative_unplanned_hours: Vec<NegativeUnplannedHour>,
}

impl RunDiagnostics {
    /// 守恒违反次数（发生区间耗尽的序列数）
    pub fn conservation_violations(&self) -> usize {
        [&self.total_allocation, &self.planned_allocation]
            .iter()
            .filter(|r| r.is_range_exhausted())
            .count()
    }

    /// 是否存在需要关注的数据质量问题
    pub fn has_anomalies(&self) -> bool {
        self.unclassified_rows > 0
            || self.conservation_violations() > 0
            || !self.negative_unplanned_hours.is_empty()
    }
}
