// ==========================================
// 机器人 OEE 数据处理系统 - 流水线编排器
// ==========================================
// 流程: 分类 → 规范化 → 拆分 → 分摊(总/计划) → 汇总
// 红线: 单向数据流，每一步只消费上一步输出并生成新序列
// 红线: 唯一中断条件是停机记录未排序；其余异常进入诊断汇总
// ==========================================

use crate::domain::diagnostics::RunDiagnostics;
use crate::domain::fact::HourlyFact;
use crate::domain::hour::{truncate_to_hour, HourRange};
use crate::domain::production::ProductionRecord;
use crate::domain::stoppage::RawStoppageRecord;
use crate::engine::aggregator::OeeAggregator;
use crate::engine::allocator::{DowntimeSeriesKind, HourlyAllocator};
use crate::engine::classification::{ClassificationTable, StoppageClassifier};
use crate::engine::error::EngineResult;
use crate::engine::normalizer::IntervalNormalizer;
use crate::engine::splitter::IntervalSplitter;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// 单台机器人的一次运行输入（均已解析、已排序）
#[derive(Debug, Clone, Copy)]
pub struct RobotRunInput<'a> {
    pub robot_id: &'a str,
    pub stoppages: &'a [RawStoppageRecord],
    pub production: &'a [ProductionRecord],
    pub classification: &'a ClassificationTable,
}

/// 单次运行结果
#[derive(Debug, Clone)]
pub struct EtlRunResult {
    pub facts: Vec<HourlyFact>,
    pub range: Option<HourRange>,
    pub diagnostics: RunDiagnostics,
}

// ==========================================
// EtlOrchestrator
// ==========================================
pub struct EtlOrchestrator {
    normalizer: IntervalNormalizer,
    splitter: IntervalSplitter,
    allocator: HourlyAllocator,
    aggregator: OeeAggregator,
}

impl EtlOrchestrator {
    pub fn new() -> Self {
        Self {
            normalizer: IntervalNormalizer::new(),
            splitter: IntervalSplitter::new(),
            allocator: HourlyAllocator::new(),
            aggregator: OeeAggregator::new(),
        }
    }

    /// 执行完整流水线
    ///
    /// # 错误
    /// - `EngineError::OrderingViolation`: 停机记录未按开始时间排序
    #[instrument(skip_all, fields(
        robot_id = %input.robot_id,
        stoppages = input.stoppages.len(),
        production = input.production.len()
    ))]
    pub fn run(&self, input: RobotRunInput<'_>) -> EngineResult<EtlRunResult> {
        let mut diagnostics = RunDiagnostics {
            run_id: Uuid::new_v4().to_string(),
            robot_id: input.robot_id.to_string(),
            stoppage_rows: input.stoppages.len(),
            ..Default::default()
        };

        // 1. 分类
        let classified = StoppageClassifier::new(input.classification).classify(input.stoppages);
        diagnostics.unclassified_rows = classified.unclassified_rows;
        diagnostics.unclassified_pairs = classified.unclassified_pairs;

        // 2. 规范化（排序前置条件在此校验）
        let timeline = self.normalizer.normalize(&classified.events)?;
        diagnostics.normalization = timeline.stats.clone();

        // 3. 拆分
        let split = self.splitter.split(&timeline);
        diagnostics.split_events = split.split_events;
        diagnostics.sub_events = split.real_sub_events().count();

        // 4. 小时区间: 停机区间 ∪ 产量区间
        let downtime_range =
            HourRange::covering(split.sub_events.iter().map(|s| s.event.start));
        let production_range =
            HourRange::covering(input.production.iter().map(|p| truncate_to_hour(p.timestamp)));
        let range = match (downtime_range, production_range) {
            (Some(a), Some(b)) => a.union(&b),
            (Some(a), None) | (None, Some(a)) => a,
            (None, None) => {
                info!(run_id = %diagnostics.run_id, "无停机与产量记录，事实表为空");
                return Ok(EtlRunResult {
                    facts: Vec::new(),
                    range: None,
                    diagnostics,
                });
            }
        };

        // 5. 分摊（总停机 / 计划停机）
        let (total, total_report) =
            self.allocator
                .allocate(&split.sub_events, DowntimeSeriesKind::Total, range);
        let (planned, planned_report) =
            self.allocator
                .allocate(&split.sub_events, DowntimeSeriesKind::Planned, range);
        diagnostics.total_allocation = total_report;
        diagnostics.planned_allocation = planned_report;

        // 6. 汇总
        let (production, merged_hours) = self.aggregator.merge_production(input.production);
        let buckets = self.aggregator.combine_series(&total, &planned);
        let aggregated = self.aggregator.aggregate(range, &buckets, &production);

        diagnostics.hours = aggregated.facts.len();
        diagnostics.hours_without_production = aggregated.hours_without_production;
        diagnostics.merged_production_hours = merged_hours;
        diagnostics.negative_unplanned_hours = aggregated.negative_unplanned_hours;

        log_summary(&diagnostics);

        Ok(EtlRunResult {
            facts: aggregated.facts,
            range: Some(range),
            diagnostics,
        })
    }
}

impl Default for EtlOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

/// 运行结束时输出一条诊断汇总
fn log_summary(d: &RunDiagnostics) {
    if d.has_anomalies() {
        warn!(
            run_id = %d.run_id,
            robot_id = %d.robot_id,
            hours = d.hours,
            unclassified_rows = d.unclassified_rows,
            conservation_violations = d.conservation_violations(),
            truncated_total_minutes = d.total_allocation.truncated_minutes,
            negative_unplanned_hours = d.negative_unplanned_hours.len(),
            "运行完成（存在数据质量问题）"
        );
    } else {
        info!(
            run_id = %d.run_id,
            robot_id = %d.robot_id,
            hours = d.hours,
            stoppage_rows = d.stoppage_rows,
            "运行完成"
        );
    }
}
