// ==========================================
// 机器人 OEE 数据处理系统 - 停机分类引擎
// ==========================================
// 输入: 原始停机记录 + 分类表 (大类, 小类) → 计划/非计划
// 输出: 带 DowntimeKind 的停机事件 + 未命中统计
// 红线: 查表是全函数，未命中返回 Unclassified，不是错误
// ==========================================

use crate::domain::diagnostics::UnclassifiedPair;
use crate::domain::stoppage::{RawStoppageRecord, StoppageEvent};
use crate::domain::types::DowntimeKind;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, instrument};

// ==========================================
// ClassificationTable - 停机原因分类表
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ClassificationTable {
    entries: HashMap<(String, String), DowntimeKind>,
}

impl ClassificationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 (大类, 小类, 类型) 三元组构建；重复键以最后一次出现为准
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, String, DowntimeKind)>,
    {
        let mut table = Self::new();
        for (major, minor, kind) in entries {
            table.insert(major, minor, kind);
        }
        table
    }

    pub fn insert(&mut self, major: String, minor: String, kind: DowntimeKind) {
        self.entries.insert((major, minor), kind);
    }

    /// 查表
    pub fn lookup(&self, major: &str, minor: &str) -> DowntimeKind {
        self.entries
            .get(&(major.to_string(), minor.to_string()))
            .copied()
            .unwrap_or(DowntimeKind::Unclassified)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ==========================================
// StoppageClassifier - 分类结果
// ==========================================
#[derive(Debug, Clone)]
pub struct ClassificationOutcome {
    pub events: Vec<StoppageEvent>,
    pub unclassified_rows: usize,
    /// 按 (大类, 小类) 排序，保证输出稳定
    pub unclassified_pairs: Vec<UnclassifiedPair>,
}

pub struct StoppageClassifier<'a> {
    table: &'a ClassificationTable,
}

impl<'a> StoppageClassifier<'a> {
    pub fn new(table: &'a ClassificationTable) -> Self {
        Self { table }
    }

    /// 为每条原始记录附加停机类型（保持输入顺序）
    #[instrument(skip_all, fields(rows = records.len(), table_size = self.table.len()))]
    pub fn classify(&self, records: &[RawStoppageRecord]) -> ClassificationOutcome {
        let mut misses: BTreeMap<(String, String), usize> = BTreeMap::new();

        let events: Vec<StoppageEvent> = records
            .iter()
            .map(|raw| {
                let kind = self.table.lookup(&raw.major_reason, &raw.minor_reason);
                if kind == DowntimeKind::Unclassified {
                    *misses
                        .entry((raw.major_reason.clone(), raw.minor_reason.clone()))
                        .or_insert(0) += 1;
                }
                StoppageEvent::from_raw(raw, kind)
            })
            .collect();

        let unclassified_rows = misses.values().sum();
        let unclassified_pairs = misses
            .into_iter()
            .map(|((major_reason, minor_reason), rows)| UnclassifiedPair {
                major_reason,
                minor_reason,
                rows,
            })
            .collect();

        debug!(unclassified_rows, "停机分类完成");

        ClassificationOutcome {
            events,
            unclassified_rows,
            unclassified_pairs,
        }
    }
}
