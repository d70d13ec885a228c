// ==========================================
// 机器人 OEE 数据处理系统 - ETL API
// ==========================================
// 职责: 加载配置 → 读取日志 → 执行流水线 → 落库
// 批量: 多台机器人互不共享状态，并发执行，单台失败不影响其他
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, EtlConfig};
use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::diagnostics::RunDiagnostics;
use crate::domain::fact::HourlyFact;
use crate::domain::hour::HourRange;
use crate::engine::{ClassificationTable, EtlOrchestrator, RobotRunInput};
use crate::importer::{FileLogSource, RobotLogFiles, RobotLogSource};
use crate::repository::HourlyFactRepository;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{error, info, instrument};

/// 单台机器人的运行任务
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotJob {
    pub robot_id: String,
    pub files: RobotLogFiles,
}

/// 导入阶段跳过的行数
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkippedRowCounts {
    pub stoppage: usize,
    pub production: usize,
    pub classification: usize,
}

/// 单台机器人的运行报告
#[derive(Debug, Clone)]
pub struct RobotRunReport {
    pub robot_id: String,
    pub facts: Vec<HourlyFact>,
    pub range: Option<HourRange>,
    pub diagnostics: RunDiagnostics,
    pub skipped_rows: SkippedRowCounts,
    /// 写入数据库的行数（未配置数据库时为 0）
    pub persisted_rows: usize,
    /// 导出时使用的缺失产量标记
    pub no_data_marker: String,
}

/// ETL API
pub struct EtlApi {
    orchestrator: EtlOrchestrator,
    config_manager: Option<ConfigManager>,
    fact_repo: Option<HourlyFactRepository>,
}

impl EtlApi {
    /// 不落库、使用默认配置
    pub fn in_memory() -> Self {
        Self {
            orchestrator: EtlOrchestrator::new(),
            config_manager: None,
            fact_repo: None,
        }
    }

    /// 连接数据库（config_kv 覆写 + hourly_fact 落库共用一个连接）
    pub fn with_database(db_path: &str) -> ApiResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;
        init_schema(&conn).map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        let conn = Arc::new(Mutex::new(conn));

        info!(db_path = %db_path, "ETL 数据库已连接");
        Ok(Self {
            orchestrator: EtlOrchestrator::new(),
            config_manager: Some(ConfigManager::from_connection(conn.clone())),
            fact_repo: Some(HourlyFactRepository::from_connection(conn)),
        })
    }

    /// 加载某台机器人的配置（无数据库时为默认值）
    pub fn load_config(&self, robot_id: &str) -> ApiResult<EtlConfig> {
        match &self.config_manager {
            Some(manager) => manager
                .load_etl_config(robot_id)
                .map_err(|e| ApiError::ConfigError(e.to_string())),
            None => Ok(EtlConfig::default()),
        }
    }

    /// 运行单台机器人（文件数据源）
    pub async fn run_robot(&self, job: &RobotJob) -> ApiResult<RobotRunReport> {
        let config = self.load_config(&job.robot_id)?;
        let source = FileLogSource::new(job.files.clone(), config);
        let no_data_marker = source.config().no_data_marker.clone();
        self.run_source(&job.robot_id, &source, no_data_marker).await
    }

    /// 运行单台机器人（任意数据源）
    #[instrument(skip(self, source, no_data_marker))]
    pub async fn run_source(
        &self,
        robot_id: &str,
        source: &dyn RobotLogSource,
        no_data_marker: String,
    ) -> ApiResult<RobotRunReport> {
        let classification = source.load_classification().await?;
        let stoppages = source.load_stoppages().await?;
        let production = source.load_production().await?;

        let table = ClassificationTable::from_entries(classification.records);
        info!(
            robot_id = %robot_id,
            classification_entries = table.len(),
            stoppages = stoppages.records.len(),
            production = production.records.len(),
            "运行日志加载完成"
        );

        let result = self.orchestrator.run(RobotRunInput {
            robot_id,
            stoppages: &stoppages.records,
            production: &production.records,
            classification: &table,
        })?;

        let persisted_rows = match (&self.fact_repo, result.range) {
            (Some(repo), Some(range)) => {
                repo.replace_range(robot_id, &result.diagnostics.run_id, range, &result.facts)?
            }
            _ => 0,
        };

        Ok(RobotRunReport {
            robot_id: robot_id.to_string(),
            facts: result.facts,
            range: result.range,
            diagnostics: result.diagnostics,
            skipped_rows: SkippedRowCounts {
                stoppage: stoppages.skipped.len(),
                production: production.skipped.len(),
                classification: classification.skipped.len(),
            },
            persisted_rows,
            no_data_marker,
        })
    }

    /// 批量运行多台机器人
    ///
    /// 每个任务独立返回结果，顺序与输入一致。
    pub async fn run_batch(&self, jobs: Vec<RobotJob>) -> Vec<ApiResult<RobotRunReport>> {
        info!(count = jobs.len(), "开始批量运行");

        let tasks = jobs.iter().map(|job| async move {
            match self.run_robot(job).await {
                Ok(report) => {
                    info!(
                        robot_id = %job.robot_id,
                        hours = report.facts.len(),
                        persisted = report.persisted_rows,
                        "机器人运行成功"
                    );
                    Ok(report)
                }
                Err(e) => {
                    error!(robot_id = %job.robot_id, error = %e, "机器人运行失败");
                    Err(e)
                }
            }
        });

        let results = join_all(tasks).await;

        info!(
            total = results.len(),
            success = results.iter().filter(|r| r.is_ok()).count(),
            failed = results.iter().filter(|r| r.is_err()).count(),
            "批量运行完成"
        );

        results
    }
}
