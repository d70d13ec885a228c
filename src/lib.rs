// ==========================================
// 机器人 OEE 数据处理系统 - 核心库
// ==========================================
// 输入: 停机日志 + 小时产量日志 + 停机分类表
// 输出: 小时事实表（总停机 / 计划停机 / 非计划停机 / 可用率）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 事实表落库
pub mod repository;

// 引擎层 - 分类 / 规范化 / 拆分 / 分摊 / 汇总
pub mod engine;

// 导入层 - 外部运行日志
pub mod importer;

// 配置层 - 列名与覆写
pub mod config;

// 数据库基础设施（连接初始化/建表）
pub mod db;

// 日志系统
pub mod logging;

// 结果导出
pub mod exporter;

// API 层 - 运行入口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::DowntimeKind;

// 领域实体
pub use domain::{
    HourBucket, HourRange, HourlyFact, HourlyProduction, ProductionRecord, RawStoppageRecord,
    RunDiagnostics, StoppageEvent, SubEvent,
};

// 引擎
pub use engine::{
    ClassificationTable, EngineError, EtlOrchestrator, EtlRunResult, HourlyAllocator,
    IntervalNormalizer, IntervalSplitter, OeeAggregator, RobotRunInput, StoppageClassifier,
};

// API
pub use api::{ApiError, EtlApi, RobotJob, RobotRunReport};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "机器人 OEE 数据处理系统";

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "ROBOT_OEE_ETL_DB_PATH";

/// 获取默认数据库路径
///
/// 顺序: 环境变量 → 用户数据目录 → 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./robot_oee_etl.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("robot-oee-etl");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("robot_oee_etl.db");
        }
    }

    path.to_string_lossy().to_string()
}
