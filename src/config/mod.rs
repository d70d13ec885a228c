// ==========================================
// 机器人 OEE 数据处理系统 - 配置层
// ==========================================
// 职责: 日志列名 / 分类标签 / 输出标记 / 时间格式
// 存储: config_kv 表 (key-value + scope)
// ==========================================

pub mod config_manager;
pub mod etl_config;

// 重导出核心配置
pub use config_manager::{apply_override, config_keys, ConfigManager, ConfigScope};
pub use etl_config::{ClassificationColumns, EtlConfig, ProductionColumns, StoppageColumns};
