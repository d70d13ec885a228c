// ==========================================
// 机器人 OEE 数据处理系统 - 配置管理器
// ==========================================
// 职责: 从 config_kv 表加载覆写项，叠加到默认 EtlConfig
// 覆写顺序: 默认值 → global → robot/{robot_id}
// ==========================================

use crate::config::etl_config::EtlConfig;
use crate::db::open_sqlite_connection;
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        crate::db::init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 读取配置项的全部覆写（按 key 排序）
    fn scope_entries(&self, scope: &ConfigScope) -> Result<Vec<(String, String)>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![scope.scope_id()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// 写入（或覆盖）单个配置项
    pub fn set_config_value(
        &self,
        scope: &ConfigScope,
        key: &str,
        value: &str,
    ) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3",
            params![scope.scope_id(), key, value],
        )?;
        Ok(())
    }

    /// 加载某台机器人的 ETL 配置
    pub fn load_etl_config(&self, robot_id: &str) -> Result<EtlConfig, Box<dyn Error>> {
        let mut config = EtlConfig::default();

        let scopes = [
            ConfigScope::Global,
            ConfigScope::Robot {
                robot_id: robot_id.to_string(),
            },
        ];
        for scope in &scopes {
            for (key, value) in self.scope_entries(scope)? {
                apply_override(&mut config, &key, &value)?;
                debug!(scope = %scope.scope_id(), key = %key, "应用配置覆写");
            }
        }

        Ok(config)
    }
}

/// 将单个覆写项写入配置
///
/// 列表类配置使用 JSON 数组；未知 key 只告警不报错。
pub fn apply_override(config: &mut EtlConfig, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
    let text = value.trim().to_string();
    match key {
        config_keys::STOPPAGE_START_COLUMN => config.stoppage.start = text,
        config_keys::STOPPAGE_END_COLUMN => config.stoppage.end = text,
        config_keys::STOPPAGE_MAJOR_COLUMN => config.stoppage.major = text,
        config_keys::STOPPAGE_MINOR_COLUMN => config.stoppage.minor = text,
        config_keys::STOPPAGE_PART_COLUMN => config.stoppage.part = text,
        config_keys::STOPPAGE_LOT_COLUMN => config.stoppage.lot = text,

        config_keys::PRODUCTION_TIMESTAMP_COLUMN => config.production.timestamp = text,
        config_keys::PRODUCTION_PART_COLUMN => config.production.part = text,
        config_keys::PRODUCTION_LOT_COLUMN => config.production.lot = text,
        config_keys::PRODUCTION_LOT_COUNT_COLUMN => config.production.lot_count = text,
        config_keys::PRODUCTION_PARTS_MADE_COLUMN => config.production.parts_made = text,
        config_keys::PRODUCTION_REJECT_COLUMNS => {
            config.production.reject_columns = serde_json::from_str(&text)
                .map_err(|e| format!("配置值格式错误 (key: {}): {}", key, e))?;
        }

        config_keys::CLASSIFICATION_MAJOR_COLUMN => config.classification.major = text,
        config_keys::CLASSIFICATION_MINOR_COLUMN => config.classification.minor = text,
        config_keys::CLASSIFICATION_LABEL_COLUMN => config.classification.label = text,
        config_keys::CLASSIFICATION_PLANNED_LABEL => config.classification.planned_label = text,

        config_keys::NO_DATA_MARKER => config.no_data_marker = text,
        config_keys::DATETIME_FORMATS => {
            config.datetime_formats = serde_json::from_str(&text)
                .map_err(|e| format!("配置值格式错误 (key: {}): {}", key, e))?;
        }

        _ => {
            warn!(config_key = key, "未知配置项，已忽略");
        }
    }
    Ok(())
}

// ==========================================
// ConfigScope - 配置作用域
// ==========================================
#[derive(Debug, Clone)]
pub enum ConfigScope {
    Global,                       // 全局
    Robot { robot_id: String },   // 单台机器人
}

impl ConfigScope {
    pub fn scope_id(&self) -> String {
        match self {
            ConfigScope::Global => "global".to_string(),
            ConfigScope::Robot { robot_id } => format!("robot/{}", robot_id),
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 停机日志列
    pub const STOPPAGE_START_COLUMN: &str = "stoppage.start_column";
    pub const STOPPAGE_END_COLUMN: &str = "stoppage.end_column";
    pub const STOPPAGE_MAJOR_COLUMN: &str = "stoppage.major_column";
    pub const STOPPAGE_MINOR_COLUMN: &str = "stoppage.minor_column";
    pub const STOPPAGE_PART_COLUMN: &str = "stoppage.part_column";
    pub const STOPPAGE_LOT_COLUMN: &str = "stoppage.lot_column";

    // 产量日志列
    pub const PRODUCTION_TIMESTAMP_COLUMN: &str = "production.timestamp_column";
    pub const PRODUCTION_PART_COLUMN: &str = "production.part_column";
    pub const PRODUCTION_LOT_COLUMN: &str = "production.lot_column";
    pub const PRODUCTION_LOT_COUNT_COLUMN: &str = "production.lot_count_column";
    pub const PRODUCTION_PARTS_MADE_COLUMN: &str = "production.parts_made_column";
    pub const PRODUCTION_REJECT_COLUMNS: &str = "production.reject_columns"; // JSON 数组

    // 分类表
    pub const CLASSIFICATION_MAJOR_COLUMN: &str = "classification.major_column";
    pub const CLASSIFICATION_MINOR_COLUMN: &str = "classification.minor_column";
    pub const CLASSIFICATION_LABEL_COLUMN: &str = "classification.label_column";
    pub const CLASSIFICATION_PLANNED_LABEL: &str = "classification.planned_label";

    // 输出
    pub const NO_DATA_MARKER: &str = "output.no_data_marker";

    // 导入
    pub const DATETIME_FORMATS: &str = "import.datetime_formats"; // JSON 数组
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn manager() -> (NamedTempFile, ConfigManager) {
        let temp_file = NamedTempFile::new().unwrap();
        let manager = ConfigManager::new(temp_file.path().to_str().unwrap()).unwrap();
        (temp_file, manager)
    }

    #[test]
    fn test_defaults_without_overrides() {
        let (_file, manager) = manager();
        let config = manager.load_etl_config("rb-ha-01").unwrap();
        assert_eq!(config, EtlConfig::default());
        assert_eq!(config.stoppage.start, "LPM DateTime");
        assert_eq!(config.production.reject_columns.len(), 22);
    }

    #[test]
    fn test_robot_scope_overrides_global() {
        let (_file, manager) = manager();
        manager
            .set_config_value(&ConfigScope::Global, config_keys::NO_DATA_MARKER, "NA")
            .unwrap();
        manager
            .set_config_value(
                &ConfigScope::Robot {
                    robot_id: "rb-ha-01".to_string(),
                },
                config_keys::NO_DATA_MARKER,
                "MISSING",
            )
            .unwrap();

        assert_eq!(manager.load_etl_config("rb-ha-01").unwrap().no_data_marker, "MISSING");
        assert_eq!(manager.load_etl_config("rb-ha-02").unwrap().no_data_marker, "NA");
    }

    #[test]
    fn test_list_override_parses_json() {
        let mut config = EtlConfig::default();
        apply_override(
            &mut config,
            config_keys::PRODUCTION_REJECT_COLUMNS,
            r#"["Cable Rejects", "Knots"]"#,
        )
        .unwrap();
        assert_eq!(config.production.reject_columns, vec!["Cable Rejects", "Knots"]);

        assert!(apply_override(&mut config, config_keys::DATETIME_FORMATS, "not json").is_err());
    }

    #[test]
    fn test_unknown_key_is_ignored() {
        let mut config = EtlConfig::default();
        apply_override(&mut config, "season_mode", "AUTO").unwrap();
        assert_eq!(config, EtlConfig::default());
    }
}
