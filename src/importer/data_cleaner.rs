// ==========================================
// 机器人 OEE 数据处理系统 - 数据清洗器
// ==========================================
// 职责: TRIM / NULL 标准化 / 日期时间解析 / 计数解析
// ==========================================

use chrono::NaiveDateTime;

pub struct DataCleaner {
    datetime_formats: Vec<String>,
}

impl DataCleaner {
    pub fn new(datetime_formats: Vec<String>) -> Self {
        Self { datetime_formats }
    }

    /// 标准化 NULL 值（空字符串/空白/NaN → None）
    pub fn normalize_null(&self, value: Option<&str>) -> Option<String> {
        value.and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
    }

    /// 按配置的格式顺序解析日期时间
    pub fn parse_datetime(&self, value: &str) -> Option<NaiveDateTime> {
        let trimmed = value.trim();
        self.datetime_formats
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
    }

    /// 解析计数字段（允许千分位逗号）
    ///
    /// 空值返回 Ok(None)，无法解析返回 Err(原值)。
    pub fn parse_count(&self, value: Option<&str>) -> Result<Option<f64>, String> {
        match self.normalize_null(value) {
            None => Ok(None),
            Some(v) => v
                .replace(',', "")
                .parse::<f64>()
                .map(Some)
                .map_err(|_| v),
        }
    }
}

impl Default for DataCleaner {
    fn default() -> Self {
        Self::new(crate::config::EtlConfig::default().datetime_formats)
    }
}
