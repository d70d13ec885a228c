// ==========================================
// 机器人 OEE 数据处理系统 - 仓储层错误类型
// ==========================================
// 来源: hourly_fact 表的锁、事务、SQL 执行、已存行回读
// ==========================================

use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 连接互斥锁中毒
    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    /// 区间替换事务开启或提交失败
    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    /// (robot_id, hour_start) 主键冲突
    #[error("唯一约束违反: {0}")]
    UniqueConstraintViolation(String),

    /// 已存行无法还原为 HourlyFact
    #[error("已存字段无法解析 (column={column}): {message}")]
    StoredValueError { column: String, message: String },
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("UNIQUE") => {
                RepositoryError::UniqueConstraintViolation(msg)
            }
            rusqlite::Error::SqliteFailure(_, Some(msg)) => RepositoryError::DatabaseQueryError(msg),
            other => RepositoryError::DatabaseQueryError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_unique_failure_maps_to_constraint_violation() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t (robot_id TEXT, hour_start TEXT, PRIMARY KEY (robot_id, hour_start));
             INSERT INTO t VALUES ('R07', '2022-02-03 10:00:00');",
        )
        .unwrap();
        let err: RepositoryError = conn
            .execute("INSERT INTO t VALUES ('R07', '2022-02-03 10:00:00')", [])
            .unwrap_err()
            .into();
        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
    }

    #[test]
    fn test_other_failures_map_to_query_error() {
        let conn = Connection::open_in_memory().unwrap();
        let err: RepositoryError = conn
            .execute("SELECT * FROM missing_table", [])
            .unwrap_err()
            .into();
        assert!(matches!(err, RepositoryError::DatabaseQueryError(_)));

        let err: RepositoryError = conn
            .query_row("SELECT 1 WHERE 0", [], |row| row.get::<_, i64>(0))
            .unwrap_err()
            .into();
        assert!(matches!(err, RepositoryError::DatabaseQueryError(_)));
    }
}
