// ==========================================
// 机器人 OEE 数据处理系统 - 小时事实表仓储
// ==========================================
// 职责: 管理 hourly_fact 表的写入与查询
// 红线: Repository 不含业务逻辑
// 约束: 同一机器人重跑时，在一个事务内替换本次区间的行
// ==========================================

use crate::domain::fact::HourlyFact;
use crate::domain::hour::HourRange;
use crate::domain::production::HourlyProduction;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};
use tracing::debug;

const HOUR_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ==========================================
// HourlyFactRepository - 小时事实表仓储
// ==========================================
pub struct HourlyFactRepository {
    conn: Arc<Mutex<Connection>>,
}

impl HourlyFactRepository {
    /// 创建新的仓储实例（自动建表）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        crate::db::init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 替换某台机器人在区间内的事实行
    ///
    /// # 返回
    /// - Ok(usize): 写入行数
    pub fn replace_range(
        &self,
        robot_id: &str,
        run_id: &str,
        range: HourRange,
        facts: &[HourlyFact],
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let deleted = tx.execute(
            "DELETE FROM hourly_fact WHERE robot_id = ?1 AND hour_start BETWEEN ?2 AND ?3",
            params![
                robot_id,
                range.first.format(HOUR_FORMAT).to_string(),
                range.last.format(HOUR_FORMAT).to_string()
            ],
        )?;

        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO hourly_fact (
                    robot_id, hour_start, run_id, production_rows,
                    part_number, lot_number, lot_count, parts_made, total_rejects,
                    total_down_minutes, planned_minutes, unplanned_minutes, availability
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                "#,
            )?;

            for fact in facts {
                let p = fact.production.as_ref();
                inserted += stmt.execute(params![
                    robot_id,
                    fact.hour_start.format(HOUR_FORMAT).to_string(),
                    run_id,
                    p.map(|p| p.source_rows as i64).unwrap_or(0),
                    p.and_then(|p| p.part_number.clone()),
                    p.and_then(|p| p.lot_number.clone()),
                    p.and_then(|p| p.lot_count),
                    p.map(|p| p.parts_made),
                    p.map(|p| p.total_rejects),
                    fact.total_down_minutes,
                    fact.planned_minutes,
                    fact.unplanned_minutes,
                    fact.availability,
                ])?;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        debug!(robot_id, run_id, deleted, inserted, "事实表区间已替换");
        Ok(inserted)
    }

    /// 按机器人与时间区间查询事实行（按小时排序）
    pub fn find_by_range(
        &self,
        robot_id: &str,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> RepositoryResult<Vec<HourlyFact>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT
                hour_start, production_rows, part_number, lot_number, lot_count,
                parts_made, total_rejects, total_down_minutes, planned_minutes,
                unplanned_minutes, availability
            FROM hourly_fact
            WHERE robot_id = ?1 AND hour_start BETWEEN ?2 AND ?3
            ORDER BY hour_start
            "#,
        )?;

        let rows = stmt.query_map(
            params![
                robot_id,
                from.format(HOUR_FORMAT).to_string(),
                to.format(HOUR_FORMAT).to_string()
            ],
            |row| {
                Ok(FactRow {
                    hour_start: row.get(0)?,
                    production_rows: row.get(1)?,
                    part_number: row.get(2)?,
                    lot_number: row.get(3)?,
                    lot_count: row.get(4)?,
                    parts_made: row.get(5)?,
                    total_rejects: row.get(6)?,
                    total_down_minutes: row.get(7)?,
                    planned_minutes: row.get(8)?,
                    unplanned_minutes: row.get(9)?,
                    availability: row.get(10)?,
                })
            },
        )?;

        let mut facts = Vec::new();
        for row in rows {
            facts.push(row?.into_fact()?);
        }
        Ok(facts)
    }

    /// 查询某台机器人最后一次写入的 run_id
    pub fn latest_run_id(&self, robot_id: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let run_id = conn
            .query_row(
                "SELECT run_id FROM hourly_fact WHERE robot_id = ?1 ORDER BY hour_start DESC LIMIT 1",
                params![robot_id],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(run_id)
    }
}

/// 数据库行（中间结构）
struct FactRow {
    hour_start: String,
    /// 0 = 该小时无产量数据
    production_rows: i64,
    part_number: Option<String>,
    lot_number: Option<String>,
    lot_count: Option<f64>,
    parts_made: Option<f64>,
    total_rejects: Option<f64>,
    total_down_minutes: f64,
    planned_minutes: f64,
    unplanned_minutes: f64,
    availability: Option<f64>,
}

impl FactRow {
    fn into_fact(self) -> RepositoryResult<HourlyFact> {
        let hour_start = NaiveDateTime::parse_from_str(&self.hour_start, HOUR_FORMAT).map_err(|e| {
            RepositoryError::StoredValueError {
                column: "hour_start".to_string(),
                message: format!("{}: {}", self.hour_start, e),
            }
        })?;

        let production = if self.production_rows > 0 {
            Some(HourlyProduction {
                hour_start,
                part_number: self.part_number,
                lot_number: self.lot_number,
                lot_count: self.lot_count,
                parts_made: self.parts_made.unwrap_or(0.0),
                total_rejects: self.total_rejects.unwrap_or(0.0),
                source_rows: self.production_rows as usize,
            })
        } else {
            None
        };

        Ok(HourlyFact {
            hour_start,
            production,
            total_down_minutes: self.total_down_minutes,
            planned_minutes: self.planned_minutes,
            unplanned_minutes: self.unplanned_minutes,
            availability: self.availability,
        })
    }
}
