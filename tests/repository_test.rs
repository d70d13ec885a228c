// ==========================================
// 仓储层集成测试
// ==========================================
// 测试目标: hourly_fact 表的写入、查询与区间替换
// 覆盖范围: 往返一致、重跑替换、区间外行保留、配置覆写经由数据库生效
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use robot_oee_etl::api::{EtlApi, RobotJob};
use robot_oee_etl::config::{config_keys, ConfigManager, ConfigScope};
use robot_oee_etl::domain::fact::{availability, HourlyFact};
use robot_oee_etl::domain::hour::HourRange;
use robot_oee_etl::domain::production::HourlyProduction;
use robot_oee_etl::importer::RobotLogFiles;
use robot_oee_etl::repository::HourlyFactRepository;
use std::fs;
use tempfile::TempDir;

// ==========================================
// 测试辅助函数
// ==========================================

fn hour(h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2022, 2, 3)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

fn fact(h: u32, total: f64, planned: f64, parts: Option<f64>) -> HourlyFact {
    HourlyFact {
        hour_start: hour(h),
        production: parts.map(|parts_made| HourlyProduction {
            hour_start: hour(h),
            part_number: Some("7781".to_string()),
            lot_number: None,
            lot_count: Some(2.0),
            parts_made,
            total_rejects: 4.0,
            source_rows: 2,
        }),
        total_down_minutes: total,
        planned_minutes: planned,
        unplanned_minutes: (total - planned).max(0.0),
        availability: availability(total, planned),
    }
}

fn setup_repo() -> (TempDir, String, HourlyFactRepository) {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("oee.db").to_string_lossy().to_string();
    let repo = HourlyFactRepository::new(&db_path).unwrap();
    (dir, db_path, repo)
}

// ==========================================
// HourlyFactRepository
// ==========================================

#[test]
fn test_replace_and_find_round_trip() {
    let (_dir, _db_path, repo) = setup_repo();
    let facts = vec![
        fact(10, 0.0, 0.0, Some(118.0)),
        fact(11, 30.0, 10.0, None),
        fact(12, 60.0, 60.0, Some(0.0)),
    ];

    let written = repo
        .replace_range("R07", "run-1", HourRange::new(hour(10), hour(12)), &facts)
        .unwrap();
    assert_eq!(written, 3);

    let loaded = repo.find_by_range("R07", hour(10), hour(12)).unwrap();
    assert_eq!(loaded, facts);
    assert_eq!(loaded[2].availability, None);
    assert_eq!(repo.latest_run_id("R07").unwrap(), Some("run-1".to_string()));
}

#[test]
fn test_rerun_replaces_only_its_range() {
    let (_dir, _db_path, repo) = setup_repo();
    let first = vec![
        fact(8, 5.0, 0.0, Some(100.0)),
        fact(9, 5.0, 0.0, Some(100.0)),
        fact(10, 5.0, 0.0, Some(100.0)),
    ];
    repo.replace_range("R07", "run-1", HourRange::new(hour(8), hour(10)), &first)
        .unwrap();

    let second = vec![fact(9, 20.0, 5.0, None), fact(10, 25.0, 0.0, None)];
    repo.replace_range("R07", "run-2", HourRange::new(hour(9), hour(10)), &second)
        .unwrap();

    let loaded = repo.find_by_range("R07", hour(8), hour(10)).unwrap();
    assert_eq!(loaded.len(), 3);
    assert_eq!(loaded[0], first[0]);
    assert_eq!(loaded[1], second[0]);
    assert_eq!(loaded[2], second[1]);
}

#[test]
fn test_robots_are_isolated() {
    let (_dir, _db_path, repo) = setup_repo();
    let range = HourRange::new(hour(8), hour(8));
    repo.replace_range("R01", "a", range, &[fact(8, 1.0, 0.0, None)])
        .unwrap();
    repo.replace_range("R02", "b", range, &[fact(8, 2.0, 0.0, None)])
        .unwrap();

    let r1 = repo.find_by_range("R01", hour(8), hour(8)).unwrap();
    assert_eq!(r1.len(), 1);
    assert_eq!(r1[0].total_down_minutes, 1.0);
    assert_eq!(repo.latest_run_id("R03").unwrap(), None);
}

// ==========================================
// EtlApi + 数据库
// ==========================================

#[tokio::test]
async fn test_api_persists_with_robot_config_override() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("oee.db").to_string_lossy().to_string();

    // 该机器人的停机日志使用不同的列名
    let manager = ConfigManager::new(&db_path).unwrap();
    let scope = ConfigScope::Robot {
        robot_id: "R09".to_string(),
    };
    manager
        .set_config_value(&scope, config_keys::STOPPAGE_START_COLUMN, "Start")
        .unwrap();
    manager
        .set_config_value(&scope, config_keys::STOPPAGE_END_COLUMN, "Reset")
        .unwrap();

    let files = RobotLogFiles {
        stoppage_path: dir.path().join("stops.csv"),
        production_path: dir.path().join("production.csv"),
        classification_path: dir.path().join("classification.csv"),
    };
    fs::write(
        &files.stoppage_path,
        "Start,Reset,Major,Minor0\n2022-02-03 08:30:00,2022-02-03 09:15:00,Robot,Jam\n",
    )
    .unwrap();
    fs::write(
        &files.production_path,
        "DateTime,Parts Made\n2022-02-03 08:00:00,50\n2022-02-03 09:00:00,60\n",
    )
    .unwrap();
    fs::write(
        &files.classification_path,
        "majorStoppageReason,minorStoppageReason,classificationStoppageReason\nRobot,Jam,unplanned\n",
    )
    .unwrap();

    let api = EtlApi::with_database(&db_path).unwrap();
    let job = RobotJob {
        robot_id: "R09".to_string(),
        files,
    };

    let first = api.run_robot(&job).await.unwrap();
    assert_eq!(first.facts.len(), 2);
    assert_eq!(first.persisted_rows, 2);

    // 重跑: 行数不变，run_id 更新
    let second = api.run_robot(&job).await.unwrap();
    let repo = HourlyFactRepository::new(&db_path).unwrap();
    let stored = repo.find_by_range("R09", hour(8), hour(9)).unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored, second.facts);
    assert_eq!(stored[0].total_down_minutes, 30.0);
    assert_eq!(stored[1].total_down_minutes, 15.0);
    assert_eq!(
        repo.latest_run_id("R09").unwrap(),
        Some(second.diagnostics.run_id.clone())
    );
}
