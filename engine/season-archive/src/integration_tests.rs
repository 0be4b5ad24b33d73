//! Archive behaviour shared by the local and in-memory backends

use crate::*;
use tempfile::TempDir;
use weekly_report::{
    build_weekly_report, InMemoryRoster, LeagueRules, RawBrief, WeekKey, WeeklyReport,
};

fn report_for(week: u32) -> WeeklyReport {
    let brief = format!(
        r#"
WeekInfo: {{ Season: 2025, Week: {week} }}
Standings:
  Overall:
    - {{ Owner: Healzy, Division: BTK, Wins: 1, Losses: 0, PF: 108.62, PA: 85.08 }}
    - {{ Owner: Coops, Division: FLO, Wins: 0, Losses: 1, PF: 85.08, PA: 108.62 }}
Matchups:
  - Teams:
      - {{ Owner: Healzy, Score: 108.62 }}
      - {{ Owner: Coops, Score: 85.08 }}
"#
    );
    let roster = InMemoryRoster::new()
        .with_owner("Healzy", Some("BTK"), Some("healzyswarriors"))
        .with_owner("Coops", Some("FLO"), Some("coopersallstarz"));
    let raw = RawBrief::from_yaml_str(&brief).unwrap();
    build_weekly_report(&roster, LeagueRules::default(), &raw, WeekKey::new(2025, week)).unwrap()
}

async fn exercise_backend(archive: &dyn ArchiveBackend) {
    assert!(archive.latest(2025).await.unwrap().is_none());

    let week_three = report_for(3);
    let stored = archive.append(&week_three).await.unwrap();
    assert_eq!(stored.key, WeekKey::new(2025, 3));

    // Append-only: the same week cannot be written twice
    let second = archive.append(&report_for(3)).await;
    assert!(matches!(second, Err(ArchiveError::AlreadyExists(_))));

    archive.append(&report_for(1)).await.unwrap();
    archive.append(&report_for(10)).await.unwrap();

    assert_eq!(archive.list_weeks(2025).await.unwrap(), vec![1, 3, 10]);
    assert!(archive.list_weeks(2024).await.unwrap().is_empty());

    let loaded = archive.load(WeekKey::new(2025, 3)).await.unwrap();
    assert_eq!(loaded.report, week_three);
    assert_eq!(loaded.archived_at, stored.archived_at);

    let latest = archive.latest(2025).await.unwrap().unwrap();
    assert_eq!(latest.key.week, 10);

    let missing = archive.load(WeekKey::new(2025, 4)).await;
    assert!(matches!(missing, Err(ArchiveError::NotFound(_))));
}

#[tokio::test]
async fn test_local_archive() {
    let temp_dir = TempDir::new().unwrap();
    let archive = open_local_archive(temp_dir.path()).await.unwrap();

    exercise_backend(&archive).await;

    assert!(temp_dir.path().join("season-2025").join("week-03.json").exists());
    assert!(temp_dir.path().join("season-2025").join("week-10.json").exists());
}

#[tokio::test]
async fn test_in_memory_archive() {
    let mut archive = InMemoryArchive::with_default_config();
    archive.initialize().await.unwrap();

    exercise_backend(&archive).await;
}

#[tokio::test]
async fn test_uninitialized_backend_rejects_operations() {
    let temp_dir = TempDir::new().unwrap();
    let local = LocalArchive::with_default_config(temp_dir.path()).unwrap();
    let result = local.append(&report_for(1)).await;
    assert!(matches!(result, Err(ArchiveError::InvalidOperation(_))));

    let memory = InMemoryArchive::with_default_config();
    assert!(matches!(memory.list_weeks(2025).await, Err(ArchiveError::InvalidOperation(_))));
}

#[tokio::test]
async fn test_compact_json_is_readable() {
    let temp_dir = TempDir::new().unwrap();
    let config = ArchiveConfig {
        data_dir: temp_dir.path().to_path_buf(),
        pretty_json: false,
    };
    let archive = open_local_archive_with_config(config).await.unwrap();

    archive.append(&report_for(2)).await.unwrap();

    let raw = std::fs::read_to_string(archive.config().report_path(WeekKey::new(2025, 2))).unwrap();
    assert!(!raw.contains('\n'));
    assert_eq!(archive.load(WeekKey::new(2025, 2)).await.unwrap().report, report_for(2));
}

#[tokio::test]
async fn test_interrupted_write_does_not_block_the_week() {
    let temp_dir = TempDir::new().unwrap();
    let archive = open_local_archive(temp_dir.path()).await.unwrap();
    let season_dir = archive.config().season_dir(2025);
    std::fs::create_dir_all(&season_dir).unwrap();

    // A crash mid-write leaves only a partial staging file behind
    let stray = season_dir.join(".week-03.json.4242-1.tmp");
    std::fs::write(&stray, r#"{"key":{"season":20"#).unwrap();

    assert!(archive.list_weeks(2025).await.unwrap().is_empty());
    assert!(matches!(archive.load(WeekKey::new(2025, 3)).await, Err(ArchiveError::NotFound(_))));
    assert!(archive.latest(2025).await.unwrap().is_none());

    archive.append(&report_for(3)).await.unwrap();
    assert_eq!(archive.load(WeekKey::new(2025, 3)).await.unwrap().report, report_for(3));
    assert_eq!(archive.list_weeks(2025).await.unwrap(), vec![3]);

    // Only the stray file and the finished week remain; the append cleaned up after itself
    let mut names: Vec<String> = std::fs::read_dir(&season_dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec![".week-03.json.4242-1.tmp".to_string(), "week-03.json".to_string()]);
}
