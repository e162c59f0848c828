use super::{App, AppError, AppPaths, ImportOutcome};
use crate::backup::BackupIndicator;
use crate::clock::ManualClock;
use crate::domain::backup::BackupKind;
use crate::domain::routine::{ExerciseSpec, RoutineDraft};
use crate::domain::settings::{SettingsPatch, Theme};
use crate::scheduler::Job;
use serde_json::json;
use std::path::{Path, PathBuf};
use time::macros::datetime;
use time::Duration;
use uuid::Uuid;

fn unique_workspace() -> PathBuf {
    let root = std::env::temp_dir().join(format!("gymlog-backup-test-{}", Uuid::now_v7()));
    std::fs::create_dir_all(&root).expect("temp workspace should be creatable");
    root
}

fn open_app(root: &Path, clock: &ManualClock) -> App {
    App::open_with_clock(&AppPaths::under(root), Box::new(clock.clone())).expect("app should open")
}

fn squat_day(folder_id: Option<&str>) -> RoutineDraft {
    RoutineDraft {
        name: "Squat Day".to_string(),
        folder_id: folder_id.map(str::to_string),
        exercises: vec![ExerciseSpec {
            name: "Squat".to_string(),
            equipment: "Barbell".to_string(),
            target_sets: 5,
            target_reps: 5,
            target_weight: 100.0,
            notes: String::new(),
        }],
    }
}

fn populate(app: &mut App) {
    let folder = app
        .create_folder("Strength", None)
        .expect("folder should create");
    let routine = app
        .create_routine(squat_day(Some(&folder.id)))
        .expect("routine should create");
    let workout = app
        .start_workout(&routine.id)
        .expect("workout should start");
    app.finish_workout(&workout.id)
        .expect("finish should succeed");
    app.add_custom_exercise("Hip Thrust", "Legs", Some("Glute focus"))
        .expect("custom exercise should add");
}

#[test]
fn automatic_backup_waits_for_the_interval() {
    let root = unique_workspace();
    let clock = ManualClock::at(datetime!(2026-03-01 10:00 UTC));
    let mut app = open_app(&root, &clock);
    app.seed_sample().expect("seed should succeed");

    app.run_manual_backup().expect("first manual backup");
    clock.advance(Duration::minutes(5));
    app.run_manual_backup().expect("second manual backup");
    clock.advance(Duration::hours(1));

    assert!(app
        .run_automatic_backup_if_due()
        .expect("check should succeed")
        .is_none());
    let kinds = app
        .list_backups()
        .iter()
        .map(|version| version.kind)
        .collect::<Vec<_>>();
    assert_eq!(kinds, vec![BackupKind::Manual, BackupKind::Manual]);

    clock.advance(Duration::hours(24));
    let auto = app
        .run_automatic_backup_if_due()
        .expect("check should succeed")
        .expect("auto backup should be due");
    assert_eq!(auto.kind, BackupKind::Auto);
    assert_eq!(app.data().backup.last_auto_backup, Some(auto.timestamp));
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn automatic_backups_are_pruned_with_their_payloads() {
    let root = unique_workspace();
    let clock = ManualClock::at(datetime!(2026-03-01 10:00 UTC));
    let mut app = open_app(&root, &clock);
    populate(&mut app);
    app.run_manual_backup().expect("manual backup");

    let mut auto_keys = Vec::new();
    for _ in 0..10 {
        let version = app
            .run_automatic_backup_if_due()
            .expect("check should succeed")
            .expect("auto backup should be due");
        auto_keys.push(version.storage_key);
        clock.advance(Duration::hours(24));
    }

    let status = app.backup_status();
    assert_eq!(status.auto_versions, 7);
    assert_eq!(status.manual_versions, 1);
    assert_eq!(app.list_backups()[0].kind, BackupKind::Manual);

    let stored = app.backups.keys().expect("keys should list");
    assert_eq!(stored.len(), 8);
    for pruned in &auto_keys[..3] {
        assert!(!stored.contains(pruned));
        assert!(matches!(
            app.restore_backup(pruned, |_| true),
            Err(AppError::NotFound { kind: "backup", .. })
        ));
    }
    for kept in &auto_keys[3..] {
        assert!(app.data().backup.find(kept).is_some());
    }
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn backups_in_the_same_instant_get_distinct_keys() {
    let root = unique_workspace();
    let clock = ManualClock::at(datetime!(2026-03-01 10:00 UTC));
    let mut app = open_app(&root, &clock);

    let first = app.run_manual_backup().expect("first backup");
    let second = app.run_manual_backup().expect("second backup");
    assert_ne!(first.storage_key, second.storage_key);
    assert_eq!(second.storage_key, format!("{}-2", first.storage_key));
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn failed_metadata_write_leaves_no_orphan_payload() {
    let root = unique_workspace();
    let clock = ManualClock::at(datetime!(2026-03-01 10:00 UTC));
    let mut app = open_app(&root, &clock);

    let conn = rusqlite::Connection::open(AppPaths::under(&root).db_path)
        .expect("second connection should open");
    conn.execute_batch("DROP TABLE documents")
        .expect("table drop should succeed");

    assert!(matches!(
        app.run_manual_backup(),
        Err(AppError::Persistence(_))
    ));
    assert!(app.list_backups().is_empty());
    assert!(app.data().backup.last_manual_backup.is_none());
    assert!(app.backups.keys().expect("keys should list").is_empty());
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn reminder_and_indicator_follow_the_last_manual_backup() {
    let root = unique_workspace();
    let clock = ManualClock::at(datetime!(2026-03-01 10:00 UTC));
    let mut app = open_app(&root, &clock);

    assert!(app.is_reminder_due());
    assert_eq!(app.backup_status().indicator, BackupIndicator::Missing);

    app.run_manual_backup().expect("manual backup");
    assert!(!app.is_reminder_due());
    assert_eq!(app.backup_status().indicator, BackupIndicator::Ok);

    clock.advance(Duration::days(8));
    let status = app.backup_status();
    assert!(status.reminder_due);
    assert_eq!(status.days_since_manual, Some(8));
    assert_eq!(status.indicator, BackupIndicator::Pending);

    app.update_settings(&SettingsPatch {
        backup_reminders_enabled: Some(false),
        ..SettingsPatch::default()
    })
    .expect("settings should update");
    assert!(!app.is_reminder_due());
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn importing_an_export_reproduces_the_store() {
    let root = unique_workspace();
    let clock = ManualClock::at(datetime!(2026-03-01 10:00 UTC));
    let mut app = open_app(&root, &clock);
    populate(&mut app);
    app.update_settings(&SettingsPatch {
        theme: Some(Theme::Dark),
        ..SettingsPatch::default()
    })
    .expect("settings should update");
    let before = app.data().clone();
    let exported = serde_json::to_value(app.export_snapshot()).expect("export should serialize");

    clock.advance(Duration::hours(2));
    let routine_id = before.routines[0].id.clone();
    app.delete_routine(&routine_id)
        .expect("delete should succeed");
    app.create_folder("Scratch", None)
        .expect("folder should create");
    app.update_settings(&SettingsPatch {
        theme: Some(Theme::Light),
        ..SettingsPatch::default()
    })
    .expect("settings should update");

    let outcome = app
        .import_snapshot(&exported, |preview| {
            assert_eq!(preview.routines, 1);
            assert_eq!(preview.workouts, 1);
            assert_eq!(preview.folders, 1);
            assert_eq!(preview.custom_exercises, 1);
            true
        })
        .expect("import should succeed");
    assert!(matches!(outcome, ImportOutcome::Replaced(_)));

    let after = app.data();
    assert_eq!(after.routines, before.routines);
    assert_eq!(after.workouts, before.workouts);
    assert_eq!(after.folders, before.folders);
    assert_eq!(after.custom_exercises, before.custom_exercises);
    assert_eq!(after.settings, before.settings);
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn declined_import_changes_nothing() {
    let root = unique_workspace();
    let clock = ManualClock::at(datetime!(2026-03-01 10:00 UTC));
    let mut app = open_app(&root, &clock);
    populate(&mut app);
    let before = app.data().clone();

    let outcome = app
        .import_snapshot(&json!({ "routines": [], "workouts": [] }), |_| false)
        .expect("declining is not an error");
    assert_eq!(outcome, ImportOutcome::Cancelled);
    assert_eq!(app.data(), &before);
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn unknown_documents_are_rejected_without_changes() {
    let root = unique_workspace();
    let clock = ManualClock::at(datetime!(2026-03-01 10:00 UTC));
    let mut app = open_app(&root, &clock);
    populate(&mut app);
    let before = app.data().clone();

    let err = app
        .import_snapshot(&json!({ "type": "unknown" }), |_| true)
        .expect_err("unknown document should fail");
    assert!(matches!(err, AppError::UnrecognizedFormat(_)));
    assert!(matches!(
        app.import_str("not json", |_| true),
        Err(AppError::UnrecognizedFormat(_))
    ));
    let newer = json!({ "version": "4.0", "routines": [], "workouts": [] });
    assert!(matches!(
        app.import_snapshot(&newer, |_| true),
        Err(AppError::UnrecognizedFormat(_))
    ));
    assert_eq!(app.data(), &before);
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn single_routine_import_gets_a_fresh_id() {
    let root = unique_workspace();
    let clock = ManualClock::at(datetime!(2026-03-01 10:00 UTC));
    let mut app = open_app(&root, &clock);
    populate(&mut app);
    let original = app.data().routines[0].clone();
    let exported = app
        .export_routine(&original.id)
        .expect("export should succeed");
    let raw = serde_json::to_string(&exported).expect("export should serialize");

    let outcome = app
        .import_str(&raw, |_| false)
        .expect("import should succeed");
    let ImportOutcome::RoutineImported(imported) = outcome else {
        panic!("expected a routine import, got {:?}", outcome);
    };
    assert_ne!(imported.id, original.id);
    assert_eq!(imported.name, original.name);
    assert_eq!(imported.folder_id, original.folder_id);
    assert_eq!(app.data().routines.len(), 2);

    let dangling = json!({
        "type": "single_routine",
        "version": "3.0",
        "routine": {
            "name": "Pull",
            "folderId": "f-gone",
            "exercises": [{ "nombre": "Row", "series_objetivo": 3, "repeticiones_objetivo": 10 }]
        }
    });
    let outcome = app
        .import_snapshot(&dangling, |_| false)
        .expect("import should succeed");
    let ImportOutcome::RoutineImported(pull) = outcome else {
        panic!("expected a routine import, got {:?}", outcome);
    };
    assert!(pull.folder_id.is_none());
    assert_eq!(pull.exercises[0].name, "Row");
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn restoring_a_backup_brings_back_its_snapshot() {
    let root = unique_workspace();
    let clock = ManualClock::at(datetime!(2026-03-01 10:00 UTC));
    let mut app = open_app(&root, &clock);
    populate(&mut app);
    let before = app.data().routines.clone();
    let version = app.run_manual_backup().expect("manual backup");

    clock.advance(Duration::hours(1));
    app.delete_routine(&before[0].id)
        .expect("delete should succeed");
    assert!(app.data().routines.is_empty());

    let outcome = app
        .restore_backup(&version.storage_key, |_| true)
        .expect("restore should succeed");
    assert!(matches!(outcome, ImportOutcome::Replaced(_)));
    assert_eq!(app.data().routines, before);
    assert!(matches!(
        app.restore_backup("manual_backup_missing", |_| true),
        Err(AppError::NotFound { .. })
    ));
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn scheduler_follows_the_auto_backup_setting() {
    let root = unique_workspace();
    let clock = ManualClock::at(datetime!(2026-03-01 10:00 UTC));
    let mut app = open_app(&root, &clock);

    let mut scheduler = app.scheduler();
    assert!(scheduler.is_armed());
    let jobs = scheduler.due(app.now());
    assert_eq!(jobs, vec![Job::BackupCheck]);
    let version = app
        .run_job(Job::BackupCheck)
        .expect("job should run")
        .expect("first auto backup should be due");
    assert_eq!(version.kind, BackupKind::Auto);
    let saved = app.run_job(Job::AutoSave).expect("autosave should run");
    assert!(saved.is_none());

    app.update_settings(&SettingsPatch {
        auto_backup_enabled: Some(false),
        ..SettingsPatch::default()
    })
    .expect("settings should update");
    let mut scheduler = app.scheduler();
    assert!(!scheduler.is_armed());
    clock.advance(Duration::days(3));
    assert!(scheduler.due(app.now()).is_empty());
    assert!(scheduler.next_wake().is_none());
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn legacy_exports_with_blank_or_fractional_numbers_import() {
    let root = unique_workspace();
    let clock = ManualClock::at(datetime!(2026-03-01 10:00 UTC));
    let mut app = open_app(&root, &clock);
    let legacy = json!({
        "routines": [{
            "id": "1708420000000",
            "name": "Piernas",
            "folderId": null,
            "createdAt": "2026-02-20T09:00:00.000Z",
            "exercises": [{
                "nombre": "Sentadilla",
                "equipamiento": "Barra",
                "series_objetivo": 2,
                "repeticiones_objetivo": 6,
                "peso_objetivo": null,
                "observaciones": ""
            }]
        }],
        "workouts": [{
            "id": "1708430000000",
            "routineId": "1708420000000",
            "routineName": "Piernas",
            "date": "2026-02-21T09:30:00.000Z",
            "exercises": [{
                "nombre": "Sentadilla",
                "equipamiento": "Barra",
                "series_objetivo": 2,
                "repeticiones_objetivo": 6,
                "peso_objetivo": null,
                "observaciones": "",
                "sets": [
                    { "weight": 100, "reps": 7.5, "effort": "hard" },
                    { "weight": null, "reps": 6, "effort": null }
                ]
            }]
        }],
        "folders": [],
        "exportDate": "2026-02-22T10:00:00.000Z",
        "version": "3.0"
    });
    let raw = serde_json::to_string(&legacy).expect("legacy document should serialize");

    let outcome = app
        .import_str(&raw, |_| true)
        .expect("legacy export should import");
    assert!(matches!(outcome, ImportOutcome::Replaced(_)));

    let routine = &app.data().routines[0];
    assert_eq!(routine.exercises[0].name, "Sentadilla");
    assert_eq!(routine.exercises[0].target_weight, 0.0);
    let sets = &app.data().workouts[0].exercises[0].sets;
    assert_eq!(sets[0].reps, 7);
    assert_eq!(sets[0].weight, 100.0);
    assert_eq!(sets[1].weight, 0.0);
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn full_import_discards_the_workout_in_progress() {
    let root = unique_workspace();
    let clock = ManualClock::at(datetime!(2026-03-01 10:00 UTC));
    let mut app = open_app(&root, &clock);
    populate(&mut app);
    let routine_id = app.data().routines[0].id.clone();
    app.start_workout(&routine_id)
        .expect("workout should start");

    let outcome = app
        .import_snapshot(&json!({ "routines": [], "workouts": [] }), |preview| {
            assert!(preview.discards_active_workout);
            true
        })
        .expect("import should succeed");
    assert!(matches!(outcome, ImportOutcome::Replaced(_)));
    assert!(app.active_workout().is_none());
    drop(app);

    let reopened = open_app(&root, &clock);
    assert!(reopened.active_workout().is_none());
    assert!(reopened.data().routines.is_empty());
    let _ = std::fs::remove_dir_all(root);
}
