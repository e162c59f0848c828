use super::{App, AppError, AppPaths, RoutineFilter};
use crate::clock::ManualClock;
use crate::domain::routine::{ExerciseSpec, RoutineDraft};
use crate::domain::settings::{SettingsPatch, Theme};
use crate::domain::workout::{Effort, SetUpdate};
use crate::workouts::SetEdit;
use std::path::{Path, PathBuf};
use time::macros::datetime;
use time::Duration;
use uuid::Uuid;

fn unique_workspace() -> PathBuf {
    let root = std::env::temp_dir().join(format!("gymlog-app-test-{}", Uuid::now_v7()));
    std::fs::create_dir_all(&root).expect("temp workspace should be creatable");
    root
}

fn open_app(root: &Path, clock: &ManualClock) -> App {
    App::open_with_clock(&AppPaths::under(root), Box::new(clock.clone())).expect("app should open")
}

fn exercise(name: &str, target_sets: u32) -> ExerciseSpec {
    ExerciseSpec {
        name: name.to_string(),
        equipment: "Barbell".to_string(),
        target_sets,
        target_reps: 8,
        target_weight: 60.0,
        notes: String::new(),
    }
}

fn draft(name: &str, folder_id: Option<&str>, exercises: Vec<ExerciseSpec>) -> RoutineDraft {
    RoutineDraft {
        name: name.to_string(),
        folder_id: folder_id.map(str::to_string),
        exercises,
    }
}

fn break_documents_table(root: &Path) {
    let conn = rusqlite::Connection::open(AppPaths::under(root).db_path)
        .expect("second connection should open");
    conn.execute_batch("DROP TABLE documents")
        .expect("table drop should succeed");
}

#[test]
fn moving_a_folder_under_its_child_is_a_cycle() {
    let root = unique_workspace();
    let clock = ManualClock::at(datetime!(2026-03-01 10:00 UTC));
    let mut app = open_app(&root, &clock);

    let legs = app
        .create_folder("Legs", None)
        .expect("root folder should create");
    let heavy = app
        .create_folder("Heavy", Some(&legs.id))
        .expect("child folder should create");

    let err = app
        .move_folder(&legs.id, Some(&heavy.id))
        .expect_err("cycle should be rejected");
    assert!(matches!(err, AppError::Cycle { .. }));
    assert!(app
        .folder(&legs.id)
        .expect("legs should exist")
        .parent_id
        .is_none());

    let path = app
        .folder_path(&heavy.id)
        .expect("path should resolve")
        .into_iter()
        .map(|folder| folder.name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(path, vec!["Legs", "Heavy"]);
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn folder_writes_are_validated() {
    let root = unique_workspace();
    let clock = ManualClock::at(datetime!(2026-03-01 10:00 UTC));
    let mut app = open_app(&root, &clock);

    assert!(matches!(
        app.create_folder("  ", None),
        Err(AppError::Validation(_))
    ));
    assert!(matches!(
        app.create_folder("Arms", Some("f-missing")),
        Err(AppError::NotFound { kind: "folder", .. })
    ));
    assert!(matches!(
        app.move_folder("f-missing", None),
        Err(AppError::NotFound { .. })
    ));

    let arms = app
        .create_folder("Arms", None)
        .expect("folder should create");
    let renamed = app
        .rename_folder(&arms.id, "Arms & Core")
        .expect("rename should succeed");
    assert_eq!(renamed.name, "Arms & Core");
    assert!(app.data().folders.iter().all(|folder| folder.name != "Arms"));
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn deleting_a_folder_reparents_children_and_leaves_routines_at_root() {
    let root = unique_workspace();
    let clock = ManualClock::at(datetime!(2026-03-01 10:00 UTC));
    let mut app = open_app(&root, &clock);

    let prep = app
        .create_folder("Prep", None)
        .expect("folder should create");
    let strength = app
        .create_folder("Strength", Some(&prep.id))
        .expect("folder should create");
    let heavy = app
        .create_folder("Heavy", Some(&strength.id))
        .expect("folder should create");
    let routine = app
        .create_routine(draft("5x5", Some(&strength.id), vec![exercise("Squat", 5)]))
        .expect("routine should create");

    app.delete_folder(&strength.id)
        .expect("delete should succeed");
    assert_eq!(
        app.folder(&heavy.id)
            .expect("heavy should remain")
            .parent_id
            .as_deref(),
        Some(prep.id.as_str())
    );

    let stored = app.routine(&routine.id).expect("routine should remain");
    assert_eq!(stored.folder_id.as_deref(), Some(strength.id.as_str()));
    assert!(app.routine_folder(stored).is_none());
    let root_ids = app
        .list_routines(RoutineFilter::Root)
        .into_iter()
        .map(|routine| routine.id.clone())
        .collect::<Vec<_>>();
    assert_eq!(root_ids, vec![routine.id.clone()]);
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn routine_crud_validates_and_keeps_creation_time() {
    let root = unique_workspace();
    let clock = ManualClock::at(datetime!(2026-03-01 10:00 UTC));
    let mut app = open_app(&root, &clock);

    assert!(matches!(
        app.create_routine(draft("", None, vec![exercise("Squat", 3)])),
        Err(AppError::Validation(_))
    ));
    assert!(matches!(
        app.create_routine(draft("Legs", None, Vec::new())),
        Err(AppError::Validation(_))
    ));
    assert!(app.data().routines.is_empty());

    let created = app
        .create_routine(draft("Legs", None, vec![exercise("Squat", 3)]))
        .expect("routine should create");
    assert!(created.id.starts_with("r-"));

    clock.advance(Duration::days(3));
    let exercises = vec![exercise("Front Squat", 4), exercise("Lunges", 3)];
    let updated = app
        .update_routine(&created.id, draft("Legs B", None, exercises))
        .expect("update should succeed");
    assert_eq!(updated.created_at, created.created_at);
    assert_eq!(updated.exercises.len(), 2);

    assert!(matches!(
        app.update_routine("r-missing", draft("X", None, vec![exercise("Squat", 1)])),
        Err(AppError::NotFound { kind: "routine", .. })
    ));

    app.delete_routine(&created.id)
        .expect("delete should succeed");
    assert!(app.routine(&created.id).is_none());
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn moving_a_routine_requires_an_existing_folder() {
    let root = unique_workspace();
    let clock = ManualClock::at(datetime!(2026-03-01 10:00 UTC));
    let mut app = open_app(&root, &clock);

    let folder = app
        .create_folder("Upper", None)
        .expect("folder should create");
    let routine = app
        .create_routine(draft("Push", None, vec![exercise("Bench Press", 4)]))
        .expect("routine should create");

    assert!(matches!(
        app.move_routine_to_folder(&routine.id, Some("f-missing")),
        Err(AppError::NotFound { kind: "folder", .. })
    ));
    let moved = app
        .move_routine_to_folder(&routine.id, Some(&folder.id))
        .expect("move should succeed");
    assert_eq!(moved.folder_id.as_deref(), Some(folder.id.as_str()));
    assert_eq!(
        app.list_routines(RoutineFilter::Folder(&folder.id)).len(),
        1
    );
    assert!(app.list_routines(RoutineFilter::Root).is_empty());

    let back = app
        .move_routine_to_folder(&routine.id, None)
        .expect("move to root should succeed");
    assert!(back.folder_id.is_none());
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn references_resolve_by_id_or_unique_name() {
    let root = unique_workspace();
    let clock = ManualClock::at(datetime!(2026-03-01 10:00 UTC));
    let mut app = open_app(&root, &clock);

    let push = app
        .create_routine(draft("Push", None, vec![exercise("Bench Press", 4)]))
        .expect("routine should create");
    assert_eq!(app.find_routine(&push.id).expect("by id").id, push.id);
    assert_eq!(app.find_routine("push").expect("by name").id, push.id);
    assert!(matches!(
        app.find_routine("pull"),
        Err(AppError::NotFound { .. })
    ));

    app.create_routine(draft("PUSH", None, vec![exercise("Dips", 3)]))
        .expect("routine should create");
    assert!(matches!(
        app.find_routine("Push"),
        Err(AppError::Validation(_))
    ));
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn starting_a_workout_presets_every_target_set() {
    let root = unique_workspace();
    let clock = ManualClock::at(datetime!(2026-03-01 10:00 UTC));
    let mut app = open_app(&root, &clock);

    let routine = app
        .create_routine(draft(
            "Upper",
            None,
            vec![
                exercise("Bench Press", 4),
                exercise("Barbell Row", 4),
                exercise("Overhead Press", 4),
            ],
        ))
        .expect("routine should create");
    let workout = app
        .start_workout(&routine.id)
        .expect("workout should start");

    assert_eq!(workout.exercises.len(), 3);
    for entry in &workout.exercises {
        assert_eq!(entry.sets.len(), 4);
        for set in &entry.sets {
            assert_eq!(set.weight, 60.0);
            assert_eq!(set.reps, 8);
            assert!(set.effort.is_none());
        }
    }
    assert_eq!(
        app.active_workout().map(|w| w.id.as_str()),
        Some(workout.id.as_str())
    );

    assert!(matches!(
        app.start_workout(&routine.id),
        Err(AppError::Validation(_))
    ));
    assert!(matches!(
        app.start_workout("r-missing"),
        Err(AppError::Validation(_)) | Err(AppError::NotFound { .. })
    ));
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn logging_sets_and_finishing_moves_the_session_into_history() {
    let root = unique_workspace();
    let clock = ManualClock::at(datetime!(2026-03-01 10:00 UTC));
    let mut app = open_app(&root, &clock);

    let routine = app
        .create_routine(draft("Push", None, vec![exercise("Bench Press", 2)]))
        .expect("routine should create");
    let workout = app
        .start_workout(&routine.id)
        .expect("workout should start");

    let set = app
        .record_set(&workout.id, 0, 0, SetUpdate::weight_from_input("82.5"))
        .expect("weight should record");
    assert_eq!(set.weight, 82.5);
    let set = app
        .record_set(&workout.id, 0, 0, SetUpdate::reps_from_input("abc"))
        .expect("reps should record");
    assert_eq!(set.reps, 0);
    app.record_set(&workout.id, 0, 1, SetUpdate::Effort(Some(Effort::Hard)))
        .expect("effort should record");

    assert!(matches!(
        app.record_set(&workout.id, 1, 0, SetUpdate::Reps(5)),
        Err(AppError::NotFound { kind: "exercise", .. })
    ));
    assert!(matches!(
        app.record_set(&workout.id, 0, 7, SetUpdate::Reps(5)),
        Err(AppError::NotFound { kind: "set", .. })
    ));
    assert!(matches!(
        app.record_set("w-other", 0, 0, SetUpdate::Reps(5)),
        Err(AppError::NotFound { .. })
    ));

    clock.advance(Duration::minutes(70));
    let (finished, summary) = app
        .finish_workout(&workout.id)
        .expect("finish should succeed");
    assert_eq!(summary.completed_sets, 1);
    assert_eq!(summary.total_sets, 2);
    assert!(app.active_workout().is_none());
    assert_eq!(app.list_workouts().len(), 1);
    assert_eq!(
        app.workout(&finished.id).map(|w| w.date),
        Some(workout.date)
    );

    let last = app
        .last_performance("Bench Press")
        .expect("rated final set should count");
    assert_eq!(last.effort, Effort::Hard);
    assert!(app.finish_workout(&workout.id).is_err());
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn active_workout_survives_reopen_and_can_be_discarded() {
    let root = unique_workspace();
    let clock = ManualClock::at(datetime!(2026-03-01 10:00 UTC));
    let workout_id = {
        let mut app = open_app(&root, &clock);
        let routine = app
            .create_routine(draft("Legs", None, vec![exercise("Squat", 3)]))
            .expect("routine should create");
        app.start_workout(&routine.id)
            .expect("workout should start")
            .id
    };

    let mut app = open_app(&root, &clock);
    assert_eq!(
        app.active_workout().map(|w| w.id.clone()),
        Some(workout_id.clone())
    );
    let discarded = app.discard_workout().expect("discard should succeed");
    assert_eq!(discarded.id, workout_id);
    assert!(app.data().workouts.is_empty());
    assert!(matches!(
        app.discard_workout(),
        Err(AppError::Validation(_))
    ));
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn editing_history_changes_date_and_sets_only() {
    let root = unique_workspace();
    let clock = ManualClock::at(datetime!(2026-03-01 10:00 UTC));
    let mut app = open_app(&root, &clock);

    let routine = app
        .create_routine(draft("Push", None, vec![exercise("Bench Press", 2)]))
        .expect("routine should create");
    let workout = app
        .start_workout(&routine.id)
        .expect("workout should start");
    app.finish_workout(&workout.id)
        .expect("finish should succeed");
    let renamed = draft("Push v2", None, vec![exercise("Dips", 1)]);
    app.update_routine(&routine.id, renamed)
        .expect("routine update should succeed");

    let new_date = datetime!(2026-02-27 18:30 UTC);
    let edited = app
        .edit_workout(
            &workout.id,
            Some(new_date),
            &[SetEdit {
                exercise_index: 0,
                set_index: 1,
                update: SetUpdate::Weight(200.0),
            }],
        )
        .expect("edit should succeed");
    assert_eq!(edited.date, new_date);
    assert_eq!(edited.exercises[0].sets[1].weight, 200.0);
    assert_eq!(edited.routine_name, "Push");
    assert_eq!(edited.exercises[0].exercise.name, "Bench Press");

    let rejected = app.edit_workout(
        &workout.id,
        Some(datetime!(2020-01-01 00:00 UTC)),
        &[SetEdit {
            exercise_index: 0,
            set_index: 9,
            update: SetUpdate::Reps(1),
        }],
    );
    assert!(rejected.is_err());
    assert_eq!(app.workout(&workout.id).map(|w| w.date), Some(new_date));
    assert!(matches!(
        app.edit_workout("w-missing", None, &[]),
        Err(AppError::NotFound { kind: "workout", .. })
    ));
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn failed_persistence_surfaces_an_error_and_keeps_memory_unchanged() {
    let root = unique_workspace();
    let clock = ManualClock::at(datetime!(2026-03-01 10:00 UTC));
    let mut app = open_app(&root, &clock);
    let legs = app
        .create_folder("Legs", None)
        .expect("folder should create");
    let before = app.data().clone();

    break_documents_table(&root);

    let err = app
        .create_folder("Heavy", Some(&legs.id))
        .expect_err("write should fail");
    assert!(matches!(err, AppError::Persistence(_)));
    assert_eq!(app.data(), &before);
    assert!(matches!(app.flush(), Err(AppError::Persistence(_))));
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn several_set_fields_land_in_one_save_or_not_at_all() {
    let root = unique_workspace();
    let clock = ManualClock::at(datetime!(2026-03-01 10:00 UTC));
    let mut app = open_app(&root, &clock);
    let routine = app
        .create_routine(draft("Pull", None, vec![exercise("Row", 2)]))
        .expect("routine should create");
    let workout = app
        .start_workout(&routine.id)
        .expect("workout should start");

    let set = app
        .record_set_fields(
            &workout.id,
            0,
            1,
            &[
                SetUpdate::Weight(70.0),
                SetUpdate::Reps(10),
                SetUpdate::Effort(Some(Effort::Easy)),
            ],
        )
        .expect("fields should record together");
    assert_eq!(set.weight, 70.0);
    assert_eq!(set.reps, 10);
    assert_eq!(set.effort, Some(Effort::Easy));

    let before = app.data().clone();
    break_documents_table(&root);
    let err = app
        .record_set_fields(
            &workout.id,
            0,
            0,
            &[
                SetUpdate::Weight(90.0),
                SetUpdate::Effort(Some(Effort::Failure)),
            ],
        )
        .expect_err("write should fail");
    assert!(matches!(err, AppError::Persistence(_)));
    assert_eq!(app.data(), &before);
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn settings_and_custom_exercises_persist() {
    let root = unique_workspace();
    let clock = ManualClock::at(datetime!(2026-03-01 10:00 UTC));
    {
        let mut app = open_app(&root, &clock);
        assert!(matches!(
            app.update_settings(&SettingsPatch::default()),
            Err(AppError::Validation(_))
        ));
        let settings = app
            .update_settings(&SettingsPatch {
                theme: Some(Theme::Dark),
                rest_timer_seconds: Some(90),
                ..SettingsPatch::default()
            })
            .expect("settings should update");
        assert_eq!(settings.rest_timer_seconds, 90);

        app.add_custom_exercise("Hip Thrust", "Legs", None)
            .expect("custom exercise should add");
        assert!(app.add_custom_exercise("", "Legs", None).is_err());
    }

    let app = open_app(&root, &clock);
    assert_eq!(app.settings().theme, Theme::Dark);
    assert!(app.settings().auto_backup_enabled);
    let legs = app.exercises(Some("Legs"));
    assert!(legs.iter().any(|entry| entry.name == "Hip Thrust" && entry.custom));
    assert!(legs.iter().any(|entry| entry.name == "Squat" && !entry.custom));
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn sample_seeding_fills_an_empty_store_once() {
    let root = unique_workspace();
    let clock = ManualClock::at(datetime!(2026-03-10 12:00 UTC));
    let mut app = open_app(&root, &clock);

    assert!(app.seed_sample().expect("seed should succeed"));
    assert!(!app.seed_sample().expect("second seed should be a no-op"));
    let board = app.dashboard();
    assert_eq!(board.total_routines, 3);
    assert_eq!(board.total_workouts, 1);
    assert_eq!(board.days_since_last_workout, Some(2));
    assert_eq!(app.list_children(None).len(), 3);
    let _ = std::fs::remove_dir_all(root);
}
