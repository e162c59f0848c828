use time::{Duration, OffsetDateTime};

use crate::domain::folder::Folder;
use crate::domain::routine::{ExerciseSpec, Routine};
use crate::domain::workout::{Effort, SetEntry, Workout, WorkoutExercise};
use crate::ids::{generate_id, FOLDER_PREFIX, ROUTINE_PREFIX, WORKOUT_PREFIX};
use crate::store::StoreData;

/// Seeds a starter folder tree, three routines and one past workout. Does
/// nothing when the store already has routines.
pub fn seed(data: &mut StoreData, now: OffsetDateTime) -> bool {
    if !data.routines.is_empty() {
        return false;
    }

    let prep = add_folder(data, "Competition Prep", None, now);
    let strength = add_folder(data, "Strength Phase", Some(&prep), now);
    let hypertrophy = add_folder(data, "Hypertrophy Phase", Some(&prep), now);
    add_folder(data, "Cutting Phase", Some(&prep), now);
    let maintenance = add_folder(data, "Maintenance", None, now);
    let basics = add_folder(data, "Basic Routines", Some(&maintenance), now);
    add_folder(data, "Rehab", None, now);

    let push = add_routine(
        data,
        "Push A - Chest and Shoulders",
        &hypertrophy,
        vec![
            spec("Bench Press", "Barbell", 4, 8, 85.0, "Retract shoulders"),
            spec("Dumbbell Press", "Dumbbells", 3, 10, 35.0, "Full range"),
            spec("Lateral Raises", "Dumbbells", 3, 15, 15.0, "2-1-2 tempo"),
        ],
        now,
    );
    add_routine(
        data,
        "Strength 5x5",
        &strength,
        vec![spec("Squat", "Barbell", 5, 5, 120.0, "Max strength")],
        now,
    );
    add_routine(
        data,
        "Full Body A",
        &basics,
        vec![spec("Squat", "Barbell", 3, 12, 80.0, "General maintenance")],
        now,
    );

    let bench = push.exercises[0].clone();
    let workout_id = generate_id(WORKOUT_PREFIX, |candidate| {
        data.workouts.iter().any(|workout| workout.id == candidate)
    });
    data.workouts.push(Workout {
        id: workout_id,
        routine_id: push.id.clone(),
        routine_name: push.name.clone(),
        date: now - Duration::days(2),
        exercises: vec![WorkoutExercise {
            exercise: (&bench).into(),
            sets: vec![
                set(80.0, 8, Effort::Easy),
                set(85.0, 8, Effort::Hard),
                set(85.0, 7, Effort::Failure),
                set(80.0, 8, Effort::Hard),
            ],
        }],
    });

    data.backup.last_auto_backup = Some(now);
    true
}

fn add_folder(
    data: &mut StoreData,
    name: &str,
    parent: Option<&str>,
    now: OffsetDateTime,
) -> String {
    let id = generate_id(FOLDER_PREFIX, |candidate| {
        data.folders.iter().any(|folder| folder.id == candidate)
    });
    data.folders.push(Folder {
        id: id.clone(),
        name: name.to_string(),
        parent_id: parent.map(str::to_string),
        created_at: now,
    });
    id
}

fn add_routine(
    data: &mut StoreData,
    name: &str,
    folder_id: &str,
    exercises: Vec<ExerciseSpec>,
    now: OffsetDateTime,
) -> Routine {
    let id = generate_id(ROUTINE_PREFIX, |candidate| {
        data.routines.iter().any(|routine| routine.id == candidate)
    });
    let routine = Routine {
        id,
        name: name.to_string(),
        folder_id: Some(folder_id.to_string()),
        exercises,
        created_at: now,
    };
    data.routines.push(routine.clone());
    routine
}

fn spec(
    name: &str,
    equipment: &str,
    sets: u32,
    reps: u32,
    weight: f64,
    notes: &str,
) -> ExerciseSpec {
    ExerciseSpec {
        name: name.to_string(),
        equipment: equipment.to_string(),
        target_sets: sets,
        target_reps: reps,
        target_weight: weight,
        notes: notes.to_string(),
    }
}

fn set(weight: f64, reps: u32, effort: Effort) -> SetEntry {
    SetEntry {
        weight,
        reps,
        effort: Some(effort),
    }
}
