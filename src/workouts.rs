use std::error::Error;
use std::fmt;

use time::OffsetDateTime;

use crate::domain::routine::Routine;
use crate::domain::workout::{ExerciseSnapshot, SetEntry, SetUpdate, Workout, WorkoutExercise};

/// One change to a logged set, addressed by zero-based indexes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetEdit {
    pub exercise_index: usize,
    pub set_index: usize,
    pub update: SetUpdate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetLookupError {
    Exercise { index: usize, count: usize },
    Set {
        exercise_index: usize,
        index: usize,
        count: usize,
    },
}

impl fmt::Display for SetLookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetLookupError::Exercise { index, count } => write!(
                f,
                "exercise #{} does not exist (workout has {})",
                index + 1,
                count
            ),
            SetLookupError::Set {
                exercise_index,
                index,
                count,
            } => write!(
                f,
                "set #{} of exercise #{} does not exist (exercise has {})",
                index + 1,
                exercise_index + 1,
                count
            ),
        }
    }
}

impl Error for SetLookupError {}

/// Freezes the routine's exercises into a new workout with every set preset
/// to the routine targets and no effort rating.
pub fn snapshot_routine(routine: &Routine, id: String, date: OffsetDateTime) -> Workout {
    let exercises = routine
        .exercises
        .iter()
        .map(|spec| WorkoutExercise {
            exercise: ExerciseSnapshot::from(spec),
            sets: (0..spec.target_sets)
                .map(|_| SetEntry {
                    weight: spec.target_weight,
                    reps: spec.target_reps,
                    effort: None,
                })
                .collect(),
        })
        .collect();
    Workout {
        id,
        routine_id: routine.id.clone(),
        routine_name: routine.name.clone(),
        date,
        exercises,
    }
}

pub fn apply_set_edit(workout: &mut Workout, edit: SetEdit) -> Result<(), SetLookupError> {
    let count = workout.exercises.len();
    let exercise = workout
        .exercises
        .get_mut(edit.exercise_index)
        .ok_or(SetLookupError::Exercise {
            index: edit.exercise_index,
            count,
        })?;
    let set_count = exercise.sets.len();
    let set = exercise
        .sets
        .get_mut(edit.set_index)
        .ok_or(SetLookupError::Set {
            exercise_index: edit.exercise_index,
            index: edit.set_index,
            count: set_count,
        })?;
    set.apply(edit.update);
    Ok(())
}

/// Applies every edit or none of them.
pub fn apply_set_edits(workout: &mut Workout, edits: &[SetEdit]) -> Result<(), SetLookupError> {
    let mut staged = workout.clone();
    for edit in edits {
        apply_set_edit(&mut staged, *edit)?;
    }
    *workout = staged;
    Ok(())
}
