use time::OffsetDateTime;

use super::{App, AppError};
use crate::domain::workout::{SetEntry, SetUpdate, Workout};
use crate::domain::ValidationError;
use crate::ids::{generate_id, WORKOUT_PREFIX};
use crate::stats::{self, Dashboard, LastPerformance, WorkoutSummary};
use crate::store::DocumentKey;
use crate::workouts::{apply_set_edits, snapshot_routine, SetEdit};

impl App {
    /// Snapshots the routine into a new active workout. Only one session may
    /// be in progress.
    pub fn start_workout(&mut self, routine_id: &str) -> Result<Workout, AppError> {
        let date = self.now();
        let workout = self.store.mutate(&[DocumentKey::ActiveWorkout], |data| {
            if let Some(active) = &data.active_workout {
                let message = format!(
                    "workout '{}' from '{}' is still in progress; finish or discard it first",
                    active.id, active.routine_name
                );
                return Err(AppError::from(ValidationError::new(message)));
            }
            let routine = data
                .routines
                .iter()
                .find(|routine| routine.id == routine_id)
                .ok_or_else(|| AppError::not_found("routine", routine_id))?;
            let id = generate_id(WORKOUT_PREFIX, |candidate| {
                data.workouts.iter().any(|workout| workout.id == candidate)
            });
            let workout = snapshot_routine(routine, id, date);
            data.active_workout = Some(workout.clone());
            Ok(workout)
        })?;
        log::info!(
            "started workout {} from routine '{}'",
            workout.id,
            workout.routine_name
        );
        Ok(workout)
    }

    pub fn active_workout(&self) -> Option<&Workout> {
        self.data().active_workout.as_ref()
    }

    pub fn record_set(
        &mut self,
        workout_id: &str,
        exercise_index: usize,
        set_index: usize,
        update: SetUpdate,
    ) -> Result<SetEntry, AppError> {
        self.record_set_fields(workout_id, exercise_index, set_index, &[update])
    }

    /// Applies several field changes to one set in a single save; either all
    /// of them land or none do.
    pub fn record_set_fields(
        &mut self,
        workout_id: &str,
        exercise_index: usize,
        set_index: usize,
        updates: &[SetUpdate],
    ) -> Result<SetEntry, AppError> {
        let edits = updates
            .iter()
            .map(|&update| SetEdit {
                exercise_index,
                set_index,
                update,
            })
            .collect::<Vec<_>>();
        self.store.mutate(&[DocumentKey::ActiveWorkout], |data| {
            let workout = data
                .active_workout
                .as_mut()
                .filter(|workout| workout.id == workout_id)
                .ok_or_else(|| AppError::not_found("active workout", workout_id))?;
            apply_set_edits(workout, &edits)?;
            workout
                .exercises
                .get(exercise_index)
                .and_then(|exercise| exercise.sets.get(set_index))
                .copied()
                .ok_or_else(|| {
                    AppError::not_found("set", format!("{}:{}", exercise_index + 1, set_index + 1))
                })
        })
    }

    /// Moves the active workout into history. There is no undo.
    pub fn finish_workout(
        &mut self,
        workout_id: &str,
    ) -> Result<(Workout, WorkoutSummary), AppError> {
        let workout = self.store.mutate(
            &[DocumentKey::ActiveWorkout, DocumentKey::Workouts],
            |data| {
                match &data.active_workout {
                    Some(active) if active.id == workout_id => {}
                    _ => return Err(AppError::not_found("active workout", workout_id)),
                }
                let workout = data
                    .active_workout
                    .take()
                    .ok_or_else(|| AppError::not_found("active workout", workout_id))?;
                data.workouts.push(workout.clone());
                Ok(workout)
            },
        )?;
        let summary = stats::workout_summary(&workout);
        log::info!(
            "finished workout {}: {}/{} sets rated",
            workout.id,
            summary.completed_sets,
            summary.total_sets
        );
        Ok((workout, summary))
    }

    /// Drops the active session without recording it.
    pub fn discard_workout(&mut self) -> Result<Workout, AppError> {
        self.store.mutate(&[DocumentKey::ActiveWorkout], |data| {
            data.active_workout
                .take()
                .ok_or_else(|| AppError::Validation(ValidationError::new("no workout in progress")))
        })
    }

    /// Changes the date and set values of a recorded workout. Routine
    /// reference and name never change, and nothing is checked against the
    /// routine's targets.
    pub fn edit_workout(
        &mut self,
        id: &str,
        new_date: Option<OffsetDateTime>,
        edits: &[SetEdit],
    ) -> Result<Workout, AppError> {
        self.store.mutate(&[DocumentKey::Workouts], |data| {
            let workout = data
                .workouts
                .iter_mut()
                .find(|workout| workout.id == id)
                .ok_or_else(|| AppError::not_found("workout", id))?;
            apply_set_edits(workout, edits)?;
            if let Some(date) = new_date {
                workout.date = date;
            }
            Ok(workout.clone())
        })
    }

    pub fn workout(&self, id: &str) -> Option<&Workout> {
        self.data().workouts.iter().find(|workout| workout.id == id)
    }

    /// History, newest first.
    pub fn list_workouts(&self) -> Vec<&Workout> {
        let mut workouts = self.data().workouts.iter().collect::<Vec<_>>();
        workouts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));
        workouts
    }

    pub fn last_performance(&self, exercise_name: &str) -> Option<LastPerformance> {
        stats::last_performance(&self.data().workouts, exercise_name)
    }

    pub fn dashboard(&self) -> Dashboard {
        let data = self.data();
        stats::dashboard(&data.workouts, data.routines.len(), self.now())
    }
}
