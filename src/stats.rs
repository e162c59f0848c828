use serde::Serialize;
use time::OffsetDateTime;

use crate::clock::whole_days_between;
use crate::domain::workout::{Effort, Workout};

pub const MIN_WORKOUTS_FOR_AVERAGE: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub total_workouts: usize,
    pub total_routines: usize,
    pub days_since_last_workout: Option<i64>,
    pub weekly_average: Option<f64>,
}

pub fn dashboard(workouts: &[Workout], total_routines: usize, now: OffsetDateTime) -> Dashboard {
    let days_since_last_workout = workouts
        .iter()
        .map(|workout| workout.date)
        .max()
        .map(|last| whole_days_between(last, now).max(0));
    Dashboard {
        total_workouts: workouts.len(),
        total_routines,
        days_since_last_workout,
        weekly_average: weekly_average(workouts, now),
    }
}

/// Workouts per week since the first one, counting any started week as a
/// whole one. `None` until there are enough workouts to be meaningful.
pub fn weekly_average(workouts: &[Workout], now: OffsetDateTime) -> Option<f64> {
    if workouts.len() < MIN_WORKOUTS_FOR_AVERAGE {
        return None;
    }
    let first = workouts.iter().map(|workout| workout.date).min()?;
    let elapsed_weeks = (now - first).as_seconds_f64() / (7.0 * 24.0 * 3600.0);
    let weeks = elapsed_weeks.ceil().max(1.0);
    Some(workouts.len() as f64 / weeks)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionTier {
    Perfect,
    Excellent,
    Good,
    KeepGoing,
}

impl CompletionTier {
    pub fn for_ratio(completed: usize, total: usize) -> Self {
        if total == 0 {
            return CompletionTier::KeepGoing;
        }
        let percentage = completed as f64 * 100.0 / total as f64;
        if completed >= total {
            CompletionTier::Perfect
        } else if percentage >= 80.0 {
            CompletionTier::Excellent
        } else if percentage >= 60.0 {
            CompletionTier::Good
        } else {
            CompletionTier::KeepGoing
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            CompletionTier::Perfect => "Perfect! Every set logged.",
            CompletionTier::Excellent => "Excellent work, almost everything done.",
            CompletionTier::Good => "Good effort, keep it up next time.",
            CompletionTier::KeepGoing => "Every rep counts. Next one will be better.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkoutSummary {
    pub completed_sets: usize,
    pub total_sets: usize,
    pub total_volume: f64,
    pub tier: CompletionTier,
}

pub fn workout_summary(workout: &Workout) -> WorkoutSummary {
    let sets = workout
        .exercises
        .iter()
        .flat_map(|exercise| exercise.sets.iter());
    let (completed_sets, total_sets, total_volume) =
        sets.fold((0, 0, 0.0), |(completed, total, volume), set| {
            (
                completed + usize::from(set.is_rated()),
                total + 1,
                volume + set.volume(),
            )
        });
    WorkoutSummary {
        completed_sets,
        total_sets,
        total_volume,
        tier: CompletionTier::for_ratio(completed_sets, total_sets),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LastPerformance {
    pub weight: f64,
    pub effort: Effort,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
}

/// Weight and effort of the final set the last time `exercise_name` was
/// trained with that set rated.
pub fn last_performance(workouts: &[Workout], exercise_name: &str) -> Option<LastPerformance> {
    let mut ordered = workouts.iter().collect::<Vec<_>>();
    ordered.sort_by(|a, b| b.date.cmp(&a.date));
    ordered.into_iter().find_map(|workout| {
        workout
            .exercises
            .iter()
            .filter(|entry| entry.exercise.name == exercise_name)
            .find_map(|entry| {
                let last = entry.sets.last()?;
                last.effort.map(|effort| LastPerformance {
                    weight: last.weight,
                    effort,
                    date: workout.date,
                })
            })
    })
}
