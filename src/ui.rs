use std::io::{self, IsTerminal};

use crate::backup::{BackupIndicator, BackupStatus};
use crate::clock::format_rfc3339;
use crate::domain::backup::{BackupKind, BackupVersion};
use crate::domain::exercise::ExerciseEntry;
use crate::domain::folder::Folder;
use crate::domain::routine::Routine;
use crate::domain::settings::Settings;
use crate::domain::workout::{Effort, SetEntry, Workout};
use crate::folders::TreeRow;
use crate::stats::{Dashboard, LastPerformance, WorkoutSummary};

pub fn print_folder_tree(rows: &[TreeRow<'_>]) {
    let palette = Palette::auto();
    println!("{}", palette.heading("Folders"));
    if rows.is_empty() {
        println!("{}", palette.dim("no folders yet"));
        return;
    }
    for row in rows {
        println!(
            "{}{} {}",
            indentation_prefix(row.depth, &palette),
            palette.id(&row.folder.id),
            row.folder.name
        );
    }
}

/// One level of the tree; `parent` of `None` means the top level.
pub fn print_folder_children(parent: Option<&Folder>, children: &[&Folder]) {
    let palette = Palette::auto();
    let heading = match parent {
        Some(folder) => folder.name.as_str(),
        None => "Top-level folders",
    };
    println!("{}", palette.heading(heading));
    if children.is_empty() {
        println!("{}", palette.dim("no subfolders"));
        return;
    }
    for folder in children {
        println!("{} {}", palette.id(&folder.id), folder.name);
    }
}

/// `folder_label` is the display path of the routine's folder, if it still
/// resolves.
pub fn print_routine_list(routines: &[(&Routine, Option<String>)]) {
    let palette = Palette::auto();
    println!("{}", palette.heading("Routines"));
    if routines.is_empty() {
        println!("{}", palette.dim("no routines matched"));
        return;
    }
    for (routine, folder_label) in routines {
        let mut line = format!(
            "{} {} {}",
            palette.id(&routine.id),
            routine.name,
            palette.dim(&format!("({} exercises)", routine.exercises.len()))
        );
        if let Some(label) = folder_label {
            line.push(' ');
            line.push_str(&palette.folder(label));
        }
        println!("{line}");
    }
    println!("{}", palette.dim(&format!("{} routine(s)", routines.len())));
}

pub fn print_routine(routine: &Routine, folder_label: Option<&str>) {
    let palette = Palette::auto();
    println!(
        "{} {}",
        palette.id(&routine.id),
        palette.heading(&routine.name)
    );
    println!(
        "{}",
        palette.dim(&format!("folder: {}", folder_label.unwrap_or("(root)")))
    );
    for (index, spec) in routine.exercises.iter().enumerate() {
        let mut line = format!(
            "{:>2}. {} {}x{} @ {}",
            index + 1,
            spec.name,
            spec.target_sets,
            spec.target_reps,
            format_weight(spec.target_weight)
        );
        if !spec.equipment.is_empty() {
            line.push_str(&format!(" [{}]", spec.equipment));
        }
        println!("{line}");
        if !spec.notes.is_empty() {
            println!("    {}", palette.dim(&spec.notes));
        }
    }
}

pub fn print_workout(workout: &Workout) {
    let palette = Palette::auto();
    println!(
        "{} {} {}",
        palette.id(&workout.id),
        palette.heading(&workout.routine_name),
        palette.dim(&format_rfc3339(workout.date))
    );
    for (index, entry) in workout.exercises.iter().enumerate() {
        println!("{:>2}. {}", index + 1, entry.exercise.name);
        for (set_index, set) in entry.sets.iter().enumerate() {
            println!("    {}", format_set(set_index, set, &palette));
        }
    }
}

fn format_set(index: usize, set: &SetEntry, palette: &Palette) -> String {
    format!(
        "set {}: {} x {} {}",
        index + 1,
        format_weight(set.weight),
        set.reps,
        palette.effort(set.effort)
    )
}

pub fn print_workout_summary(workout: &Workout, summary: &WorkoutSummary) {
    let palette = Palette::auto();
    println!(
        "finished {} {}",
        palette.id(&workout.id),
        workout.routine_name
    );
    println!(
        "{}/{} sets rated, volume {}",
        summary.completed_sets,
        summary.total_sets,
        format_weight(summary.total_volume)
    );
    println!("{}", palette.heading(summary.tier.message()));
}

pub fn print_history(workouts: &[&Workout]) {
    let palette = Palette::auto();
    println!("{}", palette.heading("History"));
    if workouts.is_empty() {
        println!("{}", palette.dim("no workouts yet"));
        return;
    }
    for workout in workouts {
        let sets = workout
            .exercises
            .iter()
            .map(|entry| entry.sets.len())
            .sum::<usize>();
        println!(
            "{} {} {} {}",
            palette.id(&workout.id),
            palette.dim(&format_rfc3339(workout.date)),
            workout.routine_name,
            palette.dim(&format!("({} sets)", sets))
        );
    }
}

pub fn print_backup_versions(versions: &[BackupVersion]) {
    let palette = Palette::auto();
    println!("{}", palette.heading("Backups"));
    if versions.is_empty() {
        println!("{}", palette.dim("no backups yet"));
        return;
    }
    for version in versions.iter().rev() {
        let kind = match version.kind {
            BackupKind::Manual => palette.paint("32", "[MANUAL]"),
            BackupKind::Auto => palette.paint("36", "[AUTO]"),
        };
        println!(
            "{} {} {}",
            kind,
            palette.dim(&format_rfc3339(version.timestamp)),
            version.storage_key
        );
    }
}

pub fn print_backup_status(status: &BackupStatus) {
    let palette = Palette::auto();
    let badge = match status.indicator {
        BackupIndicator::Ok => palette.paint("32", status.indicator.label()),
        BackupIndicator::Pending => palette.paint("33", status.indicator.label()),
        BackupIndicator::Missing => palette.paint("31", status.indicator.label()),
    };
    println!("{}", badge);
    println!(
        "last manual: {}",
        status
            .last_manual_backup
            .map_or_else(|| "never".to_string(), format_rfc3339)
    );
    println!(
        "last auto:   {}",
        status
            .last_auto_backup
            .map_or_else(|| "never".to_string(), format_rfc3339)
    );
    println!(
        "versions: {} manual, {} auto",
        status.manual_versions, status.auto_versions
    );
    if status.reminder_due {
        let reminder = "reminder: take a manual backup (gymlog backup manual)";
        println!("{}", palette.paint("33", reminder));
    }
}

pub fn print_dashboard(board: &Dashboard) {
    let palette = Palette::auto();
    println!("{}", palette.heading("Dashboard"));
    println!("workouts: {}", board.total_workouts);
    println!("routines: {}", board.total_routines);
    match board.days_since_last_workout {
        Some(days) => println!("days since last workout: {}", days),
        None => println!("days since last workout: {}", palette.dim("none yet")),
    }
    if let Some(average) = board.weekly_average {
        println!("weekly average: {:.1}", average);
    }
}

pub fn print_last_performance(exercise: &str, last: Option<&LastPerformance>) {
    let palette = Palette::auto();
    match last {
        Some(last) => println!(
            "{}: {} {} on {}",
            exercise,
            format_weight(last.weight),
            palette.effort(Some(last.effort)),
            format_rfc3339(last.date)
        ),
        None => println!("{}: {}", exercise, palette.dim("no rated sets yet")),
    }
}

pub fn print_exercises(entries: &[ExerciseEntry]) {
    let palette = Palette::auto();
    println!("{}", palette.heading("Exercises"));
    if entries.is_empty() {
        println!("{}", palette.dim("no exercises matched"));
        return;
    }
    for entry in entries {
        let mut line = format!(
            "{} {} {}",
            entry.name,
            palette.folder(&entry.primary_muscle),
            palette.dim(&entry.description)
        );
        if entry.custom {
            line.push(' ');
            line.push_str(&palette.paint("35", "(custom)"));
        }
        println!("{line}");
    }
}

pub fn print_library_groups(muscles: &[String], equipment: &[String]) {
    let palette = Palette::auto();
    println!("{}", palette.heading("Muscle groups"));
    for muscle in muscles {
        println!("  {muscle}");
    }
    println!("{}", palette.heading("Equipment"));
    for item in equipment {
        println!("  {item}");
    }
}

pub fn print_settings(settings: &Settings) {
    println!("theme: {}", settings.theme.as_str());
    println!("rest timer: {}s", settings.rest_timer_seconds);
    println!("auto backup: {}", on_off(settings.auto_backup_enabled));
    println!(
        "backup reminders: {}",
        on_off(settings.backup_reminders_enabled)
    );
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

fn format_weight(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}kg", value)
    } else {
        format!("{}kg", value)
    }
}

fn indentation_prefix(depth: usize, palette: &Palette) -> String {
    if depth == 0 {
        return String::new();
    }
    let spaces = "  ".repeat(depth.saturating_sub(1));
    palette.dim(&format!("{spaces}↳ "))
}

pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn auto() -> Self {
        let enabled = std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal();
        Self { enabled }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    pub fn heading(&self, text: &str) -> String {
        self.paint("1;36", text)
    }

    pub fn dim(&self, text: &str) -> String {
        self.paint("2", text)
    }

    pub fn id(&self, text: &str) -> String {
        self.paint("1;94", text)
    }

    fn folder(&self, text: &str) -> String {
        self.paint("90", &format!("<{text}>"))
    }

    fn effort(&self, effort: Option<Effort>) -> String {
        match effort {
            Some(effort) => {
                let upper = effort.as_str().to_ascii_uppercase();
                self.paint(effort_color_code(effort), &format!("[{upper}]"))
            }
            None => self.dim("[-]"),
        }
    }
}

fn effort_color_code(effort: Effort) -> &'static str {
    match effort {
        Effort::Easy => "32",
        Effort::Hard => "33",
        Effort::Failure => "31",
    }
}
