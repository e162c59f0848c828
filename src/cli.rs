use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use crate::completions::NameKind;
use crate::domain::routine::ExerciseSpec;
use crate::domain::workout::SetUpdate;
use crate::workouts::SetEdit;

fn cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::BrightCyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::BrightYellow.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightGreen.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::BrightMagenta.on_default())
}

pub fn styled_command() -> clap::Command {
    Cli::command()
}

#[derive(Debug, Parser)]
#[command(name = "gymlog")]
#[command(bin_name = "gymlog")]
#[command(version)]
#[command(about = "A local-first gym log: routines, workouts, folders and backups")]
#[command(styles = cli_styles())]
pub struct Cli {
    #[arg(
        short = 'C',
        long,
        env = "GYMLOG_DATA_DIR",
        default_value = ".",
        help = "Directory that contains .gymlog/."
    )]
    pub data_dir: PathBuf,

    #[arg(
        short = 'd',
        long,
        env = "GYMLOG_DB_PATH",
        help = "Path to the primary SQLite store (defaults to .gymlog/state.sqlite)."
    )]
    pub db: Option<String>,

    #[arg(
        long = "backup-db",
        env = "GYMLOG_BACKUP_DB_PATH",
        help = "Path to the backup SQLite store (defaults to .gymlog/backups.sqlite)."
    )]
    pub backup_db: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Debug logs on stderr.")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Create the local store, optionally with sample data.")]
    Init(InitArgs),
    #[command(about = "Manage the folder tree.")]
    Folder(FolderArgs),
    #[command(about = "Manage routines.")]
    Routine(RoutineArgs),
    #[command(about = "Run the workout in progress.")]
    Workout(WorkoutArgs),
    #[command(about = "Browse finished workouts.")]
    History(HistoryArgs),
    #[command(about = "Create, inspect, restore, export and import backups.")]
    Backup(BackupArgs),
    #[command(about = "Browse the exercise library.")]
    Exercise(ExerciseArgs),
    #[command(about = "Show or change settings.")]
    Settings(SettingsArgs),
    #[command(about = "Show the dashboard and per-exercise performance.")]
    Stats(StatsArgs),
    #[command(about = "Run autosave and automatic backup checks on a timer.")]
    Watch(WatchArgs),
    #[command(about = "Generate or install shell completions.")]
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct InitArgs {
    #[arg(
        short = 's',
        long,
        help = "Seed sample folders, routines and a past workout."
    )]
    pub sample: bool,
}

#[derive(Debug, Args)]
#[command(about = "Generate or install shell completions.")]
pub struct CompletionsArgs {
    #[arg(help = "Shell to generate for. Detected from $SHELL if omitted.")]
    pub shell: Option<Shell>,

    #[arg(
        short = 'i',
        long = "install",
        help = "Write the script where the shell loads completions from."
    )]
    pub install: bool,

    #[arg(
        long,
        value_enum,
        hide = true,
        conflicts_with_all = ["shell", "install"],
        help = "Print folder, routine or backup names for the completion scripts."
    )]
    pub names: Option<NameKind>,
}

#[derive(Debug, Args)]
pub struct FolderArgs {
    #[command(subcommand)]
    pub command: FolderSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum FolderSubcommands {
    #[command(about = "Create a folder.")]
    New(FolderNewArgs),
    #[command(about = "Show the folder tree, or one level of it.", alias = "list")]
    Ls(FolderListArgs),
    #[command(about = "Move a folder under another folder or to the root.")]
    Mv(FolderMoveArgs),
    #[command(about = "Rename a folder.")]
    Rename(FolderRenameArgs),
    #[command(about = "Delete a folder; its subfolders move up one level.")]
    Rm(RefArgs),
    #[command(about = "Print the path from the root to a folder.")]
    Path(RefJsonArgs),
}

#[derive(Debug, Args)]
pub struct FolderNewArgs {
    #[arg(help = "Folder name.")]
    pub name: String,

    #[arg(short = 'p', long, help = "Parent folder id or name.")]
    pub parent: Option<String>,
}

#[derive(Debug, Args)]
pub struct FolderListArgs {
    #[arg(short = 'p', long, help = "Only direct subfolders of this folder.")]
    pub parent: Option<String>,

    #[arg(
        short = 'r',
        long,
        conflicts_with = "parent",
        help = "Only top-level folders."
    )]
    pub root: bool,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct FolderMoveArgs {
    #[arg(help = "Folder id or name.")]
    pub folder: String,

    #[arg(
        short = 't',
        long,
        help = "Target parent folder; omit to move to the root."
    )]
    pub to: Option<String>,
}

#[derive(Debug, Args)]
pub struct FolderRenameArgs {
    #[arg(help = "Folder id or name.")]
    pub folder: String,

    #[arg(help = "New name.")]
    pub name: String,
}

#[derive(Debug, Args)]
pub struct RefArgs {
    #[arg(help = "Id or exact name.")]
    pub reference: String,
}

#[derive(Debug, Args)]
pub struct RefJsonArgs {
    #[arg(help = "Id or exact name.")]
    pub reference: String,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct JsonArgs {
    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct RoutineArgs {
    #[command(subcommand)]
    pub command: RoutineSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum RoutineSubcommands {
    #[command(about = "Create a routine.")]
    New(RoutineNewArgs),
    #[command(about = "Change a routine's name or exercises.")]
    Edit(RoutineEditArgs),
    #[command(about = "List routines.", alias = "list")]
    Ls(RoutineListArgs),
    #[command(about = "Show one routine.")]
    Show(RefJsonArgs),
    #[command(about = "Delete a routine; past workouts are kept.")]
    Rm(RefArgs),
    #[command(about = "File a routine into a folder or back to the root.")]
    Mv(RoutineMoveArgs),
    #[command(about = "Export one routine as a JSON document.")]
    Export(RoutineExportArgs),
}

#[derive(Debug, Args)]
pub struct RoutineNewArgs {
    #[arg(help = "Routine name.")]
    pub name: String,

    #[arg(short = 'f', long, help = "Folder id or name.")]
    pub folder: Option<String>,

    #[arg(
        short = 'e',
        long = "exercise",
        required = true,
        value_parser = parse_exercise_spec,
        help = "Exercise as NAME:SETSxREPS[@WEIGHT] (repeatable)."
    )]
    pub exercises: Vec<ExerciseSpec>,
}

#[derive(Debug, Args)]
pub struct RoutineEditArgs {
    #[arg(help = "Routine id or name.")]
    pub routine: String,

    #[arg(short = 'n', long, help = "New name.")]
    pub name: Option<String>,

    #[arg(
        short = 'e',
        long = "exercise",
        value_parser = parse_exercise_spec,
        help = "Replace exercises with NAME:SETSxREPS[@WEIGHT] (repeatable)."
    )]
    pub exercises: Vec<ExerciseSpec>,
}

#[derive(Debug, Args)]
pub struct RoutineListArgs {
    #[arg(short = 'f', long, help = "Only routines in this folder.")]
    pub folder: Option<String>,

    #[arg(
        short = 'r',
        long,
        conflicts_with = "folder",
        help = "Only routines without a folder."
    )]
    pub root: bool,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct RoutineMoveArgs {
    #[arg(help = "Routine id or name.")]
    pub routine: String,

    #[arg(short = 't', long, help = "Target folder; omit to move to the root.")]
    pub to: Option<String>,
}

#[derive(Debug, Args)]
pub struct RoutineExportArgs {
    #[arg(help = "Routine id or name.")]
    pub routine: String,

    #[arg(short = 'o', long, help = "Write to this file instead of stdout.")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct WorkoutArgs {
    #[command(subcommand)]
    pub command: WorkoutSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum WorkoutSubcommands {
    #[command(about = "Start a workout from a routine.")]
    Start(RefArgs),
    #[command(about = "Log weight, reps or effort for one set of the active workout.")]
    Set(WorkoutSetArgs),
    #[command(about = "Show the active workout.")]
    Show(JsonArgs),
    #[command(about = "Finish the active workout and move it into history.")]
    Finish(JsonArgs),
    #[command(about = "Throw away the active workout.")]
    Discard,
    #[command(about = "Change the date or set values of a finished workout.")]
    Edit(WorkoutEditArgs),
}

#[derive(Debug, Args)]
pub struct WorkoutSetArgs {
    #[arg(help = "Exercise number, starting at 1.")]
    pub exercise: usize,

    #[arg(help = "Set number, starting at 1.")]
    pub set: usize,

    #[arg(short = 'w', long, help = "Weight; unparsable input counts as 0.")]
    pub weight: Option<String>,

    #[arg(short = 'r', long, help = "Reps; unparsable input counts as 0.")]
    pub reps: Option<String>,

    #[arg(short = 'e', long, help = "Effort: easy, hard, failure or none.")]
    pub effort: Option<String>,
}

#[derive(Debug, Args)]
pub struct WorkoutEditArgs {
    #[arg(help = "Workout id.")]
    pub id: String,

    #[arg(long, help = "New date (YYYY-MM-DD or RFC3339).")]
    pub date: Option<String>,

    #[arg(
        short = 's',
        long = "set",
        value_parser = parse_set_edit,
        help = "Set change as EXERCISE:SET:FIELD=VALUE, e.g. 1:2:weight=90 (repeatable)."
    )]
    pub sets: Vec<SetEdit>,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    #[command(subcommand)]
    pub command: HistorySubcommands,
}

#[derive(Debug, Subcommand)]
pub enum HistorySubcommands {
    #[command(about = "List finished workouts, newest first.", alias = "list")]
    Ls(HistoryListArgs),
    #[command(about = "Show one finished workout.")]
    Show(RefJsonArgs),
}

#[derive(Debug, Args)]
pub struct HistoryListArgs {
    #[arg(short = 'n', long, help = "Show at most this many workouts.")]
    pub limit: Option<usize>,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct BackupArgs {
    #[command(subcommand)]
    pub command: BackupSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum BackupSubcommands {
    #[command(about = "Take a manual backup now.")]
    Manual,
    #[command(about = "Take an automatic backup if one is due.")]
    Auto,
    #[command(about = "Show backup status and reminder state.")]
    Status(JsonArgs),
    #[command(about = "List stored backup versions.", alias = "list")]
    Ls(JsonArgs),
    #[command(about = "Replace the store with a stored backup.")]
    Restore(BackupRestoreArgs),
    #[command(about = "Export the whole store as a JSON document.")]
    Export(BackupExportArgs),
    #[command(about = "Import a routine export or a full backup file.")]
    Import(BackupImportArgs),
}

#[derive(Debug, Args)]
pub struct BackupRestoreArgs {
    #[arg(help = "Storage key from `backup ls`.")]
    pub key: String,

    #[arg(short = 'y', long, help = "Replace without asking.")]
    pub yes: bool,
}

#[derive(Debug, Args)]
pub struct BackupExportArgs {
    #[arg(short = 'o', long, help = "Write to this file instead of stdout.")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct BackupImportArgs {
    #[arg(help = "JSON file to import.")]
    pub file: PathBuf,

    #[arg(short = 'y', long, help = "Replace without asking.")]
    pub yes: bool,
}

#[derive(Debug, Args)]
pub struct ExerciseArgs {
    #[command(subcommand)]
    pub command: ExerciseSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum ExerciseSubcommands {
    #[command(about = "List library and custom exercises.", alias = "list")]
    Ls(ExerciseListArgs),
    #[command(about = "Add a custom exercise.")]
    Add(ExerciseAddArgs),
}

#[derive(Debug, Args)]
pub struct ExerciseListArgs {
    #[arg(short = 'm', long, help = "Only exercises for this primary muscle.")]
    pub muscle: Option<String>,

    #[arg(
        short = 'g',
        long,
        conflicts_with = "muscle",
        help = "List muscle groups and equipment instead of exercises."
    )]
    pub groups: bool,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ExerciseAddArgs {
    #[arg(help = "Exercise name.")]
    pub name: String,

    #[arg(short = 'm', long, help = "Primary muscle.")]
    pub muscle: String,

    #[arg(short = 'd', long, help = "Short description.")]
    pub description: Option<String>,
}

#[derive(Debug, Args)]
pub struct SettingsArgs {
    #[command(subcommand)]
    pub command: SettingsSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum SettingsSubcommands {
    #[command(about = "Show current settings.")]
    Show(JsonArgs),
    #[command(about = "Change one or more settings.")]
    Set(SettingsSetArgs),
}

#[derive(Debug, Args)]
pub struct SettingsSetArgs {
    #[arg(long, help = "light, dark or toggle.")]
    pub theme: Option<String>,

    #[arg(long = "rest-timer", help = "Rest timer in seconds.")]
    pub rest_timer: Option<u32>,

    #[arg(long = "auto-backup", help = "Enable automatic backups (true/false).")]
    pub auto_backup: Option<bool>,

    #[arg(long = "reminders", help = "Enable backup reminders (true/false).")]
    pub reminders: Option<bool>,
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    #[arg(
        short = 'e',
        long,
        help = "Show the last rated performance for this exercise."
    )]
    pub exercise: Option<String>,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    #[arg(long, help = "Run the due jobs once and exit.")]
    pub once: bool,
}

/// `NAME:SETSxREPS[@WEIGHT]`, e.g. `Bench Press:4x8@80`.
pub fn parse_exercise_spec(raw: &str) -> Result<ExerciseSpec, String> {
    let (name, plan) = raw
        .rsplit_once(':')
        .ok_or_else(|| format!("expected NAME:SETSxREPS[@WEIGHT], got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("exercise name cannot be empty".to_string());
    }
    let (counts, weight) = match plan.split_once('@') {
        Some((counts, weight)) => {
            let weight = weight
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("invalid weight '{}'", weight.trim()))?;
            (counts, weight)
        }
        None => (plan, 0.0),
    };
    let (sets, reps) = counts
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected SETSxREPS, got '{}'", counts.trim()))?;
    let target_sets = sets
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid set count '{}'", sets.trim()))?;
    let target_reps = reps
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid rep count '{}'", reps.trim()))?;
    Ok(ExerciseSpec {
        name: name.to_string(),
        equipment: String::new(),
        target_sets,
        target_reps,
        target_weight: weight,
        notes: String::new(),
    })
}

/// `EXERCISE:SET:FIELD=VALUE` with 1-based positions.
pub fn parse_set_edit(raw: &str) -> Result<SetEdit, String> {
    let mut parts = raw.splitn(3, ':');
    let (Some(exercise), Some(set), Some(change)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(format!("expected EXERCISE:SET:FIELD=VALUE, got '{}'", raw));
    };
    let exercise_index = parse_position(exercise, "exercise")?;
    let set_index = parse_position(set, "set")?;
    let (field, value) = change
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got '{}'", change))?;
    let update = match field.trim().to_ascii_lowercase().as_str() {
        "weight" => SetUpdate::weight_from_input(value),
        "reps" => SetUpdate::reps_from_input(value),
        "effort" => SetUpdate::effort_from_input(value).map_err(|err| err.to_string())?,
        other => return Err(format!("unknown set field '{}'", other)),
    };
    Ok(SetEdit {
        exercise_index,
        set_index,
        update,
    })
}

fn parse_position(raw: &str, what: &str) -> Result<usize, String> {
    let raw = raw.trim();
    match raw.parse::<usize>() {
        Ok(position) if position >= 1 => Ok(position - 1),
        _ => Err(format!("{} number must be 1 or more, got '{}'", what, raw)),
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
