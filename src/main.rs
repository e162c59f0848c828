mod app;
mod backup;
mod backup_store;
mod cli;
mod clock;
mod completions;
mod config;
mod db;
mod domain;
mod folders;
mod ids;
mod library;
mod logging;
mod sample;
mod scheduler;
mod snapshot;
mod stats;
mod store;
mod ui;
mod workouts;

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::Path;
use std::str::FromStr;

use app::{App, AppError, AppPaths, ImportOutcome, ImportPreview, RoutineFilter};
use domain::routine::RoutineDraft;
use domain::settings::{SettingsPatch, Theme};
use domain::workout::SetUpdate;
use domain::ValidationError;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn invalid(message: impl Into<String>) -> AppError {
    AppError::Validation(ValidationError::new(message))
}

fn resolve_paths(cli: &cli::Cli) -> AppPaths {
    let mut paths = AppPaths::under(&cli.data_dir);
    if let Some(db) = &cli.db {
        paths.db_path = db.clone();
    }
    if let Some(backup_db) = &cli.backup_db {
        paths.backup_db_path = backup_db.clone();
    }
    paths
}

fn run() -> Result<(), AppError> {
    use clap::Parser;
    use cli::Commands;

    let cli = cli::Cli::parse();
    logging::init(cli.verbose);

    let paths = resolve_paths(&cli);
    if let Commands::Completions(args) = &cli.command {
        if args.names.is_none() {
            return completions::run(args.shell, args.install);
        }
        // Completing outside a gymlog directory must not create a store.
        if !Path::new(&paths.db_path).exists() {
            return Ok(());
        }
    }

    let mut app = App::open(&paths)?;

    match cli.command {
        Commands::Init(args) => {
            if args.sample {
                if app.seed_sample()? {
                    println!("seeded sample folders, routines and a past workout");
                } else {
                    println!("store already has routines; sample data skipped");
                }
            }
            println!("gymlog init completed ({})", paths.db_path);
        }
        Commands::Folder(args) => run_folder(&mut app, args.command)?,
        Commands::Routine(args) => run_routine(&mut app, args.command)?,
        Commands::Workout(args) => run_workout(&mut app, args.command)?,
        Commands::History(args) => run_history(&app, args.command)?,
        Commands::Backup(args) => run_backup(&mut app, args.command)?,
        Commands::Exercise(args) => run_exercise(&mut app, args.command)?,
        Commands::Settings(args) => run_settings(&mut app, args.command)?,
        Commands::Stats(args) => {
            let board = app.dashboard();
            let last = args
                .exercise
                .as_deref()
                .map(|name| (name, app.last_performance(name)));
            if args.json {
                print_json(&serde_json::json!({
                    "dashboard": board,
                    "backup": app.backup_status(),
                    "last_performance": last.and_then(|(_, performance)| performance),
                }))?;
            } else {
                ui::print_dashboard(&board);
                if let Some((name, performance)) = last {
                    ui::print_last_performance(name, performance.as_ref());
                }
                if app.is_reminder_due() {
                    println!();
                    ui::print_backup_status(&app.backup_status());
                }
            }
        }
        Commands::Watch(args) => run_watch(&mut app, args.once)?,
        Commands::Completions(args) => {
            if let Some(kind) = args.names {
                completions::print_names(&app, kind);
            }
        }
    }

    Ok(())
}

fn run_folder(app: &mut App, command: cli::FolderSubcommands) -> Result<(), AppError> {
    use cli::FolderSubcommands;

    match command {
        FolderSubcommands::New(args) => {
            let parent = match args.parent.as_deref() {
                Some(reference) => Some(app.find_folder(reference)?.id.clone()),
                None => None,
            };
            let folder = app.create_folder(&args.name, parent.as_deref())?;
            println!("created folder {} {}", folder.id, folder.name);
        }
        FolderSubcommands::Ls(args) => {
            if args.parent.is_none() && !args.root {
                if args.json {
                    print_json(&app.data().folders)?;
                } else {
                    ui::print_folder_tree(&app.folder_tree());
                }
                return Ok(());
            }
            let parent = match args.parent.as_deref() {
                Some(reference) => Some(app.find_folder(reference)?),
                None => None,
            };
            let children = app.list_children(parent.map(|folder| folder.id.as_str()));
            if args.json {
                print_json(&children)?;
            } else {
                ui::print_folder_children(parent, &children);
            }
        }
        FolderSubcommands::Mv(args) => {
            let id = app.find_folder(&args.folder)?.id.clone();
            let target = match args.to.as_deref() {
                Some(reference) => Some(app.find_folder(reference)?.id.clone()),
                None => None,
            };
            let folder = app.move_folder(&id, target.as_deref())?;
            println!(
                "moved {} -> {}",
                folder.name,
                folders::display_path(&app.data().folders, &folder.id)
            );
        }
        FolderSubcommands::Rename(args) => {
            let id = app.find_folder(&args.folder)?.id.clone();
            let folder = app.rename_folder(&id, &args.name)?;
            println!("renamed {} to {}", folder.id, folder.name);
        }
        FolderSubcommands::Rm(args) => {
            let id = app.find_folder(&args.reference)?.id.clone();
            let removed = app.delete_folder(&id)?;
            println!("deleted folder {} {}", removed.id, removed.name);
        }
        FolderSubcommands::Path(args) => {
            let id = app.find_folder(&args.reference)?.id.clone();
            let path = app.folder_path(&id)?;
            if args.json {
                print_json(&path)?;
            } else {
                let names = path
                    .iter()
                    .map(|folder| folder.name.as_str())
                    .collect::<Vec<_>>();
                println!("{}", names.join(" > "));
            }
        }
    }
    Ok(())
}

fn folder_label(app: &App, routine: &domain::routine::Routine) -> Option<String> {
    app.routine_folder(routine)
        .map(|folder| folders::display_path(&app.data().folders, &folder.id))
}

fn run_routine(app: &mut App, command: cli::RoutineSubcommands) -> Result<(), AppError> {
    use cli::RoutineSubcommands;

    match command {
        RoutineSubcommands::New(args) => {
            let folder_id = match args.folder.as_deref() {
                Some(reference) => Some(app.find_folder(reference)?.id.clone()),
                None => None,
            };
            let routine = app.create_routine(RoutineDraft {
                name: args.name,
                folder_id,
                exercises: args.exercises,
            })?;
            println!("created routine {} {}", routine.id, routine.name);
        }
        RoutineSubcommands::Edit(args) => {
            if args.name.is_none() && args.exercises.is_empty() {
                return Err(invalid("nothing to change; pass --name or --exercise"));
            }
            let existing = app.find_routine(&args.routine)?;
            let draft = RoutineDraft {
                name: args.name.unwrap_or_else(|| existing.name.clone()),
                folder_id: app.routine_folder(existing).map(|folder| folder.id.clone()),
                exercises: if args.exercises.is_empty() {
                    existing.exercises.clone()
                } else {
                    args.exercises
                },
            };
            let id = existing.id.clone();
            let routine = app.update_routine(&id, draft)?;
            println!("updated routine {} {}", routine.id, routine.name);
        }
        RoutineSubcommands::Ls(args) => {
            let folder_id = match args.folder.as_deref() {
                Some(reference) => Some(app.find_folder(reference)?.id.clone()),
                None => None,
            };
            let filter = match (&folder_id, args.root) {
                (Some(id), _) => RoutineFilter::Folder(id.as_str()),
                (None, true) => RoutineFilter::Root,
                (None, false) => RoutineFilter::All,
            };
            let routines = app.list_routines(filter);
            if args.json {
                print_json(&routines)?;
            } else {
                let rows = routines
                    .into_iter()
                    .map(|routine| (routine, folder_label(app, routine)))
                    .collect::<Vec<_>>();
                ui::print_routine_list(&rows);
            }
        }
        RoutineSubcommands::Show(args) => {
            let routine = app.find_routine(&args.reference)?;
            if args.json {
                print_json(routine)?;
            } else {
                ui::print_routine(routine, folder_label(app, routine).as_deref());
                let last_logged = routine
                    .exercises
                    .iter()
                    .find_map(|spec| Some((spec, app.last_performance(&spec.name)?)));
                if let Some((spec, last)) = last_logged {
                    println!();
                    ui::print_last_performance(&spec.name, Some(&last));
                }
            }
        }
        RoutineSubcommands::Rm(args) => {
            let id = app.find_routine(&args.reference)?.id.clone();
            let removed = app.delete_routine(&id)?;
            println!("deleted routine {} {}", removed.id, removed.name);
        }
        RoutineSubcommands::Mv(args) => {
            let id = app.find_routine(&args.routine)?.id.clone();
            let target = match args.to.as_deref() {
                Some(reference) => Some(app.find_folder(reference)?.id.clone()),
                None => None,
            };
            let routine = app.move_routine_to_folder(&id, target.as_deref())?;
            println!(
                "moved {} -> {}",
                routine.name,
                folder_label(app, &routine).unwrap_or_else(|| "(root)".to_string())
            );
        }
        RoutineSubcommands::Export(args) => {
            let id = app.find_routine(&args.routine)?.id.clone();
            let document = serde_json::to_string_pretty(&app.export_routine(&id)?)?;
            write_document(args.output.as_deref(), &document)?;
        }
    }
    Ok(())
}

fn run_workout(app: &mut App, command: cli::WorkoutSubcommands) -> Result<(), AppError> {
    use cli::WorkoutSubcommands;

    match command {
        WorkoutSubcommands::Start(args) => {
            let routine_id = app.find_routine(&args.reference)?.id.clone();
            let workout = app.start_workout(&routine_id)?;
            println!(
                "started workout {} from {}",
                workout.id, workout.routine_name
            );
            ui::print_workout(&workout);
        }
        WorkoutSubcommands::Set(args) => {
            let workout_id = active_workout_id(app)?;
            let mut updates = Vec::new();
            if let Some(weight) = args.weight.as_deref() {
                updates.push(SetUpdate::weight_from_input(weight));
            }
            if let Some(reps) = args.reps.as_deref() {
                updates.push(SetUpdate::reps_from_input(reps));
            }
            if let Some(effort) = args.effort.as_deref() {
                updates.push(SetUpdate::effort_from_input(effort)?);
            }
            if updates.is_empty() {
                return Err(invalid("nothing to log; pass --weight, --reps or --effort"));
            }
            let exercise_index = position(args.exercise, "exercise")?;
            let set_index = position(args.set, "set")?;
            let set = app.record_set_fields(&workout_id, exercise_index, set_index, &updates)?;
            println!(
                "exercise {} set {}: {} x {} {}",
                args.exercise,
                args.set,
                set.weight,
                set.reps,
                set.effort.map_or("-", |effort| effort.as_str())
            );
        }
        WorkoutSubcommands::Show(args) => {
            let workout = app
                .active_workout()
                .ok_or_else(|| invalid("no workout in progress"))?;
            if args.json {
                print_json(workout)?;
            } else {
                ui::print_workout(workout);
            }
        }
        WorkoutSubcommands::Finish(args) => {
            let workout_id = active_workout_id(app)?;
            let (workout, summary) = app.finish_workout(&workout_id)?;
            if args.json {
                let report = serde_json::json!({ "workout": workout, "summary": summary });
                print_json(&report)?;
            } else {
                ui::print_workout_summary(&workout, &summary);
            }
        }
        WorkoutSubcommands::Discard => {
            let workout = app.discard_workout()?;
            println!(
                "discarded workout {} from {}",
                workout.id, workout.routine_name
            );
        }
        WorkoutSubcommands::Edit(args) => {
            let date = match args.date.as_deref() {
                Some(raw) => Some(
                    clock::parse_date_input(raw)
                        .ok_or_else(|| invalid(format!("invalid date '{}'", raw)))?,
                ),
                None => None,
            };
            if date.is_none() && args.sets.is_empty() {
                return Err(invalid("nothing to change; pass --date or --set"));
            }
            let workout = app.edit_workout(&args.id, date, &args.sets)?;
            println!("updated workout {}", workout.id);
        }
    }
    Ok(())
}

fn active_workout_id(app: &App) -> Result<String, AppError> {
    app.active_workout()
        .map(|workout| workout.id.clone())
        .ok_or_else(|| invalid("no workout in progress; start one with `gymlog workout start`"))
}

fn position(value: usize, what: &str) -> Result<usize, AppError> {
    value
        .checked_sub(1)
        .ok_or_else(|| invalid(format!("{} numbers start at 1", what)))
}

fn run_history(app: &App, command: cli::HistorySubcommands) -> Result<(), AppError> {
    use cli::HistorySubcommands;

    match command {
        HistorySubcommands::Ls(args) => {
            let mut workouts = app.list_workouts();
            if let Some(limit) = args.limit {
                workouts.truncate(limit);
            }
            if args.json {
                print_json(&workouts)?;
            } else {
                ui::print_history(&workouts);
            }
        }
        HistorySubcommands::Show(args) => {
            let workout = app
                .workout(&args.reference)
                .ok_or_else(|| AppError::not_found("workout", args.reference.as_str()))?;
            if args.json {
                print_json(workout)?;
            } else {
                ui::print_workout(workout);
                ui::print_workout_summary(workout, &stats::workout_summary(workout));
            }
        }
    }
    Ok(())
}

fn run_backup(app: &mut App, command: cli::BackupSubcommands) -> Result<(), AppError> {
    use cli::BackupSubcommands;

    match command {
        BackupSubcommands::Manual => {
            let version = app.run_manual_backup()?;
            println!("manual backup stored as {}", version.storage_key);
        }
        BackupSubcommands::Auto => match app.run_automatic_backup_if_due()? {
            Some(version) => println!("automatic backup stored as {}", version.storage_key),
            None => println!("automatic backup not due yet"),
        },
        BackupSubcommands::Status(args) => {
            let status = app.backup_status();
            if args.json {
                print_json(&status)?;
            } else {
                ui::print_backup_status(&status);
            }
        }
        BackupSubcommands::Ls(args) => {
            if args.json {
                print_json(&app.list_backups())?;
            } else {
                ui::print_backup_versions(app.list_backups());
            }
        }
        BackupSubcommands::Restore(args) => {
            let confirm = |preview: &ImportPreview| confirm_replace(args.yes, preview);
            let outcome = app.restore_backup(&args.key, confirm)?;
            report_import(&outcome);
        }
        BackupSubcommands::Export(args) => {
            let document = serde_json::to_string_pretty(&app.export_snapshot())?;
            write_document(args.output.as_deref(), &document)?;
        }
        BackupSubcommands::Import(args) => {
            let raw = std::fs::read_to_string(&args.file)?;
            let outcome = app.import_str(&raw, |preview| confirm_replace(args.yes, preview))?;
            report_import(&outcome);
        }
    }
    Ok(())
}

fn write_document(output: Option<&Path>, document: &str) -> Result<(), AppError> {
    match output {
        Some(path) => {
            std::fs::write(path, format!("{document}\n"))?;
            println!("wrote {}", path.display());
        }
        None => println!("{document}"),
    }
    Ok(())
}

/// Full imports replace every collection, so they need `--yes` or an
/// interactive "y".
fn confirm_replace(yes: bool, preview: &ImportPreview) -> bool {
    if yes {
        return true;
    }
    if !io::stdin().is_terminal() {
        eprintln!("full import replaces all data; rerun with --yes to confirm");
        if preview.discards_active_workout {
            eprintln!("the workout in progress would be discarded");
        }
        return false;
    }
    if preview.discards_active_workout {
        eprintln!("the workout in progress will be discarded");
    }
    eprint!(
        "replace all data with {} routines, {} workouts, {} folders and {} exercises? [y/N] ",
        preview.routines, preview.workouts, preview.folders, preview.custom_exercises
    );
    let _ = io::stderr().flush();
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn report_import(outcome: &ImportOutcome) {
    match outcome {
        ImportOutcome::RoutineImported(routine) => {
            println!("imported routine {} {}", routine.id, routine.name);
        }
        ImportOutcome::Replaced(preview) => println!(
            "imported {} routines, {} workouts, {} folders, {} custom exercises",
            preview.routines, preview.workouts, preview.folders, preview.custom_exercises
        ),
        ImportOutcome::Cancelled => println!("import cancelled; nothing changed"),
    }
}

fn run_exercise(app: &mut App, command: cli::ExerciseSubcommands) -> Result<(), AppError> {
    use cli::ExerciseSubcommands;

    match command {
        ExerciseSubcommands::Ls(args) if args.groups => {
            let library = app.library();
            if args.json {
                print_json(&serde_json::json!({
                    "muscles": library.muscles(),
                    "equipment": library.equipment(),
                }))?;
            } else {
                ui::print_library_groups(library.muscles(), library.equipment());
            }
        }
        ExerciseSubcommands::Ls(args) => {
            let entries = app.exercises(args.muscle.as_deref());
            if args.json {
                print_json(&entries)?;
            } else {
                ui::print_exercises(&entries);
            }
        }
        ExerciseSubcommands::Add(args) => {
            let entry =
                app.add_custom_exercise(&args.name, &args.muscle, args.description.as_deref())?;
            println!("added {} ({})", entry.name, entry.primary_muscle);
        }
    }
    Ok(())
}

fn run_settings(app: &mut App, command: cli::SettingsSubcommands) -> Result<(), AppError> {
    use cli::SettingsSubcommands;

    match command {
        SettingsSubcommands::Show(args) => {
            if args.json {
                print_json(app.settings())?;
            } else {
                ui::print_settings(app.settings());
            }
        }
        SettingsSubcommands::Set(args) => {
            let theme = match args.theme.as_deref() {
                Some(raw) if raw.trim().eq_ignore_ascii_case("toggle") => {
                    Some(app.settings().theme.toggled())
                }
                Some(raw) => Some(Theme::from_str(raw)?),
                None => None,
            };
            let settings = app.update_settings(&SettingsPatch {
                theme,
                rest_timer_seconds: args.rest_timer,
                auto_backup_enabled: args.auto_backup,
                backup_reminders_enabled: args.reminders,
            })?;
            ui::print_settings(&settings);
        }
    }
    Ok(())
}

fn run_watch(app: &mut App, once: bool) -> Result<(), AppError> {
    let mut scheduler = app.scheduler();
    if !scheduler.is_armed() {
        println!("automatic backups are disabled; nothing to schedule");
        return Ok(());
    }
    log::info!(
        "watching: autosave every {}s, backup check every {}s",
        app.config().scheduler.autosave_seconds,
        app.config().scheduler.backup_check_seconds
    );
    loop {
        for job in scheduler.due(app.now()) {
            match app.run_job(job) {
                Ok(Some(version)) => println!("automatic backup stored as {}", version.storage_key),
                Ok(None) => {}
                Err(err) => log::error!("{} failed: {}", job.as_str(), err),
            }
        }
        if once {
            return Ok(());
        }
        let Some(next) = scheduler.next_wake() else {
            return Ok(());
        };
        let wait = std::time::Duration::try_from(next - app.now()).unwrap_or_default();
        std::thread::sleep(wait);
    }
}
