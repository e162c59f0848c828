use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use clap_complete::{generate, Shell};

use crate::app::{App, AppError};
use crate::domain::ValidationError;

const BIN: &str = "gymlog";

/// Store-backed values a completion slot offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NameKind {
    Folders,
    Routines,
    Backups,
}

impl NameKind {
    fn as_str(self) -> &'static str {
        match self {
            NameKind::Folders => "folders",
            NameKind::Routines => "routines",
            NameKind::Backups => "backups",
        }
    }
}

/// A spot on the command line that takes a folder, routine or backup
/// reference. `flag` is `None` for the first positional argument.
struct NameSlot {
    group: &'static str,
    command: &'static str,
    flag: Option<(&'static str, char)>,
    kind: NameKind,
}

const fn positional(group: &'static str, command: &'static str, kind: NameKind) -> NameSlot {
    NameSlot {
        group,
        command,
        flag: None,
        kind,
    }
}

const fn flag(
    group: &'static str,
    command: &'static str,
    long: &'static str,
    short: char,
    kind: NameKind,
) -> NameSlot {
    NameSlot {
        group,
        command,
        flag: Some((long, short)),
        kind,
    }
}

const NAME_SLOTS: &[NameSlot] = &[
    flag("folder", "new", "parent", 'p', NameKind::Folders),
    flag("folder", "ls", "parent", 'p', NameKind::Folders),
    positional("folder", "mv", NameKind::Folders),
    flag("folder", "mv", "to", 't', NameKind::Folders),
    positional("folder", "rename", NameKind::Folders),
    positional("folder", "rm", NameKind::Folders),
    positional("folder", "path", NameKind::Folders),
    flag("routine", "new", "folder", 'f', NameKind::Folders),
    flag("routine", "ls", "folder", 'f', NameKind::Folders),
    flag("routine", "mv", "to", 't', NameKind::Folders),
    positional("routine", "show", NameKind::Routines),
    positional("routine", "edit", NameKind::Routines),
    positional("routine", "rm", NameKind::Routines),
    positional("routine", "mv", NameKind::Routines),
    positional("routine", "export", NameKind::Routines),
    positional("workout", "start", NameKind::Routines),
    positional("backup", "restore", NameKind::Backups),
];

/// Names offered for `kind`, read from the open store. Backups come newest
/// first, the rest sorted without duplicates.
pub fn names(app: &App, kind: NameKind) -> Vec<String> {
    match kind {
        NameKind::Folders => sorted_unique(app.data().folders.iter().map(|f| f.name.clone())),
        NameKind::Routines => sorted_unique(app.data().routines.iter().map(|r| r.name.clone())),
        NameKind::Backups => app
            .list_backups()
            .iter()
            .rev()
            .map(|version| version.storage_key.clone())
            .collect(),
    }
}

fn sorted_unique(names: impl Iterator<Item = String>) -> Vec<String> {
    let mut names = names.collect::<Vec<_>>();
    names.sort();
    names.dedup();
    names
}

pub fn print_names(app: &App, kind: NameKind) {
    for name in names(app, kind) {
        println!("{name}");
    }
}

/// The clap-generated script, followed by hooks that complete store names
/// for shells that can call back into `gymlog completions --names`.
pub fn write_script(shell: Shell, out: &mut dyn Write) -> io::Result<()> {
    let mut cmd = crate::cli::styled_command();
    generate(shell, &mut cmd, BIN, out);
    match shell {
        Shell::Bash => out.write_all(bash_name_hooks().as_bytes()),
        Shell::Fish => out.write_all(fish_name_hooks().as_bytes()),
        _ => Ok(()),
    }
}

fn bash_name_hooks() -> String {
    let mut flag_cases = String::new();
    let mut positional_cases = String::new();
    for slot in NAME_SLOTS {
        let (group, command, kind) = (slot.group, slot.command, slot.kind.as_str());
        match slot.flag {
            Some((long, short)) => flag_cases.push_str(&format!(
                "        \"{group} {command} --{long}\"|\"{group} {command} -{short}\") \
                 _gymlog_names {kind}; return ;;\n"
            )),
            None => positional_cases.push_str(&format!(
                "            \"{group} {command}\") _gymlog_names {kind}; return ;;\n"
            )),
        }
    }
    format!(
        r#"
_gymlog_names() {{
    local IFS=$'\n'
    local cur="${{COMP_WORDS[COMP_CWORD]}}"
    COMPREPLY=($(compgen -W "$(gymlog completions --names "$1" 2>/dev/null)" -- "$cur"))
}}

_gymlog_with_names() {{
    local prev="${{COMP_WORDS[COMP_CWORD-1]}}"
    case "${{COMP_WORDS[1]}} ${{COMP_WORDS[2]}} ${{prev}}" in
{flag_cases}    esac
    if [[ ${{COMP_CWORD}} -eq 3 ]]; then
        case "${{COMP_WORDS[1]}} ${{COMP_WORDS[2]}}" in
{positional_cases}        esac
    fi
    _gymlog "$@"
}}

complete -F _gymlog_with_names -o bashdefault -o default gymlog
"#
    )
}

fn fish_name_hooks() -> String {
    let mut hooks = String::from("\n");
    for slot in NAME_SLOTS {
        let condition = format!(
            "__fish_seen_subcommand_from {}; and __fish_seen_subcommand_from {}",
            slot.group, slot.command
        );
        let source = format!("(gymlog completions --names {})", slot.kind.as_str());
        match slot.flag {
            Some((long, short)) => hooks.push_str(&format!(
                "complete -c gymlog -n \"{condition}\" -l {long} -s {short} -x -a \"{source}\"\n"
            )),
            None => hooks.push_str(&format!(
                "complete -c gymlog -n \"{condition}\" -f -a \"{source}\"\n"
            )),
        }
    }
    hooks
}

/// A written script plus what the user still has to do for the shell to
/// pick it up, if anything.
#[derive(Debug)]
pub struct InstalledScript {
    pub path: PathBuf,
    pub hint: Option<&'static str>,
}

fn install_target(shell: Shell, home: &Path) -> Option<(PathBuf, Option<&'static str>)> {
    match shell {
        Shell::Bash => Some((
            home.join(".local/share/bash-completion/completions/gymlog"),
            None,
        )),
        Shell::Fish => Some((home.join(".config/fish/completions/gymlog.fish"), None)),
        Shell::Zsh => Some((
            home.join(".zfunc/_gymlog"),
            Some("add `fpath+=~/.zfunc` before `compinit` in ~/.zshrc"),
        )),
        _ => None,
    }
}

pub fn install_script(shell: Shell, home: &Path) -> io::Result<InstalledScript> {
    let (path, hint) = install_target(shell, home).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::Unsupported,
            format!("no install location for {shell}; redirect `gymlog completions {shell}`"),
        )
    })?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut script = Vec::new();
    write_script(shell, &mut script)?;
    std::fs::write(&path, script)?;
    Ok(InstalledScript { path, hint })
}

pub fn run(shell: Option<Shell>, install: bool) -> Result<(), AppError> {
    let shell = shell.or_else(Shell::from_env).ok_or_else(|| {
        AppError::Validation(ValidationError::new(
            "unable to detect shell from $SHELL; pass a shell name",
        ))
    })?;

    if !install {
        write_script(shell, &mut io::stdout().lock())?;
        return Ok(());
    }
    let home = std::env::var_os("HOME").ok_or_else(|| {
        AppError::Validation(ValidationError::new(
            "HOME is not set; cannot install completions",
        ))
    })?;
    let installed = install_script(shell, Path::new(&home))?;
    println!("completions installed to {}", installed.path.display());
    if let Some(hint) = installed.hint {
        println!("{hint}");
    }
    Ok(())
}
