// File: ./src/cli.rs
//! Command-line parsing and help text for the `kancal` binary.
use crate::model::{TaskTime, TimeChange};
use anyhow::{Result, anyhow, bail};
use chrono::NaiveDate;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    List {
        board: Option<String>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        all: bool,
        json: bool,
    },
    Move {
        id: String,
        date: NaiveDate,
    },
    Update {
        id: String,
        description: Option<String>,
        date: Option<NaiveDate>,
        time: Option<TimeChange>,
        completed: Option<bool>,
    },
    Add {
        board: String,
        description: String,
        date: NaiveDate,
        time: Option<TaskTime>,
        tags: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Root for config and log directories (`--root`).
    pub root: Option<PathBuf>,
    /// Vault directory overriding the configured one (`--vault`).
    pub vault: Option<PathBuf>,
    pub command: Command,
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| anyhow!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_time(s: &str) -> Result<TaskTime> {
    TaskTime::parse(s).ok_or_else(|| anyhow!("Invalid time '{}', expected HH:MM or HH:MM-HH:MM", s))
}

fn value<'a, I>(flag: &str, it: &mut I) -> Result<String>
where
    I: Iterator<Item = &'a String>,
{
    it.next()
        .cloned()
        .ok_or_else(|| anyhow!("Missing value for {}", flag))
}

/// Parses arguments, excluding the binary name.
pub fn parse_args(args: &[String]) -> Result<Invocation> {
    let mut root = None;
    let mut vault = None;
    let mut positional: Vec<String> = Vec::new();
    let mut flags: Vec<(String, Option<String>)> = Vec::new();

    let mut it = args.iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "-h" | "--help" | "help" => {
                return Ok(Invocation {
                    root,
                    vault,
                    command: Command::Help,
                });
            }
            "-r" | "--root" => root = Some(PathBuf::from(value(arg, &mut it)?)),
            "--vault" => vault = Some(PathBuf::from(value(arg, &mut it)?)),
            "--board" | "--from" | "--to" | "--desc" | "--date" | "--time" | "--tag" => {
                flags.push((arg.clone(), Some(value(arg, &mut it)?)));
            }
            "--all" | "--json" | "--no-time" | "--done" | "--undone" => {
                flags.push((arg.clone(), None));
            }
            other if other.starts_with("--") => bail!("Unknown option '{}'", other),
            _ => positional.push(arg.clone()),
        }
    }

    let flag = |name: &str| {
        flags
            .iter()
            .rev()
            .find(|(f, _)| f == name)
            .and_then(|(_, v)| v.clone())
    };
    let has = |name: &str| flags.iter().any(|(f, _)| f == name);
    let opt_date = |name: &str| flag(name).map(|v| parse_date(&v)).transpose();

    let mut pos = positional.into_iter();
    let command = match pos.next().as_deref() {
        None | Some("list") => Command::List {
            board: flag("--board"),
            from: opt_date("--from")?,
            to: opt_date("--to")?,
            all: has("--all"),
            json: has("--json"),
        },
        Some("move") => {
            let id = pos.next().ok_or_else(|| anyhow!("move: missing task id"))?;
            let date = pos.next().ok_or_else(|| anyhow!("move: missing date"))?;
            Command::Move {
                id,
                date: parse_date(&date)?,
            }
        }
        Some("update") => {
            let id = pos.next().ok_or_else(|| anyhow!("update: missing task id"))?;
            let time = if has("--no-time") {
                Some(TimeChange::Clear)
            } else {
                flag("--time")
                    .map(|v| parse_time(&v))
                    .transpose()?
                    .map(TimeChange::Set)
            };
            let completed = match (has("--done"), has("--undone")) {
                (true, true) => bail!("update: --done and --undone are exclusive"),
                (true, false) => Some(true),
                (false, true) => Some(false),
                (false, false) => None,
            };
            Command::Update {
                id,
                description: flag("--desc"),
                date: opt_date("--date")?,
                time,
                completed,
            }
        }
        Some("add") => {
            let board = pos.next().ok_or_else(|| anyhow!("add: missing board file"))?;
            let description = pos.collect::<Vec<_>>().join(" ");
            if description.trim().is_empty() {
                bail!("add: missing description");
            }
            let date = opt_date("--date")?.ok_or_else(|| anyhow!("add: --date is required"))?;
            Command::Add {
                board,
                description,
                date,
                time: flag("--time").map(|v| parse_time(&v)).transpose()?,
                tags: flags
                    .iter()
                    .filter(|(f, _)| f == "--tag")
                    .filter_map(|(_, v)| v.clone())
                    .collect(),
            }
        }
        Some(other) => bail!("Unknown command '{}'", other),
    };

    Ok(Invocation {
        root,
        vault,
        command,
    })
}

pub fn print_help(binary_name: &str) {
    println!(
        "Kancal v{} - Dated tasks from markdown kanban boards",
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("USAGE:");
    println!("    {} [--root <path>] [--vault <dir>] <command>", binary_name);
    println!();
    println!("COMMANDS:");
    println!("    list [--board <file>] [--from D] [--to D] [--all] [--json]");
    println!("                          List dated tasks in agenda order");
    println!("    move <id> <YYYY-MM-DD>  Reschedule a task");
    println!("    update <id> [--desc T] [--date D] [--time T | --no-time] [--done | --undone]");
    println!("                          Change fields of a task");
    println!("    add <file> <description...> --date D [--time T] [--tag T]...");
    println!("                          Append a task to the first open section");
    println!();
    println!("OPTIONS:");
    println!("    -r, --root <path>     Use a different directory for config and logs.");
    println!("    --vault <dir>         Directory holding the board documents.");
    println!("    --all                 Include tasks hidden by the list filters.");
    println!("    -h, --help            Show this help message.");
    println!();
    println!("BOARD SYNTAX:");
    println!("    - [ ] / - [x]         Open / done checklist item");
    println!("    @{{2025-01-16}}         Due date (on the item or up to 3 lines below)");
    println!("    @@{{09:00}}             Time, or range @@{{09:00-10:30}} (also @@09:00)");
    println!("    #tag                  Tag (inherited by indented subtasks)");
    println!("    [[Note]]              Linked note");
    println!("    ## Column             Section; a title containing 'Done' is the done column");
}
