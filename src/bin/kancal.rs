use anyhow::{Context, Result, anyhow};
use kancal::cli::{self, Command, Invocation};
use kancal::config::Config;
use kancal::context::{AppContext, StandardContext};
use kancal::model::{NewTask, TaskChanges, TaskRecord};
use kancal::storage::VaultStorage;
use kancal::store::{self, TaskBoard};
use simplelog::{
    ColorChoice, CombinedLogger, LevelFilter, SharedLogger, TermLogger, TerminalMode, WriteLogger,
};
use std::env;
use std::fs::File;
use std::path::PathBuf;

fn init_logging(ctx: &dyn AppContext) {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        LevelFilter::Warn,
        simplelog::Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];
    if let Some(path) = ctx.get_log_path()
        && let Ok(file) = File::create(&path)
    {
        loggers.push(WriteLogger::new(
            LevelFilter::Debug,
            simplelog::Config::default(),
            file,
        ));
    }
    let _ = CombinedLogger::init(loggers);
}

fn print_task(task: &TaskRecord) {
    let mark = if task.completed { "x" } else { " " };
    let time = task
        .time
        .as_ref()
        .map(|t| format!(" {}", t.display))
        .unwrap_or_default();
    let tags = if task.tags.is_empty() {
        String::new()
    } else {
        format!(" {}", task.tags.join(" "))
    };
    println!(
        "[{}] {}{}  {}{}  ({})",
        mark, task.date, time, task.description, tags, task.id
    );
}

fn lookup(board: &TaskBoard<VaultStorage>, config: &Config, id: &str) -> Result<TaskRecord> {
    let scope = (!config.default_board.is_empty()).then_some(config.default_board.as_str());
    let tasks = board.load_tasks(scope)?;
    store::find(&tasks, id)
        .cloned()
        .ok_or_else(|| anyhow!("No task with id '{}'", id))
}

fn run(inv: Invocation) -> Result<()> {
    let ctx = StandardContext::new(inv.root.clone());
    init_logging(&ctx);

    let config = Config::load_or_default(&ctx).context("Failed to load configuration")?;
    let vault_root = match (&inv.vault, config.vault_root.as_str()) {
        (Some(v), _) => v.clone(),
        (None, "") => env::current_dir()?,
        (None, configured) => PathBuf::from(configured),
    };
    let board = TaskBoard::new(VaultStorage::new(vault_root)).with_time_style(config.time_style);

    match inv.command {
        Command::Help => cli::print_help("kancal"),
        Command::List {
            board: file,
            from,
            to,
            all,
            json,
        } => {
            let scope = file
                .as_deref()
                .or((!config.default_board.is_empty()).then_some(config.default_board.as_str()));
            let mut tasks = board.load_tasks(scope)?;
            if !all {
                tasks = store::visible(tasks, &config);
            }
            let tasks = store::tasks_between(&tasks, from, to);
            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else {
                tasks.iter().for_each(print_task);
            }
        }
        Command::Move { id, date } => {
            let task = lookup(&board, &config, &id)?;
            board.reschedule(&task, date)?;
            println!("Moved '{}' to {}", task.description, date);
        }
        Command::Update {
            id,
            description,
            date,
            time,
            completed,
        } => {
            let task = lookup(&board, &config, &id)?;
            let changes = TaskChanges {
                description,
                date,
                time,
                completed,
            };
            if changes.is_empty() {
                return Err(anyhow!("Nothing to update, see --help"));
            }
            board.update_task(&task, &changes)?;
            println!("Updated '{}'", task.description);
        }
        Command::Add {
            board: file,
            description,
            date,
            time,
            tags,
        } => {
            let mut task = NewTask::new(&description, date);
            task.time = time;
            task.tags = tags;
            board.add_task(&file, &task)?;
            println!("Added '{}' to {}", task.description, file);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let inv = match cli::parse_args(&args) {
        Ok(inv) => inv,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("Try 'kancal --help'.");
            std::process::exit(2);
        }
    };
    run(inv)
}
