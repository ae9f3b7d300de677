use anyhow::{Context, Result, bail};
use chrono::{Duration, Utc};
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use gtd_core::{
    NewTask, TaskFilter, TaskId, TaskStore, TaskUpdate, due_soon, find_merge_candidate, maybe_merge,
    merge_tasks, parse_due_date,
};
use gtd_ingest::extract_task_fields;
use gtd_store::SqliteTaskStore;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod config;
mod display;
mod state;

use config::Config;

#[derive(Parser, Debug)]
#[command(
    name = "gtd",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GTD_BUILD_SHA"), ")"),
    about = "Personal task manager: what should I do next?"
)]
struct Cli {
    /// SQLite database (default: config [store].path, else ~/.gtd/gtd.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Debug logging on stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new task
    Create {
        title: String,

        #[arg(short, long)]
        description: Option<String>,

        /// Due date: YYYY-MM-DD, "YYYY-MM-DD HH:MM" (config timezone) or RFC3339
        #[arg(long)]
        due: Option<String>,

        /// 1-10, higher means less effort
        #[arg(short, long, default_value_t = 5, value_parser = clap::value_parser!(i32).range(1..=10))]
        effort: i32,

        /// 1-10, higher means worse if neglected
        #[arg(short, long, default_value_t = 5, value_parser = clap::value_parser!(i32).range(1..=10))]
        consequences: i32,

        /// 1-10, higher means more desire to do it
        #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(i32).range(1..=10))]
        desire: i32,

        /// Prerequisite task id
        #[arg(short, long)]
        pre_task: Option<TaskId>,
    },

    /// Show the highest-priority incomplete task
    Top {
        #[arg(long)]
        json: bool,
    },

    /// List tasks (incomplete by default)
    List {
        #[arg(short, long, conflicts_with = "completed")]
        all: bool,

        #[arg(short, long)]
        completed: bool,

        /// Group by Eisenhower quadrant
        #[arg(short, long, conflicts_with = "json")]
        quadrants: bool,

        #[arg(long)]
        json: bool,
    },

    /// Show one task
    Show {
        id: TaskId,

        #[arg(long)]
        json: bool,
    },

    /// Mark a task as completed
    Done { id: TaskId },

    /// Edit task attributes; the score is recomputed
    Edit {
        id: TaskId,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long, conflicts_with = "clear_description")]
        description: Option<String>,

        #[arg(long)]
        clear_description: bool,

        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,

        #[arg(long)]
        clear_due: bool,

        #[arg(short, long, value_parser = clap::value_parser!(i32).range(1..=10))]
        effort: Option<i32>,

        #[arg(short, long, value_parser = clap::value_parser!(i32).range(1..=10))]
        consequences: Option<i32>,

        #[arg(long, value_parser = clap::value_parser!(i32).range(1..=10))]
        desire: Option<i32>,

        #[arg(short, long, conflicts_with = "clear_pre_task")]
        pre_task: Option<TaskId>,

        #[arg(long)]
        clear_pre_task: bool,
    },

    /// Record that a task came up again (repetitions +1, score +1)
    Repeat { id: TaskId },

    /// Merge a task into its most similar incomplete task, if any
    Merge {
        id: TaskId,

        /// Similarity threshold in [0, 1] (default: config [merge].threshold)
        #[arg(long)]
        threshold: Option<f64>,

        /// Only report the candidate
        #[arg(long)]
        dry_run: bool,
    },

    /// Merge two specific tasks, keeping the higher-scored one
    MergePair { a: TaskId, b: TaskId },

    /// Create a task from a free-text description
    AddText {
        text: String,

        /// Print the extracted fields without creating anything
        #[arg(long)]
        dry_run: bool,
    },

    /// List incomplete tasks due soon
    Due {
        /// Window in hours (default: config [reminders].window_hours)
        #[arg(long, value_parser = clap::value_parser!(i64).range(1..))]
        hours: Option<i64>,
    },

    /// Manage ~/.gtd/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config if none exists
    Init,
    /// Print the effective config
    Show,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = config::load_config()?;
    let tz: Tz = cfg
        .time
        .timezone
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone in config: {}", cfg.time.timezone))?;

    if let Command::Config { command } = &cli.command {
        return match command {
            ConfigCommand::Init => config::init_config(),
            ConfigCommand::Show => {
                print!("{}", toml::to_string_pretty(&cfg)?);
                Ok(())
            }
        };
    }

    let db_path = match cli.db.clone().or_else(|| cfg.store.path.clone()) {
        Some(p) => p,
        None => state::default_db_path()?,
    };
    let mut store =
        SqliteTaskStore::open(&db_path).with_context(|| format!("opening {}", db_path.display()))?;
    tracing::debug!(db = %db_path.display(), "opened task store");

    run(cli.command, &mut store, &cfg, tz)
}

fn run(command: Command, store: &mut SqliteTaskStore, cfg: &Config, tz: Tz) -> Result<()> {
    let now = Utc::now();

    match command {
        Command::Create {
            title,
            description,
            due,
            effort,
            consequences,
            desire,
            pre_task,
        } => {
            let new = NewTask {
                title,
                description,
                due_date: due.as_deref().map(|d| parse_due_date(d, tz.name())).transpose()?,
                effort,
                consequences,
                desire,
                pre_task,
            };
            create_task(store, cfg, &new)?;
        }

        Command::Top { json } => match store.top_task()? {
            Some(t) if json => println!("{}", serde_json::to_string_pretty(&t)?),
            Some(t) => println!("{}", display::task_details(&t, now, tz)),
            None => println!("No tasks found."),
        },

        Command::List {
            all,
            completed,
            quadrants,
            json,
        } => {
            let filter = if all {
                TaskFilter::all()
            } else if completed {
                TaskFilter::completed()
            } else {
                TaskFilter::active()
            };
            let tasks = store.list(&filter)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else if tasks.is_empty() {
                println!("No tasks found.");
            } else if quadrants {
                println!("{}", display::quadrant_groups(&tasks, now, tz));
            } else {
                for t in &tasks {
                    println!("{}", display::task_row(t, now, tz));
                }
            }
        }

        Command::Show { id, json } => {
            let t = store.require(id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&t)?);
            } else {
                println!("{}", display::task_details(&t, now, tz));
            }
        }

        Command::Done { id } => {
            if !store.complete(id, now)? {
                bail!("task {id} not found");
            }
            println!("Task {id} marked as complete.");
        }

        Command::Edit {
            id,
            title,
            description,
            clear_description,
            due,
            clear_due,
            effort,
            consequences,
            desire,
            pre_task,
            clear_pre_task,
        } => {
            let due_date = match (due, clear_due) {
                (_, true) => Some(None),
                (Some(d), false) => Some(Some(parse_due_date(&d, tz.name())?)),
                (None, false) => None,
            };
            let update = TaskUpdate {
                title,
                description: if clear_description { Some(None) } else { description.map(Some) },
                due_date,
                effort,
                consequences,
                desire,
                pre_task: if clear_pre_task { Some(None) } else { pre_task.map(Some) },
            };
            if update.is_empty() {
                bail!("nothing to change (see `gtd edit --help`)");
            }
            if !store.update(id, &update, now)? {
                bail!("task {id} not found");
            }
            let t = store.require(id)?;
            println!("Task {id} updated (score {:.2}).", t.score);
        }

        Command::Repeat { id } => {
            if !store.increase_repetition(id, now)? {
                bail!("task {id} not found");
            }
            let t = store.require(id)?;
            println!("Task {id} repeated {} times (score {:.2}).", t.repetitions, t.score);
        }

        Command::Merge { id, threshold, dry_run } => {
            let threshold = threshold.unwrap_or(cfg.merge.threshold);
            if !(0.0..=1.0).contains(&threshold) {
                bail!("threshold must be within 0..=1 (got {threshold})");
            }
            store.require(id)?;

            if dry_run {
                match find_merge_candidate(&*store, id, threshold)? {
                    Some(c) => println!(
                        "Task {id} would merge with #{} \"{}\" (similarity {:.2}).",
                        c.task.id, c.task.title, c.similarity
                    ),
                    None => println!("No similar task for {id} at threshold {threshold:.2}."),
                }
            } else if maybe_merge(store, id, threshold)? {
                println!("Task {id} merged with a similar task.");
            } else {
                println!("No similar task for {id} at threshold {threshold:.2}.");
            }
        }

        Command::MergePair { a, b } => {
            let outcome = merge_tasks(store, a, b)?;
            println!(
                "Kept task {} (repetitions {}, score {:.2}); deleted task {}.",
                outcome.keeper.id, outcome.keeper.repetitions, outcome.keeper.score, outcome.plan.loser
            );
        }

        Command::AddText { text, dry_run } => {
            let local_now = now.with_timezone(&tz).naive_local();
            let extracted = extract_task_fields(&text, local_now)?;
            if dry_run {
                println!("{}", serde_json::to_string_pretty(&extracted)?);
                return Ok(());
            }
            let new = extracted.into_new_task(tz)?;
            create_task(store, cfg, &new)?;
        }

        Command::Due { hours } => {
            let hours = hours.unwrap_or(cfg.reminders.window_hours);
            let window = Duration::try_hours(hours)
                .with_context(|| format!("window of {hours} hours is out of range"))?;
            let tasks = store.list(&TaskFilter::active())?;
            let reminders = due_soon(&tasks, now, window);
            if reminders.is_empty() {
                println!("Nothing due in the next {hours} hours.");
            }
            for r in &reminders {
                println!("{} | {} | {}", r.title, r.subtitle, display::format_due(Some(r.due_date), tz));
            }
        }

        Command::Config { .. } => unreachable!("handled before the store is opened"),
    }

    Ok(())
}

fn create_task(store: &mut SqliteTaskStore, cfg: &Config, new: &NewTask) -> Result<()> {
    let id = store.create(new, Utc::now())?;
    println!("Task created with ID: {id}");

    if cfg.merge.auto_on_create && maybe_merge(store, id, cfg.merge.threshold)? {
        match store.get(id)? {
            Some(t) => println!("Merged a similar task into #{id} (repetitions {}).", t.repetitions),
            None => println!("Task {id} was a repeat and merged into an existing task."),
        }
    }
    Ok(())
}
