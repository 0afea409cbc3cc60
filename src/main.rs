use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

use glowlist::config::AppConfig;
use glowlist::core::RecordId;
use glowlist::core::todo::Priority;
use glowlist::prefs::{JsonFileStore, UiPreferences};
use glowlist::store::{NoteStore, ScrollFollower, TodoOutcome, TodoStore};
use glowlist::sync::DataAccess;
use glowlist::sync::memory::MemoryBackend;
use glowlist::sync::rest::RestClient;

#[derive(Debug, Parser)]
#[command(name = "glowlist")]
#[command(about = "Categorized todo list and note log")]
struct Cli {
    /// Send debug output to the journal
    #[arg(long, global = true)]
    debug: bool,

    /// Work against an empty in-memory store instead of the configured backend
    #[arg(long, global = true)]
    offline: bool,

    /// Path to config.json
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
enum Command {
    /// Show todos grouped by category
    List,

    /// Add a todo at the end of the list
    Add {
        #[arg(required = true)]
        text: Vec<String>,
        #[arg(long, default_value = "")]
        category: String,
        /// Due date, e.g. 2026-11-02
        #[arg(long, value_parser = clap::value_parser!(NaiveDate))]
        deadline: Option<NaiveDate>,
        #[arg(long, value_enum, default_value_t = PriorityArg::Medium)]
        priority: PriorityArg,
    },

    /// Replace a todo's text
    Edit {
        id: RecordId,
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Toggle a todo's done flag
    Done { id: RecordId },

    /// Delete a todo
    #[command(name = "rm")]
    Remove { id: RecordId },

    /// Move a todo into the target's slot
    Move { id: RecordId, target: RecordId },

    /// Change a todo's category (blank for uncategorized)
    #[command(name = "recat")]
    Recategorize { id: RecordId, category: Vec<String> },

    /// List categories in use
    Categories,

    /// Show the note log
    Notes,

    /// Append a note
    Note {
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Delete a note
    #[command(name = "rmnote")]
    RemoveNote { id: RecordId },

    /// Show or change the glow preference
    Glow {
        #[arg(value_enum)]
        change: Option<GlowChange>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PriorityArg {
    Low,
    Medium,
    High,
}

impl From<PriorityArg> for Priority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::Low => Priority::Low,
            PriorityArg::Medium => Priority::Medium,
            PriorityArg::High => Priority::High,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum GlowChange {
    On,
    Off,
    Toggle,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::default_path);
    let config = AppConfig::load(&config_path);

    if let Err(e) = glowlist::logging::init_journal("glowlist", cli.debug || config.debug_logging) {
        eprintln!("warning: logging disabled ({})", e);
    }

    let command = cli.command.unwrap_or(Command::List);
    let result = if cli.offline {
        run(MemoryBackend::new(), &config, command).await
    } else if !config.backend_ready() {
        Err(format!(
            "No backend configured. Set backend.url and backend.api_key in {} or {} / {}.",
            config_path.display(),
            glowlist::config::URL_ENV,
            glowlist::config::API_KEY_ENV,
        ))
    } else {
        match RestClient::new(&config.backend.url, &config.backend.api_key) {
            Ok(client) => run(client, &config, command).await,
            Err(e) => Err(format!("Client error: {}", e)),
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run<B>(backend: B, config: &AppConfig, command: Command) -> Result<(), String>
where
    B: DataAccess + Clone + Send + Sync + 'static,
{
    let mut prefs = UiPreferences::load(JsonFileStore::open(&config.preferences_path));

    match command {
        Command::Glow { change } => {
            let enabled = match change {
                None => prefs.glow_enabled(),
                Some(GlowChange::On) => set_glow(&mut prefs, true)?,
                Some(GlowChange::Off) => set_glow(&mut prefs, false)?,
                Some(GlowChange::Toggle) => prefs
                    .toggle_glow()
                    .map_err(|e| e.to_string())?,
            };
            println!("glow: {}", if enabled { "on" } else { "off" });
            Ok(())
        }
        Command::Notes | Command::Note { .. } | Command::RemoveNote { .. } => {
            let scroll = ScrollFollower::new(config.scroll_threshold_px);
            let mut notes = NoteStore::with_scroll(backend, scroll);
            let job = notes.load();
            notes.complete(job).await;
            if let Some(e) = notes.status().error() {
                return Err(format!("Could not load notes: {}", e));
            }
            match command {
                Command::Note { text } => {
                    notes.input = text.join(" ");
                    let job = notes.submit();
                    notes.complete(job).await;
                    if let Some(e) = notes.submit_error() {
                        return Err(e.to_string());
                    }
                }
                Command::RemoveNote { id } => {
                    let job = notes.remove(&id);
                    notes.complete(job).await;
                }
                _ => {}
            }
            print_notes(&notes);
            Ok(())
        }
        command => {
            let mut todos = TodoStore::new(backend);
            let job = todos.load();
            todos.complete(job).await;
            if let Some(e) = todos.status().error() {
                return Err(format!("Could not load todos: {}", e));
            }
            let job = match command {
                Command::Add {
                    text,
                    category,
                    deadline,
                    priority,
                } => {
                    todos.draft.text = text.join(" ");
                    todos.draft.category = category;
                    todos.draft.deadline = deadline;
                    todos.draft.priority = priority.into();
                    todos.submit_draft()
                }
                Command::Edit { id, text } => todos.edit_text(&id, &text.join(" ")),
                Command::Done { id } => todos.toggle_done(&id),
                Command::Remove { id } => todos.remove(&id),
                Command::Move { id, target } => todos.reorder(&id, &target),
                Command::Recategorize { id, category } => todos.recategorize(&id, &category.join(" ")),
                Command::Categories => {
                    for category in todos.categories() {
                        println!("{}", category);
                    }
                    return Ok(());
                }
                _ => None,
            };
            if let Some(job) = job {
                let outcome = job.await;
                if let TodoOutcome::Added { result: Ok(todo), .. } = &outcome {
                    println!("added {}", todo.id);
                }
                todos.on_remote(outcome);
            }
            print_todos(&todos, prefs.glow_enabled());
            Ok(())
        }
    }
}

fn set_glow(prefs: &mut UiPreferences<JsonFileStore>, enabled: bool) -> Result<bool, String> {
    prefs
        .set_glow_enabled(enabled)
        .map_err(|e| e.to_string())?;
    Ok(enabled)
}

fn print_todos<B>(todos: &TodoStore<B>, glow: bool)
where
    B: DataAccess + Clone + Send + Sync + 'static,
{
    let today = chrono::Local::now().date_naive();
    let groups = todos.grouped();
    if groups.is_empty() {
        println!("No todos.");
        return;
    }
    for group in groups {
        println!("{}", group.category);
        for todo in group.todos {
            let mut details = vec![todo.priority.as_str().to_string()];
            if let Some(deadline) = todo.deadline {
                details.push(format!("due {}", deadline));
            }
            let overdue = todo.is_overdue(today);
            if overdue {
                details.push("OVERDUE".to_string());
            }
            let line = format!(
                "  [{}] {}  {}  ({})",
                if todo.done { "x" } else { " " },
                todo.id,
                todo.text,
                details.join(", ")
            );
            if overdue && glow {
                println!("\x1b[1;33m{}\x1b[0m", line);
            } else {
                println!("{}", line);
            }
        }
    }
}

fn print_notes<B>(notes: &NoteStore<B>)
where
    B: DataAccess + Clone + Send + Sync + 'static,
{
    if notes.notes().is_empty() {
        println!("No notes.");
        return;
    }
    for note in notes.notes() {
        println!(
            "{}  {}  {}",
            note.inserted_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M"),
            note.id,
            note.text
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(line: &str) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("glowlist").chain(line.split_whitespace()))
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn add_with_flags() {
        let cli = parse("--offline add buy oat milk --category errands --priority high --deadline 2026-11-02").unwrap();
        assert!(cli.offline);
        assert_eq!(
            cli.command,
            Some(Command::Add {
                text: vec!["buy".to_string(), "oat".to_string(), "milk".to_string()],
                category: "errands".to_string(),
                deadline: NaiveDate::from_ymd_opt(2026, 11, 2),
                priority: PriorityArg::High,
            })
        );
    }

    #[test]
    fn add_defaults_to_medium_and_no_category() {
        let cli = parse("add water plants").unwrap();
        let Some(Command::Add { category, priority, deadline, .. }) = cli.command else {
            panic!("expected an add command");
        };
        assert_eq!(category, "");
        assert_eq!(deadline, None);
        assert_eq!(Priority::from(priority), Priority::Medium);
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = parse("list --debug --config /tmp/glow.json").unwrap();
        assert!(cli.debug);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/glow.json")));
        assert_eq!(cli.command, Some(Command::List));
    }

    #[test]
    fn no_command_parses_to_none() {
        let cli = parse("--debug").unwrap();
        assert!(cli.debug);
        assert_eq!(cli.command, None);
    }

    #[test]
    fn id_commands() {
        assert_eq!(
            parse("move 7 2").unwrap().command,
            Some(Command::Move {
                id: "7".into(),
                target: "2".into()
            })
        );
        assert_eq!(
            parse("edit 3 new text").unwrap().command,
            Some(Command::Edit {
                id: "3".into(),
                text: vec!["new".to_string(), "text".to_string()]
            })
        );
        assert_eq!(
            parse("rmnote 9").unwrap().command,
            Some(Command::RemoveNote { id: "9".into() })
        );
        assert!(parse("done").is_err());
        assert!(parse("note").is_err());
    }

    #[test]
    fn glow_setting_is_optional() {
        assert_eq!(parse("glow").unwrap().command, Some(Command::Glow { change: None }));
        assert_eq!(
            parse("glow toggle").unwrap().command,
            Some(Command::Glow {
                change: Some(GlowChange::Toggle)
            })
        );
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(parse("add x --deadline tomorrow").is_err());
        assert!(parse("add x --priority urgent").is_err());
        assert!(parse("glow bright").is_err());
        assert!(parse("frobnicate").is_err());
    }
}
