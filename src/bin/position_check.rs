use std::process::ExitCode;

use glowlist::config::AppConfig;
use glowlist::core::todo::Todo;
use glowlist::core::view::{position_report, renumber, sorted_by_position};
use glowlist::sync::ordering::persist_positions;
use glowlist::sync::rest::RestClient;
use glowlist::sync::{DataAccess, Table, from_rows};

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let fix = args.iter().any(|a| a == "--fix");

    let config = AppConfig::load(&AppConfig::default_path());
    if let Err(e) = glowlist::logging::init_journal("glowlist-position-check", config.debug_logging) {
        eprintln!("warning: logging disabled ({})", e);
    }

    println!("=== Remote todo positions ===\n");

    if !config.backend_ready() {
        println!("No backend configured.");
        return ExitCode::FAILURE;
    }

    let client = match RestClient::new(&config.backend.url, &config.backend.api_key) {
        Ok(c) => c,
        Err(e) => {
            println!("Client error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let todos: Vec<Todo> = match client
        .select_all(Table::Todos, "position", true)
        .await
        .and_then(from_rows::<Todo>)
    {
        Ok(t) => t,
        Err(e) => {
            println!("Error listing todos: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("Remote: {} todos", todos.len());

    let report = position_report(&todos);
    if report.is_dense() {
        println!("Positions are dense (0..{}).", todos.len());
        return ExitCode::SUCCESS;
    }

    if !report.missing.is_empty() {
        println!("\n  MISSING POSITION ({}):", report.missing.len());
        for id in &report.missing {
            println!("    {}", id);
        }
    }

    if !report.duplicates.is_empty() {
        println!("\n  DUPLICATE POSITIONS:");
        for (position, ids) in &report.duplicates {
            let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
            println!("    {} held by {}", position, ids.join(", "));
        }
    }

    if !report.gaps.is_empty() {
        let gaps: Vec<String> = report
            .gaps
            .iter()
            .map(|&(from, to)| {
                if from == to {
                    from.to_string()
                } else {
                    format!("{}..={}", from, to)
                }
            })
            .collect();
        println!("\n  GAPS: {}", gaps.join(", "));
    }

    if !fix {
        println!("\nRun with --fix to renumber in current order.");
        return ExitCode::FAILURE;
    }

    let mut ordered: Vec<Todo> = sorted_by_position(&todos).into_iter().cloned().collect();
    renumber(&mut ordered);
    match persist_positions(&client, &ordered).await {
        Ok(()) => {
            println!("\nRenumbered {} todos.", ordered.len());
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("\nRenumbering incomplete: {}", e);
            ExitCode::FAILURE
        }
    }
}
