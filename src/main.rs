//! Wordbi Runtime
//!
//! The entry point for the word-learning BI analysis agent. Handles
//! CLI args, config loading, and wiring the store, tools, planner and
//! run loop together.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::Level;

use wordbi::agent::NextPlanAgent;
use wordbi::config::{get_config_path, load_config, resolve_path};
use wordbi::planner::{PlannerDefaults, RulePlanner};
use wordbi::registry::ToolRegistry;
use wordbi::store::{Database, LearningStore};
use wordbi::tools::register_builtin_tools;
use wordbi::types::{default_config, LogLevel, StepRecord, WordbiConfig};

const VERSION: &str = "0.1.0";

/// Wordbi -- Word-Learning BI Analysis Agent
#[derive(Parser, Debug)]
#[command(
    name = "wordbi",
    version = VERSION,
    about = "Word-learning BI analysis agent",
    long_about = "Plan-execute-replan agent over word-learning data. \
                  Give it a free-form request; it picks the analysis tools."
)]
struct Cli {
    /// Run an analysis request, e.g. "分析德语A1单词"
    #[arg(long, value_name = "REQUEST")]
    run: Option<String>,

    /// Populate the database with demo data
    #[arg(long)]
    seed: bool,

    /// List registered analysis tools
    #[arg(long)]
    tools: bool,

    /// Show current configuration and database status
    #[arg(long)]
    status: bool,

    /// Override the configured step ceiling for this run
    #[arg(long, value_name = "N")]
    max_steps: Option<u32>,
}

fn tracing_level(level: LogLevel) -> Level {
    match level {
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Info => Level::INFO,
        LogLevel::Warn => Level::WARN,
        LogLevel::Error => Level::ERROR,
    }
}

fn effective_config() -> WordbiConfig {
    load_config().unwrap_or_else(default_config)
}

fn open_store(config: &WordbiConfig) -> Result<Database> {
    let db_path = resolve_path(&config.db_path);
    Database::open(&db_path).with_context(|| format!("Failed to open database at {db_path}"))
}

// ---- Status Command ---------------------------------------------------------

fn show_status(config: &WordbiConfig) {
    let config_path = get_config_path();
    let configured = if config_path.exists() {
        config_path.display().to_string()
    } else {
        "(defaults, no config file)".to_string()
    };

    println!(
        r#"
=== WORDBI STATUS ===
Config:     {}
DB Path:    {}
Charts:     {}
Max Steps:  {}
User:       {}
Wordbook:   {}
Version:    {}
=====================
"#,
        configured,
        resolve_path(&config.db_path),
        resolve_path(&config.charts_dir),
        config.max_steps,
        config.default_user_id,
        config.default_wordbook_id,
        VERSION,
    );

    match open_store(config) {
        Ok(db) => match db.collection_overview() {
            Ok(overview) => {
                for stats in overview {
                    println!("{}: {} rows", stats.name, stats.row_count);
                }
            }
            Err(e) => eprintln!("Failed to read collections: {}", e),
        },
        Err(e) => eprintln!("Failed to open database: {}", e),
    }
}

// ---- Run Command ------------------------------------------------------------

fn print_record(index: usize, record: &StepRecord) {
    println!("--- step {} [{}] ---", index + 1, record.tool_name);
    if !record.tool_input.is_empty() {
        if let Ok(input) = serde_json::to_string(&record.tool_input) {
            println!("input: {}", input);
        }
    }
    match (&record.output, &record.error) {
        (Some(output), _) => println!("{}", output.summary),
        (None, Some(error)) => println!("error: {}", error),
        (None, None) => {}
    }
}

async fn run_request(config: &WordbiConfig, request: &str, max_steps: Option<u32>) -> Result<()> {
    let store: Arc<dyn LearningStore> = Arc::new(open_store(config)?);

    let mut registry = ToolRegistry::new();
    let charts_dir = resolve_path(&config.charts_dir);
    register_builtin_tools(&mut registry, store, Path::new(&charts_dir));

    let planner = RulePlanner::new(PlannerDefaults {
        user_id: config.default_user_id.clone(),
        wordbook_id: config.default_wordbook_id.clone(),
    });
    let ceiling = max_steps.unwrap_or(config.max_steps).max(1) as usize;
    let agent = NextPlanAgent::new(Arc::new(registry), Arc::new(planner), ceiling);

    // Ctrl+C requests cooperative cancellation; the loop stops before
    // the next dispatch and the partial trace is still printed.
    let cancel = agent.cancel_flag();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupt received, finishing current step...");
            cancel.set();
        }
    });

    let report = agent.run(request).await;

    println!("request: {}", report.request);
    for (index, record) in report.history.iter().enumerate() {
        print_record(index, record);
    }
    println!(
        "--- done: {} ({} steps) ---",
        serde_json::to_string(&report.reason)?.trim_matches('"'),
        report.history.len()
    );
    Ok(())
}

// ---- Entry Point -----------------------------------------------------------

#[tokio::main]
async fn main() {
    let config = effective_config();

    tracing_subscriber::fmt()
        .with_max_level(tracing_level(config.log_level))
        .init();

    let cli = Cli::parse();

    if cli.seed {
        match open_store(&config) {
            Ok(db) => {
                if let Err(e) =
                    db.seed_demo_data(&config.default_user_id, &config.default_wordbook_id)
                {
                    eprintln!("Seeding failed: {}", e);
                    std::process::exit(1);
                }
                println!(
                    "Seeded demo data for user '{}' and wordbook '{}'.",
                    config.default_user_id, config.default_wordbook_id
                );
            }
            Err(e) => {
                eprintln!("Failed to open database: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    if cli.tools {
        let mut registry = ToolRegistry::new();
        match Database::open_in_memory() {
            Ok(db) => {
                let store: Arc<dyn LearningStore> = Arc::new(db);
                let charts_dir = resolve_path(&config.charts_dir);
                register_builtin_tools(&mut registry, store, Path::new(&charts_dir));
                for name in registry.names() {
                    if let Some(tool) = registry.resolve(&name) {
                        println!("{}: {}", name, tool.description());
                    }
                }
            }
            Err(e) => {
                eprintln!("Failed to list tools: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    if cli.status {
        show_status(&config);
        return;
    }

    if let Some(request) = cli.run {
        if let Err(e) = run_request(&config, &request, cli.max_steps).await {
            eprintln!("Fatal: {}", e);
            std::process::exit(1);
        }
        return;
    }

    // Default: show help
    println!("Run \"wordbi --help\" for usage information.");
    println!("Run \"wordbi --seed\" once, then \"wordbi --run <REQUEST>\".");
}
