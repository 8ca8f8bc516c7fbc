use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::sync::broadcast;

use deskpilot_lib::agent_engine::event_bus::AgentEvent;
use deskpilot_lib::agent_engine::state::{RunOutcome, StopFlag};
use deskpilot_lib::agent_engine::usage::{ledger_path, UsageLedger};
use deskpilot_lib::config::{load_config, save_config, AppConfig};
use deskpilot_lib::errors::DeskPilotResult;

#[derive(Parser, Debug)]
#[command(name = "deskpilot", version, about = "Drive the desktop with a vision model")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one natural-language task until the model reports DONE
    Run {
        instruction: String,
        /// Path to config.toml
        #[arg(long)]
        config: Option<PathBuf>,
        /// Override the configured model id
        #[arg(long)]
        model: Option<String>,
    },
    /// Write the default configuration
    InitConfig {
        #[arg(long, default_value = "config.toml")]
        path: PathBuf,
    },
    /// Show accumulated token usage and cost
    Usage {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // .env is optional
    let _ = dotenvy::dotenv();
    deskpilot_lib::init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Run { instruction, config, model } => run(&instruction, config, model).await,
        Command::InitConfig { path } => init_config(&path),
        Command::Usage { config } => show_usage(config),
    };
    if let Err(e) = result {
        tracing::error!(error = %e, "deskpilot failed");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(instruction: &str, config: Option<PathBuf>, model: Option<String>) -> DeskPilotResult<()> {
    let cfg = load_config(config.as_deref())?;
    let mut engine = deskpilot_lib::build_engine(cfg, model.as_deref())?;

    let stop = StopFlag::new();
    let ctrl_c_stop = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl-C received; stopping after the current action");
            ctrl_c_stop.request_stop();
        }
    });

    let mut events = engine.events().subscribe();
    let printer = tokio::spawn(async move {
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            };
            match event {
                AgentEvent::StatusChanged { status } => println!("[{status}]"),
                AgentEvent::ActionExecuted { line, result } => match result {
                    Some(r) => println!("  {line} -> {r}"),
                    None => println!("  {line}"),
                },
                AgentEvent::HintInjected { reasons, suppressed } => {
                    println!("  stuck: {} (actions suppressed: {suppressed})", reasons.join(", "));
                }
                AgentEvent::RunFinished { .. } => break,
                _ => {}
            }
        }
    });

    let outcome = engine.run_task(instruction, &stop).await;
    if outcome.is_ok() {
        // drains until RunFinished
        let _ = printer.await;
    } else {
        printer.abort();
    }
    match outcome? {
        RunOutcome::Completed { turns } => println!("Task completed in {turns} turns."),
        RunOutcome::Cancelled { turns } => println!("Task stopped after {turns} turns."),
        RunOutcome::LimitReached { turns } => println!("Run limit reached after {turns} turns."),
    }
    let ledger = engine.ledger();
    println!(
        "Usage so far: {} input / {} output tokens, ${:.4}",
        ledger.total_input_tokens, ledger.total_output_tokens, ledger.total_cost
    );
    Ok(())
}

fn init_config(path: &std::path::Path) -> DeskPilotResult<()> {
    save_config(&AppConfig::default(), path)?;
    println!("Default configuration written to {}", path.display());
    Ok(())
}

fn show_usage(config: Option<PathBuf>) -> DeskPilotResult<()> {
    let cfg = load_config(config.as_deref())?;
    let path = ledger_path(&cfg.usage);
    let ledger = UsageLedger::load(&path);
    println!("Ledger: {}", path.display());
    println!("Input tokens:  {}", ledger.total_input_tokens);
    println!("Output tokens: {}", ledger.total_output_tokens);
    println!("Total cost:    ${:.4}", ledger.total_cost);
    if let Some(updated) = ledger.updated_at {
        println!("Updated:       {}", updated.to_rfc3339());
    }
    Ok(())
}
