//! Interactive CLI for cloudpilot.
//!
//! Thin delivery layer over the engine: reads a task, shows the computed
//! plan, asks for approval, and prints the apply result. One flow at a time;
//! concurrent flows are an engine capability exercised by library callers.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::Parser;

use cloudpilot::config::Config;
use cloudpilot::{Engine, FlowOutcome, init_tracing};

#[derive(Parser)]
#[command(name = "cloudpilot", version, about = "Turn infrastructure requests into plan-reviewed Terraform")]
struct Cli {
    /// Path to a TOML config file (defaults are used when omitted)
    #[arg(long)]
    config: Option<Utf8PathBuf>,

    /// Enable debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

fn prompt_line(prompt: &str) -> Result<Option<String>> {
    print!("{prompt}");
    io::stdout().flush().context("Failed to flush stdout")?;

    let mut line = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read stdin")?;
    if read == 0 {
        return Ok(None); // EOF
    }
    Ok(Some(line.trim().to_string()))
}

fn render(outcome: &FlowOutcome) {
    match outcome {
        FlowOutcome::Suspended {
            plan_summary,
            last_result,
            last_error,
            ..
        } => {
            if !last_result.is_empty() {
                println!("{last_result}");
            }
            if !last_error.is_empty() {
                eprintln!("Error: {last_error}");
            }
            println!("\n{}", "=".repeat(50));
            println!("Plan Review");
            println!("{}", "=".repeat(50));
            println!("{plan_summary}");
        }
        FlowOutcome::Finished {
            last_result,
            last_error,
            ..
        } => {
            if !last_error.is_empty() {
                eprintln!("\nError: {last_error}");
            } else if !last_result.is_empty() {
                println!("\n{last_result}");
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose).map_err(|e| anyhow::anyhow!("Failed to init logging: {e}"))?;

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    std::fs::create_dir_all(&config.terraform.working_dir).with_context(|| {
        format!(
            "Failed to create working directory: {}",
            config.terraform.working_dir
        )
    })?;

    let backend = cloudpilot::backend_from_config(&config.llm)?;
    let engine = Engine::new(
        Arc::from(backend),
        config.terraform_cli(),
        config.engine_config(),
    );

    println!("=== cloudpilot ===");
    println!("Describe your infrastructure needs; I'll generate Terraform and plan it.");
    println!("Type 'quit', 'exit', or 'q' to end the session.");

    loop {
        let Some(task) = prompt_line("\nTask: ")? else {
            break;
        };
        if task.is_empty() {
            continue;
        }
        if matches!(task.as_str(), "quit" | "exit" | "q") {
            break;
        }

        let mut outcome = engine.start_flow(task).await;
        loop {
            render(&outcome);
            match outcome {
                FlowOutcome::Suspended {
                    flow_id, question, ..
                } => {
                    let answer = prompt_line(&format!("\n{question} (yes/no): "))?
                        .unwrap_or_else(|| "no".to_string());
                    let approved = answer.to_lowercase().starts_with('y');
                    outcome = engine.respond(flow_id, approved).await?;
                }
                FlowOutcome::Finished { .. } => break,
            }
        }
    }

    println!("\n=== Session complete ===");
    Ok(())
}
