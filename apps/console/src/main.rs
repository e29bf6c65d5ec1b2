use std::{
    io::{self, Write},
    path::PathBuf,
    process::ExitCode,
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{QueryClient, Submission, SubmissionController, ViewState};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod render;

use config::load_settings;

const SAMPLE_QUESTIONS: &[&str] = &[
    "urls when pawan scored a raid point when his team was lagging behind by 2 points or more and when there was less than 15 raids left in the game",
    "I want to know total raids of Pawan Sherawat_RIN_TT17",
    "match urls where pawan scored a bonus and got a defender out",
];

#[derive(Parser, Debug)]
#[command(
    name = "nl2sql",
    version,
    about = "Ask questions about your database in natural language"
)]
struct Cli {
    /// Service base URL; overrides config file and environment.
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Config file to load instead of ./nl2sql.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Request timeout in seconds, 0 for none.
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    /// Print view states as JSON.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ask a single question and exit.
    Ask {
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// Read questions from stdin, one per line.
    Shell,
    /// Check whether the service is up.
    Health,
    /// List example questions.
    Samples,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    if let Command::Samples = cli.command {
        for sample in SAMPLE_QUESTIONS {
            println!("{sample}");
        }
        return Ok(ExitCode::SUCCESS);
    }

    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(base_url) = cli.base_url {
        settings.base_url = base_url;
    }
    if let Some(timeout_secs) = cli.timeout_secs {
        settings.request_timeout_secs = timeout_secs;
    }

    let client = QueryClient::new(settings.client_settings()?)?;
    info!(server_url = client.server_url(), "client configured");

    match cli.command {
        Command::Ask { question } => {
            let controller = SubmissionController::new(Arc::new(client));
            let state = ask(&controller, &question.join(" "), cli.json).await?;
            Ok(match state {
                ViewState::Failure { .. } => ExitCode::FAILURE,
                _ => ExitCode::SUCCESS,
            })
        }
        Command::Shell => {
            let controller = SubmissionController::new(Arc::new(client));
            shell(&controller, cli.json).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Health => {
            let health = client
                .health()
                .await
                .with_context(|| format!("health check against {} failed", client.server_url()))?;
            println!("{} ({})", health.status, client.server_url());
            if health.is_healthy() {
                Ok(ExitCode::SUCCESS)
            } else {
                warn!(status = %health.status, "service reports unhealthy");
                Ok(ExitCode::FAILURE)
            }
        }
        Command::Samples => Ok(ExitCode::SUCCESS),
    }
}

/// Submits one question, showing progress from the published state, and
/// renders the final state. Empty questions render nothing.
async fn ask(controller: &SubmissionController, question: &str, json: bool) -> Result<ViewState> {
    let mut updates = controller.subscribe();
    let submit = controller.submit(question);
    tokio::pin!(submit);

    let submission = loop {
        tokio::select! {
            submission = &mut submit => break submission,
            Ok(()) = updates.changed() => {
                if !json && updates.borrow_and_update().is_loading() {
                    eprintln!("Processing...");
                }
            }
        }
    };

    let state = controller.state();
    if submission == Submission::Completed {
        let mut out = io::stdout().lock();
        if json {
            render::render_json(&state, &mut out)?;
        } else {
            render::render(&state, &mut out)?;
        }
        out.flush()?;
    }
    Ok(state)
}

async fn shell(controller: &SubmissionController, json: bool) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("> ");
        io::stderr().flush()?;

        let Some(line) = lines.next_line().await.context("failed to read question")? else {
            break;
        };
        if matches!(line.trim(), "exit" | "quit") {
            break;
        }
        ask(controller, &line, json).await?;
    }
    Ok(())
}
