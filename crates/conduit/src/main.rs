use std::io::Read;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use conduit_models::Request;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "conduit", about = "Answer a request directly or with tools")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/conduit.toml")]
    config: String,

    /// Request text. Read from stdin when omitted
    request: Option<String>,

    /// Print the full answer as JSON instead of plain text
    #[arg(long)]
    json: bool,

    /// Pretty-print the output JSON
    #[arg(long, requires = "json")]
    pretty: bool,

    /// Give up on the request after this many seconds
    #[arg(long)]
    timeout_seconds: Option<u64>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only the answer (respects RUST_LOG)
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }

    let config = conduit::load_config(&cli.config)?;

    let text = match cli.request {
        Some(text) => text,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            buf
        }
    };
    let request = Request::new(text)?;

    let orchestrator =
        conduit::build_orchestrator(&config).context("Failed to build orchestrator")?;

    let outcome = match cli.timeout_seconds {
        Some(secs) => tokio::time::timeout(
            Duration::from_secs(secs),
            conduit::answer(&orchestrator, &request),
        )
        .await
        .map_err(|_| anyhow::anyhow!("Request timed out after {secs} seconds"))?,
        None => conduit::answer(&orchestrator, &request).await,
    };

    let answer = match outcome {
        Ok(answer) => answer,
        Err(e) => {
            if cli.json {
                let report = conduit::failure_report(&request, &e);
                eprintln!("{}", serde_json::to_string_pretty(&report)?);
            } else if let Some(transcript) = e.transcript() {
                eprintln!("Partial transcript:\nThought: {}", transcript.render_scratchpad());
            }
            return Err(anyhow::anyhow!("Request failed ({}): {e}", e.kind()));
        }
    };

    if cli.json {
        let output = if cli.pretty {
            serde_json::to_string_pretty(&answer)?
        } else {
            serde_json::to_string(&answer)?
        };
        println!("{output}");
    } else {
        println!("{}", answer.text);
    }

    Ok(())
}
