use std::io::Write;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use tracing::info;

use openknowledge_api::{logging, router};
use openknowledge_common::{Config, Query, StreamEvent};
use openknowledge_engine::build_coordinator;

#[derive(Parser)]
#[command(name = "openknowledge", about = "Stream learning resources from several sources at once")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one search and print each source's results as a JSON line.
    Search {
        /// What you want to learn.
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Serve `GET /search?query=...` as a newline-delimited JSON stream.
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init()?;

    let cli = Cli::parse();
    let config = Config::from_env().context("loading configuration")?;
    config.log_redacted();

    let coordinator = build_coordinator(&config)?;

    match cli.command {
        Command::Search { query } => {
            let query = Query::parse(&query.join(" "))?;
            let mut events = Box::pin(coordinator.start(query));
            let mut stdout = std::io::stdout().lock();
            while let Some(event) = events.next().await {
                serde_json::to_writer(&mut stdout, &StreamEvent::from(&event))?;
                stdout.write_all(b"\n")?;
                stdout.flush()?;
            }
        }
        Command::Serve => {
            let addr = format!("{}:{}", config.api_host, config.api_port);
            info!("OpenKnowledge API starting on {addr}");

            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("binding {addr}"))?;
            axum::serve(listener, router(coordinator)).await?;
        }
    }

    Ok(())
}
