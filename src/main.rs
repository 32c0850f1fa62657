//! Main entry point for the zipfan binary.
//!
//! The invocation transport is whatever feeds this process an event: the
//! binary reads one event description (a JSON file or stdin), runs it
//! through the handler, and prints the response JSON on stdout. Logs go to
//! stderr so the response stays machine-readable.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

use zipfan::{Cli, S3Store, UnzipEvent, UnzipHandler};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let raw = if let Some(path) = &cli.event {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading event file {}", path.display()))?
    } else {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("reading event from stdin")?;
        buf
    };
    let event: UnzipEvent = serde_json::from_str(&raw).context("parsing event JSON")?;

    let store = Arc::new(S3Store::from_env(cli.region.clone(), cli.endpoint_url.clone()).await);
    let mut handler = UnzipHandler::new(store);
    if let Some(limit) = cli.concurrency {
        handler = handler.with_max_concurrency(limit);
    }

    let response = handler.handle(&event).await?;

    if !cli.quiet {
        println!("{}", serde_json::to_string_pretty(&response)?);
    }

    Ok(())
}
