// SPDX-License-Identifier: Apache-2.0 OR MIT
//! `notify-pipe`: forward stdin lines to a notifier, one record per line.

use anyhow::{Context, Result};
use clap::Parser;
use fractal_notify::{Format, Notification, NotifierConfig, NotifierService, Sender};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug, PartialEq)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON5 configuration file; replaces the notifier flags below
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "notify-pipe")]
    service: String,

    #[arg(long, default_value = "default")]
    instance: String,

    /// Write plain messages, not only failures
    #[arg(long)]
    log_all: bool,

    /// Submit from detached tasks
    #[arg(long = "async")]
    async_send: bool,

    /// One JSON object per line instead of tab-separated text
    #[arg(long)]
    json: bool,

    #[arg(long, default_value_t = 100)]
    capacity: usize,

    /// Sender name attached to every line
    #[arg(long, default_value = "stdin")]
    sender: String,

    /// Submit each line as a failure with this code instead of a message
    #[arg(long)]
    code: Option<i32>,

    /// Log file paths, or "stdout"
    endpoints: Vec<String>,
}

impl Args {
    fn notifier_config(&self) -> Result<NotifierConfig> {
        if let Some(path) = &self.config {
            return NotifierConfig::load_from_file(path)
                .with_context(|| format!("loading {}", path.display()));
        }

        let mut config = NotifierConfig::new(&self.service, &self.instance);
        config.log_all = self.log_all;
        config.async_send = self.async_send;
        config.format = if self.json { Format::Json } else { Format::Text };
        config.capacity = self.capacity;
        config.endpoints = self.endpoints.clone();
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("notify=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let notifier = args.notifier_config()?.build(None)?;
    let service = NotifierService::start(Arc::new(notifier)).await?;
    let send = service.sender(&args.sender);

    let stdin = BufReader::new(tokio::io::stdin());
    forward_lines(stdin, &send, args.code, tokio::signal::ctrl_c()).await?;

    service.shutdown().await?;
    Ok(())
}

/// Submit one record per line until EOF or until `stop` resolves.
/// Returns the number of lines forwarded.
async fn forward_lines<R, F>(reader: R, send: &Sender, code: Option<i32>, stop: F) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    F: Future,
{
    let mut lines = reader.lines();
    tokio::pin!(stop);
    let mut forwarded = 0;
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    break;
                };
                match code {
                    // piped lines carry no call site of their own
                    Some(code) => {
                        let _ = send.send(Notification::new(code, line)).await;
                    }
                    None => send.message(line).await,
                }
                forwarded += 1;
            }
            _ = &mut stop => break,
        }
    }
    Ok(forwarded)
}
