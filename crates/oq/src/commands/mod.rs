//! CLI command dispatch and execution

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use object_queue_async::AsyncQueue;
use object_queue_core::config::{ConfigOverrides, resolve_config};
use object_queue_core::{StringConverter, logging};
use std::path::PathBuf;
use tracing::debug;

mod add;
mod clear;
mod peek;
mod remove;
mod size;

/// oq - inspect and edit durable object queues
#[derive(Parser, Debug)]
#[command(
    name = "oq",
    version,
    about = "Inspect and edit durable object queues",
    long_about = "Opens an object-queue file, runs a single command against it and closes it again. Entries are UTF-8 text."
)]
pub struct Cli {
    /// Queue file to open (created if missing)
    #[arg(long, short = 'f', value_name = "PATH")]
    file: PathBuf,

    /// Configuration file (defaults to $OQ_CONFIG when set)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Skip the fsync after each change
    #[arg(long)]
    no_sync: bool,

    /// Print machine-readable JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Append entries at the tail
    Add(add::AddArgs),

    /// Print the number of entries
    Size,

    /// Print entries from the head without removing them
    Peek(peek::PeekArgs),

    /// Remove entries from the head
    Remove(remove::RemoveArgs),

    /// Remove every entry
    Clear,
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        logging::init();

        let overrides = ConfigOverrides {
            config_path: self.config.clone(),
            sync_writes: self.no_sync.then_some(false),
            ..Default::default()
        };
        let config = resolve_config(&overrides)?;
        debug!(path = %self.file.display(), "opening queue");

        let queue = AsyncQueue::create_persisted_with_config(&self.file, StringConverter, &config)
            .with_context(|| format!("failed to open queue {}", self.file.display()))?;

        let outcome = match self.command {
            Commands::Add(args) => add::execute(&queue, args, self.json),
            Commands::Size => size::execute(&queue, self.json),
            Commands::Peek(args) => peek::execute(&queue, args, self.json),
            Commands::Remove(args) => remove::execute(&queue, args, self.json),
            Commands::Clear => clear::execute(&queue, self.json),
        };

        // Close even when the command failed so the lock is released.
        let closed = queue.close().wait();
        outcome?;
        closed.context("failed to close queue")?;
        Ok(())
    }
}
