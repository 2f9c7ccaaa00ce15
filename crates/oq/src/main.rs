//! oq - inspect and edit durable object queues
//!
//! Every invocation opens the queue file, runs one command through the
//! async facade and closes the queue again, releasing its lock.

use clap::Parser;

mod commands;

use commands::Cli;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = cli.execute() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
