//! Add command implementation

use anyhow::Result;
use clap::Args;
use object_queue_async::AsyncQueue;

/// Append entries at the tail
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Entries to append, in order
    #[arg(required = true)]
    entries: Vec<String>,
}

/// Execute the add command
pub fn execute(queue: &AsyncQueue<String>, args: AddArgs, json: bool) -> Result<()> {
    let count = args.entries.len();

    // Submit everything first; the worker keeps them in order.
    let handles: Vec<_> = args.entries.into_iter().map(|entry| queue.add(entry)).collect();
    for handle in handles {
        handle.wait()?;
    }

    if json {
        println!("{}", serde_json::json!({ "added": count }));
    } else {
        println!("Added {count} entr{}", if count == 1 { "y" } else { "ies" });
    }
    Ok(())
}
