//! Peek command implementation

use anyhow::Result;
use clap::Args;
use object_queue_async::AsyncQueue;

/// Print entries from the head without removing them
#[derive(Args, Debug)]
pub struct PeekArgs {
    /// Print up to N entries instead of only the head
    #[arg(short = 'n', long = "count", value_name = "N")]
    count: Option<usize>,
}

/// Execute the peek command
///
/// Without `-n` an empty queue is an error; with it, fewer entries than
/// requested (or none) are printed.
pub fn execute(queue: &AsyncQueue<String>, args: PeekArgs, json: bool) -> Result<()> {
    let entries = match args.count {
        Some(n) => queue.peek_many(n).wait()?,
        None => vec![queue.peek().wait()?],
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "entries": entries }))?);
    } else {
        for entry in &entries {
            println!("{entry}");
        }
    }
    Ok(())
}
