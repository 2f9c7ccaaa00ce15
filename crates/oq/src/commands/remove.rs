//! Remove command implementation

use anyhow::Result;
use clap::Args;
use object_queue_async::AsyncQueue;

/// Remove entries from the head
#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Number of entries to remove
    #[arg(short = 'n', long = "count", value_name = "N")]
    count: Option<usize>,
}

/// Execute the remove command
pub fn execute(queue: &AsyncQueue<String>, args: RemoveArgs, json: bool) -> Result<()> {
    let removed = match args.count {
        Some(n) => {
            queue.remove_many(n).wait()?;
            n
        }
        None => {
            queue.remove_one().wait()?;
            1
        }
    };

    if json {
        println!("{}", serde_json::json!({ "removed": removed }));
    } else {
        println!("Removed {removed}");
    }
    Ok(())
}
