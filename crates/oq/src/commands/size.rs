//! Size command implementation

use anyhow::Result;
use object_queue_async::AsyncQueue;

/// Execute the size command
pub fn execute(queue: &AsyncQueue<String>, json: bool) -> Result<()> {
    let size = queue.size().wait()?;

    if json {
        println!("{}", serde_json::json!({ "size": size }));
    } else {
        println!("{size}");
    }
    Ok(())
}
