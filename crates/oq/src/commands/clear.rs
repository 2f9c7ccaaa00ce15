//! Clear command implementation

use anyhow::Result;
use object_queue_async::AsyncQueue;

/// Execute the clear command
pub fn execute(queue: &AsyncQueue<String>, json: bool) -> Result<()> {
    let cleared = queue.size().wait()?;
    queue.clear().wait()?;

    if json {
        println!("{}", serde_json::json!({ "cleared": cleared }));
    } else {
        println!("Cleared {cleared} entries");
    }
    Ok(())
}
