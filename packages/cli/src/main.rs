//! Console demonstration of the gen-server registry.
//!
//! Spawns one worker, waits for a line of input, prints the registry,
//! terminates the worker and waits for a second line before exiting.

use actors::{FnDispatcher, start_supervisor};
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let supervisor = start_supervisor::<String>().await?;
    supervisor.spawn(
        "REAL",
        FnDispatcher::new(|message: String| {
            println!("Callback... {}", message);
            Ok(())
        }),
    )?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    lines.next_line().await?;

    println!("{}", serde_json::to_string_pretty(&supervisor.registry().snapshot())?);
    supervisor.terminate("REAL").await;

    lines.next_line().await?;
    Ok(())
}
