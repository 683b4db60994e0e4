pub mod compose;
pub mod config;
pub mod feedback;
pub mod stats;
pub mod verify;

use std::io::Read;

use anyhow::{Context, Result};
use composer_core::SourceChunk;

/// Read a JSON array of chunks from `source`, or stdin when it is `-`
pub fn read_chunks(source: &str) -> Result<Vec<SourceChunk>> {
    let contents = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read chunks from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source)
            .with_context(|| format!("Failed to read chunks file {}", source))?
    };

    serde_json::from_str(&contents).context("Chunks must be a JSON array of {text, source, score}")
}

/// Print `value` as pretty JSON on stdout
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
