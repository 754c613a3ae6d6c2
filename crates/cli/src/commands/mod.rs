//! Subcommand implementations.

pub mod bench;
pub mod config_cmd;
pub mod handoff;
pub mod patterns;
pub mod risk;
pub mod run;
pub mod validate;

use std::path::Path;

/// Read and parse a JSON file, naming the file in any error.
pub fn read_json(path: &Path) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let value = serde_json::from_str(&text)
        .map_err(|e| format!("Invalid JSON in {}: {e}", path.display()))?;
    Ok(value)
}
