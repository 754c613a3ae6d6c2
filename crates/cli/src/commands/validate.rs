//! `patternlab validate`: check a JSON payload against a schema.

use super::read_json;
use patternlab_shared::SchemaKind;
use std::path::Path;

pub fn run(schema: &str, file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let kind: SchemaKind = schema.parse()?;
    let payload = read_json(file)?;

    match kind.validate_json(&payload) {
        Ok(normalized) => {
            println!("✅ {} is a valid {kind}", file.display());
            println!("{}", serde_json::to_string_pretty(&normalized)?);
            Ok(())
        }
        Err(e) => {
            println!("❌ {}: {e}", file.display());
            for v in e.violations() {
                println!("   - {v}");
            }
            Err(e.into())
        }
    }
}
