//! `patternlab handoff`: restore, merge and summarize context packages.

use super::read_json;
use patternlab_shared::fixtures::sample_handoff;
use patternlab_shared::{ContextPackage, merge_contexts, restore_context};
use std::path::{Path, PathBuf};

pub fn load_packages(
    file: Option<&Path>,
    merge: &[PathBuf],
) -> Result<ContextPackage, Box<dyn std::error::Error>> {
    let first = match file {
        Some(path) => restore_context(&read_json(path)?)
            .map_err(|e| format!("{}: {e}", path.display()))?,
        None => sample_handoff(),
    };
    if merge.is_empty() {
        return Ok(first);
    }

    let mut packages = vec![first];
    for path in merge {
        packages.push(
            restore_context(&read_json(path)?).map_err(|e| format!("{}: {e}", path.display()))?,
        );
    }
    Ok(merge_contexts(&packages)?)
}

pub fn run(
    file: Option<&Path>,
    merge: &[PathBuf],
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let package = load_packages(file, merge)?;

    if json {
        println!("{}", package.to_json()?);
        return Ok(());
    }

    println!("🤝 {}", package.summary());
    println!();
    println!("{}", package.report());

    let points = package.key_points();
    if !points.is_empty() {
        println!();
        println!("Key points:");
        for p in points {
            println!("  • {p}");
        }
    }
    Ok(())
}
