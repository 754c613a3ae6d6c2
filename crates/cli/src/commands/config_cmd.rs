//! `patternlab config`: configuration management commands.

use patternlab_config::AppConfig;
use std::path::{Path, PathBuf};

fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"))
}

pub fn show(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

pub fn path(explicit: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", config_path(explicit).display());
    Ok(())
}

pub fn init(explicit: Option<&Path>, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let path = config_path(explicit);
    write_default(&path, force)?;
    println!("✅ Wrote default config: {}", path.display());
    Ok(())
}

fn write_default(path: &Path, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() && !force {
        return Err(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )
        .into());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, AppConfig::default_toml())?;
    Ok(())
}
