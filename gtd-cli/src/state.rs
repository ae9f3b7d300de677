use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// State directory: `$GTD_HOME`, else `~/.gtd`.
pub fn gtd_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("GTD_HOME") {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".gtd"))
}

pub fn ensure_gtd_home() -> Result<PathBuf> {
    let dir = gtd_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn default_db_path() -> Result<PathBuf> {
    Ok(ensure_gtd_home()?.join("gtd.db"))
}
