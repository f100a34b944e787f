use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$PESALENS_HOME`, else `~/.pesalens`.
pub fn pesalens_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("PESALENS_HOME") {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".pesalens"))
}

pub fn ensure_pesalens_home() -> Result<PathBuf> {
    let dir = pesalens_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
