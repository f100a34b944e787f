use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::{ensure_pesalens_home, pesalens_home};

/// Category file used when neither the flag nor the config names one.
pub const DEFAULT_CATEGORIES: &str = "configs/categories.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Category definitions to load
    pub categories_path: Option<PathBuf>,
    /// Extra definitions evaluated ahead of `categories_path`
    pub custom_categories_path: Option<PathBuf>,
    /// Counterparties listed per category
    pub top_n: usize,
    /// Filter directive used when neither RUST_LOG nor --verbose is set
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            categories_path: None,
            custom_categories_path: None,
            top_n: 10,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Flag value, then configured value, then the shipped default.
    pub fn categories_path(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.or_else(|| self.categories_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CATEGORIES))
    }

    pub fn custom_categories_path(&self, flag: Option<PathBuf>) -> Option<PathBuf> {
        flag.or_else(|| self.custom_categories_path.clone())
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(pesalens_home()?.join("config.toml"))
}

/// Read the config at `path` (or the default location). A missing file
/// yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let p = effective_config_path(path)?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config(cfg: &Config) -> Result<PathBuf> {
    let p = ensure_pesalens_home()?.join("config.toml");
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(p)
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    let p = save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

/// Config file in effect: the `--config` override, else the default location.
pub fn effective_config_path(path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(p) => Ok(p.to_path_buf()),
        None => config_path(),
    }
}

pub fn show_config(cfg: &Config, path: Option<&Path>) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    println!("# {}", effective_config_path(path)?.display());
    print!("{s}");
    Ok(())
}
