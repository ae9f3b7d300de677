use anyhow::{Context, Result, bail};
use gtd_core::{DEFAULT_SIMILARITY_THRESHOLD, due::DEFAULT_WINDOW_HOURS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::ensure_gtd_home;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreSection,
    pub merge: MergeSection,
    pub reminders: RemindersSection,
    pub time: TimeSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// SQLite file. Defaults to ~/.gtd/gtd.db.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeSection {
    pub threshold: f64,
    /// Run the duplicate check after every `gtd create`.
    pub auto_on_create: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemindersSection {
    pub window_hours: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeSection {
    /// IANA zone used to read dates typed without an offset.
    pub timezone: String,
}

impl Default for MergeSection {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
            auto_on_create: false,
        }
    }
}

impl Default for RemindersSection {
    fn default() -> Self {
        Self {
            window_hours: DEFAULT_WINDOW_HOURS,
        }
    }
}

impl Default for TimeSection {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
        }
    }
}

impl Config {
    /// Reject values that would make merging or reminders misbehave.
    pub fn validate(&self) -> Result<()> {
        let threshold = self.merge.threshold;
        if !(0.0..=1.0).contains(&threshold) {
            bail!("[merge] threshold must be within 0..=1 (got {threshold})");
        }
        if self.reminders.window_hours <= 0 {
            bail!("[reminders] window_hours must be positive (got {})", self.reminders.window_hours);
        }
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_gtd_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(p: &Path) -> Result<Config> {
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    let cfg: Config = toml::from_str(&s).with_context(|| format!("parse {}", p.display()))?;
    cfg.validate().with_context(|| format!("invalid {}", p.display()))?;
    Ok(cfg)
}

pub fn save_config_to(cfg: &Config, p: &Path) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config_to(&Config::default(), &p)?;
    println!("Wrote {}", p.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.merge.threshold, 0.8);
        assert!(!cfg.merge.auto_on_create);
        assert_eq!(cfg.reminders.window_hours, 48);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg: Config = toml::from_str(
            r#"
[merge]
auto_on_create = true

[time]
timezone = "America/Chicago"
"#,
        )
        .unwrap();
        assert!(cfg.merge.auto_on_create);
        assert_eq!(cfg.merge.threshold, 0.8);
        assert_eq!(cfg.time.timezone, "America/Chicago");
        assert_eq!(cfg.store.path, None);
    }

    #[test]
    fn out_of_range_threshold_is_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("config.toml");
        for bad in ["nan", "1.5", "-0.1"] {
            fs::write(&p, format!("[merge]\nthreshold = {bad}\nauto_on_create = true\n")).unwrap();
            assert!(load_config_from(&p).is_err(), "threshold {bad} accepted");
        }
        fs::write(&p, "[merge]\nthreshold = 1.0\n").unwrap();
        assert_eq!(load_config_from(&p).unwrap().merge.threshold, 1.0);
    }

    #[test]
    fn non_positive_window_is_rejected() {
        let mut cfg = Config::default();
        cfg.reminders.window_hours = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.store.path = Some(dir.path().join("tasks.db"));
        cfg.merge.threshold = 0.9;
        save_config_to(&cfg, &p).unwrap();
        assert_eq!(load_config_from(&p).unwrap(), cfg);
    }
}
