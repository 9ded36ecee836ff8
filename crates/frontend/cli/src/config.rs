use crate::Args;
use anyhow::{anyhow, Context, Result};
use dmg_core::logging::{LogCategory, LogConfig, LogLevel};
use dmg_core::timing::FrameTiming;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Run settings. Every field is optional in the JSON file; command-line
/// flags override whatever the file says.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub boot_rom: Option<PathBuf>,
    pub timing: FrameTiming,
    /// Pace frames to the display refresh rate
    pub throttle: bool,
    pub log_level: String,
    /// category name -> level name
    pub log_categories: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            boot_rom: None,
            timing: FrameTiming::Refresh,
            throttle: true,
            log_level: "info".to_string(),
            log_categories: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Defaults when no file is given; a named file must exist and parse.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse settings file {}", path.display()))
    }

    pub fn apply_args(&mut self, args: &Args) -> Result<()> {
        if let Some(boot_rom) = &args.boot_rom {
            self.boot_rom = Some(boot_rom.clone());
        }
        if let Some(timing) = args.timing {
            self.timing = timing;
        }
        if args.unthrottled {
            self.throttle = false;
        }
        if let Some(level) = &args.log_level {
            self.log_level = level.clone();
        }
        for entry in &args.log {
            let (category, level) = entry
                .split_once('=')
                .ok_or_else(|| anyhow!("expected CATEGORY=LEVEL, got {:?}", entry))?;
            self.log_categories
                .insert(category.trim().to_string(), level.trim().to_string());
        }
        Ok(())
    }

    /// Validate the level names into typed values.
    pub fn resolve_levels(&self) -> Result<(LogLevel, Vec<(LogCategory, LogLevel)>)> {
        let global = LogLevel::from_str(&self.log_level)
            .ok_or_else(|| anyhow!("unknown log level {:?}", self.log_level))?;

        let categories = self
            .log_categories
            .iter()
            .map(|(category, level)| -> Result<(LogCategory, LogLevel)> {
                let cat = LogCategory::from_str(category)
                    .ok_or_else(|| anyhow!("unknown log category {:?}", category))?;
                let lvl = LogLevel::from_str(level)
                    .ok_or_else(|| anyhow!("unknown log level {:?} for {}", level, category))?;
                Ok((cat, lvl))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok((global, categories))
    }

    /// Push the resolved levels into the process-wide log configuration.
    pub fn apply_logging(&self) -> Result<()> {
        let (global, categories) = self.resolve_levels()?;
        let config = LogConfig::global();
        config.set_global_level(global);
        for (category, level) in categories {
            config.set_level(category, level);
        }
        Ok(())
    }
}

pub fn parse_timing(s: &str) -> Result<FrameTiming, String> {
    match s.to_lowercase().as_str() {
        "refresh" => Ok(FrameTiming::Refresh),
        "scanline" => Ok(FrameTiming::Scanline),
        other => Err(format!("unknown timing {:?} (expected refresh or scanline)", other)),
    }
}

/// `log` filter wide enough for everything the core may emit.
pub fn level_filter(level: LogLevel) -> log::LevelFilter {
    level
        .to_log_level()
        .map_or(log::LevelFilter::Off, |l| l.to_level_filter())
}
