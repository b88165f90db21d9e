//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::core::ruleset::{RulesetOptions, RULESET_PREFIX};

/// Name of the folder-local configuration file
pub const FOLDER_CONFIG: &str = ".dossier.yaml";

/// Dossier configuration with layered hierarchy
///
/// Only the outer tooling is configurable. Family tables and suffix lists
/// are compiled in.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ruleset used when none is given on the command line
    pub ruleset: Option<PathBuf>,

    /// File name prefix used to auto-detect a ruleset in the audited folder
    pub ruleset_prefix: Option<String>,

    /// CSV delimiter (single character)
    pub csv_delimiter: Option<char>,

    /// Default output format
    pub default_format: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load(folder: &Path) -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (already in Default impl)

        // 2. Global user config (~/.config/dossier/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        // 3. Folder config (.dossier.yaml next to the deliverables)
        if let Some(mut local) = Self::read_file(&folder.join(FOLDER_CONFIG)) {
            local.anchor_ruleset(folder);
            config.merge(local);
        }

        // 4. Environment variables
        if let Ok(ruleset) = std::env::var("DOSSIER_RULESET") {
            config.ruleset = Some(PathBuf::from(ruleset));
        }
        if let Ok(format) = std::env::var("DOSSIER_FORMAT") {
            config.default_format = Some(format);
        }

        config
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "dossier")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "config unreadable, skipped");
                return None;
            }
        };
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "config malformed, skipped");
                None
            }
        }
    }

    /// Relative ruleset paths in a folder config are relative to that folder
    fn anchor_ruleset(&mut self, folder: &Path) {
        if let Some(ruleset) = self.ruleset.as_mut() {
            if ruleset.is_relative() {
                *ruleset = folder.join(&*ruleset);
            }
        }
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.ruleset.is_some() {
            self.ruleset = other.ruleset;
        }
        if other.ruleset_prefix.is_some() {
            self.ruleset_prefix = other.ruleset_prefix;
        }
        if other.csv_delimiter.is_some() {
            self.csv_delimiter = other.csv_delimiter;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
    }

    /// Ruleset lookup options derived from this configuration
    pub fn ruleset_options(&self) -> RulesetOptions {
        RulesetOptions {
            prefix: self
                .ruleset_prefix
                .as_deref()
                .unwrap_or(RULESET_PREFIX)
                .to_lowercase(),
            delimiter: self
                .csv_delimiter
                .filter(char::is_ascii)
                .map(|c| c as u8),
        }
    }
}
