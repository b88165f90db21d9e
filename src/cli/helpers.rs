//! Shared helper functions for CLI commands
//!
//! Folder resolution and ruleset selection are the same for `check` and
//! `manifest`, so both go through [`AuditContext`].

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::{Path, PathBuf};

use crate::cli::GlobalOpts;
use crate::core::{
    ensure_folder, load_manifest, select_source, Config, FamilyTable, Manifest, RulesetSource,
};

/// Everything resolved before a folder can be audited
#[derive(Debug)]
pub struct AuditContext {
    pub folder: PathBuf,
    pub config: Config,
    pub source: RulesetSource,
    pub manifest: Manifest,
}

impl AuditContext {
    /// Resolve folder, configuration, ruleset and manifest
    ///
    /// Fails before anything is printed when the folder is missing or the
    /// ruleset is unusable.
    pub fn prepare(folder: Option<&Path>, rules: Option<&Path>, table: &FamilyTable) -> Result<Self> {
        let folder = resolve_folder(folder)?;
        ensure_folder(&folder)?;

        let config = Config::load(&folder);
        let options = config.ruleset_options();
        let explicit = rules.map(Path::to_path_buf).or_else(|| config.ruleset.clone());
        let source = select_source(&folder, explicit.as_deref(), &options);
        tracing::debug!(?source, "ruleset selected");

        let manifest = load_manifest(&source, &folder, table, &options)?;

        Ok(Self {
            folder,
            config,
            source,
            manifest,
        })
    }
}

/// Make the audited folder absolute so ruleset paths can be compared to it
pub fn resolve_folder(folder: Option<&Path>) -> Result<PathBuf> {
    match folder {
        Some(path) => std::path::absolute(path).into_diagnostic(),
        None => std::env::current_dir().into_diagnostic(),
    }
}

/// One line describing where the rules came from
pub fn describe_source(source: &RulesetSource) -> String {
    match source.path() {
        Some(path) => format!(
            "Fichier de règles utilisé: {}",
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string())
        ),
        None => "Utilisation des règles par défaut".to_string(),
    }
}

/// Progress line on stderr, silenced by --quiet
pub fn progress(global: &GlobalOpts, message: &str) {
    if !global.quiet {
        eprintln!("{} {}", style("→").blue(), message);
    }
}
