//! Manifest building - which parts must be present, with which extensions

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::path::Path;

use crate::core::rules::{ExtensionSet, FamilyTable, RuleResolver};

/// Classification marker excluding a row from the manifest
pub const NOT_APPLICABLE: &str = "N/A";

/// Fallback manifest used when no ruleset is available
const DEFAULT_MANIFEST: &[(&str, &[&str])] = &[
    ("Piece_1", &["slddrw", "pdf", "igs", "step"]),
    ("Piece_2", &["slddrw", "pdf", "dxf"]),
    ("ENS-BOR-HUL-120-120-A", &["slddrw", "pdf"]),
    ("ENS-EMB-BOR-HUL-120-A", &["slddrw", "pdf"]),
    ("ENS-TET-HUL-120-A", &["slddrw", "pdf"]),
];

/// One row of the external ruleset
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleRow {
    /// Part base filename
    pub identifier: Option<String>,

    /// Family classification, possibly composite
    pub classification: Option<String>,

    /// Path the ruleset declares for the part
    pub declared_path: Option<String>,
}

impl RuleRow {
    pub fn new(identifier: &str, classification: &str, declared_path: Option<&str>) -> Self {
        Self {
            identifier: Some(identifier.to_string()),
            classification: Some(classification.to_string()),
            declared_path: declared_path.map(str::to_string),
        }
    }

    /// Build a row from positional cells: identifier, (unused), classification, path
    pub fn from_cells<S: AsRef<str>>(cells: &[S]) -> Self {
        let cell = |idx: usize| {
            cells
                .get(idx)
                .map(|c| c.as_ref().trim().to_string())
                .filter(|c| !c.is_empty())
        };
        Self {
            identifier: cell(0),
            classification: cell(2),
            declared_path: cell(3),
        }
    }
}

/// Required extensions for one part
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    pub identifier: String,
    pub extensions: ExtensionSet,
}

/// Ordered mapping identifier -> required extensions
///
/// Keeps ruleset row order. Re-inserting an identifier replaces its
/// extensions but keeps its first position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
    index: HashMap<String, usize>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// The hardcoded fallback manifest
    pub fn builtin_default() -> Self {
        DEFAULT_MANIFEST
            .iter()
            .map(|(id, exts)| (id.to_string(), exts.iter().map(|e| e.to_string()).collect()))
            .collect()
    }

    pub fn insert(&mut self, identifier: String, extensions: ExtensionSet) {
        match self.index.get(&identifier) {
            Some(&pos) => self.entries[pos].extensions = extensions,
            None => {
                self.index.insert(identifier.clone(), self.entries.len());
                self.entries.push(ManifestEntry {
                    identifier,
                    extensions,
                });
            }
        }
    }

    pub fn get(&self, identifier: &str) -> Option<&ExtensionSet> {
        self.index
            .get(identifier)
            .map(|&pos| &self.entries[pos].extensions)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, ExtensionSet)> for Manifest {
    fn from_iter<I: IntoIterator<Item = (String, ExtensionSet)>>(iter: I) -> Self {
        let mut manifest = Manifest::new();
        for (identifier, extensions) in iter {
            manifest.insert(identifier, extensions);
        }
        manifest
    }
}

impl Serialize for Manifest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.identifier, &entry.extensions)?;
        }
        map.end()
    }
}

/// Normalize a path string for prefix comparison
///
/// Unifies separators, drops `.` and empty segments, folds `..` and
/// lowercases. Works on the string only, nothing touches the filesystem,
/// so Windows paths from a ruleset normalize the same way on any host.
pub fn normalize_path(path: &str) -> String {
    let unified = path.trim().replace('\\', "/");
    let absolute = unified.starts_with('/');

    let mut parts: Vec<&str> = Vec::new();
    for part in unified.split('/') {
        match part {
            "" | "." => {}
            ".." => match parts.last() {
                Some(last) if *last != ".." => {
                    parts.pop();
                }
                _ if !absolute => parts.push(".."),
                _ => {}
            },
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    let normalized = if absolute {
        format!("/{}", joined)
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    };
    normalized.to_lowercase()
}

/// Builds a manifest from ruleset rows
#[derive(Debug, Clone, Copy)]
pub struct ManifestBuilder<'a> {
    resolver: RuleResolver<'a>,
}

impl<'a> ManifestBuilder<'a> {
    pub fn new(table: &'a FamilyTable) -> Self {
        Self {
            resolver: RuleResolver::new(table),
        }
    }

    /// Build the manifest; the first row is a header and always skipped
    pub fn build(&self, rows: &[RuleRow], target_folder: Option<&Path>) -> Manifest {
        let target = target_folder.map(|p| normalize_path(&p.to_string_lossy()));
        let mut manifest = Manifest::new();

        for (line, row) in rows.iter().enumerate().skip(1) {
            let (identifier, classification) =
                match (non_empty(&row.identifier), non_empty(&row.classification)) {
                    (Some(id), Some(class)) => (id, class),
                    _ => {
                        tracing::debug!(row = line + 1, "skipping row without identifier or family");
                        continue;
                    }
                };

            if classification.to_uppercase() == NOT_APPLICABLE {
                tracing::debug!(row = line + 1, identifier, "skipping not-applicable row");
                continue;
            }

            if let (Some(target), Some(declared)) = (&target, non_empty(&row.declared_path)) {
                if !normalize_path(declared).starts_with(target.as_str()) {
                    tracing::debug!(
                        row = line + 1,
                        identifier,
                        declared,
                        "skipping row outside target folder"
                    );
                    continue;
                }
            }

            let extensions = self.resolver.resolve_extensions(classification);
            manifest.insert(identifier.to_string(), extensions);
        }

        tracing::debug!(parts = manifest.len(), "manifest built");
        manifest
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
