//! Family classification rules
//!
//! Maps a manufacturing family classification to the file extensions a
//! part of that family must ship with.

use serde::Serialize;

/// Ordered, lowercase extensions (no leading dot) required for one part
pub type ExtensionSet = Vec<String>;

/// Extensions every part needs, whatever its family
pub const BASE_EXTENSIONS: &[&str] = &["slddrw", "pdf"];

/// Built-in family table, in resolution priority order
const BUILTIN_FAMILIES: &[(&str, &[&str], &str)] = &[
    ("FAM0201", &["igs", "stp"], "Laser tube inf 5850 mm"),
    ("FAM0202", &["igs", "stp"], "Laser tube sup 5850 mm"),
    ("FAM0203", &["dxf"], "Tole inf 3000 mm"),
    ("FAM0204", &["dxf"], "Tole sup 3000 mm"),
    ("FAM0206", &["step"], "Tole pliee gde long"),
    ("FAM0207", &["step"], "Tole pliee spe"),
    ("FAM0208", &["step"], "Tole pliee"),
];

/// One family code and the extra extensions it requires
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FamilyRule {
    /// Family code, matched as a substring of the classification
    pub code: String,

    /// Extensions appended after the base set
    pub extensions: Vec<String>,

    /// Human-readable family label
    pub description: String,
}

impl FamilyRule {
    pub fn new(code: &str, extensions: &[&str], description: &str) -> Self {
        Self {
            code: code.to_uppercase(),
            extensions: extensions.iter().map(|e| e.to_lowercase()).collect(),
            description: description.to_string(),
        }
    }
}

/// Immutable rule table injected into the resolver
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FamilyTable {
    /// Extensions required for every part
    pub base: Vec<String>,

    /// Families in priority order
    pub families: Vec<FamilyRule>,
}

impl FamilyTable {
    pub fn new(base: &[&str], families: Vec<FamilyRule>) -> Self {
        Self {
            base: base.iter().map(|e| e.to_lowercase()).collect(),
            families,
        }
    }

    /// The compiled-in table
    pub fn builtin() -> Self {
        let families = BUILTIN_FAMILIES
            .iter()
            .map(|(code, exts, label)| FamilyRule::new(code, exts, label))
            .collect();
        Self::new(BASE_EXTENSIONS, families)
    }
}

impl Default for FamilyTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Resolves a classification string into its required extensions.
///
/// Resolution is first-match-wins over the table's declared order: a
/// composite classification containing two known codes only gets the
/// extensions of the one declared first. This is kept on purpose and can
/// surprise when families are reordered.
#[derive(Debug, Clone, Copy)]
pub struct RuleResolver<'a> {
    table: &'a FamilyTable,
}

impl<'a> RuleResolver<'a> {
    pub fn new(table: &'a FamilyTable) -> Self {
        Self { table }
    }

    /// First family whose code appears in the classification, if any
    pub fn matched_family(&self, classification: &str) -> Option<&'a FamilyRule> {
        let normalized = classification.trim().to_uppercase();
        self.table
            .families
            .iter()
            .find(|family| normalized.contains(family.code.as_str()))
    }

    /// Base extensions followed by the matched family's extensions
    pub fn resolve_extensions(&self, classification: &str) -> ExtensionSet {
        let mut extensions = self.table.base.clone();
        if let Some(family) = self.matched_family(classification) {
            extensions.extend(family.extensions.iter().cloned());
        }
        extensions
    }
}
