//! Ruleset loading from the parts list spreadsheet
//!
//! Column layout follows the spreadsheet the design office maintains:
//! A = part identifier, B = unused, C = family code, D = declared path.
//! The first row is a header and is left to the manifest builder to skip.
//! Workbooks (`.xlsx`, `.xls`) are read from their first sheet; anything
//! else is read as a CSV export.

use calamine::{open_workbook_auto, Reader};
use csv::ReaderBuilder;
use encoding_rs::{Encoding, WINDOWS_1252};
use serde::Serialize;
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::AuditError;
use crate::core::manifest::{Manifest, ManifestBuilder, RuleRow};
use crate::core::rules::FamilyTable;

/// Default auto-detection prefix for ruleset files
pub const RULESET_PREFIX: &str = "nomenclature_";

/// File extensions recognized as rulesets, lowercase
pub const RULESET_EXTENSIONS: &[&str] = &["xlsx", "xls", "csv"];

const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Where the manifest of an audit came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum RulesetSource {
    /// Path supplied on the command line or in configuration
    Explicit(PathBuf),
    /// Ruleset found in the audited folder
    Detected(PathBuf),
    /// No ruleset, built-in default manifest
    Default,
}

impl RulesetSource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            RulesetSource::Explicit(p) | RulesetSource::Detected(p) => Some(p),
            RulesetSource::Default => None,
        }
    }
}

/// Options controlling ruleset lookup and parsing
#[derive(Debug, Clone)]
pub struct RulesetOptions {
    /// Lowercase file name prefix for auto-detection
    pub prefix: String,

    /// CSV field delimiter; sniffed from the first line when unset
    pub delimiter: Option<u8>,
}

impl Default for RulesetOptions {
    fn default() -> Self {
        Self {
            prefix: RULESET_PREFIX.to_string(),
            delimiter: None,
        }
    }
}

fn lowercase_extension(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

fn is_workbook(path: &Path) -> bool {
    WORKBOOK_EXTENSIONS.contains(&lowercase_extension(path).as_str())
}

/// Guess the delimiter of a spreadsheet export from its first line
fn sniff_delimiter(content: &[u8]) -> u8 {
    let first_line = content.split(|b| *b == b'\n').next().unwrap_or_default();
    let semicolons = first_line.iter().filter(|b| **b == b';').count();
    let commas = first_line.iter().filter(|b| **b == b',').count();
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}

/// Decode a CSV export to text
///
/// A byte order mark wins. Otherwise valid UTF-8 is kept as is and anything
/// else is taken as Windows-1252, the code page spreadsheet tools export in.
fn decode_export(content: &[u8]) -> Cow<'_, str> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(content) {
        return encoding.decode_without_bom_handling(&content[bom_len..]).0;
    }
    match std::str::from_utf8(content) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => WINDOWS_1252.decode_without_bom_handling(content).0,
    }
}

/// Read every row of a ruleset, header included
///
/// Zero rows is a data error.
pub fn load_rows(path: &Path, delimiter: Option<u8>) -> Result<Vec<RuleRow>, AuditError> {
    let rows = if is_workbook(path) {
        read_workbook_rows(path)?
    } else {
        read_csv_rows(path, delimiter)?
    };

    if rows.is_empty() {
        return Err(AuditError::data(path, "file contains no rows"));
    }

    tracing::debug!(path = %path.display(), rows = rows.len(), "ruleset loaded");
    Ok(rows)
}

fn read_csv_rows(path: &Path, delimiter: Option<u8>) -> Result<Vec<RuleRow>, AuditError> {
    let content = fs::read(path).map_err(|e| AuditError::data(path, e))?;
    let text = decode_export(&content);
    let delimiter = delimiter.unwrap_or_else(|| sniff_delimiter(text.as_bytes()));

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| AuditError::data(path, e))?;
        let cells: Vec<&str> = record.iter().collect();
        rows.push(RuleRow::from_cells(&cells));
    }
    Ok(rows)
}

/// Rows of the first sheet, padded so that cells keep their sheet columns
fn read_workbook_rows(path: &Path) -> Result<Vec<RuleRow>, AuditError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| AuditError::data(path, e))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AuditError::data(path, "workbook has no sheet"))?
        .map_err(|e| AuditError::data(path, e))?;

    let Some((first_row, first_col)) = range.start() else {
        return Ok(Vec::new());
    };

    let mut rows: Vec<RuleRow> = (0..first_row).map(|_| RuleRow::from_cells::<&str>(&[])).collect();
    for row in range.rows() {
        let cells: Vec<String> = std::iter::repeat(String::new())
            .take(first_col as usize)
            .chain(row.iter().map(|cell| cell.to_string()))
            .collect();
        rows.push(RuleRow::from_cells(&cells));
    }
    Ok(rows)
}

/// First `<prefix>*.{xlsx,xls,csv}` file in `folder`, by name
pub fn find_ruleset(folder: &Path, prefix: &str) -> Option<PathBuf> {
    let prefix = prefix.to_lowercase();
    let mut candidates: Vec<PathBuf> = fs::read_dir(folder)
        .ok()?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter(|e| {
            let name = e.file_name().to_string_lossy().to_lowercase();
            name.starts_with(&prefix)
                && RULESET_EXTENSIONS
                    .iter()
                    .any(|ext| name.ends_with(&format!(".{}", ext)))
        })
        .map(|e| e.path())
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}

/// Pick the ruleset for `folder`: explicit path, then detection, then default
pub fn select_source(folder: &Path, explicit: Option<&Path>, options: &RulesetOptions) -> RulesetSource {
    if let Some(path) = explicit {
        return RulesetSource::Explicit(path.to_path_buf());
    }
    match find_ruleset(folder, &options.prefix) {
        Some(path) => RulesetSource::Detected(path),
        None => RulesetSource::Default,
    }
}

/// Load the manifest for `folder` from the selected source
///
/// An explicit path that does not exist is a data error, not a silent
/// fallback to the default manifest.
pub fn load_manifest(
    source: &RulesetSource,
    folder: &Path,
    table: &FamilyTable,
    options: &RulesetOptions,
) -> Result<Manifest, AuditError> {
    let Some(path) = source.path() else {
        tracing::debug!("no ruleset found, using built-in default manifest");
        return Ok(Manifest::builtin_default());
    };

    if !path.is_file() {
        return Err(AuditError::data(path, "file not found"));
    }

    let rows = load_rows(path, options.delimiter)?;
    Ok(ManifestBuilder::new(table).build(&rows, Some(folder)))
}
