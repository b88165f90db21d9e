//! Folder audit - missing, stale and unverified deliverables

use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

use crate::core::config::FOLDER_CONFIG;
use crate::core::error::AuditError;
use crate::core::listing::{list_directory, normalize_name, DirectoryEntry, LOCK_PREFIX};
use crate::core::manifest::Manifest;

/// CAD authoring files whose exports must not be older than them
pub const SOURCE_SUFFIXES: &[&str] = &["sldprt", "sldasm"];

/// Files never reported as unverified
pub const IGNORED_SUFFIXES: &[&str] = &["slddrw", "xlsx", "xls", "csv", "bat", "ico", "reg"];

/// Fixed suffix tables used by the auditor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditPolicy {
    /// Authoring file suffixes checked for staleness
    pub source_suffixes: Vec<String>,

    /// Administrative suffixes excluded from the unverified list
    pub ignored_suffixes: Vec<String>,

    /// Prefix of transient lock files left out of the listing
    pub lock_prefix: String,

    /// This tool's own files, never reported as unverified
    pub tool_files: Vec<String>,
}

impl AuditPolicy {
    pub fn builtin() -> Self {
        Self {
            source_suffixes: SOURCE_SUFFIXES.iter().map(|s| s.to_string()).collect(),
            ignored_suffixes: IGNORED_SUFFIXES.iter().map(|s| s.to_string()).collect(),
            lock_prefix: LOCK_PREFIX.to_string(),
            tool_files: vec![FOLDER_CONFIG.to_string()],
        }
    }

    /// `key` must already be normalized
    fn is_source(&self, key: &str) -> bool {
        self.source_suffixes.iter().any(|s| has_suffix(key, s))
    }

    fn is_exempt(&self, key: &str) -> bool {
        self.is_source(key)
            || self.ignored_suffixes.iter().any(|s| has_suffix(key, s))
            || self.tool_files.iter().any(|f| normalize_name(f) == key)
    }
}

impl Default for AuditPolicy {
    fn default() -> Self {
        Self::builtin()
    }
}

fn has_suffix(key: &str, suffix: &str) -> bool {
    key.strip_suffix(normalize_name(suffix).as_str())
        .is_some_and(|rest| rest.ends_with('.'))
}

fn artifact_key(stem: &str, extension: &str) -> String {
    normalize_name(&format!("{}.{}", stem, extension))
}

/// Outcome of one audit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    /// "ID (manque : ext, ext)" per incomplete part
    pub missing: Vec<String>,

    /// "source (plus récent que artifact)" per outdated export
    pub stale: Vec<String>,

    /// Files no manifest entry accounts for
    pub unverified: Vec<String>,
}

impl AuditReport {
    /// Stale and unverified findings never affect this
    pub fn all_required_present(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.stale.is_empty() || !self.unverified.is_empty()
    }
}

/// Checks a directory listing against a manifest
#[derive(Debug, Clone, Copy)]
pub struct FolderAuditor<'a> {
    policy: &'a AuditPolicy,
}

impl<'a> FolderAuditor<'a> {
    pub fn new(policy: &'a AuditPolicy) -> Self {
        Self { policy }
    }

    /// List `folder` and audit it
    pub fn audit_folder(&self, manifest: &Manifest, folder: &Path) -> Result<AuditReport, AuditError> {
        let entries = list_directory(folder, &self.policy.lock_prefix)?;
        Ok(self.audit(manifest, &entries))
    }

    pub fn audit(&self, manifest: &Manifest, entries: &[DirectoryEntry]) -> AuditReport {
        let keys: Vec<String> = entries.iter().map(DirectoryEntry::key).collect();
        let mut by_key: HashMap<&str, usize> = HashMap::with_capacity(keys.len());
        for (idx, key) in keys.iter().enumerate() {
            by_key.entry(key.as_str()).or_insert(idx);
        }

        let mut checked = vec![false; entries.len()];
        let mut report = AuditReport::default();

        for part in manifest.iter() {
            let stem = normalize_name(&part.identifier);
            let prefix = format!("{}.", stem);

            let missing: Vec<&str> = part
                .extensions
                .iter()
                .filter(|ext| !by_key.contains_key(artifact_key(&stem, ext).as_str()))
                .map(String::as_str)
                .collect();

            if !missing.is_empty() {
                report.missing.push(format!(
                    "{} (manque : {})",
                    part.identifier,
                    missing.join(", ")
                ));
                continue;
            }

            for (idx, key) in keys.iter().enumerate() {
                if key.starts_with(&prefix) {
                    checked[idx] = true;
                }
            }

            for (idx, key) in keys.iter().enumerate() {
                if !key.starts_with(&prefix) || !self.policy.is_source(key) {
                    continue;
                }
                let source = &entries[idx];
                for ext in &part.extensions {
                    let Some(&artifact_idx) = by_key.get(artifact_key(&stem, ext).as_str()) else {
                        continue;
                    };
                    let artifact = &entries[artifact_idx];
                    if source.modified > artifact.modified {
                        report.stale.push(format!(
                            "{} (plus récent que {})",
                            source.name, artifact.name
                        ));
                    }
                }
            }
        }

        for (idx, entry) in entries.iter().enumerate() {
            if !checked[idx] && !self.policy.is_exempt(&keys[idx]) {
                report.unverified.push(entry.name.clone());
            }
        }

        tracing::debug!(
            missing = report.missing.len(),
            stale = report.stale.len(),
            unverified = report.unverified.len(),
            "audit complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    fn at(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn manifest(parts: &[(&str, &[&str])]) -> Manifest {
        parts
            .iter()
            .map(|(id, exts)| (id.to_string(), exts.iter().map(|e| e.to_string()).collect()))
            .collect()
    }

    fn audit(manifest: &Manifest, entries: &[DirectoryEntry]) -> AuditReport {
        let policy = AuditPolicy::builtin();
        FolderAuditor::new(&policy).audit(manifest, entries)
    }

    #[test]
    fn test_missing_artifact_is_reported() {
        let m = manifest(&[("PART1", &["pdf", "slddrw"])]);
        let report = audit(&m, &[DirectoryEntry::new("part1.pdf", at(10))]);

        assert_eq!(report.missing, vec!["PART1 (manque : slddrw)"]);
        assert!(!report.all_required_present());
    }

    #[test]
    fn test_all_missing_extensions_are_listed() {
        let m = manifest(&[("P", &["slddrw", "pdf", "dxf"])]);
        let report = audit(&m, &[DirectoryEntry::new("P.PDF", at(1))]);
        assert_eq!(report.missing, vec!["P (manque : slddrw, dxf)"]);
    }

    #[test]
    fn test_newer_source_is_stale() {
        let m = manifest(&[("PART1", &["pdf"])]);
        let entries = vec![
            DirectoryEntry::new("part1.pdf", at(10)),
            DirectoryEntry::new("part1.sldprt", at(20)),
        ];
        let report = audit(&m, &entries);

        assert!(report.missing.is_empty());
        assert!(report.all_required_present());
        assert_eq!(report.stale, vec!["part1.sldprt (plus récent que part1.pdf)"]);
        assert!(report.unverified.is_empty());
    }

    #[test]
    fn test_equal_or_older_source_is_not_stale() {
        let m = manifest(&[("PART1", &["pdf"])]);
        for source_time in [5, 10] {
            let entries = vec![
                DirectoryEntry::new("part1.pdf", at(10)),
                DirectoryEntry::new("part1.sldprt", at(source_time)),
            ];
            assert!(audit(&m, &entries).stale.is_empty());
        }
    }

    #[test]
    fn test_every_stale_pair_is_reported() {
        let m = manifest(&[("Asm", &["slddrw", "pdf", "step"])]);
        let entries = vec![
            DirectoryEntry::new("ASM.PDF", at(1)),
            DirectoryEntry::new("asm.SLDASM", at(50)),
            DirectoryEntry::new("asm.slddrw", at(100)),
            DirectoryEntry::new("asm.sldprt", at(60)),
            DirectoryEntry::new("asm.step", at(2)),
        ];
        let report = audit(&m, &entries);
        assert_eq!(
            report.stale,
            vec![
                "asm.SLDASM (plus récent que ASM.PDF)",
                "asm.SLDASM (plus récent que asm.step)",
                "asm.sldprt (plus récent que ASM.PDF)",
                "asm.sldprt (plus récent que asm.step)",
            ]
        );
    }

    #[test]
    fn test_stale_is_only_checked_when_complete() {
        let m = manifest(&[("PART1", &["pdf", "dxf"])]);
        let entries = vec![
            DirectoryEntry::new("part1.pdf", at(10)),
            DirectoryEntry::new("part1.sldprt", at(20)),
        ];
        let report = audit(&m, &entries);
        assert_eq!(report.missing.len(), 1);
        assert!(report.stale.is_empty());
    }

    #[test]
    fn test_unmatched_file_is_unverified() {
        let m = manifest(&[("PART1", &["pdf"])]);
        let entries = vec![
            DirectoryEntry::new("part1.pdf", at(1)),
            DirectoryEntry::new("readme.txt", at(1)),
        ];
        assert_eq!(audit(&m, &entries).unverified, vec!["readme.txt"]);
    }

    #[test]
    fn test_source_and_admin_files_are_never_unverified() {
        let m = Manifest::new();
        let names = [
            "a.sldprt", "B.SLDASM", "c.slddrw", "Nomenclature_x.xlsx", "old.XLS", "rules.csv",
            "run.bat", "icon.ico", "setup.reg",
        ];
        let entries: Vec<_> = names.iter().map(|n| DirectoryEntry::new(*n, at(1))).collect();
        assert!(audit(&m, &entries).unverified.is_empty());
    }

    #[test]
    fn test_folder_config_is_never_unverified() {
        let m = manifest(&[("P", &["pdf"])]);
        let entries = vec![
            DirectoryEntry::new(".dossier.yaml", at(1)),
            DirectoryEntry::new("old.dossier.yaml", at(1)),
            DirectoryEntry::new("p.pdf", at(1)),
        ];
        let report = audit(&m, &entries);
        assert_eq!(report.unverified, vec!["old.dossier.yaml"]);
    }

    #[test]
    fn test_suffix_needs_a_dot() {
        let m = Manifest::new();
        let entries = vec![DirectoryEntry::new("notacsv", at(1))];
        assert_eq!(audit(&m, &entries).unverified, vec!["notacsv"]);
    }

    #[test]
    fn test_incomplete_part_files_are_not_marked_checked() {
        let m = manifest(&[("PART1", &["pdf", "dxf"])]);
        let entries = vec![
            DirectoryEntry::new("part1.pdf", at(1)),
            DirectoryEntry::new("part1.sldprt", at(1)),
        ];
        let report = audit(&m, &entries);
        assert_eq!(report.unverified, vec!["part1.pdf"]);
    }

    #[test]
    fn test_complete_part_marks_all_its_files() {
        let m = manifest(&[("PART1", &["pdf"])]);
        let entries = vec![
            DirectoryEntry::new("PART1.pdf", at(1)),
            DirectoryEntry::new("part1.png", at(1)),
            DirectoryEntry::new("part10.png", at(1)),
        ];
        assert_eq!(audit(&m, &entries).unverified, vec!["part10.png"]);
    }

    #[test]
    fn test_warnings_do_not_flip_status() {
        let m = manifest(&[("PART1", &["pdf"])]);
        let entries = vec![
            DirectoryEntry::new("part1.pdf", at(1)),
            DirectoryEntry::new("part1.sldprt", at(2)),
            DirectoryEntry::new("notes.txt", at(1)),
        ];
        let report = audit(&m, &entries);
        assert!(report.all_required_present());
        assert!(report.has_warnings());
    }

    #[test]
    fn test_order_follows_manifest_then_listing() {
        let m = manifest(&[("B", &["pdf"]), ("A", &["pdf"])]);
        let report = audit(&m, &[]);
        assert_eq!(report.missing, vec!["B (manque : pdf)", "A (manque : pdf)"]);
    }

    #[test]
    fn test_audit_folder_reads_real_files() {
        use std::fs::{self, File};

        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("part1.pdf"), "pdf").unwrap();
        fs::write(tmp.path().join("part1.sldprt"), "src").unwrap();
        File::options()
            .write(true)
            .open(tmp.path().join("part1.pdf"))
            .unwrap()
            .set_modified(at(1_000))
            .unwrap();
        File::options()
            .write(true)
            .open(tmp.path().join("part1.sldprt"))
            .unwrap()
            .set_modified(at(2_000))
            .unwrap();

        let policy = AuditPolicy::builtin();
        let m = manifest(&[("PART1", &["pdf"])]);
        let report = FolderAuditor::new(&policy).audit_folder(&m, tmp.path()).unwrap();
        assert_eq!(report.stale, vec!["part1.sldprt (plus récent que part1.pdf)"]);
    }

    #[test]
    fn test_audit_folder_missing_folder_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let policy = AuditPolicy::builtin();
        let err = FolderAuditor::new(&policy)
            .audit_folder(&Manifest::new(), &tmp.path().join("nope"))
            .unwrap_err();
        assert!(err.is_io());
    }
}
