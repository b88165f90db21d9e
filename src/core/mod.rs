//! Core module - rule resolution and folder audit engine

pub mod audit;
pub mod config;
pub mod error;
pub mod listing;
pub mod manifest;
pub mod rules;
pub mod ruleset;

pub use audit::{AuditPolicy, AuditReport, FolderAuditor};
pub use config::Config;
pub use error::AuditError;
pub use listing::{ensure_folder, list_directory, normalize_name, DirectoryEntry};
pub use manifest::{normalize_path, Manifest, ManifestBuilder, ManifestEntry, RuleRow};
pub use rules::{ExtensionSet, FamilyRule, FamilyTable, RuleResolver};
pub use ruleset::{load_manifest, load_rows, select_source, RulesetOptions, RulesetSource};

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_core_types_are_thread_safe() {
        assert_send_sync::<FamilyTable>();
        assert_send_sync::<RuleResolver<'static>>();
        assert_send_sync::<ManifestBuilder<'static>>();
        assert_send_sync::<FolderAuditor<'static>>();
        assert_send_sync::<Manifest>();
        assert_send_sync::<AuditReport>();
    }
}
