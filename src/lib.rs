//! Dossier: deliverable folder audit
//!
//! Checks that a folder of engineering deliverables holds, for every part,
//! the files its manufacturing family requires, and flags exports that are
//! older than their CAD source.

pub mod cli;
pub mod core;
