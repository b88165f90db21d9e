//! `dossier check` command - Audit a deliverables folder

use chrono::{DateTime, Utc};
use console::style;
use miette::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::cli::helpers::{describe_source, progress, AuditContext};
use crate::cli::output::{effective_format, escape_tsv, print_structured};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{AuditPolicy, AuditReport, FamilyTable, FolderAuditor, RulesetSource};

const TITLE_MISSING: &str = "Fichiers manquants selon les règles de famille";
const TITLE_STALE: &str =
    "Fichiers obsolètes (le fichier source est plus récent que le fichier exporté)";
const TITLE_UNVERIFIED: &str = "Fichiers non vérifiés (ne correspondent à aucune règle)";

#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// Folder to audit (default: current directory)
    pub folder: Option<PathBuf>,

    /// Ruleset workbook or CSV (default: auto-detect Nomenclature_* in the folder)
    #[arg(long, short = 'r')]
    pub rules: Option<PathBuf>,

    /// Strict mode - outdated and unverified files also fail the check
    #[arg(long)]
    pub strict: bool,
}

/// Machine-readable audit output
#[derive(Serialize)]
struct CheckOutput<'a> {
    folder: &'a Path,
    ruleset: &'a RulesetSource,
    generated_at: DateTime<Utc>,
    all_required_present: bool,
    #[serde(flatten)]
    report: &'a AuditReport,
}

#[derive(Clone, Copy)]
enum Section {
    Missing,
    Stale,
    Unverified,
}

impl Section {
    fn all() -> [Section; 3] {
        [Section::Missing, Section::Stale, Section::Unverified]
    }

    fn title(self) -> &'static str {
        match self {
            Section::Missing => TITLE_MISSING,
            Section::Stale => TITLE_STALE,
            Section::Unverified => TITLE_UNVERIFIED,
        }
    }

    fn key(self) -> &'static str {
        match self {
            Section::Missing => "missing",
            Section::Stale => "stale",
            Section::Unverified => "unverified",
        }
    }

    fn lines(self, report: &AuditReport) -> &[String] {
        match self {
            Section::Missing => &report.missing,
            Section::Stale => &report.stale,
            Section::Unverified => &report.unverified,
        }
    }
}

pub fn run(args: CheckArgs, global: &GlobalOpts) -> Result<()> {
    let table = FamilyTable::builtin();
    let policy = AuditPolicy::builtin();

    let ctx = AuditContext::prepare(args.folder.as_deref(), args.rules.as_deref(), &table)?;
    let format = effective_format(global.format, &ctx.config);

    if format == OutputFormat::Auto {
        progress(
            global,
            &format!(
                "Auditing {} part(s) in {}",
                ctx.manifest.len(),
                ctx.folder.display()
            ),
        );
    }

    let report = FolderAuditor::new(&policy).audit_folder(&ctx.manifest, &ctx.folder)?;

    match format {
        OutputFormat::Json | OutputFormat::Yaml => {
            let output = CheckOutput {
                folder: &ctx.folder,
                ruleset: &ctx.source,
                generated_at: Utc::now(),
                all_required_present: report.all_required_present(),
                report: &report,
            };
            print_structured(&output, format)?;
        }
        OutputFormat::Tsv => print_tsv(&report),
        OutputFormat::Md => print!("{}", render_markdown(&report, &ctx.source, &ctx.folder)),
        OutputFormat::Auto => print_human(&report, &ctx.source, &ctx.folder),
    }

    if !report.all_required_present() {
        let parts = report.missing.len();
        return Err(miette::miette!(
            "Check failed: {} part(s) with missing files",
            parts
        ));
    }
    if args.strict && report.has_warnings() {
        return Err(miette::miette!(
            "Check failed (strict): {} outdated, {} unverified file(s)",
            report.stale.len(),
            report.unverified.len()
        ));
    }

    Ok(())
}

fn status_line(report: &AuditReport) -> &'static str {
    if report.all_required_present() {
        "Tous les fichiers vérifiés sont présents !"
    } else {
        "Des fichiers vérifiés sont manquants."
    }
}

fn print_human(report: &AuditReport, source: &RulesetSource, folder: &Path) {
    println!("{}", style("=== Rapport de vérification ===").bold());
    println!();
    println!("Dossier: {}", folder.display());
    println!("{}", describe_source(source));
    println!();

    for section in Section::all() {
        println!("{} :", style(section.title()).bold());
        let lines = section.lines(report);
        if lines.is_empty() {
            println!("  {} 0 fichier manquant", style("✓").green());
        }
        for line in lines {
            let styled = match section {
                Section::Missing => style(line).red(),
                Section::Stale => style(line).magenta(),
                Section::Unverified => style(line).yellow(),
            };
            println!("  - {}", styled);
        }
        println!();
    }

    if report.all_required_present() {
        println!("{} {}", style("✓").green().bold(), style(status_line(report)).green());
    } else {
        println!("{} {}", style("✗").red().bold(), style(status_line(report)).red());
    }
}

fn print_tsv(report: &AuditReport) {
    for section in Section::all() {
        for line in section.lines(report) {
            println!("{}\t{}", section.key(), escape_tsv(line));
        }
    }
}

fn render_markdown(report: &AuditReport, source: &RulesetSource, folder: &Path) -> String {
    let mut output = String::new();
    output.push_str("# Rapport de vérification\n\n");
    output.push_str(&format!("- **Dossier:** {}\n", folder.display()));
    output.push_str(&format!("- {}\n", describe_source(source)));
    output.push_str(&format!("- **Statut:** {}\n\n", status_line(report)));

    for section in Section::all() {
        output.push_str(&format!("## {}\n\n", section.title()));
        let lines = section.lines(report);
        if lines.is_empty() {
            output.push_str("_0 fichier manquant_\n");
        }
        for line in lines {
            output.push_str(&format!("- {}\n", line));
        }
        output.push('\n');
    }
    output
}
