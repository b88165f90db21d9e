//! `dossier manifest` command - Show the parts required for a folder

use miette::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{describe_source, AuditContext};
use crate::cli::output::{effective_format, escape_tsv, print_structured};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{FamilyTable, Manifest, RulesetSource};

#[derive(clap::Args, Debug)]
pub struct ManifestArgs {
    /// Folder the manifest is built for (default: current directory)
    pub folder: Option<PathBuf>,

    /// Ruleset workbook or CSV (default: auto-detect Nomenclature_* in the folder)
    #[arg(long, short = 'r')]
    pub rules: Option<PathBuf>,
}

#[derive(Serialize)]
struct ManifestOutput<'a> {
    folder: &'a Path,
    ruleset: &'a RulesetSource,
    parts: &'a Manifest,
}

pub fn run(args: ManifestArgs, global: &GlobalOpts) -> Result<()> {
    let table = FamilyTable::builtin();
    let ctx = AuditContext::prepare(args.folder.as_deref(), args.rules.as_deref(), &table)?;

    match effective_format(global.format, &ctx.config) {
        format @ (OutputFormat::Json | OutputFormat::Yaml) => {
            let output = ManifestOutput {
                folder: &ctx.folder,
                ruleset: &ctx.source,
                parts: &ctx.manifest,
            };
            print_structured(&output, format)?;
        }
        OutputFormat::Tsv => {
            for entry in ctx.manifest.iter() {
                println!("{}\t{}", escape_tsv(&entry.identifier), entry.extensions.join(","));
            }
        }
        format @ (OutputFormat::Md | OutputFormat::Auto) => {
            if format == OutputFormat::Auto && !global.quiet {
                eprintln!("{}", describe_source(&ctx.source));
            }
            println!("{}", manifest_table(&ctx.manifest, format == OutputFormat::Md));
            if !global.quiet {
                eprintln!("{} part(s)", ctx.manifest.len());
            }
        }
    }

    Ok(())
}

fn manifest_table(manifest: &Manifest, markdown: bool) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Pièce", "Extensions requises"]);
    for entry in manifest.iter() {
        builder.push_record([entry.identifier.clone(), entry.extensions.join(", ")]);
    }

    let mut table = builder.build();
    if markdown {
        table.with(Style::markdown());
    } else {
        table.with(Style::rounded());
    }
    table.to_string()
}
