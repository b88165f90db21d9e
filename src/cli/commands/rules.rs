//! `dossier rules` command - Inspect the family rules

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tabled::{builder::Builder, settings::Style};

use crate::cli::output::{effective_format, print_structured};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{AuditPolicy, Config, ExtensionSet, FamilyRule, FamilyTable, RuleResolver};

#[derive(clap::Args, Debug)]
pub struct RulesArgs {
    /// Classification to resolve (e.g. FAM0201); lists all rules when omitted
    pub classification: Option<String>,
}

#[derive(Serialize)]
struct Resolution<'a> {
    classification: &'a str,
    family: Option<&'a FamilyRule>,
    extensions: ExtensionSet,
}

#[derive(Serialize)]
struct RulesOverview<'a> {
    #[serde(flatten)]
    table: &'a FamilyTable,
    #[serde(flatten)]
    policy: &'a AuditPolicy,
}

pub fn run(args: RulesArgs, global: &GlobalOpts) -> Result<()> {
    let table = FamilyTable::builtin();
    let policy = AuditPolicy::builtin();
    let cwd = std::env::current_dir().into_diagnostic()?;
    let format = effective_format(global.format, &Config::load(&cwd));

    match args.classification {
        Some(classification) => {
            let resolver = RuleResolver::new(&table);
            let resolution = Resolution {
                classification: &classification,
                family: resolver.matched_family(&classification),
                extensions: resolver.resolve_extensions(&classification),
            };
            print_resolution(&resolution, format)
        }
        None => print_overview(&table, &policy, format),
    }
}

fn print_resolution(resolution: &Resolution, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json | OutputFormat::Yaml => print_structured(resolution, format)?,
        OutputFormat::Tsv => println!(
            "{}\t{}\t{}",
            resolution.classification,
            resolution.family.map(|f| f.code.as_str()).unwrap_or("-"),
            resolution.extensions.join(",")
        ),
        OutputFormat::Md | OutputFormat::Auto => {
            match resolution.family {
                Some(family) => println!(
                    "{} {} ({})",
                    style("Famille:").bold(),
                    style(&family.code).cyan(),
                    family.description
                ),
                None => println!(
                    "{} {}",
                    style("Famille:").bold(),
                    style("aucune (extensions de base)").dim()
                ),
            }
            println!(
                "{} {}",
                style("Extensions:").bold(),
                resolution.extensions.join(", ")
            );
        }
    }
    Ok(())
}

fn print_overview(table: &FamilyTable, policy: &AuditPolicy, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json | OutputFormat::Yaml => {
            print_structured(&RulesOverview { table, policy }, format)?
        }
        OutputFormat::Tsv => {
            for family in &table.families {
                println!("{}\t{}", family.code, family.extensions.join(","));
            }
        }
        OutputFormat::Md | OutputFormat::Auto => {
            println!("{}", family_table(table, format == OutputFormat::Md));
            println!();
            println!("Extensions de base:      {}", table.base.join(", "));
            println!("Fichiers source:         {}", policy.source_suffixes.join(", "));
            println!("Extensions ignorées:     {}", policy.ignored_suffixes.join(", "));
            println!(
                "Note: la première famille trouvée dans la classification s'applique."
            );
        }
    }
    Ok(())
}

fn family_table(table: &FamilyTable, markdown: bool) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Famille", "Extensions", "Description"]);
    for family in &table.families {
        builder.push_record([
            family.code.clone(),
            family.extensions.join(", "),
            family.description.clone(),
        ]);
    }

    let mut rendered = builder.build();
    if markdown {
        rendered.with(Style::markdown());
    } else {
        rendered.with(Style::rounded());
    }
    rendered.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_table_keeps_priority_order() {
        let rendered = family_table(&FamilyTable::builtin(), true);
        let first = rendered.find("FAM0201").unwrap();
        let last = rendered.find("FAM0208").unwrap();
        assert!(first < last);
        assert!(rendered.contains("igs, stp"));
    }

    #[test]
    fn test_overview_serializes_tables() {
        let table = FamilyTable::builtin();
        let policy = AuditPolicy::builtin();
        let value = serde_json::to_value(RulesOverview {
            table: &table,
            policy: &policy,
        })
        .unwrap();
        assert_eq!(value["base"], serde_json::json!(["slddrw", "pdf"]));
        assert_eq!(value["source_suffixes"], serde_json::json!(["sldprt", "sldasm"]));
        assert_eq!(value["families"][0]["code"], "FAM0201");
    }
}
