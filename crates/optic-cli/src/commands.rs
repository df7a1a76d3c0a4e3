//! Subcommand implementations; each returns what `main` prints.

use crate::config::OutputConfig;
use anyhow::Context;
use optic_builder::script;
use optic_export::WireDocument;
use optic_registry::{FunctionCatalog, TypeRegistry};
use std::io::Read;
use std::path::Path;

/// Rendered result of `optic export`
#[derive(Debug)]
pub struct ExportOutput {
    pub document: String,
    pub fingerprint: Option<String>,
}

/// Script text from `file`, or stdin when no file is given
pub fn read_source(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display())),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read script from stdin")?;
            Ok(buffer)
        }
    }
}

fn build_document(source: &str) -> anyhow::Result<WireDocument> {
    let plan = script::evaluate_plan(source).context("Script evaluation failed")?;
    tracing::info!(stages = plan.len(), "built plan");
    let document = optic_export::export(&plan).context("Export failed")?;
    Ok(document)
}

pub fn export(source: &str, options: &OutputConfig) -> anyhow::Result<ExportOutput> {
    let document = build_document(source)?;
    let fingerprint = options.fingerprint.then(|| document.fingerprint());
    let document = if options.pretty {
        document.to_pretty_string()
    } else {
        document.to_string()
    };
    Ok(ExportOutput {
        document,
        fingerprint,
    })
}

/// Evaluate and export without printing; returns the stage count.
pub fn check(source: &str) -> anyhow::Result<usize> {
    let document = build_document(source)?;
    let stages = document.operators()["args"]
        .as_array()
        .map_or(0, |stages| stages.len());
    Ok(stages)
}

pub fn functions(json: bool) -> anyhow::Result<String> {
    let summaries = FunctionCatalog::global().summaries();
    if json {
        return Ok(serde_json::to_string_pretty(&summaries)?);
    }
    let lines: Vec<String> = summaries
        .iter()
        .map(|f| {
            let kind = serde_json::to_value(f.kind)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default();
            format!("{}{} -> {} [{}]", f.name, f.signature, f.returns, kind)
        })
        .collect();
    Ok(lines.join("\n"))
}

/// Each type with its full ancestor set
pub fn types() -> String {
    let registry = TypeRegistry::global();
    let lines: Vec<String> = registry
        .iter()
        .map(|descriptor| {
            let mut ancestors: Vec<String> = descriptor
                .ancestors()
                .iter()
                .filter(|id| **id != descriptor.id)
                .map(|id| registry.name(*id))
                .collect();
            ancestors.sort();
            if ancestors.is_empty() {
                descriptor.name.clone()
            } else {
                format!("{}: {}", descriptor.name, ancestors.join(", "))
            }
        })
        .collect();
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = r#"
        let songs = op.fromView(null, "songs");
        songs.where(op.gt(songs.col("popularity"), 2)).limit(5)
    "#;

    #[test]
    fn test_export_compact() {
        let out = export(SCRIPT, &OutputConfig::default()).unwrap();
        assert!(out.document.starts_with(r#"{"$optic":{"namespace":"op","operation":"operators""#));
        assert!(out.fingerprint.is_none());
    }

    #[test]
    fn test_export_pretty_with_fingerprint() {
        let options = OutputConfig {
            pretty: true,
            fingerprint: true,
        };
        let out = export(SCRIPT, &options).unwrap();
        assert!(out.document.contains('\n'));
        assert_eq!(out.fingerprint.unwrap().len(), 64);
    }

    #[test]
    fn test_fingerprint_ignores_formatting() {
        let compact = export(SCRIPT, &OutputConfig { pretty: false, fingerprint: true }).unwrap();
        let pretty = export(SCRIPT, &OutputConfig { pretty: true, fingerprint: true }).unwrap();
        assert_eq!(compact.fingerprint, pretty.fingerprint);
    }

    #[test]
    fn test_check_counts_stages() {
        assert_eq!(check(SCRIPT).unwrap(), 3);
    }

    #[test]
    fn test_check_reports_errors() {
        let err = check(r#"op.fromView(null, "songs").where("x")"#).unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("Script evaluation failed"));
        assert!(message.contains("condition"));
    }

    #[test]
    fn test_functions_listing() {
        let listing = functions(false).unwrap();
        assert!(listing
            .lines()
            .any(|line| line.starts_with("op.from-view(") && line.ends_with("[source]")));

        let json: serde_json::Value = serde_json::from_str(&functions(true).unwrap()).unwrap();
        assert!(json.as_array().unwrap().len() > 50);
    }

    #[test]
    fn test_types_listing() {
        let listing = types();
        let long = listing.lines().find(|l| l.starts_with("xs.long:")).unwrap();
        assert!(long.contains("xs.numeric"));
        assert!(long.contains("item"));
    }
}
