// src/report.rs

//! Reconciliation report output

use crate::reconcile::Reconciliation;
use serde::Serialize;
use std::io::{self, Write};

/// Write the human-readable report
pub fn write_text<W: Write>(out: &mut W, result: &Reconciliation) -> io::Result<()> {
    if result.is_reconciled() {
        writeln!(out, "The Factory project is up-to-date. Congratulations!")?;
        return Ok(());
    }

    if !result.to_update.is_empty() {
        writeln!(
            out,
            "Packages that need updating in Factory ({}):",
            result.to_update.len()
        )?;
        for package in &result.to_update {
            writeln!(
                out,
                "  - {} ({}, {})",
                package.name,
                package.project,
                package.source_checksum.as_deref().unwrap_or("unknown")
            )?;
        }
    }

    if !result.to_remove.is_empty() {
        writeln!(
            out,
            "Packages not in a devel project ({}):",
            result.to_remove.len()
        )?;
        for package in &result.to_remove {
            writeln!(out, "  - {}", package.name)?;
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct JsonReport<'a> {
    up_to_date: bool,
    to_update: Vec<UpdateEntry<'a>>,
    to_remove: Vec<RemoveEntry<'a>>,
}

#[derive(Serialize)]
struct UpdateEntry<'a> {
    name: &'a str,
    project: &'a str,
    checksum: Option<&'a str>,
}

#[derive(Serialize)]
struct RemoveEntry<'a> {
    name: &'a str,
    project: &'a str,
}

/// Write the report as a pretty-printed JSON document
pub fn write_json<W: Write>(out: &mut W, result: &Reconciliation) -> io::Result<()> {
    let report = JsonReport {
        up_to_date: result.is_reconciled(),
        to_update: result
            .to_update
            .iter()
            .map(|p| UpdateEntry {
                name: &p.name,
                project: &p.project,
                checksum: p.source_checksum.as_deref(),
            })
            .collect(),
        to_remove: result
            .to_remove
            .iter()
            .map(|p| RemoveEntry {
                name: &p.name,
                project: &p.project,
            })
            .collect(),
    };

    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Account;
    use crate::snapshot::Package;
    use std::sync::Arc;

    fn package(project: &str, name: &str, sum: &str) -> Package {
        Package::new(project, name, Arc::new(Account::anonymous("https://api.example.org")))
            .with_checksum(sum)
    }

    fn sample() -> Reconciliation {
        Reconciliation {
            to_update: vec![
                package("Moblin:Base", "clutter", "0a1b"),
                package("Moblin:UI", "moblin-panel", "ffee"),
            ],
            to_remove: vec![package("Moblin:Factory", "old-theme", "1234")],
        }
    }

    #[test]
    fn test_text_report() {
        let mut out = Vec::new();
        write_text(&mut out, &sample()).unwrap();

        let expected = "\
Packages that need updating in Factory (2):
  - clutter (Moblin:Base, 0a1b)
  - moblin-panel (Moblin:UI, ffee)
Packages not in a devel project (1):
  - old-theme
";
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn test_text_report_omits_empty_sections() {
        let mut result = sample();
        result.to_update.clear();

        let mut out = Vec::new();
        write_text(&mut out, &result).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("need updating"));
        assert!(text.starts_with("Packages not in a devel project (1):"));
    }

    #[test]
    fn test_text_report_reconciled() {
        let mut out = Vec::new();
        write_text(&mut out, &Reconciliation::default()).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "The Factory project is up-to-date. Congratulations!\n"
        );
    }

    #[test]
    fn test_json_report() {
        let mut out = Vec::new();
        write_json(&mut out, &sample()).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["up_to_date"], false);
        assert_eq!(value["to_update"][0]["name"], "clutter");
        assert_eq!(value["to_update"][1]["checksum"], "ffee");
        assert_eq!(value["to_remove"][0]["project"], "Moblin:Factory");
        assert_eq!(value["to_remove"].as_array().unwrap().len(), 1);
    }
}
