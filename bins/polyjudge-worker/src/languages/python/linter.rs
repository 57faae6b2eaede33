// Pylint JSON output -> annotations.

use anyhow::{Context, Result};
use polyjudge_common::report::{Annotation, Severity};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct PylintMessage {
    #[serde(rename = "type")]
    kind: String,
    message: String,
    #[serde(default)]
    symbol: Option<String>,
    line: Option<u32>,
    column: Option<u32>,
}

fn severity(kind: &str) -> Severity {
    match kind {
        "fatal" | "error" => Severity::Error,
        "warning" => Severity::Warning,
        _ => Severity::Info,
    }
}

pub fn parse(output: &str) -> Result<Vec<Annotation>> {
    if output.trim().is_empty() {
        return Ok(Vec::new());
    }
    let messages: Vec<PylintMessage> = serde_json::from_str(output).context("Failed to parse pylint output")?;

    Ok(messages
        .into_iter()
        .map(|m| Annotation {
            severity: severity(&m.kind),
            message: match m.symbol {
                Some(symbol) => format!("{} ({})", m.message, symbol),
                None => m.message,
            },
            row: m.line,
            // pylint columns are 0-based
            column: m.column.map(|c| c + 1),
        })
        .collect())
}
