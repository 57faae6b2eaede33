// ShellCheck JSON output -> annotations.

use anyhow::{Context, Result};
use polyjudge_common::report::{Annotation, Severity};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ShellcheckComment {
    line: u32,
    column: u32,
    level: String,
    code: u32,
    message: String,
}

pub fn parse(output: &str) -> Result<Vec<Annotation>> {
    if output.trim().is_empty() {
        return Ok(Vec::new());
    }
    let comments: Vec<ShellcheckComment> =
        serde_json::from_str(output).context("Failed to parse shellcheck output")?;

    Ok(comments
        .into_iter()
        .map(|c| Annotation {
            severity: match c.level.as_str() {
                "error" => Severity::Error,
                "warning" => Severity::Warning,
                _ => Severity::Info,
            },
            message: format!("SC{}: {}", c.code, c.message),
            row: Some(c.line),
            column: Some(c.column),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shellcheck_json() {
        let output = r#"[{"file":"submission.sh","line":3,"endLine":3,"column":6,"endColumn":8,
            "level":"info","code":2086,"message":"Double quote to prevent globbing and word splitting.","fix":null}]"#;
        let annotations = parse(output).unwrap();
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].severity, Severity::Info);
        assert_eq!(annotations[0].row, Some(3));
        assert!(annotations[0].message.starts_with("SC2086: "));
    }
}
