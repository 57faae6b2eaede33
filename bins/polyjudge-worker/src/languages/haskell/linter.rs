// HLint JSON output -> annotations.

use anyhow::{Context, Result};
use polyjudge_common::report::{Annotation, Severity};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Idea {
    severity: String,
    hint: String,
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    to: Option<String>,
    start_line: u32,
    start_column: u32,
}

pub fn parse(output: &str) -> Result<Vec<Annotation>> {
    if output.trim().is_empty() {
        return Ok(Vec::new());
    }
    let ideas: Vec<Idea> = serde_json::from_str(output).context("Failed to parse hlint output")?;

    Ok(ideas
        .into_iter()
        .filter(|idea| idea.severity != "Ignore")
        .map(|idea| {
            let message = match (&idea.from, &idea.to) {
                (Some(from), Some(to)) => format!("{}: {} ==> {}", idea.hint, from, to),
                _ => idea.hint.clone(),
            };
            Annotation {
                severity: match idea.severity.as_str() {
                    "Error" => Severity::Error,
                    "Warning" => Severity::Warning,
                    _ => Severity::Info,
                },
                message,
                row: Some(idea.start_line),
                column: Some(idea.start_column),
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hlint_json() {
        let output = r#"[{"module":["Submission"],"decl":["f"],"severity":"Warning","hint":"Use map",
            "file":"Submission.hs","startLine":2,"startColumn":7,"endLine":2,"endColumn":20,
            "from":"foldr (\\x acc -> g x : acc) []","to":"map g","note":[],"refactorings":"[]"},
            {"module":[],"decl":[],"severity":"Ignore","hint":"Eta reduce","file":"Submission.hs",
            "startLine":1,"startColumn":1,"endLine":1,"endColumn":5,"from":null,"to":null,"note":[],"refactorings":"[]"}]"#;
        let annotations = parse(output).unwrap();
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].severity, Severity::Warning);
        assert!(annotations[0].message.starts_with("Use map: "));
        assert_eq!(annotations[0].column, Some(7));
    }
}
