/// Diagnostics Normalizer
///
/// **Core Responsibility:**
/// Rewrite compiler/runtime/linter text so that feedback never exposes the
/// generated scaffolding.
///
/// **Shape:**
/// An ordered list of rules, each a line pattern plus an action. Rules are
/// tried in order on every line; rewrites chain, drops stop the chain.
/// A line no rule matches passes through unchanged: losing a diagnostic
/// line is worse than leaving it unnormalized.
///
/// Every rule must consume what it matches (a placeholder never matches
/// the pattern that produced it) so a second pass is a no-op.

use regex::{Captures, Regex};
use std::fmt;

/// Placeholder for the learner's own submission file
pub const CODE_PLACEHOLDER: &str = "<code>";
/// Placeholder for generated scaffolding files
pub const TESTCODE_PLACEHOLDER: &str = "<testcode>";

/// Optional directory prefix in front of a file name
pub const PATH_PREFIX: &str = r#"(?:[^\s'"(\[<>]*/)?"#;

type Rewriter = Box<dyn Fn(&Captures) -> String + Send + Sync>;

pub enum Action {
    /// Replace every match with a regex replacement template
    Replace(String),
    /// Replace every match with a computed string
    With(Rewriter),
    /// Remove the line
    Drop,
    /// Remove the line and every following line indented deeper than it
    DropFrame,
}

pub struct Rule {
    name: &'static str,
    pattern: Regex,
    action: Action,
    /// Also applied to lines inside a dropped frame, which are then kept
    rescue: bool,
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("pattern", &self.pattern.as_str())
            .field("rescue", &self.rescue)
            .finish()
    }
}

impl Rule {
    fn build(name: &'static str, pattern: &str, action: Action) -> Result<Self, regex::Error> {
        Ok(Self { name, pattern: Regex::new(pattern)?, action, rescue: false })
    }

    pub fn replace(name: &'static str, pattern: &str, template: &str) -> Result<Self, regex::Error> {
        Self::build(name, pattern, Action::Replace(template.to_string()))
    }

    pub fn with<F>(name: &'static str, pattern: &str, rewrite: F) -> Result<Self, regex::Error>
    where
        F: Fn(&Captures) -> String + Send + Sync + 'static,
    {
        Self::build(name, pattern, Action::With(Box::new(rewrite)))
    }

    pub fn drop(name: &'static str, pattern: &str) -> Result<Self, regex::Error> {
        Self::build(name, pattern, Action::Drop)
    }

    pub fn drop_frame(name: &'static str, pattern: &str) -> Result<Self, regex::Error> {
        Self::build(name, pattern, Action::DropFrame)
    }

    /// Make the rule fire inside dropped frames too
    pub fn rescuing(mut self) -> Self {
        self.rescue = true;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn matches(&self, line: &str) -> bool {
        self.pattern.is_match(line)
    }

    fn rewrite(&self, line: &str) -> Option<String> {
        match &self.action {
            Action::Replace(template) => Some(self.pattern.replace_all(line, template.as_str()).into_owned()),
            Action::With(f) => Some(self.pattern.replace_all(line, |caps: &Captures| f(caps)).into_owned()),
            Action::Drop | Action::DropFrame => None,
        }
    }
}

enum LineResult {
    Keep(String),
    Drop,
    DropFrame,
}

fn indentation(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

#[derive(Debug, Default)]
pub struct Normalizer {
    rules: Vec<Rule>,
    skip_blank: bool,
}

impl Normalizer {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules, skip_blank: false }
    }

    /// Also remove empty lines
    pub fn skipping_blank_lines(mut self) -> Self {
        self.skip_blank = true;
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    fn apply_rules(&self, line: &str) -> LineResult {
        let mut current = line.to_string();
        for rule in &self.rules {
            if !rule.matches(&current) {
                continue;
            }
            match rule.action {
                Action::Drop => return LineResult::Drop,
                Action::DropFrame => return LineResult::DropFrame,
                _ => {
                    if let Some(rewritten) = rule.rewrite(&current) {
                        current = rewritten;
                    }
                }
            }
        }
        LineResult::Keep(current)
    }

    fn rescue(&self, line: &str) -> Option<String> {
        let mut current: Option<String> = None;
        for rule in self.rules.iter().filter(|r| r.rescue) {
            let input = current.as_deref().unwrap_or(line);
            if rule.matches(input) {
                if let Some(rewritten) = rule.rewrite(input) {
                    current = Some(rewritten);
                }
            }
        }
        current
    }

    pub fn normalize(&self, text: &str) -> String {
        let mut out: Vec<String> = Vec::new();
        let mut frame_indent: Option<usize> = None;

        for line in text.lines() {
            if self.skip_blank && line.trim().is_empty() {
                continue;
            }

            if let Some(indent) = frame_indent {
                if !line.trim().is_empty() && indentation(line) > indent {
                    if let Some(rescued) = self.rescue(line) {
                        out.push(rescued);
                    }
                    continue;
                }
                frame_indent = None;
            }

            match self.apply_rules(line) {
                LineResult::Keep(kept) => out.push(kept),
                LineResult::Drop => {}
                LineResult::DropFrame => frame_indent = Some(indentation(line)),
            }
        }

        let mut result = out.join("\n");
        if !out.is_empty() && text.ends_with('\n') {
            result.push('\n');
        }
        result
    }
}

/// Words compilers use for "line" in the configured natural language
///
/// Some toolchains localize their messages; bash run under a Dutch locale
/// says `regel` where it would say `line`.
pub fn line_keywords(natural_language: &str) -> &'static [&'static str] {
    match natural_language {
        "nl" => &["line", "regel"],
        _ => &["line"],
    }
}

/// The one wording used for a type mismatch between expected and actual
pub fn canonical_type_conflict(expected: &str, actual: &str) -> String {
    format!("Argument type conflict: expected {}, found {}", expected.trim(), actual.trim())
}

/// Shift a reported line number back by the harness offset
pub fn shift_line(reported: &str, offset: usize) -> String {
    match reported.parse::<usize>() {
        Ok(n) => n.saturating_sub(offset).max(1).to_string(),
        Err(_) => reported.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> Normalizer {
        Normalizer::new(vec![
            Rule::drop_frame("harness frame", r#"^\s*File "[^"]*context_\d+\.py""#).unwrap(),
            Rule::with("submission frame", r#"File "[^"]*submission\.py", line (\d+).*$"#, |c| {
                format!("File \"{}:{}\"", CODE_PLACEHOLDER, shift_line(&c[1], 0))
            })
            .unwrap(),
            Rule::replace("mismatch", r"mismatch (\w+) vs (\w+)", "conflict: $1/$2").unwrap().rescuing(),
            Rule::drop("noise", r"^Linking ").unwrap(),
        ])
    }

    #[test]
    fn test_unmatched_lines_pass_through() {
        let text = "ValueError: bad\nsomething else\n";
        assert_eq!(normalizer().normalize(text), text);
    }

    #[test]
    fn test_empty_input_stays_empty() {
        assert_eq!(normalizer().normalize(""), "");
    }

    #[test]
    fn test_drop_frame_removes_continuation_lines() {
        let text = "Traceback:\n  File \"/tmp/context_0.py\", line 4, in <module>\n    f()\n  File \"/tmp/submission.py\", line 2, in f\n    1/0\nZeroDivisionError\n";
        let expected = "Traceback:\n  File \"<code>:2\"\n    1/0\nZeroDivisionError\n";
        assert_eq!(normalizer().normalize(text), expected);
    }

    #[test]
    fn test_rescue_rules_fire_inside_frames() {
        let text = "  File \"context_1.py\", line 1\n    mismatch Int vs Str\n    other\nend";
        assert_eq!(normalizer().normalize(text), "    conflict: Int/Str\nend");
    }

    #[test]
    fn test_drop_rule() {
        assert_eq!(normalizer().normalize("Linking x\nkept\n"), "kept\n");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let text = "  File \"/w/context_3.py\", line 9, in ctx\n    call()\n  File \"/w/submission.py\", line 7, in g\nmismatch A vs B\n";
        let once = normalizer().normalize(text);
        assert_eq!(normalizer().normalize(&once), once);
    }

    #[test]
    fn test_line_keywords() {
        assert_eq!(line_keywords("en"), &["line"]);
        assert!(line_keywords("nl").contains(&"regel"));
    }

    #[test]
    fn test_shift_line_never_goes_below_one() {
        assert_eq!(shift_line("5", 1), "4");
        assert_eq!(shift_line("1", 1), "1");
        assert_eq!(shift_line("x", 1), "x");
    }
}
