/// Language Adapters
///
/// **Core Responsibility:**
/// Isolate every difference between target languages behind one contract.
/// The pipeline and the wire codec never look at a language name; they
/// only call `LanguageAdapter` operations.
///
/// **Closed Set:**
/// Supported targets are enumerated in `Language` and built by
/// `adapter_for`. Adding a language means adding a variant and a module.

pub mod bash;
pub mod haskell;
pub mod python;

use crate::config::AdapterConfig;
use crate::conventions::{Conventionable, NamingConventions};
use crate::features::{Construct, SupportMap, TypeSupport};
use anyhow::{bail, Context as _, Result};
use polyjudge_common::plan::{Context, Expression, FunctionCall, Statement};
use polyjudge_common::report::Annotation;
use polyjudge_common::types::{Value, ValueType};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Python,
    Bash,
    Haskell,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Python, Language::Bash, Language::Haskell];
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Python => write!(f, "python"),
            Language::Bash => write!(f, "bash"),
            Language::Haskell => write!(f, "haskell"),
        }
    }
}

impl FromStr for Language {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "python" | "py" | "python3" => Ok(Language::Python),
            "bash" | "sh" => Ok(Language::Bash),
            "haskell" | "hs" => Ok(Language::Haskell),
            other => bail!("Unsupported language: {} (valid options: python, bash, haskell)", other),
        }
    }
}

/// Build the adapter for a language, once per judging run
pub fn adapter_for(language: Language, config: &AdapterConfig) -> Result<Box<dyn LanguageAdapter>> {
    let adapter: Box<dyn LanguageAdapter> = match language {
        Language::Python => Box::new(python::PythonAdapter::new(config).context("Failed to build python adapter")?),
        Language::Bash => Box::new(bash::BashAdapter::new(config).context("Failed to build bash adapter")?),
        Language::Haskell => Box::new(haskell::HaskellAdapter::new(config).context("Failed to build haskell adapter")?),
    };
    Ok(adapter)
}

const SHEBANG: &str = "#!tested";

/// Remove a `#!tested <language>` line heading a submission
///
/// Only the first non-blank line can be a shebang. It is removed even when
/// malformed; the language is returned only when the line names exactly one.
pub fn consume_shebang(source: &str) -> (String, Option<String>) {
    let mut kept = String::with_capacity(source.len());
    let mut language = None;
    let mut leading = true;
    for line in source.split_inclusive('\n') {
        let stripped = line.trim();
        if leading && stripped.starts_with(SHEBANG) {
            match stripped.split(' ').collect::<Vec<_>>().as_slice() {
                [_, name] if !name.is_empty() => language = Some(name.to_string()),
                _ => warn!(line = stripped, "Ignoring malformed shebang"),
            }
        } else {
            kept.push_str(line);
        }
        if !stripped.is_empty() {
            leading = false;
        }
    }
    (kept, language)
}

/// Runtime support file provisioned before compilation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency {
    pub name: &'static str,
    pub content: &'static str,
}

/// How to compile a set of files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compilation {
    /// argv; empty for languages that need no compile step
    pub command: Vec<String>,
    /// Files that must exist afterwards for the compile to count as successful
    pub outputs: Vec<String>,
    /// File to hand to `execution` instead of the unit itself
    pub executable: Option<String>,
}

impl Compilation {
    pub fn none() -> Self {
        Self { command: Vec::new(), outputs: Vec::new(), executable: None }
    }

    pub fn is_noop(&self) -> bool {
        self.command.is_empty()
    }
}

/// External static analysis for a submission
#[derive(Clone)]
pub struct LintCommand {
    pub command: Vec<String>,
    pub parse: fn(&str) -> Result<Vec<Annotation>>,
}

/// One generated source file: the harness of a single context
#[derive(Debug, Clone, Copy)]
pub struct ExecutionUnit<'a> {
    pub index: usize,
    /// Conventionalized module or file stem
    pub name: &'a str,
    pub context: &'a Context,
}

/// Names assigned by earlier statements of a unit
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    assigned: HashSet<String>,
}

impl Bindings {
    pub fn with(names: &[&str]) -> Self {
        Self { assigned: names.iter().map(|n| n.to_string()).collect() }
    }

    pub fn is_local(&self, name: &str) -> bool {
        self.assigned.contains(name)
    }

    pub fn bind(&mut self, statement: &Statement) {
        if let Statement::Assignment(a) = statement {
            self.assigned.insert(a.variable.clone());
        }
    }
}

/// Plan name of the check function for testcase `index`
pub fn check_function_name(index: usize) -> String {
    format!("check_{}", index)
}

/// The checker call with the actual value spliced in as first argument
pub fn checker_with_actual(checker: &FunctionCall) -> FunctionCall {
    let mut call = checker.clone();
    call.arguments.insert(0, Expression::Identifier("actual".to_string()));
    call
}

pub trait LanguageAdapter: Send + Sync {
    fn language(&self) -> Language;

    fn file_extension(&self) -> &'static str;

    fn naming_conventions(&self) -> &NamingConventions;

    /// Levels this adapter declares; the rest follow from `SupportMap`
    fn datatype_support(&self) -> Vec<(ValueType, TypeSupport)>;

    /// Complete type support, computed when the adapter was built
    fn type_support(&self) -> &SupportMap;

    fn supported_constructs(&self) -> BTreeSet<Construct>;

    /// Type of a value whose shape the generator cannot print back as itself
    fn unrepresentable(&self, _value: &Value) -> Option<ValueType> {
        None
    }

    fn initial_dependencies(&self) -> Vec<Dependency>;

    fn needs_selector(&self) -> bool {
        false
    }

    fn generate_statement(&self, statement: &Statement, bindings: &Bindings) -> String;

    fn generate_execution_unit(&self, unit: &ExecutionUnit<'_>) -> String;

    /// Program that prints each value as one wire line
    fn generate_encoder(&self, values: &[Value]) -> String;

    fn generate_selector(&self, _contexts: &[String]) -> Option<String> {
        None
    }

    fn generate_check_function(&self, _name: &str, _call: &FunctionCall) -> Option<String> {
        None
    }

    /// Compile `files`; the last one is the unit (or selector) being built
    fn compilation(&self, files: &[String]) -> Compilation;

    fn execution(&self, cwd: &Path, file: &str, arguments: &[String]) -> Vec<String>;

    fn cleanup_stacktrace(&self, raw: &str) -> String;

    fn linter(&self, _submission: &str) -> Option<LintCommand> {
        None
    }

    /// Last-chance rewrite of the submission file before compilation
    fn modify_solution(&self, _path: &Path) -> Result<()> {
        Ok(())
    }

    fn conventionalize(&self, category: Conventionable, name: &str) -> String {
        self.naming_conventions().apply(category, name)
    }

    fn with_extension(&self, stem: &str) -> String {
        format!("{}.{}", stem, self.file_extension())
    }

    fn submission_name(&self) -> String {
        self.conventionalize(Conventionable::Namespace, "submission")
    }

    fn submission_file(&self) -> String {
        self.with_extension(&self.submission_name())
    }

    fn context_name(&self, index: usize) -> String {
        self.conventionalize(Conventionable::Namespace, &format!("context_{}", index))
    }

    fn selector_name(&self) -> String {
        self.conventionalize(Conventionable::Namespace, "selector")
    }

    fn encoder_name(&self) -> String {
        self.conventionalize(Conventionable::Namespace, "encoder")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapters() -> Vec<Box<dyn LanguageAdapter>> {
        Language::ALL
            .iter()
            .map(|l| adapter_for(*l, &AdapterConfig::default()).unwrap())
            .collect()
    }

    #[test]
    fn test_language_from_str() {
        assert_eq!("Python".parse::<Language>().unwrap(), Language::Python);
        assert_eq!("hs".parse::<Language>().unwrap(), Language::Haskell);
        assert!("cobol".parse::<Language>().is_err());
    }

    #[test]
    fn test_shebang_names_language_and_is_removed() {
        let (source, language) = consume_shebang("\n#!tested haskell\nmain = pure ()\n");
        assert_eq!(language.as_deref(), Some("haskell"));
        assert_eq!(source, "\nmain = pure ()\n");

        let (source, language) = consume_shebang("#!tested\necho hi\n");
        assert_eq!(language, None);
        assert_eq!(source, "echo hi\n");

        // Only the first non-blank line counts
        let text = "x = 1\n#!tested python\n";
        assert_eq!(consume_shebang(text), (text.to_string(), None));
        assert_eq!(consume_shebang("#!/bin/bash\n"), ("#!/bin/bash\n".to_string(), None));
    }

    #[test]
    fn test_file_names_follow_conventions() {
        let haskell = adapter_for(Language::Haskell, &AdapterConfig::default()).unwrap();
        assert_eq!(haskell.submission_file(), "Submission.hs");
        assert_eq!(haskell.context_name(3), "Context3");
        assert_eq!(haskell.selector_name(), "Selector");

        let python = adapter_for(Language::Python, &AdapterConfig::default()).unwrap();
        assert_eq!(python.submission_file(), "submission.py");
        assert_eq!(python.context_name(0), "context_0");
    }

    #[test]
    fn test_every_adapter_covers_every_type() {
        for adapter in adapters() {
            assert_eq!(adapter.type_support().iter().count(), ValueType::ALL.len());
        }
    }

    #[test]
    fn test_declared_levels_are_respected() {
        for adapter in adapters() {
            for (ty, level) in adapter.datatype_support() {
                assert_eq!(adapter.type_support().level(ty), level, "{} {}", adapter.language(), ty);
            }
        }
    }

    #[test]
    fn test_only_selector_languages_generate_selectors() {
        for adapter in adapters() {
            let selector = adapter.generate_selector(&["context_0".to_string()]);
            assert_eq!(selector.is_some(), adapter.needs_selector(), "{}", adapter.language());
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let context = Context {
            testcases: vec![polyjudge_common::plan::Testcase {
                statement: Statement::Expression(Expression::Call(FunctionCall::function(
                    "echo_text",
                    vec![Expression::Value(Value::text("a"))],
                ))),
                expected: Some(Value::text("a")),
                checker: None,
            }],
            ..Default::default()
        };
        for adapter in adapters() {
            let name = adapter.context_name(0);
            let unit = ExecutionUnit { index: 0, name: &name, context: &context };
            assert_eq!(adapter.generate_execution_unit(&unit), adapter.generate_execution_unit(&unit));
        }
    }

    #[test]
    fn test_checker_gets_actual_first() {
        let checker = FunctionCall::function("close_to", vec![Expression::Value(Value::real(0.1))]);
        let call = checker_with_actual(&checker);
        assert!(matches!(&call.arguments[0], Expression::Identifier(n) if n == "actual"));
        assert_eq!(call.arguments.len(), 2);
    }
}
