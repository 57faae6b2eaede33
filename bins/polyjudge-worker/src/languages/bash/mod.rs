//! Bash adapter. Only strings exist, so only text round-trips.

mod generators;
mod linter;

use crate::config::AdapterConfig;
use crate::conventions::{Conventionable, NamingConvention, NamingConventions};
use crate::features::{Construct, SupportMap, TypeSupport};
use crate::languages::{
    Bindings, Compilation, Dependency, ExecutionUnit, Language, LanguageAdapter, LintCommand,
};
use crate::stacktrace::{line_keywords, Normalizer, Rule, CODE_PLACEHOLDER, PATH_PREFIX, TESTCODE_PLACEHOLDER};
use polyjudge_common::plan::Statement;
use polyjudge_common::types::{Value, ValueType};
use std::collections::BTreeSet;
use std::path::Path;

const VALUES_SH: &str = include_str!("values.sh");

pub struct BashAdapter {
    conventions: NamingConventions,
    support: SupportMap,
    normalizer: Normalizer,
}

impl BashAdapter {
    pub fn new(config: &AdapterConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            conventions: NamingConventions::with_overrides(&[(
                Conventionable::GlobalIdentifier,
                NamingConvention::MacroCase,
            )]),
            support: SupportMap::from_declared(&Self::declared()),
            normalizer: Self::normalizer(&config.natural_language)?,
        })
    }

    fn declared() -> Vec<(ValueType, TypeSupport)> {
        vec![
            (ValueType::Text, TypeSupport::Supported),
            (ValueType::Char, TypeSupport::Reduced),
        ]
    }

    fn normalizer(natural_language: &str) -> Result<Normalizer, regex::Error> {
        let keywords = line_keywords(natural_language).join("|");
        let scaffolding = r"(?:context_\d+|values|encoder)\.sh";
        Ok(Normalizer::new(vec![
            Rule::replace(
                "submission line",
                &format!(r"{}submission\.sh: (?:{}) (\d+)", PATH_PREFIX, keywords),
                &format!("{}:${{1}}", CODE_PLACEHOLDER),
            )?,
            Rule::replace(
                "scaffolding line",
                &format!(r"{}{}: [a-zA-Z_]+ \d+:", PATH_PREFIX, scaffolding),
                &format!("{}:", TESTCODE_PLACEHOLDER),
            )?,
            Rule::replace("submission file", &format!(r"{}submission\.sh", PATH_PREFIX), CODE_PLACEHOLDER)?,
            Rule::replace("scaffolding file", &format!("{}{}", PATH_PREFIX, scaffolding), TESTCODE_PLACEHOLDER)?,
        ]))
    }
}

impl LanguageAdapter for BashAdapter {
    fn language(&self) -> Language {
        Language::Bash
    }

    fn file_extension(&self) -> &'static str {
        "sh"
    }

    fn naming_conventions(&self) -> &NamingConventions {
        &self.conventions
    }

    fn datatype_support(&self) -> Vec<(ValueType, TypeSupport)> {
        Self::declared()
    }

    fn type_support(&self) -> &SupportMap {
        &self.support
    }

    fn supported_constructs(&self) -> BTreeSet<Construct> {
        BTreeSet::from([
            Construct::FunctionCalls,
            Construct::Assignments,
            Construct::DefaultParameters,
            Construct::GlobalVariables,
        ])
    }

    fn initial_dependencies(&self) -> Vec<Dependency> {
        vec![Dependency { name: "values.sh", content: VALUES_SH }]
    }

    fn generate_statement(&self, statement: &Statement, bindings: &Bindings) -> String {
        generators::statement(&self.conventions, statement, bindings)
    }

    fn generate_execution_unit(&self, unit: &ExecutionUnit<'_>) -> String {
        generators::execution_unit(&self.conventions, &self.submission_file(), unit)
    }

    fn generate_encoder(&self, values: &[Value]) -> String {
        generators::encoder(values)
    }

    /// Syntax check of the submission; the generated files are trusted
    fn compilation(&self, files: &[String]) -> Compilation {
        let submission = self.submission_file();
        if files.iter().any(|f| *f == submission) {
            Compilation {
                command: vec!["bash".to_string(), "-n".to_string(), submission],
                outputs: files.to_vec(),
                executable: None,
            }
        } else {
            Compilation::none()
        }
    }

    fn execution(&self, _cwd: &Path, file: &str, arguments: &[String]) -> Vec<String> {
        let mut command = vec!["bash".to_string(), file.to_string()];
        command.extend(arguments.iter().cloned());
        command
    }

    fn cleanup_stacktrace(&self, raw: &str) -> String {
        self.normalizer.normalize(raw)
    }

    fn linter(&self, submission: &str) -> Option<LintCommand> {
        Some(LintCommand {
            command: vec!["shellcheck".to_string(), "-f".to_string(), "json".to_string(), submission.to_string()],
            parse: linter::parse,
        })
    }
}
