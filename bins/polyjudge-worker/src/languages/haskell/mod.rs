//! Haskell adapter.
//!
//! Contexts become modules of a single program compiled once, with a
//! generated selector choosing the module at run time. The submission is
//! turned into a module by prepending a header line, so every line number
//! GHC reports for it is one too high.

mod generators;
mod linter;

use crate::config::AdapterConfig;
use crate::conventions::{Conventionable, NamingConvention, NamingConventions};
use crate::features::{Construct, SupportMap, TypeSupport};
use crate::languages::{
    Bindings, Compilation, Dependency, ExecutionUnit, Language, LanguageAdapter, LintCommand,
};
use crate::stacktrace::{
    canonical_type_conflict, shift_line, Normalizer, Rule, CODE_PLACEHOLDER, PATH_PREFIX, TESTCODE_PLACEHOLDER,
};
use anyhow::{Context, Result};
use generators::Generator;
use polyjudge_common::plan::{FunctionCall, Statement};
use polyjudge_common::types::{Value, ValueType};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

const VALUES_HS: &str = include_str!("Values.hs");

/// Lines added in front of the submission by `modify_solution`
const HEADER_LINES: usize = 1;

pub struct HaskellAdapter {
    conventions: NamingConventions,
    support: SupportMap,
    normalizer: Normalizer,
    optimize: bool,
}

impl HaskellAdapter {
    pub fn new(config: &AdapterConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            conventions: NamingConventions::with_overrides(&[
                (Conventionable::Namespace, NamingConvention::PascalCase),
                (Conventionable::Identifier, NamingConvention::CamelCase),
                (Conventionable::GlobalIdentifier, NamingConvention::CamelCase),
                (Conventionable::Function, NamingConvention::CamelCase),
            ]),
            support: SupportMap::from_declared(&Self::declared()),
            normalizer: Self::normalizer()?,
            optimize: config.compiler_optimizations,
        })
    }

    fn declared() -> Vec<(ValueType, TypeSupport)> {
        use TypeSupport::*;
        vec![
            (ValueType::Integer, Supported),
            (ValueType::Real, Supported),
            (ValueType::Char, Supported),
            (ValueType::Text, Supported),
            (ValueType::Boolean, Supported),
            (ValueType::Sequence, Supported),
            (ValueType::Nothing, Supported),
            (ValueType::Int8, Supported),
            (ValueType::Uint8, Supported),
            (ValueType::Int16, Supported),
            (ValueType::Uint16, Supported),
            (ValueType::Int32, Supported),
            (ValueType::Uint32, Supported),
            (ValueType::Int64, Supported),
            (ValueType::Uint64, Supported),
            (ValueType::Bigint, Supported),
            (ValueType::SinglePrecision, Supported),
            (ValueType::DoublePrecision, Supported),
            (ValueType::List, Supported),
            (ValueType::Tuple, Supported),
            (ValueType::Set, Unsupported),
            (ValueType::Map, Unsupported),
        ]
    }

    fn normalizer() -> Result<Normalizer, regex::Error> {
        let scaffolding = r"(?:Context\d+|Selector|Values|Encoder)\.hs";
        let submission = format!(r"{}Submission\.hs", PATH_PREFIX);
        let rules = vec![
            Rule::drop("build progress", r"^\[\s*\d+ of \d+\] Compiling ")?,
            Rule::drop("linking", r"^Linking ")?,
            Rule::drop("bare undefined", r"^undefined$")?,
            Rule::drop_frame("scaffolding diagnostic", &format!(r"^{}{}:\d+", PATH_PREFIX, scaffolding))?,
            Rule::with("expected type", r"Couldn't match expected type (.+?) with actual type (.+?)\s*$", |c| {
                canonical_type_conflict(&c[1], &c[2])
            })?
            .rescuing(),
            Rule::with("type", r"Couldn't match type (.+?) with (.+?)\s*$", |c| canonical_type_conflict(&c[2], &c[1]))?
                .rescuing(),
            Rule::with("submission span", &format!(r"{}:\((\d+),(\d+)\)-\((\d+),(\d+)\)", submission), |c| {
                format!(
                    "{}:({},{})-({},{})",
                    CODE_PLACEHOLDER,
                    shift_line(&c[1], HEADER_LINES),
                    &c[2],
                    shift_line(&c[3], HEADER_LINES),
                    &c[4]
                )
            })?,
            Rule::with("submission position", &format!(r"{}:(\d+):(\d+)", submission), |c| {
                format!("{}:{}:{}", CODE_PLACEHOLDER, shift_line(&c[1], HEADER_LINES), &c[2])
            })?,
            Rule::replace("module header", "parse error on input ‘module’", "unexpected ‘module’")?,
            Rule::drop("scaffolding call site", &format!("called at {}{}", PATH_PREFIX, scaffolding))?,
            Rule::replace("program name", r"^Selector: ", "")?,
            Rule::replace("submission file", &submission, CODE_PLACEHOLDER)?,
            Rule::replace("scaffolding file", &format!("{}{}", PATH_PREFIX, scaffolding), TESTCODE_PLACEHOLDER)?,
            Rule::replace("scaffolding module", r"\bContext\d+\b", TESTCODE_PLACEHOLDER)?,
        ];
        Ok(Normalizer::new(rules).skipping_blank_lines())
    }

    fn generator(&self) -> Generator<'_> {
        Generator { conventions: &self.conventions, submission: "Submission" }
    }
}

impl LanguageAdapter for HaskellAdapter {
    fn language(&self) -> Language {
        Language::Haskell
    }

    fn file_extension(&self) -> &'static str {
        "hs"
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
            Construct::Exceptions,
            Construct::FunctionCalls,
            Construct::Assignments,
            Construct::Evaluation,
            Construct::GlobalVariables,
        ])
    }

    fn unrepresentable(&self, value: &Value) -> Option<ValueType> {
        generators::unrepresentable(value)
    }

    fn initial_dependencies(&self) -> Vec<Dependency> {
        vec![Dependency { name: "Values.hs", content: VALUES_HS }]
    }

    fn needs_selector(&self) -> bool {
        true
    }

    fn generate_statement(&self, statement: &Statement, bindings: &Bindings) -> String {
        self.generator().statement(statement, bindings)
    }

    fn generate_execution_unit(&self, unit: &ExecutionUnit<'_>) -> String {
        self.generator().execution_unit(unit)
    }

    fn generate_encoder(&self, values: &[Value]) -> String {
        generators::encoder(&self.encoder_name(), values)
    }

    fn generate_selector(&self, contexts: &[String]) -> Option<String> {
        Some(generators::selector(&self.selector_name(), contexts))
    }

    fn generate_check_function(&self, name: &str, call: &FunctionCall) -> Option<String> {
        let name = self.conventionalize(Conventionable::Function, name);
        Some(self.generator().check_function(&name, call))
    }

    fn compilation(&self, files: &[String]) -> Compilation {
        let main = match files.last() {
            Some(main) => main.clone(),
            None => return Compilation::none(),
        };
        let executable = main.trim_end_matches(".hs").to_string();
        let command = vec![
            "ghc".to_string(),
            "-fno-cse".to_string(),
            "-fno-full-laziness".to_string(),
            "-fno-diagnostics-show-caret".to_string(),
            if self.optimize { "-O3" } else { "-O0" }.to_string(),
            main,
            "-main-is".to_string(),
            executable.clone(),
            "-o".to_string(),
            executable.clone(),
        ];
        Compilation { command, outputs: vec![executable.clone()], executable: Some(executable) }
    }

    fn execution(&self, cwd: &Path, file: &str, arguments: &[String]) -> Vec<String> {
        let mut command = vec![cwd.join(file).to_string_lossy().into_owned()];
        command.extend(arguments.iter().cloned());
        command
    }

    fn cleanup_stacktrace(&self, raw: &str) -> String {
        self.normalizer.normalize(raw)
    }

    fn linter(&self, submission: &str) -> Option<LintCommand> {
        Some(LintCommand {
            command: vec!["hlint".to_string(), "--json".to_string(), submission.to_string()],
            parse: linter::parse,
        })
    }

    /// Make the submission importable as module `Submission`
    fn modify_solution(&self, path: &Path) -> Result<()> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("Failed to read submission {}", path.display()))?;
        let header = format!("module {} where\n", self.submission_name());
        fs::write(path, header + &source)
            .with_context(|| format!("Failed to write submission {}", path.display()))?;
        Ok(())
    }
}
