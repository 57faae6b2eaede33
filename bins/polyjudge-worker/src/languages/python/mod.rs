//! Python adapter, the reference implementation of the contract.

mod generators;
mod linter;

use crate::config::AdapterConfig;
use crate::conventions::{Conventionable, NamingConventions};
use crate::features::{Construct, SupportMap, TypeSupport};
use crate::languages::{
    Bindings, Compilation, Dependency, ExecutionUnit, Language, LanguageAdapter, LintCommand,
};
use crate::stacktrace::{Normalizer, Rule, CODE_PLACEHOLDER, PATH_PREFIX, TESTCODE_PLACEHOLDER};
use polyjudge_common::plan::{FunctionCall, Statement};
use polyjudge_common::types::{Value, ValueType};
use std::collections::BTreeSet;
use std::path::Path;

const VALUES_PY: &str = include_str!("values.py");

pub struct PythonAdapter {
    conventions: NamingConventions,
    support: SupportMap,
    normalizer: Normalizer,
}

impl PythonAdapter {
    pub fn new(_config: &AdapterConfig) -> Result<Self, regex::Error> {
        let declared = Self::declared();
        Ok(Self {
            conventions: NamingConventions::with_overrides(&[]),
            support: SupportMap::from_declared(&declared),
            normalizer: Self::normalizer()?,
        })
    }

    fn declared() -> Vec<(ValueType, TypeSupport)> {
        use TypeSupport::*;
        vec![
            (ValueType::Integer, Supported),
            (ValueType::Real, Supported),
            (ValueType::Boolean, Supported),
            (ValueType::Text, Supported),
            (ValueType::Sequence, Supported),
            (ValueType::Set, Supported),
            (ValueType::Map, Supported),
            (ValueType::Nothing, Supported),
            (ValueType::List, Supported),
            (ValueType::Tuple, Supported),
            (ValueType::Bigint, Supported),
            (ValueType::DoublePrecision, Supported),
            (ValueType::Char, Reduced),
        ]
    }

    fn normalizer() -> Result<Normalizer, regex::Error> {
        let scaffolding = r"(?:context_\d+|values|encoder)\.py";
        Ok(Normalizer::new(vec![
            Rule::drop_frame(
                "scaffolding frame",
                &format!(r#"^\s*File "{}{}", line \d+"#, PATH_PREFIX, scaffolding),
            )?,
            Rule::replace(
                "submission frame",
                &format!(r#"File "{}submission\.py", line (\d+)(?:, in .*)?"#, PATH_PREFIX),
                &format!(r#"File "{}:${{1}}""#, CODE_PLACEHOLDER),
            )?,
            Rule::replace(
                "syntax error location",
                &format!(r"\({}submission\.py, line (\d+)\)", PATH_PREFIX),
                &format!("({}:${{1}})", CODE_PLACEHOLDER),
            )?,
            Rule::replace("submission file", &format!(r"{}submission\.py", PATH_PREFIX), CODE_PLACEHOLDER)?,
            Rule::replace("scaffolding file", &format!("{}{}", PATH_PREFIX, scaffolding), TESTCODE_PLACEHOLDER)?,
        ]))
    }
}

impl LanguageAdapter for PythonAdapter {
    fn language(&self) -> Language {
        Language::Python
    }

    fn file_extension(&self) -> &'static str {
        "py"
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
            Construct::Objects,
            Construct::Exceptions,
            Construct::FunctionCalls,
            Construct::Assignments,
            Construct::Evaluation,
            Construct::NamedArguments,
            Construct::DefaultParameters,
            Construct::GlobalVariables,
            Construct::HeterogeneousCollections,
        ])
    }

    fn initial_dependencies(&self) -> Vec<Dependency> {
        vec![Dependency { name: "values.py", content: VALUES_PY }]
    }

    fn generate_statement(&self, statement: &Statement, bindings: &Bindings) -> String {
        generators::statement(&self.conventions, statement, bindings)
    }

    fn generate_execution_unit(&self, unit: &ExecutionUnit<'_>) -> String {
        generators::execution_unit(&self.conventions, &self.submission_name(), unit)
    }

    fn generate_encoder(&self, values: &[Value]) -> String {
        generators::encoder(values)
    }

    fn generate_check_function(&self, name: &str, call: &FunctionCall) -> Option<String> {
        let name = self.conventionalize(Conventionable::Function, name);
        Some(generators::check_function(&self.conventions, &name, call))
    }

    /// Byte-compiles every file; a syntax error anywhere fails the compile
    fn compilation(&self, files: &[String]) -> Compilation {
        let sources: Vec<&String> = files.iter().filter(|f| f.ends_with(".py")).collect();
        if sources.is_empty() {
            return Compilation::none();
        }
        let mut command: Vec<String> = ["python3", "-W", "ignore", "-m", "compileall", "-q", "-b"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        command.extend(sources.iter().map(|s| s.to_string()));
        Compilation {
            command,
            outputs: sources.iter().map(|s| format!("{}c", s)).collect(),
            executable: None,
        }
    }

    fn execution(&self, _cwd: &Path, file: &str, arguments: &[String]) -> Vec<String> {
        let mut command = vec!["python3".to_string(), "-u".to_string(), file.to_string()];
        command.extend(arguments.iter().cloned());
        command
    }

    fn cleanup_stacktrace(&self, raw: &str) -> String {
        self.normalizer.normalize(raw)
    }

    fn linter(&self, submission: &str) -> Option<LintCommand> {
        Some(LintCommand {
            command: vec!["pylint".to_string(), "--output-format=json".to_string(), submission.to_string()],
            parse: linter::parse,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> PythonAdapter {
        PythonAdapter::new(&AdapterConfig::default()).unwrap()
    }

    #[test]
    fn test_reduced_char_and_fixed_width_types() {
        let adapter = adapter();
        assert_eq!(adapter.type_support().level(ValueType::Char), TypeSupport::Reduced);
        assert_eq!(adapter.type_support().level(ValueType::Int32), TypeSupport::Reduced);
        assert_eq!(adapter.type_support().level(ValueType::Set), TypeSupport::Supported);
    }

    #[test]
    fn test_compilation_lists_bytecode_outputs() {
        let files = vec!["values.py".to_string(), "submission.py".to_string(), "context_0.py".to_string()];
        let compilation = adapter().compilation(&files);
        assert_eq!(&compilation.command[..5], &["python3", "-W", "ignore", "-m", "compileall"]);
        assert!(compilation.command.ends_with(&files));
        assert_eq!(compilation.outputs, vec!["values.pyc", "submission.pyc", "context_0.pyc"]);
        assert!(adapter().compilation(&[]).is_noop());
    }

    #[test]
    fn test_execution_command() {
        let command = adapter().execution(Path::new("/tmp"), "context_0.py", &["a".to_string()]);
        assert_eq!(command, vec!["python3", "-u", "context_0.py", "a"]);
    }

    #[test]
    fn test_cleanup_runtime_traceback() {
        let raw = "Traceback (most recent call last):\n  File \"/tmp/run/context_0.py\", line 7, in <module>\n    __judge_value = f()\n  File \"./submission.py\", line 1, in <module>\n    print(\"hello\" + 5)\nTypeError: can only concatenate str (not \"int\") to str\n";
        let expected = "Traceback (most recent call last):\n  File \"<code>:1\"\n    print(\"hello\" + 5)\nTypeError: can only concatenate str (not \"int\") to str\n";
        assert_eq!(adapter().cleanup_stacktrace(raw), expected);
    }

    #[test]
    fn test_cleanup_compile_error() {
        let raw = "*** Error compiling './submission.py'...\n  File \"./submission.py\", line 9\n    def f(:\n          ^\nSyntaxError: invalid syntax\nSorry: IndentationError: unexpected indent (submission.py, line 9)\n";
        let cleaned = adapter().cleanup_stacktrace(raw);
        assert!(cleaned.contains("*** Error compiling '<code>'..."));
        assert!(cleaned.contains("  File \"<code>:9\"\n"));
        assert!(cleaned.contains("(<code>:9)"));
        assert!(!cleaned.contains("submission.py"));
    }

    #[test]
    fn test_cleanup_is_idempotent() {
        let raw = "  File \"/w/context_12.py\", line 3, in <module>\n    from submission import *\n  File \"/w/submission.py\", line 4, in <module>\n    x = 1 / 0\nZeroDivisionError: division by zero\n";
        let adapter = adapter();
        let once = adapter.cleanup_stacktrace(raw);
        assert_eq!(adapter.cleanup_stacktrace(&once), once);
        assert!(!once.contains("context_12"));
    }
}
