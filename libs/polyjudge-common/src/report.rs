// Structured results handed to the comparison/feedback stage.
// Diagnostic text in here is always normalized already.

use crate::types::{Value, ValueType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Generation,
    Compilation,
    Execution,
    Decoding,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Generation => "generation",
            Stage::Compilation => "compilation",
            Stage::Execution => "execution",
            Stage::Decoding => "decoding",
        };
        f.write_str(s)
    }
}

/// Which limit cut a process short
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitKind {
    WallClock,
    Memory,
    RunBudget,
    /// Judging was cancelled from outside
    Interrupted,
}

/// Why a context did not reach the evaluated state
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContextFailure {
    #[error("compilation failed")]
    CompileFailure { diagnostics: String },
    #[error("program exited abnormally (exit code {exit_code:?})")]
    RuntimeFailure { exit_code: Option<i32>, diagnostics: String },
    #[error("{limit:?} limit exceeded during {stage}")]
    TimedOut { stage: Stage, limit: LimitKind },
    #[error("harness produced malformed output: {message}")]
    DecodeError { message: String, diagnostics: String },
    #[error("type '{ty}' is not supported by {language}")]
    UnsupportedTypeUsage { language: String, ty: ValueType },
    #[error("construct '{construct}' is not supported by {language}")]
    UnsupportedConstruct { language: String, construct: String },
    #[error("invalid test plan: {message}")]
    InvalidPlan { message: String },
    #[error("internal judge error: {message}")]
    Internal { message: String },
}

impl ContextFailure {
    /// Failures that are the judge's or the plan's fault rather than the learner's
    pub fn is_harness_fault(&self) -> bool {
        matches!(
            self,
            ContextFailure::DecodeError { .. }
                | ContextFailure::UnsupportedTypeUsage { .. }
                | ContextFailure::UnsupportedConstruct { .. }
                | ContextFailure::InvalidPlan { .. }
                | ContextFailure::Internal { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ContextOutcome {
    Evaluated { values: Vec<Value> },
    Failed {
        failure: ContextFailure,
        #[serde(default)]
        partial_values: Vec<Value>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Correct,
    Wrong,
    /// Statement ran but nothing was expected of it
    Executed,
    /// The surrounding context failed before this testcase could be judged
    ContextFailed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestcaseResult {
    pub index: usize,
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextReport {
    pub index: usize,
    pub name: String,
    pub outcome: ContextOutcome,
    pub testcases: Vec<TestcaseResult>,
    /// Normalized stderr of the run, if any
    #[serde(default)]
    pub stderr: String,
    pub elapsed_ms: u64,
    #[serde(default)]
    pub peak_memory_kb: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// One static-analysis finding on the submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub severity: Severity,
    pub message: String,
    pub row: Option<u32>,
    pub column: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LintReport {
    pub messages: Vec<String>,
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeReport {
    pub run_id: Uuid,
    pub language: String,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub contexts: Vec<ContextReport>,
    pub lint: LintReport,
}

impl JudgeReport {
    pub fn count(&self, verdict: Verdict) -> usize {
        self.contexts
            .iter()
            .flat_map(|c| c.testcases.iter())
            .filter(|t| t.verdict == verdict)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_serializes_with_kind_tag() {
        let failure = ContextFailure::TimedOut { stage: Stage::Execution, limit: LimitKind::WallClock };
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["kind"], "timed_out");
        assert_eq!(json["stage"], "execution");
        assert_eq!(json["limit"], "wall_clock");
    }

    #[test]
    fn test_outcome_round_trips() {
        let outcome = ContextOutcome::Failed {
            failure: ContextFailure::CompileFailure { diagnostics: "<code>:1: error".into() },
            partial_values: vec![],
        };
        let text = serde_json::to_string(&outcome).unwrap();
        let back: ContextOutcome = serde_json::from_str(&text).unwrap();
        assert_eq!(back, outcome);
    }

    #[test]
    fn test_harness_faults_are_distinguished() {
        assert!(ContextFailure::DecodeError { message: "x".into(), diagnostics: String::new() }.is_harness_fault());
        assert!(!ContextFailure::RuntimeFailure { exit_code: Some(1), diagnostics: String::new() }.is_harness_fault());
        assert!(!ContextFailure::TimedOut { stage: Stage::Execution, limit: LimitKind::Memory }.is_harness_fault());
    }
}
