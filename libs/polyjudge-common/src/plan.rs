/// Test plan as consumed by the judge core.
///
/// Parsing the human-authored suite happens elsewhere; this is the
/// already-parsed, language-agnostic shape. Identifiers are written in
/// snake_case and conventionalized per target language at generation time.

use crate::types::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestPlan {
    pub contexts: Vec<Context>,
}

/// One group of testcases sharing a single program run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Context {
    #[serde(default)]
    pub name: Option<String>,
    /// Command line arguments passed to the program
    #[serde(default)]
    pub arguments: Vec<String>,
    pub testcases: Vec<Testcase>,
}

impl Context {
    /// Number of value lines a correct run of this context prints
    pub fn expected_line_count(&self) -> usize {
        self.testcases.iter().filter(|t| t.produces_value()).count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Testcase {
    pub statement: Statement,
    #[serde(default)]
    pub expected: Option<Value>,
    /// Language-specific oracle, called with the actual value as first argument
    #[serde(default)]
    pub checker: Option<FunctionCall>,
}

impl Testcase {
    pub fn produces_value(&self) -> bool {
        self.expected.is_some() || self.checker.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statement {
    Expression(Expression),
    Assignment(Assignment),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub variable: String,
    pub expression: Expression,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expression {
    Value(Value),
    Identifier(String),
    Call(FunctionCall),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    #[default]
    Function,
    Constructor,
    Property,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    #[serde(default)]
    pub kind: CallKind,
    /// Object or module the call is made on
    #[serde(default)]
    pub namespace: Option<Box<Expression>>,
    pub name: String,
    #[serde(default)]
    pub arguments: Vec<Expression>,
}

impl FunctionCall {
    pub fn function(name: impl Into<String>, arguments: Vec<Expression>) -> Self {
        Self { kind: CallKind::Function, namespace: None, name: name.into(), arguments }
    }
}

impl Statement {
    /// Values appearing literally anywhere in the statement
    pub fn values(&self) -> Vec<&Value> {
        let mut out = Vec::new();
        match self {
            Statement::Expression(e) => e.collect_values(&mut out),
            Statement::Assignment(a) => a.expression.collect_values(&mut out),
        }
        out
    }
}

impl Expression {
    pub(crate) fn collect_values<'a>(&'a self, out: &mut Vec<&'a Value>) {
        match self {
            Expression::Value(v) => out.push(v),
            Expression::Identifier(_) => {}
            Expression::Call(call) => call.collect_values(out),
        }
    }
}

impl FunctionCall {
    pub fn collect_values<'a>(&'a self, out: &mut Vec<&'a Value>) {
        if let Some(ns) = &self.namespace {
            ns.collect_values(out);
        }
        for arg in &self.arguments {
            arg.collect_values(out);
        }
    }

    /// This call and every call nested in its namespace or arguments
    pub fn calls(&self) -> Vec<&FunctionCall> {
        let mut out = vec![self];
        let nested = self.namespace.iter().map(|b| b.as_ref()).chain(self.arguments.iter());
        for expression in nested {
            if let Expression::Call(inner) = expression {
                out.extend(inner.calls());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN: &str = r#"{
        "contexts": [{
            "arguments": ["--fast"],
            "testcases": [
                {"statement": {"assignment": {"variable": "total", "expression":
                    {"call": {"name": "sum_all", "arguments": [{"value": {"type": "sequence", "data": [
                        {"type": "integer", "data": 1}, {"type": "integer", "data": 2}]}}]}}}}},
                {"statement": {"expression": {"identifier": "total"}},
                 "expected": {"type": "integer", "data": 3}},
                {"statement": {"expression": {"call": {"kind": "constructor", "name": "counter"}}}}
            ]
        }]
    }"#;

    #[test]
    fn test_plan_deserializes_from_json() {
        let plan: TestPlan = serde_json::from_str(PLAN).unwrap();
        let context = &plan.contexts[0];
        assert_eq!(context.arguments, vec!["--fast"]);
        assert_eq!(context.testcases.len(), 3);
        assert_eq!(context.expected_line_count(), 1);
        assert!(matches!(context.testcases[0].statement, Statement::Assignment(_)));
        match &context.testcases[2].statement {
            Statement::Expression(Expression::Call(call)) => assert_eq!(call.kind, CallKind::Constructor),
            other => panic!("unexpected statement {:?}", other),
        }
    }

    #[test]
    fn test_statement_values_are_collected_recursively() {
        let plan: TestPlan = serde_json::from_str(PLAN).unwrap();
        let values = plan.contexts[0].testcases[0].statement.values();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].ty(), crate::types::ValueType::Sequence);
    }

    #[test]
    fn test_nested_calls_are_listed() {
        let inner = FunctionCall::function("inner", vec![]);
        let outer = FunctionCall::function("outer", vec![Expression::Call(inner)]);
        let names: Vec<_> = outer.calls().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["outer", "inner"]);
    }
}
