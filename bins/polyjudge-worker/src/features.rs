/// Type support levels and language constructs
///
/// **Core Responsibility:**
/// Decide, before anything is generated, whether a context can be routed
/// to an adapter at all.
///
/// A context is rejected when it uses a value type the adapter marks
/// `Unsupported`, or a construct the adapter's generator cannot emit.

use polyjudge_common::plan::{CallKind, Context, Expression, FunctionCall, Statement};
use polyjudge_common::report::ContextFailure;
use polyjudge_common::types::{Value, ValueType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeSupport {
    /// Native, round-trips exactly
    Supported,
    /// Approximated by the basic type
    Reduced,
    /// Must not appear in tests routed to the adapter
    Unsupported,
}

impl TypeSupport {
    pub fn is_usable(&self) -> bool {
        !matches!(self, TypeSupport::Unsupported)
    }
}

impl fmt::Display for TypeSupport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TypeSupport::Supported => "supported",
            TypeSupport::Reduced => "reduced",
            TypeSupport::Unsupported => "unsupported",
        };
        f.write_str(s)
    }
}

/// Statement and expression shapes a generator may be asked to emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Construct {
    Objects,
    Exceptions,
    FunctionCalls,
    Assignments,
    Evaluation,
    NamedArguments,
    DefaultParameters,
    GlobalVariables,
    HeterogeneousCollections,
}

impl fmt::Display for Construct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Construct::Objects => "objects",
            Construct::Exceptions => "exceptions",
            Construct::FunctionCalls => "function_calls",
            Construct::Assignments => "assignments",
            Construct::Evaluation => "evaluation",
            Construct::NamedArguments => "named_arguments",
            Construct::DefaultParameters => "default_parameters",
            Construct::GlobalVariables => "global_variables",
            Construct::HeterogeneousCollections => "heterogeneous_collections",
        };
        f.write_str(s)
    }
}

/// Complete `(type -> level)` mapping for one adapter
#[derive(Debug, Clone, PartialEq)]
pub struct SupportMap {
    levels: BTreeMap<ValueType, TypeSupport>,
}

impl SupportMap {
    /// Fill in every type from the levels an adapter declares
    ///
    /// Declared levels win. An undeclared advanced type is reduced when its
    /// basic type is usable; undeclared basic types are unsupported.
    pub fn from_declared(declared: &[(ValueType, TypeSupport)]) -> Self {
        let declared: BTreeMap<_, _> = declared.iter().copied().collect();
        let mut levels = BTreeMap::new();

        for ty in ValueType::ALL.iter().filter(|t| t.is_basic()) {
            let level = declared.get(ty).copied().unwrap_or(TypeSupport::Unsupported);
            levels.insert(*ty, level);
        }
        for ty in ValueType::ALL.iter().filter(|t| !t.is_basic()) {
            let level = match declared.get(ty) {
                Some(level) => *level,
                None if levels[&ty.basic()].is_usable() => TypeSupport::Reduced,
                None => TypeSupport::Unsupported,
            };
            levels.insert(*ty, level);
        }

        Self { levels }
    }

    pub fn level(&self, ty: ValueType) -> TypeSupport {
        self.levels.get(&ty).copied().unwrap_or(TypeSupport::Unsupported)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ValueType, TypeSupport)> + '_ {
        self.levels.iter().map(|(t, l)| (*t, *l))
    }

    /// First unusable type in the value tree, if any
    pub fn first_unsupported(&self, value: &Value) -> Option<ValueType> {
        value.types_used().into_iter().find(|t| !self.level(*t).is_usable())
    }
}

/// Types and constructs a context needs from its adapter
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Requirements {
    pub types: BTreeSet<ValueType>,
    pub constructs: BTreeSet<Construct>,
}

fn call_requirements(call: &FunctionCall, known: &HashSet<String>, req: &mut Requirements) {
    for inner in call.calls() {
        match inner.kind {
            CallKind::Function => {
                req.constructs.insert(Construct::FunctionCalls);
            }
            CallKind::Constructor | CallKind::Property => {
                req.constructs.insert(Construct::Objects);
            }
        }
        let nested = inner.namespace.iter().map(|b| b.as_ref()).chain(inner.arguments.iter());
        for expression in nested {
            if let Expression::Identifier(name) = expression {
                if !known.contains(name) {
                    req.constructs.insert(Construct::GlobalVariables);
                }
            }
        }
    }
}

fn value_requirements(value: &Value, req: &mut Requirements) {
    req.types.extend(value.types_used());
    if value.is_heterogeneous() {
        req.constructs.insert(Construct::HeterogeneousCollections);
    }
}

/// Every literal value a context mentions: statements, expected values, checkers
pub fn context_values(context: &Context) -> Vec<&Value> {
    let mut values = Vec::new();
    for testcase in &context.testcases {
        values.extend(testcase.statement.values());
        values.extend(testcase.expected.iter());
        if let Some(checker) = &testcase.checker {
            checker.collect_values(&mut values);
        }
    }
    values
}

/// Collect everything a context asks of the adapter
pub fn requirements(context: &Context) -> Requirements {
    let mut req = Requirements::default();
    let mut assigned: HashSet<String> = HashSet::new();

    for value in context_values(context) {
        value_requirements(value, &mut req);
    }

    for testcase in &context.testcases {
        if let Some(checker) = &testcase.checker {
            req.constructs.insert(Construct::Evaluation);
            call_requirements(checker, &assigned, &mut req);
        }

        let expression = match &testcase.statement {
            Statement::Expression(e) => e,
            Statement::Assignment(a) => {
                req.constructs.insert(Construct::Assignments);
                &a.expression
            }
        };
        match expression {
            Expression::Call(call) => call_requirements(call, &assigned, &mut req),
            Expression::Identifier(name) if !assigned.contains(name) => {
                req.constructs.insert(Construct::GlobalVariables);
            }
            _ => {}
        }

        if let Statement::Assignment(a) = &testcase.statement {
            assigned.insert(a.variable.clone());
        }
    }

    req
}

/// Reject a context the adapter cannot faithfully run
///
/// `unrepresentable` names the type of a value whose types are all usable
/// but whose shape the adapter still cannot print back as itself.
pub fn check_context(
    language: &str,
    support: &SupportMap,
    constructs: &BTreeSet<Construct>,
    unrepresentable: impl Fn(&Value) -> Option<ValueType>,
    context: &Context,
) -> Result<(), ContextFailure> {
    for (i, testcase) in context.testcases.iter().enumerate() {
        if matches!(testcase.statement, Statement::Assignment(_)) && testcase.produces_value() {
            return Err(ContextFailure::InvalidPlan {
                message: format!("testcase {} is an assignment but expects a value", i),
            });
        }
    }

    let req = requirements(context);
    if let Some(ty) = req.types.iter().find(|t| !support.level(**t).is_usable()) {
        return Err(ContextFailure::UnsupportedTypeUsage { language: language.to_string(), ty: *ty });
    }
    if let Some(construct) = req.constructs.iter().find(|c| !constructs.contains(*c)) {
        return Err(ContextFailure::UnsupportedConstruct {
            language: language.to_string(),
            construct: construct.to_string(),
        });
    }
    if let Some(ty) = context_values(context).into_iter().find_map(unrepresentable) {
        return Err(ContextFailure::UnsupportedTypeUsage { language: language.to_string(), ty });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyjudge_common::plan::{Assignment, Testcase};
    use polyjudge_common::types::Data;

    fn testcase(statement: Statement, expected: Option<Value>) -> Testcase {
        Testcase { statement, expected, checker: None }
    }

    fn call(name: &str, arguments: Vec<Expression>) -> Expression {
        Expression::Call(FunctionCall::function(name, arguments))
    }

    #[test]
    fn test_support_map_fills_advanced_types() {
        let map = SupportMap::from_declared(&[
            (ValueType::Text, TypeSupport::Supported),
            (ValueType::Char, TypeSupport::Reduced),
            (ValueType::Integer, TypeSupport::Supported),
            (ValueType::Int8, TypeSupport::Unsupported),
        ]);
        assert_eq!(map.level(ValueType::Text), TypeSupport::Supported);
        assert_eq!(map.level(ValueType::Char), TypeSupport::Reduced);
        assert_eq!(map.level(ValueType::Int16), TypeSupport::Reduced);
        assert_eq!(map.level(ValueType::Int8), TypeSupport::Unsupported);
        assert_eq!(map.level(ValueType::Real), TypeSupport::Unsupported);
        assert_eq!(map.level(ValueType::DoublePrecision), TypeSupport::Unsupported);
        assert_eq!(map.iter().count(), ValueType::ALL.len());
    }

    #[test]
    fn test_first_unsupported_looks_inside_collections() {
        let map = SupportMap::from_declared(&[
            (ValueType::Sequence, TypeSupport::Supported),
            (ValueType::Integer, TypeSupport::Supported),
        ]);
        let v = Value::sequence(vec![Value::integer(1), Value::text("x")]);
        assert_eq!(map.first_unsupported(&v), Some(ValueType::Text));
        assert_eq!(map.first_unsupported(&Value::integer(1)), None);
    }

    #[test]
    fn test_requirements_of_calls_and_assignments() {
        let context = Context {
            name: None,
            arguments: vec![],
            testcases: vec![
                testcase(
                    Statement::Assignment(Assignment {
                        variable: "x".into(),
                        expression: call("make", vec![Expression::Value(Value::integer(1))]),
                    }),
                    None,
                ),
                testcase(
                    Statement::Expression(call("double", vec![Expression::Identifier("x".into())])),
                    Some(Value::integer(2)),
                ),
            ],
        };
        let req = requirements(&context);
        assert!(req.constructs.contains(&Construct::Assignments));
        assert!(req.constructs.contains(&Construct::FunctionCalls));
        assert!(!req.constructs.contains(&Construct::GlobalVariables));
        assert!(req.types.contains(&ValueType::Integer));
    }

    #[test]
    fn test_unassigned_identifier_requires_globals() {
        let context = Context {
            testcases: vec![testcase(
                Statement::Expression(Expression::Identifier("limit".into())),
                Some(Value::integer(10)),
            )],
            ..Default::default()
        };
        assert!(requirements(&context).constructs.contains(&Construct::GlobalVariables));
    }

    #[test]
    fn test_check_context_rejects_unsupported_type_before_generation() {
        let support = SupportMap::from_declared(&[(ValueType::Text, TypeSupport::Supported)]);
        let constructs = BTreeSet::from([Construct::FunctionCalls]);
        let context = Context {
            testcases: vec![testcase(
                Statement::Expression(call("f", vec![])),
                Some(Value::integer(1)),
            )],
            ..Default::default()
        };
        let err = check_context("bash", &support, &constructs, |_| None, &context).unwrap_err();
        assert_eq!(
            err,
            ContextFailure::UnsupportedTypeUsage { language: "bash".into(), ty: ValueType::Integer }
        );
    }

    #[test]
    fn test_check_context_rejects_missing_construct() {
        let support = SupportMap::from_declared(&[
            (ValueType::Sequence, TypeSupport::Supported),
            (ValueType::Integer, TypeSupport::Supported),
            (ValueType::Text, TypeSupport::Supported),
        ]);
        let constructs = BTreeSet::from([Construct::FunctionCalls]);
        let mixed = Value::sequence(vec![Value::integer(1), Value::text("a")]);
        let context = Context {
            testcases: vec![testcase(Statement::Expression(call("f", vec![Expression::Value(mixed)])), None)],
            ..Default::default()
        };
        let err = check_context("haskell", &support, &constructs, |_| None, &context).unwrap_err();
        assert!(matches!(err, ContextFailure::UnsupportedConstruct { ref construct, .. } if construct == "heterogeneous_collections"));
    }

    #[test]
    fn test_assignment_with_expected_value_is_invalid() {
        let context = Context {
            testcases: vec![testcase(
                Statement::Assignment(Assignment { variable: "x".into(), expression: Expression::Value(Value::integer(1)) }),
                Some(Value::integer(1)),
            )],
            ..Default::default()
        };
        let support = SupportMap::from_declared(&[(ValueType::Integer, TypeSupport::Supported)]);
        let constructs = BTreeSet::from([Construct::Assignments]);
        assert!(matches!(
            check_context("python", &support, &constructs, |_| None, &context),
            Err(ContextFailure::InvalidPlan { .. })
        ));
    }

    #[test]
    fn test_check_context_rejects_unrepresentable_shape() {
        let support = SupportMap::from_declared(&[
            (ValueType::Sequence, TypeSupport::Supported),
            (ValueType::Char, TypeSupport::Supported),
        ]);
        let constructs = BTreeSet::from([Construct::FunctionCalls]);
        let chars = Value::sequence(vec![Value::char('a'), Value::char('b')]);
        let context = Context {
            testcases: vec![testcase(Statement::Expression(call("f", vec![])), Some(chars))],
            ..Default::default()
        };
        let no_chars = |v: &Value| match v.data() {
            Data::Items(items) if items.iter().any(|i| i.ty() == ValueType::Char) => Some(v.ty()),
            _ => None,
        };
        assert_eq!(
            check_context("haskell", &support, &constructs, no_chars, &context),
            Err(ContextFailure::UnsupportedTypeUsage { language: "haskell".into(), ty: ValueType::Sequence })
        );
        assert!(check_context("haskell", &support, &constructs, |_| None, &context).is_ok());
    }
}
