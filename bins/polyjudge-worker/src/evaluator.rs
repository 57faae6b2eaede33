/// Testcase Evaluator - Pairs Decoded Values With Expectations
///
/// **Core Responsibility:**
/// Turn one context's outcome into per-testcase verdicts.
///
/// **Critical Properties:**
/// - Knows nothing about processes or languages
/// - Pure function: (context, outcome) → verdicts
///
/// **Rules:**
/// - Value lines are consumed in order, one per testcase that produces a value
/// - Expected values compare with `Value::matches` (basic-type equality),
///   so a reduced type still compares equal to what was asked for
/// - A checker's result must be boolean `true`
/// - A failed context marks every testcase `ContextFailed`; values that
///   arrived before the failure are kept as `actual`

use polyjudge_common::plan::Context;
use polyjudge_common::report::{ContextOutcome, TestcaseResult, Verdict};
use polyjudge_common::types::Value;

pub fn evaluate_context(context: &Context, outcome: &ContextOutcome) -> Vec<TestcaseResult> {
    let (values, failed) = match outcome {
        ContextOutcome::Evaluated { values } => (values, false),
        ContextOutcome::Failed { partial_values, .. } => (partial_values, true),
    };
    let mut values = values.iter();

    context
        .testcases
        .iter()
        .enumerate()
        .map(|(index, testcase)| {
            let actual = if testcase.produces_value() { values.next().cloned() } else { None };

            let verdict = if failed {
                Verdict::ContextFailed
            } else {
                match (&testcase.expected, &testcase.checker, &actual) {
                    (Some(expected), _, Some(actual)) if expected.matches(actual) => Verdict::Correct,
                    (Some(_), _, _) => Verdict::Wrong,
                    (None, Some(_), Some(actual)) if actual.matches(&Value::boolean(true)) => Verdict::Correct,
                    (None, Some(_), _) => Verdict::Wrong,
                    (None, None, _) => Verdict::Executed,
                }
            };

            TestcaseResult { index, verdict, expected: testcase.expected.clone(), actual }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyjudge_common::plan::{Expression, FunctionCall, Statement, Testcase};
    use polyjudge_common::report::ContextFailure;
    use polyjudge_common::types::ValueType;

    /// Helper to create a testcase calling `f`
    fn make_test_case(expected: Option<Value>) -> Testcase {
        Testcase {
            statement: Statement::Expression(Expression::Call(FunctionCall::function("f", vec![]))),
            expected,
            checker: None,
        }
    }

    fn make_checked_case() -> Testcase {
        Testcase { checker: Some(FunctionCall::function("is_valid", vec![])), ..make_test_case(None) }
    }

    fn make_context(testcases: Vec<Testcase>) -> Context {
        Context { testcases, ..Default::default() }
    }

    #[test]
    fn test_correct_and_wrong() {
        let context = make_context(vec![
            make_test_case(Some(Value::integer(1))),
            make_test_case(Some(Value::text("a"))),
        ]);
        let outcome = ContextOutcome::Evaluated { values: vec![Value::integer(1), Value::text("b")] };
        let results = evaluate_context(&context, &outcome);
        assert_eq!(results[0].verdict, Verdict::Correct);
        assert_eq!(results[1].verdict, Verdict::Wrong);
        assert_eq!(results[1].actual, Some(Value::text("b")));
    }

    #[test]
    fn test_reduced_char_matches_text() {
        let context = make_context(vec![make_test_case(Some(Value::char('x')))]);
        let outcome = ContextOutcome::Evaluated { values: vec![Value::text("x")] };
        assert_eq!(evaluate_context(&context, &outcome)[0].verdict, Verdict::Correct);
    }

    #[test]
    fn test_sets_ignore_order_sequences_do_not() {
        let ints = |xs: &[i128]| xs.iter().map(|x| Value::integer(*x)).collect::<Vec<_>>();
        let context = make_context(vec![
            make_test_case(Some(Value::set(ints(&[1, 2, 3])))),
            make_test_case(Some(Value::sequence(ints(&[1, 2, 3])))),
        ]);
        let outcome = ContextOutcome::Evaluated {
            values: vec![Value::set(ints(&[3, 1, 2])), Value::sequence(ints(&[3, 1, 2]))],
        };
        let results = evaluate_context(&context, &outcome);
        assert_eq!(results[0].verdict, Verdict::Correct);
        assert_eq!(results[1].verdict, Verdict::Wrong);
    }

    #[test]
    fn test_statements_without_value_consume_no_line() {
        let context = make_context(vec![
            make_test_case(None),
            make_test_case(Some(Value::boolean(false))),
        ]);
        let outcome = ContextOutcome::Evaluated { values: vec![Value::boolean(false)] };
        let results = evaluate_context(&context, &outcome);
        assert_eq!(results[0].verdict, Verdict::Executed);
        assert_eq!(results[0].actual, None);
        assert_eq!(results[1].verdict, Verdict::Correct);
    }

    #[test]
    fn test_checker_result_must_be_true() {
        let context = make_context(vec![make_checked_case(), make_checked_case(), make_checked_case()]);
        let outcome = ContextOutcome::Evaluated {
            values: vec![Value::boolean(true), Value::boolean(false), Value::text("true")],
        };
        let verdicts: Vec<_> = evaluate_context(&context, &outcome).iter().map(|r| r.verdict).collect();
        assert_eq!(verdicts, vec![Verdict::Correct, Verdict::Wrong, Verdict::Wrong]);
    }

    #[test]
    fn test_failed_context_keeps_partial_values() {
        let context = make_context(vec![
            make_test_case(Some(Value::integer(1))),
            make_test_case(Some(Value::integer(2))),
        ]);
        let outcome = ContextOutcome::Failed {
            failure: ContextFailure::RuntimeFailure { exit_code: Some(1), diagnostics: "boom".into() },
            partial_values: vec![Value::integer(1)],
        };
        let results = evaluate_context(&context, &outcome);
        assert!(results.iter().all(|r| r.verdict == Verdict::ContextFailed));
        assert_eq!(results[0].actual, Some(Value::integer(1)));
        assert_eq!(results[1].actual, None);
    }

    #[test]
    fn test_special_floats_compare_by_classification() {
        let inf = Value::special(ValueType::DoublePrecision, polyjudge_common::types::SpecialNumber::PositiveInfinity);
        let context = make_context(vec![make_test_case(Some(inf)), make_test_case(Some(Value::real(f64::NAN)))]);
        let outcome = ContextOutcome::Evaluated { values: vec![Value::real(f64::INFINITY), Value::real(f64::NAN)] };
        let results = evaluate_context(&context, &outcome);
        assert_eq!(results[0].verdict, Verdict::Correct);
        assert_eq!(results[1].verdict, Verdict::Correct);
    }
}
