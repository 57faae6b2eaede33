// Bash source generation. Every value is a string here; calls are
// captured with command substitution and handed to `send_value`.
//
// Command substitution strips trailing newlines, so captures that become
// values or variables end in a sentinel `x` that is removed afterwards.
// Calls nested as arguments of other calls are still plain substitutions.

use crate::conventions::{Conventionable, NamingConventions};
use crate::languages::{Bindings, ExecutionUnit};
use polyjudge_common::plan::{Expression, FunctionCall, Statement};
use polyjudge_common::types::{Data, Value};
use std::fmt::Write;

const VALUE_VARIABLE: &str = "__polyjudge_value";

pub fn string_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', r"'\''"))
}

pub fn value(v: &Value) -> String {
    match v.data() {
        Data::Text(s) => string_literal(s),
        _ => string_literal(&v.to_string()),
    }
}

fn call(conventions: &NamingConventions, call: &FunctionCall, bindings: &Bindings) -> String {
    let mut parts = vec![conventions.apply(Conventionable::Function, &call.name)];
    parts.extend(call.arguments.iter().map(|a| word(conventions, a, bindings)));
    parts.join(" ")
}

/// One shell word for an expression
pub fn word(conventions: &NamingConventions, expression: &Expression, bindings: &Bindings) -> String {
    match expression {
        Expression::Value(v) => value(v),
        Expression::Identifier(name) if bindings.is_local(name) => {
            format!("\"${}\"", conventions.apply(Conventionable::Identifier, name))
        }
        Expression::Identifier(name) => format!("\"${}\"", conventions.apply(Conventionable::GlobalIdentifier, name)),
        Expression::Call(c) => format!("\"$({})\"", call(conventions, c, bindings)),
    }
}

/// Store the stdout of a call in `variable`, trailing newlines included
fn capture(variable: &str, conventions: &NamingConventions, c: &FunctionCall, bindings: &Bindings) -> String {
    format!(
        "{v}=\"$({call}; printf x)\"; {v}=\"${{{v}%x}}\"",
        v = variable,
        call = call(conventions, c, bindings)
    )
}

pub fn statement(conventions: &NamingConventions, statement: &Statement, bindings: &Bindings) -> String {
    match statement {
        Statement::Assignment(a) => {
            let variable = conventions.apply(Conventionable::Identifier, &a.variable);
            match &a.expression {
                Expression::Call(c) => capture(&variable, conventions, c, bindings),
                other => format!("{}={}", variable, word(conventions, other, bindings)),
            }
        }
        Statement::Expression(Expression::Call(c)) => call(conventions, c, bindings),
        Statement::Expression(other) => format!(": {}", word(conventions, other, bindings)),
    }
}

pub fn execution_unit(conventions: &NamingConventions, submission_file: &str, unit: &ExecutionUnit<'_>) -> String {
    let mut out = String::from("#!/bin/bash\n");
    out.push_str("source ./values.sh\n");
    let _ = writeln!(out, "source ./{} >&2\n", submission_file);

    let mut bindings = Bindings::default();
    for testcase in &unit.context.testcases {
        match &testcase.statement {
            Statement::Expression(Expression::Call(c)) if testcase.produces_value() => {
                let _ = writeln!(out, "{}", capture(VALUE_VARIABLE, conventions, c, &bindings));
                let _ = writeln!(out, "send_value \"${}\"", VALUE_VARIABLE);
            }
            Statement::Expression(e) if testcase.produces_value() => {
                let _ = writeln!(out, "send_value {}", word(conventions, e, &bindings));
            }
            Statement::Expression(Expression::Call(_)) => {
                let _ = writeln!(out, "{} >&2", statement(conventions, &testcase.statement, &bindings));
            }
            other => {
                let _ = writeln!(out, "{}", statement(conventions, other, &bindings));
            }
        }
        bindings.bind(&testcase.statement);
    }
    out
}

pub fn encoder(values: &[Value]) -> String {
    let mut out = String::from("#!/bin/bash\nsource ./values.sh\n\n");
    for v in values {
        let _ = writeln!(out, "send_value {}", value(v));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyjudge_common::plan::{Assignment, Context, Testcase};

    fn conventions() -> NamingConventions {
        NamingConventions::with_overrides(&[(
            Conventionable::GlobalIdentifier,
            crate::conventions::NamingConvention::MacroCase,
        )])
    }

    #[test]
    fn test_single_quotes_are_escaped() {
        assert_eq!(string_literal("it's"), r"'it'\''s'");
        assert_eq!(string_literal("\"hallo\""), "'\"hallo\"'");
    }

    #[test]
    fn test_words() {
        let bindings = Bindings::with(&["total"]);
        let c = FunctionCall::function("join_words", vec![Expression::Value(Value::text("a b")), Expression::Identifier("total".into())]);
        assert_eq!(word(&conventions(), &Expression::Call(c), &bindings), "\"$(join_words 'a b' \"$total\")\"");
        assert_eq!(word(&conventions(), &Expression::Identifier("limit".into()), &bindings), "\"$LIMIT\"");
    }

    #[test]
    fn test_assigned_call_keeps_trailing_newlines() {
        let assignment = Statement::Assignment(Assignment {
            variable: "line".into(),
            expression: Expression::Call(FunctionCall::function("read_line", vec![])),
        });
        assert_eq!(
            statement(&conventions(), &assignment, &Bindings::default()),
            "line=\"$(read_line; printf x)\"; line=\"${line%x}\""
        );
    }

    #[test]
    fn test_execution_unit() {
        let context = Context {
            testcases: vec![
                Testcase {
                    statement: Statement::Assignment(Assignment {
                        variable: "name".into(),
                        expression: Expression::Value(Value::text("bob")),
                    }),
                    expected: None,
                    checker: None,
                },
                Testcase {
                    statement: Statement::Expression(Expression::Call(FunctionCall::function("setup", vec![]))),
                    expected: None,
                    checker: None,
                },
                Testcase {
                    statement: Statement::Expression(Expression::Call(FunctionCall::function(
                        "greet",
                        vec![Expression::Identifier("name".into())],
                    ))),
                    expected: Some(Value::text("hi bob")),
                    checker: None,
                },
            ],
            ..Default::default()
        };
        let unit = ExecutionUnit { index: 0, name: "context_0", context: &context };
        let code = execution_unit(&conventions(), "submission.sh", &unit);
        assert!(code.contains("source ./submission.sh >&2\n"));
        assert!(code.contains("name='bob'\n"));
        assert!(code.contains("setup >&2\n"));
        assert!(code.contains("__polyjudge_value=\"$(greet \"$name\"; printf x)\"; __polyjudge_value=\"${__polyjudge_value%x}\"\n"));
        assert!(code.contains("send_value \"$__polyjudge_value\"\n"));
    }
}
