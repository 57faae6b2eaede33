// Python source generation from the plan IR.

use crate::conventions::{Conventionable, NamingConventions};
use crate::languages::{check_function_name, checker_with_actual, Bindings, ExecutionUnit};
use polyjudge_common::plan::{CallKind, Expression, FunctionCall, Statement};
use polyjudge_common::types::{Data, Number, SpecialNumber, Value, ValueType};
use std::fmt::Write;

const VALUE_VARIABLE: &str = "__judge_value";

pub fn string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn join(values: &[Value]) -> Vec<String> {
    values.iter().map(value).collect()
}

/// Python literal for a value
pub fn value(v: &Value) -> String {
    match v.data() {
        Data::Number(Number::Integer(n)) => n.to_string(),
        Data::Number(Number::Real(r)) => format!("{:?}", r),
        Data::Number(Number::Special(SpecialNumber::NotANumber)) => "float(\"nan\")".to_string(),
        Data::Number(Number::Special(SpecialNumber::PositiveInfinity)) => "float(\"inf\")".to_string(),
        Data::Number(Number::Special(SpecialNumber::NegativeInfinity)) => "float(\"-inf\")".to_string(),
        Data::Boolean(true) => "True".to_string(),
        Data::Boolean(false) => "False".to_string(),
        Data::Text(s) => string_literal(s),
        Data::Items(items) => match v.ty() {
            ValueType::Set if items.is_empty() => "set()".to_string(),
            ValueType::Set => format!("{{{}}}", join(items).join(", ")),
            ValueType::Tuple if items.len() == 1 => format!("({},)", value(&items[0])),
            ValueType::Tuple => format!("({})", join(items).join(", ")),
            _ => format!("[{}]", join(items).join(", ")),
        },
        Data::Pairs(pairs) => {
            let entries: Vec<String> = pairs
                .iter()
                .map(|p| format!("{}: {}", value(&p.key), value(&p.value)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
        Data::Nothing => "None".to_string(),
    }
}

fn call(conventions: &NamingConventions, call: &FunctionCall, bindings: &Bindings) -> String {
    let prefix = match &call.namespace {
        Some(ns) => format!("{}.", expression(conventions, ns, bindings)),
        None => String::new(),
    };
    let arguments: Vec<String> = call
        .arguments
        .iter()
        .map(|a| expression(conventions, a, bindings))
        .collect();

    match call.kind {
        CallKind::Function => format!(
            "{}{}({})",
            prefix,
            conventions.apply(Conventionable::Function, &call.name),
            arguments.join(", ")
        ),
        CallKind::Constructor => format!(
            "{}{}({})",
            prefix,
            conventions.apply(Conventionable::Class, &call.name),
            arguments.join(", ")
        ),
        CallKind::Property => format!("{}{}", prefix, conventions.apply(Conventionable::Identifier, &call.name)),
    }
}

pub fn expression(conventions: &NamingConventions, expression: &Expression, bindings: &Bindings) -> String {
    match expression {
        Expression::Value(v) => value(v),
        Expression::Identifier(name) if bindings.is_local(name) => conventions.apply(Conventionable::Identifier, name),
        Expression::Identifier(name) => conventions.apply(Conventionable::GlobalIdentifier, name),
        Expression::Call(c) => call(conventions, c, bindings),
    }
}

pub fn statement(conventions: &NamingConventions, statement: &Statement, bindings: &Bindings) -> String {
    match statement {
        Statement::Expression(e) => expression(conventions, e, bindings),
        Statement::Assignment(a) => format!(
            "{} = {}",
            conventions.apply(Conventionable::Identifier, &a.variable),
            expression(conventions, &a.expression, bindings)
        ),
    }
}

pub fn check_function(conventions: &NamingConventions, name: &str, checker: &FunctionCall) -> String {
    let bindings = Bindings::with(&["actual"]);
    format!(
        "def {}(actual):\n    return {}\n",
        name,
        call(conventions, &checker_with_actual(checker), &bindings)
    )
}

/// Harness for one context. Everything the submission prints while being
/// imported or called goes to stderr; stdout only carries wire lines.
pub fn execution_unit(conventions: &NamingConventions, submission: &str, unit: &ExecutionUnit<'_>) -> String {
    let mut out = String::new();
    out.push_str("import contextlib\nimport sys\n\nimport values\n\n");
    let _ = writeln!(out, "with contextlib.redirect_stdout(sys.stderr):\n    from {} import *\n", submission);

    for (i, testcase) in unit.context.testcases.iter().enumerate() {
        if let Some(checker) = &testcase.checker {
            let name = conventions.apply(Conventionable::Function, &check_function_name(i));
            let _ = writeln!(out, "\n{}", check_function(conventions, &name, checker));
        }
    }

    let mut bindings = Bindings::default();
    for (i, testcase) in unit.context.testcases.iter().enumerate() {
        let code = statement(conventions, &testcase.statement, &bindings);
        out.push_str("with contextlib.redirect_stdout(sys.stderr):\n");
        if testcase.produces_value() {
            let produced = match &testcase.checker {
                Some(_) => format!(
                    "{}({})",
                    conventions.apply(Conventionable::Function, &check_function_name(i)),
                    code
                ),
                None => code,
            };
            let _ = writeln!(out, "    {} = {}", VALUE_VARIABLE, produced);
            let _ = writeln!(out, "values.send_value({})", VALUE_VARIABLE);
        } else {
            let _ = writeln!(out, "    {}", code);
        }
        bindings.bind(&testcase.statement);
    }
    out
}

pub fn encoder(values: &[Value]) -> String {
    let mut out = String::from("import values\n\n");
    for v in values {
        let _ = writeln!(out, "values.send_value({})", value(v));
    }
    out
}
