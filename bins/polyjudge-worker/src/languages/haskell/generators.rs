// Haskell source generation. Literals carry explicit type annotations so
// that `sendValue` can pick the instance (and so the wire tag) itself.

use crate::conventions::{Conventionable, NamingConventions};
use crate::languages::{check_function_name, checker_with_actual, Bindings, ExecutionUnit};
use polyjudge_common::plan::{Expression, FunctionCall, Statement};
use polyjudge_common::types::{Data, Number, SpecialNumber, Value, ValueType};
use std::fmt::Write;

fn integer_type(ty: ValueType) -> &'static str {
    match ty {
        ValueType::Int8 => "Int8",
        ValueType::Uint8 => "Word8",
        ValueType::Int16 => "Int16",
        ValueType::Uint16 => "Word16",
        ValueType::Int32 => "Int32",
        ValueType::Uint32 => "Word32",
        ValueType::Int64 => "Int64",
        ValueType::Uint64 => "Word64",
        _ => "Integer",
    }
}

fn float_type(ty: ValueType) -> &'static str {
    match ty {
        ValueType::SinglePrecision => "Float",
        _ => "Double",
    }
}

fn escape(c: char, quote: char, out: &mut String) {
    match c {
        '\\' => out.push_str("\\\\"),
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        c if c == quote => {
            out.push('\\');
            out.push(c);
        }
        // Numeric escapes need `\&` in strings when a digit follows
        c if (c as u32) < 0x20 || c == '\u{7f}' => {
            let _ = write!(out, "\\{}", c as u32);
            if quote == '"' {
                out.push_str("\\&");
            }
        }
        c => out.push(c),
    }
}

pub fn string_literal(text: &str) -> String {
    let mut out = String::from("\"");
    text.chars().for_each(|c| escape(c, '"', &mut out));
    out.push('"');
    out
}

pub fn char_literal(c: char) -> String {
    let mut out = String::from("'");
    escape(c, '\'', &mut out);
    out.push('\'');
    out
}

/// Tuple arities with an `Encodable` instance in `Values.hs`
const TUPLE_ARITIES: std::ops::RangeInclusive<usize> = 2..=5;

/// First collection that would not come back as its own type
///
/// A list of `Char` is a `String` and prints as text; `()` and `(x)` are
/// not tuples at all.
pub fn unrepresentable(v: &Value) -> Option<ValueType> {
    match v.data() {
        Data::Items(items) => {
            let lost = match v.ty() {
                ValueType::Tuple => !TUPLE_ARITIES.contains(&items.len()),
                _ => items.iter().any(|item| item.ty() == ValueType::Char),
            };
            if lost {
                return Some(v.ty());
            }
            items.iter().find_map(unrepresentable)
        }
        Data::Pairs(pairs) => pairs
            .iter()
            .find_map(|p| unrepresentable(&p.key).or_else(|| unrepresentable(&p.value))),
        _ => None,
    }
}

pub fn value(v: &Value) -> String {
    match v.data() {
        Data::Number(Number::Integer(n)) => format!("({} :: {})", n, integer_type(v.ty())),
        Data::Number(Number::Real(r)) => format!("({:?} :: {})", r, float_type(v.ty())),
        Data::Number(Number::Special(special)) => {
            let expr = match special {
                SpecialNumber::NotANumber => "0/0",
                SpecialNumber::PositiveInfinity => "1/0",
                SpecialNumber::NegativeInfinity => "-1/0",
            };
            format!("({} :: {})", expr, float_type(v.ty()))
        }
        Data::Boolean(true) => "True".to_string(),
        Data::Boolean(false) => "False".to_string(),
        Data::Text(s) if v.ty() == ValueType::Char => match s.chars().next() {
            Some(c) => char_literal(c),
            None => string_literal(s),
        },
        Data::Text(s) => string_literal(s),
        Data::Items(items) => {
            let items: Vec<String> = items.iter().map(value).collect();
            if v.ty() == ValueType::Tuple {
                format!("({})", items.join(", "))
            } else {
                format!("[{}]", items.join(", "))
            }
        }
        Data::Pairs(pairs) => {
            let pairs: Vec<String> = pairs
                .iter()
                .map(|p| format!("({}, {})", value(&p.key), value(&p.value)))
                .collect();
            format!("[{}]", pairs.join(", "))
        }
        Data::Nothing => "()".to_string(),
    }
}

pub struct Generator<'a> {
    pub conventions: &'a NamingConventions,
    /// Module the learner's definitions live in
    pub submission: &'a str,
}

impl Generator<'_> {
    fn call(&self, call: &FunctionCall, bindings: &Bindings) -> String {
        let mut parts = vec![format!(
            "{}.{}",
            self.submission,
            self.conventions.apply(Conventionable::Function, &call.name)
        )];
        parts.extend(call.namespace.iter().map(|ns| self.expression(ns, bindings)));
        parts.extend(call.arguments.iter().map(|a| self.expression(a, bindings)));
        format!("({})", parts.join(" "))
    }

    pub fn expression(&self, expression: &Expression, bindings: &Bindings) -> String {
        match expression {
            Expression::Value(v) => value(v),
            Expression::Identifier(name) if bindings.is_local(name) => {
                self.conventions.apply(Conventionable::Identifier, name)
            }
            Expression::Identifier(name) => format!(
                "{}.{}",
                self.submission,
                self.conventions.apply(Conventionable::GlobalIdentifier, name)
            ),
            Expression::Call(c) => self.call(c, bindings),
        }
    }

    /// A line of a `do` block
    pub fn statement(&self, statement: &Statement, bindings: &Bindings) -> String {
        match statement {
            Statement::Assignment(a) => format!(
                "let {} = {}",
                self.conventions.apply(Conventionable::Identifier, &a.variable),
                self.expression(&a.expression, bindings)
            ),
            Statement::Expression(e) => format!("_ <- evaluate {}", self.expression(e, bindings)),
        }
    }

    pub fn check_function(&self, name: &str, checker: &FunctionCall) -> String {
        let bindings = Bindings::with(&["actual"]);
        format!("{} actual = {}\n", name, self.call(&checker_with_actual(checker), &bindings))
    }

    pub fn execution_unit(&self, unit: &ExecutionUnit<'_>) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "module {} where\n", unit.name);
        out.push_str("import Control.Exception (evaluate)\n");
        let _ = writeln!(out, "import qualified {}", self.submission);
        out.push_str("import Values (sendValue)\n\n");

        for (i, testcase) in unit.context.testcases.iter().enumerate() {
            if let Some(checker) = &testcase.checker {
                let name = self.conventions.apply(Conventionable::Function, &check_function_name(i));
                let _ = writeln!(out, "{}", self.check_function(&name, checker));
            }
        }

        out.push_str("main :: IO ()\nmain = do\n");
        let mut bindings = Bindings::default();
        for (i, testcase) in unit.context.testcases.iter().enumerate() {
            match &testcase.statement {
                Statement::Expression(e) if testcase.produces_value() => {
                    let produced = self.expression(e, &bindings);
                    let produced = match &testcase.checker {
                        Some(_) => format!(
                            "({} {})",
                            self.conventions.apply(Conventionable::Function, &check_function_name(i)),
                            produced
                        ),
                        None => produced,
                    };
                    let _ = writeln!(out, "    sendValue {}", produced);
                }
                other => {
                    let _ = writeln!(out, "    {}", self.statement(other, &bindings));
                }
            }
            bindings.bind(&testcase.statement);
        }
        out.push_str("    return ()\n");
        out
    }
}

/// Dispatches to one context module by name, passing on the remaining arguments
pub fn selector(name: &str, contexts: &[String]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "module {} where\n", name);
    out.push_str("import System.Environment (getArgs, withArgs)\n");
    out.push_str("import System.Exit (exitFailure)\n");
    out.push_str("import System.IO (hPutStrLn, stderr)\n");
    for context in contexts {
        let _ = writeln!(out, "import qualified {}", context);
    }
    out.push_str("\nmain :: IO ()\nmain = do\n    args <- getArgs\n    case args of\n");
    for context in contexts {
        let _ = writeln!(out, "        ({:?} : rest) -> withArgs rest {}.main", context, context);
    }
    out.push_str("        _ -> hPutStrLn stderr \"unknown context\" >> exitFailure\n");
    out
}

pub fn encoder(name: &str, values: &[Value]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "module {} where\n", name);
    out.push_str("import Values (sendValue)\n\nmain :: IO ()\nmain = do\n");
    for v in values {
        let _ = writeln!(out, "    sendValue {}", value(v));
    }
    out.push_str("    return ()\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conventions::NamingConvention;
    use polyjudge_common::plan::{Assignment, Context, Testcase};

    fn conventions() -> NamingConventions {
        NamingConventions::with_overrides(&[
            (Conventionable::Namespace, NamingConvention::PascalCase),
            (Conventionable::Identifier, NamingConvention::CamelCase),
            (Conventionable::GlobalIdentifier, NamingConvention::CamelCase),
            (Conventionable::Function, NamingConvention::CamelCase),
        ])
    }

    #[test]
    fn test_typed_literals() {
        assert_eq!(value(&Value::integer(-5)), "(-5 :: Integer)");
        assert_eq!(value(&Value::new(ValueType::Uint8, Data::Number(Number::Integer(7))).unwrap()), "(7 :: Word8)");
        assert_eq!(value(&Value::real(1.5)), "(1.5 :: Double)");
        assert_eq!(value(&Value::special(ValueType::DoublePrecision, SpecialNumber::PositiveInfinity)), "(1/0 :: Double)");
        assert_eq!(value(&Value::char('\'')), r"'\''");
        assert_eq!(value(&Value::text("\"hallo\"")), r#""\"hallo\"""#);
        assert_eq!(string_literal("\u{1}2"), r#""\1\&2""#);
        assert_eq!(value(&Value::nothing()), "()");
    }

    #[test]
    fn test_char_collections_and_odd_tuples_are_unrepresentable() {
        let chars = Value::sequence(vec![Value::char('a'), Value::char('b')]);
        assert_eq!(unrepresentable(&chars), Some(ValueType::Sequence));
        let collection = |ty: ValueType, items: Vec<Value>| Value::new(ty, Data::Items(items)).unwrap();
        let nested = Value::sequence(vec![collection(ValueType::List, vec![Value::char('a')])]);
        assert_eq!(unrepresentable(&nested), Some(ValueType::List));

        let tuple = |n: usize| collection(ValueType::Tuple, (0..n).map(|i| Value::integer(i as i128)).collect());
        assert_eq!(unrepresentable(&tuple(0)), Some(ValueType::Tuple));
        assert_eq!(unrepresentable(&tuple(1)), Some(ValueType::Tuple));
        assert_eq!(unrepresentable(&tuple(6)), Some(ValueType::Tuple));
        assert_eq!(unrepresentable(&tuple(5)), None);

        let pair_of_chars = collection(ValueType::Tuple, vec![Value::char('a'), Value::char('b')]);
        assert_eq!(unrepresentable(&pair_of_chars), None);
        assert_eq!(unrepresentable(&Value::sequence(vec![Value::text("ab")])), None);
    }

    #[test]
    fn test_execution_unit_shape() {
        let context = Context {
            testcases: vec![
                Testcase {
                    statement: Statement::Assignment(Assignment {
                        variable: "start_value".into(),
                        expression: Expression::Value(Value::integer(3)),
                    }),
                    expected: None,
                    checker: None,
                },
                Testcase {
                    statement: Statement::Expression(Expression::Call(FunctionCall::function(
                        "add_one",
                        vec![Expression::Identifier("start_value".into())],
                    ))),
                    expected: Some(Value::integer(4)),
                    checker: None,
                },
                Testcase {
                    statement: Statement::Expression(Expression::Identifier("max_size".into())),
                    expected: None,
                    checker: Some(FunctionCall::function("is_positive", vec![])),
                },
            ],
            ..Default::default()
        };
        let conventions = conventions();
        let generator = Generator { conventions: &conventions, submission: "Submission" };
        let code = generator.execution_unit(&ExecutionUnit { index: 0, name: "Context0", context: &context });

        assert!(code.starts_with("module Context0 where\n"));
        assert!(code.contains("import qualified Submission\n"));
        assert!(code.contains("check2 actual = (Submission.isPositive actual)\n"));
        assert!(code.contains("    let startValue = (3 :: Integer)\n"));
        assert!(code.contains("    sendValue (Submission.addOne startValue)\n"));
        assert!(code.contains("    sendValue (check2 Submission.maxSize)\n"));
        assert!(code.ends_with("    return ()\n"));
    }

    #[test]
    fn test_selector_dispatches_every_context() {
        let code = selector("Selector", &["Context0".to_string(), "Context1".to_string()]);
        assert!(code.contains("import qualified Context1\n"));
        assert!(code.contains("(\"Context0\" : rest) -> withArgs rest Context0.main"));
        assert!(code.contains("exitFailure"));
    }
}
