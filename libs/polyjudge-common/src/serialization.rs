/// Wire Codec - Canonical Line Format for Values
///
/// Every adapter's generated program prints values in this format, so
/// the judge side needs exactly one parser:
///
/// ```text
/// {"type": "integer", "data": 5}
/// {"type": "real", "data": "-inf"}
/// {"type": "map", "data": [{"key": {"type": "text", "data": "a"}, "value": {"type": "nothing", "data": null}}]}
/// ```
///
/// One value per line. A blank line is never a value; `nothing` has its
/// own tag. Malformed input is always an error, never a best guess.

use crate::types::{Category, Data, Number, Pair, SpecialNumber, Value, ValueType};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value as JsonValue};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum DecodeError {
    #[error("line {line}: blank line where a value was expected")]
    BlankLine { line: usize },
    #[error("line {line}: not valid JSON: {message}")]
    Malformed { line: usize, message: String },
    #[error("line {line}: {message}")]
    InvalidValue { line: usize, message: String },
    #[error("expected {expected} value line(s), got {actual}")]
    CountMismatch { expected: usize, actual: usize },
}

impl DecodeError {
    /// 1-based line the error refers to, if it refers to one
    pub fn line(&self) -> Option<usize> {
        match self {
            DecodeError::BlankLine { line }
            | DecodeError::Malformed { line, .. }
            | DecodeError::InvalidValue { line, .. } => Some(*line),
            DecodeError::CountMismatch { .. } => None,
        }
    }
}

fn integer_to_json(n: i128) -> JsonValue {
    if let Ok(small) = i64::try_from(n) {
        json!(small)
    } else if let Ok(unsigned) = u64::try_from(n) {
        json!(unsigned)
    } else {
        JsonValue::String(n.to_string())
    }
}

/// Convert a value into its JSON object form
pub fn to_json(value: &Value) -> JsonValue {
    let data = match value.data() {
        Data::Number(Number::Integer(n)) => integer_to_json(*n),
        Data::Number(Number::Real(r)) => serde_json::Number::from_f64(*r)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Data::Number(Number::Special(s)) => JsonValue::String(s.tag().to_string()),
        Data::Boolean(b) => JsonValue::Bool(*b),
        Data::Text(s) => JsonValue::String(s.clone()),
        Data::Items(items) => JsonValue::Array(items.iter().map(to_json).collect()),
        Data::Pairs(pairs) => JsonValue::Array(
            pairs
                .iter()
                .map(|p| json!({ "key": to_json(&p.key), "value": to_json(&p.value) }))
                .collect(),
        ),
        Data::Nothing => JsonValue::Null,
    };
    let mut object = Map::new();
    object.insert("type".to_string(), JsonValue::String(value.ty().tag().to_string()));
    object.insert("data".to_string(), data);
    JsonValue::Object(object)
}

/// Encode one value as one line (without the trailing newline)
pub fn encode(value: &Value) -> String {
    to_json(value).to_string()
}

/// Encode N values as exactly N newline-terminated lines
pub fn encode_all(values: &[Value]) -> String {
    values.iter().map(|v| encode(v) + "\n").collect()
}

fn parse_integer(ty: ValueType, data: &JsonValue) -> Result<Data, String> {
    let n = match data {
        JsonValue::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from))
            .ok_or_else(|| format!("'{}' expects an integer, got {}", ty, n))?,
        JsonValue::String(s) => s
            .parse::<i128>()
            .map_err(|_| format!("'{}' expects an integer, got string {:?}", ty, s))?,
        other => return Err(format!("'{}' expects an integer, got {}", ty, other)),
    };
    Ok(Data::Number(Number::Integer(n)))
}

fn parse_floating(ty: ValueType, data: &JsonValue) -> Result<Data, String> {
    match data {
        JsonValue::Number(n) => n
            .as_f64()
            .map(|f| Data::Number(Number::Real(f)))
            .ok_or_else(|| format!("'{}' got an unrepresentable number {}", ty, n)),
        JsonValue::String(s) => SpecialNumber::from_tag(s)
            .map(|special| Data::Number(Number::Special(special)))
            .ok_or_else(|| format!("'{}' got unknown special number {:?}", ty, s)),
        other => Err(format!("'{}' expects a number, got {}", ty, other)),
    }
}

fn parse_pair(raw: &JsonValue) -> Result<Pair, String> {
    let object = raw
        .as_object()
        .ok_or_else(|| format!("map entry must be an object, got {}", raw))?;
    let key = object.get("key").ok_or("map entry without 'key'")?;
    let value = object.get("value").ok_or("map entry without 'value'")?;
    Ok(Pair { key: parse_value(key)?, value: parse_value(value)? })
}

fn parse_value(raw: &JsonValue) -> Result<Value, String> {
    let object = raw
        .as_object()
        .ok_or_else(|| format!("value must be a JSON object, got {}", raw))?;
    let tag = object
        .get("type")
        .and_then(JsonValue::as_str)
        .ok_or("value without a 'type' tag")?;
    let ty = ValueType::from_tag(tag).ok_or_else(|| format!("unknown type tag '{}'", tag))?;

    let data = match (object.get("data"), ty.category()) {
        (None, Category::Nothing) | (Some(JsonValue::Null), Category::Nothing) => Data::Nothing,
        (Some(other), Category::Nothing) => {
            return Err(format!("'{}' expects null, got {}", ty, other));
        }
        (None, _) => return Err(format!("'{}' value without 'data'", ty)),
        (Some(data), Category::Integral) => parse_integer(ty, data)?,
        (Some(data), Category::Floating) => parse_floating(ty, data)?,
        (Some(JsonValue::Bool(b)), Category::Boolean) => Data::Boolean(*b),
        (Some(JsonValue::String(s)), Category::String) => Data::Text(s.clone()),
        (Some(JsonValue::Array(items)), Category::Collection) => {
            Data::Items(items.iter().map(parse_value).collect::<Result<_, _>>()?)
        }
        (Some(JsonValue::Array(pairs)), Category::Object) => {
            Data::Pairs(pairs.iter().map(parse_pair).collect::<Result<_, _>>()?)
        }
        (Some(other), _) => return Err(format!("'{}' cannot hold {}", ty, other)),
    };

    Value::new(ty, data).map_err(|e| e.to_string())
}

/// Convert a JSON object form back into a value
pub fn from_json(raw: &JsonValue) -> Result<Value, String> {
    parse_value(raw)
}

/// Decode a single line, reporting errors against `line_number`
pub fn decode_line(line_number: usize, line: &str) -> Result<Value, DecodeError> {
    let line = line.trim_end_matches('\r');
    if line.trim().is_empty() {
        return Err(DecodeError::BlankLine { line: line_number });
    }
    let raw: JsonValue = serde_json::from_str(line).map_err(|e| DecodeError::Malformed {
        line: line_number,
        message: e.to_string(),
    })?;
    parse_value(&raw).map_err(|message| DecodeError::InvalidValue { line: line_number, message })
}

/// Decode a single standalone line
pub fn decode(line: &str) -> Result<Value, DecodeError> {
    decode_line(1, line)
}

/// Decode a whole output stream that must contain exactly `expected` values
pub fn decode_stream(output: &str, expected: usize) -> Result<Vec<Value>, DecodeError> {
    let values = output
        .lines()
        .enumerate()
        .map(|(i, line)| decode_line(i + 1, line))
        .collect::<Result<Vec<_>, _>>()?;
    if values.len() != expected {
        return Err(DecodeError::CountMismatch { expected, actual: values.len() });
    }
    Ok(values)
}

/// Decode the well-formed prefix of a stream, stopping at the first bad line
///
/// Used for output of processes that crashed midway.
pub fn decode_prefix(output: &str) -> (Vec<Value>, Option<DecodeError>) {
    let mut values = Vec::new();
    for (i, line) in output.lines().enumerate() {
        match decode_line(i + 1, line) {
            Ok(value) => values.push(value),
            Err(e) => return (values, Some(e)),
        }
    }
    (values, None)
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        to_json(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = JsonValue::deserialize(deserializer)?;
        parse_value(&raw).map_err(serde::de::Error::custom)
    }
}
