/// Value/Type Model - Language-Agnostic Test Data
///
/// **Core Responsibility:**
/// Describe test inputs and expected outputs without reference to any
/// target language.
///
/// **Two-tier taxonomy:**
/// - Basic types: every adapter approximates them
/// - Advanced types: refine a basic type (fixed-width integers, float
///   precisions, char, list/tuple/array) and are only faithful on some targets
///
/// A composite's tag says nothing about its elements: heterogeneous
/// sequences are valid values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    // Basic
    Integer,
    Real,
    Boolean,
    Text,
    Sequence,
    Set,
    Map,
    Nothing,
    // Advanced
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Bigint,
    SinglePrecision,
    DoublePrecision,
    DoubleExtended,
    FixedPrecision,
    Char,
    List,
    Tuple,
    Array,
}

/// Shape of the payload a type carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Integral,
    Floating,
    Boolean,
    String,
    Collection,
    Object,
    Nothing,
}

impl ValueType {
    pub const ALL: [ValueType; 25] = [
        ValueType::Integer,
        ValueType::Real,
        ValueType::Boolean,
        ValueType::Text,
        ValueType::Sequence,
        ValueType::Set,
        ValueType::Map,
        ValueType::Nothing,
        ValueType::Int8,
        ValueType::Uint8,
        ValueType::Int16,
        ValueType::Uint16,
        ValueType::Int32,
        ValueType::Uint32,
        ValueType::Int64,
        ValueType::Uint64,
        ValueType::Bigint,
        ValueType::SinglePrecision,
        ValueType::DoublePrecision,
        ValueType::DoubleExtended,
        ValueType::FixedPrecision,
        ValueType::Char,
        ValueType::List,
        ValueType::Tuple,
        ValueType::Array,
    ];

    /// Wire tag of this type
    pub fn tag(&self) -> &'static str {
        match self {
            ValueType::Integer => "integer",
            ValueType::Real => "real",
            ValueType::Boolean => "boolean",
            ValueType::Text => "text",
            ValueType::Sequence => "sequence",
            ValueType::Set => "set",
            ValueType::Map => "map",
            ValueType::Nothing => "nothing",
            ValueType::Int8 => "int8",
            ValueType::Uint8 => "uint8",
            ValueType::Int16 => "int16",
            ValueType::Uint16 => "uint16",
            ValueType::Int32 => "int32",
            ValueType::Uint32 => "uint32",
            ValueType::Int64 => "int64",
            ValueType::Uint64 => "uint64",
            ValueType::Bigint => "bigint",
            ValueType::SinglePrecision => "single_precision",
            ValueType::DoublePrecision => "double_precision",
            ValueType::DoubleExtended => "double_extended",
            ValueType::FixedPrecision => "fixed_precision",
            ValueType::Char => "char",
            ValueType::List => "list",
            ValueType::Tuple => "tuple",
            ValueType::Array => "array",
        }
    }

    pub fn from_tag(tag: &str) -> Option<ValueType> {
        ValueType::ALL.iter().copied().find(|t| t.tag() == tag)
    }

    /// The basic type an advanced type refines (identity for basic types)
    pub fn basic(&self) -> ValueType {
        match self {
            ValueType::Int8
            | ValueType::Uint8
            | ValueType::Int16
            | ValueType::Uint16
            | ValueType::Int32
            | ValueType::Uint32
            | ValueType::Int64
            | ValueType::Uint64
            | ValueType::Bigint => ValueType::Integer,
            ValueType::SinglePrecision
            | ValueType::DoublePrecision
            | ValueType::DoubleExtended
            | ValueType::FixedPrecision => ValueType::Real,
            ValueType::Char => ValueType::Text,
            ValueType::List | ValueType::Tuple | ValueType::Array => ValueType::Sequence,
            basic => *basic,
        }
    }

    pub fn is_basic(&self) -> bool {
        self.basic() == *self
    }

    pub fn category(&self) -> Category {
        match self.basic() {
            ValueType::Integer => Category::Integral,
            ValueType::Real => Category::Floating,
            ValueType::Boolean => Category::Boolean,
            ValueType::Text => Category::String,
            ValueType::Sequence | ValueType::Set => Category::Collection,
            ValueType::Map => Category::Object,
            _ => Category::Nothing,
        }
    }

    /// Inclusive bounds for fixed-width integer types
    fn integer_bounds(&self) -> Option<(i128, i128)> {
        match self {
            ValueType::Int8 => Some((i8::MIN as i128, i8::MAX as i128)),
            ValueType::Uint8 => Some((0, u8::MAX as i128)),
            ValueType::Int16 => Some((i16::MIN as i128, i16::MAX as i128)),
            ValueType::Uint16 => Some((0, u16::MAX as i128)),
            ValueType::Int32 => Some((i32::MIN as i128, i32::MAX as i128)),
            ValueType::Uint32 => Some((0, u32::MAX as i128)),
            ValueType::Int64 => Some((i64::MIN as i128, i64::MAX as i128)),
            ValueType::Uint64 => Some((0, u64::MAX as i128)),
            _ => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Special floating-point values, kept apart from finite reals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialNumber {
    NotANumber,
    PositiveInfinity,
    NegativeInfinity,
}

impl SpecialNumber {
    pub fn tag(&self) -> &'static str {
        match self {
            SpecialNumber::NotANumber => "nan",
            SpecialNumber::PositiveInfinity => "inf",
            SpecialNumber::NegativeInfinity => "-inf",
        }
    }

    pub fn from_tag(tag: &str) -> Option<SpecialNumber> {
        match tag {
            "nan" => Some(SpecialNumber::NotANumber),
            "inf" => Some(SpecialNumber::PositiveInfinity),
            "-inf" => Some(SpecialNumber::NegativeInfinity),
            _ => None,
        }
    }

    /// Classify an f64, returning None for finite numbers
    pub fn classify(value: f64) -> Option<SpecialNumber> {
        if value.is_nan() {
            Some(SpecialNumber::NotANumber)
        } else if value == f64::INFINITY {
            Some(SpecialNumber::PositiveInfinity)
        } else if value == f64::NEG_INFINITY {
            Some(SpecialNumber::NegativeInfinity)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Number {
    Integer(i128),
    Real(f64),
    Special(SpecialNumber),
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Integer(a), Number::Integer(b)) => a == b,
            (Number::Real(a), Number::Real(b)) => a == b,
            // NaN equals NaN here: the special tag is compared, not the float
            (Number::Special(a), Number::Special(b)) => a == b,
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Pair {
    pub key: Value,
    pub value: Value,
}

#[derive(Debug, Clone)]
pub enum Data {
    Number(Number),
    Boolean(bool),
    Text(String),
    Items(Vec<Value>),
    Pairs(Vec<Pair>),
    Nothing,
}

impl Data {
    fn kind(&self) -> &'static str {
        match self {
            Data::Number(Number::Integer(_)) => "integer number",
            Data::Number(Number::Real(_)) => "real number",
            Data::Number(Number::Special(_)) => "special number",
            Data::Boolean(_) => "boolean",
            Data::Text(_) => "string",
            Data::Items(_) => "list of values",
            Data::Pairs(_) => "list of key-value pairs",
            Data::Nothing => "nothing",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ValueError {
    #[error("type '{ty}' cannot hold {found}")]
    IncompatibleData { ty: ValueType, found: &'static str },
    #[error("{value} is out of range for type '{ty}'")]
    OutOfRange { ty: ValueType, value: i128 },
    #[error("char value must be exactly one character, got {0} characters")]
    CharLength(usize),
}

/// A language-agnostic value: a type tag plus a payload
#[derive(Debug, Clone)]
pub struct Value {
    ty: ValueType,
    data: Data,
}

impl Value {
    /// Build a value, checking that the payload fits the tag
    pub fn new(ty: ValueType, data: Data) -> Result<Self, ValueError> {
        let compatible = match (ty.category(), &data) {
            (Category::Integral, Data::Number(Number::Integer(_))) => true,
            (Category::Floating, Data::Number(Number::Real(_)))
            | (Category::Floating, Data::Number(Number::Special(_))) => true,
            (Category::Boolean, Data::Boolean(_)) => true,
            (Category::String, Data::Text(_)) => true,
            (Category::Collection, Data::Items(_)) => true,
            (Category::Object, Data::Pairs(_)) => true,
            (Category::Nothing, Data::Nothing) => true,
            _ => false,
        };
        if !compatible {
            return Err(ValueError::IncompatibleData { ty, found: data.kind() });
        }

        if let (Some((min, max)), Data::Number(Number::Integer(n))) = (ty.integer_bounds(), &data) {
            if *n < min || *n > max {
                return Err(ValueError::OutOfRange { ty, value: *n });
            }
        }
        if let (ValueType::Char, Data::Text(s)) = (ty, &data) {
            let count = s.chars().count();
            if count != 1 {
                return Err(ValueError::CharLength(count));
            }
        }

        // A float payload that is really NaN/Inf is stored as its special tag
        let data = match data {
            Data::Number(Number::Real(r)) => match SpecialNumber::classify(r) {
                Some(special) => Data::Number(Number::Special(special)),
                None => Data::Number(Number::Real(r)),
            },
            other => other,
        };

        Ok(Self { ty, data })
    }

    pub fn integer(value: i128) -> Self {
        Self { ty: ValueType::Integer, data: Data::Number(Number::Integer(value)) }
    }

    pub fn real(value: f64) -> Self {
        match SpecialNumber::classify(value) {
            Some(special) => Self::special(ValueType::Real, special),
            None => Self { ty: ValueType::Real, data: Data::Number(Number::Real(value)) },
        }
    }

    /// A special number under a floating tag; non-floating tags fall back to `real`
    pub fn special(ty: ValueType, special: SpecialNumber) -> Self {
        let ty = if ty.category() == Category::Floating { ty } else { ValueType::Real };
        Self { ty, data: Data::Number(Number::Special(special)) }
    }

    pub fn boolean(value: bool) -> Self {
        Self { ty: ValueType::Boolean, data: Data::Boolean(value) }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self { ty: ValueType::Text, data: Data::Text(value.into()) }
    }

    pub fn char(value: char) -> Self {
        Self { ty: ValueType::Char, data: Data::Text(value.to_string()) }
    }

    pub fn sequence(items: Vec<Value>) -> Self {
        Self { ty: ValueType::Sequence, data: Data::Items(items) }
    }

    pub fn set(items: Vec<Value>) -> Self {
        Self { ty: ValueType::Set, data: Data::Items(items) }
    }

    pub fn map(pairs: Vec<(Value, Value)>) -> Self {
        let pairs = pairs.into_iter().map(|(key, value)| Pair { key, value }).collect();
        Self { ty: ValueType::Map, data: Data::Pairs(pairs) }
    }

    pub fn nothing() -> Self {
        Self { ty: ValueType::Nothing, data: Data::Nothing }
    }

    pub fn ty(&self) -> ValueType {
        self.ty
    }

    pub fn data(&self) -> &Data {
        &self.data
    }

    pub fn into_parts(self) -> (ValueType, Data) {
        (self.ty, self.data)
    }

    /// Reduce every tag in the tree to its basic type
    pub fn as_basic(&self) -> Value {
        let data = match &self.data {
            Data::Items(items) => Data::Items(items.iter().map(Value::as_basic).collect()),
            Data::Pairs(pairs) => Data::Pairs(
                pairs
                    .iter()
                    .map(|p| Pair { key: p.key.as_basic(), value: p.value.as_basic() })
                    .collect(),
            ),
            other => other.clone(),
        };
        Value { ty: self.ty.basic(), data }
    }

    /// Equality after reducing both sides to basic types
    pub fn matches(&self, other: &Value) -> bool {
        self.as_basic() == other.as_basic()
    }

    /// Every type tag used anywhere in this value, including nested ones
    pub fn types_used(&self) -> BTreeSet<ValueType> {
        let mut types = BTreeSet::new();
        self.collect_types(&mut types);
        types
    }

    fn collect_types(&self, types: &mut BTreeSet<ValueType>) {
        types.insert(self.ty);
        match &self.data {
            Data::Items(items) => items.iter().for_each(|v| v.collect_types(types)),
            Data::Pairs(pairs) => pairs.iter().for_each(|p| {
                p.key.collect_types(types);
                p.value.collect_types(types);
            }),
            _ => {}
        }
    }

    /// True if some collection in the tree mixes element types
    ///
    /// Tuples are mixed by nature and only count through their elements.
    pub fn is_heterogeneous(&self) -> bool {
        match &self.data {
            Data::Items(items) => {
                let mixed = self.ty != ValueType::Tuple
                    && items.windows(2).any(|w| w[0].ty.basic() != w[1].ty.basic());
                mixed || items.iter().any(Value::is_heterogeneous)
            }
            Data::Pairs(pairs) => {
                let mixed = pairs.windows(2).any(|w| {
                    w[0].key.ty.basic() != w[1].key.ty.basic()
                        || w[0].value.ty.basic() != w[1].value.ty.basic()
                });
                mixed
                    || pairs
                        .iter()
                        .any(|p| p.key.is_heterogeneous() || p.value.is_heterogeneous())
            }
            _ => false,
        }
    }
}

fn unordered_eq<T>(a: &[T], b: &[T], eq: impl Fn(&T, &T) -> bool) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut used = vec![false; b.len()];
    a.iter().all(|x| {
        let found = b
            .iter()
            .enumerate()
            .find(|(i, y)| !used[*i] && eq(x, y))
            .map(|(i, _)| i);
        match found {
            Some(i) => {
                used[i] = true;
                true
            }
            None => false,
        }
    })
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        if self.ty != other.ty {
            return false;
        }
        match (&self.data, &other.data) {
            (Data::Number(a), Data::Number(b)) => a == b,
            (Data::Boolean(a), Data::Boolean(b)) => a == b,
            (Data::Text(a), Data::Text(b)) => a == b,
            (Data::Items(a), Data::Items(b)) => {
                if self.ty.basic() == ValueType::Set {
                    unordered_eq(a, b, |x, y| x == y)
                } else {
                    a == b
                }
            }
            // Maps compare as key-value sets, insertion order is not significant
            (Data::Pairs(a), Data::Pairs(b)) => {
                unordered_eq(a, b, |x, y| x.key == y.key && x.value == y.value)
            }
            (Data::Nothing, Data::Nothing) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", item)?;
            }
            Ok(())
        }

        match &self.data {
            Data::Number(Number::Integer(n)) => write!(f, "{}", n),
            Data::Number(Number::Real(r)) => write!(f, "{:?}", r),
            Data::Number(Number::Special(s)) => f.write_str(s.tag()),
            Data::Boolean(b) => write!(f, "{}", b),
            Data::Text(s) if self.ty == ValueType::Char => write!(f, "'{}'", s),
            Data::Text(s) => write!(f, "{:?}", s),
            Data::Items(items) => {
                let (open, close) = match self.ty {
                    ValueType::Set => ("{", "}"),
                    ValueType::Tuple => ("(", ")"),
                    _ => ("[", "]"),
                };
                f.write_str(open)?;
                join(f, items)?;
                f.write_str(close)
            }
            Data::Pairs(pairs) => {
                f.write_str("{")?;
                for (i, pair) in pairs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", pair.key, pair.value)?;
                }
                f.write_str("}")
            }
            Data::Nothing => f.write_str("nothing"),
        }
    }
}
