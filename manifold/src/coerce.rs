//! Table-driven value coercion for the flexible match phase.
//!
//! [`CoercionEngine::cast`] attempts to convert one value to one declared
//! type. The rules are deliberately narrower than the host collection and
//! constructor semantics would allow: a naive "does the constructor
//! succeed" test would let empty containers satisfy `bool`, arbitrary
//! objects satisfy `str`, and scalars satisfy `list`. Each target type
//! therefore enumerates its accepted sources.
//!
//! A failed cast is a [`CastError`]; it is consumed entirely inside the
//! per-signature match attempt and never crosses the dispatcher boundary.

use std::fmt;

use crate::class::{ClassId, ClassTable};
use crate::value::{TypeTag, Value};

/// A failed coercion attempt, carrying the offending value and the target
/// it would not convert to. Internal to the match loop.
#[derive(Debug, Clone)]
pub struct CastError {
    pub value: Value,
    pub target: TypeTag,
}

impl CastError {
    fn new(value: &Value, target: TypeTag) -> Self {
        Self {
            value: value.clone(),
            target,
        }
    }
}

impl fmt::Display for CastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot cast {} to {}", self.value, self.target)
    }
}

/// Result of a single cast attempt.
pub type CastResult = Result<Value, CastError>;

/// Opt-in narrowing conversions.
///
/// `truncate_floats` allows `float -> int` by truncation toward zero.
/// Off by default: losing the fractional part is never implicit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoercionPolicy {
    pub truncate_floats: bool,
}

/// The coercion table used by the slow match path.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoercionEngine {
    policy: CoercionPolicy,
}

impl CoercionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: CoercionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> CoercionPolicy {
        self.policy
    }

    /// Attempts to convert `value` to `target`.
    ///
    /// A value already of the target type passes through unchanged. All
    /// other rules are listed per target below; anything not listed fails.
    pub fn cast(&self, value: &Value, target: TypeTag, classes: &ClassTable) -> CastResult {
        if value.tag() == target {
            return Ok(value.clone());
        }
        match target {
            TypeTag::Int => self.cast_int(value),
            TypeTag::Float => self.cast_float(value),
            TypeTag::Complex => self.cast_complex(value),
            TypeTag::Bool => self.cast_bool(value),
            TypeTag::Str => self.cast_str(value),
            TypeTag::List | TypeTag::Tuple | TypeTag::Set | TypeTag::FrozenSet => {
                self.cast_sequence(value, target)
            }
            TypeTag::Dict => self.cast_dict(value),
            TypeTag::Object(class) => self.cast_object(value, target, class, classes),
            // None, Bytes and class objects convert from nothing but
            // themselves, and the exact case was already handled above.
            TypeTag::None | TypeTag::Bytes | TypeTag::Class(_) => {
                Err(CastError::new(value, target))
            }
        }
    }

    /// Int accepts bools, opted-in float truncation, and decimal strings
    /// (the single-argument constructor parse).
    fn cast_int(&self, value: &Value) -> CastResult {
        match value {
            Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
            Value::Float(x) if self.policy.truncate_floats && x.is_finite() => {
                Ok(Value::Int(x.trunc() as i64))
            }
            Value::Str(s) => s
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| CastError::new(value, TypeTag::Int)),
            _ => Err(CastError::new(value, TypeTag::Int)),
        }
    }

    /// Float accepts the widening numeric promotions, a complex with an
    /// exactly-zero imaginary part, and numeric strings.
    fn cast_float(&self, value: &Value) -> CastResult {
        match value {
            Value::Bool(b) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
            Value::Int(i) => Ok(Value::Float(*i as f64)),
            Value::Complex { re, im } if *im == 0.0 => Ok(Value::Float(*re)),
            Value::Str(s) => s
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| CastError::new(value, TypeTag::Float)),
            _ => Err(CastError::new(value, TypeTag::Float)),
        }
    }

    fn cast_complex(&self, value: &Value) -> CastResult {
        let re = match value {
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Int(i) => *i as f64,
            Value::Float(x) => *x,
            _ => return Err(CastError::new(value, TypeTag::Complex)),
        };
        Ok(Value::Complex { re, im: 0.0 })
    }

    /// Bool accepts only the canonical numeric 0/1, not general truthiness.
    fn cast_bool(&self, value: &Value) -> CastResult {
        match value {
            Value::Int(0) => Ok(Value::Bool(false)),
            Value::Int(1) => Ok(Value::Bool(true)),
            Value::Float(x) if *x == 0.0 => Ok(Value::Bool(false)),
            Value::Float(x) if *x == 1.0 => Ok(Value::Bool(true)),
            _ => Err(CastError::new(value, TypeTag::Bool)),
        }
    }

    /// Str accepts only byte-like sources, decoded strictly as UTF-8.
    /// There is no generic stringification of arbitrary values.
    fn cast_str(&self, value: &Value) -> CastResult {
        match value {
            Value::Bytes(bytes) => String::from_utf8(bytes.clone())
                .map(Value::Str)
                .map_err(|_| CastError::new(value, TypeTag::Str)),
            _ => Err(CastError::new(value, TypeTag::Str)),
        }
    }

    /// List/tuple/set/frozenset accept only other collections. A dict
    /// source contributes its keys. Scalars are rejected outright.
    fn cast_sequence(&self, value: &Value, target: TypeTag) -> CastResult {
        let items: Vec<Value> = match value {
            Value::List(items)
            | Value::Tuple(items)
            | Value::Set(items)
            | Value::FrozenSet(items) => items.clone(),
            Value::Dict(pairs) => pairs.iter().map(|(k, _)| k.clone()).collect(),
            _ => return Err(CastError::new(value, target)),
        };
        Ok(match target {
            TypeTag::List => Value::List(items),
            TypeTag::Tuple => Value::Tuple(items),
            TypeTag::Set => Value::set(items),
            TypeTag::FrozenSet => Value::frozen_set(items),
            _ => unreachable!("cast_sequence called with non-sequence target"),
        })
    }

    /// Dict accepts only sequences whose elements are all key/value pairs
    /// (two-element tuples or lists).
    fn cast_dict(&self, value: &Value) -> CastResult {
        let items = match value {
            Value::List(items)
            | Value::Tuple(items)
            | Value::Set(items)
            | Value::FrozenSet(items) => items,
            _ => return Err(CastError::new(value, TypeTag::Dict)),
        };
        let mut pairs = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Value::Tuple(pair) | Value::List(pair) if pair.len() == 2 => {
                    pairs.push((pair[0].clone(), pair[1].clone()));
                }
                _ => return Err(CastError::new(value, TypeTag::Dict)),
            }
        }
        Ok(Value::dict(pairs))
    }

    /// A user-class target falls back to the class's registered
    /// single-argument constructor. A constructor error is contained here
    /// as a plain failed cast.
    fn cast_object(
        &self,
        value: &Value,
        target: TypeTag,
        class: ClassId,
        classes: &ClassTable,
    ) -> CastResult {
        match classes.constructor(class) {
            Some(ctor) => ctor(value).map_err(|_| CastError::new(value, target)),
            None => Err(CastError::new(value, target)),
        }
    }
}
