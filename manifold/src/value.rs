//! Dynamic value model.
//!
//! Dispatch selects an implementation from the runtime types of the actual
//! arguments, so every argument is a [`Value`] carrying its own type. The
//! flat [`TypeTag`] is what signatures are made of and what the coercion
//! table is keyed by.

use std::fmt;

use indexmap::IndexMap;

use crate::class::ClassId;

/// Keyword arguments. Never participate in matching; every dispatch phase
/// forwards them to the selected implementation untouched.
pub type Kwargs = IndexMap<String, Value>;

/// The runtime type of a [`Value`].
///
/// `Object` and `Class` carry the identity of the user class, so two
/// instances of different classes have distinct tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// The unit/none value.
    None,
    Bool,
    Int,
    Float,
    Complex,
    Str,
    Bytes,
    List,
    Tuple,
    Set,
    FrozenSet,
    Dict,
    /// An instance of the user class with the given id.
    Object(ClassId),
    /// The class object itself (the metatype of its instances).
    Class(ClassId),
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::None => write!(f, "none"),
            TypeTag::Bool => write!(f, "bool"),
            TypeTag::Int => write!(f, "int"),
            TypeTag::Float => write!(f, "float"),
            TypeTag::Complex => write!(f, "complex"),
            TypeTag::Str => write!(f, "str"),
            TypeTag::Bytes => write!(f, "bytes"),
            TypeTag::List => write!(f, "list"),
            TypeTag::Tuple => write!(f, "tuple"),
            TypeTag::Set => write!(f, "set"),
            TypeTag::FrozenSet => write!(f, "frozenset"),
            TypeTag::Dict => write!(f, "dict"),
            TypeTag::Object(id) => write!(f, "object#{}", id.index),
            TypeTag::Class(id) => write!(f, "class#{}", id.index),
        }
    }
}

/// A dynamically typed runtime value.
///
/// `Set` and `Dict` keep insertion order; uniqueness of members/keys is an
/// invariant maintained by the [`Value::set`], [`Value::frozen_set`] and
/// [`Value::dict`] constructors.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Complex { re: f64, im: f64 },
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Set(Vec<Value>),
    FrozenSet(Vec<Value>),
    Dict(Vec<(Value, Value)>),
    Object {
        class: ClassId,
        fields: IndexMap<String, Value>,
    },
    Class(ClassId),
}

impl Value {
    /// The runtime type tag of this value.
    pub fn tag(&self) -> TypeTag {
        match self {
            Value::None => TypeTag::None,
            Value::Bool(_) => TypeTag::Bool,
            Value::Int(_) => TypeTag::Int,
            Value::Float(_) => TypeTag::Float,
            Value::Complex { .. } => TypeTag::Complex,
            Value::Str(_) => TypeTag::Str,
            Value::Bytes(_) => TypeTag::Bytes,
            Value::List(_) => TypeTag::List,
            Value::Tuple(_) => TypeTag::Tuple,
            Value::Set(_) => TypeTag::Set,
            Value::FrozenSet(_) => TypeTag::FrozenSet,
            Value::Dict(_) => TypeTag::Dict,
            Value::Object { class, .. } => TypeTag::Object(*class),
            Value::Class(id) => TypeTag::Class(*id),
        }
    }

    /// Builds a set, dropping later duplicates while keeping insertion order.
    pub fn set(items: impl IntoIterator<Item = Value>) -> Value {
        Value::Set(dedup(items))
    }

    /// Builds a frozen set with the same uniqueness rule as [`Value::set`].
    pub fn frozen_set(items: impl IntoIterator<Item = Value>) -> Value {
        Value::FrozenSet(dedup(items))
    }

    /// Builds a dict; a repeated key overwrites the earlier entry in place.
    pub fn dict(pairs: impl IntoIterator<Item = (Value, Value)>) -> Value {
        let mut out: Vec<(Value, Value)> = Vec::new();
        for (key, value) in pairs {
            if let Some(slot) = out.iter_mut().find(|(k, _)| *k == key) {
                slot.1 = value;
            } else {
                out.push((key, value));
            }
        }
        Value::Dict(out)
    }

    /// Builds an instance of a user class with no fields.
    pub fn object(class: ClassId) -> Value {
        Value::Object {
            class,
            fields: IndexMap::new(),
        }
    }

    /// Builds a string value from anything stringy.
    pub fn str(s: impl Into<String>) -> Value {
        Value::Str(s.into())
    }
}

fn dedup(items: impl IntoIterator<Item = Value>) -> Vec<Value> {
    let mut out: Vec<Value> = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "none"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Complex { re, im } => write!(f, "({re:?}+{im:?}j)"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Bytes(b) => write!(f, "b<{} bytes>", b.len()),
            Value::List(items) => write_seq(f, "[", items, "]"),
            Value::Tuple(items) => write_seq(f, "(", items, ")"),
            Value::Set(items) => write_seq(f, "{", items, "}"),
            Value::FrozenSet(items) => write_seq(f, "frozenset{", items, "}"),
            Value::Dict(pairs) => {
                write!(f, "{{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Value::Object { class, .. } => write!(f, "<object#{} instance>", class.index),
            Value::Class(id) => write!(f, "<class#{}>", id.index),
        }
    }
}

fn write_seq(f: &mut fmt::Formatter<'_>, open: &str, items: &[Value], close: &str) -> fmt::Result {
    write!(f, "{open}")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    write!(f, "{close}")
}
