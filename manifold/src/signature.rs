//! Type signatures and the two-tier matching strategy.
//!
//! A [`TypeSignature`] is an ordered, immutable sequence of concrete type
//! tags. It supports two matching operations against a call's positional
//! arguments:
//!
//! 1. [`TypeSignature::fast_match`] — exact type identity, fingerprint
//!    compare, no coercion and no allocation. Tried first so the common
//!    exact-type call never runs a constructor.
//! 2. [`TypeSignature::flex_match`] — per-position coercion through the
//!    [`CoercionEngine`], all-or-nothing. Tried only after the fast phase
//!    has failed on every candidate, because coercion may allocate and may
//!    run user constructors.
//!
//! Structural equality and hashing exist solely for duplicate detection at
//! bind time; call-time selection always scans in declaration order.

use std::fmt;
use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use crate::class::{ClassId, ClassTable};
use crate::coerce::CoercionEngine;
use crate::value::{TypeTag, Value};

/// A declared parameter type, possibly referring to the class still being
/// defined.
///
/// The placeholders are legal only before bind; [`TypeExpr::resolve`]
/// substitutes them once the owner is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeExpr {
    /// An ordinary concrete type.
    Concrete(TypeTag),
    /// Instances of the class currently being defined ("this" type).
    SelfType,
    /// The class object of the class currently being defined.
    MetaType,
}

impl TypeExpr {
    /// Substitutes placeholders against the now-known owner.
    pub fn resolve(self, owner: ClassId) -> TypeTag {
        match self {
            TypeExpr::Concrete(tag) => tag,
            TypeExpr::SelfType => TypeTag::Object(owner),
            TypeExpr::MetaType => TypeTag::Class(owner),
        }
    }
}

impl From<TypeTag> for TypeExpr {
    fn from(tag: TypeTag) -> Self {
        TypeExpr::Concrete(tag)
    }
}

fn fingerprint_of(tags: &[TypeTag]) -> u64 {
    let mut hasher = FxHasher::default();
    tags.hash(&mut hasher);
    hasher.finish()
}

/// Exact-type fingerprint of a call's positional arguments.
///
/// Computed once per call so the fast phase costs one fingerprint compare
/// per candidate instead of re-deriving argument types each time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallShape {
    tags: Vec<TypeTag>,
    fingerprint: u64,
}

impl CallShape {
    pub fn of(args: &[Value]) -> Self {
        let tags: Vec<TypeTag> = args.iter().map(Value::tag).collect();
        let fingerprint = fingerprint_of(&tags);
        Self { tags, fingerprint }
    }

    /// Number of positional arguments.
    pub fn arity(&self) -> usize {
        self.tags.len()
    }
}

/// An ordered, immutable sequence of concrete parameter types.
///
/// Constructed only during bind, from already-resolved tags, so a live
/// signature never contains a placeholder.
#[derive(Debug, Clone)]
pub struct TypeSignature {
    tags: Vec<TypeTag>,
    fingerprint: u64,
}

impl TypeSignature {
    pub fn new(tags: Vec<TypeTag>) -> Self {
        let fingerprint = fingerprint_of(&tags);
        Self { tags, fingerprint }
    }

    /// The parameter tags, in declaration order.
    pub fn tags(&self) -> &[TypeTag] {
        &self.tags
    }

    /// Number of parameters.
    pub fn arity(&self) -> usize {
        self.tags.len()
    }

    /// Exact type-identity match against a precomputed call shape.
    ///
    /// The fingerprint comparison rejects almost all non-matches in O(1);
    /// the tag comparison behind it guards against hash collisions.
    pub fn fast_match(&self, shape: &CallShape) -> bool {
        self.fingerprint == shape.fingerprint && self.tags == shape.tags
    }

    /// Coercive match: converts every argument to its declared type, or
    /// fails as a whole. On success the returned vector holds the coerced
    /// arguments, which the caller must use in place of the originals.
    pub fn flex_match(
        &self,
        args: &[Value],
        engine: &CoercionEngine,
        classes: &ClassTable,
    ) -> Option<Vec<Value>> {
        if args.len() != self.tags.len() {
            return None;
        }
        let mut coerced = Vec::with_capacity(args.len());
        for (arg, tag) in args.iter().zip(&self.tags) {
            match engine.cast(arg, *tag, classes) {
                Ok(value) => coerced.push(value),
                Err(_) => return None,
            }
        }
        Some(coerced)
    }
}

impl PartialEq for TypeSignature {
    fn eq(&self, other: &Self) -> bool {
        self.tags == other.tags
    }
}

impl Eq for TypeSignature {}

impl Hash for TypeSignature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tags.hash(state);
    }
}

impl fmt::Display for TypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, tag) in self.tags.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{tag}")?;
        }
        write!(f, ")")
    }
}
