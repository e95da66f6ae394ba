//! Candidate collection and the one-time bind step.
//!
//! Overload declarations are a two-phase construction protocol: candidates
//! accumulate in a [`DeferredRegistry`] while the owner class is still
//! being defined, then a single consuming [`DeferredRegistry::bind`] call
//! resolves placeholders, rejects duplicates, and produces an immutable
//! [`BoundRegistry`]. The builder is gone after the transition, so a bound
//! registry can never be mutated.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::class::{ClassId, ClassTable};
use crate::error::BindError;
use crate::signature::{TypeExpr, TypeSignature};
use crate::value::{Kwargs, Value};

/// An overload implementation.
///
/// Receives the bound instance (when accessed through one), the positional
/// arguments as selected by the matching phase, and the untouched keyword
/// arguments.
pub type Impl = Arc<dyn Fn(Option<&Value>, &[Value], &Kwargs) -> Value + Send + Sync>;

/// A declared (signature-or-fallback, implementation) pair, recorded
/// before the owner class exists.
#[derive(Clone)]
pub struct Candidate {
    /// Declared parameter types, possibly containing placeholders.
    pub declared: Vec<TypeExpr>,
    /// The implementation to invoke when this candidate is selected.
    pub implementation: Impl,
    /// Whether this candidate is the signature-less fallback.
    pub is_fallback: bool,
}

impl Candidate {
    /// A candidate with a declared type list.
    pub fn typed(declared: Vec<TypeExpr>, implementation: Impl) -> Self {
        Self {
            declared,
            implementation,
            is_fallback: false,
        }
    }

    /// The signature-less fallback candidate.
    pub fn fallback(implementation: Impl) -> Self {
        Self {
            declared: Vec::new(),
            implementation,
            is_fallback: true,
        }
    }
}

impl fmt::Debug for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidate")
            .field("declared", &self.declared)
            .field("is_fallback", &self.is_fallback)
            .finish_non_exhaustive()
    }
}

/// Ordered candidate list accumulated during declaration time.
#[derive(Debug, Default)]
pub struct DeferredRegistry {
    candidates: Vec<Candidate>,
}

impl DeferredRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a candidate, preserving declaration order.
    pub fn defer(&mut self, candidate: Candidate) {
        self.candidates.push(candidate);
    }

    /// Number of deferred candidates.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Resolves placeholders against `owner` and finalizes the mapping.
    ///
    /// Consumes the builder: binding happens exactly once. `field` is used
    /// only for diagnostics.
    pub fn bind(
        self,
        owner: ClassId,
        field: &str,
        classes: &ClassTable,
    ) -> Result<BoundRegistry, BindError> {
        let mut table: IndexMap<TypeSignature, Impl> = IndexMap::new();
        let mut fallback: Option<Impl> = None;

        for candidate in self.candidates {
            if candidate.is_fallback {
                if fallback.is_some() {
                    return Err(BindError::DuplicateFallback {
                        field: field.to_string(),
                    });
                }
                fallback = Some(candidate.implementation);
                continue;
            }

            let tags = candidate
                .declared
                .iter()
                .map(|expr| expr.resolve(owner))
                .collect();
            let signature = TypeSignature::new(tags);
            if table.contains_key(&signature) {
                return Err(BindError::DuplicateSignature {
                    field: field.to_string(),
                    signature,
                });
            }
            table.insert(signature, candidate.implementation);
        }

        debug!(
            field,
            owner = classes.name(owner),
            signatures = table.len(),
            has_fallback = fallback.is_some(),
            "bound overload registry"
        );

        Ok(BoundRegistry {
            owner,
            table,
            fallback,
        })
    }
}

/// The finalized signature table. Immutable; safe to read from any thread.
pub struct BoundRegistry {
    owner: ClassId,
    table: IndexMap<TypeSignature, Impl>,
    fallback: Option<Impl>,
}

impl BoundRegistry {
    /// The class this registry was bound to.
    pub fn owner(&self) -> ClassId {
        self.owner
    }

    /// (signature, implementation) pairs in declaration order.
    pub(crate) fn entries(&self) -> impl Iterator<Item = (&TypeSignature, &Impl)> {
        self.table.iter()
    }

    /// Registered signatures in declaration order.
    pub fn signatures(&self) -> impl Iterator<Item = &TypeSignature> {
        self.table.keys()
    }

    /// The fallback implementation, if one was declared.
    pub(crate) fn fallback(&self) -> Option<&Impl> {
        self.fallback.as_ref()
    }

    /// Whether a fallback implementation is registered.
    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// Number of typed signatures (the fallback is not counted).
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl fmt::Debug for BoundRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundRegistry")
            .field("owner", &self.owner)
            .field("signatures", &self.table.keys().collect::<Vec<_>>())
            .field("has_fallback", &self.fallback.is_some())
            .finish()
    }
}
