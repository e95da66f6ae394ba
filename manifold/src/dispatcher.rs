//! The callable dispatcher and its three-phase resolution algorithm.
//!
//! A [`Dispatcher`] is the externally visible object bound to one
//! overloaded field of one class: candidates are declared on it while the
//! class body executes, the class-construction machinery calls
//! [`Dispatcher::bind_to`] exactly once, and from then on the dispatcher
//! is read-only and callable.
//!
//! # Algorithm Overview
//!
//! 1. **Fast phase**: scan signatures in declaration order; the first
//!    exact type-identity match wins and receives the original arguments.
//! 2. **Flex phase**: scan again in the same order; the first signature
//!    whose every argument coerces wins and receives the coerced
//!    arguments.
//! 3. **Fallback**: a registered fallback receives the original,
//!    un-coerced arguments.
//! 4. Otherwise the call fails with [`DispatchError::NoMatch`].
//!
//! First match wins: declaration order is the tie-break. The fast phase
//! runs first so the common exact-type call never allocates and never runs
//! a user constructor; coercion is strictly a last resort before the
//! fallback.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::class::{ClassId, ClassTable};
use crate::coerce::{CoercionEngine, CoercionPolicy};
use crate::error::{BindError, DispatchError};
use crate::registry::{BoundRegistry, Candidate, DeferredRegistry, Impl};
use crate::signature::{CallShape, TypeExpr, TypeSignature};
use crate::value::{Kwargs, Value};

enum RegistryState {
    Deferred(DeferredRegistry),
    Bound(BoundRegistry),
}

/// One overloaded field: a candidate collector before bind, an immutable
/// overload table afterwards.
pub struct Dispatcher {
    field: Option<String>,
    owner_name: Option<String>,
    coercion: CoercionEngine,
    state: RegistryState,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::with_policy(CoercionPolicy::default())
    }

    /// A dispatcher whose flex phase uses the given coercion policy.
    pub fn with_policy(policy: CoercionPolicy) -> Self {
        Self {
            field: None,
            owner_name: None,
            coercion: CoercionEngine::with_policy(policy),
            state: RegistryState::Deferred(DeferredRegistry::new()),
        }
    }

    fn field_name(&self) -> String {
        self.field.clone().unwrap_or_else(|| "<unbound>".to_string())
    }

    /// Declares a typed overload. Legal only before bind.
    pub fn overload<F>(&mut self, declared: Vec<TypeExpr>, implementation: F) -> Result<(), BindError>
    where
        F: Fn(Option<&Value>, &[Value], &Kwargs) -> Value + Send + Sync + 'static,
    {
        self.defer(Candidate::typed(declared, Arc::new(implementation)))
    }

    /// Declares the signature-less fallback. Legal only before bind; a
    /// second fallback is rejected later, at bind time.
    pub fn fallback<F>(&mut self, implementation: F) -> Result<(), BindError>
    where
        F: Fn(Option<&Value>, &[Value], &Kwargs) -> Value + Send + Sync + 'static,
    {
        self.defer(Candidate::fallback(Arc::new(implementation)))
    }

    /// Appends a pre-built candidate. Legal only before bind.
    pub fn defer(&mut self, candidate: Candidate) -> Result<(), BindError> {
        match &mut self.state {
            RegistryState::Deferred(registry) => {
                registry.defer(candidate);
                Ok(())
            }
            RegistryState::Bound(_) => Err(BindError::AlreadyBound {
                field: self.field_name(),
            }),
        }
    }

    /// The binding hook: called exactly once by the class-construction
    /// machinery, at the moment the owner class is fully known.
    ///
    /// Resolves every placeholder, checks for duplicates, and locks the
    /// registry. A second call is an error.
    pub fn bind_to(
        &mut self,
        owner: ClassId,
        field: &str,
        classes: &ClassTable,
    ) -> Result<(), BindError> {
        match std::mem::replace(&mut self.state, RegistryState::Deferred(DeferredRegistry::new()))
        {
            RegistryState::Deferred(registry) => {
                let bound = registry.bind(owner, field, classes)?;
                self.field = Some(field.to_string());
                self.owner_name = Some(classes.name(owner).to_string());
                self.state = RegistryState::Bound(bound);
                Ok(())
            }
            RegistryState::Bound(bound) => {
                // Put the finalized registry back untouched before failing.
                self.state = RegistryState::Bound(bound);
                Err(BindError::AlreadyBound {
                    field: self.field_name(),
                })
            }
        }
    }

    /// Whether the binding hook has run.
    pub fn is_bound(&self) -> bool {
        matches!(self.state, RegistryState::Bound(_))
    }

    /// Registered signatures in declaration order. Empty before bind.
    pub fn signatures(&self) -> Vec<&TypeSignature> {
        match &self.state {
            RegistryState::Deferred(_) => Vec::new(),
            RegistryState::Bound(bound) => bound.signatures().collect(),
        }
    }

    /// Attribute-style access: `instance = None` is class-level access,
    /// `instance = Some(..)` is instance-level. The view is cheap and
    /// short-lived and never mutates the registry.
    pub fn get<'a>(&'a self, instance: Option<&'a Value>) -> BoundDispatch<'a> {
        BoundDispatch {
            dispatcher: self,
            instance,
        }
    }

    /// Class-level call convenience; equivalent to `get(None).call(..)`.
    pub fn call(
        &self,
        classes: &ClassTable,
        args: &[Value],
        kwargs: &Kwargs,
    ) -> Result<Value, DispatchError> {
        self.get(None).call(classes, args, kwargs)
    }
}

impl fmt::Display for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let owner = self.owner_name.as_deref().unwrap_or("<unbound>");
        writeln!(f, "dispatcher `{}.{}`:", owner, self.field_name())?;
        match &self.state {
            RegistryState::Deferred(registry) => {
                write!(f, "  {} deferred candidate(s), not yet bound", registry.len())
            }
            RegistryState::Bound(bound) => {
                for signature in bound.signatures() {
                    writeln!(f, "  {signature}")?;
                }
                if bound.has_fallback() {
                    writeln!(f, "  <fallback>")?;
                }
                write!(f, "  {} signature(s)", bound.len())
            }
        }
    }
}

/// Per-access view of a dispatcher, optionally bound to an instance.
#[derive(Clone, Copy)]
pub struct BoundDispatch<'a> {
    dispatcher: &'a Dispatcher,
    instance: Option<&'a Value>,
}

impl<'a> BoundDispatch<'a> {
    /// The instance this view is bound to, if any.
    pub fn instance(&self) -> Option<&'a Value> {
        self.instance
    }

    /// Runs the three-phase resolution algorithm.
    pub fn call(
        &self,
        classes: &ClassTable,
        args: &[Value],
        kwargs: &Kwargs,
    ) -> Result<Value, DispatchError> {
        let dispatcher = self.dispatcher;
        let registry = match &dispatcher.state {
            RegistryState::Bound(bound) => bound,
            RegistryState::Deferred(_) => {
                return Err(DispatchError::NotBound {
                    field: dispatcher.field_name(),
                })
            }
        };

        // Phase 1: exact type identity, original arguments.
        let shape = CallShape::of(args);
        for (signature, implementation) in registry.entries() {
            if signature.fast_match(&shape) {
                trace!(signature = %signature, phase = "fast", "dispatch hit");
                return Ok(self.invoke(implementation, args, kwargs));
            }
        }

        // Phase 2: coercive, same order, coerced arguments.
        for (signature, implementation) in registry.entries() {
            if let Some(coerced) = signature.flex_match(args, &dispatcher.coercion, classes) {
                trace!(signature = %signature, phase = "flex", "dispatch hit");
                return Ok(self.invoke(implementation, &coerced, kwargs));
            }
        }

        // Phase 3: fallback, original un-coerced arguments.
        if let Some(implementation) = registry.fallback() {
            trace!(phase = "fallback", "dispatch hit");
            return Ok(self.invoke(implementation, args, kwargs));
        }

        Err(DispatchError::NoMatch {
            owner: classes.name(registry.owner()).to_string(),
            field: dispatcher.field_name(),
            args: args.to_vec(),
        })
    }

    fn invoke(&self, implementation: &Impl, args: &[Value], kwargs: &Kwargs) -> Value {
        implementation(self.instance, args, kwargs)
    }
}
