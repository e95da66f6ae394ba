//! Runtime multiple-dispatch engine for dynamically typed values.
//!
//! Manifold binds several candidate implementations to one field name,
//! each tagged with an ordered tuple of expected argument types, and
//! selects the right implementation at call time from the runtime types
//! of the actual arguments.
//!
//! # Algorithm Overview
//!
//! 1. **Declare candidates**: overloads (and at most one fallback) are
//!    collected while the owning class is still being defined; parameter
//!    types may reference the not-yet-existing owner through placeholders.
//! 2. **Bind once**: when the owner class exists, a one-time bind resolves
//!    placeholders, rejects duplicate signatures, and freezes the registry.
//! 3. **Resolve calls in three phases**: exact type identity first, then
//!    per-argument coercion, then the fallback; first match in declaration
//!    order wins.
//!
//! # Module Structure
//!
//! - [`value`] - Dynamic [`Value`] model and runtime [`TypeTag`]s
//! - [`class`] - User-class registry ([`ClassTable`], coercion constructors)
//! - [`signature`] - [`TypeSignature`] and the fast/flex matching phases
//! - [`coerce`] - [`CoercionEngine`], the table-driven cast rules
//! - [`registry`] - Candidate collection and the one-time bind step
//! - [`dispatcher`] - The callable [`Dispatcher`] and resolution algorithm
//! - [`error`] - Bind-time and call-time error types

pub mod class;
pub mod coerce;
pub mod dispatcher;
pub mod error;
pub mod registry;
pub mod signature;
pub mod value;

pub use class::{ClassId, ClassTable, Constructor};
pub use coerce::{CastError, CastResult, CoercionEngine, CoercionPolicy};
pub use dispatcher::{BoundDispatch, Dispatcher};
pub use error::{BindError, DispatchError};
pub use registry::{BoundRegistry, Candidate, DeferredRegistry, Impl};
pub use signature::{CallShape, TypeExpr, TypeSignature};
pub use value::{Kwargs, TypeTag, Value};
