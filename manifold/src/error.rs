//! Errors surfaced at declaration, bind, and call time.
//!
//! Bind-time errors ([`BindError`]) are fatal: the owning class fails to
//! come into existence. Call-time errors ([`DispatchError`]) are reported
//! to the caller of the overloaded field and are recoverable. Coercion
//! failures never appear here; they are consumed inside the match loop.

use thiserror::Error;

use crate::signature::TypeSignature;
use crate::value::Value;

/// Fatal errors raised while declaring candidates or binding the registry.
#[derive(Debug, Error)]
pub enum BindError {
    /// Two candidates resolved to structurally identical signatures.
    #[error("duplicate overload signature {signature} for field `{field}`")]
    DuplicateSignature {
        field: String,
        signature: TypeSignature,
    },

    /// More than one candidate was declared as the fallback.
    #[error("field `{field}` declares more than one fallback implementation")]
    DuplicateFallback { field: String },

    /// A declaration or second bind arrived after the registry was
    /// finalized.
    #[error("field `{field}` is already bound; the registry is immutable")]
    AlreadyBound { field: String },
}

/// Errors raised when calling through a dispatcher.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The field was called before the binding hook ran.
    #[error("field `{field}` was called before its owner class was bound")]
    NotBound { field: String },

    /// No phase produced a match and no fallback was registered. Carries
    /// the original arguments for diagnostics.
    #[error("no overload of `{owner}.{field}` accepts ({})", fmt_args(.args))]
    NoMatch {
        owner: String,
        field: String,
        args: Vec<Value>,
    },
}

fn fmt_args(args: &[Value]) -> String {
    args.iter()
        .map(|a| format!("{}: {}", a, a.tag()))
        .collect::<Vec<_>>()
        .join(", ")
}
