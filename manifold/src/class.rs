//! User-class registry.
//!
//! The engine does not know what a user class *is* beyond an identity and,
//! optionally, a single-argument constructor the coercion engine may try as
//! its last resort. Classes are declared into a [`ClassTable`] owned by the
//! host, which hands out copyable [`ClassId`]s.

use std::fmt;
use std::sync::Arc;

use crate::value::Value;

/// Identity of a user-declared class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId {
    /// Index into the owning [`ClassTable`].
    pub index: u32,
}

impl ClassId {
    /// Create a class id from a raw index.
    pub fn new(index: u32) -> Self {
        Self { index }
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index)
    }
}

/// Single-argument constructor used by the coercion fallback path.
///
/// An `Err` here is contained by the coercion engine; it never propagates
/// past the dispatcher.
pub type Constructor = Arc<dyn Fn(&Value) -> Result<Value, String> + Send + Sync>;

struct ClassDef {
    name: String,
    constructor: Option<Constructor>,
}

/// Append-only table of user classes.
#[derive(Default)]
pub struct ClassTable {
    defs: Vec<ClassDef>,
}

impl ClassTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a class with no constructor.
    pub fn declare(&mut self, name: &str) -> ClassId {
        self.push(name, None)
    }

    /// Declares a class whose single-argument constructor the coercion
    /// engine may invoke when nothing cheaper applies.
    pub fn declare_with_constructor<F>(&mut self, name: &str, constructor: F) -> ClassId
    where
        F: Fn(&Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.push(name, Some(Arc::new(constructor)))
    }

    fn push(&mut self, name: &str, constructor: Option<Constructor>) -> ClassId {
        let id = ClassId::new(self.defs.len() as u32);
        self.defs.push(ClassDef {
            name: name.to_string(),
            constructor,
        });
        id
    }

    /// The declared name of a class, or a positional placeholder for ids
    /// that were never declared here.
    pub fn name(&self, id: ClassId) -> &str {
        self.defs
            .get(id.index as usize)
            .map(|d| d.name.as_str())
            .unwrap_or("<unknown class>")
    }

    /// The class's registered constructor, if any.
    pub fn constructor(&self, id: ClassId) -> Option<&Constructor> {
        self.defs
            .get(id.index as usize)
            .and_then(|d| d.constructor.as_ref())
    }

    /// Number of declared classes.
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declare_assigns_sequential_ids() {
        let mut classes = ClassTable::new();
        let a = classes.declare("Alpha");
        let b = classes.declare("Beta");
        assert_eq!(a.index, 0);
        assert_eq!(b.index, 1);
        assert_eq!(classes.name(a), "Alpha");
        assert_eq!(classes.name(b), "Beta");
    }

    #[test]
    fn test_unknown_id_has_placeholder_name() {
        let classes = ClassTable::new();
        assert_eq!(classes.name(ClassId::new(7)), "<unknown class>");
    }

    #[test]
    fn test_constructor_lookup() {
        let mut classes = ClassTable::new();
        let plain = classes.declare("Plain");
        let built = classes.declare_with_constructor("Built", |v| Ok(v.clone()));
        assert!(classes.constructor(plain).is_none());
        assert!(classes.constructor(built).is_some());
    }
}
