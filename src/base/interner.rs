//! String interner for efficient string storage and comparison.
//!
//! Uses `Rc<str>` for cheap cloning (reference count increment instead of
//! allocation). The interner deduplicates strings so identical strings
//! share the same allocation — used for identifiers, namespaces, and
//! argument text across a whole compilation.

use rustc_hash::FxHashSet;
use std::rc::Rc;

/// An interned string — cheap to clone (just an `Rc` increment).
pub type IStr = Rc<str>;

/// String interner that deduplicates strings.
#[derive(Debug, Default, Clone)]
pub struct Interner {
    strings: FxHashSet<Rc<str>>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string, returning a cheap-to-clone reference.
    pub fn intern(&mut self, s: &str) -> IStr {
        if let Some(existing) = self.strings.get(s) {
            Rc::clone(existing)
        } else {
            let rc: Rc<str> = Rc::from(s);
            self.strings.insert(Rc::clone(&rc));
            rc
        }
    }

    pub fn get(&self, s: &str) -> Option<IStr> {
        self.strings.get(s).cloned()
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Release interned storage. Parse trees retain their own `IStr`
    /// clones, so dropping the interner after `check()` only frees the
    /// dedup index, not the strings themselves.
    pub fn clear(&mut self) {
        self.strings.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_returns_same_rc() {
        let mut interner = Interner::new();
        let a = interner.intern("hello");
        let b = interner.intern("hello");
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn intern_different_strings() {
        let mut interner = Interner::new();
        let a = interner.intern("hello");
        let b = interner.intern("world");
        assert!(!Rc::ptr_eq(&a, &b));
        assert_eq!(&*a, "hello");
        assert_eq!(&*b, "world");
    }

    #[test]
    fn get_existing() {
        let mut interner = Interner::new();
        interner.intern("exists");
        assert!(interner.get("exists").is_some());
        assert!(interner.get("missing").is_none());
    }
}
