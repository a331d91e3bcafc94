//! Interned file identifiers.
//!
//! Every token and AST node carries a byte offset plus a [`FileId`]
//! rather than a raw file name, so that error reporting can resolve a
//! name lazily without every position paying for a `String` clone.

use super::interner::IStr;

/// An interned handle to a source file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileId(pub u32);

/// Maps [`FileId`] back to the file name used for error reporting.
#[derive(Debug, Default, Clone)]
pub struct FileTable {
    names: Vec<IStr>,
}

impl FileTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file name, returning its (possibly pre-existing) id.
    pub fn intern(&mut self, interner: &mut super::Interner, name: &str) -> FileId {
        let istr = interner.intern(name);
        if let Some(pos) = self.names.iter().position(|n| std::rc::Rc::ptr_eq(n, &istr)) {
            return FileId(pos as u32);
        }
        let id = FileId(self.names.len() as u32);
        self.names.push(istr);
        id
    }

    pub fn name(&self, id: FileId) -> &str {
        self.names
            .get(id.0 as usize)
            .map(|s| s.as_ref())
            .unwrap_or("<unknown>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interns_same_name_to_same_id() {
        let mut interner = Interner::new();
        let mut table = FileTable::new();
        let a = table.intern(&mut interner, "foo.yang");
        let b = table.intern(&mut interner, "foo.yang");
        assert_eq!(a, b);
        let c = table.intern(&mut interner, "bar.yang");
        assert_ne!(a, c);
        assert_eq!(table.name(a), "foo.yang");
        assert_eq!(table.name(c), "bar.yang");
    }
}
