//! String interning for lexed string tokens.
//!
//! Equal byte strings resolve to the same shared buffer; tokens only carry
//! a `Symbol` index into the arena.

use crate::table::HashTable;
use std::rc::Rc;

/// Handle to an interned string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(u32);

#[derive(Default)]
pub struct StringIntern {
    index: HashTable<Rc<[u8]>, Symbol>,
    strings: Vec<Rc<[u8]>>,
}

impl StringIntern {
    pub fn new() -> Self { Self::default() }

    /// Returns the symbol for `s`, copying it into the arena on first sight.
    pub fn intern(&mut self, s: &[u8]) -> Symbol {
        if let Some(sym) = self.index.get(s) {
            return *sym;
        }
        let sym = Symbol(self.strings.len() as u32);
        let buf: Rc<[u8]> = Rc::from(s);
        self.strings.push(Rc::clone(&buf));
        self.index.put(buf, sym);
        sym
    }

    pub fn resolve(&self, sym: Symbol) -> &[u8] {
        &self.strings[sym.0 as usize]
    }

    /// Shared handle to the interned buffer.
    pub fn shared(&self, sym: Symbol) -> Rc<[u8]> {
        Rc::clone(&self.strings[sym.0 as usize])
    }

    pub fn len(&self) -> usize { self.strings.len() }
    pub fn is_empty(&self) -> bool { self.strings.is_empty() }
}
