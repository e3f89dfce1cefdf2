//! Symbols and lexically-nested symbol tables.
//!
//! Grounded on `original_source/src/Symbol/{Symbol.hpp,SymbolTable.hpp}`:
//! a symbol carries a name, optional alias, type, declaration range,
//! visibility, lifecycle flags, optional constant value, and a list of
//! related symbols (function parameters, UDT members). A symbol table is a
//! parent-chained name→symbol map; `find` walks the chain unless told to
//! stay local.

use lbc_parser::{Arena, Id};
use rustc_hash::FxHashMap;

use lbc_common::{LiteralValue, Span, StringId};

use crate::types::TypeId;

pub type SymbolId = Id<Symbol>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolVisibility {
    Private,
    External,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SymbolFlags(u8);

impl SymbolFlags {
    pub const NONE: SymbolFlags = SymbolFlags(0);
    pub const BEING_DEFINED: SymbolFlags = SymbolFlags(1 << 0);
    pub const DEFINED: SymbolFlags = SymbolFlags(1 << 1);
    pub const DECLARED: SymbolFlags = SymbolFlags(1 << 2);
    pub const FUNCTION: SymbolFlags = SymbolFlags(1 << 3);
    pub const VARIABLE: SymbolFlags = SymbolFlags(1 << 4);
    pub const CONSTANT: SymbolFlags = SymbolFlags(1 << 5);
    pub const TYPE: SymbolFlags = SymbolFlags(1 << 6);
    /// Set once a `FuncDecl` carrying a body (`SUB ... END SUB`) has been
    /// merged onto this symbol. A `DECLARE SUB Foo()` prototype followed by
    /// `SUB Foo() ... END SUB` shares one symbol (the prototype contributes
    /// only a signature); a *second* body is the actual redefinition.
    pub const HAS_BODY: SymbolFlags = SymbolFlags(1 << 7);

    pub fn contains(self, other: SymbolFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn set(&mut self, other: SymbolFlags) {
        self.0 |= other.0;
    }

    pub fn unset(&mut self, other: SymbolFlags) {
        self.0 &= !other.0;
    }
}

impl std::ops::BitOr for SymbolFlags {
    type Output = SymbolFlags;
    fn bitor(self, rhs: SymbolFlags) -> SymbolFlags {
        SymbolFlags(self.0 | rhs.0)
    }
}

/// A named program entity: variable, function, constant, or type.
/// Arena-allocated; lifecycle is tracked via [`SymbolFlags`].
///
/// A symbol may only transition to `Defined` once — [`SymbolFlags::DEFINED`]
/// is checked by the analyser before re-running `define`.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: StringId,
    pub alias: Option<StringId>,
    pub ty: TypeId,
    pub range: Span,
    pub visibility: SymbolVisibility,
    pub flags: SymbolFlags,
    pub value: Option<LiteralValue>,
    pub related: Vec<SymbolId>,
}

impl Symbol {
    pub fn new(name: StringId, ty: TypeId, range: Span) -> Self {
        Symbol {
            name,
            alias: None,
            ty,
            range,
            visibility: SymbolVisibility::Private,
            flags: SymbolFlags::NONE,
            value: None,
            related: Vec::new(),
        }
    }

    /// The effective name for code-gen / linking: alias if set, else the
    /// declared name.
    pub fn symbol_name(&self) -> StringId {
        self.alias.unwrap_or(self.name)
    }
}

pub type ScopeId = Id<SymbolTable>;

/// A scope node with a parent pointer and a name→symbol map. Lookup is
/// either local-only or recursive up the parent chain.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    pub parent: Option<ScopeId>,
    symbols: FxHashMap<StringId, SymbolId>,
}

impl SymbolTable {
    pub fn new(parent: Option<ScopeId>) -> Self {
        SymbolTable {
            parent,
            symbols: FxHashMap::default(),
        }
    }

    pub fn insert(&mut self, name: StringId, id: SymbolId) {
        self.symbols.insert(name, id);
    }

    pub fn find_local(&self, name: StringId) -> Option<SymbolId> {
        self.symbols.get(&name).copied()
    }
}

/// Owns every [`Symbol`] and [`SymbolTable`] allocated during analysis.
/// Scopes are arena-indexed so the analyser can hold a "current scope" id
/// without borrowing the whole table mutably.
#[derive(Debug, Default)]
pub struct Symbols {
    pub symbols: Arena<Symbol>,
    pub scopes: Arena<SymbolTable>,
}

impl Symbols {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_scope(&mut self, parent: Option<ScopeId>) -> ScopeId {
        self.scopes.alloc(SymbolTable::new(parent))
    }

    pub fn declare(&mut self, scope: ScopeId, name: StringId, symbol: Symbol) -> SymbolId {
        let id = self.symbols.alloc(symbol);
        self.scopes.get_mut(scope).insert(name, id);
        id
    }

    /// Find a symbol by name. Searches parent scopes iff `recursive`.
    pub fn find(&self, scope: ScopeId, name: StringId, recursive: bool) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let table = self.scopes.get(id);
            if let Some(found) = table.find_local(name) {
                return Some(found);
            }
            if !recursive {
                return None;
            }
            current = table.parent;
        }
        None
    }

    pub fn contains(&self, scope: ScopeId, name: StringId, recursive: bool) -> bool {
        self.find(scope, name, recursive).is_some()
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        self.symbols.get(id)
    }

    pub fn get_mut(&mut self, id: SymbolId) -> &mut Symbol {
        self.symbols.get_mut(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeFactory;
    use lbc_common::StringInterner;

    #[test]
    fn recursive_lookup_walks_parent_chain() {
        let mut interner = StringInterner::new();
        let mut symbols = Symbols::new();
        let types = TypeFactory::new();
        let outer = symbols.new_scope(None);
        let inner = symbols.new_scope(Some(outer));

        let name = interner.intern("X");
        let sym = Symbol::new(name, types.get_void(), Span::at(0));
        symbols.declare(outer, name, sym);

        assert!(symbols.contains(inner, name, true));
        assert!(!symbols.contains(inner, name, false));
    }

    #[test]
    fn local_lookup_does_not_see_parent() {
        let mut interner = StringInterner::new();
        let mut symbols = Symbols::new();
        let outer = symbols.new_scope(None);
        let inner = symbols.new_scope(Some(outer));
        let name = interner.intern("Y");
        assert!(!symbols.contains(inner, name, true));
        let _ = outer;
    }
}
