//! Control-flow stack: tracks enclosing `FOR`/`DO` so `EXIT`/`CONTINUE` can
//! validate their target. Grounded on
//! `original_source/src/Ast/ControlFlowStack.hpp`'s push/pop/`with`/`find`
//! shape, simplified from its generic `Data` payload (unused by this
//! analyser) to a plain kind stack.

use lbc_parser::ControlFlowKind;

/// A growable stack of enclosing loop kinds, innermost last.
#[derive(Debug, Default)]
pub struct CfStack {
    entries: Vec<ControlFlowKind>,
}

impl CfStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: ControlFlowKind) {
        self.entries.push(kind);
    }

    pub fn pop(&mut self) {
        self.entries.pop();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Push `kind`, run `body`, then pop unconditionally — even if `body`
    /// returns an error, since control-flow scoping must stay balanced
    /// regardless of how the visit exits.
    pub fn with<T>(&mut self, kind: ControlFlowKind, body: impl FnOnce(&mut Self) -> T) -> T {
        self.push(kind);
        let result = body(self);
        self.pop();
        result
    }

    /// Walk from the innermost entry outward and report whether a loop of
    /// `kind` encloses the current position at all — `EXIT`/`CONTINUE`
    /// don't carry an explicit distance in this grammar (unlike the
    /// original's indexed variant), they always target the nearest
    /// enclosing loop of the matching kind.
    pub fn find(&self, kind: ControlFlowKind) -> bool {
        self.entries.iter().rev().any(|&k| k == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_sees_enclosing_kind() {
        let mut stack = CfStack::new();
        stack.with(ControlFlowKind::For, |s| {
            assert!(s.find(ControlFlowKind::For));
            assert!(!s.find(ControlFlowKind::Do));
        });
        assert!(stack.is_empty());
    }

    #[test]
    fn nested_loops_both_visible() {
        let mut stack = CfStack::new();
        stack.with(ControlFlowKind::For, |s| {
            s.with(ControlFlowKind::Do, |s2| {
                assert!(s2.find(ControlFlowKind::For));
                assert!(s2.find(ControlFlowKind::Do));
            });
            assert!(s.find(ControlFlowKind::For));
            assert!(!s.find(ControlFlowKind::Do));
        });
    }

    #[test]
    fn pop_happens_even_on_early_return_path() {
        let mut stack = CfStack::new();
        let _: Option<()> = stack.with(ControlFlowKind::Do, |_| None);
        assert!(stack.is_empty());
    }
}
