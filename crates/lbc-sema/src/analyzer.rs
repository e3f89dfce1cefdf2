//! The semantic analyser's shared state and entry point. The per-concern
//! visiting logic lives in sibling modules (`decl`, `stmt`, `expr`, `ty`),
//! mirroring `original_source/src/Sema/{SemaDecl,SemaStmt,SemaExpr,
//! SemaType}.cpp` — each `impl Analyzer` block there is one of those files'
//! Rust counterpart.

use rustc_hash::FxHashMap;

use lbc_common::{Diagnostic, DiagnosticEngine, LiteralValue, Severity, Span, StringInterner};
use lbc_parser::{Ast, DeclId, ExprId, Module, TypeExprId};

use crate::cflow::CfStack;
use crate::relations::compare;
use crate::result::{SemaError, SemaResult};
use crate::symbol::{ScopeId, SymbolId, Symbols};
use crate::types::{Type, TypeFactory, TypeId};

/// Side tables produced by analysis, keyed by the arena ids the parser
/// already assigned. The AST crate never needs to know these exist.
#[derive(Debug, Default)]
pub struct SemaOutput {
    pub expr_types: FxHashMap<ExprId, TypeId>,
    pub expr_symbols: FxHashMap<ExprId, SymbolId>,
    pub expr_constants: FxHashMap<ExprId, LiteralValue>,
    pub expr_assignable: FxHashMap<ExprId, bool>,
    pub decl_symbols: FxHashMap<DeclId, SymbolId>,
    pub type_expr_types: FxHashMap<TypeExprId, TypeId>,
}

impl SemaOutput {
    pub fn expr_type(&self, id: ExprId) -> Option<TypeId> {
        self.expr_types.get(&id).copied()
    }
}

/// One frame per function body (plus one for the module's implicit top
/// level), tracking what a bare or valued `RETURN` must satisfy.
struct ReturnFrame {
    return_type: TypeId,
    is_implicit_main: bool,
}

pub struct Analyzer<'a> {
    pub(crate) ast: &'a mut Ast,
    pub(crate) interner: &'a mut StringInterner,
    pub(crate) diagnostics: &'a mut DiagnosticEngine,
    pub(crate) types: TypeFactory,
    pub(crate) symbols: Symbols,
    pub(crate) cflow: CfStack,
    pub(crate) out: SemaOutput,

    pub(crate) scope: ScopeId,
    pub(crate) implicit_type: Option<TypeId>,
    pub(crate) suggested_type: Option<TypeId>,
    return_stack: Vec<ReturnFrame>,
    /// Reverse of `out.decl_symbols`, populated during the forward-declare
    /// pass so a named-type lookup that hits a not-yet-defined symbol (e.g.
    /// two UDTs referencing each other) can find its way back to the
    /// declaration and `define()` it on demand.
    pub(crate) symbol_decls: FxHashMap<SymbolId, DeclId>,
}

impl<'a> Analyzer<'a> {
    fn new(ast: &'a mut Ast, interner: &'a mut StringInterner, diagnostics: &'a mut DiagnosticEngine) -> Self {
        let types = TypeFactory::new();
        let mut symbols = Symbols::new();
        let scope = symbols.new_scope(None);
        Analyzer {
            ast,
            interner,
            diagnostics,
            types,
            symbols,
            cflow: CfStack::new(),
            out: SemaOutput::default(),
            scope,
            implicit_type: None,
            suggested_type: None,
            return_stack: Vec::new(),
            symbol_decls: FxHashMap::default(),
        }
    }

    pub(crate) fn diag_error(&mut self, span: Span, message: impl Into<String>) {
        self.diagnostics.report(Diagnostic::new(Severity::Error, span, message));
    }

    pub(crate) fn name(&self, id: lbc_common::StringId) -> String {
        self.interner.resolve(id).to_string()
    }

    pub(crate) fn with_scope<T>(&mut self, parent: ScopeId, body: impl FnOnce(&mut Self) -> T) -> T {
        let child = self.symbols.new_scope(Some(parent));
        let saved = self.scope;
        self.scope = child;
        let result = body(self);
        self.scope = saved;
        result
    }

    pub(crate) fn push_return_frame(&mut self, return_type: TypeId, is_implicit_main: bool) {
        self.return_stack.push(ReturnFrame { return_type, is_implicit_main });
    }

    pub(crate) fn pop_return_frame(&mut self) {
        self.return_stack.pop();
    }

    pub(crate) fn current_return_type(&self) -> Option<TypeId> {
        self.return_stack.last().map(|f| f.return_type)
    }

    pub(crate) fn current_return_allows_bare(&self) -> bool {
        self.return_stack
            .last()
            .map(|f| f.is_implicit_main || self.types.get(f.return_type).is_void())
            .unwrap_or(true)
    }

    // ── Expression side-table accessors ──────────────────────────────

    pub(crate) fn expr_type(&self, id: ExprId) -> TypeId {
        *self
            .out
            .expr_types
            .get(&id)
            .unwrap_or_else(|| panic!("expression {id:?} analysed without a recorded type"))
    }

    pub(crate) fn set_expr_type(&mut self, id: ExprId, ty: TypeId) {
        self.out.expr_types.insert(id, ty);
    }

    pub(crate) fn set_assignable(&mut self, id: ExprId, assignable: bool) {
        self.out.expr_assignable.insert(id, assignable);
    }

    pub(crate) fn is_assignable(&self, id: ExprId) -> bool {
        self.out.expr_assignable.get(&id).copied().unwrap_or(false)
    }

    pub(crate) fn set_expr_symbol(&mut self, id: ExprId, symbol: SymbolId) {
        self.out.expr_symbols.insert(id, symbol);
    }

    pub(crate) fn set_expr_constant(&mut self, id: ExprId, value: LiteralValue) {
        self.out.expr_constants.insert(id, value);
    }

    /// Record a type suggestion propagating upward from a typed leaf.
    /// Only meaningful while no `implicit_type` is already constraining the
    /// expression — once a target is known there's nothing left to infer.
    pub(crate) fn suggest(&mut self, ty: TypeId) {
        if self.implicit_type.is_some() {
            return;
        }
        self.suggested_type = Some(match self.suggested_type {
            None => ty,
            Some(existing) => crate::relations::common(&self.types, existing, ty).unwrap_or(existing),
        });
    }

    /// Insert an implicit cast if `id`'s current type is convertible to
    /// `target` but not identical. Returns the (possibly new) id the
    /// caller should store in its own field. Diagnoses incompatible types.
    pub(crate) fn coerce_to(&mut self, id: ExprId, target: TypeId) -> SemaResult<ExprId> {
        let current = self.expr_type(id);
        if current == target {
            return Ok(id);
        }
        let cmp = compare(&self.types, target, current);
        if !cmp.is_convertible() {
            let span = self.ast.exprs.get(id).span();
            self.diag_error(
                span,
                format!(
                    "cannot convert {} to {}",
                    self.type_name(current),
                    self.type_name(target)
                ),
            );
            return Err(SemaError);
        }
        let span = self.ast.exprs.get(id).span();
        let cast_id = self.ast.exprs.alloc(lbc_parser::Expr::Cast(lbc_parser::CastExpr {
            span,
            operand: id,
            type_expr: None,
            implicit: true,
        }));
        self.set_expr_type(cast_id, target);
        crate::fold::fold_cast(self, cast_id, target);
        Ok(cast_id)
    }

    /// Try to re-type a literal in place to `target` when both are in the
    /// same value family (integral↔integral, float↔float, null↔pointer).
    /// Returns `true` on success; the caller falls back to the generic
    /// default-then-coerce path on failure.
    pub(crate) fn coerce_literal_inplace(&mut self, id: ExprId, target: TypeId) -> bool {
        let value = match self.ast.exprs.get(id) {
            lbc_parser::Expr::Literal(lit) => lit.value,
            _ => return false,
        };
        let target_ty = self.types.get(target).clone();
        let matches = match (&value, &target_ty) {
            (LiteralValue::Integral(_), Type::Integral(_)) => true,
            (LiteralValue::Float(_), Type::Float(_)) => true,
            (LiteralValue::Null, Type::Pointer(_)) => true,
            (LiteralValue::Bool(_), Type::Bool) => true,
            (LiteralValue::Str(_), Type::ZString) => true,
            _ => false,
        };
        if !matches {
            return false;
        }
        self.set_expr_type(id, target);
        true
    }

    pub(crate) fn type_name(&self, id: TypeId) -> String {
        crate::ty::describe(&self.types, id)
    }

    /// Run full analysis over a parsed module: forward-declare pass, then
    /// source-order analysis of the body.
    pub fn analyze(
        ast: &'a mut Ast,
        module: &Module,
        interner: &'a mut StringInterner,
        diagnostics: &'a mut DiagnosticEngine,
    ) -> Self {
        let mut analyzer = Analyzer::new(ast, interner, diagnostics);
        let global = analyzer.scope;
        analyzer.push_return_frame(analyzer.types.get_void(), module.implicit_main);
        analyzer.forward_declare(&module.body, global);
        analyzer.analyze_block(&module.body, global);
        analyzer.pop_return_frame();
        analyzer
    }

    pub fn output(&self) -> &SemaOutput {
        &self.out
    }

    pub fn types(&self) -> &TypeFactory {
        &self.types
    }

    pub fn symbols(&self) -> &Symbols {
        &self.symbols
    }

    pub fn into_parts(self) -> (TypeFactory, Symbols, SemaOutput) {
        (self.types, self.symbols, self.out)
    }
}

/// Free-function entry point, so callers don't need `Analyzer` in scope
/// just to drive analysis.
pub fn analyze<'a>(
    ast: &'a mut Ast,
    module: &Module,
    interner: &'a mut StringInterner,
    diagnostics: &'a mut DiagnosticEngine,
) -> Analyzer<'a> {
    Analyzer::analyze(ast, module, interner, diagnostics)
}
