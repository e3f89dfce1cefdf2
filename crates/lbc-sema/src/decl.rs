//! Declaration analysis: the two-pass declare/define lifecycle.
//!
//! Grounded on `original_source/src/Sema/SemaDecl.cpp`'s `declare`/`define`
//! split: `declare` checks for local redefinition and inserts a `Declared`
//! symbol with a placeholder type; `define` guards re-entrancy with a
//! `BeingDefined` flag (catching circular references, e.g. two `TYPE`s that
//! reference each other) and only ever transitions a symbol to `Defined`
//! once. `FuncDecl`/`UdtDecl`/`TypeAliasDecl` go through both steps, the
//! first during the module's forward-declare pass and the second during
//! source-order analysis (or earlier, if a named-type lookup needs it
//! sooner). `VarDecl` has no forward-declare step — it is declared and
//! defined in one step, inline, the first time control reaches it.

use lbc_parser::{Decl, DeclId, FuncDecl, StmtId, UdtDecl};
use lbc_common::{Span, StringId};

use crate::analyzer::Analyzer;
use crate::result::{SemaError, SemaResult};
use crate::symbol::{ScopeId, Symbol, SymbolFlags, SymbolId};
use crate::types::TypeId;

impl<'a> Analyzer<'a> {
    /// Insert a brand new symbol into `scope`, reporting (and returning the
    /// pre-existing symbol for) a local redefinition.
    pub(crate) fn declare_new(&mut self, scope: ScopeId, name: StringId, span: Span, flags: SymbolFlags, ty: TypeId) -> SymbolId {
        if let Some(existing) = self.symbols.find(scope, name, false) {
            self.diag_error(span, format!("redefinition of {}", self.name(name)));
            return existing;
        }
        let mut symbol = Symbol::new(name, ty, span);
        symbol.flags = flags;
        self.symbols.declare(scope, name, symbol)
    }

    /// Pass A: walk the top-level statement list and forward-declare every
    /// `FUNCTION`/`SUB`/`TYPE`/alias so later declarations (and each
    /// other, in the case of mutually-referencing `TYPE`s) can see them
    /// regardless of source order. `VarDecl` is left untouched here.
    pub(crate) fn forward_declare(&mut self, stmts: &[StmtId], scope: ScopeId) {
        for &stmt_id in stmts {
            match self.ast.stmts.get(stmt_id).clone() {
                lbc_parser::Stmt::Decl(decl_id) => self.declare_one(decl_id, scope),
                lbc_parser::Stmt::Extern(extern_stmt) => {
                    for decl_id in extern_stmt.decls {
                        self.declare_one(decl_id, scope);
                    }
                }
                _ => {}
            }
        }
    }

    /// The single-declaration half of Pass A, factored out so nested
    /// declarations reached outside the top-level statement list (a local
    /// `TYPE` inside a block, an `EXTERN` block's prototypes) can go
    /// through the same declare-then-define lifecycle without being
    /// wrapped in a `Stmt::Decl` first. A no-op if `decl_id` was already
    /// declared (idempotent, so callers don't need to check first).
    pub(crate) fn declare_one(&mut self, decl_id: DeclId, scope: ScopeId) {
        if self.out.decl_symbols.contains_key(&decl_id) {
            return;
        }
        match self.ast.decls.get(decl_id).clone() {
            Decl::Var(_) => {}
            Decl::Func(f) => {
                // A `DECLARE SUB`/`DECLARE FUNCTION` prototype and its later
                // `... END SUB`/`END FUNCTION` implementation are separate
                // AST nodes but name the same symbol: merge onto whichever
                // one (if any) already claimed the name, so forward
                // declaration and definition resolve to one `SymbolId`.
                // Only a *second* body is a genuine redefinition.
                if let Some(existing) = self.symbols.find(scope, f.name, false) {
                    if self.symbols.get(existing).flags.contains(SymbolFlags::FUNCTION) {
                        if f.has_impl {
                            if self.symbols.get(existing).flags.contains(SymbolFlags::HAS_BODY) {
                                self.diag_error(f.name_span, format!("redefinition of {}", self.name(f.name)));
                            } else {
                                self.symbols.get_mut(existing).flags.set(SymbolFlags::HAS_BODY);
                            }
                        }
                        self.out.decl_symbols.insert(decl_id, existing);
                        self.symbol_decls.entry(existing).or_insert(decl_id);
                        return;
                    }
                }
                let void = self.types.get_void();
                let symbol_id = self.declare_new(scope, f.name, f.name_span, SymbolFlags::FUNCTION | SymbolFlags::DECLARED, void);
                if f.has_impl {
                    self.symbols.get_mut(symbol_id).flags.set(SymbolFlags::HAS_BODY);
                }
                self.out.decl_symbols.insert(decl_id, symbol_id);
                self.symbol_decls.insert(symbol_id, decl_id);
            }
            Decl::Udt(u) => {
                let void = self.types.get_void();
                let symbol_id = self.declare_new(scope, u.name, u.name_span, SymbolFlags::TYPE | SymbolFlags::DECLARED, void);
                let udt_ty = self.types.get_udt(symbol_id, u.packed);
                self.symbols.get_mut(symbol_id).ty = udt_ty;
                self.out.decl_symbols.insert(decl_id, symbol_id);
                self.symbol_decls.insert(symbol_id, decl_id);
            }
            Decl::TypeAlias(t) => {
                let void = self.types.get_void();
                let symbol_id = self.declare_new(scope, t.name, t.span, SymbolFlags::TYPE | SymbolFlags::DECLARED, void);
                self.out.decl_symbols.insert(decl_id, symbol_id);
                self.symbol_decls.insert(symbol_id, decl_id);
            }
        }
    }

    /// Source-order analysis of a statement list already forward-declared
    /// (or a nested block, which has nothing to forward-declare). Errors in
    /// one statement are reported and the walk continues, for recovery.
    pub(crate) fn analyze_block(&mut self, stmts: &[StmtId], scope: ScopeId) {
        let saved = self.scope;
        self.scope = scope;
        for &stmt_id in stmts {
            let _ = self.analyze_stmt(stmt_id);
        }
        self.scope = saved;
    }

    /// Entry point used by `Stmt::Decl` dispatch and by `ty.rs` when a
    /// named-type lookup needs a not-yet-defined symbol realized early.
    pub(crate) fn define_decl(&mut self, decl_id: DeclId) -> SemaResult<()> {
        match self.ast.decls.get(decl_id).clone() {
            Decl::Var(_) => {
                self.analyze_var_decl(decl_id)?;
                Ok(())
            }
            Decl::Func(_) => self.define_func(decl_id),
            Decl::Udt(_) => self.define_udt(decl_id),
            Decl::TypeAlias(_) => self.define_type_alias(decl_id),
        }
    }

    pub(crate) fn define_forward_declared(&mut self, symbol_id: SymbolId) -> SemaResult<()> {
        let decl_id = *self
            .symbol_decls
            .get(&symbol_id)
            .expect("forward-declared symbol must have a recorded declaration");
        self.define_decl(decl_id)
    }

    fn guard_define(&mut self, symbol_id: SymbolId, span: Span) -> SemaResult<bool> {
        let symbol = self.symbols.get(symbol_id);
        if symbol.flags.contains(SymbolFlags::DEFINED) {
            return Ok(true); // already fully defined, nothing to do
        }
        if symbol.flags.contains(SymbolFlags::BEING_DEFINED) {
            self.diag_error(span, format!("circular definition of {}", self.name(symbol.name)));
            return Err(SemaError);
        }
        self.symbols.get_mut(symbol_id).flags.set(SymbolFlags::BEING_DEFINED);
        Ok(false)
    }

    fn define_func(&mut self, decl_id: DeclId) -> SemaResult<()> {
        let symbol_id = self.out.decl_symbols[&decl_id];
        let decl: FuncDecl = match self.ast.decls.get(decl_id) {
            Decl::Func(f) => f.clone(),
            _ => unreachable!(),
        };
        // The signature (and any cycle detection) only needs to run once —
        // but a prototype and its implementation are merged onto the same
        // symbol (see `declare_one`), so a second call here (the actual
        // `END SUB`) must still walk the body even though the symbol was
        // already marked `Defined` by the first (the prototype).
        let already_typed = self.guard_define(symbol_id, decl.name_span)?;

        let (param_types, ret_type) = if already_typed {
            match self.types.get(self.symbols.get(symbol_id).ty).clone() {
                crate::types::Type::Function { params, ret, .. } => (params, ret),
                _ => unreachable!("a FUNCTION/SUB symbol always carries a Function type once typed"),
            }
        } else {
            let param_types = decl
                .params
                .iter()
                .map(|p| self.resolve_type_expr(p.type_expr))
                .collect::<SemaResult<Vec<_>>>()?;
            let ret_type = match decl.return_type {
                Some(t) => self.resolve_type_expr(t)?,
                None => self.types.get_void(),
            };
            let func_ty = self.types.get_function(param_types.clone(), ret_type, decl.variadic);
            let symbol = self.symbols.get_mut(symbol_id);
            symbol.ty = func_ty;
            symbol.flags.unset(SymbolFlags::BEING_DEFINED);
            symbol.flags.set(SymbolFlags::DEFINED);
            (param_types, ret_type)
        };

        if let Some(body) = decl.body.clone() {
            let declaring_scope = self.scope;
            self.with_scope(declaring_scope, |az| {
                for (param, ty) in decl.params.iter().zip(param_types.iter()) {
                    let mut sym = Symbol::new(param.name, *ty, param.span);
                    sym.flags.set(SymbolFlags::VARIABLE | SymbolFlags::DEFINED);
                    az.symbols.declare(az.scope, param.name, sym);
                }
                az.cflow = crate::cflow::CfStack::new();
                az.push_return_frame(ret_type, false);
                az.analyze_block(&body, az.scope);
                az.pop_return_frame();
            });
        }

        Ok(())
    }

    fn define_udt(&mut self, decl_id: DeclId) -> SemaResult<()> {
        let symbol_id = self.out.decl_symbols[&decl_id];
        let decl: UdtDecl = match self.ast.decls.get(decl_id) {
            Decl::Udt(u) => u.clone(),
            _ => unreachable!(),
        };
        if self.guard_define(symbol_id, decl.name_span)? {
            return Ok(());
        }

        let member_scope = self.symbols.new_scope(None);
        let mut members = Vec::with_capacity(decl.members.len());
        for &member_decl_id in &decl.members {
            let var = match self.ast.decls.get(member_decl_id) {
                Decl::Var(v) => v.clone(),
                _ => continue,
            };
            let ty = match var.type_expr {
                Some(te) => match self.resolve_type_expr(te) {
                    Ok(ty) => ty,
                    Err(_) => continue,
                },
                None => {
                    self.diag_error(var.span, format!("member {} requires an explicit type", self.name(var.name)));
                    continue;
                }
            };
            let mut sym = Symbol::new(var.name, ty, var.span);
            sym.flags.set(SymbolFlags::VARIABLE | SymbolFlags::DEFINED);
            let member_id = self.symbols.declare(member_scope, var.name, sym);
            self.out.decl_symbols.insert(member_decl_id, member_id);
            members.push(member_id);
        }

        let symbol = self.symbols.get_mut(symbol_id);
        symbol.related = members;
        symbol.flags.unset(SymbolFlags::BEING_DEFINED);
        symbol.flags.set(SymbolFlags::DEFINED);
        Ok(())
    }

    fn define_type_alias(&mut self, decl_id: DeclId) -> SemaResult<()> {
        let symbol_id = self.out.decl_symbols[&decl_id];
        let (type_expr, span) = match self.ast.decls.get(decl_id) {
            Decl::TypeAlias(t) => (t.type_expr, t.span),
            _ => unreachable!(),
        };
        if self.guard_define(symbol_id, span)? {
            return Ok(());
        }
        let resolved = self.resolve_type_expr(type_expr)?;
        let symbol = self.symbols.get_mut(symbol_id);
        symbol.ty = resolved;
        symbol.flags.unset(SymbolFlags::BEING_DEFINED);
        symbol.flags.set(SymbolFlags::DEFINED);
        Ok(())
    }

    /// `VarDecl` has no forward-declare step: declare and define inline,
    /// the first time control reaches the `DIM`.
    pub(crate) fn analyze_var_decl(&mut self, decl_id: DeclId) -> SemaResult<SymbolId> {
        let var = match self.ast.decls.get(decl_id) {
            Decl::Var(v) => v.clone(),
            _ => unreachable!(),
        };

        let declared_type = match var.type_expr {
            Some(te) => Some(self.resolve_type_expr(te)?),
            None => None,
        };

        let init_id = match var.init {
            Some(init) => {
                let resolved = self.expression(init, declared_type)?;
                if resolved != init {
                    if let Decl::Var(v) = self.ast.decls.get_mut(decl_id) {
                        v.init = Some(resolved);
                    }
                }
                Some(resolved)
            }
            None => None,
        };

        if var.is_const && init_id.is_none() {
            self.diag_error(var.span, format!("CONST {} requires an initializer", self.name(var.name)));
            return Err(SemaError);
        }

        let final_type = match (declared_type, init_id) {
            (Some(t), _) => t,
            (None, Some(id)) => self.expr_type(id),
            (None, None) => {
                self.diag_error(var.span, format!("cannot infer a type for {}", self.name(var.name)));
                return Err(SemaError);
            }
        };

        let mut flags = SymbolFlags::VARIABLE | SymbolFlags::DEFINED;
        if var.is_const {
            flags.set(SymbolFlags::CONSTANT);
        }
        let symbol_id = self.declare_new(self.scope, var.name, var.name_span, flags, final_type);

        if var.is_const {
            if let Some(id) = init_id {
                if let Some(value) = self.out.expr_constants.get(&id).copied() {
                    self.symbols.get_mut(symbol_id).value = Some(value);
                }
            }
        }

        self.out.decl_symbols.insert(decl_id, symbol_id);
        Ok(symbol_id)
    }
}
