//! Statement analysis: dispatches `Stmt` variants to the declaration,
//! expression, and control-flow machinery (Pass B).
//!
//! Grounded on `original_source/src/Sema/SemaStmt.cpp`. A statement that
//! fails to analyse is diagnosed and skipped — `analyze_block` (in
//! `decl.rs`) already discards this function's `Err` so a later statement
//! in the same block still gets analysed, matching the "report and
//! recover" posture the parser uses.

use lbc_common::{literal::sign_extend, LiteralValue, Span};
use lbc_parser::{ControlFlowKind, Decl, DeclId, Expr, ForDirection, LiteralExpr, Stmt, StmtId};

use crate::result::{SemaError, SemaResult};
use crate::types::TypeId;

impl<'a> crate::analyzer::Analyzer<'a> {
    pub(crate) fn analyze_stmt(&mut self, stmt_id: StmtId) -> SemaResult<()> {
        match self.ast.stmts.get(stmt_id).clone() {
            Stmt::Decl(decl_id) => self.analyze_decl_stmt(decl_id),
            Stmt::Expr(e) => {
                let new_id = self.expression(e.expr, None)?;
                if new_id != e.expr {
                    if let Stmt::Expr(s) = self.ast.stmts.get_mut(stmt_id) {
                        s.expr = new_id;
                    }
                }
                Ok(())
            }
            Stmt::Return(r) => self.analyze_return_stmt(stmt_id, r.span, r.expr),
            Stmt::If(if_stmt) => {
                let new_blocks = self.analyze_if_blocks(if_stmt.blocks);
                if let Stmt::If(s) = self.ast.stmts.get_mut(stmt_id) {
                    s.blocks = new_blocks;
                }
                Ok(())
            }
            Stmt::For(for_stmt) => self.analyze_for_stmt(stmt_id, for_stmt),
            Stmt::DoLoop(do_stmt) => self.analyze_do_loop_stmt(stmt_id, do_stmt),
            Stmt::Continuation(c) => {
                if !self.cflow.find(c.target) {
                    let what = match c.target {
                        ControlFlowKind::For => "FOR",
                        ControlFlowKind::Do => "DO",
                    };
                    self.diag_error(c.span, format!("nothing to {} here: no enclosing {what} loop", continuation_verb(c.kind)));
                    return Err(SemaError);
                }
                Ok(())
            }
            Stmt::Import(_) => Ok(()),
            Stmt::Extern(extern_stmt) => {
                for &decl_id in &extern_stmt.decls {
                    self.declare_one(decl_id, self.scope);
                    let _ = self.define_decl(decl_id);
                }
                Ok(())
            }
        }
    }

    /// A declaration reached in source-order. Top-level `Func`/`Udt`/
    /// `TypeAlias` decls were already declared by the module's forward-
    /// declare pass, so only `define` runs for them here; anything never
    /// forward-declared (a nested local decl, or `VarDecl`, which has no
    /// forward-declare step at all) is declared on the spot.
    fn analyze_decl_stmt(&mut self, decl_id: DeclId) -> SemaResult<()> {
        self.declare_one(decl_id, self.scope);
        match self.ast.decls.get(decl_id) {
            Decl::Var(_) => {
                self.analyze_var_decl(decl_id)?;
                Ok(())
            }
            _ => self.define_decl(decl_id),
        }
    }

    fn analyze_return_stmt(&mut self, stmt_id: StmtId, span: Span, expr: Option<lbc_parser::ExprId>) -> SemaResult<()> {
        let return_type = self.current_return_type().unwrap_or_else(|| self.types.get_void());
        match expr {
            Some(id) => {
                if self.types.get(return_type).is_void() && !self.current_return_allows_bare() {
                    self.diag_error(span, "a SUB cannot return a value");
                    return Err(SemaError);
                }
                let new_id = self.expression(id, Some(return_type))?;
                if new_id != id {
                    if let Stmt::Return(r) = self.ast.stmts.get_mut(stmt_id) {
                        r.expr = Some(new_id);
                    }
                }
                Ok(())
            }
            None => {
                if !self.current_return_allows_bare() {
                    self.diag_error(span, "missing return value");
                    return Err(SemaError);
                }
                Ok(())
            }
        }
    }

    /// Each block gets its own nested scope, chained off the previous
    /// block's — so a `DIM` at the top of one `ELSEIF` body is visible to
    /// the guard expression of the block that follows it.
    fn analyze_if_blocks(&mut self, blocks: Vec<lbc_parser::IfBlock>) -> Vec<lbc_parser::IfBlock> {
        let bool_ty = self.types.get_bool();
        let mut prev_scope = self.scope;
        let mut result = Vec::with_capacity(blocks.len());
        for mut block in blocks {
            if let Some(guard) = block.guard {
                let saved = self.scope;
                self.scope = prev_scope;
                let coerced = self.expression(guard, Some(bool_ty));
                self.scope = saved;
                if let Ok(new_guard) = coerced {
                    block.guard = Some(new_guard);
                }
            }
            let block_scope = self.symbols.new_scope(Some(prev_scope));
            self.analyze_block(&block.body, block_scope);
            prev_scope = block_scope;
            result.push(block);
        }
        result
    }

    fn analyze_for_stmt(&mut self, stmt_id: StmtId, for_stmt: lbc_parser::ForStmt) -> SemaResult<()> {
        let iterator_decl = for_stmt.decls[0];
        let declared_type_expr = match self.ast.decls.get(iterator_decl) {
            Decl::Var(v) => v.type_expr,
            _ => unreachable!("FOR's own decl is always a VarDecl"),
        };

        let loop_scope = self.symbols.new_scope(Some(self.scope));
        let saved_scope = self.scope;
        self.scope = loop_scope;

        let from_result = self.expression(for_stmt.from, None);
        self.scope = saved_scope;
        let mut from_id = from_result?;
        let natural_ty = self.expr_type(from_id);

        let iter_ty = match declared_type_expr {
            Some(te) => self.resolve_type_expr(te)?,
            None => natural_ty,
        };
        if !self.types.get(iter_ty).is_numeric() {
            self.diag_error(for_stmt.span, "FOR iterator must be a numeric type");
            return Err(SemaError);
        }
        if natural_ty != iter_ty && !self.coerce_literal_inplace(from_id, iter_ty) {
            from_id = self.coerce_to(from_id, iter_ty)?;
        }

        self.scope = loop_scope;
        let to_result = self.expression(for_stmt.to, Some(iter_ty));
        let step_result = match for_stmt.step {
            Some(step) => self.expression(step, Some(iter_ty)).map(Some),
            None => Ok(None),
        };
        self.scope = saved_scope;
        let to_id = to_result?;
        let step_id = step_result?;

        // Direction is inferred from the *signed* step (a negative STEP
        // against an ascending FROM..TO range is the degenerate `Skip`
        // case); only afterwards is the step node itself replaced with its
        // absolute value for storage.
        let direction = infer_for_direction(self, from_id, to_id, step_id);

        let step_id = match step_id {
            Some(id) => Some(self.materialize_abs_if_negative(id, iter_ty)),
            None => None,
        };

        let iterator_name_span = for_stmt.iterator_span;
        let symbol_id = self.declare_new(
            loop_scope,
            for_stmt.iterator_name,
            iterator_name_span,
            crate::symbol::SymbolFlags::VARIABLE | crate::symbol::SymbolFlags::DEFINED,
            iter_ty,
        );
        self.out.decl_symbols.insert(iterator_decl, symbol_id);

        self.cflow.push(ControlFlowKind::For);
        self.analyze_block(&for_stmt.body, loop_scope);
        self.cflow.pop();

        if let Stmt::For(s) = self.ast.stmts.get_mut(stmt_id) {
            s.from = from_id;
            s.to = to_id;
            s.step = step_id;
            s.direction = direction;
        }
        Ok(())
    }

    /// If `id`'s folded value is a negative literal, synthesize a fresh
    /// literal node holding its absolute value and return that id instead
    /// — the sign itself is preserved only in the inferred `direction`.
    fn materialize_abs_if_negative(&mut self, id: lbc_parser::ExprId, ty: TypeId) -> lbc_parser::ExprId {
        let Some(value) = self.out.expr_constants.get(&id).copied() else {
            return id;
        };
        let (abs_value, negative) = match value {
            LiteralValue::Integral(raw) => {
                let signed = sign_extend(raw, 64);
                (LiteralValue::Integral(signed.unsigned_abs()), signed < 0)
            }
            LiteralValue::Float(f) => (LiteralValue::Float(f.abs()), f < 0.0),
            _ => return id,
        };
        if !negative {
            return id;
        }
        let span = self.ast.exprs.get(id).span();
        let new_id = self.ast.exprs.alloc(Expr::Literal(LiteralExpr { span, value: abs_value }));
        self.set_expr_type(new_id, ty);
        self.set_expr_constant(new_id, abs_value);
        new_id
    }

    fn analyze_do_loop_stmt(&mut self, stmt_id: StmtId, do_stmt: lbc_parser::DoLoopStmt) -> SemaResult<()> {
        let bool_ty = self.types.get_bool();
        let loop_scope = self.symbols.new_scope(Some(self.scope));
        let saved_scope = self.scope;
        self.scope = loop_scope;
        let mut condition_id = do_stmt.condition;
        if let Some(cond) = do_stmt.condition {
            if let Ok(new_id) = self.expression(cond, Some(bool_ty)) {
                condition_id = Some(new_id);
            }
        }
        self.scope = saved_scope;

        if condition_id != do_stmt.condition {
            if let Stmt::DoLoop(d) = self.ast.stmts.get_mut(stmt_id) {
                d.condition = condition_id;
            }
        }

        self.cflow.push(ControlFlowKind::Do);
        self.analyze_block(&do_stmt.body, loop_scope);
        self.cflow.pop();
        Ok(())
    }
}

fn continuation_verb(kind: lbc_parser::ContinuationKind) -> &'static str {
    match kind {
        lbc_parser::ContinuationKind::Exit => "EXIT",
        lbc_parser::ContinuationKind::Continue => "CONTINUE",
    }
}

fn literal_as_f64(value: LiteralValue) -> Option<f64> {
    match value {
        LiteralValue::Integral(raw) => Some(sign_extend(raw, 64) as f64),
        LiteralValue::Float(f) => Some(f),
        _ => None,
    }
}

/// `Increment`/`Decrement` when the step's sign agrees with the
/// `from`→`to` order, `Skip` when a known step contradicts that order (or
/// is exactly zero), `Unknown` when not enough is constant to decide at
/// compile time.
fn infer_for_direction(
    az: &crate::analyzer::Analyzer,
    from: lbc_parser::ExprId,
    to: lbc_parser::ExprId,
    step: Option<lbc_parser::ExprId>,
) -> ForDirection {
    let from_const = az.out.expr_constants.get(&from).copied().and_then(literal_as_f64);
    let to_const = az.out.expr_constants.get(&to).copied().and_then(literal_as_f64);
    let step_const = step
        .and_then(|id| az.out.expr_constants.get(&id).copied())
        .and_then(literal_as_f64);

    let natural = match (from_const, to_const) {
        (Some(f), Some(t)) if f <= t => Some(ForDirection::Increment),
        (Some(_), Some(_)) => Some(ForDirection::Decrement),
        _ => None,
    };

    match (natural, step_const) {
        (_, Some(s)) if s == 0.0 => ForDirection::Skip,
        (Some(ForDirection::Increment), Some(s)) => {
            if s > 0.0 {
                ForDirection::Increment
            } else {
                ForDirection::Skip
            }
        }
        (Some(ForDirection::Decrement), Some(s)) => {
            if s < 0.0 {
                ForDirection::Decrement
            } else {
                ForDirection::Skip
            }
        }
        (Some(nat), None) => nat,
        (None, Some(s)) => {
            if s > 0.0 {
                ForDirection::Increment
            } else {
                ForDirection::Decrement
            }
        }
        (None, None) => ForDirection::Unknown,
        (Some(_), Some(_)) => unreachable!("Increment/Decrement covered above"),
    }
}
