//! Expression analysis: bidirectional typing, operator validation, and
//! implicit cast insertion.
//!
//! Grounded on `original_source/src/Sema/SemaExpr.cpp`. Two context values
//! drive every visit: `implicit_type` (top-down, what the parent expects)
//! and `suggested_type` (bottom-up, what a typed leaf observed). Both live
//! as fields on [`Analyzer`] and are save/restored around each recursive
//! descent — the classic with-scope pattern, done explicitly here since
//! there's no RAII scope guard worth inventing for two `Option<TypeId>`
//! swaps.

use lbc_common::{Category, LiteralValue, Span, TokenKind};
use lbc_parser::{AssignExpr, BinaryExpr, CallExpr, CastExpr, Expr, ExprId, IfExpr, MemberExpr, UnaryExpr};

use crate::fold;
use crate::result::{SemaError, SemaResult};
use crate::symbol::SymbolFlags;
use crate::types::{Type, TypeId};

impl<'a> crate::analyzer::Analyzer<'a> {
    /// Analyse `id` under top-down context `implicit_type`, returning the
    /// (possibly new, if an implicit cast was inserted) id the caller
    /// should store in its own field.
    pub(crate) fn expression(&mut self, id: ExprId, implicit_type: Option<TypeId>) -> SemaResult<ExprId> {
        let saved_implicit = self.implicit_type;
        self.implicit_type = implicit_type;
        let result = self.visit_expr(id);
        self.implicit_type = saved_implicit;

        let new_id = result?;
        if let Some(target) = implicit_type {
            let current = self.expr_type(new_id);
            if current != target {
                return self.coerce_to(new_id, target);
            }
        }
        Ok(new_id)
    }

    /// Like [`Self::expression`], but also hands back the bottom-up
    /// suggestion observed while visiting — used by [`Self::visit_binary`]
    /// so an unconstrained literal sibling can adopt a typed sibling's
    /// type directly, instead of going through `common()`.
    pub(crate) fn expression_suggesting(
        &mut self,
        id: ExprId,
        implicit_type: Option<TypeId>,
    ) -> SemaResult<(ExprId, Option<TypeId>)> {
        let saved_suggested = self.suggested_type;
        self.suggested_type = None;
        let new_id = self.expression(id, implicit_type)?;
        let suggestion = self.suggested_type;
        self.suggested_type = saved_suggested;
        Ok((new_id, suggestion))
    }

    fn visit_expr(&mut self, id: ExprId) -> SemaResult<ExprId> {
        let expr = self.ast.exprs.get(id).clone();
        match expr {
            Expr::Literal(lit) => self.visit_literal(id, lit.value),
            Expr::Ident(ident) => self.visit_ident(id, ident.span, ident.name),
            Expr::Call(call) => self.visit_call(id, call),
            Expr::Member(member) => self.visit_member(id, member),
            Expr::Assign(assign) => self.visit_assign(id, assign),
            Expr::Unary(unary) => self.visit_unary(id, unary),
            Expr::Binary(binary) => self.visit_binary(id, binary),
            Expr::Cast(cast) => self.visit_cast(id, cast),
            Expr::Deref(deref) => self.visit_deref(id, deref.span, deref.operand),
            Expr::AddrOf(addr) => self.visit_addr_of(id, addr.span, addr.operand),
            Expr::If(if_expr) => self.visit_if(id, if_expr),
            Expr::SizeOf(sizeof) => self.visit_sizeof(id, sizeof.type_expr),
        }
    }

    fn set_lhs_rhs(&mut self, id: ExprId, lhs: ExprId, rhs: ExprId) {
        if let Expr::Binary(b) = self.ast.exprs.get_mut(id) {
            b.lhs = lhs;
            b.rhs = rhs;
        }
    }

    // ── Leaves ────────────────────────────────────────────────────────

    /// Literal: adopts a compatible `implicit_type` directly (no cast
    /// node); otherwise a canonical default, leaving the parent to insert
    /// a cast if one is needed.
    fn visit_literal(&mut self, id: ExprId, value: LiteralValue) -> SemaResult<ExprId> {
        let ty = match (self.implicit_type, &value) {
            (Some(target), _) if self.coerce_literal_inplace(id, target) => target,
            (_, LiteralValue::Integral(_)) => self.types.default_integer(),
            (_, LiteralValue::Float(_)) => self.types.default_double(),
            (_, LiteralValue::Bool(_)) => self.types.get_bool(),
            (_, LiteralValue::Str(_)) => self.types.get_zstring(),
            (_, LiteralValue::Null) => self.types.get_null(),
        };
        self.set_expr_type(id, ty);
        fold::fold_literal(self, id, value);
        Ok(id)
    }

    fn visit_ident(&mut self, id: ExprId, span: Span, name: lbc_common::StringId) -> SemaResult<ExprId> {
        let Some(symbol_id) = self.symbols.find(self.scope, name, true) else {
            self.diag_error(span, format!("undefined identifier {}", self.name(name)));
            return Err(SemaError);
        };
        // A plain local (never forward-declared) has no decl to look up in
        // `symbol_decls`, so only chase the forward-declare path for
        // symbols that came through it; `guard_define` catches cycles.
        if !self.symbols.get(symbol_id).flags.contains(SymbolFlags::DEFINED)
            && self.symbols.get(symbol_id).flags.contains(SymbolFlags::DECLARED)
        {
            self.define_forward_declared(symbol_id)?;
        }

        let symbol = self.symbols.get(symbol_id);
        let ty = symbol.ty;
        let is_variable = symbol.flags.contains(SymbolFlags::VARIABLE) && !symbol.flags.contains(SymbolFlags::CONSTANT);

        self.set_expr_type(id, ty);
        self.set_expr_symbol(id, symbol_id);
        self.set_assignable(id, is_variable);
        self.suggest(ty);
        fold::fold_ident(self, id, symbol_id);
        Ok(id)
    }

    // ── Calls ─────────────────────────────────────────────────────────

    fn visit_call(&mut self, id: ExprId, call: CallExpr) -> SemaResult<ExprId> {
        let callee_id = self.expression(call.callee, None)?;
        let callee_ty = self.expr_type(callee_id);
        let (params, ret, variadic) = match self.types.get(callee_ty).clone() {
            Type::Function { params, ret, variadic } => (params, ret, variadic),
            _ => {
                self.diag_error(call.span, "called expression is not a function");
                return Err(SemaError);
            }
        };

        if call.args.len() < params.len() || (!variadic && call.args.len() > params.len()) {
            self.diag_error(
                call.span,
                format!("expected {} argument(s), found {}", params.len(), call.args.len()),
            );
            return Err(SemaError);
        }

        let mut new_args = Vec::with_capacity(call.args.len());
        for (i, &arg) in call.args.iter().enumerate() {
            let target = params.get(i).copied();
            new_args.push(self.expression(arg, target)?);
        }

        if callee_id != call.callee || new_args != call.args {
            if let Expr::Call(c) = self.ast.exprs.get_mut(id) {
                c.callee = callee_id;
                c.args = new_args;
            }
        }
        self.set_expr_type(id, ret);
        self.suggest(ret);
        Ok(id)
    }

    // ── Member access ────────────────────────────────────────────────

    fn visit_member(&mut self, id: ExprId, member: MemberExpr) -> SemaResult<ExprId> {
        let lhs_id = self.expression(member.lhs, None)?;
        let lhs_ty = self.expr_type(lhs_id);

        let udt_ty = match self.types.get(lhs_ty) {
            Type::Udt { .. } => lhs_ty,
            Type::Pointer(base) if self.types.get(*base).is_udt() => *base,
            _ => {
                self.diag_error(member.span, "member access on a non-struct type");
                return Err(SemaError);
            }
        };
        let udt_symbol = match self.types.get(udt_ty) {
            Type::Udt { symbol, .. } => *symbol,
            _ => unreachable!(),
        };

        let member_symbol_id = self
            .symbols
            .get(udt_symbol)
            .related
            .iter()
            .copied()
            .find(|&m| self.symbols.get(m).name == member.member);
        let Some(member_symbol_id) = member_symbol_id else {
            self.diag_error(member.member_span, format!("unknown member {}", self.name(member.member)));
            return Err(SemaError);
        };
        let member_ty = self.symbols.get(member_symbol_id).ty;

        if lhs_id != member.lhs {
            if let Expr::Member(m) = self.ast.exprs.get_mut(id) {
                m.lhs = lhs_id;
            }
        }
        self.set_expr_type(id, member_ty);
        self.set_expr_symbol(id, member_symbol_id);
        self.set_assignable(id, true);
        self.suggest(member_ty);
        Ok(id)
    }

    // ── Assignment ───────────────────────────────────────────────────

    fn visit_assign(&mut self, id: ExprId, assign: AssignExpr) -> SemaResult<ExprId> {
        let lhs_id = self.expression(assign.lhs, None)?;
        let lhs_ty = self.expr_type(lhs_id);
        if !self.is_assignable(lhs_id) {
            let span = self.ast.exprs.get(lhs_id).span();
            self.diag_error(span, "left-hand side of assignment is not assignable");
            return Err(SemaError);
        }
        let rhs_id = self.expression(assign.rhs, Some(lhs_ty))?;

        if lhs_id != assign.lhs || rhs_id != assign.rhs {
            if let Expr::Assign(a) = self.ast.exprs.get_mut(id) {
                a.lhs = lhs_id;
                a.rhs = rhs_id;
            }
        }
        self.set_expr_type(id, lhs_ty);
        Ok(id)
    }

    // ── Unary ────────────────────────────────────────────────────────

    fn visit_unary(&mut self, id: ExprId, unary: UnaryExpr) -> SemaResult<ExprId> {
        let operand_id = self.expression(unary.operand, None)?;
        let operand_ty = self.expr_type(operand_id);

        let result_ty = match unary.op {
            TokenKind::Negate => {
                let ok = match self.types.get(operand_ty) {
                    Type::Integral(k) => k.is_signed(),
                    Type::Float(_) => true,
                    _ => false,
                };
                if !ok {
                    self.diag_error(
                        unary.span,
                        format!("cannot negate a value of type {}", self.type_name(operand_ty)),
                    );
                    return Err(SemaError);
                }
                operand_ty
            }
            TokenKind::LogicalNot => {
                if operand_ty != self.types.get_bool() {
                    self.diag_error(unary.span, "NOT requires a BOOL operand");
                    return Err(SemaError);
                }
                operand_ty
            }
            other => unreachable!("{other:?} is not a unary operator"),
        };

        if operand_id != unary.operand {
            if let Expr::Unary(u) = self.ast.exprs.get_mut(id) {
                u.operand = operand_id;
            }
        }
        self.set_expr_type(id, result_ty);
        fold::fold_unary(self, id, unary.op, operand_id);
        Ok(id)
    }

    // ── Binary ───────────────────────────────────────────────────────

    fn visit_binary(&mut self, id: ExprId, binary: BinaryExpr) -> SemaResult<ExprId> {
        let (mut lhs_id, lhs_suggestion) = self.expression_suggesting(binary.lhs, None)?;
        let (mut rhs_id, rhs_suggestion) = self.expression_suggesting(binary.rhs, None)?;

        // Neither operand sees the other's suggestion as a hard
        // `implicit_type` — that would force a `coerce_to` cast and can
        // spuriously narrow (e.g. a `Byte` sibling forcing a `Double`
        // literal down to `Byte`). Instead each unconstrained literal
        // sibling just adopts the other's suggestion in place; `common()`
        // below still picks the actual result type.
        if lhs_suggestion.is_none() {
            if let Some(suggestion) = rhs_suggestion {
                self.coerce_literal_inplace(lhs_id, suggestion);
            }
        }
        if rhs_suggestion.is_none() {
            if let Some(suggestion) = lhs_suggestion {
                self.coerce_literal_inplace(rhs_id, suggestion);
            }
        }

        if binary.op == TokenKind::Is {
            return self.finish_is(id, binary.span, lhs_id, rhs_id);
        }

        let lhs_ty = self.expr_type(lhs_id);
        let rhs_ty = self.expr_type(rhs_id);

        let category = binary.op.category();
        let result_ty = match category {
            Some(Category::Logical) => {
                let bool_ty = self.types.get_bool();
                lhs_id = self.coerce_operand(lhs_id, lhs_ty, bool_ty, binary.span)?;
                rhs_id = self.coerce_operand(rhs_id, rhs_ty, bool_ty, binary.span)?;
                bool_ty
            }
            Some(Category::Comparison) => {
                let common = self.common_or_error(lhs_ty, rhs_ty, binary.span)?;
                lhs_id = self.coerce_operand(lhs_id, lhs_ty, common, binary.span)?;
                rhs_id = self.coerce_operand(rhs_id, rhs_ty, common, binary.span)?;
                self.types.get_bool()
            }
            Some(Category::Arithmetic) => {
                if binary.op == TokenKind::Modulus {
                    if !self.types.get(lhs_ty).is_integral() || !self.types.get(rhs_ty).is_integral() {
                        self.diag_error(binary.span, "MOD requires integral operands");
                        return Err(SemaError);
                    }
                }
                let is_concat = binary.op == TokenKind::Plus
                    && lhs_ty == self.types.get_zstring()
                    && rhs_ty == self.types.get_zstring();
                if is_concat {
                    lhs_ty
                } else {
                    let common = self.common_or_error(lhs_ty, rhs_ty, binary.span)?;
                    lhs_id = self.coerce_operand(lhs_id, lhs_ty, common, binary.span)?;
                    rhs_id = self.coerce_operand(rhs_id, rhs_ty, common, binary.span)?;
                    common
                }
            }
            _ => {
                self.diag_error(binary.span, format!("{} is not a valid binary operator here", binary.op.string()));
                return Err(SemaError);
            }
        };

        self.set_lhs_rhs(id, lhs_id, rhs_id);
        self.set_expr_type(id, result_ty);
        fold::fold_binary(self, id, binary.op, lhs_id, rhs_id);
        Ok(id)
    }

    fn common_or_error(&mut self, lhs_ty: TypeId, rhs_ty: TypeId, span: Span) -> SemaResult<TypeId> {
        match crate::relations::common(&self.types, lhs_ty, rhs_ty) {
            Some(t) => Ok(t),
            None => {
                self.diag_error(
                    span,
                    format!(
                        "incompatible operand types {} and {}",
                        self.type_name(lhs_ty),
                        self.type_name(rhs_ty)
                    ),
                );
                Err(SemaError)
            }
        }
    }

    /// Coerce an already-analysed operand to `target`, retyping a literal
    /// in place when possible rather than wrapping it in a cast node.
    fn coerce_operand(&mut self, id: ExprId, current: TypeId, target: TypeId, span: Span) -> SemaResult<ExprId> {
        if current == target {
            return Ok(id);
        }
        if self.coerce_literal_inplace(id, target) {
            return Ok(id);
        }
        let _ = span;
        self.coerce_to(id, target)
    }

    /// `IS` is a loose type test: both operands must be pointer-like (or
    /// `NULL`). Not part of the factory's five comparison rules — treated
    /// as its own boolean-producing relation.
    fn finish_is(&mut self, id: ExprId, span: Span, lhs_id: ExprId, rhs_id: ExprId) -> SemaResult<ExprId> {
        let lhs_ty = self.expr_type(lhs_id);
        let rhs_ty = self.expr_type(rhs_id);
        let pointer_like = |t: &Type| matches!(t, Type::Pointer(_) | Type::Null);
        if !pointer_like(self.types.get(lhs_ty)) || !pointer_like(self.types.get(rhs_ty)) {
            self.diag_error(span, "IS requires pointer operands");
            return Err(SemaError);
        }
        self.set_lhs_rhs(id, lhs_id, rhs_id);
        self.set_expr_type(id, self.types.get_bool());
        Ok(id)
    }

    // ── Explicit cast, `AS` ──────────────────────────────────────────

    fn visit_cast(&mut self, id: ExprId, cast: CastExpr) -> SemaResult<ExprId> {
        // Implicit casts are synthesized directly by `coerce_to`, which
        // already sets their type and folds them; they never reach here.
        debug_assert!(!cast.implicit, "implicit casts bypass visit_expr");
        let type_expr = cast.type_expr.expect("explicit cast always carries a type expression");
        let target = self.resolve_type_expr(type_expr)?;

        let operand_id = self.expression(cast.operand, None)?;
        let operand_ty = self.expr_type(operand_id);
        if !crate::relations::castable(&self.types, target, operand_ty) {
            self.diag_error(
                cast.span,
                format!("cannot cast {} to {}", self.type_name(operand_ty), self.type_name(target)),
            );
            return Err(SemaError);
        }

        if operand_id != cast.operand {
            if let Expr::Cast(c) = self.ast.exprs.get_mut(id) {
                c.operand = operand_id;
            }
        }
        self.set_expr_type(id, target);
        self.suggest(target);
        fold::fold_cast(self, id, target);
        Ok(id)
    }

    // ── Pointers ─────────────────────────────────────────────────────

    fn visit_deref(&mut self, id: ExprId, span: Span, operand: ExprId) -> SemaResult<ExprId> {
        let operand_id = self.expression(operand, None)?;
        let operand_ty = self.expr_type(operand_id);
        let pointee = match self.types.get(operand_ty) {
            Type::Pointer(base) => *base,
            _ => {
                self.diag_error(span, "cannot dereference a non-pointer type");
                return Err(SemaError);
            }
        };
        if operand_id != operand {
            if let Expr::Deref(d) = self.ast.exprs.get_mut(id) {
                d.operand = operand_id;
            }
        }
        self.set_expr_type(id, pointee);
        self.set_assignable(id, true);
        self.suggest(pointee);
        Ok(id)
    }

    fn visit_addr_of(&mut self, id: ExprId, span: Span, operand: ExprId) -> SemaResult<ExprId> {
        let operand_id = self.expression(operand, None)?;
        if !self.is_assignable(operand_id) {
            self.diag_error(span, "cannot take the address of a non-addressable expression");
            return Err(SemaError);
        }
        let operand_ty = self.expr_type(operand_id);
        let ptr_ty = self
            .types
            .get_pointer(operand_ty)
            .expect("operand of ADDRESSOF is never itself a reference");

        if operand_id != operand {
            if let Expr::AddrOf(a) = self.ast.exprs.get_mut(id) {
                a.operand = operand_id;
            }
        }
        self.set_expr_type(id, ptr_ty);
        self.suggest(ptr_ty);
        Ok(id)
    }

    // ── Ternary ──────────────────────────────────────────────────────

    fn visit_if(&mut self, id: ExprId, if_expr: IfExpr) -> SemaResult<ExprId> {
        let bool_ty = self.types.get_bool();
        let cond_id = self.expression(if_expr.cond, Some(bool_ty))?;

        let (mut then_id, then_sugg) = self.expression_suggesting(if_expr.then_expr, None)?;
        let (mut else_id, else_sugg) = self.expression_suggesting(if_expr.else_expr, None)?;

        // As in `visit_binary`: a sibling's suggestion is adopted softly by
        // an unconstrained literal in place, never threaded in as a hard
        // `implicit_type` that would force a narrowing `coerce_to` cast.
        if then_sugg.is_none() {
            if let Some(suggestion) = else_sugg {
                self.coerce_literal_inplace(then_id, suggestion);
            }
        }
        if else_sugg.is_none() {
            if let Some(suggestion) = then_sugg {
                self.coerce_literal_inplace(else_id, suggestion);
            }
        }

        let then_ty = self.expr_type(then_id);
        let else_ty = self.expr_type(else_id);
        let common = self.common_or_error(then_ty, else_ty, if_expr.span)?;
        then_id = self.coerce_operand(then_id, then_ty, common, if_expr.span)?;
        else_id = self.coerce_operand(else_id, else_ty, common, if_expr.span)?;

        if let Expr::If(e) = self.ast.exprs.get_mut(id) {
            e.cond = cond_id;
            e.then_expr = then_id;
            e.else_expr = else_id;
        }
        self.set_expr_type(id, common);
        fold::fold_if(self, id, cond_id, then_id, else_id);
        Ok(id)
    }

    // ── SIZEOF ───────────────────────────────────────────────────────

    fn visit_sizeof(&mut self, id: ExprId, type_expr: lbc_parser::TypeExprId) -> SemaResult<ExprId> {
        let ty = self.resolve_type_expr(type_expr)?;
        let size = self.type_byte_size(ty);
        let int_ty = self.types.default_integer();
        self.set_expr_type(id, int_ty);
        self.set_expr_constant(id, LiteralValue::Integral(size));
        Ok(id)
    }

    fn type_byte_size(&self, ty: TypeId) -> u64 {
        match self.types.get(ty) {
            Type::Void | Type::Null | Type::Any => 0,
            Type::Bool => 1,
            Type::ZString | Type::Pointer(_) | Type::Function { .. } => 8,
            Type::Integral(k) => k.bytes() as u64,
            Type::Float(k) => k.bytes() as u64,
            Type::Reference(base) => self.type_byte_size(*base),
            Type::Udt { symbol, .. } => self
                .symbols
                .get(*symbol)
                .related
                .iter()
                .map(|&m| self.type_byte_size(self.symbols.get(m).ty))
                .sum(),
        }
    }
}
