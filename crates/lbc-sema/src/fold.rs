//! Pure compile-time expression evaluation over the literal type lattice.
//!
//! Folding runs *after* sema has typed a node (it needs the canonical type
//! to pick the right numeric variant), never touches non-constant
//! sub-expressions, and only ever sets the `constantValue` annotation — it
//! never changes the tree shape. Called directly by the `expr`/`analyzer`
//! modules right after each node's type is recorded, mirroring the
//! original's "sema calls the folder on each expression it has just typed"
//! ordering.

use lbc_common::{literal::{sign_extend, wrap_to_bits}, LiteralValue, TokenKind};

use crate::analyzer::Analyzer;
use crate::types::{FloatKind, Type, TypeId};
use lbc_parser::{Expr, ExprId};

fn integral_bits(az: &Analyzer, ty: TypeId) -> Option<u32> {
    match az.types.get(ty) {
        Type::Integral(k) => Some(k.bits()),
        _ => None,
    }
}

fn is_float_ty(az: &Analyzer, ty: TypeId) -> bool {
    matches!(az.types.get(ty), Type::Float(_))
}

pub(crate) fn fold_literal(az: &mut Analyzer, id: ExprId, value: LiteralValue) {
    az.set_expr_constant(id, value);
}

/// Identifiers only fold when the symbol they resolved to already carries
/// a constant value (a `CONST` declaration's initializer folded earlier).
pub(crate) fn fold_ident(az: &mut Analyzer, id: ExprId, symbol_id: crate::symbol::SymbolId) {
    if let Some(value) = az.symbols.get(symbol_id).value {
        az.set_expr_constant(id, value);
    }
}

pub(crate) fn fold_unary(az: &mut Analyzer, id: ExprId, op: TokenKind, operand: ExprId) {
    let Some(value) = az.out.expr_constants.get(&operand).copied() else {
        return;
    };
    let ty = az.expr_type(id);
    let folded = match (op, value) {
        (TokenKind::Negate, LiteralValue::Integral(raw)) => {
            let bits = integral_bits(az, ty).unwrap_or(64);
            let signed = sign_extend(raw, bits);
            Some(LiteralValue::Integral(wrap_to_bits(signed.wrapping_neg(), bits)))
        }
        (TokenKind::Negate, LiteralValue::Float(f)) => Some(LiteralValue::Float(-f)),
        (TokenKind::LogicalNot, LiteralValue::Bool(b)) => Some(LiteralValue::Bool(!b)),
        _ => None,
    };
    if let Some(folded) = folded {
        az.set_expr_constant(id, folded);
    }
}

pub(crate) fn fold_binary(az: &mut Analyzer, id: ExprId, op: TokenKind, lhs: ExprId, rhs: ExprId) {
    let Some(l) = az.out.expr_constants.get(&lhs).copied() else {
        return;
    };
    let Some(r) = az.out.expr_constants.get(&rhs).copied() else {
        return;
    };
    let ty = az.expr_type(id);

    let folded = match (op, l, r) {
        (TokenKind::LogicalAnd, LiteralValue::Bool(a), LiteralValue::Bool(b)) => Some(LiteralValue::Bool(a && b)),
        (TokenKind::LogicalOr, LiteralValue::Bool(a), LiteralValue::Bool(b)) => Some(LiteralValue::Bool(a || b)),

        (TokenKind::Plus, LiteralValue::Str(a), LiteralValue::Str(b)) => {
            let mut s = az.interner.resolve(a).to_string();
            s.push_str(az.interner.resolve(b));
            Some(LiteralValue::Str(az.interner.intern(&s)))
        }

        (_, LiteralValue::Float(a), LiteralValue::Float(b)) => fold_float_binary(op, a, b),
        (_, LiteralValue::Float(a), LiteralValue::Integral(b)) => fold_float_binary(op, a, b as f64),
        (_, LiteralValue::Integral(a), LiteralValue::Float(b)) => fold_float_binary(op, a as f64, b),

        (_, LiteralValue::Integral(a), LiteralValue::Integral(b)) => {
            let bits = integral_bits(az, ty).unwrap_or(32);
            let signed_bits = if matches!(op, TokenKind::Equal | TokenKind::NotEqual | TokenKind::LessThan
                | TokenKind::LessOrEqual | TokenKind::GreaterThan | TokenKind::GreaterOrEqual)
            {
                64
            } else {
                bits
            };
            fold_integral_binary(op, a, b, bits, signed_bits)
        }

        (TokenKind::Equal, LiteralValue::Null, LiteralValue::Null) => Some(LiteralValue::Bool(true)),
        (TokenKind::NotEqual, LiteralValue::Null, LiteralValue::Null) => Some(LiteralValue::Bool(false)),

        _ => None,
    };

    if let Some(folded) = folded {
        az.set_expr_constant(id, folded);
    }
}

fn fold_float_binary(op: TokenKind, a: f64, b: f64) -> Option<LiteralValue> {
    Some(match op {
        TokenKind::Plus => LiteralValue::Float(a + b),
        TokenKind::Minus => LiteralValue::Float(a - b),
        TokenKind::Multiply => LiteralValue::Float(a * b),
        TokenKind::Divide => {
            if b == 0.0 {
                return None;
            }
            LiteralValue::Float(a / b)
        }
        TokenKind::Equal => LiteralValue::Bool(a == b),
        TokenKind::NotEqual => LiteralValue::Bool(a != b),
        TokenKind::LessThan => LiteralValue::Bool(a < b),
        TokenKind::LessOrEqual => LiteralValue::Bool(a <= b),
        TokenKind::GreaterThan => LiteralValue::Bool(a > b),
        TokenKind::GreaterOrEqual => LiteralValue::Bool(a >= b),
        _ => return None,
    })
}

/// `bits` governs arithmetic wrapping (the result's own width); `signed_bits`
/// governs how the two 64-bit-canonical operands are sign-extended before
/// the operation — comparisons always compare as full 64-bit signed values
/// (operands have already been widened to a common type by sema), while
/// arithmetic wraps to the result type's width.
fn fold_integral_binary(op: TokenKind, a: u64, b: u64, bits: u32, signed_bits: u32) -> Option<LiteralValue> {
    let sa = sign_extend(a, signed_bits);
    let sb = sign_extend(b, signed_bits);
    Some(match op {
        TokenKind::Plus => LiteralValue::Integral(wrap_to_bits(sa.wrapping_add(sb), bits)),
        TokenKind::Minus => LiteralValue::Integral(wrap_to_bits(sa.wrapping_sub(sb), bits)),
        TokenKind::Multiply => LiteralValue::Integral(wrap_to_bits(sa.wrapping_mul(sb), bits)),
        TokenKind::Divide => {
            if sb == 0 {
                return None;
            }
            LiteralValue::Integral(wrap_to_bits(sa.wrapping_div(sb), bits))
        }
        TokenKind::Modulus => {
            if sb == 0 {
                return None;
            }
            LiteralValue::Integral(wrap_to_bits(sa.wrapping_rem(sb), bits))
        }
        TokenKind::Equal => LiteralValue::Bool(sa == sb),
        TokenKind::NotEqual => LiteralValue::Bool(sa != sb),
        TokenKind::LessThan => LiteralValue::Bool(sa < sb),
        TokenKind::LessOrEqual => LiteralValue::Bool(sa <= sb),
        TokenKind::GreaterThan => LiteralValue::Bool(sa > sb),
        TokenKind::GreaterOrEqual => LiteralValue::Bool(sa >= sb),
        _ => return None,
    })
}

/// Explicit/implicit cast conversions over the static type grid. Strings
/// are never foldable via cast.
pub(crate) fn fold_cast(az: &mut Analyzer, id: ExprId, target: TypeId) {
    let operand = match az.ast.exprs.get(id) {
        Expr::Cast(c) => c.operand,
        _ => return,
    };
    let Some(value) = az.out.expr_constants.get(&operand).copied() else {
        return;
    };

    let folded = match (az.types.get(target).clone(), value) {
        (Type::Integral(k), LiteralValue::Integral(raw)) => {
            Some(LiteralValue::Integral(wrap_to_bits(sign_extend(raw, 64), k.bits())))
        }
        (Type::Integral(k), LiteralValue::Float(f)) => {
            Some(LiteralValue::Integral(wrap_to_bits(f as i64, k.bits())))
        }
        (Type::Integral(k), LiteralValue::Bool(b)) => {
            Some(LiteralValue::Integral(wrap_to_bits(b as i64, k.bits())))
        }
        (Type::Float(_), LiteralValue::Integral(raw)) => Some(LiteralValue::Float(sign_extend(raw, 64) as f64)),
        (Type::Float(FloatKind::Single), LiteralValue::Float(f)) => Some(LiteralValue::Float(f as f32 as f64)),
        (Type::Float(FloatKind::Double), LiteralValue::Float(f)) => Some(LiteralValue::Float(f)),
        (Type::Bool, LiteralValue::Integral(raw)) => Some(LiteralValue::Bool(raw != 0)),
        (Type::Bool, LiteralValue::Bool(b)) => Some(LiteralValue::Bool(b)),
        _ => None,
    };

    if let Some(folded) = folded {
        az.set_expr_constant(id, folded);
    }
}

/// `IF cond THEN a ELSE b` folds to whichever branch's value the constant
/// condition selects, provided that branch itself folded.
pub(crate) fn fold_if(az: &mut Analyzer, id: ExprId, cond: ExprId, then_expr: ExprId, else_expr: ExprId) {
    let Some(LiteralValue::Bool(cond_value)) = az.out.expr_constants.get(&cond).copied() else {
        return;
    };
    let taken = if cond_value { then_expr } else { else_expr };
    if let Some(value) = az.out.expr_constants.get(&taken).copied() {
        az.set_expr_constant(id, value);
    }
}
