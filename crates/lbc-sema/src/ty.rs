//! Resolves a parsed [`TypeExpr`] to a canonical [`TypeId`].
//!
//! Grounded on `original_source/src/Sema/SemaType.cpp`: a builtin type
//! keyword maps straight to the factory's singleton, a named type resolves
//! against the symbol table (triggering `define` if the symbol was only
//! forward-declared), and `PTR`/`REF` suffixes wrap the base in declaration
//! order, with the factory itself rejecting `PTR REF` and `REF REF`.

use lbc_parser::{TypeExpr, TypeExprId, TypeExprKind};
use lbc_common::TokenKind;

use crate::analyzer::Analyzer;
use crate::result::SemaResult;
use crate::symbol::SymbolFlags;
use crate::types::{FloatKind, IntegralKind, Type, TypeId};

impl<'a> Analyzer<'a> {
    pub fn resolve_type_expr(&mut self, id: TypeExprId) -> SemaResult<TypeId> {
        if let Some(ty) = self.out.type_expr_types.get(&id) {
            return Ok(*ty);
        }
        let ty = self.resolve_type_expr_uncached(id)?;
        self.out.type_expr_types.insert(id, ty);
        Ok(ty)
    }

    fn resolve_type_expr_uncached(&mut self, id: TypeExprId) -> SemaResult<TypeId> {
        let type_expr: TypeExpr = self.ast.type_exprs.get(id).clone();
        // A named type embedded by value needs its full member layout (so
        // it must be `define`d now); one referenced only behind a trailing
        // `PTR`/`REF` just needs its already-cached symbol type, since a
        // pointer's size never depends on what it points to. Forcing a
        // define in the latter case would recurse into the very symbol
        // still being defined for a direct self-reference like
        // `TYPE Node \n next AS Node PTR \n END TYPE`.
        let by_value = type_expr.ptr_depth == 0 && !type_expr.is_ref;
        let mut base = match &type_expr.kind {
            TypeExprKind::Builtin(token) => self.builtin_type(*token),
            TypeExprKind::Named(name) => self.resolve_named_type(*name, type_expr.span, by_value)?,
            TypeExprKind::TypeOf(_) => {
                self.diag_error(type_expr.span, "TYPEOF is not supported");
                return Err(crate::result::SemaError);
            }
            TypeExprKind::Function(params, ret, variadic) => {
                let params = params
                    .iter()
                    .map(|p| self.resolve_type_expr(*p))
                    .collect::<SemaResult<Vec<_>>>()?;
                let ret = match ret {
                    Some(r) => self.resolve_type_expr(*r)?,
                    None => self.types.get_void(),
                };
                self.types.get_function(params, ret, *variadic)
            }
        };

        for _ in 0..type_expr.ptr_depth {
            base = self.types.get_pointer(base).map_err(|_| {
                self.diag_error(type_expr.span, "cannot form a pointer to a reference type");
                crate::result::SemaError
            })?;
        }

        if type_expr.is_ref {
            base = self.types.get_reference(base).map_err(|_| {
                self.diag_error(type_expr.span, "cannot form a reference to a reference type");
                crate::result::SemaError
            })?;
        }

        Ok(base)
    }

    fn builtin_type(&self, token: TokenKind) -> TypeId {
        match token {
            TokenKind::Bool => self.types.get_bool(),
            TokenKind::ZString => self.types.get_zstring(),
            TokenKind::Any => self.types.get_any(),
            TokenKind::Byte => self.types.get_integral(IntegralKind::Byte),
            TokenKind::UByte => self.types.get_integral(IntegralKind::UByte),
            TokenKind::Short => self.types.get_integral(IntegralKind::Short),
            TokenKind::UShort => self.types.get_integral(IntegralKind::UShort),
            TokenKind::Integer => self.types.get_integral(IntegralKind::Integer),
            TokenKind::UInteger => self.types.get_integral(IntegralKind::UInteger),
            TokenKind::Long => self.types.get_integral(IntegralKind::Long),
            TokenKind::ULong => self.types.get_integral(IntegralKind::ULong),
            TokenKind::Single => self.types.get_float(FloatKind::Single),
            TokenKind::Double => self.types.get_float(FloatKind::Double),
            other => unreachable!("{other:?} is not a builtin type keyword"),
        }
    }

    fn resolve_named_type(&mut self, name: lbc_common::StringId, span: lbc_common::Span, by_value: bool) -> SemaResult<TypeId> {
        let Some(symbol_id) = self.symbols.find(self.scope, name, true) else {
            self.diag_error(span, format!("undefined type {}", self.name(name)));
            return Err(crate::result::SemaError);
        };
        let symbol = self.symbols.get(symbol_id);
        if by_value && !symbol.flags.contains(SymbolFlags::DEFINED) {
            self.define_forward_declared(symbol_id)?;
        }
        Ok(self.symbols.get(symbol_id).ty)
    }
}

/// A human-readable rendering for diagnostics — not interned, used only at
/// error-reporting time.
pub fn describe(types: &crate::types::TypeFactory, id: TypeId) -> String {
    match types.get(id) {
        Type::Void => "VOID".to_string(),
        Type::Null => "NULL".to_string(),
        Type::Any => "ANY".to_string(),
        Type::Bool => "BOOL".to_string(),
        Type::ZString => "ZSTRING".to_string(),
        Type::Integral(k) => format!("{k:?}").to_uppercase(),
        Type::Float(k) => format!("{k:?}").to_uppercase(),
        Type::Pointer(base) => format!("{} PTR", describe(types, *base)),
        Type::Reference(base) => format!("{} REF", describe(types, *base)),
        Type::Function { params, ret, variadic } => {
            let params: Vec<_> = params.iter().map(|p| describe(types, *p)).collect();
            format!(
                "FUNCTION({}{}) AS {}",
                params.join(", "),
                if *variadic { ", ..." } else { "" },
                describe(types, *ret)
            )
        }
        Type::Udt { .. } => "TYPE".to_string(),
    }
}
