//! The canonical, interned type lattice.
//!
//! Unlike a Hindley-Milner type checker, there are no type variables and no
//! unification: every type the language can express is one of a fixed,
//! closed set of shapes (sentinels, primitives, integrals, floats, pointers,
//! references, functions, UDTs), and two occurrences of the same shape are
//! always the same [`TypeId`]. [`TypeFactory`] is the single source of
//! truth — it hash-conses every [`Type`] it is asked for, so identity
//! comparison on [`TypeId`] is structural-equality comparison on [`Type`].

use lbc_parser::{Arena, Id};
use rustc_hash::FxHashMap;

use crate::symbol::SymbolId;

pub type TypeId = Id<Type>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntegralKind {
    Byte,
    UByte,
    Short,
    UShort,
    Integer,
    UInteger,
    Long,
    ULong,
}

impl IntegralKind {
    pub fn bytes(self) -> u32 {
        match self {
            IntegralKind::Byte | IntegralKind::UByte => 1,
            IntegralKind::Short | IntegralKind::UShort => 2,
            IntegralKind::Integer | IntegralKind::UInteger => 4,
            IntegralKind::Long | IntegralKind::ULong => 8,
        }
    }

    pub fn bits(self) -> u32 {
        self.bytes() * 8
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            IntegralKind::Byte | IntegralKind::Short | IntegralKind::Integer | IntegralKind::Long
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatKind {
    Single,
    Double,
}

impl FloatKind {
    pub fn bytes(self) -> u32 {
        match self {
            FloatKind::Single => 4,
            FloatKind::Double => 8,
        }
    }
}

/// A canonical, structurally-interned type. Two `Type` values that compare
/// equal are always hash-consed to the same [`TypeId`] by [`TypeFactory`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Void,
    Null,
    Any,
    Bool,
    ZString,
    Integral(IntegralKind),
    Float(FloatKind),
    /// `PTR REF` and `REF REF` are forbidden at construction time by
    /// [`TypeFactory::get_pointer`]/[`TypeFactory::get_reference`], so a
    /// `Pointer`'s base is never itself a `Reference`, and a `Reference`
    /// never wraps another `Reference`.
    Pointer(TypeId),
    Reference(TypeId),
    Function {
        params: Vec<TypeId>,
        ret: TypeId,
        variadic: bool,
    },
    /// One per defining symbol — `symbol` is the `TYPE` declaration's own
    /// symbol, whose attached scope holds the ordered member list.
    Udt { symbol: SymbolId, packed: bool },
}

impl Type {
    pub fn is_reference(&self) -> bool {
        matches!(self, Type::Reference(_))
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Pointer(_))
    }

    pub fn is_integral(&self) -> bool {
        matches!(self, Type::Integral(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Type::Float(_))
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integral() || self.is_float()
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Type::Bool)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Type::Null)
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Type::Function { .. })
    }

    pub fn is_udt(&self) -> bool {
        matches!(self, Type::Udt { .. })
    }
}

/// Owns the canonical store. Construction pre-creates singleton instances
/// for every sentinel/primitive/integral/float kind plus a cached
/// `ANY PTR`, per the type factory's construction contract.
pub struct TypeFactory {
    arena: Arena<Type>,
    interned: FxHashMap<Type, TypeId>,

    void_id: TypeId,
    null_id: TypeId,
    any_id: TypeId,
    bool_id: TypeId,
    zstring_id: TypeId,
    any_ptr_id: TypeId,
    integral_ids: FxHashMap<IntegralKind, TypeId>,
    float_ids: FxHashMap<FloatKind, TypeId>,
}

impl TypeFactory {
    pub fn new() -> Self {
        fn intern_singleton(arena: &mut Arena<Type>, interned: &mut FxHashMap<Type, TypeId>, ty: Type) -> TypeId {
            let id = arena.alloc(ty.clone());
            interned.insert(ty, id);
            id
        }

        let mut arena = Arena::new();
        let mut interned = FxHashMap::default();

        let void_id = intern_singleton(&mut arena, &mut interned, Type::Void);
        let null_id = intern_singleton(&mut arena, &mut interned, Type::Null);
        let any_id = intern_singleton(&mut arena, &mut interned, Type::Any);
        let bool_id = intern_singleton(&mut arena, &mut interned, Type::Bool);
        let zstring_id = intern_singleton(&mut arena, &mut interned, Type::ZString);

        let mut integral_ids = FxHashMap::default();
        for kind in [
            IntegralKind::Byte,
            IntegralKind::UByte,
            IntegralKind::Short,
            IntegralKind::UShort,
            IntegralKind::Integer,
            IntegralKind::UInteger,
            IntegralKind::Long,
            IntegralKind::ULong,
        ] {
            let id = intern_singleton(&mut arena, &mut interned, Type::Integral(kind));
            integral_ids.insert(kind, id);
        }

        let mut float_ids = FxHashMap::default();
        for kind in [FloatKind::Single, FloatKind::Double] {
            let id = intern_singleton(&mut arena, &mut interned, Type::Float(kind));
            float_ids.insert(kind, id);
        }

        let any_ptr_id = intern_singleton(&mut arena, &mut interned, Type::Pointer(any_id));

        TypeFactory {
            arena,
            interned,
            void_id,
            null_id,
            any_id,
            bool_id,
            zstring_id,
            any_ptr_id,
            integral_ids,
            float_ids,
        }
    }

    pub fn get(&self, id: TypeId) -> &Type {
        self.arena.get(id)
    }

    fn intern(&mut self, ty: Type) -> TypeId {
        if let Some(id) = self.interned.get(&ty) {
            return *id;
        }
        let id = self.arena.alloc(ty.clone());
        self.interned.insert(ty, id);
        id
    }

    pub fn get_void(&self) -> TypeId {
        self.void_id
    }
    pub fn get_null(&self) -> TypeId {
        self.null_id
    }
    pub fn get_any(&self) -> TypeId {
        self.any_id
    }
    pub fn get_bool(&self) -> TypeId {
        self.bool_id
    }
    pub fn get_zstring(&self) -> TypeId {
        self.zstring_id
    }
    pub fn get_any_ptr(&self) -> TypeId {
        self.any_ptr_id
    }

    pub fn get_integral(&self, kind: IntegralKind) -> TypeId {
        self.integral_ids[&kind]
    }
    pub fn get_float(&self, kind: FloatKind) -> TypeId {
        self.float_ids[&kind]
    }

    /// Default canonical type for an untyped integer literal.
    pub fn default_integer(&self) -> TypeId {
        self.get_integral(IntegralKind::Integer)
    }
    /// Default canonical type for an untyped float literal.
    pub fn default_double(&self) -> TypeId {
        self.get_float(FloatKind::Double)
    }

    /// Rejects `t` being a reference; deduplicates by pointee.
    pub fn get_pointer(&mut self, base: TypeId) -> Result<TypeId, TypeError> {
        if self.get(base).is_reference() {
            return Err(TypeError::PointerToReference);
        }
        Ok(self.intern(Type::Pointer(base)))
    }

    /// Rejects `t` being a reference; deduplicates.
    pub fn get_reference(&mut self, base: TypeId) -> Result<TypeId, TypeError> {
        if self.get(base).is_reference() {
            return Err(TypeError::ReferenceToReference);
        }
        Ok(self.intern(Type::Reference(base)))
    }

    /// Deduplicates by (ret, ordered params, variadic) via structural
    /// equality on the interned map.
    pub fn get_function(&mut self, params: Vec<TypeId>, ret: TypeId, variadic: bool) -> TypeId {
        self.intern(Type::Function { params, ret, variadic })
    }

    /// One per defining symbol.
    pub fn get_udt(&mut self, symbol: SymbolId, packed: bool) -> TypeId {
        self.intern(Type::Udt { symbol, packed })
    }

    pub fn remove_reference(&self, t: TypeId) -> TypeId {
        match self.get(t) {
            Type::Reference(base) => *base,
            _ => t,
        }
    }
}

impl Default for TypeFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeError {
    PointerToReference,
    ReferenceToReference,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_equality_dedups() {
        let mut f = TypeFactory::new();
        let int = f.get_integral(IntegralKind::Integer);
        let p1 = f.get_pointer(int).unwrap();
        let p2 = f.get_pointer(int).unwrap();
        assert_eq!(p1, p2);
    }

    #[test]
    fn reference_to_reference_rejected() {
        let mut f = TypeFactory::new();
        let int = f.get_integral(IntegralKind::Integer);
        let r = f.get_reference(int).unwrap();
        assert_eq!(f.get_reference(r), Err(TypeError::ReferenceToReference));
    }

    #[test]
    fn function_types_dedup_and_distinguish() {
        let mut f = TypeFactory::new();
        let int = f.get_integral(IntegralKind::Integer);
        let bool_ty = f.get_bool();
        let void = f.get_void();
        let a = f.get_function(vec![int, bool_ty], void, false);
        let b = f.get_function(vec![int, bool_ty], void, false);
        assert_eq!(a, b);

        let different_ret = f.get_function(vec![int, bool_ty], int, false);
        assert_ne!(a, different_ret);

        let different_order = f.get_function(vec![bool_ty, int], void, false);
        assert_ne!(a, different_order);
    }

    #[test]
    fn any_ptr_is_precached() {
        let f = TypeFactory::new();
        let any = f.get_any();
        assert_eq!(*f.get(f.get_any_ptr()), Type::Pointer(any));
    }
}
