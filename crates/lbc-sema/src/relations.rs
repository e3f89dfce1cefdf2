//! Type comparison, common-type, and castability relations, per the five
//! numbered rules the type factory's relation table describes: pointer
//! equality, integral widening, float widening, pointer convertibility
//! (including `ANY PTR` and `Null`), and reference stripping.

use crate::types::{Type, TypeFactory, TypeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    Unchanged,
    Added,
    Removed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareResult {
    Incompatible,
    Convertible,
    Identical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comparison {
    pub result: CompareResult,
    pub sign: Flag,
    pub reference: Flag,
    pub size: Flag,
    pub precision: Flag,
}

impl Comparison {
    fn identical() -> Self {
        Comparison {
            result: CompareResult::Identical,
            sign: Flag::Unchanged,
            reference: Flag::Unchanged,
            size: Flag::Unchanged,
            precision: Flag::Unchanged,
        }
    }

    fn incompatible() -> Self {
        Comparison {
            result: CompareResult::Incompatible,
            sign: Flag::Unchanged,
            reference: Flag::Unchanged,
            size: Flag::Unchanged,
            precision: Flag::Unchanged,
        }
    }

    pub fn is_convertible(&self) -> bool {
        matches!(self.result, CompareResult::Convertible | CompareResult::Identical)
    }
}

/// `compare(target, from)`: can a value of type `from` be used where
/// `target` is expected? A leading reference on `from` is stripped first
/// (rule 5 is then reapplied around the stripped comparison).
pub fn compare(factory: &TypeFactory, target: TypeId, from: TypeId) -> Comparison {
    if target == from {
        return Comparison::identical();
    }

    if let Type::Reference(inner) = factory.get(from) {
        let mut inner_cmp = compare(factory, target, *inner);
        if inner_cmp.result != CompareResult::Incompatible {
            inner_cmp.result = CompareResult::Convertible;
            inner_cmp.reference = Flag::Added;
        }
        return inner_cmp;
    }

    match (factory.get(target), factory.get(from)) {
        (Type::Integral(t), Type::Integral(f)) => {
            if t.bytes() > f.bytes() && (t.is_signed() || !f.is_signed()) {
                Comparison {
                    result: CompareResult::Convertible,
                    sign: if t.is_signed() && !f.is_signed() {
                        Flag::Added
                    } else {
                        Flag::Unchanged
                    },
                    reference: Flag::Unchanged,
                    size: Flag::Added,
                    precision: Flag::Unchanged,
                }
            } else {
                Comparison::incompatible()
            }
        }
        (Type::Float(t), Type::Float(f)) => {
            if t.bytes() > f.bytes() {
                Comparison {
                    result: CompareResult::Convertible,
                    sign: Flag::Unchanged,
                    reference: Flag::Unchanged,
                    size: Flag::Added,
                    precision: Flag::Unchanged,
                }
            } else {
                Comparison::incompatible()
            }
        }
        // Not in the factory's literal five-rule table, but required for
        // numeric promotion (e.g. `1 + 2.5` must settle on `Double`):
        // widening an integral into a float is a natural promotion, never
        // the other way around.
        (Type::Float(_), Type::Integral(_)) => Comparison {
            result: CompareResult::Convertible,
            sign: Flag::Unchanged,
            reference: Flag::Unchanged,
            size: Flag::Unchanged,
            precision: Flag::Added,
        },
        (Type::Pointer(t), Type::Pointer(_)) => {
            if target == from {
                Comparison::identical()
            } else if *t == factory.get_any() {
                Comparison {
                    result: CompareResult::Convertible,
                    sign: Flag::Unchanged,
                    reference: Flag::Unchanged,
                    size: Flag::Unchanged,
                    precision: Flag::Unchanged,
                }
            } else {
                Comparison::incompatible()
            }
        }
        (Type::Pointer(_), Type::Null) => Comparison {
            result: CompareResult::Convertible,
            sign: Flag::Unchanged,
            reference: Flag::Unchanged,
            size: Flag::Unchanged,
            precision: Flag::Unchanged,
        },
        _ => Comparison::incompatible(),
    }
}

/// The "wider" type both `a` and `b` can convert to, or `None` if
/// incompatible. Used to pick a binary expression's result type.
pub fn common(factory: &TypeFactory, a: TypeId, b: TypeId) -> Option<TypeId> {
    if a == b {
        return Some(a);
    }
    let a_to_b = compare(factory, b, a);
    if a_to_b.is_convertible() {
        return Some(b);
    }
    let b_to_a = compare(factory, a, b);
    if b_to_a.is_convertible() {
        return Some(a);
    }
    None
}

/// Laxer than `compare`: any numeric↔numeric, any pointer↔pointer, and
/// identity are castable. Used by `AS`.
pub fn castable(factory: &TypeFactory, target: TypeId, source: TypeId) -> bool {
    if target == source {
        return true;
    }
    let target_ty = factory.get(target);
    let source_ty = factory.get(source);
    match (target_ty, source_ty) {
        (a, b) if a.is_numeric() && b.is_numeric() => true,
        (Type::Pointer(_), Type::Pointer(_)) => true,
        (Type::Pointer(_), Type::Null) | (Type::Null, Type::Pointer(_)) => true,
        _ => false,
    }
}

pub fn remove_reference(factory: &TypeFactory, t: TypeId) -> TypeId {
    factory.remove_reference(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FloatKind, IntegralKind};

    #[test]
    fn long_from_integer_is_convertible_with_size_added() {
        let f = TypeFactory::new();
        let long = f.get_integral(IntegralKind::Long);
        let integer = f.get_integral(IntegralKind::Integer);
        let cmp = compare(&f, long, integer);
        assert_eq!(cmp.result, CompareResult::Convertible);
        assert_eq!(cmp.size, Flag::Added);
        assert_eq!(cmp.sign, Flag::Unchanged);
    }

    #[test]
    fn integer_from_ulong_is_incompatible() {
        let f = TypeFactory::new();
        let integer = f.get_integral(IntegralKind::Integer);
        let ulong = f.get_integral(IntegralKind::ULong);
        assert_eq!(compare(&f, integer, ulong).result, CompareResult::Incompatible);
    }

    #[test]
    fn any_ptr_accepts_any_pointer() {
        let mut f = TypeFactory::new();
        let integer = f.get_integral(IntegralKind::Integer);
        let int_ptr = f.get_pointer(integer).unwrap();
        let any_ptr = f.get_any_ptr();
        assert_eq!(compare(&f, any_ptr, int_ptr).result, CompareResult::Convertible);
    }

    #[test]
    fn pointer_from_null_is_convertible() {
        let mut f = TypeFactory::new();
        let integer = f.get_integral(IntegralKind::Integer);
        let int_ptr = f.get_pointer(integer).unwrap();
        let null = f.get_null();
        assert_eq!(compare(&f, int_ptr, null).result, CompareResult::Convertible);
    }

    #[test]
    fn bool_from_integer_is_incompatible() {
        let f = TypeFactory::new();
        let bool_ty = f.get_bool();
        let integer = f.get_integral(IntegralKind::Integer);
        assert_eq!(compare(&f, bool_ty, integer).result, CompareResult::Incompatible);
    }

    #[test]
    fn common_widens_to_long_and_rejects_bool() {
        let f = TypeFactory::new();
        let int = f.get_integral(IntegralKind::Integer);
        let long = f.get_integral(IntegralKind::Long);
        let bool_ty = f.get_bool();
        assert_eq!(common(&f, int, long), Some(long));
        assert_eq!(common(&f, int, bool_ty), None);
    }

    #[test]
    fn double_from_single_is_convertible() {
        let f = TypeFactory::new();
        let single = f.get_float(FloatKind::Single);
        let double = f.get_float(FloatKind::Double);
        assert_eq!(compare(&f, double, single).result, CompareResult::Convertible);
    }

    #[test]
    fn double_from_integer_is_convertible_with_precision_added() {
        let f = TypeFactory::new();
        let integer = f.get_integral(IntegralKind::Integer);
        let double = f.get_float(FloatKind::Double);
        let cmp = compare(&f, double, integer);
        assert_eq!(cmp.result, CompareResult::Convertible);
        assert_eq!(cmp.precision, Flag::Added);
        assert_eq!(common(&f, integer, double), Some(double));
    }

    #[test]
    fn integer_from_double_is_incompatible() {
        let f = TypeFactory::new();
        let integer = f.get_integral(IntegralKind::Integer);
        let double = f.get_float(FloatKind::Double);
        assert_eq!(compare(&f, integer, double).result, CompareResult::Incompatible);
    }
}
