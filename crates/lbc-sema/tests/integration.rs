//! End-to-end tests driving the full lex → parse → analyse pipeline,
//! covering the semantic analyser and constant folder's observable
//! behaviour rather than their individual internal functions (those are
//! exercised by the inline `#[cfg(test)]` modules alongside the code).

use lbc_common::{DiagnosticEngine, LiteralValue, StringInterner};
use lbc_parser::{Ast, Decl, Expr, ForDirection, Module, Stmt};
use lbc_sema::{IntegralKind, SemaOutput, Symbols, Type, TypeFactory};

struct Analysed {
    ast: Ast,
    module: Module,
    diagnostics: DiagnosticEngine,
    types: TypeFactory,
    symbols: Symbols,
    out: SemaOutput,
}

fn analyze(source: &str) -> Analysed {
    let mut interner = StringInterner::new();
    let mut diagnostics = DiagnosticEngine::new();
    let (mut ast, module_result) = lbc_parser::parse(source, &mut interner, &mut diagnostics);
    let module = module_result.expect("parse should succeed");
    let analyzer = lbc_sema::analyze(&mut ast, &module, &mut interner, &mut diagnostics);
    let (types, symbols, out) = analyzer.into_parts();
    Analysed { ast, module, diagnostics, types, symbols, out }
}

fn assert_clean(a: &Analysed) {
    assert!(!a.diagnostics.has_errors(), "expected no errors, got: {:?}", a.diagnostics.diagnostics());
}

fn nth_decl(a: &Analysed, n: usize) -> lbc_parser::DeclId {
    match a.ast.stmts.get(a.module.body[n]) {
        Stmt::Decl(d) => *d,
        other => panic!("expected a decl statement at index {n}, got {other:?}"),
    }
}

// ── Literal adoption vs. widening ──────────────────────────────────────

#[test]
fn literal_adopts_declared_byte_type_without_a_cast_node() {
    let a = analyze("DIM x AS Byte = 5");
    assert_clean(&a);
    let decl_id = nth_decl(&a, 0);
    let symbol = a.out.decl_symbols[&decl_id];
    let ty = a.symbols.get(symbol).ty;
    assert_eq!(*a.types.get(ty), Type::Integral(IntegralKind::Byte));

    let init = match a.ast.decls.get(decl_id) {
        Decl::Var(v) => v.init.expect("initializer present"),
        other => panic!("expected a var decl, got {other:?}"),
    };
    // A literal that can retype in place never needs a wrapping cast node.
    assert!(matches!(a.ast.exprs.get(init), Expr::Literal(_)));
    assert_eq!(a.out.expr_types[&init], ty);
}

#[test]
fn mixed_int_and_float_init_gets_cast_to_double() {
    let a = analyze("DIM x AS Double = 1 + 2.5");
    assert_clean(&a);
    let decl_id = nth_decl(&a, 0);
    let symbol = a.out.decl_symbols[&decl_id];
    let ty = a.symbols.get(symbol).ty;
    assert_eq!(*a.types.get(ty), Type::Float(lbc_sema::FloatKind::Double));

    let sum_constant = match a.ast.decls.get(decl_id) {
        Decl::Var(v) => a.out.expr_constants[&v.init.unwrap()],
        other => panic!("expected a var decl, got {other:?}"),
    };
    assert_eq!(sum_constant, LiteralValue::Float(3.5));
}

#[test]
fn arithmetic_result_widens_to_declared_long() {
    let a = analyze("DIM n AS Long\nDIM m AS Integer = 2\nn = m + 1");
    assert_clean(&a);
    // n = m + 1: the assignment's rhs (m + 1, an Integer) must be coerced
    // up to Long, the lhs's declared type.
    let assign_stmt = match a.ast.stmts.get(a.module.body[2]) {
        Stmt::Expr(e) => e.expr,
        other => panic!("expected an expr statement, got {other:?}"),
    };
    let rhs = match a.ast.exprs.get(assign_stmt) {
        Expr::Assign(asn) => asn.rhs,
        other => panic!("expected an assignment, got {other:?}"),
    };
    let rhs_ty = a.out.expr_types[&rhs];
    assert_eq!(*a.types.get(rhs_ty), Type::Integral(IntegralKind::Long));
    assert!(matches!(a.ast.exprs.get(rhs), Expr::Cast(c) if c.implicit));
}

#[test]
fn binary_widens_to_double_instead_of_narrowing_typed_sibling() {
    // `b` is a typed `Byte` leaf, not an unconstrained literal; it must not
    // be forced down to `Byte` just because it's visited first. The pair
    // widens to `Double` via `common()`, and `b` gets an implicit cast up.
    let a = analyze("DIM b AS Byte = 1\nDIM x = b + 2.5");
    assert_clean(&a);
    let decl_id = nth_decl(&a, 1);
    let symbol = a.out.decl_symbols[&decl_id];
    let ty = a.symbols.get(symbol).ty;
    assert_eq!(*a.types.get(ty), Type::Float(lbc_sema::FloatKind::Double));
}

#[test]
fn if_expr_widens_to_double_instead_of_narrowing_typed_sibling() {
    // Same defect, ternary form: the `ELSE` arm is a float literal and the
    // `THEN` arm is a typed `Byte` leaf; both must widen to `Double`.
    let a = analyze("DIM b AS Byte = 1\nDIM c AS Bool = TRUE\nDIM x = IF c THEN b ELSE 2.5");
    assert_clean(&a);
    let decl_id = nth_decl(&a, 2);
    let symbol = a.out.decl_symbols[&decl_id];
    let ty = a.symbols.get(symbol).ty;
    assert_eq!(*a.types.get(ty), Type::Float(lbc_sema::FloatKind::Double));
}

// ── FOR direction inference ─────────────────────────────────────────────

#[test]
fn for_direction_increment_when_step_is_positive() {
    let a = analyze("FOR i = 0 TO 9 STEP 1\nNEXT");
    assert_clean(&a);
    match a.ast.stmts.get(a.module.body[0]) {
        Stmt::For(f) => assert_eq!(f.direction, ForDirection::Increment),
        other => panic!("expected a for statement, got {other:?}"),
    }
}

#[test]
fn for_direction_decrement_when_step_is_negative_and_range_descends() {
    let a = analyze("FOR i = 9 TO 0 STEP -1\nNEXT");
    assert_clean(&a);
    match a.ast.stmts.get(a.module.body[0]) {
        Stmt::For(f) => {
            assert_eq!(f.direction, ForDirection::Decrement);
            // The stored step is materialised to its absolute value.
            assert_eq!(a.out.expr_constants[&f.step.unwrap()], LiteralValue::Integral(1));
        }
        other => panic!("expected a for statement, got {other:?}"),
    }
}

#[test]
fn for_direction_skip_when_negative_step_contradicts_ascending_range() {
    let a = analyze("FOR i = 1 TO 10 STEP -1\nNEXT");
    assert_clean(&a);
    match a.ast.stmts.get(a.module.body[0]) {
        Stmt::For(f) => assert_eq!(f.direction, ForDirection::Skip),
        other => panic!("expected a for statement, got {other:?}"),
    }
}

#[test]
fn for_direction_unknown_when_bounds_are_not_constant() {
    let a = analyze("DIM lo AS Integer\nDIM hi AS Integer\nFOR i = lo TO hi\nNEXT");
    assert_clean(&a);
    match a.ast.stmts.get(a.module.body[2]) {
        Stmt::For(f) => assert_eq!(f.direction, ForDirection::Unknown),
        other => panic!("expected a for statement, got {other:?}"),
    }
}

// ── Control-flow continuations ──────────────────────────────────────────

#[test]
fn exit_for_outside_any_for_is_diagnosed() {
    let a = analyze("EXIT FOR");
    assert!(a.diagnostics.has_errors());
}

#[test]
fn exit_for_inside_a_for_loop_is_accepted() {
    let a = analyze("FOR i = 0 TO 9\nEXIT FOR\nNEXT");
    assert_clean(&a);
}

// ── UDT member access ───────────────────────────────────────────────────

#[test]
fn udt_member_access_resolves_to_the_members_type() {
    let a = analyze(
        "TYPE Point\n\
         x AS Integer\n\
         y AS Integer\n\
         END TYPE\n\
         DIM p AS Point\n\
         p.x = 5",
    );
    assert_clean(&a);
    let assign = match a.ast.stmts.get(a.module.body[2]) {
        Stmt::Expr(e) => e.expr,
        other => panic!("expected an expr statement, got {other:?}"),
    };
    let lhs = match a.ast.exprs.get(assign) {
        Expr::Assign(asn) => asn.lhs,
        other => panic!("expected an assignment, got {other:?}"),
    };
    let lhs_ty = a.out.expr_types[&lhs];
    assert_eq!(*a.types.get(lhs_ty), Type::Integral(IntegralKind::Integer));
}

#[test]
fn unknown_udt_member_is_diagnosed() {
    let a = analyze(
        "TYPE Point\n\
         x AS Integer\n\
         END TYPE\n\
         DIM p AS Point\n\
         p.z = 5",
    );
    assert!(a.diagnostics.has_errors());
}

// ── Pointers and NULL ────────────────────────────────────────────────────

#[test]
fn null_compared_against_a_pointer_adopts_the_pointer_type_and_yields_bool() {
    let a = analyze("DIM p AS Integer PTR\nIF p = NULL THEN RETURN");
    assert_clean(&a);
    let guard = match a.ast.stmts.get(a.module.body[1]) {
        Stmt::If(s) => s.blocks[0].guard.expect("guard present"),
        other => panic!("expected an if statement, got {other:?}"),
    };
    let cmp_ty = a.out.expr_types[&guard];
    assert_eq!(*a.types.get(cmp_ty), Type::Bool);
}

// ── Function calls: argument matching and return widening ──────────────

#[test]
fn call_argument_matches_declared_param_type_exactly() {
    let a = analyze(
        "DECLARE SUB Add(a AS Integer, b AS Integer)\n\
         Add(1, 2)",
    );
    assert_clean(&a);
}

#[test]
fn call_with_wrong_argument_count_is_diagnosed() {
    let a = analyze(
        "DECLARE SUB Add(a AS Integer, b AS Integer)\n\
         Add(1)",
    );
    assert!(a.diagnostics.has_errors());
}

#[test]
fn function_return_value_widens_to_the_declared_long_return_type() {
    let a = analyze(
        "DECLARE FUNCTION GetLong() AS Long\n\
         DIM n AS Long = GetLong()",
    );
    assert_clean(&a);
    let decl_id = nth_decl(&a, 1);
    let init = match a.ast.decls.get(decl_id) {
        Decl::Var(v) => v.init.expect("initializer present"),
        other => panic!("expected a var decl, got {other:?}"),
    };
    let ty = a.out.expr_types[&init];
    assert_eq!(*a.types.get(ty), Type::Integral(IntegralKind::Long));
}

// ── Prototype/implementation merging ────────────────────────────────────

#[test]
fn declare_sub_then_sub_share_one_symbol_and_the_body_is_analysed() {
    let a = analyze(
        "DECLARE SUB Foo()\n\
         SUB Foo()\n\
         DIM x AS Integer = 1\n\
         END SUB",
    );
    assert_clean(&a);
    let proto_decl = nth_decl(&a, 0);
    let impl_decl = nth_decl(&a, 1);
    assert_eq!(a.out.decl_symbols[&proto_decl], a.out.decl_symbols[&impl_decl]);
}

#[test]
fn a_third_definition_of_the_same_function_is_a_redefinition() {
    let a = analyze(
        "DECLARE SUB Foo()\n\
         SUB Foo()\n\
         END SUB\n\
         SUB Foo()\n\
         END SUB",
    );
    assert!(a.diagnostics.has_errors());
}

#[test]
fn two_bare_prototypes_without_impl_do_not_error() {
    let a = analyze("DECLARE SUB Foo()\nDECLARE SUB Foo()");
    assert_clean(&a);
}

// ── Circular type dependency ─────────────────────────────────────────────

#[test]
fn circular_udt_member_dependency_is_diagnosed() {
    // `A` embeds `B` by value and `B` embeds `A` by value: neither can
    // finish sizing without the other already being defined, which
    // `guard_define`'s `BEING_DEFINED` flag catches as a circular
    // definition rather than recursing forever.
    let a = analyze(
        "TYPE A\n\
         b AS B\n\
         END TYPE\n\
         TYPE B\n\
         a AS A\n\
         END TYPE\n\
         DIM x AS A",
    );
    assert!(a.diagnostics.has_errors());
}

#[test]
fn udt_referencing_another_udt_by_pointer_is_not_circular() {
    let a = analyze(
        "TYPE Node\n\
         next AS Node PTR\n\
         value AS Integer\n\
         END TYPE\n\
         DIM n AS Node",
    );
    assert_clean(&a);
}

// ── Constant folding ─────────────────────────────────────────────────────

fn folded_value_of_only_expr_stmt(a: &Analysed) -> LiteralValue {
    let expr = match a.ast.stmts.get(a.module.body[0]) {
        Stmt::Expr(e) => e.expr,
        other => panic!("expected an expr statement, got {other:?}"),
    };
    a.out.expr_constants[&expr]
}

#[test]
fn constant_folds_arithmetic_respecting_precedence() {
    let a = analyze("1 + 2 * 3");
    assert_clean(&a);
    assert_eq!(folded_value_of_only_expr_stmt(&a), LiteralValue::Integral(7));
}

#[test]
fn constant_folds_logical_not() {
    let a = analyze("NOT TRUE");
    assert_clean(&a);
    assert_eq!(folded_value_of_only_expr_stmt(&a), LiteralValue::Bool(false));
}

#[test]
fn constant_folds_double_negation() {
    let a = analyze("-(-5)");
    assert_clean(&a);
    assert_eq!(folded_value_of_only_expr_stmt(&a), LiteralValue::Integral(5));
}

#[test]
fn constant_folds_string_concatenation() {
    let a = analyze("\"a\" + \"b\"");
    assert_clean(&a);
    let value = folded_value_of_only_expr_stmt(&a);
    match value {
        LiteralValue::Str(_) => {}
        other => panic!("expected a folded string, got {other:?}"),
    }
}

#[test]
fn constant_folds_ternary_taking_the_constant_branch() {
    let a = analyze("IF TRUE THEN 1 ELSE 2");
    assert_clean(&a);
    assert_eq!(folded_value_of_only_expr_stmt(&a), LiteralValue::Integral(1));
}

#[test]
fn constant_fold_does_not_cross_a_non_constant_operand() {
    let a = analyze("DIM x AS Integer\nx + 1");
    assert_clean(&a);
    let expr = match a.ast.stmts.get(a.module.body[1]) {
        Stmt::Expr(e) => e.expr,
        other => panic!("expected an expr statement, got {other:?}"),
    };
    assert!(!a.out.expr_constants.contains_key(&expr));
}

// ── CONST declarations carry their folded value onto the symbol ────────

#[test]
fn const_decl_records_its_folded_value_on_the_symbol() {
    let a = analyze("CONST Limit AS Integer = 10 * 2");
    assert_clean(&a);
    let decl_id = nth_decl(&a, 0);
    let symbol_id = a.out.decl_symbols[&decl_id];
    assert_eq!(a.symbols.get(symbol_id).value, Some(LiteralValue::Integral(20)));
}

#[test]
fn const_without_initializer_is_diagnosed() {
    let a = analyze("CONST Limit AS Integer");
    assert!(a.diagnostics.has_errors());
}

// ── Undefined identifiers ────────────────────────────────────────────────

#[test]
fn undefined_identifier_is_diagnosed() {
    let a = analyze("x = 5");
    assert!(a.diagnostics.has_errors());
}

#[test]
fn mutually_forward_referencing_functions_both_resolve() {
    // `IsEven` calls `IsOdd` before `IsOdd` is defined in source order;
    // the forward-declare pass makes this resolve regardless.
    let a = analyze(
        "DECLARE FUNCTION IsOdd(n AS Integer) AS Bool\n\
         FUNCTION IsEven(n AS Integer) AS Bool\n\
         RETURN NOT IsOdd(n)\n\
         END FUNCTION\n\
         FUNCTION IsOdd(n AS Integer) AS Bool\n\
         RETURN n = 1\n\
         END FUNCTION",
    );
    assert_clean(&a);
}
