//! Recursive-descent parser and arena-indexed AST for LightBASIC.
//!
//! [`parse`] drives the lexer to completion and returns the populated
//! [`Ast`] alongside a `Result<Module, ParseError>` — on the first
//! unexpected token, parsing stops and the diagnostic engine already holds
//! the reason why. Callers that only care whether the unit compiles can
//! check `diagnostics.has_errors()`; callers doing `-ast-dump`/`-code-dump`
//! use whatever statements made it into the `Ast` before the abort.

pub mod arena;
pub mod ast;
mod parser;

pub use arena::{Arena, Id};
pub use ast::*;
pub use parser::{parse, ParseError, PResult};

#[cfg(test)]
mod tests {
    use super::*;
    use lbc_common::{DiagnosticEngine, StringInterner, TokenKind};

    fn parse_ok(source: &str) -> (Ast, Module) {
        let mut interner = StringInterner::new();
        let mut diagnostics = DiagnosticEngine::new();
        let (ast, module) = parse(source, &mut interner, &mut diagnostics);
        assert!(!diagnostics.has_errors(), "unexpected diagnostics for {source:?}");
        (ast, module.expect("parse should succeed"))
    }

    fn first_expr_stmt(ast: &Ast, module: &Module) -> ExprId {
        match ast.stmts.get(module.body[0]) {
            Stmt::Expr(e) => e.expr,
            other => panic!("expected an expression statement, got {other:?}"),
        }
    }

    #[test]
    fn precedence_multiply_binds_tighter_than_plus() {
        let (ast, module) = parse_ok("1 + 2 * 3");
        let expr = first_expr_stmt(&ast, &module);
        match ast.exprs.get(expr) {
            Expr::Binary(b) => {
                assert_eq!(b.op, TokenKind::Plus);
                match ast.exprs.get(b.rhs) {
                    Expr::Binary(inner) => assert_eq!(inner.op, TokenKind::Multiply),
                    other => panic!("expected nested multiply, got {other:?}"),
                }
            }
            other => panic!("expected top-level plus, got {other:?}"),
        }
    }

    #[test]
    fn subtraction_is_left_associative() {
        let (ast, module) = parse_ok("1 - 2 - 3");
        let expr = first_expr_stmt(&ast, &module);
        match ast.exprs.get(expr) {
            Expr::Binary(outer) => {
                assert_eq!(outer.op, TokenKind::Minus);
                match ast.exprs.get(outer.lhs) {
                    Expr::Binary(inner) => assert_eq!(inner.op, TokenKind::Minus),
                    other => panic!("expected nested minus on the left, got {other:?}"),
                }
            }
            other => panic!("expected top-level minus, got {other:?}"),
        }
    }

    #[test]
    fn call_expr_collects_callee_and_args() {
        let (ast, module) = parse_ok("foo(a + b, c)");
        let expr = first_expr_stmt(&ast, &module);
        match ast.exprs.get(expr) {
            Expr::Call(c) => {
                assert_eq!(c.args.len(), 2);
                assert!(!c.paren_free);
            }
            other => panic!("expected a call expression, got {other:?}"),
        }
    }

    #[test]
    fn unary_minus_binds_before_plus() {
        let (ast, module) = parse_ok("-x + y");
        let expr = first_expr_stmt(&ast, &module);
        match ast.exprs.get(expr) {
            Expr::Binary(b) => {
                assert_eq!(b.op, TokenKind::Plus);
                match ast.exprs.get(b.lhs) {
                    Expr::Unary(u) => assert_eq!(u.op, TokenKind::Negate),
                    other => panic!("expected a negate on the left, got {other:?}"),
                }
            }
            other => panic!("expected top-level plus, got {other:?}"),
        }
    }

    #[test]
    fn bare_identifier_followed_by_args_is_a_paren_free_call() {
        let (ast, module) = parse_ok("PRINT \"Hello\"");
        let expr = first_expr_stmt(&ast, &module);
        match ast.exprs.get(expr) {
            Expr::Call(c) => {
                assert!(c.paren_free);
                assert_eq!(c.args.len(), 1);
            }
            other => panic!("expected a paren-free call, got {other:?}"),
        }
    }

    #[test]
    fn assignment_is_parsed_as_a_statement_not_equality() {
        let (ast, module) = parse_ok("x = 5");
        let expr = first_expr_stmt(&ast, &module);
        assert!(matches!(ast.exprs.get(expr), Expr::Assign(_)));
    }

    #[test]
    fn equals_in_a_condition_is_equality_not_assignment() {
        let (ast, module) = parse_ok("IF p = NULL THEN RETURN");
        match ast.stmts.get(module.body[0]) {
            Stmt::If(s) => {
                let guard = s.blocks[0].guard.expect("guard present");
                match ast.exprs.get(guard) {
                    Expr::Binary(b) => assert_eq!(b.op, TokenKind::Equal),
                    other => panic!("expected an equality comparison, got {other:?}"),
                }
            }
            other => panic!("expected an if statement, got {other:?}"),
        }
    }

    #[test]
    fn single_line_if_has_no_end_if() {
        let (ast, module) = parse_ok("IF p = NULL THEN RETURN");
        match ast.stmts.get(module.body[0]) {
            Stmt::If(s) => {
                assert_eq!(s.blocks.len(), 1);
                assert_eq!(s.blocks[0].body.len(), 1);
            }
            other => panic!("expected an if statement, got {other:?}"),
        }
    }

    #[test]
    fn block_if_with_else_if_and_else() {
        let (ast, module) = parse_ok(
            "IF a THEN\n\
             RETURN 1\n\
             ELSE IF b THEN\n\
             RETURN 2\n\
             ELSE\n\
             RETURN 3\n\
             END IF",
        );
        match ast.stmts.get(module.body[0]) {
            Stmt::If(s) => assert_eq!(s.blocks.len(), 3),
            other => panic!("expected an if statement, got {other:?}"),
        }
    }

    #[test]
    fn for_loop_records_iterator_and_bounds() {
        let (ast, module) = parse_ok("FOR i = 0 TO 9\nPRINT i\nNEXT");
        match ast.stmts.get(module.body[0]) {
            Stmt::For(f) => {
                assert_eq!(f.body.len(), 1);
                assert!(f.step.is_none());
                assert_eq!(f.direction, ForDirection::Unknown);
            }
            other => panic!("expected a for statement, got {other:?}"),
        }
    }

    #[test]
    fn do_loop_with_post_condition() {
        let (ast, module) = parse_ok("DO\nPRINT 1\nLOOP UNTIL x");
        match ast.stmts.get(module.body[0]) {
            Stmt::DoLoop(d) => {
                assert_eq!(d.condition_pos, DoCondPos::Post);
                assert_eq!(d.condition_kind, Some(DoCondKind::Until));
            }
            other => panic!("expected a do-loop statement, got {other:?}"),
        }
    }

    #[test]
    fn declare_then_define_round_trips_through_decl_stmts() {
        let (ast, module) = parse_ok("DECLARE SUB Foo()\nSUB Foo()\nEND SUB");
        assert_eq!(module.body.len(), 2);
        match ast.stmts.get(module.body[0]) {
            Stmt::Decl(d) => match ast.decls.get(*d) {
                Decl::Func(f) => assert!(!f.has_impl),
                other => panic!("expected a func decl, got {other:?}"),
            },
            other => panic!("expected a decl statement, got {other:?}"),
        }
        match ast.stmts.get(module.body[1]) {
            Stmt::Decl(d) => match ast.decls.get(*d) {
                Decl::Func(f) => assert!(f.has_impl),
                other => panic!("expected a func decl, got {other:?}"),
            },
            other => panic!("expected a decl statement, got {other:?}"),
        }
    }

    #[test]
    fn udt_decl_collects_members() {
        let (ast, module) = parse_ok("TYPE Point\nx AS Integer\ny AS Integer\nEND TYPE");
        match ast.stmts.get(module.body[0]) {
            Stmt::Decl(d) => match ast.decls.get(*d) {
                Decl::Udt(u) => assert_eq!(u.members.len(), 2),
                other => panic!("expected a udt decl, got {other:?}"),
            },
            other => panic!("expected a decl statement, got {other:?}"),
        }
    }

    #[test]
    fn member_access_produces_member_expr() {
        let (ast, module) = parse_ok("p.x = 5");
        let expr = first_expr_stmt(&ast, &module);
        match ast.exprs.get(expr) {
            Expr::Assign(a) => assert!(matches!(ast.exprs.get(a.lhs), Expr::Member(_))),
            other => panic!("expected an assignment, got {other:?}"),
        }
    }

    #[test]
    fn unexpected_token_aborts_the_parse() {
        let mut interner = StringInterner::new();
        let mut diagnostics = DiagnosticEngine::new();
        let (_ast, module) = parse("DIM x AS", &mut interner, &mut diagnostics);
        assert!(module.is_err());
        assert!(diagnostics.has_errors());
    }
}
