//! AST JSON dump for developer tooling.
//!
//! Unlike the code printer, there's no concrete syntax tree to lean on here
//! — every node emits `class`, `loc`, and its children as named fields,
//! read directly off the arena-allocated AST.

use serde_json::{json, Value};

use lbc_common::{LineIndex, LiteralValue, Span, StringInterner};
use lbc_parser::{
    Ast, Attribute, ContinuationKind, ControlFlowKind, Decl, DeclId, DoCondKind, DoCondPos, Expr, ExprId,
    ForDirection, Module, Stmt, StmtId, TypeExpr, TypeExprId, TypeExprKind,
};

pub struct JsonDumper<'a> {
    ast: &'a Ast,
    interner: &'a StringInterner,
    lines: &'a LineIndex,
}

impl<'a> JsonDumper<'a> {
    pub fn new(ast: &'a Ast, interner: &'a StringInterner, lines: &'a LineIndex) -> Self {
        JsonDumper { ast, interner, lines }
    }

    fn name(&self, id: lbc_common::StringId) -> &str {
        self.interner.resolve(id)
    }

    fn loc(&self, span: Span) -> Value {
        let (line, col) = self.lines.line_col(span.start);
        let (end_line, end_col) = self.lines.line_col(span.end);
        json!({
            "start": { "offset": span.start, "line": line, "col": col },
            "end": { "offset": span.end, "line": end_line, "col": end_col },
        })
    }

    pub fn module(&self, module: &Module) -> Value {
        json!({
            "class": "Module",
            "loc": self.loc(module.span),
            "implicitMain": module.implicit_main,
            "body": module.body.iter().map(|&id| self.stmt(id)).collect::<Vec<_>>(),
        })
    }

    fn attributes(&self, attrs: &[Attribute]) -> Value {
        Value::Array(
            attrs
                .iter()
                .map(|a| {
                    json!({
                        "key": self.name(a.key),
                        "value": a.value.map(|v| self.name(v)),
                    })
                })
                .collect(),
        )
    }

    // ── Statements ───────────────────────────────────────────────────────

    fn stmt(&self, id: StmtId) -> Value {
        match self.ast.stmts.get(id) {
            Stmt::Decl(decl_id) => self.decl(*decl_id),
            Stmt::Expr(s) => json!({
                "class": "ExprStmt",
                "loc": self.loc(s.span),
                "expr": self.expr(s.expr),
            }),
            Stmt::Return(s) => json!({
                "class": "ReturnStmt",
                "loc": self.loc(s.span),
                "expr": s.expr.map(|e| self.expr(e)),
            }),
            Stmt::If(s) => json!({
                "class": "IfStmt",
                "loc": self.loc(s.span),
                "blocks": s.blocks.iter().map(|b| json!({
                    "loc": self.loc(b.span),
                    "guard": b.guard.map(|g| self.expr(g)),
                    "decls": b.decls.iter().map(|&d| self.decl(d)).collect::<Vec<_>>(),
                    "body": b.body.iter().map(|&st| self.stmt(st)).collect::<Vec<_>>(),
                })).collect::<Vec<_>>(),
            }),
            Stmt::For(s) => json!({
                "class": "ForStmt",
                "loc": self.loc(s.span),
                "iteratorName": self.name(s.iterator_name),
                "decls": s.decls.iter().map(|&d| self.decl(d)).collect::<Vec<_>>(),
                "from": self.expr(s.from),
                "to": self.expr(s.to),
                "step": s.step.map(|e| self.expr(e)),
                "nextName": s.next_name.map(|n| self.name(n)),
                "direction": for_direction(s.direction),
                "body": s.body.iter().map(|&st| self.stmt(st)).collect::<Vec<_>>(),
            }),
            Stmt::DoLoop(s) => json!({
                "class": "DoLoopStmt",
                "loc": self.loc(s.span),
                "conditionPos": do_cond_pos(s.condition_pos),
                "conditionKind": s.condition_kind.map(do_cond_kind),
                "condition": s.condition.map(|e| self.expr(e)),
                "body": s.body.iter().map(|&st| self.stmt(st)).collect::<Vec<_>>(),
            }),
            Stmt::Continuation(s) => json!({
                "class": "ContinuationStmt",
                "loc": self.loc(s.span),
                "kind": match s.kind {
                    ContinuationKind::Exit => "Exit",
                    ContinuationKind::Continue => "Continue",
                },
                "target": match s.target {
                    ControlFlowKind::For => "For",
                    ControlFlowKind::Do => "Do",
                },
            }),
            Stmt::Import(s) => json!({
                "class": "ImportStmt",
                "loc": self.loc(s.span),
                "path": s.path.iter().map(|&id| self.name(id)).collect::<Vec<_>>(),
            }),
            Stmt::Extern(s) => json!({
                "class": "ExternStmt",
                "loc": self.loc(s.span),
                "callingConv": s.calling_conv.map(|cc| self.name(cc)),
                "decls": s.decls.iter().map(|&d| self.decl(d)).collect::<Vec<_>>(),
            }),
        }
    }

    // ── Declarations ─────────────────────────────────────────────────────

    fn decl(&self, id: DeclId) -> Value {
        match self.ast.decls.get(id) {
            Decl::Var(v) => json!({
                "class": "VarDecl",
                "loc": self.loc(v.span),
                "name": self.name(v.name),
                "typeExpr": v.type_expr.map(|t| self.type_expr(t)),
                "init": v.init.map(|e| self.expr(e)),
                "attributes": self.attributes(&v.attributes),
                "isConst": v.is_const,
                "isExtern": v.is_extern,
            }),
            Decl::Func(f) => json!({
                "class": "FuncDecl",
                "loc": self.loc(f.span),
                "name": self.name(f.name),
                "isSub": f.is_sub,
                "params": f.params.iter().map(|p| json!({
                    "name": self.name(p.name),
                    "typeExpr": self.type_expr(p.type_expr),
                })).collect::<Vec<_>>(),
                "variadic": f.variadic,
                "returnType": f.return_type.map(|t| self.type_expr(t)),
                "attributes": self.attributes(&f.attributes),
                "hasImpl": f.has_impl,
                "body": f.body.as_ref().map(|b| b.iter().map(|&s| self.stmt(s)).collect::<Vec<_>>()),
            }),
            Decl::Udt(u) => json!({
                "class": "UdtDecl",
                "loc": self.loc(u.span),
                "name": self.name(u.name),
                "packed": u.packed,
                "attributes": self.attributes(&u.attributes),
                "members": u.members.iter().map(|&m| self.decl(m)).collect::<Vec<_>>(),
            }),
            Decl::TypeAlias(t) => json!({
                "class": "TypeAliasDecl",
                "loc": self.loc(t.span),
                "name": self.name(t.name),
                "typeExpr": self.type_expr(t.type_expr),
            }),
        }
    }

    // ── Type expressions ─────────────────────────────────────────────────

    fn type_expr(&self, id: TypeExprId) -> Value {
        let te: &TypeExpr = self.ast.type_exprs.get(id);
        let kind = match &te.kind {
            TypeExprKind::Builtin(token) => json!({ "class": "Builtin", "name": token.string() }),
            TypeExprKind::Named(name) => json!({ "class": "Named", "name": self.name(*name) }),
            TypeExprKind::TypeOf(expr) => json!({ "class": "TypeOf", "expr": self.expr(*expr) }),
            TypeExprKind::Function(params, ret, variadic) => json!({
                "class": "Function",
                "params": params.iter().map(|&p| self.type_expr(p)).collect::<Vec<_>>(),
                "returnType": ret.map(|r| self.type_expr(r)),
                "variadic": variadic,
            }),
        };
        json!({
            "class": "TypeExpr",
            "loc": self.loc(te.span),
            "kind": kind,
            "ptrDepth": te.ptr_depth,
            "isRef": te.is_ref,
        })
    }

    // ── Expressions ──────────────────────────────────────────────────────

    fn expr(&self, id: ExprId) -> Value {
        match self.ast.exprs.get(id) {
            Expr::Literal(e) => json!({
                "class": "LiteralExpr",
                "loc": self.loc(e.span),
                "value": self.literal_value(e.value),
            }),
            Expr::Ident(e) => json!({
                "class": "IdentExpr",
                "loc": self.loc(e.span),
                "name": self.name(e.name),
            }),
            Expr::Call(e) => json!({
                "class": "CallExpr",
                "loc": self.loc(e.span),
                "callee": self.expr(e.callee),
                "args": e.args.iter().map(|&a| self.expr(a)).collect::<Vec<_>>(),
                "parenFree": e.paren_free,
            }),
            Expr::Member(e) => json!({
                "class": "MemberExpr",
                "loc": self.loc(e.span),
                "lhs": self.expr(e.lhs),
                "member": self.name(e.member),
            }),
            Expr::Assign(e) => json!({
                "class": "AssignExpr",
                "loc": self.loc(e.span),
                "lhs": self.expr(e.lhs),
                "rhs": self.expr(e.rhs),
            }),
            Expr::Unary(e) => json!({
                "class": "UnaryExpr",
                "loc": self.loc(e.span),
                "op": e.op.string(),
                "operand": self.expr(e.operand),
            }),
            Expr::Binary(e) => json!({
                "class": "BinaryExpr",
                "loc": self.loc(e.span),
                "op": e.op.string(),
                "lhs": self.expr(e.lhs),
                "rhs": self.expr(e.rhs),
            }),
            Expr::Cast(e) => json!({
                "class": "CastExpr",
                "loc": self.loc(e.span),
                "operand": self.expr(e.operand),
                "typeExpr": e.type_expr.map(|t| self.type_expr(t)),
                "implicit": e.implicit,
            }),
            Expr::Deref(e) => json!({
                "class": "DerefExpr",
                "loc": self.loc(e.span),
                "operand": self.expr(e.operand),
            }),
            Expr::AddrOf(e) => json!({
                "class": "AddrOfExpr",
                "loc": self.loc(e.span),
                "operand": self.expr(e.operand),
            }),
            Expr::If(e) => json!({
                "class": "IfExpr",
                "loc": self.loc(e.span),
                "cond": self.expr(e.cond),
                "then": self.expr(e.then_expr),
                "else": self.expr(e.else_expr),
            }),
            Expr::SizeOf(e) => json!({
                "class": "SizeOfExpr",
                "loc": self.loc(e.span),
                "typeExpr": self.type_expr(e.type_expr),
            }),
        }
    }

    fn literal_value(&self, value: LiteralValue) -> Value {
        match value {
            LiteralValue::Null => json!({ "kind": "Null" }),
            LiteralValue::Bool(b) => json!({ "kind": "Bool", "value": b }),
            LiteralValue::Integral(v) => json!({ "kind": "Integral", "value": v }),
            LiteralValue::Float(f) => json!({ "kind": "Float", "value": f }),
            LiteralValue::Str(id) => json!({ "kind": "Str", "value": self.name(id) }),
        }
    }
}

fn for_direction(d: ForDirection) -> &'static str {
    match d {
        ForDirection::Unknown => "Unknown",
        ForDirection::Skip => "Skip",
        ForDirection::Increment => "Increment",
        ForDirection::Decrement => "Decrement",
    }
}

fn do_cond_kind(k: DoCondKind) -> &'static str {
    match k {
        DoCondKind::While => "While",
        DoCondKind::Until => "Until",
    }
}

fn do_cond_pos(p: DoCondPos) -> &'static str {
    match p {
        DoCondPos::None => "None",
        DoCondPos::Pre => "Pre",
        DoCondPos::Post => "Post",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lbc_common::DiagnosticEngine;

    fn dump(source: &str) -> Value {
        let mut interner = StringInterner::new();
        let mut diagnostics = DiagnosticEngine::new();
        let (ast, module) = lbc_parser::parse(source, &mut interner, &mut diagnostics);
        assert!(!diagnostics.has_errors(), "unexpected diagnostics for {source:?}");
        let module = module.expect("parse should succeed");
        let lines = LineIndex::new(source);
        JsonDumper::new(&ast, &interner, &lines).module(&module)
    }

    #[test]
    fn literal_expr_has_class_and_loc() {
        let value = dump("42");
        let first = &value["body"][0];
        assert_eq!(first["class"], "ExprStmt");
        assert_eq!(first["expr"]["class"], "LiteralExpr");
        assert_eq!(first["expr"]["value"]["kind"], "Integral");
        assert_eq!(first["expr"]["value"]["value"], 42);
    }

    #[test]
    fn func_decl_carries_params_and_body() {
        let value = dump("FUNCTION ADD(A AS INTEGER, B AS INTEGER) AS INTEGER\nRETURN A + B\nEND FUNCTION");
        let decl = &value["body"][0];
        assert_eq!(decl["class"], "FuncDecl");
        assert_eq!(decl["name"], "ADD");
        assert_eq!(decl["params"].as_array().unwrap().len(), 2);
        assert_eq!(decl["hasImpl"], true);
        assert!(decl["body"].is_array());
    }

    #[test]
    fn binary_expr_nests_precedence() {
        let value = dump("1 + 2 * 3");
        let expr = &value["body"][0]["expr"];
        assert_eq!(expr["class"], "BinaryExpr");
        assert_eq!(expr["op"], "+");
        assert_eq!(expr["rhs"]["class"], "BinaryExpr");
        assert_eq!(expr["rhs"]["op"], "*");
    }
}
