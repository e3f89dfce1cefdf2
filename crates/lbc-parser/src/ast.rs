//! The LightBASIC AST: a closed set of tagged-sum node families allocated
//! from [`Ast`]'s arenas. There is no inheritance and no dynamic `classof`
//! cast — group membership is a `match` on the enum discriminant, and
//! cross-references are plain arena indices, never owning pointers.
//!
//! Nothing here is mutated by semantic analysis except [`ForStmt::direction`]
//! (a parser-native enum, safe to set in place). Every other sema result —
//! resolved types, symbol back-pointers, folded constants, inserted casts —
//! lives in side tables keyed by these ids, kept in the `lbc-sema` crate, so
//! the AST crate never needs to know about the type system.

use crate::arena::{Arena, Id};
use lbc_common::{LiteralValue, Span, StringId, TokenKind};

pub type ExprId = Id<Expr>;
pub type StmtId = Id<Stmt>;
pub type DeclId = Id<Decl>;
pub type TypeExprId = Id<TypeExpr>;

#[derive(Debug, Default)]
pub struct Ast {
    pub exprs: Arena<Expr>,
    pub stmts: Arena<Stmt>,
    pub decls: Arena<Decl>,
    pub type_exprs: Arena<TypeExpr>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }
}

/// The root of a parsed compilation unit.
#[derive(Debug, Clone)]
pub struct Module {
    pub span: Span,
    /// True when the module has no explicit top-level `SUB`/`FUNCTION`
    /// wrapping its statements — the whole file is an implicit `main`.
    pub implicit_main: bool,
    /// Import statement ids found anywhere in `body`, cached for quick
    /// access by the driver (which resolves them externally).
    pub imports: Vec<StmtId>,
    pub body: Vec<StmtId>,
}

// ── Attributes ───────────────────────────────────────────────────────────

/// A source-level annotation: `[key]` or `[key = "value"]`.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub span: Span,
    pub key: StringId,
    pub value: Option<StringId>,
}

// ── Declarations ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Decl {
    Var(VarDecl),
    Func(FuncDecl),
    Udt(UdtDecl),
    TypeAlias(TypeAliasDecl),
}

impl Decl {
    pub fn span(&self) -> Span {
        match self {
            Decl::Var(d) => d.span,
            Decl::Func(d) => d.span,
            Decl::Udt(d) => d.span,
            Decl::TypeAlias(d) => d.span,
        }
    }

    pub fn name(&self) -> StringId {
        match self {
            Decl::Var(d) => d.name,
            Decl::Func(d) => d.name,
            Decl::Udt(d) => d.name,
            Decl::TypeAlias(d) => d.name,
        }
    }
}

#[derive(Debug, Clone)]
pub struct VarDecl {
    pub span: Span,
    pub name: StringId,
    pub name_span: Span,
    pub type_expr: Option<TypeExprId>,
    pub init: Option<ExprId>,
    pub attributes: Vec<Attribute>,
    pub calling_conv: Option<StringId>,
    pub is_const: bool,
    pub is_extern: bool,
}

#[derive(Debug, Clone)]
pub struct FuncParamDecl {
    pub span: Span,
    pub name: StringId,
    pub type_expr: TypeExprId,
}

#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub span: Span,
    pub name: StringId,
    pub name_span: Span,
    /// `true` for `SUB`, `false` for `FUNCTION`.
    pub is_sub: bool,
    pub params: Vec<FuncParamDecl>,
    pub variadic: bool,
    pub return_type: Option<TypeExprId>,
    pub attributes: Vec<Attribute>,
    pub calling_conv: Option<StringId>,
    /// `true` when the declaration carries a body (`SUB ... END SUB`);
    /// `false` for a bare `DECLARE SUB`/`DECLARE FUNCTION` prototype.
    pub has_impl: bool,
    pub body: Option<Vec<StmtId>>,
}

#[derive(Debug, Clone)]
pub struct UdtDecl {
    pub span: Span,
    pub name: StringId,
    pub name_span: Span,
    pub members: Vec<DeclId>,
    pub packed: bool,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone)]
pub struct TypeAliasDecl {
    pub span: Span,
    pub name: StringId,
    pub type_expr: TypeExprId,
}

// ── Statements ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Stmt {
    Decl(DeclId),
    Expr(ExprStmt),
    Return(ReturnStmt),
    If(IfStmt),
    For(ForStmt),
    DoLoop(DoLoopStmt),
    Continuation(ContinuationStmt),
    Import(ImportStmt),
    Extern(ExternStmt),
}

#[derive(Debug, Clone)]
pub struct ExprStmt {
    pub span: Span,
    pub expr: ExprId,
}

#[derive(Debug, Clone)]
pub struct ReturnStmt {
    pub span: Span,
    pub expr: Option<ExprId>,
}

#[derive(Debug, Clone)]
pub struct IfBlock {
    pub span: Span,
    /// `None` only for the trailing unconditional `ELSE` block.
    pub guard: Option<ExprId>,
    pub decls: Vec<DeclId>,
    pub body: Vec<StmtId>,
}

#[derive(Debug, Clone)]
pub struct IfStmt {
    pub span: Span,
    pub blocks: Vec<IfBlock>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForDirection {
    Unknown,
    Skip,
    Increment,
    Decrement,
}

#[derive(Debug, Clone)]
pub struct ForStmt {
    pub span: Span,
    pub decls: Vec<DeclId>,
    pub iterator_name: StringId,
    pub iterator_span: Span,
    pub from: ExprId,
    pub to: ExprId,
    pub step: Option<ExprId>,
    pub body: Vec<StmtId>,
    pub next_name: Option<StringId>,
    /// Filled in by sema once operand types (and constant folds, if any)
    /// are known.
    pub direction: ForDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoCondKind {
    While,
    Until,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoCondPos {
    /// No condition: `DO ... LOOP` (infinite, broken only by `EXIT DO`).
    None,
    Pre,
    Post,
}

#[derive(Debug, Clone)]
pub struct DoLoopStmt {
    pub span: Span,
    pub body: Vec<StmtId>,
    pub condition: Option<ExprId>,
    pub condition_kind: Option<DoCondKind>,
    pub condition_pos: DoCondPos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinuationKind {
    Exit,
    Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFlowKind {
    For,
    Do,
}

#[derive(Debug, Clone)]
pub struct ContinuationStmt {
    pub span: Span,
    pub kind: ContinuationKind,
    pub target: ControlFlowKind,
}

#[derive(Debug, Clone)]
pub struct ImportStmt {
    pub span: Span,
    pub path: Vec<StringId>,
}

#[derive(Debug, Clone)]
pub struct ExternStmt {
    pub span: Span,
    pub calling_conv: Option<StringId>,
    pub decls: Vec<DeclId>,
}

// ── Type expressions ─────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum TypeExprKind {
    /// One of the closed builtin type-keyword tokens (`INTEGER`, `BOOL`,
    /// `ANY`, ...).
    Builtin(TokenKind),
    /// An identifier to be resolved against the symbol table by sema
    /// (a `TYPE`-declared UDT or a type alias).
    Named(StringId),
    /// `TYPEOF(expr)` — left unimplemented per the design's guidance to
    /// treat this form as optional; parsed but rejected by sema.
    TypeOf(ExprId),
    Function(Vec<TypeExprId>, Option<TypeExprId>, bool),
}

#[derive(Debug, Clone)]
pub struct TypeExpr {
    pub span: Span,
    pub kind: TypeExprKind,
    /// Number of trailing `PTR` suffixes.
    pub ptr_depth: u32,
    /// Trailing `REF` suffix present.
    pub is_ref: bool,
}

// ── Expressions ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Expr {
    Literal(LiteralExpr),
    Ident(IdentExpr),
    Call(CallExpr),
    Member(MemberExpr),
    Assign(AssignExpr),
    Unary(UnaryExpr),
    Binary(BinaryExpr),
    Cast(CastExpr),
    Deref(DerefExpr),
    AddrOf(AddrOfExpr),
    If(IfExpr),
    SizeOf(SizeOfExpr),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal(e) => e.span,
            Expr::Ident(e) => e.span,
            Expr::Call(e) => e.span,
            Expr::Member(e) => e.span,
            Expr::Assign(e) => e.span,
            Expr::Unary(e) => e.span,
            Expr::Binary(e) => e.span,
            Expr::Cast(e) => e.span,
            Expr::Deref(e) => e.span,
            Expr::AddrOf(e) => e.span,
            Expr::If(e) => e.span,
            Expr::SizeOf(e) => e.span,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LiteralExpr {
    pub span: Span,
    pub value: LiteralValue,
}

#[derive(Debug, Clone)]
pub struct IdentExpr {
    pub span: Span,
    pub name: StringId,
}

#[derive(Debug, Clone)]
pub struct CallExpr {
    pub span: Span,
    pub callee: ExprId,
    pub args: Vec<ExprId>,
    /// `true` when this call was synthesized from the paren-free
    /// `SUB`-call grammar rather than written with `(...)`.
    pub paren_free: bool,
}

#[derive(Debug, Clone)]
pub struct MemberExpr {
    pub span: Span,
    pub lhs: ExprId,
    pub member: StringId,
    pub member_span: Span,
}

#[derive(Debug, Clone)]
pub struct AssignExpr {
    pub span: Span,
    pub lhs: ExprId,
    pub rhs: ExprId,
}

#[derive(Debug, Clone)]
pub struct UnaryExpr {
    pub span: Span,
    pub op: TokenKind,
    pub operand: ExprId,
}

#[derive(Debug, Clone)]
pub struct BinaryExpr {
    pub span: Span,
    pub op: TokenKind,
    pub lhs: ExprId,
    pub rhs: ExprId,
}

#[derive(Debug, Clone)]
pub struct CastExpr {
    pub span: Span,
    pub operand: ExprId,
    /// `None` for an implicit cast inserted by sema (the operand's natural
    /// type is adopted, constrained by `implicit_type`).
    pub type_expr: Option<TypeExprId>,
    pub implicit: bool,
}

#[derive(Debug, Clone)]
pub struct DerefExpr {
    pub span: Span,
    pub operand: ExprId,
}

#[derive(Debug, Clone)]
pub struct AddrOfExpr {
    pub span: Span,
    pub operand: ExprId,
}

#[derive(Debug, Clone)]
pub struct IfExpr {
    pub span: Span,
    pub cond: ExprId,
    pub then_expr: ExprId,
    pub else_expr: ExprId,
}

/// `SIZEOF(typeExpr)` — resolved to a constant `Integer` by sema.
#[derive(Debug, Clone)]
pub struct SizeOfExpr {
    pub span: Span,
    pub type_expr: TypeExprId,
}
