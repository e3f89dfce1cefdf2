//! Recursive-descent statement/declaration parser with a precedence-climbing
//! expression core.
//!
//! One token of lookahead, supplied by the lexer's own `peek()`/`next()` —
//! there is no separate token buffer here. Every fallible step returns
//! `PResult<T>`; a single unexpected token aborts the whole parse (recorded
//! as a diagnostic, propagated with `?`) rather than attempting resync, per
//! the "parser does not recover" rule this language follows.

use lbc_common::{Diagnostic, DiagnosticEngine, LiteralValue, Span, StringId, StringInterner, Token, TokenKind};
use lbc_lexer::Lexer;

use crate::ast::*;

/// An opaque marker: the real diagnostic has already been recorded in the
/// shared engine by the time this is constructed.
#[derive(Debug, Clone, Copy)]
pub struct ParseError;

pub type PResult<T> = Result<T, ParseError>;

pub fn parse(
    source: &str,
    interner: &mut StringInterner,
    diagnostics: &mut DiagnosticEngine,
) -> (Ast, PResult<Module>) {
    let mut parser = Parser::new(source, interner, diagnostics);
    let module = parser.parse_module();
    (parser.ast, module)
}

#[derive(Debug, Clone, Copy, Default)]
struct ExprFlags {
    /// Halt `climb` before consuming a top-level `=`; the caller treats it
    /// as the start of an assignment statement instead.
    stop_at_assign: bool,
    /// A lone leading identifier may absorb the rest of the line as a
    /// paren-free argument list (`PRINT "Hello"`).
    call_without_parens: bool,
    /// Inside an `IF`/`ELSE IF` guard, a bare `,` is short-circuit `AND`.
    allow_condition_and: bool,
}

impl ExprFlags {
    fn for_operand(self) -> ExprFlags {
        ExprFlags {
            call_without_parens: false,
            ..self
        }
    }
}

struct Parser<'src, 'ctx> {
    lexer: Lexer<'src, 'ctx>,
    ast: Ast,
    last_span: Span,
}

impl<'src, 'ctx> Parser<'src, 'ctx> {
    fn new(source: &'src str, interner: &'ctx mut StringInterner, diagnostics: &'ctx mut DiagnosticEngine) -> Self {
        Parser {
            lexer: Lexer::new(source, interner, diagnostics),
            ast: Ast::new(),
            last_span: Span::new(0, 0),
        }
    }

    // ── Token stream helpers ────────────────────────────────────────────

    fn peek(&mut self) -> Token {
        self.lexer.peek()
    }

    fn at(&mut self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn bump(&mut self) -> Token {
        let tok = self.lexer.next();
        self.last_span = tok.span;
        tok
    }

    fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.at(kind) {
            Some(self.bump())
        } else {
            None
        }
    }

    fn expect(&mut self, kind: TokenKind) -> PResult<Token> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            let tok = self.peek();
            self.error(
                tok.span,
                format!("expected {}, found {}", kind.string(), tok.kind.string()),
            );
            Err(ParseError)
        }
    }

    fn error(&mut self, span: Span, message: impl Into<String>) {
        self.lexer.diagnostics().report(Diagnostic::error(span, message));
    }

    fn skip_stmt_ends(&mut self) {
        while self.at(TokenKind::EndOfStmt) {
            self.bump();
        }
    }

    fn placeholder_name(&mut self) -> StringId {
        self.lexer.interner().intern("<error>")
    }

    fn name_of(&mut self, tok: Token) -> StringId {
        tok.value.and_then(|v| v.as_str_id()).unwrap_or_else(|| self.placeholder_name())
    }

    fn span_from(&self, start: Span) -> Span {
        Span::new(start.start, self.last_span.end)
    }

    // ── Module ───────────────────────────────────────────────────────────

    fn parse_module(&mut self) -> PResult<Module> {
        let start = self.peek().span;
        self.skip_stmt_ends();
        let mut body = Vec::new();
        let mut imports = Vec::new();
        while !self.at(TokenKind::EndOfFile) {
            let id = self.parse_stmt()?;
            if matches!(self.ast.stmts.get(id), Stmt::Import(_)) {
                imports.push(id);
            }
            body.push(id);
            self.skip_stmt_ends();
        }
        let implicit_main = body
            .iter()
            .any(|&id| Self::is_executable(self.ast.stmts.get(id)));
        Ok(Module {
            span: self.span_from(start),
            implicit_main,
            imports,
            body,
        })
    }

    fn is_executable(stmt: &Stmt) -> bool {
        !matches!(stmt, Stmt::Decl(_) | Stmt::Import(_) | Stmt::Extern(_))
    }

    fn parse_block_until(&mut self, terminators: &[TokenKind]) -> PResult<Vec<StmtId>> {
        let mut stmts = Vec::new();
        self.skip_stmt_ends();
        while !terminators.contains(&self.peek().kind) && !self.at(TokenKind::EndOfFile) {
            stmts.push(self.parse_stmt()?);
            self.skip_stmt_ends();
        }
        Ok(stmts)
    }

    fn decls_of(&self, stmts: &[StmtId]) -> Vec<DeclId> {
        stmts
            .iter()
            .filter_map(|&id| match self.ast.stmts.get(id) {
                Stmt::Decl(d) => Some(*d),
                _ => None,
            })
            .collect()
    }

    // ── Statements ───────────────────────────────────────────────────────

    fn parse_stmt(&mut self) -> PResult<StmtId> {
        let attributes = if self.at(TokenKind::BracketOpen) {
            self.parse_attributes()?
        } else {
            Vec::new()
        };
        match self.peek().kind {
            TokenKind::Dim | TokenKind::Const => self.parse_var_decl_stmt(attributes),
            TokenKind::Declare => self.parse_declare_stmt(attributes),
            TokenKind::Sub | TokenKind::Function => self.parse_func_decl_stmt(attributes),
            TokenKind::Type => self.parse_type_decl_stmt(attributes),
            TokenKind::Import => self.parse_import_stmt(),
            TokenKind::Extern => self.parse_extern_stmt(attributes),
            TokenKind::If => self.parse_if_stmt(),
            TokenKind::For => self.parse_for_stmt(),
            TokenKind::Do => self.parse_do_loop_stmt(),
            TokenKind::Return => self.parse_return_stmt(),
            TokenKind::Exit | TokenKind::Continue => self.parse_continuation_stmt(),
            _ => self.parse_expr_stmt(),
        }
    }

    fn parse_attributes(&mut self) -> PResult<Vec<Attribute>> {
        let mut attrs = Vec::new();
        self.expect(TokenKind::BracketOpen)?;
        while !self.at(TokenKind::BracketClose) {
            let key_tok = self.expect(TokenKind::Identifier)?;
            let key = self.name_of(key_tok);
            let value = if self.eat(TokenKind::Assign).is_some() {
                let val_tok = self.bump();
                val_tok.value.and_then(|v| v.as_str_id())
            } else {
                None
            };
            attrs.push(Attribute {
                span: key_tok.span,
                key,
                value,
            });
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::BracketClose)?;
        Ok(attrs)
    }

    fn attribute_is_packed(&mut self, attr: &Attribute) -> bool {
        self.lexer.interner().resolve(attr.key) == "PACKED"
    }

    fn wrap_decl_stmt(&mut self, decl: DeclId) -> StmtId {
        self.ast.stmts.alloc(Stmt::Decl(decl))
    }

    fn parse_var_decl_stmt(&mut self, attributes: Vec<Attribute>) -> PResult<StmtId> {
        let decl = self.parse_var_decl(attributes, false)?;
        Ok(self.wrap_decl_stmt(decl))
    }

    fn parse_var_decl(&mut self, attributes: Vec<Attribute>, is_extern: bool) -> PResult<DeclId> {
        let start_tok = self.bump(); // Dim or Const
        let is_const = start_tok.kind == TokenKind::Const;
        let name_tok = self.expect(TokenKind::Identifier)?;
        let name = self.name_of(name_tok);
        let type_expr = if self.eat(TokenKind::As).is_some() {
            Some(self.parse_type_expr()?)
        } else {
            None
        };
        let init = if self.eat(TokenKind::Assign).is_some() {
            Some(self.parse_expr()?)
        } else {
            None
        };
        let span = self.span_from(start_tok.span);
        Ok(self.ast.decls.alloc(Decl::Var(VarDecl {
            span,
            name,
            name_span: name_tok.span,
            type_expr,
            init,
            attributes,
            calling_conv: None,
            is_const,
            is_extern,
        })))
    }

    fn parse_declare_stmt(&mut self, attributes: Vec<Attribute>) -> PResult<StmtId> {
        let decl = self.parse_func_decl(attributes, false)?;
        Ok(self.wrap_decl_stmt(decl))
    }

    fn parse_func_decl_stmt(&mut self, attributes: Vec<Attribute>) -> PResult<StmtId> {
        let decl = self.parse_func_decl(attributes, false)?;
        Ok(self.wrap_decl_stmt(decl))
    }

    /// Parses `[DECLARE] (SUB | FUNCTION) name "(" params ")" [AS type] [body]`.
    /// `force_extern` is set when called from inside an `EXTERN` block, where
    /// a prototype never carries a body regardless of the `DECLARE` keyword.
    fn parse_func_decl(&mut self, attributes: Vec<Attribute>, force_extern: bool) -> PResult<DeclId> {
        let start = self.peek().span;
        let declared = self.eat(TokenKind::Declare).is_some();
        let kind_tok = if self.at(TokenKind::Sub) {
            self.bump()
        } else {
            self.expect(TokenKind::Function)?
        };
        let is_sub = kind_tok.kind == TokenKind::Sub;
        let name_tok = self.expect(TokenKind::Identifier)?;
        let name = self.name_of(name_tok);

        self.expect(TokenKind::ParenOpen)?;
        let mut params = Vec::new();
        let mut variadic = false;
        while !self.at(TokenKind::ParenClose) {
            if self.eat(TokenKind::Ellipsis).is_some() {
                variadic = true;
                break;
            }
            let p_start = self.peek().span;
            let p_name_tok = self.expect(TokenKind::Identifier)?;
            let p_name = self.name_of(p_name_tok);
            self.expect(TokenKind::As)?;
            let p_type = self.parse_type_expr()?;
            params.push(FuncParamDecl {
                span: self.span_from(p_start),
                name: p_name,
                type_expr: p_type,
            });
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::ParenClose)?;
        let return_type = if self.eat(TokenKind::As).is_some() {
            Some(self.parse_type_expr()?)
        } else {
            None
        };

        let has_impl = !declared && !force_extern;
        let body = if has_impl {
            self.skip_stmt_ends();
            let body = self.parse_block_until(&[TokenKind::End])?;
            self.expect(TokenKind::End)?;
            if is_sub {
                self.expect(TokenKind::Sub)?;
            } else {
                self.expect(TokenKind::Function)?;
            }
            Some(body)
        } else {
            None
        };

        let span = self.span_from(start);
        Ok(self.ast.decls.alloc(Decl::Func(FuncDecl {
            span,
            name,
            name_span: name_tok.span,
            is_sub,
            params,
            variadic,
            return_type,
            attributes,
            calling_conv: None,
            has_impl,
            body,
        })))
    }

    fn parse_type_decl_stmt(&mut self, attributes: Vec<Attribute>) -> PResult<StmtId> {
        let start = self.peek().span;
        self.bump(); // TYPE
        let name_tok = self.expect(TokenKind::Identifier)?;
        let name = self.name_of(name_tok);

        if self.eat(TokenKind::As).is_some() {
            let type_expr = self.parse_type_expr()?;
            let span = self.span_from(start);
            let decl = self.ast.decls.alloc(Decl::TypeAlias(TypeAliasDecl { span, name, type_expr }));
            return Ok(self.wrap_decl_stmt(decl));
        }

        let packed = attributes.iter().any(|a| self.attribute_is_packed(a));
        self.skip_stmt_ends();
        let mut members = Vec::new();
        while !self.at(TokenKind::End) && !self.at(TokenKind::EndOfFile) {
            let m_start = self.peek().span;
            let m_name_tok = self.expect(TokenKind::Identifier)?;
            let m_name = self.name_of(m_name_tok);
            self.expect(TokenKind::As)?;
            let m_type = self.parse_type_expr()?;
            let member = self.ast.decls.alloc(Decl::Var(VarDecl {
                span: self.span_from(m_start),
                name: m_name,
                name_span: m_name_tok.span,
                type_expr: Some(m_type),
                init: None,
                attributes: Vec::new(),
                calling_conv: None,
                is_const: false,
                is_extern: false,
            }));
            members.push(member);
            self.skip_stmt_ends();
        }
        self.expect(TokenKind::End)?;
        self.expect(TokenKind::Type)?;
        let span = self.span_from(start);
        let decl = self.ast.decls.alloc(Decl::Udt(UdtDecl {
            span,
            name,
            name_span: name_tok.span,
            members,
            packed,
            attributes,
        }));
        Ok(self.wrap_decl_stmt(decl))
    }

    fn parse_import_stmt(&mut self) -> PResult<StmtId> {
        let tok = self.bump(); // IMPORT
        let mut path = Vec::new();
        loop {
            let name_tok = self.expect(TokenKind::Identifier)?;
            path.push(self.name_of(name_tok));
            if self.eat(TokenKind::MemberAccess).is_none() {
                break;
            }
        }
        let span = self.span_from(tok.span);
        Ok(self.ast.stmts.alloc(Stmt::Import(ImportStmt { span, path })))
    }

    fn parse_extern_stmt(&mut self, attributes: Vec<Attribute>) -> PResult<StmtId> {
        let tok = self.bump(); // EXTERN
        let _ = attributes; // attributes on EXTERN itself are accepted but unused
        let calling_conv = if self.at(TokenKind::StringLiteral) {
            let t = self.bump();
            t.value.and_then(|v| v.as_str_id())
        } else {
            None
        };
        self.skip_stmt_ends();
        let mut decls = Vec::new();
        while !self.at(TokenKind::End) && !self.at(TokenKind::EndOfFile) {
            let inner_attrs = if self.at(TokenKind::BracketOpen) {
                self.parse_attributes()?
            } else {
                Vec::new()
            };
            let decl_id = match self.peek().kind {
                TokenKind::Declare | TokenKind::Sub | TokenKind::Function => {
                    self.parse_func_decl(inner_attrs, true)?
                }
                TokenKind::Dim => self.parse_var_decl(inner_attrs, true)?,
                _ => {
                    let bad = self.peek();
                    self.error(bad.span, "expected a declaration inside an EXTERN block");
                    return Err(ParseError);
                }
            };
            decls.push(decl_id);
            self.skip_stmt_ends();
        }
        self.expect(TokenKind::End)?;
        self.expect(TokenKind::Extern)?;
        let span = self.span_from(tok.span);
        Ok(self.ast.stmts.alloc(Stmt::Extern(ExternStmt { span, calling_conv, decls })))
    }

    fn parse_if_stmt(&mut self) -> PResult<StmtId> {
        let start = self.peek().span;
        self.bump(); // IF
        let mut blocks = Vec::new();
        let mut guard = Some(self.parse_condition_expr()?);
        self.expect(TokenKind::Then)?;

        loop {
            let block_start = self.last_span;
            if self.at(TokenKind::EndOfStmt) {
                self.bump();
                let body = self.parse_block_until(&[TokenKind::Else, TokenKind::End])?;
                let decls = self.decls_of(&body);
                blocks.push(IfBlock {
                    span: self.span_from(block_start),
                    guard: guard.take(),
                    decls,
                    body,
                });
                if self.eat(TokenKind::Else).is_some() {
                    if self.eat(TokenKind::If).is_some() {
                        guard = Some(self.parse_condition_expr()?);
                        self.expect(TokenKind::Then)?;
                        continue;
                    }
                    self.skip_stmt_ends();
                    let body = self.parse_block_until(&[TokenKind::End])?;
                    let decls = self.decls_of(&body);
                    blocks.push(IfBlock {
                        span: self.span_from(block_start),
                        guard: None,
                        decls,
                        body,
                    });
                }
                self.expect(TokenKind::End)?;
                self.expect(TokenKind::If)?;
                break;
            } else {
                // Single-line form: no END IF, each branch is one statement.
                let then_id = self.parse_stmt()?;
                blocks.push(IfBlock {
                    span: self.span_from(block_start),
                    guard: guard.take(),
                    decls: Vec::new(),
                    body: vec![then_id],
                });
                if self.eat(TokenKind::Else).is_some() {
                    let else_start = self.last_span;
                    let else_id = self.parse_stmt()?;
                    blocks.push(IfBlock {
                        span: self.span_from(else_start),
                        guard: None,
                        decls: Vec::new(),
                        body: vec![else_id],
                    });
                }
                break;
            }
        }

        let span = self.span_from(start);
        Ok(self.ast.stmts.alloc(Stmt::If(IfStmt { span, blocks })))
    }

    fn parse_condition_expr(&mut self) -> PResult<ExprId> {
        let flags = ExprFlags {
            allow_condition_and: true,
            ..Default::default()
        };
        self.parse_expr_with(flags, 0)
    }

    fn parse_for_stmt(&mut self) -> PResult<StmtId> {
        let tok = self.bump(); // FOR
        let name_tok = self.expect(TokenKind::Identifier)?;
        let iterator_name = self.name_of(name_tok);
        let type_expr = if self.eat(TokenKind::As).is_some() {
            Some(self.parse_type_expr()?)
        } else {
            None
        };
        self.expect(TokenKind::Assign)?;
        let from = self.parse_expr()?;
        self.expect(TokenKind::To)?;
        let to = self.parse_expr()?;
        let step = if self.eat(TokenKind::Step).is_some() {
            Some(self.parse_expr()?)
        } else {
            None
        };
        let iter_decl = self.ast.decls.alloc(Decl::Var(VarDecl {
            span: name_tok.span,
            name: iterator_name,
            name_span: name_tok.span,
            type_expr,
            init: None,
            attributes: Vec::new(),
            calling_conv: None,
            is_const: false,
            is_extern: false,
        }));
        let body = self.parse_block_until(&[TokenKind::Next])?;
        self.expect(TokenKind::Next)?;
        let next_name = self.eat(TokenKind::Identifier).map(|t| self.name_of(t));
        let span = self.span_from(tok.span);
        Ok(self.ast.stmts.alloc(Stmt::For(ForStmt {
            span,
            decls: vec![iter_decl],
            iterator_name,
            iterator_span: name_tok.span,
            from,
            to,
            step,
            body,
            next_name,
            direction: ForDirection::Unknown,
        })))
    }

    fn parse_do_loop_stmt(&mut self) -> PResult<StmtId> {
        let tok = self.bump(); // DO
        let mut condition = None;
        let mut condition_kind = None;
        let mut condition_pos = DoCondPos::None;
        if self.at(TokenKind::While) || self.at(TokenKind::Until) {
            let kw = self.bump();
            condition_kind = Some(if kw.kind == TokenKind::While {
                DoCondKind::While
            } else {
                DoCondKind::Until
            });
            condition = Some(self.parse_expr()?);
            condition_pos = DoCondPos::Pre;
        }
        let body = self.parse_block_until(&[TokenKind::Loop])?;
        self.expect(TokenKind::Loop)?;
        if condition_pos == DoCondPos::None && (self.at(TokenKind::While) || self.at(TokenKind::Until)) {
            let kw = self.bump();
            condition_kind = Some(if kw.kind == TokenKind::While {
                DoCondKind::While
            } else {
                DoCondKind::Until
            });
            condition = Some(self.parse_expr()?);
            condition_pos = DoCondPos::Post;
        }
        let span = self.span_from(tok.span);
        Ok(self.ast.stmts.alloc(Stmt::DoLoop(DoLoopStmt {
            span,
            body,
            condition,
            condition_kind,
            condition_pos,
        })))
    }

    fn parse_return_stmt(&mut self) -> PResult<StmtId> {
        let tok = self.bump(); // RETURN
        let expr = if matches!(self.peek().kind, TokenKind::EndOfStmt | TokenKind::EndOfFile | TokenKind::End) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        let span = self.span_from(tok.span);
        Ok(self.ast.stmts.alloc(Stmt::Return(ReturnStmt { span, expr })))
    }

    fn parse_continuation_stmt(&mut self) -> PResult<StmtId> {
        let tok = self.bump(); // EXIT or CONTINUE
        let kind = if tok.kind == TokenKind::Exit {
            ContinuationKind::Exit
        } else {
            ContinuationKind::Continue
        };
        let target_tok = self.peek();
        let target = match target_tok.kind {
            TokenKind::For => {
                self.bump();
                ControlFlowKind::For
            }
            TokenKind::Do => {
                self.bump();
                ControlFlowKind::Do
            }
            _ => {
                self.error(target_tok.span, "expected FOR or DO after EXIT/CONTINUE");
                return Err(ParseError);
            }
        };
        let span = self.span_from(tok.span);
        Ok(self.ast.stmts.alloc(Stmt::Continuation(ContinuationStmt { span, kind, target })))
    }

    fn parse_expr_stmt(&mut self) -> PResult<StmtId> {
        let start = self.peek().span;
        let flags = ExprFlags {
            stop_at_assign: true,
            call_without_parens: true,
            allow_condition_and: false,
        };
        let lhs = self.parse_expr_with(flags, 0)?;
        let expr = if self.at(TokenKind::Assign) {
            self.bump();
            let rhs = self.parse_expr()?;
            let span = self.span_from(start);
            self.ast.exprs.alloc(Expr::Assign(AssignExpr { span, lhs, rhs }))
        } else {
            lhs
        };
        let span = self.span_from(start);
        Ok(self.ast.stmts.alloc(Stmt::Expr(ExprStmt { span, expr })))
    }

    // ── Type expressions ─────────────────────────────────────────────────

    fn parse_type_expr(&mut self) -> PResult<TypeExprId> {
        let start = self.peek().span;
        let tok = self.peek();
        let kind = if tok.kind.is_builtin_type() || tok.kind == TokenKind::Any {
            self.bump();
            TypeExprKind::Builtin(tok.kind)
        } else if tok.kind == TokenKind::Identifier {
            self.bump();
            TypeExprKind::Named(self.name_of(tok))
        } else if tok.kind == TokenKind::TypeOf {
            self.bump();
            self.expect(TokenKind::ParenOpen)?;
            let expr = self.parse_expr()?;
            self.expect(TokenKind::ParenClose)?;
            TypeExprKind::TypeOf(expr)
        } else if matches!(tok.kind, TokenKind::Sub | TokenKind::Function) {
            self.bump();
            self.expect(TokenKind::ParenOpen)?;
            let mut params = Vec::new();
            let mut variadic = false;
            while !self.at(TokenKind::ParenClose) {
                if self.eat(TokenKind::Ellipsis).is_some() {
                    variadic = true;
                    break;
                }
                params.push(self.parse_type_expr()?);
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
            self.expect(TokenKind::ParenClose)?;
            let ret = if self.eat(TokenKind::As).is_some() {
                Some(self.parse_type_expr()?)
            } else {
                None
            };
            TypeExprKind::Function(params, ret, variadic)
        } else {
            self.error(tok.span, format!("expected a type, found {}", tok.kind.string()));
            return Err(ParseError);
        };

        let mut ptr_depth = 0u32;
        while self.eat(TokenKind::Ptr).is_some() {
            ptr_depth += 1;
        }
        let is_ref = self.eat(TokenKind::Ref).is_some();

        let span = self.span_from(start);
        Ok(self.ast.type_exprs.alloc(TypeExpr {
            span,
            kind,
            ptr_depth,
            is_ref,
        }))
    }

    // ── Expressions ──────────────────────────────────────────────────────

    fn parse_expr(&mut self) -> PResult<ExprId> {
        self.parse_expr_with(ExprFlags::default(), 0)
    }

    fn parse_expr_with(&mut self, flags: ExprFlags, min_prec: u8) -> PResult<ExprId> {
        let lhs = self.parse_unary_or_primary(flags)?;
        self.climb(lhs, min_prec, flags)
    }

    fn parse_unary_or_primary(&mut self, flags: ExprFlags) -> PResult<ExprId> {
        let tok = self.peek();
        let (retagged, prec) = match tok.kind {
            TokenKind::Minus => (TokenKind::Negate, 10),
            TokenKind::Multiply => (TokenKind::Dereference, 11),
            TokenKind::LogicalNot => (TokenKind::LogicalNot, 10),
            TokenKind::AddressOf => (TokenKind::AddressOf, 11),
            _ => return self.parse_primary(flags),
        };
        self.bump();
        let operand = self.parse_expr_with(flags.for_operand(), prec)?;
        let span = self.span_from(tok.span);
        let expr = match retagged {
            TokenKind::Dereference => Expr::Deref(DerefExpr { span, operand }),
            TokenKind::AddressOf => Expr::AddrOf(AddrOfExpr { span, operand }),
            op => Expr::Unary(UnaryExpr { span, op, operand }),
        };
        Ok(self.ast.exprs.alloc(expr))
    }

    fn parse_primary(&mut self, flags: ExprFlags) -> PResult<ExprId> {
        let tok = self.peek();
        match tok.kind {
            TokenKind::IntegerLiteral
            | TokenKind::FloatingPointLiteral
            | TokenKind::StringLiteral
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Null => {
                self.bump();
                let value = tok.value.unwrap_or(LiteralValue::Null);
                Ok(self.ast.exprs.alloc(Expr::Literal(LiteralExpr { span: tok.span, value })))
            }
            TokenKind::Identifier => {
                self.bump();
                let name = self.name_of(tok);
                let ident = self.ast.exprs.alloc(Expr::Ident(IdentExpr { span: tok.span, name }));
                if flags.call_without_parens && Self::starts_call_arg(self.peek().kind) {
                    self.parse_paren_free_call(ident, tok.span)
                } else {
                    Ok(ident)
                }
            }
            TokenKind::ParenOpen => {
                self.bump();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::ParenClose)?;
                Ok(inner)
            }
            TokenKind::SizeOf => {
                self.bump();
                self.expect(TokenKind::ParenOpen)?;
                let type_expr = self.parse_type_expr()?;
                self.expect(TokenKind::ParenClose)?;
                let span = self.span_from(tok.span);
                Ok(self.ast.exprs.alloc(Expr::SizeOf(SizeOfExpr { span, type_expr })))
            }
            TokenKind::If => {
                self.bump();
                let cond = self.parse_condition_expr()?;
                self.expect(TokenKind::Then)?;
                let then_expr = self.parse_expr()?;
                self.expect(TokenKind::Else)?;
                let else_expr = self.parse_expr()?;
                let span = self.span_from(tok.span);
                Ok(self.ast.exprs.alloc(Expr::If(IfExpr {
                    span,
                    cond,
                    then_expr,
                    else_expr,
                })))
            }
            _ => {
                self.error(tok.span, format!("expected expression, found {}", tok.kind.string()));
                Err(ParseError)
            }
        }
    }

    fn starts_call_arg(kind: TokenKind) -> bool {
        matches!(
            kind,
            TokenKind::IntegerLiteral
                | TokenKind::FloatingPointLiteral
                | TokenKind::StringLiteral
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
                | TokenKind::Identifier
                | TokenKind::ParenOpen
                | TokenKind::LogicalNot
                | TokenKind::AddressOf
                | TokenKind::SizeOf
        )
    }

    fn parse_paren_free_call(&mut self, callee: ExprId, start: Span) -> PResult<ExprId> {
        let mut args = Vec::new();
        let arg_flags = ExprFlags {
            stop_at_assign: true,
            ..Default::default()
        };
        loop {
            args.push(self.parse_expr_with(arg_flags, 0)?);
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        let span = self.span_from(start);
        Ok(self.ast.exprs.alloc(Expr::Call(CallExpr {
            span,
            callee,
            args,
            paren_free: true,
        })))
    }

    fn parse_call_suffix(&mut self, callee: ExprId) -> PResult<ExprId> {
        let start = self.ast.exprs.get(callee).span();
        self.expect(TokenKind::ParenOpen)?;
        let mut args = Vec::new();
        while !self.at(TokenKind::ParenClose) {
            args.push(self.parse_expr()?);
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::ParenClose)?;
        let span = self.span_from(start);
        Ok(self.ast.exprs.alloc(Expr::Call(CallExpr {
            span,
            callee,
            args,
            paren_free: false,
        })))
    }

    /// The precedence-climbing suffix/binary loop. `lhs` has already been
    /// parsed; this consumes operators whose precedence is at least
    /// `min_prec`, building up the expression left-to-right except where
    /// right-associativity (`IS`, `AS`, call) demands otherwise.
    fn climb(&mut self, mut lhs: ExprId, min_prec: u8, flags: ExprFlags) -> PResult<ExprId> {
        loop {
            let tok = self.peek();
            let mut kind = tok.kind;

            if flags.allow_condition_and && kind == TokenKind::Comma {
                kind = TokenKind::ConditionAnd;
            }
            if kind == TokenKind::Assign {
                if flags.stop_at_assign {
                    break;
                }
                kind = TokenKind::Equal;
            }

            if kind == TokenKind::ParenOpen {
                if TokenKind::ParenOpen.precedence().unwrap() < min_prec {
                    break;
                }
                lhs = self.parse_call_suffix(lhs)?;
                continue;
            }

            if kind == TokenKind::MemberAccess {
                if TokenKind::MemberAccess.precedence().unwrap() < min_prec {
                    break;
                }
                self.bump();
                let member_tok = self.expect(TokenKind::Identifier)?;
                let member = self.name_of(member_tok);
                let span = self.span_from(self.ast.exprs.get(lhs).span());
                lhs = self.ast.exprs.alloc(Expr::Member(MemberExpr {
                    span,
                    lhs,
                    member,
                    member_span: member_tok.span,
                }));
                continue;
            }

            if kind == TokenKind::As {
                let prec = TokenKind::As.precedence().unwrap();
                if prec < min_prec {
                    break;
                }
                self.bump();
                let type_expr = self.parse_type_expr()?;
                let span = self.span_from(self.ast.exprs.get(lhs).span());
                lhs = self.ast.exprs.alloc(Expr::Cast(CastExpr {
                    span,
                    operand: lhs,
                    type_expr: Some(type_expr),
                    implicit: false,
                }));
                continue;
            }

            if kind == TokenKind::Is {
                let prec = TokenKind::Is.precedence().unwrap();
                if prec < min_prec {
                    break;
                }
                self.bump();
                let rhs = self.parse_expr_with(flags.for_operand(), prec)?;
                let span = self.span_from(self.ast.exprs.get(lhs).span());
                lhs = self.ast.exprs.alloc(Expr::Binary(BinaryExpr {
                    span,
                    op: TokenKind::Is,
                    lhs,
                    rhs,
                }));
                continue;
            }

            let is_binary_like = kind.is_binary() && kind != TokenKind::MemberAccess;
            if is_binary_like {
                let prec = kind.precedence().unwrap();
                if prec < min_prec {
                    break;
                }
                self.bump();
                let next_min = if kind.is_right_associative() { prec } else { prec + 1 };
                let rhs = self.parse_expr_with(flags.for_operand(), next_min)?;
                let op = if kind == TokenKind::ConditionAnd {
                    TokenKind::LogicalAnd
                } else {
                    kind
                };
                let span = self.span_from(self.ast.exprs.get(lhs).span());
                lhs = self.ast.exprs.alloc(Expr::Binary(BinaryExpr { span, op, lhs, rhs }));
                continue;
            }

            break;
        }
        Ok(lhs)
    }
}
