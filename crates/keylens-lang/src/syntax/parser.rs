use crate::syntax::ast::*;
use crate::error::{Error, ErrorCode};
use crate::syntax::token::{Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn parse(mut self) -> Result<Program, Vec<Error>> {
        let mut errors = Vec::new();
        let mut items = Vec::new();

        while !self.is_at_end() {
            let pos_before = self.pos;

            let item = match self.peek_kind() {
                TokenKind::At | TokenKind::Struct | TokenKind::Class => {
                    self.parse_type_decl().map(Item::TypeDecl)
                }
                TokenKind::Fn => self.parse_fn_def().map(Item::FnDef),
                TokenKind::Semicolon => { self.advance(); continue; }
                _ => self.parse_stmt().map(Item::Stmt),
            };
            match item {
                Ok(item) => items.push(item),
                Err(e) => { errors.push(e); self.recover(); }
            }

            // guarantee progress: if nothing was consumed, force-advance
            // to prevent an infinite loop on unrecognised tokens
            if self.pos == pos_before {
                self.advance();
            }
        }

        if errors.is_empty() {
            Ok(Program { items })
        } else {
            Err(errors)
        }
    }

    // ─── Type declarations ───────────────────────────────────────────────────

    fn parse_type_decl(&mut self) -> Result<TypeDecl, Error> {
        let mut attributes = Vec::new();
        while self.check(TokenKind::At) {
            let span = self.span();
            self.advance();
            let name = self.expect_ident()?;
            attributes.push(Attribute { name, span });
        }

        let span = self.span();
        let tok = self.advance();
        let kind = match tok.kind {
            TokenKind::Struct => DeclKind::Struct,
            TokenKind::Class  => DeclKind::Class,
            _ => return Err(self.error_at(&tok, "expected `struct` or `class` after attribute")),
        };
        let name = self.expect_ident()?;
        let generics = self.parse_generic_params()?;
        let superclass = if self.matches(TokenKind::Colon) { Some(self.parse_type()?) } else { None };

        self.expect(TokenKind::LBrace)?;
        let mut members = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            if self.matches(TokenKind::Semicolon) { continue; }
            members.push(self.parse_member()?);
        }
        self.expect(TokenKind::RBrace)?;

        Ok(TypeDecl { attributes, kind, name, generics, superclass, members, span })
    }

    /// `<T, U>`, empty when absent.
    fn parse_generic_params(&mut self) -> Result<Vec<String>, Error> {
        let mut params = Vec::new();
        if self.matches(TokenKind::Lt) {
            while !self.check(TokenKind::Gt) && !self.is_at_end() {
                params.push(self.expect_ident()?);
                if !self.matches(TokenKind::Comma) { break; }
            }
            self.expect(TokenKind::Gt)?;
        }
        Ok(params)
    }

    fn parse_member(&mut self) -> Result<MemberDecl, Error> {
        match self.peek_kind() {
            TokenKind::Let | TokenKind::Var => self.parse_property().map(MemberDecl::Property),
            TokenKind::Subscript => self.parse_subscript().map(MemberDecl::Subscript),
            _ => Err(self.unexpected("`let`, `var` or `subscript`")),
        }
    }

    fn parse_property(&mut self) -> Result<PropertyDecl, Error> {
        let span = self.span();
        let is_var = self.advance().kind == TokenKind::Var;
        let name = self.expect_ident()?;
        self.expect(TokenKind::Colon)?;
        let ty = self.parse_type()?;
        let accessors = if self.check(TokenKind::LBrace) { Some(self.parse_accessors()?) } else { None };
        Ok(PropertyDecl { name, ty, is_var, accessors, span })
    }

    fn parse_subscript(&mut self) -> Result<SubscriptDecl, Error> {
        let span = self.span();
        self.expect(TokenKind::Subscript)?;
        let generics = self.parse_generic_params()?;
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        while !self.check(TokenKind::RParen) && !self.is_at_end() {
            let span = self.span();
            let first = self.expect_ident()?;
            // `label name: T` or `name: T`
            let (label, name) = if self.check(TokenKind::Colon) {
                (None, first)
            } else {
                (Some(first), self.expect_ident()?)
            };
            self.expect(TokenKind::Colon)?;
            let ty = self.parse_type()?;
            params.push(SubscriptParam { label, name, ty, span });
            if !self.matches(TokenKind::Comma) { break; }
        }
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::Arrow)?;
        let ret = self.parse_type()?;
        let accessors = self.parse_accessors()?;
        Ok(SubscriptDecl { generics, params, ret, accessors, span })
    }

    /// `{ get }` or `{ get set }`
    fn parse_accessors(&mut self) -> Result<Accessors, Error> {
        self.expect(TokenKind::LBrace)?;
        self.expect(TokenKind::Get)?;
        let set = self.matches(TokenKind::Set);
        self.expect(TokenKind::RBrace)?;
        Ok(Accessors { set })
    }

    // ─── Functions ───────────────────────────────────────────────────────────

    fn parse_fn_def(&mut self) -> Result<FnDef, Error> {
        let span = self.span();
        self.expect(TokenKind::Fn)?;
        let name = self.expect_ident()?;
        self.expect(TokenKind::LParen)?;
        let params = self.parse_param_list()?;
        self.expect(TokenKind::RParen)?;
        let body = self.parse_block()?;
        Ok(FnDef { name, params, body, span })
    }

    fn parse_param_list(&mut self) -> Result<Vec<Param>, Error> {
        let mut params = Vec::new();
        while !self.check(TokenKind::RParen) && !self.is_at_end() {
            let span = self.span();
            let name = self.expect_ident()?;
            self.expect(TokenKind::Colon)?;
            let is_inout = self.matches(TokenKind::Inout);
            let ty = self.parse_type()?;
            params.push(Param { name, ty, is_inout, span });
            if !self.matches(TokenKind::Comma) { break; }
        }
        Ok(params)
    }

    // ─── Statements ──────────────────────────────────────────────────────────

    fn parse_block(&mut self) -> Result<Vec<Stmt>, Error> {
        self.expect(TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            if self.matches(TokenKind::Semicolon) { continue; }
            stmts.push(self.parse_stmt()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> Result<Stmt, Error> {
        match self.peek_kind() {
            TokenKind::Let | TokenKind::Var => self.parse_var_decl(),
            _ => {
                let span = self.span();
                let expr = self.parse_expr()?;
                if self.matches(TokenKind::Eq) {
                    let value = self.parse_expr()?;
                    Ok(Stmt::Assign(Assign { target: expr, value, span }))
                } else {
                    Ok(Stmt::Expr(expr))
                }
            }
        }
    }

    fn parse_var_decl(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        let is_var = self.advance().kind == TokenKind::Var;
        let name = self.expect_ident()?;
        let ty = if self.matches(TokenKind::Colon) { Some(self.parse_type()?) } else { None };
        let initializer = if self.matches(TokenKind::Eq) { Some(self.parse_expr()?) } else { None };
        if ty.is_none() && initializer.is_none() {
            return Err(self.unexpected("type annotation or initializer"));
        }
        Ok(Stmt::VarDecl(VarDecl { name, ty, is_var, initializer, span }))
    }

    // ─── Expressions ─────────────────────────────────────────────────────────

    fn parse_expr(&mut self) -> Result<Expr, Error> {
        self.parse_range()
    }

    fn parse_range(&mut self) -> Result<Expr, Error> {
        let start = self.parse_postfix()?;
        if self.check(TokenKind::DotDotLt) {
            let span = start.span().clone();
            self.advance();
            let end = self.parse_postfix()?;
            return Ok(Expr::Range { start: Box::new(start), end: Box::new(end), span });
        }
        Ok(start)
    }

    fn parse_postfix(&mut self) -> Result<Expr, Error> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.peek_kind() {
                // member access: expr.name
                TokenKind::Dot => {
                    let span = self.span();
                    self.advance();
                    let name = self.expect_ident()?;
                    expr = Expr::Member { expr: Box::new(expr), name, span };
                }

                // subscript: expr[i]
                TokenKind::LBracket => {
                    let span = self.span();
                    self.advance();
                    let index = self.parse_expr()?;
                    self.expect(TokenKind::RBracket)?;
                    expr = Expr::Index { expr: Box::new(expr), index: Box::new(index), span };
                }

                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, Error> {
        let tok = self.peek().clone();
        let span = Span::new(tok.line, tok.column);

        match tok.kind {
            TokenKind::Int(v)       => { self.advance(); Ok(Expr::Int(v, span)) }
            TokenKind::Float(v)     => { self.advance(); Ok(Expr::Float(v, span)) }
            TokenKind::Bool(v)      => { self.advance(); Ok(Expr::Bool(v, span)) }
            TokenKind::StringLit(s) => { self.advance(); Ok(Expr::StringLit(s, span)) }
            TokenKind::Ident(name)  => { self.advance(); Ok(Expr::Ident(name, span)) }

            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }

            TokenKind::Backslash => self.parse_key_path(),

            _ => Err(self.unexpected("expression")),
        }
    }

    /// `\Root.member[index]...` with at least one component.
    fn parse_key_path(&mut self) -> Result<Expr, Error> {
        let span = self.span();
        self.expect(TokenKind::Backslash)?;
        let root = self.parse_type()?;
        let mut components = Vec::new();
        loop {
            let span = self.span();
            if self.matches(TokenKind::Dot) {
                components.push(KeyPathComponent::Member(self.expect_ident()?, span));
            } else if self.matches(TokenKind::LBracket) {
                let index = self.parse_expr()?;
                self.expect(TokenKind::RBracket)?;
                components.push(KeyPathComponent::Index(index, span));
            } else {
                break;
            }
        }
        if components.is_empty() {
            return Err(self.unexpected("key path component"));
        }
        Ok(Expr::KeyPath { root, components, span })
    }

    // ─── Types ───────────────────────────────────────────────────────────────

    fn parse_type(&mut self) -> Result<TypeExpr, Error> {
        let span = self.span();
        let tok = self.advance();
        match &tok.kind {
            // [T] or [K: V]
            TokenKind::LBracket => {
                let first = self.parse_type()?;
                let ty = if self.matches(TokenKind::Colon) {
                    let value = self.parse_type()?;
                    TypeExpr::Dictionary(Box::new(first), Box::new(value), span)
                } else {
                    TypeExpr::Array(Box::new(first), span)
                };
                self.expect(TokenKind::RBracket)?;
                Ok(ty)
            }

            // Name or Name<A, B>
            TokenKind::Ident(name) => {
                let mut args = Vec::new();
                if self.matches(TokenKind::Lt) {
                    while !self.check(TokenKind::Gt) && !self.is_at_end() {
                        args.push(self.parse_type()?);
                        if !self.matches(TokenKind::Comma) { break; }
                    }
                    self.expect(TokenKind::Gt)?;
                }
                Ok(TypeExpr::Named { name: name.clone(), args, span })
            }

            _ => Err(self.error_at(&tok, "expected type")),
        }
    }

    // ─── Token primitives ────────────────────────────────────────────────────

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_kind(&self) -> TokenKind {
        self.tokens[self.pos].kind.clone()
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() { self.pos += 1; }
        tok
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) { self.advance(); true } else { false }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, Error> {
        if self.check(kind.clone()) {
            Ok(self.advance())
        } else {
            let tok = self.peek();
            Err(Error::new(
                ErrorCode::P002,
                tok.line,
                tok.column,
                format!("expected {:?}, found {:?}", kind, tok.kind),
            ))
        }
    }

    fn expect_ident(&mut self) -> Result<String, Error> {
        let tok = self.advance();
        match &tok.kind {
            TokenKind::Ident(s) => Ok(s.clone()),
            _ => Err(self.error_at(&tok, "expected identifier")),
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    fn span(&self) -> Span {
        let tok = self.peek();
        Span::new(tok.line, tok.column)
    }

    fn unexpected(&self, expected: &str) -> Error {
        let tok = self.peek();
        Error::new(
            ErrorCode::P001,
            tok.line,
            tok.column,
            format!("expected {}, found {:?}", expected, tok.kind),
        )
    }

    fn error_at(&self, tok: &Token, msg: &str) -> Error {
        Error::new(ErrorCode::P001, tok.line, tok.column, msg)
    }

    /// Skip tokens until we find something that looks like a new item.
    /// Used after a parse error to attempt recovery.
    fn recover(&mut self) {
        loop {
            match self.peek_kind() {
                TokenKind::Eof
                | TokenKind::Let
                | TokenKind::Var
                | TokenKind::Fn
                | TokenKind::Struct
                | TokenKind::Class
                | TokenKind::At => break,
                TokenKind::RBrace => { self.advance(); break; }
                _ => { self.advance(); }
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::lexer::Lexer;

    fn parse(src: &str) -> Program {
        let tokens = Lexer::new(src).tokenize().expect("lex failed");
        Parser::new(tokens).parse().expect("parse failed")
    }

    fn parse_err(src: &str) -> Vec<Error> {
        let tokens = Lexer::new(src).tokenize().expect("lex failed");
        Parser::new(tokens).parse().expect_err("expected parse failure")
    }

    fn only_decl(p: &Program) -> &TypeDecl {
        match &p.items[0] {
            Item::TypeDecl(d) => d,
            other => panic!("expected TypeDecl, got {other:?}"),
        }
    }

    #[test]
    fn struct_with_stored_properties() {
        let p = parse("struct Point { let x: Int\n var y: Int }");
        let d = only_decl(&p);
        assert_eq!(d.kind, DeclKind::Struct);
        assert_eq!(d.name, "Point");
        assert_eq!(d.members.len(), 2);
        match &d.members[0] {
            MemberDecl::Property(p) => {
                assert_eq!(p.name, "x");
                assert!(!p.is_var);
                assert!(p.accessors.is_none());
            }
            _ => panic!("expected property"),
        }
    }

    #[test]
    fn computed_property_accessors() {
        let p = parse("struct S { var count: Int { get } var z: Int { get set } }");
        let d = only_decl(&p);
        match (&d.members[0], &d.members[1]) {
            (MemberDecl::Property(a), MemberDecl::Property(b)) => {
                assert_eq!(a.accessors, Some(Accessors { set: false }));
                assert_eq!(b.accessors, Some(Accessors { set: true }));
            }
            _ => panic!("expected properties"),
        }
    }

    #[test]
    fn dynamic_member_lookup_struct() {
        let src = "
@dynamicMemberLookup
struct Lens<T> {
    var obj: T
    subscript<U>(dynamicMember member: KeyPath<T, U>) -> Lens<U> { get }
    subscript<U>(dynamicMember member: WritableKeyPath<T, U>) -> Lens<U> { get set }
    subscript(dynamicMember member: String) -> Lens<Int> { get }
}";
        let p = parse(src);
        let d = only_decl(&p);
        assert!(d.has_attribute("dynamicMemberLookup"));
        assert_eq!(d.generics, vec!["T".to_string()]);
        assert_eq!(d.members.len(), 4);
        match &d.members[2] {
            MemberDecl::Subscript(s) => {
                assert_eq!(s.generics, vec!["U".to_string()]);
                assert_eq!(s.params[0].label.as_deref(), Some("dynamicMember"));
                assert_eq!(s.params[0].name, "member");
                assert!(s.accessors.set);
                match &s.params[0].ty {
                    TypeExpr::Named { name, args, .. } => {
                        assert_eq!(name, "WritableKeyPath");
                        assert_eq!(args.len(), 2);
                    }
                    other => panic!("unexpected type {other:?}"),
                }
            }
            _ => panic!("expected subscript"),
        }
    }

    #[test]
    fn unlabelled_subscript_param() {
        let p = parse("struct S { subscript(foo: String) -> Int { get } }");
        match &only_decl(&p).members[0] {
            MemberDecl::Subscript(s) => {
                assert!(s.params[0].label.is_none());
                assert_eq!(s.params[0].name, "foo");
            }
            _ => panic!("expected subscript"),
        }
    }

    #[test]
    fn class_with_superclass() {
        let p = parse("class C<T>: A<T> { var x: Float }");
        let d = only_decl(&p);
        assert_eq!(d.kind, DeclKind::Class);
        match &d.superclass {
            Some(TypeExpr::Named { name, args, .. }) => {
                assert_eq!(name, "A");
                assert_eq!(args.len(), 1);
            }
            other => panic!("unexpected superclass {other:?}"),
        }
    }

    #[test]
    fn collection_type_sugar() {
        let p = parse("let a: [Int]\nlet d: [String: Int]");
        match (&p.items[0], &p.items[1]) {
            (Item::Stmt(Stmt::VarDecl(a)), Item::Stmt(Stmt::VarDecl(d))) => {
                assert!(matches!(a.ty, Some(TypeExpr::Array(..))));
                assert!(matches!(d.ty, Some(TypeExpr::Dictionary(..))));
            }
            _ => panic!("expected two VarDecls"),
        }
    }

    #[test]
    fn member_chain_and_discard_assign() {
        let p = parse("_ = lens.topLeft.x");
        match &p.items[0] {
            Item::Stmt(Stmt::Assign(a)) => {
                assert!(a.target.is_discard());
                match &a.value {
                    Expr::Member { expr, name, .. } => {
                        assert_eq!(name, "x");
                        assert!(matches!(**expr, Expr::Member { .. }));
                    }
                    other => panic!("unexpected value {other:?}"),
                }
            }
            _ => panic!("expected Assign"),
        }
    }

    #[test]
    fn subscript_assignment_target() {
        let p = parse("dict[\"ultimate question\"] = 42");
        match &p.items[0] {
            Item::Stmt(Stmt::Assign(a)) => {
                assert!(matches!(a.target, Expr::Index { .. }));
                assert!(matches!(a.value, Expr::Int(42, _)));
            }
            _ => panic!("expected Assign"),
        }
    }

    #[test]
    fn range_inside_subscript() {
        let p = parse("arr[0..<3]");
        match &p.items[0] {
            Item::Stmt(Stmt::Expr(Expr::Index { index, .. })) => {
                assert!(matches!(**index, Expr::Range { .. }));
            }
            _ => panic!("expected Index"),
        }
    }

    #[test]
    fn key_path_literal() {
        let p = parse("let k = \\Rectangle.topLeft.x");
        match &p.items[0] {
            Item::Stmt(Stmt::VarDecl(v)) => match &v.initializer {
                Some(Expr::KeyPath { root, components, .. }) => {
                    assert_eq!(root, &TypeExpr::named("Rectangle", root.span().clone()));
                    assert_eq!(components.len(), 2);
                }
                other => panic!("unexpected initializer {other:?}"),
            },
            _ => panic!("expected VarDecl"),
        }
    }

    #[test]
    fn function_with_inout_param() {
        let p = parse("fn f(a: SubscriptLens<[Int]>, d: inout SubscriptLens<[String: Int]>) { _ = a[0] }");
        match &p.items[0] {
            Item::FnDef(f) => {
                assert_eq!(f.params.len(), 2);
                assert!(!f.params[0].is_inout);
                assert!(f.params[1].is_inout);
                assert_eq!(f.body.len(), 1);
            }
            _ => panic!("expected FnDef"),
        }
    }

    #[test]
    fn statements_need_no_separator() {
        let p = parse("let a: Int\nvar b = a\nb = a");
        assert_eq!(p.items.len(), 3);
    }

    #[test]
    fn error_binding_without_type_or_value() {
        let errs = parse_err("let x");
        assert!(!errs.is_empty());
    }

    #[test]
    fn error_key_path_without_components() {
        let errs = parse_err("let k = \\Point");
        assert_eq!(errs[0].code, ErrorCode::P001);
    }

    #[test]
    fn error_subscript_without_accessors() {
        let errs = parse_err("struct S { subscript(i: Int) -> Int }");
        assert!(!errs.is_empty());
    }

    #[test]
    fn error_recovery_continues_after_bad_item() {
        let tokens = Lexer::new("struct { }\nlet x: Int").tokenize().expect("lex failed");
        let errs = Parser::new(tokens).parse().expect_err("expected failure");
        assert_eq!(errs.len(), 1);
    }
}
