use crate::language::{
    ast::*,
    errors::{ParseError, SyntaxError},
    lexer::Lexer,
    token::{Token, TokenKind},
};
use crate::stack::ensure_sufficient_stack;
use std::rc::Rc;

// Grammar, loosest binding first:
//
//   Unit  := TStmt*
//   TStmt := Func | Stmt
//   Func  := 'function' ident '(' [ident (',' ident)*] ')' Block
//   Block := '{' Stmt* '}'
//   Stmt  := 'var' ident ';'
//          | 'if' '(' A ')' Block ['else' Block]
//          | 'while' '(' A ')' Block
//          | A ';'
//   A     := ident '=' A | L
//   L     := R [('&&' | '||') R]
//   R     := E [('<' | '<=' | '>' | '>=' | '==' | '!=') E]
//   E     := T (('+' | '-') T)*
//   T     := F (('*' | '/') F)*
//   F     := int | string | ident | ident '(' [L (',' L)*] ')' | '(' A ')'

pub fn parse_source(source: &str, file: &str) -> Result<Unit, ParseError> {
    Parser::new(Lexer::new(source, file)).parse()
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(lexer: Lexer<'a>) -> Self {
        Self { lexer }
    }

    pub fn parse(mut self) -> Result<Unit, ParseError> {
        let mut items = Vec::new();
        while self.lexer.peek_kind(1)?.is_some() {
            items.push(self.parse_top_level()?);
        }
        tracing::debug!(items = items.len(), "parsed unit");
        Ok(Unit { items })
    }

    fn parse_top_level(&mut self) -> Result<TopLevel, ParseError> {
        if self.check(TokenKind::Function)? {
            let def = self.parse_function()?;
            tracing::debug!(name = %def.name.name, params = def.params.len(), "parsed function");
            return Ok(TopLevel::Function(Rc::new(def)));
        }
        self.parse_statement().map(TopLevel::Stmt)
    }

    fn parse_function(&mut self) -> Result<FunctionDef, ParseError> {
        let keyword = self.expect(TokenKind::Function)?;
        let name = self.expect_identifier()?;
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen)? {
            loop {
                params.push(self.expect_identifier()?);
                if !self.matches(TokenKind::Comma)? {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;
        let body = self.parse_block()?;
        Ok(FunctionDef {
            name,
            params,
            body,
            location: keyword.location,
        })
    }

    fn parse_block(&mut self) -> Result<Block, ParseError> {
        self.expect(TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RBrace)? {
            stmts.push(self.parse_statement()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Block { stmts })
    }

    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        match self.lexer.peek_kind(1)? {
            None => Err(self.end_of_input("a statement")),
            Some(TokenKind::Var) => {
                let keyword = self.advance()?;
                let name = self.expect_identifier()?;
                self.expect(TokenKind::Semi)?;
                Ok(Stmt::VarDef {
                    name,
                    location: keyword.location,
                })
            }
            Some(TokenKind::If) => {
                let keyword = self.advance()?;
                self.expect(TokenKind::LParen)?;
                let cond = self.parse_assignment()?;
                self.expect(TokenKind::RParen)?;
                let then_block = self.parse_block()?;
                let else_block = if self.matches(TokenKind::Else)? {
                    Some(self.parse_block()?)
                } else {
                    None
                };
                Ok(Stmt::If {
                    cond,
                    then_block,
                    else_block,
                    location: keyword.location,
                })
            }
            Some(TokenKind::While) => {
                let keyword = self.advance()?;
                self.expect(TokenKind::LParen)?;
                let cond = self.parse_assignment()?;
                self.expect(TokenKind::RParen)?;
                let body = self.parse_block()?;
                Ok(Stmt::While {
                    cond,
                    body,
                    location: keyword.location,
                })
            }
            Some(_) => {
                let expr = self.parse_assignment()?;
                self.expect(TokenKind::Semi)?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    fn parse_assignment(&mut self) -> Result<Expr, ParseError> {
        ensure_sufficient_stack(|| self.parse_assignment_inner())
    }

    /// `ident = A` needs two tokens of lookahead to tell apart from an `L`
    /// that merely starts with an identifier.
    fn parse_assignment_inner(&mut self) -> Result<Expr, ParseError> {
        if self.lexer.peek_kind(1)? == Some(TokenKind::Identifier)
            && self.lexer.peek_kind(2)? == Some(TokenKind::Eq)
        {
            let target = self.expect_identifier()?;
            let eq = self.advance()?;
            let value = self.parse_assignment()?;
            return Ok(Expr::Assign {
                target,
                value: Box::new(value),
                location: eq.location,
            });
        }
        self.parse_logical()
    }

    fn parse_logical(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_relational()?;
        let op = match self.lexer.peek_kind(1)? {
            Some(TokenKind::AmpersandAmpersand) => BinaryOp::And,
            Some(TokenKind::PipePipe) => BinaryOp::Or,
            _ => return Ok(left),
        };
        let op_token = self.advance()?;
        let right = self.parse_relational()?;
        Ok(binary(op, left, right, op_token))
    }

    fn parse_relational(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_additive()?;
        let op = match self.lexer.peek_kind(1)? {
            Some(TokenKind::Lt) => BinaryOp::Lt,
            Some(TokenKind::LtEq) => BinaryOp::LtEq,
            Some(TokenKind::Gt) => BinaryOp::Gt,
            Some(TokenKind::GtEq) => BinaryOp::GtEq,
            Some(TokenKind::EqEq) => BinaryOp::Eq,
            Some(TokenKind::BangEq) => BinaryOp::NotEq,
            _ => return Ok(left),
        };
        let op_token = self.advance()?;
        let right = self.parse_additive()?;
        Ok(binary(op, left, right, op_token))
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_term()?;
        loop {
            let op = match self.lexer.peek_kind(1)? {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Sub,
                _ => return Ok(expr),
            };
            let op_token = self.advance()?;
            let right = self.parse_term()?;
            expr = binary(op, expr, right, op_token);
        }
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            let op = match self.lexer.peek_kind(1)? {
                Some(TokenKind::Star) => BinaryOp::Mul,
                Some(TokenKind::Slash) => BinaryOp::Div,
                _ => return Ok(expr),
            };
            let op_token = self.advance()?;
            let right = self.parse_primary()?;
            expr = binary(op, expr, right, op_token);
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        ensure_sufficient_stack(|| self.parse_primary_inner())
    }

    fn parse_primary_inner(&mut self) -> Result<Expr, ParseError> {
        let Some(kind) = self.lexer.peek_kind(1)? else {
            return Err(self.end_of_input("a primary expression"));
        };
        match kind {
            TokenKind::Identifier if self.lexer.peek_kind(2)? == Some(TokenKind::LParen) => {
                let callee = self.expect_identifier()?;
                self.expect(TokenKind::LParen)?;
                let mut args = Vec::new();
                if !self.check(TokenKind::RParen)? {
                    loop {
                        args.push(self.parse_logical()?);
                        if !self.matches(TokenKind::Comma)? {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RParen)?;
                let location = callee.location.clone();
                Ok(Expr::Call {
                    callee,
                    args,
                    location,
                })
            }
            TokenKind::Identifier => Ok(Expr::VarRef(self.expect_identifier()?)),
            TokenKind::Integer => {
                let token = self.advance()?;
                Ok(Expr::IntLiteral {
                    text: token.lexeme,
                    location: token.location,
                })
            }
            TokenKind::String => {
                let token = self.advance()?;
                Ok(Expr::StringLiteral {
                    value: token.lexeme,
                    location: token.location,
                })
            }
            TokenKind::LParen => {
                self.advance()?;
                let expr = self.parse_assignment()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            _ => {
                let token = self.advance()?;
                Err(unexpected(&token).with_help("expected an expression").into())
            }
        }
    }

    fn expect_identifier(&mut self) -> Result<Identifier, ParseError> {
        let token = self.expect(TokenKind::Identifier)?;
        Ok(Identifier {
            name: token.lexeme,
            location: token.location,
        })
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.lexer.peek_kind(1)?.is_none() {
            return Err(self.end_of_input(kind.describe()));
        }
        let token = self.advance()?;
        if token.kind == kind {
            Ok(token)
        } else {
            Err(unexpected(&token)
                .with_help(format!("expected {}", kind.describe()))
                .into())
        }
    }

    fn matches(&mut self, kind: TokenKind) -> Result<bool, ParseError> {
        if self.check(kind)? {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn check(&mut self, kind: TokenKind) -> Result<bool, ParseError> {
        Ok(self.lexer.peek_kind(1)? == Some(kind))
    }

    fn advance(&mut self) -> Result<Token, ParseError> {
        self.lexer.next()
    }

    fn end_of_input(&self, looking_for: &str) -> ParseError {
        SyntaxError::new(
            format!("Unexpected end of input looking for {}", looking_for),
            self.lexer.current_location(),
        )
        .into()
    }
}

fn unexpected(token: &Token) -> SyntaxError {
    SyntaxError::new(
        format!("Unexpected token '{}'", token.lexeme),
        token.location.clone(),
    )
}

fn binary(op: BinaryOp, left: Expr, right: Expr, op_token: Token) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
        location: op_token.location,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::printer::print_unit;
    use pretty_assertions::assert_eq;

    fn tree(source: &str) -> String {
        print_unit(&parse_source(source, "test.tly").expect("parse"))
    }

    fn syntax_error(source: &str) -> SyntaxError {
        match parse_source(source, "test.tly") {
            Err(ParseError::Syntax(err)) => err,
            other => panic!("expected syntax error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn deeply_nested_expressions_parse() {
        let depth = 5000;
        let source = format!("{}1{};", "(".repeat(depth), ")".repeat(depth));
        assert!(parse_source(&source, "test.tly").is_ok());

        let depth = 2000;
        let source = format!("{}0{};", "f(".repeat(depth), ")".repeat(depth));
        assert!(parse_source(&source, "test.tly").is_ok());

        let depth = 200;
        let source = format!("{}0{};", "f(".repeat(depth), ")".repeat(depth));
        assert_eq!(tree(&source).matches("FNCALL").count(), depth);
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        assert_eq!(
            tree("1 + 2 * 3;"),
            "UNIT\n\
             +--STATEMENT\n   \
                +--ADD\n      \
                   +--INT_LITERAL[1]\n      \
                   +--MULTIPLY\n         \
                      +--INT_LITERAL[2]\n         \
                      +--INT_LITERAL[3]\n"
        );
    }

    #[test]
    fn additive_operators_are_left_associative() {
        assert_eq!(
            tree("a - b - c;"),
            "UNIT\n\
             +--STATEMENT\n   \
                +--SUB\n      \
                   +--SUB\n      \
                   |  +--VARREF[a]\n      \
                   |  +--VARREF[b]\n      \
                   +--VARREF[c]\n"
        );
    }

    #[test]
    fn assignment_is_right_associative() {
        assert_eq!(
            tree("a = b = 1;"),
            "UNIT\n\
             +--STATEMENT\n   \
                +--ASSIGN\n      \
                   +--VARREF[a]\n      \
                   +--ASSIGN\n         \
                      +--VARREF[b]\n         \
                      +--INT_LITERAL[1]\n"
        );
    }

    #[test]
    fn identifier_followed_by_paren_is_a_call() {
        assert_eq!(
            tree("f(1, \"s\");"),
            "UNIT\n\
             +--STATEMENT\n   \
                +--FNCALL\n      \
                   +--VARREF[f]\n      \
                   +--ARGLIST\n         \
                      +--INT_LITERAL[1]\n         \
                      +--STRING_LITERAL[s]\n"
        );
    }

    #[test]
    fn bare_identifier_is_a_reference() {
        assert_eq!(tree("f;"), "UNIT\n+--STATEMENT\n   +--VARREF[f]\n");
        // Only `ident (` starts a call; a parenthesized callee does not.
        assert_eq!(syntax_error("(f)(1);").message, "Unexpected token '('");
    }

    #[test]
    fn relational_and_logical_operators_do_not_chain() {
        assert_eq!(syntax_error("a < b < c;").message, "Unexpected token '<'");
        assert_eq!(syntax_error("a && b && c;").message, "Unexpected token '&&'");
        assert_eq!(syntax_error("(a || b || c);").message, "Unexpected token '||'");
    }

    #[test]
    fn binary_node_takes_operator_location() {
        let unit = parse_source("x =\n  1 +\n 2;", "test.tly").expect("parse");
        let TopLevel::Stmt(Stmt::Expr(Expr::Assign { value, location, .. })) = &unit.items[0] else {
            panic!("expected assignment");
        };
        assert_eq!((location.line, location.column), (1, 3));
        let Expr::Binary { location, .. } = value.as_ref() else {
            panic!("expected binary");
        };
        assert_eq!((location.line, location.column), (2, 5));
    }

    #[test]
    fn control_flow_and_functions() {
        assert_eq!(
            tree("function f(a, b) { var c; } if (x) { } else { y; } while (1) { z; }"),
            "UNIT\n\
             +--FUNCTION\n\
             |  +--VARREF[f]\n\
             |  +--PARAMETER_LIST\n\
             |  |  +--VARREF[a]\n\
             |  |  +--VARREF[b]\n\
             |  +--STATEMENT_LIST\n\
             |     +--STATEMENT\n\
             |        +--VARDEF\n\
             |           +--VARREF[c]\n\
             +--STATEMENT\n\
             |  +--IF\n\
             |     +--VARREF[x]\n\
             |     +--STATEMENT_LIST\n\
             |     +--STATEMENT_LIST\n\
             |        +--STATEMENT\n\
             |           +--VARREF[y]\n\
             +--STATEMENT\n   \
                +--WHILE\n      \
                   +--INT_LITERAL[1]\n      \
                   +--STATEMENT_LIST\n         \
                      +--STATEMENT\n            \
                         +--VARREF[z]\n"
        );
    }

    #[test]
    fn empty_source_is_an_empty_unit() {
        assert!(parse_source("  \n", "test.tly").expect("parse").items.is_empty());
    }

    #[test]
    fn functions_are_only_allowed_at_top_level() {
        let err = syntax_error("if (1) { function g() { } }");
        assert_eq!(err.message, "Unexpected token 'function'");
    }

    #[test]
    fn premature_end_of_input_is_reported() {
        assert_eq!(
            syntax_error("var x").message,
            "Unexpected end of input looking for ';'"
        );
        assert_eq!(
            syntax_error("x = 1 +").message,
            "Unexpected end of input looking for a primary expression"
        );
        assert_eq!(
            syntax_error("while (1) { x;").message,
            "Unexpected end of input looking for a statement"
        );
    }

    #[test]
    fn unexpected_token_carries_help() {
        let err = syntax_error("var 1;");
        assert_eq!(err.message, "Unexpected token '1'");
        assert_eq!(err.help.as_deref(), Some("expected an identifier"));
        assert_eq!((err.location.line, err.location.column), (1, 5));
    }

    #[test]
    fn lexical_errors_surface_through_the_parser() {
        assert!(matches!(
            parse_source("x = 1 & 2;", "test.tly"),
            Err(ParseError::Lex(_))
        ));
    }
}
