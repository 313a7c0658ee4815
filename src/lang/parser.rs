//! Recursive-descent command parser and precedence-climbing expression
//! parser.
//!
//! `ident = expr` vs. a bare command starting with an identifier is
//! disambiguated with a single
//! token of lookahead via `Lexer::peek_token` rather than the C parser's
//! hacky "re-`lexer_init` from scratch" backtrack.

use crate::error::{ErrorKind, XbaseError, XbaseResult};
use crate::lang::ast::*;
use crate::lang::keywords::Keyword;
use crate::lang::lexer::{Lexer, Token, TokenKind};

pub struct Parser<'a> {
    lexer: Lexer<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(src: &'a str) -> Parser<'a> {
        Parser { lexer: Lexer::new(src) }
    }

    /// Parses a single command, or `None` at end of input. A leading run of
    /// blank lines / bare newlines is skipped first.
    pub fn parse_command(&mut self) -> XbaseResult<Option<Command>> {
        self.skip_newlines()?;
        if self.check_eof()? {
            return Ok(None);
        }

        if self.check_kind(&TokenKind::Ident(String::new()))? {
            if let TokenKind::Ident(name) = self.peek()?.kind.clone() {
                let save = self.lexer.checkpoint();
                self.advance()?;
                let next = self.peek()?.kind.clone();
                if next == TokenKind::Eq || next == TokenKind::Assign {
                    self.advance()?;
                    let expr = self.parse_expression()?;
                    self.end_of_statement()?;
                    return Ok(Some(Command::Assign { target: name, expr }));
                }
                // Not an assignment: a bare identifier at statement start is
                // `? ident` shorthand. Re-parse as a full expression (so
                // `foo(1)` or `foo->bar` work too) and print it.
                self.lexer.restore(save);
                let expr = self.parse_expression()?;
                self.end_of_statement()?;
                return Ok(Some(Command::Say { exprs: vec![expr], newline: true }));
            }
        }

        let tok = self.peek()?.clone();
        let cmd = match &tok.kind {
            TokenKind::Question => {
                self.advance()?;
                Command::Say { exprs: self.parse_expr_list_opt()?, newline: true }
            }
            TokenKind::DQuestion => {
                self.advance()?;
                Command::Say { exprs: self.parse_expr_list_opt()?, newline: false }
            }
            TokenKind::Keyword(kw) => {
                self.advance()?;
                self.parse_keyword_command(*kw)?
            }
            other => {
                return Err(XbaseError::new(
                    ErrorKind::Syntax,
                    format!("unexpected token {:?} at line {}", other, tok.line),
                ));
            }
        };
        self.end_of_statement()?;
        Ok(Some(cmd))
    }

    fn parse_keyword_command(&mut self, kw: Keyword) -> XbaseResult<Command> {
        use Keyword::*;
        Ok(match kw {
            Use => self.parse_use()?,
            Close => self.parse_close()?,
            Create => self.parse_create()?,
            List => self.parse_list_display(false)?,
            Display => self.parse_list_display(true)?,
            Go | Goto => self.parse_go()?,
            Skip => self.parse_skip()?,
            Locate => Command::Locate { cond: self.parse_conditions()? },
            Continue => Command::Continue,
            Append => self.parse_append()?,
            Delete => Command::Delete { cond: self.parse_conditions()? },
            Recall => Command::Recall { cond: self.parse_conditions()? },
            Pack => Command::Pack,
            Zap => Command::Zap,
            Index => self.parse_index()?,
            Seek => Command::Seek { expr: self.parse_expression()? },
            Reindex => Command::Reindex,
            Replace => self.parse_replace()?,
            Store => self.parse_store()?,
            Set => self.parse_set()?,
            Clear => self.parse_clear()?,
            Public => self.parse_var_decl(VarScope::Public)?,
            Private => self.parse_var_decl(VarScope::Private)?,
            Local => self.parse_var_decl(VarScope::Local)?,
            Release => self.parse_release()?,
            Count => self.parse_count()?,
            Sum => self.parse_sum_avg(true)?,
            Average => self.parse_sum_avg(false)?,
            Wait => self.parse_wait()?,
            Quit => Command::Quit,
            Help => Command::Help,
            Order => {
                self.expect_keyword(To)?;
                Command::SetOrder { n: self.parse_expression()? }
            }
            other => {
                return Err(XbaseError::new(
                    ErrorKind::NotImplemented,
                    format!("command {other:?} is not implemented"),
                ));
            }
        })
    }

    fn parse_use(&mut self) -> XbaseResult<Command> {
        if self.at_statement_end()? {
            return Ok(Command::Close { target: CloseTarget::Databases });
        }
        let path = self.expect_ident_or_string()?;
        let mut alias = None;
        let mut exclusive = false;
        loop {
            match self.peek()?.kind.clone() {
                TokenKind::Keyword(Keyword::Alias) => {
                    self.advance()?;
                    alias = Some(self.expect_ident()?);
                }
                TokenKind::Keyword(Keyword::Exclusive) => {
                    self.advance()?;
                    exclusive = true;
                }
                TokenKind::Keyword(Keyword::Shared) => {
                    self.advance()?;
                }
                _ => break,
            }
        }
        Ok(Command::Use { path, alias, exclusive })
    }

    fn parse_close(&mut self) -> XbaseResult<Command> {
        // CLOSE with no argument defaults to DATABASES (closes indexes + DBF).
        if self.at_statement_end()? {
            return Ok(Command::Close { target: CloseTarget::Databases });
        }
        let target = match self.peek()?.kind.clone() {
            TokenKind::Keyword(Keyword::Databases) => {
                self.advance()?;
                CloseTarget::Databases
            }
            TokenKind::Keyword(Keyword::Indexes) => {
                self.advance()?;
                CloseTarget::Indexes
            }
            TokenKind::Keyword(Keyword::All) => {
                self.advance()?;
                CloseTarget::All
            }
            _ => {
                self.advance()?;
                CloseTarget::Databases
            }
        };
        Ok(Command::Close { target })
    }

    fn parse_create(&mut self) -> XbaseResult<Command> {
        let table = self.expect_ident_or_string()?;
        self.expect_newline_or_eof()?;
        let mut fields = Vec::new();
        loop {
            self.skip_newlines()?;
            if self.check_eof()? {
                break;
            }
            if self.check_kind(&TokenKind::Semi)? {
                self.advance()?;
                break;
            }
            let name = self.expect_ident()?;
            self.expect(&TokenKind::Comma)?;
            let type_word = self.expect_ident()?.to_ascii_uppercase();
            let field_type = type_word.chars().next().unwrap_or('C');
            self.expect(&TokenKind::Comma)?;
            let length = self.expect_number()? as u8;
            let mut decimals = 0u8;
            if self.check_kind(&TokenKind::Comma)? {
                self.advance()?;
                decimals = self.expect_number()? as u8;
            }
            fields.push(FieldSpec { name, field_type, length, decimals });
        }
        Ok(Command::Create { table, fields })
    }

    fn parse_list_display(&mut self, _is_display: bool) -> XbaseResult<Command> {
        if self.check_keyword(Keyword::Structure)? {
            self.advance()?;
            return Ok(Command::List { fields: Vec::new(), cond: Conditions::default() });
        }
        let mut fields = Vec::new();
        if self.check_keyword(Keyword::Off)? {
            self.advance()?;
        }
        if self.check_keyword(Keyword::All)? {
            self.advance()?;
        } else if !self.is_clause_boundary()? {
            fields = self.parse_expr_list()?;
        }
        let cond = self.parse_conditions()?;
        if _is_display {
            Ok(Command::Display { fields, cond })
        } else {
            Ok(Command::List { fields, cond })
        }
    }

    fn parse_go(&mut self) -> XbaseResult<Command> {
        let target = if self.check_keyword(Keyword::Top)? {
            self.advance()?;
            GoTarget::Top
        } else if self.check_keyword(Keyword::Bottom)? {
            self.advance()?;
            GoTarget::Bottom
        } else {
            GoTarget::Record(self.parse_expression()?)
        };
        Ok(Command::Go { target })
    }

    fn parse_skip(&mut self) -> XbaseResult<Command> {
        let amount = if self.at_statement_end()? { None } else { Some(self.parse_expression()?) };
        Ok(Command::Skip { amount })
    }

    fn parse_append(&mut self) -> XbaseResult<Command> {
        if self.check_keyword(Keyword::Blank)? {
            self.advance()?;
        } else if self.check_keyword(Keyword::From)? {
            self.advance()?;
            if !self.at_statement_end()? {
                self.advance()?;
            }
            return Err(XbaseError::new(ErrorKind::NotImplemented, "APPEND FROM is not implemented"));
        }
        Ok(Command::AppendBlank)
    }

    fn parse_index(&mut self) -> XbaseResult<Command> {
        self.expect_keyword(Keyword::On)?;
        let expr = self.parse_expression()?;
        self.expect_keyword(Keyword::To)?;
        let to = self.expect_ident_or_string()?;
        let mut unique = false;
        let mut descending = false;
        loop {
            if self.check_keyword(Keyword::Unique)? {
                self.advance()?;
                unique = true;
            } else if self.check_keyword(Keyword::Descending)? {
                self.advance()?;
                descending = true;
            } else {
                break;
            }
        }
        Ok(Command::Index { expr, to, unique, descending })
    }

    fn parse_replace(&mut self) -> XbaseResult<Command> {
        let mut assignments = Vec::new();
        loop {
            let field = self.expect_ident()?;
            self.expect_keyword(Keyword::With)?;
            let value = self.parse_expression()?;
            assignments.push((field, value));
            if self.check_kind(&TokenKind::Comma)? {
                self.advance()?;
            } else {
                break;
            }
        }
        let cond = self.parse_conditions()?;
        Ok(Command::Replace { assignments, cond })
    }

    fn parse_store(&mut self) -> XbaseResult<Command> {
        let expr = self.parse_expression()?;
        self.expect_keyword(Keyword::To)?;
        let mut targets = vec![self.expect_ident()?];
        while self.check_kind(&TokenKind::Comma)? {
            self.advance()?;
            targets.push(self.expect_ident()?);
        }
        Ok(Command::Store { expr, targets })
    }

    fn parse_set(&mut self) -> XbaseResult<Command> {
        let option = match self.peek()?.kind.clone() {
            TokenKind::Ident(s) => {
                self.advance()?;
                s
            }
            TokenKind::Keyword(kw) => {
                self.advance()?;
                format!("{kw:?}").to_ascii_uppercase()
            }
            other => {
                return Err(XbaseError::new(
                    ErrorKind::Syntax,
                    format!("expected SET option, got {other:?}"),
                ));
            }
        };
        let value = if self.check_keyword(Keyword::To)? {
            self.advance()?;
            SetValue::Expr(self.parse_expression()?)
        } else if self.check_keyword(Keyword::On)? {
            self.advance()?;
            SetValue::On
        } else if self.check_keyword(Keyword::Off)? {
            self.advance()?;
            SetValue::Off
        } else {
            SetValue::On
        };
        Ok(Command::Set { option, value })
    }

    fn parse_clear(&mut self) -> XbaseResult<Command> {
        if !self.at_statement_end()? {
            self.advance()?;
        }
        Ok(Command::Clear)
    }

    fn parse_var_decl(&mut self, scope: VarScope) -> XbaseResult<Command> {
        let names = self.parse_ident_list()?;
        Ok(Command::VarDecl { scope, names })
    }

    fn parse_release(&mut self) -> XbaseResult<Command> {
        if self.check_keyword(Keyword::All)? {
            self.advance()?;
            return Ok(Command::Release { names: Vec::new() });
        }
        Ok(Command::Release { names: self.parse_ident_list()? })
    }

    fn parse_count(&mut self) -> XbaseResult<Command> {
        let cond = self.parse_conditions()?;
        let into = if self.check_keyword(Keyword::To)? {
            self.advance()?;
            Some(self.expect_ident()?)
        } else {
            None
        };
        Ok(Command::Count { cond, into })
    }

    fn parse_sum_avg(&mut self, is_sum: bool) -> XbaseResult<Command> {
        let exprs = self.parse_expr_list()?;
        let into = if self.check_keyword(Keyword::To)? {
            self.advance()?;
            self.parse_ident_list()?
        } else {
            Vec::new()
        };
        let cond = self.parse_conditions()?;
        if is_sum {
            Ok(Command::Sum { exprs, cond, into })
        } else {
            Ok(Command::Average { exprs, cond, into })
        }
    }

    fn parse_wait(&mut self) -> XbaseResult<Command> {
        let message = if self.check_kind(&TokenKind::String(String::new()))? {
            if let TokenKind::String(s) = self.peek()?.kind.clone() {
                self.advance()?;
                Some(s)
            } else {
                None
            }
        } else {
            None
        };
        Ok(Command::Wait { message })
    }

    // === shared clauses ===

    fn parse_scope(&mut self) -> XbaseResult<Option<Scope>> {
        if self.check_keyword(Keyword::All)? {
            self.advance()?;
            Ok(Some(Scope::All))
        } else if self.check_keyword(Keyword::Next)? {
            self.advance()?;
            Ok(Some(Scope::Next(self.parse_expression()?)))
        } else if self.check_keyword(Keyword::Record)? {
            self.advance()?;
            Ok(Some(Scope::Record(self.parse_expression()?)))
        } else if self.check_keyword(Keyword::Rest)? {
            self.advance()?;
            Ok(Some(Scope::Rest))
        } else {
            Ok(None)
        }
    }

    fn parse_conditions(&mut self) -> XbaseResult<Conditions> {
        let mut cond = Conditions { scope: self.parse_scope()?, ..Default::default() };
        loop {
            if self.check_keyword(Keyword::For)? {
                self.advance()?;
                cond.for_cond = Some(self.parse_expression()?);
            } else if self.check_keyword(Keyword::While)? {
                self.advance()?;
                cond.while_cond = Some(self.parse_expression()?);
            } else {
                break;
            }
        }
        Ok(cond)
    }

    fn parse_expr_list(&mut self) -> XbaseResult<Vec<Expr>> {
        let mut out = vec![self.parse_expression()?];
        while self.check_kind(&TokenKind::Comma)? {
            self.advance()?;
            out.push(self.parse_expression()?);
        }
        Ok(out)
    }

    fn parse_expr_list_opt(&mut self) -> XbaseResult<Vec<Expr>> {
        if self.at_statement_end()? {
            Ok(Vec::new())
        } else {
            self.parse_expr_list()
        }
    }

    fn parse_ident_list(&mut self) -> XbaseResult<Vec<String>> {
        let mut out = Vec::new();
        while self.check_kind(&TokenKind::Ident(String::new()))? {
            out.push(self.expect_ident()?);
            if self.check_kind(&TokenKind::Comma)? {
                self.advance()?;
            } else {
                break;
            }
        }
        Ok(out)
    }

    // === expressions ===

    pub fn parse_expression(&mut self) -> XbaseResult<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> XbaseResult<Expr> {
        let mut left = self.parse_and()?;
        while self.check_kind(&TokenKind::Or)? {
            self.advance()?;
            let right = self.parse_and()?;
            left = Expr::Binary(BinOp::Or, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> XbaseResult<Expr> {
        let mut left = self.parse_not()?;
        while self.check_kind(&TokenKind::And)? {
            self.advance()?;
            let right = self.parse_not()?;
            left = Expr::Binary(BinOp::And, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> XbaseResult<Expr> {
        if self.check_kind(&TokenKind::Not)? {
            self.advance()?;
            let operand = self.parse_not()?;
            return Ok(Expr::Unary(UnOp::Not, Box::new(operand)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> XbaseResult<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek()?.kind {
                TokenKind::Eq => BinOp::Eq,
                TokenKind::Ne => BinOp::Ne,
                TokenKind::Lt => BinOp::Lt,
                TokenKind::Le => BinOp::Le,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::Ge => BinOp::Ge,
                TokenKind::Dollar => BinOp::In,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_additive()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> XbaseResult<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek()?.kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_multiplicative()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> XbaseResult<Expr> {
        let mut left = self.parse_power()?;
        loop {
            let op = match self.peek()?.kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_power()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_power(&mut self) -> XbaseResult<Expr> {
        let left = self.parse_unary()?;
        if self.check_kind(&TokenKind::Caret)? {
            self.advance()?;
            let right = self.parse_power()?; // right-associative
            return Ok(Expr::Binary(BinOp::Pow, Box::new(left), Box::new(right)));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> XbaseResult<Expr> {
        if self.check_kind(&TokenKind::Minus)? {
            self.advance()?;
            return Ok(Expr::Unary(UnOp::Neg, Box::new(self.parse_unary()?)));
        }
        if self.check_kind(&TokenKind::Plus)? {
            self.advance()?;
            return Ok(Expr::Unary(UnOp::Plus, Box::new(self.parse_unary()?)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> XbaseResult<Expr> {
        let tok = self.peek()?.clone();
        match tok.kind {
            TokenKind::Number(n) => {
                self.advance()?;
                Ok(Expr::Number(n))
            }
            TokenKind::String(s) => {
                self.advance()?;
                Ok(Expr::String(s))
            }
            TokenKind::Date(s) => {
                self.advance()?;
                Ok(Expr::DateLiteral(s))
            }
            TokenKind::True => {
                self.advance()?;
                Ok(Expr::Logical(true))
            }
            TokenKind::False => {
                self.advance()?;
                Ok(Expr::Logical(false))
            }
            TokenKind::Ident(name) => {
                self.advance()?;
                if self.check_kind(&TokenKind::LParen)? {
                    self.advance()?;
                    let args =
                        if self.check_kind(&TokenKind::RParen)? { Vec::new() } else { self.parse_expr_list()? };
                    self.expect(&TokenKind::RParen)?;
                    return Ok(Expr::Call(name, args));
                }
                if self.check_kind(&TokenKind::LBracket)? {
                    self.advance()?;
                    let index = self.parse_expression()?;
                    self.expect(&TokenKind::RBracket)?;
                    return Ok(Expr::Index(Box::new(Expr::Ident(name)), Box::new(index)));
                }
                if self.check_kind(&TokenKind::Arrow)? {
                    self.advance()?;
                    let field = self.expect_ident()?;
                    return Ok(Expr::AliasField(name, field));
                }
                Ok(Expr::Ident(name))
            }
            TokenKind::Ampersand => {
                self.advance()?;
                let name = self.expect_ident()?;
                Ok(Expr::Macro(name))
            }
            TokenKind::LParen => {
                self.advance()?;
                let expr = self.parse_expression()?;
                self.expect(&TokenKind::RParen)?;
                Ok(expr)
            }
            other => Err(XbaseError::new(
                ErrorKind::Syntax,
                format!("unexpected token {:?} at line {}", other, tok.line),
            )),
        }
    }

    // === token-stream plumbing ===

    fn peek(&mut self) -> XbaseResult<&Token> {
        self.lexer.peek_token()
    }

    fn advance(&mut self) -> XbaseResult<Token> {
        self.lexer.next_token()
    }

    fn check_kind(&mut self, kind: &TokenKind) -> XbaseResult<bool> {
        Ok(std::mem::discriminant(&self.peek()?.kind) == std::mem::discriminant(kind))
    }

    fn check_keyword(&mut self, kw: Keyword) -> XbaseResult<bool> {
        Ok(matches!(&self.peek()?.kind, TokenKind::Keyword(k) if *k == kw))
    }

    fn check_eof(&mut self) -> XbaseResult<bool> {
        Ok(self.peek()?.kind == TokenKind::Eof)
    }

    fn at_statement_end(&mut self) -> XbaseResult<bool> {
        Ok(matches!(self.peek()?.kind, TokenKind::Eof | TokenKind::Newline | TokenKind::Semi))
    }

    fn is_clause_boundary(&mut self) -> XbaseResult<bool> {
        Ok(self.at_statement_end()?
            || self.check_keyword(Keyword::For)?
            || self.check_keyword(Keyword::While)?
            || self.check_keyword(Keyword::Next)?
            || self.check_keyword(Keyword::Rest)?
            || self.check_keyword(Keyword::Record)?)
    }

    fn expect(&mut self, kind: &TokenKind) -> XbaseResult<Token> {
        let tok = self.advance()?;
        if std::mem::discriminant(&tok.kind) != std::mem::discriminant(kind) {
            return Err(XbaseError::new(
                ErrorKind::Syntax,
                format!("expected {:?}, got {:?} at line {}", kind, tok.kind, tok.line),
            ));
        }
        Ok(tok)
    }

    fn expect_keyword(&mut self, kw: Keyword) -> XbaseResult<()> {
        let tok = self.advance()?;
        match tok.kind {
            TokenKind::Keyword(k) if k == kw => Ok(()),
            other => Err(XbaseError::new(
                ErrorKind::Syntax,
                format!("expected keyword {kw:?}, got {:?} at line {}", other, tok.line),
            )),
        }
    }

    fn expect_ident(&mut self) -> XbaseResult<String> {
        let tok = self.advance()?;
        match tok.kind {
            TokenKind::Ident(s) => Ok(s),
            other => Err(XbaseError::new(
                ErrorKind::Syntax,
                format!("expected identifier, got {:?} at line {}", other, tok.line),
            )),
        }
    }

    fn expect_ident_or_string(&mut self) -> XbaseResult<String> {
        let tok = self.advance()?;
        match tok.kind {
            TokenKind::Ident(s) | TokenKind::String(s) => Ok(s),
            other => Err(XbaseError::new(
                ErrorKind::Syntax,
                format!("expected name, got {:?} at line {}", other, tok.line),
            )),
        }
    }

    fn expect_number(&mut self) -> XbaseResult<f64> {
        let tok = self.advance()?;
        match tok.kind {
            TokenKind::Number(n) => Ok(n),
            other => Err(XbaseError::new(
                ErrorKind::Syntax,
                format!("expected number, got {:?} at line {}", other, tok.line),
            )),
        }
    }

    fn expect_newline_or_eof(&mut self) -> XbaseResult<()> {
        if self.at_statement_end()? {
            self.advance()?;
        }
        Ok(())
    }

    fn end_of_statement(&mut self) -> XbaseResult<()> {
        if self.at_statement_end()? {
            if !self.check_eof()? {
                self.advance()?;
            }
            Ok(())
        } else {
            let tok = self.peek()?.clone();
            Err(XbaseError::new(
                ErrorKind::Syntax,
                format!("unexpected trailing token {:?} at line {}", tok.kind, tok.line),
            ))
        }
    }

    fn skip_newlines(&mut self) -> XbaseResult<()> {
        while matches!(self.peek()?.kind, TokenKind::Newline | TokenKind::Semi) {
            self.advance()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(src: &str) -> Command {
        Parser::new(src).parse_command().unwrap().unwrap()
    }

    #[test]
    fn parses_use_with_alias() {
        let cmd = parse_one("USE people ALIAS p\n");
        assert_eq!(
            cmd,
            Command::Use { path: "people".into(), alias: Some("p".into()), exclusive: false }
        );
    }

    #[test]
    fn parses_assignment() {
        let cmd = parse_one("X = 1 + 2\n");
        assert_eq!(
            cmd,
            Command::Assign {
                target: "X".into(),
                expr: Expr::Binary(BinOp::Add, Box::new(Expr::Number(1.0)), Box::new(Expr::Number(2.0))),
            }
        );
    }

    #[test]
    fn parses_replace_with_for() {
        let cmd = parse_one("REPLACE NAME WITH \"Bob\" FOR AGE > 10\n");
        match cmd {
            Command::Replace { assignments, cond } => {
                assert_eq!(assignments.len(), 1);
                assert!(cond.for_cond.is_some());
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn precedence_climbs_correctly() {
        let cmd = parse_one("? 2 + 3 * 4\n");
        match cmd {
            Command::Say { exprs, .. } => {
                assert_eq!(
                    exprs[0],
                    Expr::Binary(
                        BinOp::Add,
                        Box::new(Expr::Number(2.0)),
                        Box::new(Expr::Binary(
                            BinOp::Mul,
                            Box::new(Expr::Number(3.0)),
                            Box::new(Expr::Number(4.0))
                        ))
                    )
                );
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn power_is_right_associative() {
        let cmd = parse_one("? 2 ^ 3 ^ 2\n");
        match cmd {
            Command::Say { exprs, .. } => {
                assert_eq!(
                    exprs[0],
                    Expr::Binary(
                        BinOp::Pow,
                        Box::new(Expr::Number(2.0)),
                        Box::new(Expr::Binary(
                            BinOp::Pow,
                            Box::new(Expr::Number(3.0)),
                            Box::new(Expr::Number(2.0))
                        ))
                    )
                );
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn alias_field_reference() {
        let cmd = parse_one("? people->NAME\n");
        match cmd {
            Command::Say { exprs, .. } => {
                assert_eq!(exprs[0], Expr::AliasField("people".into(), "NAME".into()));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
