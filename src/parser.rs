use crate::{
    ast::{
        AssignmentExpr, BinaryExpr, BinaryOp, BooleanLiteral, BranchStmt, CallExpr,
        ComparisonExpr, ComparisonOp, Expr, FunctionDeclaration, Identifier, MemberExpr,
        NullLiteral, NumericLiteral, ObjectLiteral, Program, PropertyLiteral, Stmt,
        VarDeclaration,
    },
    common::ensure_sufficient_stack,
    error::{Error, Result},
    lexer,
    token::{Token, TokenKind},
};

/// How deeply blocks and expressions may nest inside one another.
pub const MAX_NESTING_DEPTH: usize = 256;

#[derive(Debug, Clone)]
struct Parser<'a> {
    tokens: &'a [Token],
    current: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    /// `tokens` must be non-empty and end with `TokenKind::Eof`.
    fn new(tokens: &'a [Token]) -> Self {
        Parser {
            tokens,
            current: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> &'a Token {
        // never move past the trailing Eof
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn at_end(&self) -> bool {
        self.at(TokenKind::Eof)
    }

    fn eat(&mut self) -> &'a Token {
        let token = self.peek();
        if token.kind != TokenKind::Eof {
            self.current += 1;
        }
        token
    }

    fn error_at_current(&self, message: &str) -> Error {
        self.peek().error_at(message)
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> Result<&'a Token> {
        if self.at(kind) {
            Ok(self.eat())
        } else {
            Err(self.error_at_current(&format!(
                "{}, found {}",
                message,
                self.peek().describe()
            )))
        }
    }

    /// Runs `parse` one nesting level deeper.
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.error_at_current("too many nested blocks or expressions"));
        }

        self.depth += 1;
        let result = ensure_sufficient_stack(|| parse(self));
        self.depth -= 1;

        result
    }

    fn parse_statement(&mut self) -> Result<Stmt> {
        match self.peek().kind {
            TokenKind::Mut | TokenKind::Const => Ok(self.parse_var_declaration()?.into()),
            TokenKind::If => Ok(self.parse_branch()?.into()),
            TokenKind::Func => Ok(self.parse_function_declaration()?.into()),
            TokenKind::Return => Err(self.error_at_current(
                "'return' is reserved; a function evaluates to its last statement",
            )),
            _ => {
                let expr = self.parse_expr()?;
                if self.at(TokenKind::Semicolon) {
                    self.eat();
                }
                Ok(expr.into())
            }
        }
    }

    fn parse_block(&mut self) -> Result<Vec<Stmt>> {
        self.nested(Self::parse_block_body)
    }

    fn parse_block_body(&mut self) -> Result<Vec<Stmt>> {
        self.expect(TokenKind::LeftBrace, "expected '{' to open block")?;

        let mut stmts = Vec::new();
        while !self.at(TokenKind::RightBrace) && !self.at_end() {
            stmts.push(self.parse_statement()?);
        }

        self.expect(TokenKind::RightBrace, "unclosed block, expected '}'")?;

        Ok(stmts)
    }

    fn parse_var_declaration(&mut self) -> Result<VarDeclaration> {
        let constant = self.eat().kind == TokenKind::Const;
        let identifier = self
            .expect(
                TokenKind::Ident,
                "expected identifier name after 'mut' or 'const'",
            )?
            .value
            .clone();

        if self.at(TokenKind::Semicolon) {
            if constant {
                return Err(self.error_at_current(&format!(
                    "constant '{}' must be initialized with a value",
                    identifier
                )));
            }
            self.eat();

            return Ok(VarDeclaration {
                identifier,
                constant,
                value: None,
            });
        }

        self.expect(
            TokenKind::Equal,
            "expected '=' or ';' after identifier in declaration",
        )?;
        let value = self.parse_expr()?;
        self.expect(TokenKind::Semicolon, "expected ';' after declaration")?;

        Ok(VarDeclaration {
            identifier,
            constant,
            value: Some(value),
        })
    }

    fn parse_branch(&mut self) -> Result<BranchStmt> {
        self.expect(TokenKind::If, "expected 'if'")?;
        self.expect(TokenKind::LeftParen, "expected '(' after 'if'")?;
        let condition = self.parse_logical_expr()?;
        self.expect(TokenKind::RightParen, "missing closing ')' after condition")?;

        let body = self.parse_block()?;

        if self.at(TokenKind::Elseif) {
            return Err(self.error_at_current(
                "'elseif' chaining is not supported; nest an 'if' inside 'else'",
            ));
        }

        let else_body = if self.at(TokenKind::Else) {
            self.eat();
            self.parse_block()?
        } else {
            Vec::new()
        };

        Ok(BranchStmt {
            condition,
            body,
            else_body,
        })
    }

    fn parse_function_declaration(&mut self) -> Result<FunctionDeclaration> {
        self.expect(TokenKind::Func, "expected 'func'")?;
        let name = self
            .expect(TokenKind::Ident, "expected function name after 'func'")?
            .value
            .clone();

        self.expect(TokenKind::LeftParen, "expected '(' after function name")?;
        let mut params = Vec::new();
        if !self.at(TokenKind::RightParen) {
            loop {
                let param = self.expect(TokenKind::Ident, "expected parameter name")?;
                params.push(param.value.clone());

                if self.at(TokenKind::Comma) {
                    self.eat();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightParen, "missing closing ')' after parameters")?;

        let body = self.parse_block()?;

        Ok(FunctionDeclaration { name, params, body })
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        self.nested(Self::parse_assignment_expr)
    }

    fn parse_assignment_expr(&mut self) -> Result<Expr> {
        let left = self.parse_object_expr()?;

        if self.at(TokenKind::Equal) {
            let equal_token = self.eat();
            let value = self.parse_expr()?;

            if !matches!(left, Expr::Identifier(_)) {
                return Err(equal_token.error_at("only identifiers can be assigned to"));
            }

            return Ok(AssignmentExpr {
                assignee: Box::new(left),
                value: Box::new(value),
            }
            .into());
        }

        Ok(left)
    }

    fn parse_object_expr(&mut self) -> Result<Expr> {
        if !self.at(TokenKind::LeftBrace) {
            return self.parse_logical_expr();
        }
        self.eat();

        let mut properties = Vec::new();
        while !self.at(TokenKind::RightBrace) && !self.at_end() {
            let key = self
                .expect(TokenKind::Ident, "expected identifier key in object literal")?
                .value
                .clone();

            let value = if self.at(TokenKind::Colon) {
                self.eat();
                Some(self.parse_expr()?)
            } else {
                None
            };
            properties.push(PropertyLiteral { key, value });

            if !self.at(TokenKind::RightBrace) {
                self.expect(TokenKind::Comma, "expected ',' or '}' after property")?;
            }
        }

        self.expect(TokenKind::RightBrace, "unclosed object literal, expected '}'")?;

        Ok(ObjectLiteral { properties }.into())
    }

    fn parse_logical_expr(&mut self) -> Result<Expr> {
        let mut left = self.parse_comparison_expr()?;

        while self.peek().kind.is_logical_op() {
            left = self.fold_comparison(left, Self::parse_comparison_expr)?;
        }

        Ok(left)
    }

    fn parse_comparison_expr(&mut self) -> Result<Expr> {
        let mut left = self.parse_additive_expr()?;

        while self.peek().kind.is_comparative_op() {
            left = self.fold_comparison(left, Self::parse_additive_expr)?;
        }

        Ok(left)
    }

    /// Consumes the operator under the cursor and its right operand.
    fn fold_comparison(
        &mut self,
        left: Expr,
        parse_operand: fn(&mut Self) -> Result<Expr>,
    ) -> Result<Expr> {
        let op = self.eat();
        let operator = ComparisonOp::from_token(op.kind)
            .ok_or_else(|| op.error_at("expected a comparison operator"))?;
        let right = parse_operand(self)?;

        Ok(ComparisonExpr {
            left: Box::new(left),
            right: Box::new(right),
            operator,
        }
        .into())
    }

    fn parse_additive_expr(&mut self) -> Result<Expr> {
        let mut left = self.parse_multiplicative_expr()?;

        while self.peek().kind.is_additive_op() {
            left = self.fold_binary(left, Self::parse_multiplicative_expr)?;
        }

        Ok(left)
    }

    fn parse_multiplicative_expr(&mut self) -> Result<Expr> {
        let mut left = self.parse_call_member_expr()?;

        while self.peek().kind.is_multiplicative_op() {
            left = self.fold_binary(left, Self::parse_call_member_expr)?;
        }

        Ok(left)
    }

    fn fold_binary(
        &mut self,
        left: Expr,
        parse_operand: fn(&mut Self) -> Result<Expr>,
    ) -> Result<Expr> {
        let op = self.eat();
        let operator = BinaryOp::from_token(op.kind)
            .ok_or_else(|| op.error_at("expected an arithmetic operator"))?;
        let right = parse_operand(self)?;

        Ok(BinaryExpr {
            left: Box::new(left),
            right: Box::new(right),
            operator,
        }
        .into())
    }

    fn parse_call_member_expr(&mut self) -> Result<Expr> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.peek().kind {
                TokenKind::LeftParen => {
                    let args = self.parse_arguments()?;
                    expr = CallExpr {
                        caller: Box::new(expr),
                        args,
                    }
                    .into();
                }
                TokenKind::LeftBracket => {
                    self.eat();
                    let field = self.parse_expr()?;
                    self.expect(
                        TokenKind::RightBracket,
                        "missing closing ']' in member expression",
                    )?;

                    expr = MemberExpr {
                        object: Box::new(expr),
                        field: Box::new(field),
                        computed: true,
                    }
                    .into();
                }
                TokenKind::Dot => {
                    self.eat();
                    let ident = self.expect(
                        TokenKind::Ident,
                        "expected identifier after '.' in member expression",
                    )?;

                    expr = MemberExpr {
                        object: Box::new(expr),
                        field: Box::new(
                            Identifier {
                                symbol: ident.value.clone(),
                            }
                            .into(),
                        ),
                        computed: false,
                    }
                    .into();
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expr>> {
        self.expect(TokenKind::LeftParen, "expected '(' to open argument list")?;

        let mut args = Vec::new();
        if !self.at(TokenKind::RightParen) {
            loop {
                args.push(self.parse_expr()?);

                if self.at(TokenKind::Comma) {
                    self.eat();
                } else {
                    break;
                }
            }
        }

        self.expect(
            TokenKind::RightParen,
            "missing closing ')' in call expression",
        )?;

        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let token = self.peek();

        let expr: Expr = match token.kind {
            TokenKind::Number => {
                let value = token
                    .value
                    .parse::<f64>()
                    .map_err(|_| token.error_at("invalid number literal"))?;
                NumericLiteral { value }.into()
            }
            TokenKind::Ident => Identifier {
                symbol: token.value.clone(),
            }
            .into(),
            TokenKind::Null => NullLiteral.into(),
            TokenKind::True => BooleanLiteral { value: true }.into(),
            TokenKind::False => BooleanLiteral { value: false }.into(),
            TokenKind::LeftParen => {
                self.eat();
                let expr_within_grouping = self.parse_expr()?;
                self.expect(TokenKind::RightParen, "missing closing ')' in grouping")?;
                return Ok(expr_within_grouping);
            }
            _ => {
                return Err(token.error_at(&format!(
                    "unexpected token {} while parsing expression",
                    token.describe()
                )))
            }
        };

        self.eat();
        Ok(expr)
    }
}

/// Builds a program from an already tokenized source.
pub fn parse(tokens: &[Token]) -> Result<Program> {
    let mut body = Vec::new();

    if let Some(last) = tokens.last() {
        if last.kind != TokenKind::Eof {
            let end = last.span.end;
            return Err(Error::syntax("token stream does not end with end of input", end..end));
        }

        let mut parser = Parser::new(tokens);
        while !parser.at_end() {
            body.push(parser.parse_statement()?);
        }
    }

    tracing::debug!(statements = body.len(), "parsed program");

    Ok(Program { body })
}

/// Tokenizes and parses `source` into a single program.
pub fn produce_ast(source: &str) -> Result<Program> {
    let tokens = lexer::tokenize(source)?;
    parse(&tokens)
}
