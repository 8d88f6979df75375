use tracing::trace;

use crate::{
    error::{Error, Result, SyntaxError},
    expr::Expr,
    stmt::{self, Stmt},
    token::*,
    value::Literal,
};

const EQUALITY_TOKENS: &[&TokenKind] = &[
    &TokenKind::BangEqual,
    &TokenKind::EqualEqual,
];

const COMPARISON_TOKENS: &[&TokenKind] = &[
    &TokenKind::Greater,
    &TokenKind::GreaterEqual,
    &TokenKind::Less,
    &TokenKind::LessEqual,
];

const TERM_TOKENS: &[&TokenKind] = &[
    &TokenKind::Minus,
    &TokenKind::Plus,
];

const FACTOR_TOKENS: &[&TokenKind] = &[
    &TokenKind::Star,
    &TokenKind::Slash,
];

const UNARY_TOKENS: &[&TokenKind] = &[
    &TokenKind::Bang,
    &TokenKind::Minus,
];

const MAX_ARGUMENTS: usize = 255;

/// Recursive-descent parser over a fully scanned token list.
///
/// The cursor only moves forward, except where a production is tried
/// speculatively: the cursor is saved, and restored if the attempt fails.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    function_depth: usize,
}

impl Parser {
    pub fn new<T: IntoIterator<Item = Token>>(tokens: T) -> Self {
        let mut tokens: Vec<Token> = tokens.into_iter().collect();
        if tokens.last().map(|t| &t.kind) != Some(&TokenKind::EndOfFile) {
            let line = tokens.last().map_or(1, |t| t.line);
            tokens.push(Token::new(TokenKind::EndOfFile, "", line, 1));
        }
        Parser { tokens, current: 0, function_depth: 0 }
    }

    /// Parses declarations until the end of input or the first error. The
    /// error, if any, is the last element; everything before it parsed fine.
    pub fn parse(&mut self) -> Vec<Result<Stmt>> {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            let statement = self.declaration();
            let failed = statement.is_err();
            statements.push(statement);
            if failed { break }
        }
        statements
    }

    fn declaration(&mut self) -> Result<Stmt> {
        if self.match_single(&TokenKind::Fun).is_some() {
            self.function("function").map(Stmt::Function)
        } else if self.match_single(&TokenKind::Var).is_some() {
            self.var_declaration()
        } else {
            self.statement()
        }
    }

    fn var_declaration(&mut self) -> Result<Stmt> {
        let name = self.consume(&TokenKind::Identifier, "Expected variable name.")?;

        let initializer = if self.match_single(&TokenKind::Equal).is_some() {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(&TokenKind::Semicolon, "Expected ';' after variable declaration.")?;
        Ok(Stmt::new_var(name, initializer))
    }

    fn statement(&mut self) -> Result<Stmt> {
        if let Some(keyword) = self.match_single(&TokenKind::For) {
            self.for_statement(keyword)
        } else if let Some(keyword) = self.match_single(&TokenKind::If) {
            self.if_statement(keyword)
        } else if self.match_single(&TokenKind::Print).is_some() {
            self.print_statement()
        } else if let Some(keyword) = self.match_single(&TokenKind::Return) {
            self.return_statement(keyword)
        } else if let Some(keyword) = self.match_single(&TokenKind::While) {
            self.while_statement(keyword)
        } else if self.match_single(&TokenKind::LeftBrace).is_some() {
            Ok(Stmt::new_block(self.block()?))
        } else {
            self.expression_statement()
        }
    }

    // for (init; cond; inc) body  =>  { init; while (cond) { body; inc; } }
    fn for_statement(&mut self, keyword: Token) -> Result<Stmt> {
        self.consume(&TokenKind::LeftParen, "Expected '(' after 'for'.")?;

        let initializer = self.for_initializer()?;

        let condition = self.expression_unless(&TokenKind::Semicolon, Literal::Bool(true))?;
        self.consume(&TokenKind::Semicolon, "Expected ';' after loop condition.")?;

        let increment = if !self.check_next(&TokenKind::RightParen) {
            Some(Stmt::new_expression(self.expression()?))
        } else { None };

        self.consume(&TokenKind::RightParen, "Expected ')' after for clauses.")?;

        let body = self.statement()?;
        let body = match increment {
            Some(i) => Stmt::new_block(vec![body, i]),
            None => body,
        };
        let while_loop = Stmt::new_while(keyword, condition, Box::new(body));

        Ok(Stmt::new_block(vec![initializer, while_loop]))
    }

    fn for_initializer(&mut self) -> Result<Stmt> {
        let checkpoint = self.checkpoint();
        let declaration = self.consume(&TokenKind::Var, "Expected 'var'.")
            .and_then(|_| self.var_declaration());

        match declaration {
            Ok(declaration) => Ok(declaration),
            Err(declaration_error) => {
                self.restore(checkpoint);
                trace!(at = checkpoint, "loop initializer is not a declaration, rewinding");
                let started_with_var = self.tokens[checkpoint].kind == TokenKind::Var;
                self.expression_statement().map_err(|expression_error| {
                    if started_with_var { declaration_error } else { expression_error }
                })
            }
        }
    }

    fn if_statement(&mut self, keyword: Token) -> Result<Stmt> {
        self.consume(&TokenKind::LeftParen, "Expected '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(&TokenKind::RightParen, "Expected ')' after if condition.")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.match_single(&TokenKind::Else).is_some() {
            Some(Box::new(self.statement()?))
        } else { None };

        Ok(Stmt::new_if(keyword, condition, then_branch, else_branch))
    }

    fn print_statement(&mut self) -> Result<Stmt> {
        let expression = self.expression_unless(&TokenKind::Semicolon, Literal::Nil)?;
        self.consume(&TokenKind::Semicolon, "Expected ';' after value.")?;
        Ok(Stmt::new_print(expression))
    }

    fn return_statement(&mut self, keyword: Token) -> Result<Stmt> {
        if self.function_depth == 0 {
            return Err(Error::syntactic(
                SyntaxError::UnexpectedToken,
                keyword,
                "Cannot return from top-level code."
            ))
        }

        let value = if !self.check_next(&TokenKind::Semicolon) {
            Some(self.expression()?)
        } else { None };
        self.consume(&TokenKind::Semicolon, "Expected ';' after return value.")?;
        Ok(Stmt::new_return(keyword, value))
    }

    fn while_statement(&mut self, keyword: Token) -> Result<Stmt> {
        self.consume(&TokenKind::LeftParen, "Expected '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(&TokenKind::RightParen, "Expected ')' after condition.")?;
        let body = Box::new(self.statement()?);

        Ok(Stmt::new_while(keyword, condition, body))
    }

    fn expression_statement(&mut self) -> Result<Stmt> {
        let expression = self.expression_unless(&TokenKind::Semicolon, Literal::Nil)?;
        self.consume(&TokenKind::Semicolon, "Expected ';' after expression.")?;
        Ok(Stmt::new_expression(expression))
    }

    fn function(&mut self, kind: &str) -> Result<stmt::Function> {
        let name = self.consume(
            &TokenKind::Identifier,
            format!("Expected {} name.", kind).as_str()
        )?;
        self.consume(
            &TokenKind::LeftParen,
            format!("Expected '(' after {} name.", kind).as_str()
        )?;

        let mut params = Vec::new();
        if !self.check_next(&TokenKind::RightParen) {
            loop {
                params.push(self.consume(&TokenKind::Identifier, "Expected a parameter name.")?);
                if self.match_single(&TokenKind::Comma).is_none() { break }
            }
        }

        if params.len() > MAX_ARGUMENTS {
            return Err(Error::syntactic(
                SyntaxError::UnexpectedToken,
                name,
                format!("Cannot have more than {} parameters.", MAX_ARGUMENTS)
            ))
        }

        self.consume(&TokenKind::RightParen, "Expected ')' after parameters.")?;
        self.consume(
            &TokenKind::LeftBrace,
            format!("Expected '{{' before {} body.", kind).as_str()
        )?;

        self.function_depth += 1;
        let body = self.block();
        self.function_depth -= 1;

        Ok(stmt::Function { name, params, body: body? })
    }

    fn block(&mut self) -> Result<Vec<Stmt>> {
        let mut statements = Vec::new();

        while !self.check_next(&TokenKind::RightBrace) && !self.is_at_end() {
            statements.push(self.declaration()?);
        }

        self.consume(&TokenKind::RightBrace, "Expected '}' after block.")?;
        Ok(statements)
    }

    // An expression, or `default` when the next token is `terminator`.
    fn expression_unless(&mut self, terminator: &TokenKind, default: Literal) -> Result<Expr> {
        if self.check_next(terminator) {
            Ok(Expr::new_literal(default))
        } else {
            self.expression()
        }
    }

    pub(crate) fn expression(&mut self) -> Result<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr> {
        let checkpoint = self.checkpoint();
        match self.assignment_target() {
            Ok(assign) => Ok(assign),
            Err(_) => {
                if self.current > checkpoint + 1 {
                    trace!(at = checkpoint, "assignment did not parse, rewinding");
                }
                self.restore(checkpoint);
                self.or()
            }
        }
    }

    fn assignment_target(&mut self) -> Result<Expr> {
        let name = self.consume(&TokenKind::Identifier, "Expected assignment target.")?;
        self.consume(&TokenKind::Equal, "Expected '=' after assignment target.")?;
        let value = self.assignment()?;
        Ok(Expr::new_assign(Some(name), Box::new(value)))
    }

    fn or(&mut self) -> Result<Expr> {
        let mut e = self.and()?;

        while let Some(op) = self.match_single(&TokenKind::Or) {
            let right = Box::new(self.and()?);
            e = Expr::new_logical(Box::new(e), op, right);
        }

        Ok(e)
    }

    fn and(&mut self) -> Result<Expr> {
        let mut e = self.equality()?;

        while let Some(op) = self.match_single(&TokenKind::And) {
            let right = Box::new(self.equality()?);
            e = Expr::new_logical(Box::new(e), op, right);
        }

        Ok(e)
    }

    fn equality(&mut self) -> Result<Expr> {
        self.match_binary_precedence_with_tokens(
            Self::comparison,
            EQUALITY_TOKENS
        )
    }

    fn comparison(&mut self) -> Result<Expr> {
        self.match_binary_precedence_with_tokens(
            Self::term,
            COMPARISON_TOKENS
        )
    }

    fn term(&mut self) -> Result<Expr> {
        self.match_binary_precedence_with_tokens(
            Self::factor,
            TERM_TOKENS
        )
    }

    fn factor(&mut self) -> Result<Expr> {
        self.match_binary_precedence_with_tokens(
            Self::unary,
            FACTOR_TOKENS
        )
    }

    fn unary(&mut self) -> Result<Expr> {
        if let Some(token) = self.match_any(UNARY_TOKENS) {
            let right = Box::new(self.unary()?);
            Ok(Expr::new_unary(Some(token), right))
        } else {
            self.call()
        }
    }

    fn call(&mut self) -> Result<Expr> {
        let mut e = self.primary()?;

        while self.match_single(&TokenKind::LeftParen).is_some() {
            e = self.finish_call(e)?;
        }

        Ok(e)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr> {
        let mut args = Vec::new();

        if !self.check_next(&TokenKind::RightParen) {
            args.push(self.expression()?);
            while self.match_single(&TokenKind::Comma).is_some() {
                args.push(self.expression()?);
            }
        }
        let paren = self.consume(
            &TokenKind::RightParen,
            "Expected ')' after arguments."
        )?;

        if args.len() > MAX_ARGUMENTS {
            Err(Error::syntactic(
                SyntaxError::UnexpectedToken,
                paren,
                format!("Cannot have more than {} arguments.", MAX_ARGUMENTS)
            ))
        } else {
            Ok(Expr::new_call(Box::new(callee), paren, args))
        }
    }

    fn primary(&mut self) -> Result<Expr> {
        let token = self.peek().clone();

        if let Some(literal) = token.literal() {
            self.advance();
            return Ok(Expr::new_literal(literal))
        }

        match token.kind {
            TokenKind::Identifier => {
                self.advance();
                Ok(Expr::new_variable(token))
            },
            TokenKind::LeftParen => {
                self.advance();
                let expression = Box::new(self.expression()?);
                self.consume(&TokenKind::RightParen, "Expected ')' after expression.")?;
                Ok(Expr::new_grouping(expression))
            },
            _ => Err(Error::syntactic(SyntaxError::UnexpectedToken, token, "Expected expression."))
        }
    }

    fn consume(&mut self, kind: &TokenKind, error_msg: &str) -> Result<Token> {
        if let Some(token) = self.match_single(kind) {
            Ok(token)
        } else {
            Err(Error::syntactic(SyntaxError::MissingExpectedToken, self.peek().clone(), error_msg))
        }
    }

    fn match_binary_precedence_with_tokens(
        &mut self,
        parse: impl Fn(&mut Self) -> Result<Expr>,
        kinds: &[&TokenKind]
    ) -> Result<Expr> {
        let mut e = parse(self)?;

        while let Some(token) = self.match_any(kinds) {
            let right = Box::new(parse(self)?);
            e = Expr::new_binary(Box::new(e), token, right)
        }

        Ok(e)
    }

    fn match_single(&mut self, kind: &TokenKind) -> Option<Token> {
        if self.check_next(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    fn match_any(&mut self, kinds: &[&TokenKind]) -> Option<Token> {
        kinds.iter().find_map(|k| self.match_single(k))
    }

    fn check_next(&self, kind: &TokenKind) -> bool {
        !self.is_at_end() && &self.peek().kind == kind
    }

    fn checkpoint(&self) -> usize {
        self.current
    }

    fn restore(&mut self, checkpoint: usize) {
        self.current = checkpoint;
    }

    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous().clone()
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::EndOfFile
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{printer, scanner::Scanner};

    fn assert_tokens_parse_to_expr(tokens: Vec<Token>, expr: Expr) -> Result<()> {
        let mut parser = Parser::new(tokens);
        let parsed = parser.expression()?;
        assert_eq!(expr, parsed);
        Ok(())
    }

    fn parse_source(src: &str) -> Vec<Result<Stmt>> {
        let tokens = Scanner::new(src)
            .scan_tokens()
            .into_iter()
            .collect::<Result<Vec<_>>>()
            .expect("test sources should scan cleanly");
        Parser::new(tokens).parse()
    }

    fn print_source(src: &str) -> Result<Vec<String>> {
        parse_source(src)
            .into_iter()
            .map(|s| s.map(|s| printer::print_stmt(&s)))
            .collect()
    }

    #[test]
    fn string_literal_token() -> Result<()> {
        assert_tokens_parse_to_expr(
            vec![
                Token::make(TokenKind::String("abc".into())),
            ],
            Expr::new_literal(Literal::String("abc".into()))
        )
    }

    #[test]
    fn number_literal_token() -> Result<()> {
        assert_tokens_parse_to_expr(
            vec![
                Token::make(TokenKind::Number(5.1)),
            ],
            Expr::new_literal(Literal::Number(5.1))
        )
    }

    #[test]
    fn nil_literal_token() -> Result<()> {
        assert_tokens_parse_to_expr(
            vec![
                Token::make(TokenKind::Nil),
            ],
            Expr::new_literal(Literal::Nil)
        )
    }

    #[test]
    fn bool_literal_tokens() -> Result<()> {
        for (kind, expected) in [(TokenKind::True, Literal::Bool(true)), (TokenKind::False, Literal::Bool(false))].iter() {
            assert_tokens_parse_to_expr(
                vec![
                    Token::make(kind.clone()),
                ],
                Expr::new_literal(expected.clone())
            )?;
        }
        Ok(())
    }

    #[test]
    fn unary_op_tokens() -> Result<()> {
        let not = Token::make(TokenKind::Bang);
        assert_tokens_parse_to_expr(
            vec![
                not.clone(),
                Token::make(TokenKind::True),
            ],
            Expr::new_unary(Some(not), Box::new(Expr::make(true)))
        )
    }

    #[test]
    fn factors_bind_tighter_than_terms() -> Result<()> {
        assert_eq!(vec!["(; (+ 2 (* 3 4)))"], print_source("2 + 3 * 4;")?);
        assert_eq!(vec!["(; (+ (* 2 3) 4))"], print_source("2 * 3 + 4;")?);
        assert_eq!(vec!["(; (- (- 10 4) 3))"], print_source("10 - 4 - 3;")?);
        Ok(())
    }

    #[test]
    fn assignment_is_right_associative() -> Result<()> {
        assert_eq!(vec!["(; (= a (= b 1)))"], print_source("a = b = 1;")?);
        Ok(())
    }

    #[test]
    fn non_assignments_fall_back_to_logic_or() -> Result<()> {
        assert_eq!(vec!["(; (or a (and b (== c d))))"], print_source("a or b and c == d;")?);
        assert_eq!(vec!["(; (call f (= a 1)))"], print_source("f(a = 1);")?);
        Ok(())
    }

    #[test]
    fn invalid_assignment_targets_are_rejected() {
        let parsed = parse_source("a + b = 1;");
        let error = parsed.last().and_then(|r| r.as_ref().err());
        assert_eq!(Some(SyntaxError::MissingExpectedToken), error.and_then(|e| e.syntax_kind()));
    }

    #[test]
    fn unary_operators_nest() -> Result<()> {
        assert_eq!(vec!["(; (! (! true)))"], print_source("!!true;")?);
        assert_eq!(vec!["(; (- (group (* (- 5) 2))))"], print_source("-(-5*2);")?);
        Ok(())
    }

    #[test]
    fn calls_can_be_chained() -> Result<()> {
        assert_eq!(vec!["(; (call (call f 1) 2 3))"], print_source("f(1)(2, 3);")?);
        Ok(())
    }

    #[test]
    fn for_loops_desugar_into_while_loops_with_the_increment() -> Result<()> {
        assert_eq!(
            vec!["(block (var i 0) (while (< i 3) (block (print i) (; (= i (+ i 1))))))"],
            print_source("for (var i = 0; i < 3; i = i + 1) print i;")?
        );
        Ok(())
    }

    #[test]
    fn for_loop_clauses_may_be_empty() -> Result<()> {
        assert_eq!(
            vec!["(block (; nil) (while true (block)))"],
            print_source("for (;;) {}")?
        );
        assert_eq!(
            vec!["(block (; (= i 0)) (while (< i 3) (block (; (= i (+ i 1))))))"],
            print_source("for (i = 0; i < 3;) { i = i + 1; }")?
        );
        Ok(())
    }

    #[test]
    fn bad_loop_declarations_report_the_declaration_error() {
        let parsed = parse_source("for (var = 1; true;) {}");
        let error = parsed.last().and_then(|r| r.as_ref().err()).map(|e| e.to_string());
        assert_eq!(Some("[line 1:10] Error at '=': Expected variable name.".to_string()), error);
    }

    #[test]
    fn empty_statements_are_nil_expressions() -> Result<()> {
        assert_eq!(vec!["(print nil)", "(; nil)", "(; nil)"], print_source("print;;;")?);
        Ok(())
    }

    #[test]
    fn functions_collect_parameters_and_body() -> Result<()> {
        assert_eq!(
            vec!["(fun add (a b) (return (+ a b)))", "(; (call add 1 2))"],
            print_source("fun add(a, b) { return a + b; }\nadd(1, 2);")?
        );
        Ok(())
    }

    #[test]
    fn return_outside_a_function_is_rejected() {
        let parsed = parse_source("return 1;");
        let error = parsed.last().and_then(|r| r.as_ref().err()).map(|e| e.to_string());
        assert_eq!(Some("[line 1:1] Error at 'return': Cannot return from top-level code.".to_string()), error);
    }

    #[test]
    fn parsing_stops_at_the_first_error() {
        let parsed = parse_source("print 1;\nprint 2\nprint 3;");
        assert_eq!(2, parsed.len());
        assert!(parsed[0].is_ok());
        let error = parsed[1].as_ref().err().map(|e| e.to_string());
        assert_eq!(Some("[line 3:1] Error at 'print': Expected ';' after value.".to_string()), error);
    }

    #[test]
    fn missing_semicolon_at_end_of_input() {
        let parsed = parse_source("print 1");
        let error = parsed.last().and_then(|r| r.as_ref().err()).map(|e| e.to_string());
        assert_eq!(Some("[line 1:1] Error at end: Expected ';' after value.".to_string()), error);
    }

    #[test]
    fn parses_a_whole_program() {
        let program = r#"
            fun printSum(a,b) {
                print a+b;
                var x;
                var z = 2 * 3 + 4; // factors before terms

                for(var y = 0;y<3 and y>-1;y=y+1){
                    if(y==2){
                        return false;
                    }
                    else
                        x = 10-5 == 5 or -(-5*2) == 7;
                }
                printSum(x+1,y/2);

                fun innerFunction(){
                    print "i am an inner function";
                }

                var text = "hello world";

                print text + "!";;;;;;;

                {
                    var privateVar = 69;
                }

            }
            print 25+60;
        "#;
        let statements: Vec<_> = parse_source(program).into_iter().collect::<Result<_>>()
            .expect("program should parse");

        assert_eq!(2, statements.len());
        match &statements[0] {
            Stmt::Function(f) => {
                assert!(matches!(f.body[0], Stmt::Print(_)));
                assert_eq!(TokenKind::Identifier, f.params[0].kind);
                assert_eq!(15, f.body.len());
            },
            other => panic!("expected a function, got {:?}", other),
        }
        assert!(matches!(statements[1], Stmt::Print(_)));
    }

    impl Token {
        fn make(kind: TokenKind) -> Token {
            Token { kind, lexeme: "".into(), line: 0, column: 0 }
        }
    }

    impl Expr {
        fn make(b: bool) -> Expr {
            Expr::new_literal(Literal::Bool(b))
        }
    }
}
