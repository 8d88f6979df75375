use std::{
    collections::VecDeque,
    iter::Enumerate,
    str::{Chars, Lines},
};

use peekmore::{PeekMore, PeekMoreIterator};
use phf::phf_map;
use tracing::trace;

use crate::{
    error::{Error, LexicalError, Result},
    token::{Token, TokenKind},
};

static KEYWORDS: phf::Map<&'static str, TokenKind> = phf_map! {
    "and" => TokenKind::And,
    "class" => TokenKind::Class,
    "else" => TokenKind::Else,
    "false" => TokenKind::False,
    "for" => TokenKind::For,
    "fun" => TokenKind::Fun,
    "if" => TokenKind::If,
    "nil" => TokenKind::Nil,
    "or" => TokenKind::Or,
    "print" => TokenKind::Print,
    "return" => TokenKind::Return,
    "super" => TokenKind::Super,
    "this" => TokenKind::This,
    "true" => TokenKind::True,
    "var" => TokenKind::Var,
    "while" => TokenKind::While,
};

/// Splits source text into tokens, one line at a time.
///
/// Every line is whitespace-normalised first (trimmed, runs collapsed to a
/// single space), so no token ever spans a line break.
pub struct Scanner<'a> {
    lines: Enumerate<Lines<'a>>,
    pending: VecDeque<Result<Token>>,
    line_count: usize,
}

impl <'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Result<Token>> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Some(token);
            }
            let (index, line) = self.lines.next()?;
            self.line_count = index + 1;
            self.pending.extend(scan_line(line, self.line_count));
        }
    }
}

impl <'a> Scanner<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            lines: src.lines().enumerate(),
            pending: VecDeque::new(),
            line_count: 0,
        }
    }

    pub fn scan_tokens(mut self) -> Vec<Result<Token>> {
        let mut tokens = self.by_ref().collect::<Vec<Result<Token>>>();
        tokens.push(Ok(Token::new(TokenKind::EndOfFile, "", self.line_count.max(1), 1)));
        tokens
    }
}

fn scan_line(line: &str, number: usize) -> Vec<Result<Token>> {
    let normalised = line.split_whitespace().collect::<Vec<_>>().join(" ");
    let tokens: Vec<_> = LineScanner::new(&normalised, number).collect();
    trace!(line = number, tokens = tokens.len(), "scanned line");
    tokens
}

enum Candidate {
    Comment,
    Token(TokenKind),
}

/// Maximal-munch scanning of a single normalised line: the candidate lexeme
/// grows one character at a time for as long as it still classifies, and the
/// last classified candidate becomes the token.
struct LineScanner<'a> {
    src: PeekMoreIterator<Chars<'a>>,
    lexeme_buffer: String,
    line: usize,
    column: usize,
}

impl <'a> Iterator for LineScanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Result<Token>> {
        while self.src.peek() == Some(&' ') {
            self.advance();
        }
        self.src.peek()?;

        let start = self.column + 1;
        let mut best: Option<TokenKind> = None;
        self.lexeme_buffer.clear();

        while let Some(&next) = self.src.peek() {
            self.lexeme_buffer.push(next);
            let decimal_point = self.is_decimal_point(&best, next);
            match classify(&self.lexeme_buffer) {
                Some(Candidate::Comment) => {
                    while self.src.next().is_some() {}
                    return None;
                }
                Some(Candidate::Token(kind)) => {
                    self.advance();
                    best = Some(kind);
                }
                None if best.is_none() && self.lexeme_buffer.starts_with('"') => {
                    self.advance();
                }
                None if decimal_point => {
                    self.advance();
                }
                None => {
                    self.lexeme_buffer.pop();
                    break;
                }
            }
        }

        let lexeme = self.lexeme_buffer.clone();
        Some(match best {
            Some(kind) => Ok(Token::new(kind, lexeme, self.line, start)),
            None if lexeme.is_empty() => {
                let c = self.advance().unwrap_or_default();
                Err(Error::lexical(
                    LexicalError::UnrecognizedCharacter,
                    self.line,
                    start,
                    format!("Unexpected character '{}'.", c),
                ))
            }
            None => Err(Error::lexical(
                LexicalError::UnterminatedString,
                self.line,
                start,
                "Unterminated string literal.",
            )),
        })
    }
}

impl <'a> LineScanner<'a> {
    fn new(line: &'a str, number: usize) -> Self {
        Self {
            src: line.chars().peekmore(),
            lexeme_buffer: String::new(),
            line: number,
            column: 0,
        }
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.src.next()?;
        self.column += 1;
        Some(c)
    }

    // `12.5` must not be committed as `12` when the `.` arrives, so a dot
    // directly followed by a digit extends a whole number.
    fn is_decimal_point(&mut self, best: &Option<TokenKind>, next: char) -> bool {
        next == '.'
            && matches!(best, Some(TokenKind::Number(_)))
            && !self.lexeme_buffer[..self.lexeme_buffer.len() - 1].contains('.')
            && self.src.peek_nth(1).map_or(false, |c| c.is_ascii_digit())
    }
}

fn classify(text: &str) -> Option<Candidate> {
    use TokenKind::*;

    if text == "//" {
        return Some(Candidate::Comment);
    }
    if is_number(text) {
        return text.parse().ok().map(|n| Candidate::Token(Number(n)));
    }
    if is_string(text) {
        return Some(Candidate::Token(String(text[1..text.len() - 1].to_string())));
    }
    if let Some(keyword) = KEYWORDS.get(text) {
        return Some(Candidate::Token(keyword.clone()));
    }
    if is_identifier(text) {
        return Some(Candidate::Token(Identifier));
    }

    let kind = match text {
        "(" => LeftParen,
        ")" => RightParen,
        "{" => LeftBrace,
        "}" => RightBrace,
        "," => Comma,
        "." => Dot,
        "-" => Minus,
        "+" => Plus,
        ";" => Semicolon,
        "/" => Slash,
        "*" => Star,
        "!" => Bang,
        "!=" => BangEqual,
        "=" => Equal,
        "==" => EqualEqual,
        ">" => Greater,
        ">=" => GreaterEqual,
        "<" => Less,
        "<=" => LessEqual,
        _ => return None,
    };
    Some(Candidate::Token(kind))
}

fn is_number(text: &str) -> bool {
    let is_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    let mut parts = text.splitn(2, '.');
    parts.next().map_or(false, is_digits) && parts.next().map_or(true, is_digits)
}

fn is_string(text: &str) -> bool {
    text.len() >= 2 && text.starts_with('"') && text.ends_with('"')
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    let can_start = |c: char| c.is_ascii_lowercase() || c == '_';
    let can_continue = |c: char| c.is_ascii_alphanumeric() || c == '_';
    chars.next().map_or(false, can_start) && chars.all(can_continue)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Result<Vec<TokenKind>> {
        Scanner::new(src)
            .scan_tokens()
            .into_iter()
            .map(|t| t.map(|t| t.kind))
            .collect()
    }

    #[test]
    fn decimal_numbers_are_a_single_token() -> Result<()> {
        use TokenKind::*;
        assert_eq!(vec![Number(12.5), EndOfFile], kinds("12.5")?);
        assert_eq!(vec![Number(12.5), Semicolon, EndOfFile], kinds("12.5;")?);
        Ok(())
    }

    #[test]
    fn trailing_dot_is_not_part_of_a_number() -> Result<()> {
        use TokenKind::*;
        assert_eq!(vec![Number(12.0), Dot, EndOfFile], kinds("12.")?);
        assert_eq!(vec![Number(1.5), Dot, Number(3.0), EndOfFile], kinds("1.5.3")?);
        Ok(())
    }

    #[test]
    fn operators_take_the_longest_match() -> Result<()> {
        use TokenKind::*;
        assert_eq!(
            vec![Identifier, BangEqual, Identifier, EqualEqual, Bang, Identifier, LessEqual, Minus, Number(1.0), EndOfFile],
            kinds("a!=b==!c<=-1")?
        );
        Ok(())
    }

    #[test]
    fn keywords_are_only_matched_whole() -> Result<()> {
        use TokenKind::*;
        assert_eq!(vec![Identifier, For, Identifier, Print, EndOfFile], kinds("fortune for printer print")?);
        Ok(())
    }

    #[test]
    fn identifiers_may_contain_uppercase_after_the_first_character() -> Result<()> {
        let tokens = Scanner::new("printSum(a,b_2)").scan_tokens();
        let tokens = tokens.into_iter().collect::<Result<Vec<_>>>()?;
        let lexemes: Vec<_> = tokens.iter().map(|t| t.lexeme.as_str()).collect();
        assert_eq!(vec!["printSum", "(", "a", ",", "b_2", ")", ""], lexemes);
        Ok(())
    }

    #[test]
    fn comments_run_to_the_end_of_the_line() -> Result<()> {
        use TokenKind::*;
        assert_eq!(
            vec![Var, Identifier, Equal, Number(2.0), Semicolon, Print, Identifier, Semicolon, EndOfFile],
            kinds("var x = 2; // x / 2\nprint x;")?
        );
        Ok(())
    }

    #[test]
    fn string_literals_keep_their_text_without_quotes() -> Result<()> {
        use TokenKind::*;
        assert_eq!(
            vec![String("hello world".into()), Plus, String("".into()), EndOfFile],
            kinds("\"hello   world\"+\"\"")?
        );
        Ok(())
    }

    #[test]
    fn tokens_record_line_and_column() -> Result<()> {
        let tokens = Scanner::new("var a;\n   print  a;").scan_tokens();
        let tokens = tokens.into_iter().collect::<Result<Vec<_>>>()?;
        let positions: Vec<_> = tokens.iter().map(|t| (t.line, t.column)).collect();
        assert_eq!(vec![(1, 1), (1, 5), (1, 6), (2, 1), (2, 7), (2, 8), (2, 1)], positions);
        Ok(())
    }

    #[test]
    fn end_of_file_sits_on_the_last_line() {
        let tokens = Scanner::new("print 1;\nprint 2;\n").scan_tokens();
        let eof = tokens.last().and_then(|t| t.as_ref().ok()).map(|t| (t.kind.clone(), t.line));
        assert_eq!(Some((TokenKind::EndOfFile, 2)), eof);
    }

    #[test]
    fn unrecognized_characters_are_errors() {
        let errors: Vec<_> = Scanner::new("var a = 1 @ 2;")
            .scan_tokens()
            .into_iter()
            .filter_map(|t| t.err())
            .collect();
        assert_eq!(1, errors.len());
        assert_eq!(Some(LexicalError::UnrecognizedCharacter), errors[0].lexical_kind());
        assert_eq!("[line 1:11] Error: Unexpected character '@'.", errors[0].to_string());
    }

    #[test]
    fn identifiers_cannot_start_with_an_uppercase_letter() {
        let errors: Vec<_> = Scanner::new("Foo").filter_map(|t| t.err()).collect();
        assert_eq!(Some(LexicalError::UnrecognizedCharacter), errors.first().and_then(|e| e.lexical_kind()));
    }

    #[test]
    fn unterminated_strings_are_errors() {
        let errors: Vec<_> = Scanner::new("print \"oops;\nprint 1;")
            .filter_map(|t| t.err())
            .collect();
        assert_eq!(1, errors.len());
        assert_eq!(Some(LexicalError::UnterminatedString), errors[0].lexical_kind());
        assert_eq!(1, errors[0].line());
    }
}
