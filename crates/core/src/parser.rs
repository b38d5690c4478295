//! Reads scenario text into [`Expression`] trees.

use crate::ast::Expression;
use crate::error::ParseError;
use crate::lexer::{lex, Spanned, Token};

/// Deepest list nesting the reader accepts.
pub const MAX_DEPTH: usize = 256;

// ──────────────────────────────────────────────
// Parser
// ──────────────────────────────────────────────

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Spanned]) -> Self {
        Parser {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn cur(&self) -> &Spanned {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &Token {
        &self.cur().token
    }

    fn advance(&mut self) -> &Spanned {
        let t = &self.tokens[self.pos.min(self.tokens.len() - 1)];
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    fn err(&self, msg: impl Into<String>) -> ParseError {
        ParseError::new(self.cur().line, msg)
    }

    fn at_eof(&self) -> bool {
        self.peek() == &Token::Eof
    }

    fn parse_expr(&mut self) -> Result<Expression, ParseError> {
        match self.peek().clone() {
            Token::Word(w) => {
                self.advance();
                Ok(Expression::Atom(w))
            }
            Token::Str(s) => {
                self.advance();
                Ok(Expression::Atom(s))
            }
            Token::LParen => {
                if self.depth >= MAX_DEPTH {
                    return Err(self.err(format!("lists nested deeper than {MAX_DEPTH}")));
                }
                let open_line = self.cur().line;
                self.advance();
                self.depth += 1;
                let mut items = Vec::new();
                loop {
                    match self.peek() {
                        Token::RParen => {
                            self.advance();
                            self.depth -= 1;
                            return Ok(Expression::List(items));
                        }
                        Token::Eof => {
                            return Err(ParseError::new(open_line, "unclosed '(' opened here"));
                        }
                        _ => items.push(self.parse_expr()?),
                    }
                }
            }
            Token::RParen => Err(self.err("unexpected ')'")),
            Token::Eof => Err(self.err("unexpected end of input")),
        }
    }

    fn parse_all(&mut self) -> Result<Vec<Expression>, ParseError> {
        let mut items = Vec::new();
        while !self.at_eof() {
            items.push(self.parse_expr()?);
        }
        Ok(items)
    }
}

/// Parses exactly one expression.
pub fn parse_expression(src: &str) -> Result<Expression, ParseError> {
    let tokens = lex(src)?;
    let mut p = Parser::new(&tokens);
    let expr = p.parse_expr()?;
    if !p.at_eof() {
        return Err(p.err(format!("unexpected trailing input {:?}", p.peek())));
    }
    Ok(expr)
}

/// Parses one scenario command.
///
/// Several top-level items are grouped into a single list, so
/// `Equal (Exactly 0) Zero` reads the same as `(Equal (Exactly 0) Zero)`.
/// A lone item is returned unchanged.
pub fn parse_command(src: &str) -> Result<Expression, ParseError> {
    let tokens = lex(src)?;
    let mut p = Parser::new(&tokens);
    let mut items = p.parse_all()?;
    match items.len() {
        0 => Err(ParseError::new(1, "empty command")),
        1 => Ok(items.remove(0)),
        _ => Ok(Expression::List(items)),
    }
}

/// Parses a multi-line script: one command per non-blank line.
pub fn parse_script(src: &str) -> Result<Vec<Expression>, ParseError> {
    let mut commands = Vec::new();
    for (idx, line) in src.lines().enumerate() {
        let line_no = idx as u32 + 1;
        let tokens = lex(line).map_err(|e| ParseError::new(line_no, e.message))?;
        let mut p = Parser::new(&tokens);
        let mut items = p
            .parse_all()
            .map_err(|e| ParseError::new(line_no, e.message))?;
        match items.len() {
            0 => continue,
            1 => commands.push(items.remove(0)),
            _ => commands.push(Expression::List(items)),
        }
    }
    Ok(commands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn a(s: &str) -> Expression {
        Expression::atom(s)
    }

    #[test]
    fn parses_nested_list() {
        let e = parse_expression("(Equal (Exactly 0) Zero)").unwrap();
        assert_eq!(
            e,
            Expression::list([
                a("Equal"),
                Expression::list([a("Exactly"), a("0")]),
                a("Zero"),
            ])
        );
    }

    #[test]
    fn command_without_outer_parens_is_grouped() {
        let bare = parse_command("Equal (Exactly 0) Zero").unwrap();
        let wrapped = parse_command("(Equal (Exactly 0) Zero)").unwrap();
        assert_eq!(bare, wrapped);
    }

    #[test]
    fn single_atom_command_stays_atom() {
        assert_eq!(parse_command("Zero").unwrap(), a("Zero"));
    }

    #[test]
    fn quoted_string_becomes_atom() {
        let e = parse_expression(r#"(String "hello world")"#).unwrap();
        assert_eq!(e, Expression::list([a("String"), a("hello world")]));
    }

    #[test]
    fn empty_list_is_allowed() {
        assert_eq!(parse_expression("()").unwrap(), Expression::List(vec![]));
    }

    #[test]
    fn unclosed_paren_reports_opening_line() {
        let err = parse_expression("\n(List 1\n 2").unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn nesting_depth_is_bounded() {
        let ok = format!("{}{}", "(".repeat(MAX_DEPTH), ")".repeat(MAX_DEPTH));
        assert!(parse_expression(&ok).is_ok());

        let deep = "(".repeat(100_000);
        let err = parse_expression(&deep).unwrap_err();
        assert_eq!(err.message, "lists nested deeper than 256");
    }

    #[test]
    fn stray_close_paren_is_an_error() {
        assert!(parse_expression(")").is_err());
        assert!(parse_expression("(a))").is_err());
    }

    #[test]
    fn empty_command_is_an_error() {
        assert!(parse_command("  -- only a comment").is_err());
    }

    #[test]
    fn display_round_trips_through_parser() {
        let src = r#"(Map (name "Jane Doe") (age (Exactly 30)))"#;
        let e = parse_expression(src).unwrap();
        assert_eq!(parse_expression(&e.to_string()).unwrap(), e);
    }

    #[test]
    fn script_skips_blank_and_comment_lines() {
        let script = "-- setup\nZero\n\nEqual (Exactly 1) (Exactly 1)\n";
        let cmds = parse_script(script).unwrap();
        assert_eq!(cmds.len(), 2);
        assert_eq!(cmds[0], a("Zero"));
    }

    #[test]
    fn script_error_carries_line_number() {
        let err = parse_script("Zero\n(List 1").unwrap_err();
        assert_eq!(err.line, 2);
    }
}
