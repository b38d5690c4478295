use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Bare token: anything up to whitespace or a paren
    Word(String),
    /// Quoted string literal (content without quotes, escapes resolved)
    Str(String),
    LParen,
    RParen,
    // End of input
    Eof,
}

#[derive(Debug, Clone)]
pub struct Spanned {
    pub token: Token,
    pub line: u32,
}

pub fn lex(src: &str) -> Result<Vec<Spanned>, ParseError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = src.chars().collect();
    let mut pos = 0usize;
    let mut line: u32 = 1;

    while pos < chars.len() {
        let c = chars[pos];

        // Line comment
        if c == '-' && pos + 1 < chars.len() && chars[pos + 1] == '-' {
            while pos < chars.len() && chars[pos] != '\n' {
                pos += 1;
            }
            continue;
        }

        // Whitespace
        if c.is_whitespace() {
            if c == '\n' {
                line += 1;
            }
            pos += 1;
            continue;
        }

        let tok_line = line;

        // String literal
        if c == '"' {
            pos += 1;
            let mut s = String::new();
            loop {
                if pos >= chars.len() {
                    return Err(ParseError::new(tok_line, "unterminated string literal"));
                }
                let sc = chars[pos];
                if sc == '"' {
                    pos += 1;
                    break;
                }
                if sc == '\\' {
                    pos += 1;
                    if pos >= chars.len() {
                        return Err(ParseError::new(tok_line, "unterminated escape in string"));
                    }
                    match chars[pos] {
                        '"' => s.push('"'),
                        '\\' => s.push('\\'),
                        'n' => s.push('\n'),
                        't' => s.push('\t'),
                        other => {
                            s.push('\\');
                            s.push(other);
                        }
                    }
                    pos += 1;
                    continue;
                }
                if sc == '\n' {
                    return Err(ParseError::new(tok_line, "unterminated string literal"));
                }
                s.push(sc);
                pos += 1;
            }
            tokens.push(Spanned {
                token: Token::Str(s),
                line: tok_line,
            });
            continue;
        }

        match c {
            '(' => {
                tokens.push(Spanned {
                    token: Token::LParen,
                    line: tok_line,
                });
                pos += 1;
                continue;
            }
            ')' => {
                tokens.push(Spanned {
                    token: Token::RParen,
                    line: tok_line,
                });
                pos += 1;
                continue;
            }
            _ => {}
        }

        let start = pos;
        while pos < chars.len() {
            let wc = chars[pos];
            if wc.is_whitespace() || wc == '(' || wc == ')' || wc == '"' {
                break;
            }
            pos += 1;
        }
        let word: String = chars[start..pos].iter().collect();
        tokens.push(Spanned {
            token: Token::Word(word),
            line: tok_line,
        });
    }

    tokens.push(Spanned {
        token: Token::Eof,
        line,
    });
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<Token> {
        lex(src).unwrap().into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn lexes_words_and_parens() {
        assert_eq!(
            kinds("(Exactly 5.0)"),
            vec![
                Token::LParen,
                Token::Word("Exactly".into()),
                Token::Word("5.0".into()),
                Token::RParen,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn lexes_quoted_strings_with_escapes() {
        assert_eq!(
            kinds(r#"Hex "0xff\"ff""#),
            vec![
                Token::Word("Hex".into()),
                Token::Str("0xff\"ff".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn skips_line_comments_and_tracks_lines() {
        let toks = lex("-- a comment\nZero\n  Some").unwrap();
        assert_eq!(toks[0].token, Token::Word("Zero".into()));
        assert_eq!(toks[0].line, 2);
        assert_eq!(toks[1].line, 3);
    }

    #[test]
    fn single_dash_is_part_of_a_word() {
        assert_eq!(kinds("-5"), vec![Token::Word("-5".into()), Token::Eof]);
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = lex("\"abc").unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.message.contains("unterminated"));
    }
}
