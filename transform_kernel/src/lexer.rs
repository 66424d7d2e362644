//! Rule-script lexer.
//!
//! Produces (token, line) pairs. `#` starts a comment running to end of
//! line. String literals are double-quoted with \" \\ \n \t escapes.
//! Integers are decimal; negative numbers come from unary minus.

use crate::error::ScriptError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Int(i64),
    Str(String),
    True,
    False,
    Unset,
    If,
    Else,
    In,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Assign,
    EqEq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    AndAnd,
    OrOr,
    Semi,
}

fn parse_err(line: u32, message: impl Into<String>) -> ScriptError {
    ScriptError::Parse {
        line,
        message: message.into(),
    }
}

/// Tokenize a script. Fails with `ScriptError::Parse` on the first
/// malformed token.
pub fn tokenize(src: &str) -> Result<Vec<(Token, u32)>, ScriptError> {
    let mut tokens = Vec::new();
    let mut chars = src.chars().peekable();
    let mut line: u32 = 1;

    while let Some(&c) = chars.peek() {
        match c {
            '\n' => {
                line += 1;
                chars.next();
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            '#' => {
                while let Some(&c) = chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        ident.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let token = match ident.as_str() {
                    "true" => Token::True,
                    "false" => Token::False,
                    "unset" => Token::Unset,
                    "if" => Token::If,
                    "else" => Token::Else,
                    "in" => Token::In,
                    _ => Token::Ident(ident),
                };
                tokens.push((token, line));
            }
            c if c.is_ascii_digit() => {
                let mut digits = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_digit() {
                        digits.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let n: i64 = digits
                    .parse()
                    .map_err(|_| parse_err(line, format!("integer literal {} out of range", digits)))?;
                tokens.push((Token::Int(n), line));
            }
            '"' => {
                chars.next();
                let mut s = String::new();
                loop {
                    match chars.next() {
                        None => return Err(parse_err(line, "unterminated string literal")),
                        Some('"') => break,
                        Some('\n') => {
                            return Err(parse_err(line, "unterminated string literal"))
                        }
                        Some('\\') => match chars.next() {
                            Some('"') => s.push('"'),
                            Some('\\') => s.push('\\'),
                            Some('n') => s.push('\n'),
                            Some('t') => s.push('\t'),
                            Some(other) => {
                                return Err(parse_err(
                                    line,
                                    format!("unknown escape \\{}", other),
                                ))
                            }
                            None => return Err(parse_err(line, "unterminated string literal")),
                        },
                        Some(other) => s.push(other),
                    }
                }
                tokens.push((Token::Str(s), line));
            }
            _ => {
                chars.next();
                let token = match c {
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    '{' => Token::LBrace,
                    '}' => Token::RBrace,
                    ',' => Token::Comma,
                    '.' => Token::Dot,
                    ';' => Token::Semi,
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '/' => Token::Slash,
                    '%' => Token::Percent,
                    '=' => {
                        if chars.peek() == Some(&'=') {
                            chars.next();
                            Token::EqEq
                        } else {
                            Token::Assign
                        }
                    }
                    '!' => {
                        if chars.peek() == Some(&'=') {
                            chars.next();
                            Token::Ne
                        } else {
                            Token::Bang
                        }
                    }
                    '<' => {
                        if chars.peek() == Some(&'=') {
                            chars.next();
                            Token::Le
                        } else {
                            Token::Lt
                        }
                    }
                    '>' => {
                        if chars.peek() == Some(&'=') {
                            chars.next();
                            Token::Ge
                        } else {
                            Token::Gt
                        }
                    }
                    '&' => {
                        if chars.peek() == Some(&'&') {
                            chars.next();
                            Token::AndAnd
                        } else {
                            return Err(parse_err(line, "expected && (single & is not an operator)"));
                        }
                    }
                    '|' => {
                        if chars.peek() == Some(&'|') {
                            chars.next();
                            Token::OrOr
                        } else {
                            return Err(parse_err(line, "expected || (single | is not an operator)"));
                        }
                    }
                    other => {
                        return Err(parse_err(line, format!("unexpected character {:?}", other)))
                    }
                };
                tokens.push((token, line));
            }
        }
    }

    Ok(tokens)
}
