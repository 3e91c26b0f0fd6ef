//! Cypher lexer: turns query text into a token stream with source spans.

use super::errors::{LexError, LexErrorKind};

/// Byte range into the original query text. Attached to every token and
/// carried through the AST for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    /// Smallest span covering both operands.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Keywords (case-insensitive in source)
    Match,
    Optional,
    Where,
    Return,
    Distinct,
    Order,
    By,
    Asc,
    Desc,
    Skip,
    Limit,
    And,
    Or,
    Not,
    In,
    Is,
    Null,
    True,
    False,
    As,

    // Literals
    Integer,
    Float,
    StringLit,

    Identifier,
    Parameter,

    // Punctuation
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Dot,
    DotDot,
    Colon,
    Semicolon,
    Pipe,
    Star,

    // Operators
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    Dash,
    Arrow,     // ->
    LeftArrow, // <-

    Eof,
}

impl TokenKind {
    /// Human-readable name used in "expected X, found Y" diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Match => "MATCH",
            TokenKind::Optional => "OPTIONAL",
            TokenKind::Where => "WHERE",
            TokenKind::Return => "RETURN",
            TokenKind::Distinct => "DISTINCT",
            TokenKind::Order => "ORDER",
            TokenKind::By => "BY",
            TokenKind::Asc => "ASC",
            TokenKind::Desc => "DESC",
            TokenKind::Skip => "SKIP",
            TokenKind::Limit => "LIMIT",
            TokenKind::And => "AND",
            TokenKind::Or => "OR",
            TokenKind::Not => "NOT",
            TokenKind::In => "IN",
            TokenKind::Is => "IS",
            TokenKind::Null => "NULL",
            TokenKind::True => "TRUE",
            TokenKind::False => "FALSE",
            TokenKind::As => "AS",
            TokenKind::Integer => "integer literal",
            TokenKind::Float => "float literal",
            TokenKind::StringLit => "string literal",
            TokenKind::Identifier => "identifier",
            TokenKind::Parameter => "parameter",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Comma => "','",
            TokenKind::Dot => "'.'",
            TokenKind::DotDot => "'..'",
            TokenKind::Colon => "':'",
            TokenKind::Semicolon => "';'",
            TokenKind::Pipe => "'|'",
            TokenKind::Star => "'*'",
            TokenKind::Eq => "'='",
            TokenKind::Neq => "'<>'",
            TokenKind::Lt => "'<'",
            TokenKind::Lte => "'<='",
            TokenKind::Gt => "'>'",
            TokenKind::Gte => "'>='",
            TokenKind::Dash => "'-'",
            TokenKind::Arrow => "'->'",
            TokenKind::LeftArrow => "'<-'",
            TokenKind::Eof => "end of input",
        }
    }
}

fn keyword_kind(word: &str) -> Option<TokenKind> {
    match word.to_ascii_uppercase().as_str() {
        "MATCH" => Some(TokenKind::Match),
        "OPTIONAL" => Some(TokenKind::Optional),
        "WHERE" => Some(TokenKind::Where),
        "RETURN" => Some(TokenKind::Return),
        "DISTINCT" => Some(TokenKind::Distinct),
        "ORDER" => Some(TokenKind::Order),
        "BY" => Some(TokenKind::By),
        "ASC" | "ASCENDING" => Some(TokenKind::Asc),
        "DESC" | "DESCENDING" => Some(TokenKind::Desc),
        "SKIP" => Some(TokenKind::Skip),
        "LIMIT" => Some(TokenKind::Limit),
        "AND" => Some(TokenKind::And),
        "OR" => Some(TokenKind::Or),
        "NOT" => Some(TokenKind::Not),
        "IN" => Some(TokenKind::In),
        "IS" => Some(TokenKind::Is),
        "NULL" => Some(TokenKind::Null),
        "TRUE" => Some(TokenKind::True),
        "FALSE" => Some(TokenKind::False),
        "AS" => Some(TokenKind::As),
        _ => None,
    }
}

/// Tokenize a Cypher query. The returned stream always ends with an
/// [`TokenKind::Eof`] token spanning the end of input.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, ch)) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }

            // Line comments: // ... to end of line
            '/' if matches!(chars.clone().nth(1), Some((_, '/'))) => {
                while chars.peek().is_some_and(|&(_, c)| c != '\n') {
                    chars.next();
                }
            }

            '\'' | '"' => {
                let token = lex_string(&mut chars, pos, ch)?;
                tokens.push(token);
            }

            c if c.is_ascii_digit() => {
                let token = lex_number(&mut chars, input, pos)?;
                tokens.push(token);
            }

            c if c.is_alphabetic() || c == '_' => {
                let start = pos;
                let mut end = pos;
                while let Some(&(p, c)) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' {
                        end = p + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let text = &input[start..end];
                let kind = keyword_kind(text).unwrap_or(TokenKind::Identifier);
                tokens.push(Token {
                    kind,
                    span: Span::new(start, end),
                    text: text.to_string(),
                });
            }

            '$' => {
                chars.next();
                let start = pos;
                let mut end = pos + 1;
                while let Some(&(p, c)) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' {
                        end = p + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token {
                    kind: TokenKind::Parameter,
                    span: Span::new(start, end),
                    text: input[start + 1..end].to_string(),
                });
            }

            _ => {
                let token = lex_symbol(&mut chars, pos, ch)?;
                tokens.push(token);
            }
        }
    }

    let end = input.len();
    tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span::new(end, end),
        text: String::new(),
    });
    Ok(tokens)
}

fn lex_string(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    start: usize,
    quote: char,
) -> Result<Token, LexError> {
    chars.next(); // opening quote
    let mut value = String::new();
    loop {
        match chars.next() {
            Some((esc_pos, '\\')) => match chars.next() {
                Some((_, 'n')) => value.push('\n'),
                Some((_, 't')) => value.push('\t'),
                Some((_, 'r')) => value.push('\r'),
                Some((_, '\\')) => value.push('\\'),
                Some((_, '\'')) => value.push('\''),
                Some((_, '"')) => value.push('"'),
                Some((p, c)) => {
                    return Err(LexError {
                        span: Span::new(esc_pos, p + c.len_utf8()),
                        kind: LexErrorKind::BadEscape(c),
                    });
                }
                None => {
                    return Err(LexError {
                        span: Span::new(start, esc_pos + 1),
                        kind: LexErrorKind::UnterminatedString,
                    });
                }
            },
            Some((end, c)) if c == quote => {
                return Ok(Token {
                    kind: TokenKind::StringLit,
                    span: Span::new(start, end + 1),
                    text: value,
                });
            }
            Some((_, c)) => value.push(c),
            None => {
                return Err(LexError {
                    span: Span::new(start, start + 1),
                    kind: LexErrorKind::UnterminatedString,
                });
            }
        }
    }
}

fn lex_number(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    input: &str,
    start: usize,
) -> Result<Token, LexError> {
    let mut end = start;
    let mut is_float = false;

    while let Some(&(p, c)) = chars.peek() {
        if c.is_ascii_digit() {
            end = p + 1;
            chars.next();
        } else if c == '.' {
            // Look ahead: `1..3` is a path-length range, not a float.
            if matches!(chars.clone().nth(1), Some((_, '.'))) {
                break;
            }
            if is_float {
                break;
            }
            // A trailing dot with no digit is property access, not a float.
            if !matches!(chars.clone().nth(1), Some((_, d)) if d.is_ascii_digit()) {
                break;
            }
            is_float = true;
            end = p + 1;
            chars.next();
        } else if c.is_alphabetic() {
            // `12abc` is neither a number nor an identifier
            return Err(LexError {
                span: Span::new(start, p + c.len_utf8()),
                kind: LexErrorKind::BadNumber,
            });
        } else {
            break;
        }
    }

    let text = &input[start..end];
    let kind = if is_float {
        text.parse::<f64>().map_err(|_| LexError {
            span: Span::new(start, end),
            kind: LexErrorKind::BadNumber,
        })?;
        TokenKind::Float
    } else {
        text.parse::<i64>().map_err(|_| LexError {
            span: Span::new(start, end),
            kind: LexErrorKind::BadNumber,
        })?;
        TokenKind::Integer
    };

    Ok(Token {
        kind,
        span: Span::new(start, end),
        text: text.to_string(),
    })
}

fn lex_symbol(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    pos: usize,
    ch: char,
) -> Result<Token, LexError> {
    let two = |kind: TokenKind, text: &str| Token {
        kind,
        span: Span::new(pos, pos + text.len()),
        text: text.to_string(),
    };

    let next_ch = chars.clone().nth(1).map(|(_, c)| c);
    let token = match (ch, next_ch) {
        ('<', Some('=')) => {
            chars.next();
            chars.next();
            return Ok(two(TokenKind::Lte, "<="));
        }
        ('<', Some('>')) => {
            chars.next();
            chars.next();
            return Ok(two(TokenKind::Neq, "<>"));
        }
        ('<', Some('-')) => {
            chars.next();
            chars.next();
            return Ok(two(TokenKind::LeftArrow, "<-"));
        }
        ('>', Some('=')) => {
            chars.next();
            chars.next();
            return Ok(two(TokenKind::Gte, ">="));
        }
        ('!', Some('=')) => {
            chars.next();
            chars.next();
            return Ok(two(TokenKind::Neq, "!="));
        }
        ('-', Some('>')) => {
            chars.next();
            chars.next();
            return Ok(two(TokenKind::Arrow, "->"));
        }
        ('.', Some('.')) => {
            chars.next();
            chars.next();
            return Ok(two(TokenKind::DotDot, ".."));
        }
        ('(', _) => Token {
            kind: TokenKind::LParen,
            span: Span::new(pos, pos + 1),
            text: "(".into(),
        },
        (')', _) => Token {
            kind: TokenKind::RParen,
            span: Span::new(pos, pos + 1),
            text: ")".into(),
        },
        ('[', _) => Token {
            kind: TokenKind::LBracket,
            span: Span::new(pos, pos + 1),
            text: "[".into(),
        },
        (']', _) => Token {
            kind: TokenKind::RBracket,
            span: Span::new(pos, pos + 1),
            text: "]".into(),
        },
        ('{', _) => Token {
            kind: TokenKind::LBrace,
            span: Span::new(pos, pos + 1),
            text: "{".into(),
        },
        ('}', _) => Token {
            kind: TokenKind::RBrace,
            span: Span::new(pos, pos + 1),
            text: "}".into(),
        },
        (',', _) => Token {
            kind: TokenKind::Comma,
            span: Span::new(pos, pos + 1),
            text: ",".into(),
        },
        ('.', _) => Token {
            kind: TokenKind::Dot,
            span: Span::new(pos, pos + 1),
            text: ".".into(),
        },
        (':', _) => Token {
            kind: TokenKind::Colon,
            span: Span::new(pos, pos + 1),
            text: ":".into(),
        },
        (';', _) => Token {
            kind: TokenKind::Semicolon,
            span: Span::new(pos, pos + 1),
            text: ";".into(),
        },
        ('|', _) => Token {
            kind: TokenKind::Pipe,
            span: Span::new(pos, pos + 1),
            text: "|".into(),
        },
        ('*', _) => Token {
            kind: TokenKind::Star,
            span: Span::new(pos, pos + 1),
            text: "*".into(),
        },
        ('=', _) => Token {
            kind: TokenKind::Eq,
            span: Span::new(pos, pos + 1),
            text: "=".into(),
        },
        ('<', _) => Token {
            kind: TokenKind::Lt,
            span: Span::new(pos, pos + 1),
            text: "<".into(),
        },
        ('>', _) => Token {
            kind: TokenKind::Gt,
            span: Span::new(pos, pos + 1),
            text: ">".into(),
        },
        ('-', _) => Token {
            kind: TokenKind::Dash,
            span: Span::new(pos, pos + 1),
            text: "-".into(),
        },
        (other, _) => {
            return Err(LexError {
                span: Span::new(pos, pos + other.len_utf8()),
                kind: LexErrorKind::UnexpectedChar(other),
            });
        }
    };
    chars.next();
    Ok(token)
}
