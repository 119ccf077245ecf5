//! Lexical scanner: the fixed token alphabet of the surface language and a
//! maximal-munch tokenizer feeding the parser driver.

use logos::Logos;
use std::fmt;

/// The kind of a token, doubling as the terminal alphabet of grammars.
///
/// `Epsilon` and `Eof` are grammar-only markers: the scanner never produces
/// them. `Trivia` covers the whitespace/comment class, which is scanned but
/// filtered out before parsing.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenKind {
    // delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Semi,
    Colon,
    Comma,
    Dot,
    // relational operators
    EqEq,
    Lt,
    Gt,
    Le,
    Ge,
    Ne,
    // arithmetic operators
    Plus,
    Minus,
    Star,
    Slash,
    StarStar,
    Percent,
    Assign,
    // logical operators
    AndAnd,
    OrOr,
    Bang,
    // bitwise operators
    Amp,
    Pipe,
    Tilde,
    Caret,
    // type keywords
    KwVoid,
    KwBool,
    KwInt,
    KwFloat,
    KwString,
    KwObject,
    KwClass,
    // control-flow keywords
    KwFor,
    KwBreak,
    KwContinue,
    KwIf,
    KwElse,
    KwReturn,
    KwSwitch,
    KwCase,
    KwDefault,
    // other keywords
    KwImport,
    KwLet,
    // identifiers and literals
    Ident,
    BoolLit,
    IntLit,
    FloatLit,
    StrLit,
    // whitespace and comments
    Trivia,
    // grammar-only markers
    Epsilon,
    Eof,
}

impl TokenKind {
    pub const ALL: &'static [TokenKind] = &[
        Self::LParen,
        Self::RParen,
        Self::LBracket,
        Self::RBracket,
        Self::LBrace,
        Self::RBrace,
        Self::Semi,
        Self::Colon,
        Self::Comma,
        Self::Dot,
        Self::EqEq,
        Self::Lt,
        Self::Gt,
        Self::Le,
        Self::Ge,
        Self::Ne,
        Self::Plus,
        Self::Minus,
        Self::Star,
        Self::Slash,
        Self::StarStar,
        Self::Percent,
        Self::Assign,
        Self::AndAnd,
        Self::OrOr,
        Self::Bang,
        Self::Amp,
        Self::Pipe,
        Self::Tilde,
        Self::Caret,
        Self::KwVoid,
        Self::KwBool,
        Self::KwInt,
        Self::KwFloat,
        Self::KwString,
        Self::KwObject,
        Self::KwClass,
        Self::KwFor,
        Self::KwBreak,
        Self::KwContinue,
        Self::KwIf,
        Self::KwElse,
        Self::KwReturn,
        Self::KwSwitch,
        Self::KwCase,
        Self::KwDefault,
        Self::KwImport,
        Self::KwLet,
        Self::Ident,
        Self::BoolLit,
        Self::IntLit,
        Self::FloatLit,
        Self::StrLit,
        Self::Trivia,
        Self::Epsilon,
        Self::Eof,
    ];

    /// The alias under which this kind appears in grammar notation.
    pub fn alias(self) -> Option<&'static str> {
        Some(match self {
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::Semi => ";",
            Self::Colon => ":",
            Self::Comma => ",",
            Self::Dot => ".",
            Self::EqEq => "==",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
            Self::Ne => "!=",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::StarStar => "**",
            Self::Percent => "%",
            Self::Assign => "=",
            Self::AndAnd => "&&",
            Self::OrOr => "||",
            Self::Bang => "!",
            Self::Amp => "&",
            Self::Pipe => "|",
            Self::Tilde => "~",
            Self::Caret => "^",
            Self::KwVoid => "void",
            Self::KwBool => "bool",
            Self::KwInt => "int",
            Self::KwFloat => "float",
            Self::KwString => "string",
            Self::KwObject => "object",
            Self::KwClass => "class",
            Self::KwFor => "for",
            Self::KwBreak => "break",
            Self::KwContinue => "continue",
            Self::KwIf => "if",
            Self::KwElse => "else",
            Self::KwReturn => "return",
            Self::KwSwitch => "switch",
            Self::KwCase => "case",
            Self::KwDefault => "default",
            Self::KwImport => "import",
            Self::KwLet => "let",
            Self::Ident => "id",
            Self::BoolLit => "bi",
            Self::IntLit => "ii",
            Self::FloatLit => "fi",
            Self::StrLit => "si",
            Self::Epsilon => "e",
            Self::Eof => "$",
            Self::Trivia => return None,
        })
    }

    /// Whether tokens of this kind are fed to the parser driver.
    pub fn needs_parse(self) -> bool {
        !matches!(self, Self::Trivia | Self::Epsilon | Self::Eof)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.alias() {
            Some(alias) => f.write_str(alias),
            None => write!(f, "{:?}", self),
        }
    }
}

/// A scanned token: its kind plus the matched slice of the source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    kind: TokenKind,
    text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// The end-of-input sentinel appended by the parser driver.
    pub fn eof() -> Self {
        Self::new(TokenKind::Eof, "")
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    // Typed payload accessors for the evaluator side.

    pub fn int_value(&self) -> Option<i64> {
        match self.kind {
            TokenKind::IntLit => self.text.parse().ok(),
            _ => None,
        }
    }

    pub fn float_value(&self) -> Option<f64> {
        match self.kind {
            TokenKind::FloatLit => self.text.parse().ok(),
            _ => None,
        }
    }

    pub fn bool_value(&self) -> Option<bool> {
        match self.kind {
            TokenKind::BoolLit => self.text.parse().ok(),
            _ => None,
        }
    }

    /// The literal content of a string token, quotes stripped.
    pub fn str_value(&self) -> Option<&str> {
        match self.kind {
            TokenKind::StrLit => self.text.strip_prefix('"')?.strip_suffix('"'),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Ident
            | TokenKind::BoolLit
            | TokenKind::IntLit
            | TokenKind::FloatLit
            | TokenKind::StrLit => write!(f, "{}", self.text),
            kind => write!(f, "{}", kind),
        }
    }
}

// The raw logos alphabet. Longest match wins; on a length tie the literal
// patterns outrank the identifier regex, so keywords and operators never
// lex as identifiers.
#[derive(Debug, Copy, Clone, PartialEq, Logos)]
enum Raw {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(";")]
    Semi,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("==")]
    EqEq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,
    #[token("!=")]
    Ne,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("**")]
    StarStar,
    #[token("%")]
    Percent,
    #[token("=")]
    Assign,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("!")]
    Bang,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("~")]
    Tilde,
    #[token("^")]
    Caret,
    #[token("void")]
    KwVoid,
    #[token("bool")]
    KwBool,
    #[token("int")]
    KwInt,
    #[token("float")]
    KwFloat,
    #[token("string")]
    KwString,
    #[token("object")]
    KwObject,
    #[token("class")]
    KwClass,
    #[token("for")]
    KwFor,
    #[token("break")]
    KwBreak,
    #[token("continue")]
    KwContinue,
    #[token("if")]
    KwIf,
    #[token("else")]
    KwElse,
    #[token("return")]
    KwReturn,
    #[token("switch")]
    KwSwitch,
    #[token("case")]
    KwCase,
    #[token("default")]
    KwDefault,
    #[token("import")]
    KwImport,
    #[token("let")]
    KwLet,
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,
    #[regex(r"true|false")]
    BoolLit,
    #[regex(r"[0-9]+")]
    IntLit,
    #[regex(r"[0-9]+\.[0-9]*")]
    FloatLit,
    #[regex(r#""([^"\\]|\\.)*""#)]
    StrLit,
    #[regex(r"([ \t\r\n\f]+|//[^\n]*|/\*[^*]*\*+([^/*][^*]*\*+)*/)+")]
    Trivia,
}

impl Raw {
    fn kind(self) -> TokenKind {
        match self {
            Self::LParen => TokenKind::LParen,
            Self::RParen => TokenKind::RParen,
            Self::LBracket => TokenKind::LBracket,
            Self::RBracket => TokenKind::RBracket,
            Self::LBrace => TokenKind::LBrace,
            Self::RBrace => TokenKind::RBrace,
            Self::Semi => TokenKind::Semi,
            Self::Colon => TokenKind::Colon,
            Self::Comma => TokenKind::Comma,
            Self::Dot => TokenKind::Dot,
            Self::EqEq => TokenKind::EqEq,
            Self::Lt => TokenKind::Lt,
            Self::Gt => TokenKind::Gt,
            Self::Le => TokenKind::Le,
            Self::Ge => TokenKind::Ge,
            Self::Ne => TokenKind::Ne,
            Self::Plus => TokenKind::Plus,
            Self::Minus => TokenKind::Minus,
            Self::Star => TokenKind::Star,
            Self::Slash => TokenKind::Slash,
            Self::StarStar => TokenKind::StarStar,
            Self::Percent => TokenKind::Percent,
            Self::Assign => TokenKind::Assign,
            Self::AndAnd => TokenKind::AndAnd,
            Self::OrOr => TokenKind::OrOr,
            Self::Bang => TokenKind::Bang,
            Self::Amp => TokenKind::Amp,
            Self::Pipe => TokenKind::Pipe,
            Self::Tilde => TokenKind::Tilde,
            Self::Caret => TokenKind::Caret,
            Self::KwVoid => TokenKind::KwVoid,
            Self::KwBool => TokenKind::KwBool,
            Self::KwInt => TokenKind::KwInt,
            Self::KwFloat => TokenKind::KwFloat,
            Self::KwString => TokenKind::KwString,
            Self::KwObject => TokenKind::KwObject,
            Self::KwClass => TokenKind::KwClass,
            Self::KwFor => TokenKind::KwFor,
            Self::KwBreak => TokenKind::KwBreak,
            Self::KwContinue => TokenKind::KwContinue,
            Self::KwIf => TokenKind::KwIf,
            Self::KwElse => TokenKind::KwElse,
            Self::KwReturn => TokenKind::KwReturn,
            Self::KwSwitch => TokenKind::KwSwitch,
            Self::KwCase => TokenKind::KwCase,
            Self::KwDefault => TokenKind::KwDefault,
            Self::KwImport => TokenKind::KwImport,
            Self::KwLet => TokenKind::KwLet,
            Self::Ident => TokenKind::Ident,
            Self::BoolLit => TokenKind::BoolLit,
            Self::IntLit => TokenKind::IntLit,
            Self::FloatLit => TokenKind::FloatLit,
            Self::StrLit => TokenKind::StrLit,
            Self::Trivia => TokenKind::Trivia,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LexError {
    #[error("no token matches at line {line}, column {column}: `{snippet}'")]
    NoMatch {
        line: usize,
        column: usize,
        snippet: String,
    },
}

/// Scan the whole input into tokens, trivia included.
///
/// The caller (normally the parser driver) drops the trivia class via
/// [`TokenKind::needs_parse`].
pub fn lex(source: &str) -> Result<Vec<Token>, LexError> {
    let mut tokens = Vec::new();
    let mut lexer = Raw::lexer(source);
    while let Some(scanned) = lexer.next() {
        match scanned {
            Ok(raw) => tokens.push(Token::new(raw.kind(), lexer.slice())),
            Err(()) => {
                let (line, column) = position(source, lexer.span().start);
                let rest = &source[lexer.span().start..];
                let snippet = rest.lines().next().unwrap_or(rest).to_owned();
                return Err(LexError::NoMatch {
                    line,
                    column,
                    snippet,
                });
            }
        }
    }
    Ok(tokens)
}

fn position(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;
    for ch in source[..offset].chars() {
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        lex(input)
            .unwrap()
            .into_iter()
            .map(|t| t.kind())
            .filter(|k| k.needs_parse())
            .collect()
    }

    #[test]
    fn maximal_munch() {
        use TokenKind::*;
        assert_eq!(kinds("a ** b"), [Ident, StarStar, Ident]);
        assert_eq!(kinds("a <= b"), [Ident, Le, Ident]);
        assert_eq!(kinds("a == b = c"), [Ident, EqEq, Ident, Assign, Ident]);
        assert_eq!(kinds("x&&y&z"), [Ident, AndAnd, Ident, Amp, Ident]);
    }

    #[test]
    fn keywords_beat_identifiers_on_ties() {
        use TokenKind::*;
        assert_eq!(kinds("for"), [KwFor]);
        assert_eq!(kinds("form"), [Ident]);
        assert_eq!(kinds("true truely"), [BoolLit, Ident]);
        assert_eq!(kinds("if ifx else"), [KwIf, Ident, KwElse]);
    }

    #[test]
    fn literals() {
        let tokens = lex("x = 42 + 3.5 - \"hi\\\"there\"").unwrap();
        let tokens: Vec<_> = tokens
            .into_iter()
            .filter(|t| t.kind().needs_parse())
            .collect();
        assert_eq!(tokens[2].int_value(), Some(42));
        assert_eq!(tokens[4].float_value(), Some(3.5));
        assert_eq!(tokens[6].str_value(), Some("hi\\\"there"));
    }

    #[test]
    fn trivia_is_scanned_but_filtered() {
        let tokens = lex("a + // comment\n b /* c */ * d").unwrap();
        assert!(tokens.iter().any(|t| t.kind() == TokenKind::Trivia));
        use TokenKind::*;
        let kinds: Vec<_> = tokens
            .iter()
            .map(|t| t.kind())
            .filter(|k| k.needs_parse())
            .collect();
        assert_eq!(kinds, [Ident, Plus, Ident, Star, Ident]);
    }

    #[test]
    fn lexical_error_reports_line_and_column() {
        let err = lex("a = 1;\nb = @2;").unwrap_err();
        let LexError::NoMatch { line, column, .. } = err;
        assert_eq!((line, column), (2, 5));
    }
}
