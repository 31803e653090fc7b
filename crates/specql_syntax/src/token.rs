//! Token definitions for GraphQL source text.

use specql_core::Span;

/// The kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A name: `[_A-Za-z][_0-9A-Za-z]*`. Keywords are contextual and
    /// recognized by the parser from the name text.
    Name,
    /// An integer literal.
    IntLit,
    /// A float literal.
    FloatLit,
    /// A quoted string literal, including the quotes.
    StringLit,
    /// A triple-quoted block string literal, including the quotes.
    BlockStringLit,
    /// `!`
    Bang,
    /// `$`
    Dollar,
    /// `&`
    Amp,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `...`
    Spread,
    /// `:`
    Colon,
    /// `=`
    Equals,
    /// `@`
    At,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `{`
    LBrace,
    /// `|`
    Pipe,
    /// `}`
    RBrace,
    /// End of input.
    Eof,
    /// An unrecognized character sequence.
    Unknown,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Name => "name",
            Self::IntLit => "integer",
            Self::FloatLit => "float",
            Self::StringLit => "string",
            Self::BlockStringLit => "block string",
            Self::Bang => "'!'",
            Self::Dollar => "'$'",
            Self::Amp => "'&'",
            Self::LParen => "'('",
            Self::RParen => "')'",
            Self::Spread => "'...'",
            Self::Colon => "':'",
            Self::Equals => "'='",
            Self::At => "'@'",
            Self::LBracket => "'['",
            Self::RBracket => "']'",
            Self::LBrace => "'{'",
            Self::Pipe => "'|'",
            Self::RBrace => "'}'",
            Self::Eof => "end of input",
            Self::Unknown => "unknown token",
        };
        f.write_str(s)
    }
}

/// A token with its source span.
#[derive(Debug, Clone, Copy)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}
