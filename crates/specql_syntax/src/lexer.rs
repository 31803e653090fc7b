//! Lexer for GraphQL source text.

use crate::token::{Token, TokenKind};
use specql_core::Span;

/// A lexer for GraphQL source code.
pub struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: u32,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
        }
    }

    /// Returns the current position.
    #[inline]
    pub fn pos(&self) -> u32 {
        self.pos
    }

    /// Returns the source text of a span.
    #[inline]
    pub fn span_text(&self, span: Span) -> &'a str {
        &self.source[span.start as usize..span.end as usize]
    }

    /// Peeks at the current byte without consuming.
    #[inline]
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos as usize).copied()
    }

    /// Peeks at the byte at offset from current position.
    #[inline]
    fn peek_at(&self, offset: u32) -> Option<u8> {
        self.bytes.get((self.pos + offset) as usize).copied()
    }

    /// Advances by one byte.
    #[inline]
    fn advance(&mut self) {
        self.pos += 1;
    }

    /// Advances by n bytes.
    #[inline]
    fn advance_by(&mut self, n: u32) {
        self.pos += n;
    }

    /// Skips whitespace, commas, comments, and byte order marks.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\r' | b'\n' | b',') => self.advance(),
                // UTF-8 BOM
                Some(0xEF) if self.peek_at(1) == Some(0xBB) && self.peek_at(2) == Some(0xBF) => {
                    self.advance_by(3);
                }
                Some(b'#') => {
                    while let Some(c) = self.peek() {
                        if c == b'\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    /// Scans the next token.
    pub fn next_token(&mut self) -> Token {
        self.skip_trivia();

        let start = self.pos;

        let Some(c) = self.peek() else {
            return Token::new(TokenKind::Eof, Span::new(start, start));
        };

        let kind = match c {
            b'!' => {
                self.advance();
                TokenKind::Bang
            }
            b'$' => {
                self.advance();
                TokenKind::Dollar
            }
            b'&' => {
                self.advance();
                TokenKind::Amp
            }
            b'(' => {
                self.advance();
                TokenKind::LParen
            }
            b')' => {
                self.advance();
                TokenKind::RParen
            }
            b':' => {
                self.advance();
                TokenKind::Colon
            }
            b'=' => {
                self.advance();
                TokenKind::Equals
            }
            b'@' => {
                self.advance();
                TokenKind::At
            }
            b'[' => {
                self.advance();
                TokenKind::LBracket
            }
            b']' => {
                self.advance();
                TokenKind::RBracket
            }
            b'{' => {
                self.advance();
                TokenKind::LBrace
            }
            b'|' => {
                self.advance();
                TokenKind::Pipe
            }
            b'}' => {
                self.advance();
                TokenKind::RBrace
            }
            b'.' => {
                if self.peek_at(1) == Some(b'.') && self.peek_at(2) == Some(b'.') {
                    self.advance_by(3);
                    TokenKind::Spread
                } else {
                    self.advance();
                    TokenKind::Unknown
                }
            }
            b'"' => self.scan_string(),
            b'-' | b'0'..=b'9' => self.scan_number(),
            b'_' | b'a'..=b'z' | b'A'..=b'Z' => {
                while let Some(b'_' | b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z') = self.peek() {
                    self.advance();
                }
                TokenKind::Name
            }
            _ => {
                self.advance();
                TokenKind::Unknown
            }
        };

        Token::new(kind, Span::new(start, self.pos))
    }

    /// Scans a number literal. The leading `-` or digit has not been consumed.
    fn scan_number(&mut self) -> TokenKind {
        if self.peek() == Some(b'-') {
            self.advance();
        }
        let mut is_float = false;

        while let Some(b'0'..=b'9') = self.peek() {
            self.advance();
        }
        if self.peek() == Some(b'.') && matches!(self.peek_at(1), Some(b'0'..=b'9')) {
            is_float = true;
            self.advance();
            while let Some(b'0'..=b'9') = self.peek() {
                self.advance();
            }
        }
        if let Some(b'e' | b'E') = self.peek() {
            is_float = true;
            self.advance();
            if let Some(b'+' | b'-') = self.peek() {
                self.advance();
            }
            while let Some(b'0'..=b'9') = self.peek() {
                self.advance();
            }
        }

        if is_float {
            TokenKind::FloatLit
        } else {
            TokenKind::IntLit
        }
    }

    /// Scans a string or block string literal. The opening quote has not been
    /// consumed. The produced span includes the quotes.
    fn scan_string(&mut self) -> TokenKind {
        if self.peek_at(1) == Some(b'"') && self.peek_at(2) == Some(b'"') {
            self.advance_by(3);
            while let Some(c) = self.peek() {
                if c == b'"' && self.peek_at(1) == Some(b'"') && self.peek_at(2) == Some(b'"') {
                    self.advance_by(3);
                    return TokenKind::BlockStringLit;
                }
                if c == b'\\'
                    && self.peek_at(1) == Some(b'"')
                    && self.peek_at(2) == Some(b'"')
                    && self.peek_at(3) == Some(b'"')
                {
                    self.advance_by(4);
                    continue;
                }
                self.advance();
            }
            // Unterminated block string runs to end of input.
            TokenKind::Unknown
        } else {
            self.advance();
            while let Some(c) = self.peek() {
                match c {
                    b'"' => {
                        self.advance();
                        return TokenKind::StringLit;
                    }
                    b'\\' => {
                        self.advance();
                        if self.peek().is_some() {
                            self.advance();
                        }
                    }
                    b'\n' => break,
                    _ => self.advance(),
                }
            }
            TokenKind::Unknown
        }
    }
}

/// Decodes a quoted string literal (span text including quotes) into its
/// value, processing escape sequences.
pub fn decode_string(raw: &str) -> Result<String, String> {
    let inner = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('/') => out.push('/'),
            Some('b') => out.push('\u{0008}'),
            Some('f') => out.push('\u{000C}'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('u') => {
                let mut code = 0u32;
                for _ in 0..4 {
                    let digit = chars
                        .next()
                        .and_then(|d| d.to_digit(16))
                        .ok_or_else(|| "invalid unicode escape".to_string())?;
                    code = code * 16 + digit;
                }
                let decoded =
                    char::from_u32(code).ok_or_else(|| "invalid unicode escape".to_string())?;
                out.push(decoded);
            }
            Some(other) => return Err(format!("invalid escape sequence '\\{other}'")),
            None => return Err("unterminated escape sequence".to_string()),
        }
    }
    Ok(out)
}

/// Decodes a block string literal (span text including the triple quotes),
/// removing the common indentation and blank leading/trailing lines.
pub fn decode_block_string(raw: &str) -> String {
    let inner = &raw[3..raw.len().saturating_sub(3)];
    let inner = inner.replace("\\\"\"\"", "\"\"\"");
    let lines: Vec<&str> = inner.split('\n').collect();

    let mut common_indent: Option<usize> = None;
    for line in lines.iter().skip(1) {
        let indent = line.len() - line.trim_start_matches([' ', '\t']).len();
        if indent < line.len() {
            common_indent = Some(common_indent.map_or(indent, |c| c.min(indent)));
        }
    }

    let mut formatted: Vec<String> = Vec::with_capacity(lines.len());
    for (idx, line) in lines.iter().enumerate() {
        if idx == 0 {
            formatted.push((*line).to_string());
        } else {
            let strip = common_indent.unwrap_or(0).min(line.len());
            formatted.push(line[strip..].to_string());
        }
    }

    while formatted
        .first()
        .is_some_and(|l| l.trim_matches([' ', '\t']).is_empty())
    {
        formatted.remove(0);
    }
    while formatted
        .last()
        .is_some_and(|l| l.trim_matches([' ', '\t']).is_empty())
    {
        formatted.pop();
    }

    formatted.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(source);
        let mut out = Vec::new();
        loop {
            let token = lexer.next_token();
            if token.kind == TokenKind::Eof {
                break;
            }
            out.push(token.kind);
        }
        out
    }

    #[test]
    fn test_punctuation() {
        assert_eq!(
            kinds("{ } ( ) [ ] ! $ : = @ | & ..."),
            vec![
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::LBracket,
                TokenKind::RBracket,
                TokenKind::Bang,
                TokenKind::Dollar,
                TokenKind::Colon,
                TokenKind::Equals,
                TokenKind::At,
                TokenKind::Pipe,
                TokenKind::Amp,
                TokenKind::Spread,
            ]
        );
    }

    #[test]
    fn test_names_and_numbers() {
        assert_eq!(
            kinds("dog _id x2 42 -7 3.14 1e10 -0.5e-2"),
            vec![
                TokenKind::Name,
                TokenKind::Name,
                TokenKind::Name,
                TokenKind::IntLit,
                TokenKind::IntLit,
                TokenKind::FloatLit,
                TokenKind::FloatLit,
                TokenKind::FloatLit,
            ]
        );
    }

    #[test]
    fn test_comments_and_commas_are_trivia() {
        assert_eq!(
            kinds("a, b # trailing comment\nc"),
            vec![TokenKind::Name, TokenKind::Name, TokenKind::Name]
        );
    }

    #[test]
    fn test_strings() {
        assert_eq!(kinds(r#""hello""#), vec![TokenKind::StringLit]);
        assert_eq!(
            kinds("\"\"\"block\nstring\"\"\""),
            vec![TokenKind::BlockStringLit]
        );
    }

    #[test]
    fn test_token_spans() {
        let mut lexer = Lexer::new("{ dog }");
        let brace = lexer.next_token();
        assert_eq!(brace.span, Span::new(0, 1));
        let dog = lexer.next_token();
        assert_eq!(dog.span, Span::new(2, 5));
        assert_eq!(lexer.span_text(dog.span), "dog");
    }

    #[test]
    fn test_decode_string() {
        assert_eq!(decode_string(r#""a\nb""#).unwrap(), "a\nb");
        assert_eq!(decode_string(r#""A""#).unwrap(), "A");
        assert!(decode_string(r#""\q""#).is_err());
    }

    #[test]
    fn test_decode_block_string() {
        let raw = "\"\"\"\n    first\n    second\n\"\"\"";
        assert_eq!(decode_block_string(raw), "first\nsecond");
    }

    #[test]
    fn test_unterminated_string() {
        assert_eq!(kinds("\"oops\n"), vec![TokenKind::Unknown]);
    }
}
