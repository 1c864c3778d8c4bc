//! Error-tolerant Java lexer.
//!
//! Every byte of the input belongs to exactly one token, so the token stream
//! can always be searched by offset even while the user is mid-edit:
//! unterminated string and char literals stop at the end of the line and an
//! unterminated block comment runs to the end of the input.

use crate::assist::token::TokenKind;
use crate::language::LexToken;

#[rustfmt::skip]
const JAVA_KEYWORDS: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte",
    "case", "catch", "char", "class", "const", "continue",
    "default", "do", "double", "else", "enum", "extends",
    "final", "finally", "float", "for", "goto", "if",
    "implements", "import", "instanceof", "int", "interface",
    "long", "native", "new", "package", "private", "protected",
    "public", "return", "short", "static", "strictfp", "super",
    "switch", "synchronized", "this", "throw", "throws", "transient",
    "try", "void", "volatile", "while",
    // literals the editor colours as keywords
    "true", "false", "null",
];

pub fn tokenize(source: &str) -> Vec<LexToken> {
    let mut lexer = Lexer { src: source, pos: 0 };
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token() {
        tokens.push(token);
    }
    tokens
}

pub fn is_keyword(word: &str) -> bool {
    JAVA_KEYWORDS.contains(&word)
}

pub fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

pub fn is_ident_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

struct Lexer<'s> {
    src: &'s str,
    pos: usize,
}

impl Lexer<'_> {
    fn rest(&self) -> &str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.bump();
        }
    }

    fn next_token(&mut self) -> Option<LexToken> {
        let start = self.pos;
        let c = self.bump()?;
        let kind = match c {
            c if c.is_whitespace() => {
                self.eat_while(char::is_whitespace);
                TokenKind::Whitespace
            }
            '/' if self.peek() == Some('/') => {
                self.eat_while(|c| c != '\n');
                TokenKind::LineComment
            }
            '/' if self.peek() == Some('*') => {
                self.bump();
                // `/**/` is an empty block comment, not a doc comment
                let is_doc = self.peek() == Some('*') && self.peek_nth(1) != Some('/');
                self.block_comment_rest();
                if is_doc {
                    TokenKind::DocComment
                } else {
                    TokenKind::BlockComment
                }
            }
            '"' if self.rest().starts_with("\"\"") => {
                self.pos += 2;
                self.text_block_rest();
                TokenKind::TextBlock
            }
            '"' => {
                self.quoted_rest('"');
                TokenKind::StringLiteral
            }
            '\'' => {
                self.quoted_rest('\'');
                TokenKind::CharLiteral
            }
            c if c.is_ascii_digit() => {
                self.number_rest(start);
                TokenKind::NumericLiteral
            }
            '.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => {
                self.number_rest(start);
                TokenKind::NumericLiteral
            }
            c if is_ident_start(c) => {
                self.eat_while(is_ident_part);
                if is_keyword(&self.src[start..self.pos]) {
                    TokenKind::Keyword
                } else {
                    TokenKind::Identifier
                }
            }
            _ => TokenKind::Operator,
        };
        Some(LexToken {
            kind,
            start,
            end: self.pos,
        })
    }

    fn block_comment_rest(&mut self) {
        match self.rest().find("*/") {
            Some(i) => self.pos += i + 2,
            None => self.pos = self.src.len(),
        }
    }

    fn quoted_rest(&mut self, quote: char) {
        loop {
            match self.peek() {
                None | Some('\n') => break,
                Some('\\') => {
                    self.bump();
                    if self.peek().is_some_and(|c| c != '\n') {
                        self.bump();
                    }
                }
                Some(c) if c == quote => {
                    self.bump();
                    break;
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    fn text_block_rest(&mut self) {
        while !self.rest().is_empty() {
            if self.rest().starts_with("\"\"\"") {
                self.pos += 3;
                return;
            }
            if self.bump() == Some('\\') {
                self.bump();
            }
        }
    }

    fn number_rest(&mut self, start: usize) {
        let lit = &self.src[start..];
        let is_hex = lit.starts_with("0x") || lit.starts_with("0X");
        while let Some(c) = self.peek() {
            if !(c.is_ascii_alphanumeric() || c == '_' || c == '.') {
                break;
            }
            self.bump();
            let exponent = if is_hex {
                matches!(c, 'p' | 'P')
            } else {
                matches!(c, 'e' | 'E')
            };
            if exponent && matches!(self.peek(), Some('+' | '-')) {
                self.bump();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<(TokenKind, &str)> {
        tokenize(src)
            .into_iter()
            .map(|t| (t.kind, &src[t.start..t.end]))
            .collect()
    }

    #[test]
    fn test_tokens_cover_whole_input() {
        let src = "int x = 1; // done\n/* a */ String s = \"hi\";";
        let tokens = tokenize(src);
        let mut expected = 0;
        for t in &tokens {
            assert_eq!(t.start, expected, "gap before {t:?}");
            expected = t.end;
        }
        assert_eq!(expected, src.len());
    }

    #[test]
    fn test_basic_statement() {
        assert_eq!(
            kinds("int x=42;"),
            vec![
                (TokenKind::Keyword, "int"),
                (TokenKind::Whitespace, " "),
                (TokenKind::Identifier, "x"),
                (TokenKind::Operator, "="),
                (TokenKind::NumericLiteral, "42"),
                (TokenKind::Operator, ";"),
            ]
        );
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            kinds("// a\n/** doc */ /**/"),
            vec![
                (TokenKind::LineComment, "// a"),
                (TokenKind::Whitespace, "\n"),
                (TokenKind::DocComment, "/** doc */"),
                (TokenKind::Whitespace, " "),
                (TokenKind::BlockComment, "/**/"),
            ]
        );
    }

    #[test]
    fn test_unterminated_block_comment_runs_to_eof() {
        assert_eq!(
            kinds("x /* open\nstill"),
            vec![
                (TokenKind::Identifier, "x"),
                (TokenKind::Whitespace, " "),
                (TokenKind::BlockComment, "/* open\nstill"),
            ]
        );
    }

    #[test]
    fn test_string_with_escape_and_unterminated() {
        assert_eq!(
            kinds(r#""a\"b" "open"#),
            vec![
                (TokenKind::StringLiteral, r#""a\"b""#),
                (TokenKind::Whitespace, " "),
                (TokenKind::StringLiteral, "\"open"),
            ]
        );
        // an unterminated literal stops at the line end
        assert_eq!(
            kinds("\"abc\nx"),
            vec![
                (TokenKind::StringLiteral, "\"abc"),
                (TokenKind::Whitespace, "\n"),
                (TokenKind::Identifier, "x"),
            ]
        );
    }

    #[test]
    fn test_text_block() {
        let src = "\"\"\"\n  hi \\\"\"\"\n\"\"\";";
        let tokens = kinds(src);
        assert_eq!(tokens[0].0, TokenKind::TextBlock);
        assert_eq!(tokens[1], (TokenKind::Operator, ";"));
    }

    #[test]
    fn test_char_literal() {
        assert_eq!(
            kinds("'\\n'"),
            vec![(TokenKind::CharLiteral, "'\\n'")]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("1.5e-3f 0x1F .5 1_000L"),
            vec![
                (TokenKind::NumericLiteral, "1.5e-3f"),
                (TokenKind::Whitespace, " "),
                (TokenKind::NumericLiteral, "0x1F"),
                (TokenKind::Whitespace, " "),
                (TokenKind::NumericLiteral, ".5"),
                (TokenKind::Whitespace, " "),
                (TokenKind::NumericLiteral, "1_000L"),
            ]
        );
    }

    #[test]
    fn test_member_access_dot_is_operator() {
        assert_eq!(
            kinds("a.b"),
            vec![
                (TokenKind::Identifier, "a"),
                (TokenKind::Operator, "."),
                (TokenKind::Identifier, "b"),
            ]
        );
    }

    #[test]
    fn test_unicode_identifier() {
        assert_eq!(
            kinds("größe$1"),
            vec![(TokenKind::Identifier, "größe$1")]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("").is_empty());
    }
}
