//! Token scanner for compiled ES modules.
//!
//! The rewriter only needs to find `import`/`export` forms at real token
//! boundaries, so this scanner does not build a syntax tree. It does need to
//! step over everything that could hide those keywords: strings, template
//! literals (including nested `${}` substitutions), regular expression
//! literals and comments. Comments and whitespace produce no tokens.
//!
//! Regex literals are told apart from division by the previous significant
//! token, the usual heuristic for JavaScript scanners. A `)` is the one
//! token that needs more context: it ends an expression, except when it
//! closes the head of an `if`, `while`, `for` or `with` statement.

use std::fmt;

/// Kind of a significant token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or keyword
    Ident,
    /// Punctuator, possibly multi-character
    Punct,
    /// Single- or double-quoted string literal, quotes included
    Str,
    /// Template literal, or the tail of one after its last substitution
    Template,
    /// Template chunk ending in `${`
    TemplateHead,
    /// Regular expression literal with flags
    Regex,
    /// Numeric literal
    Number,
}

/// A significant token as a byte range of the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// Token kind
    pub kind: TokenKind,
    /// Byte offset of the first character
    pub start: usize,
    /// Byte offset one past the last character
    pub end: usize,
}

impl Token {
    /// Returns the token text.
    #[must_use]
    pub fn text<'s>(&self, src: &'s str) -> &'s str {
        &src[self.start..self.end]
    }

    /// Returns `true` if this is the punctuator `p`.
    #[must_use]
    pub fn is_punct(&self, src: &str, p: &str) -> bool {
        self.kind == TokenKind::Punct && self.text(src) == p
    }

    /// Returns `true` if this is the identifier or keyword `word`.
    #[must_use]
    pub fn is_ident(&self, src: &str, word: &str) -> bool {
        self.kind == TokenKind::Ident && self.text(src) == word
    }
}

/// Scanning failure: an unterminated literal or comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    /// Byte offset where the broken construct starts
    pub offset: usize,
    /// What was left open
    pub message: String,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at byte {}", self.message, self.offset)
    }
}

impl std::error::Error for LexError {}

/// Keywords after which a `/` starts a regex literal rather than a division.
const REGEX_PRECEDING_KEYWORDS: &[&str] = &[
    "return",
    "typeof",
    "case",
    "do",
    "else",
    "in",
    "of",
    "new",
    "delete",
    "void",
    "throw",
    "instanceof",
    "yield",
    "await",
];

/// Keywords whose parenthesized head is followed by a statement.
const STATEMENT_HEAD_KEYWORDS: &[&str] = &["if", "while", "for", "with"];

/// Multi-character punctuators, longest first.
const MULTI_PUNCT: &[&str] = &[
    ">>>=", "...", "===", "!==", "**=", "<<=", ">>=", ">>>", "&&=", "||=", "??=", "=>", "==", "!=",
    "<=", ">=", "&&", "||", "??", "?.", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=", "|=",
    "^=", "**", "<<", ">>",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Brace {
    Block,
    Substitution,
}

/// Tokenizes `src`, skipping comments, whitespace and a leading hashbang.
///
/// # Errors
///
/// Returns a [`LexError`] for an unterminated string, template, regex or
/// block comment.
///
/// # Examples
///
/// ```
/// use edgelink_linker::lexer::{TokenKind, tokenize};
///
/// let src = "const s = `import ${x}`; // import";
/// let tokens = tokenize(src).unwrap();
/// let idents: Vec<_> = tokens
///     .iter()
///     .filter(|t| t.kind == TokenKind::Ident)
///     .map(|t| t.text(src))
///     .collect();
/// assert_eq!(idents, vec!["const", "s", "x"]);
/// ```
pub fn tokenize(src: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer {
        src,
        bytes: src.as_bytes(),
        pos: 0,
        tokens: Vec::new(),
        braces: Vec::new(),
        parens: Vec::new(),
        closed_statement_head: false,
    };
    lexer.run()?;
    Ok(lexer.tokens)
}

/// Returns the 1-based line containing byte `offset`.
#[must_use]
pub fn line_at(src: &str, offset: usize) -> usize {
    let end = offset.min(src.len());
    src.as_bytes()[..end].iter().filter(|&&b| b == b'\n').count() + 1
}

struct Lexer<'s> {
    src: &'s str,
    bytes: &'s [u8],
    pos: usize,
    tokens: Vec<Token>,
    braces: Vec<Brace>,
    /// One entry per open `(`: whether it starts a statement head
    parens: Vec<bool>,
    /// Whether the last `)` closed a statement head
    closed_statement_head: bool,
}

impl Lexer<'_> {
    fn run(&mut self) -> Result<(), LexError> {
        if self.src.starts_with("#!") {
            self.skip_line();
        }

        while let Some(&b) = self.bytes.get(self.pos) {
            let next = self.peek(1);
            match b {
                b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c => self.pos += 1,
                b'/' if next == Some(b'/') => self.skip_line(),
                b'/' if next == Some(b'*') => self.skip_block_comment()?,
                b'\'' | b'"' => self.scan_string(b)?,
                b'`' => self.scan_template(self.pos, self.pos + 1)?,
                b'}' if self.braces.last() == Some(&Brace::Substitution) => {
                    self.braces.pop();
                    self.scan_template(self.pos, self.pos + 1)?;
                }
                b'/' if self.regex_allowed() => self.scan_regex()?,
                b'0'..=b'9' => self.scan_number(),
                b'.' if next.is_some_and(|c| c.is_ascii_digit()) => self.scan_number(),
                b'#' => self.scan_ident(),
                _ if is_ident_start(b) => self.scan_ident(),
                _ => self.scan_punct(),
            }
        }
        Ok(())
    }

    fn peek(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn push(&mut self, kind: TokenKind, start: usize, end: usize) {
        self.tokens.push(Token { kind, start, end });
        self.pos = end;
    }

    fn skip_line(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
            self.pos += 1;
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        match self.src[start + 2..].find("*/") {
            Some(idx) => {
                self.pos = start + 2 + idx + 2;
                Ok(())
            }
            None => Err(LexError {
                offset: start,
                message: "unterminated block comment".to_string(),
            }),
        }
    }

    fn scan_string(&mut self, quote: u8) -> Result<(), LexError> {
        let start = self.pos;
        let mut i = start + 1;
        loop {
            match self.bytes.get(i) {
                None | Some(b'\n') => {
                    return Err(LexError {
                        offset: start,
                        message: "unterminated string literal".to_string(),
                    });
                }
                Some(b'\\') => i += 2,
                Some(&c) if c == quote => break,
                Some(_) => i += 1,
            }
        }
        self.push(TokenKind::Str, start, i + 1);
        Ok(())
    }

    /// Scans template text from `from` up to the closing backtick or the
    /// next `${`.
    fn scan_template(&mut self, start: usize, from: usize) -> Result<(), LexError> {
        let mut i = from;
        loop {
            match self.bytes.get(i) {
                None => {
                    return Err(LexError {
                        offset: start,
                        message: "unterminated template literal".to_string(),
                    });
                }
                Some(b'\\') => i += 2,
                Some(b'`') => {
                    self.push(TokenKind::Template, start, i + 1);
                    return Ok(());
                }
                Some(b'$') if self.bytes.get(i + 1) == Some(&b'{') => {
                    self.braces.push(Brace::Substitution);
                    self.push(TokenKind::TemplateHead, start, i + 2);
                    return Ok(());
                }
                Some(_) => i += 1,
            }
        }
    }

    /// Whether a `(` at the current position opens a statement head.
    /// Handles `for await (`.
    fn opens_statement_head(&self) -> bool {
        let keyword = |offset: usize| {
            self.tokens
                .len()
                .checked_sub(offset)
                .and_then(|i| self.tokens.get(i))
                .filter(|t| t.kind == TokenKind::Ident)
                .map(|t| t.text(self.src))
        };
        match keyword(1) {
            Some("await") => keyword(2) == Some("for"),
            Some(word) => STATEMENT_HEAD_KEYWORDS.contains(&word),
            None => false,
        }
    }

    fn regex_allowed(&self) -> bool {
        let Some(prev) = self.tokens.last() else {
            return true;
        };
        let text = prev.text(self.src);
        match prev.kind {
            TokenKind::Ident => REGEX_PRECEDING_KEYWORDS.contains(&text),
            TokenKind::Punct if text == ")" => self.closed_statement_head,
            TokenKind::Punct => !matches!(text, "]" | "++" | "--"),
            TokenKind::TemplateHead => true,
            TokenKind::Str | TokenKind::Template | TokenKind::Regex | TokenKind::Number => false,
        }
    }

    fn scan_regex(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        let mut i = start + 1;
        let mut in_class = false;
        loop {
            match self.bytes.get(i) {
                None | Some(b'\n') => {
                    return Err(LexError {
                        offset: start,
                        message: "unterminated regular expression literal".to_string(),
                    });
                }
                Some(b'\\') => i += 2,
                Some(b'[') => {
                    in_class = true;
                    i += 1;
                }
                Some(b']') => {
                    in_class = false;
                    i += 1;
                }
                Some(b'/') if !in_class => break,
                Some(_) => i += 1,
            }
        }
        i += 1;
        while self.bytes.get(i).is_some_and(|&c| is_ident_continue(c)) {
            i += 1;
        }
        self.push(TokenKind::Regex, start, i);
        Ok(())
    }

    fn scan_number(&mut self) {
        let start = self.pos;
        let hex = self.src[start..].starts_with("0x") || self.src[start..].starts_with("0X");
        let mut i = start;
        while let Some(&c) = self.bytes.get(i) {
            let exponent_sign = (c == b'+' || c == b'-')
                && !hex
                && i > start
                && matches!(self.bytes[i - 1], b'e' | b'E');
            if c.is_ascii_alphanumeric() || c == b'_' || c == b'.' || exponent_sign {
                i += 1;
            } else {
                break;
            }
        }
        self.push(TokenKind::Number, start, i);
    }

    fn scan_ident(&mut self) {
        let start = self.pos;
        let mut i = start + 1;
        while self.bytes.get(i).is_some_and(|&c| is_ident_continue(c)) {
            i += 1;
        }
        self.push(TokenKind::Ident, start, i);
    }

    fn scan_punct(&mut self) {
        let start = self.pos;
        let rest = &self.src[start..];
        let multi = MULTI_PUNCT.iter().find(|p| rest.starts_with(*p)).filter(|p| {
            // `a?.5:b` is a conditional, not optional chaining
            **p != "?." || !self.bytes.get(start + 2).is_some_and(u8::is_ascii_digit)
        });
        let len = multi.map_or_else(|| rest.chars().next().map_or(1, char::len_utf8), |p| p.len());

        match &rest[..len] {
            "{" => self.braces.push(Brace::Block),
            "}" => {
                self.braces.pop();
            }
            "(" => {
                let head = self.opens_statement_head();
                self.parens.push(head);
            }
            ")" => self.closed_statement_head = self.parens.pop().unwrap_or(false),
            _ => {}
        }
        self.push(TokenKind::Punct, start, start + len);
    }
}

const fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$' || b == b'\\' || b >= 0x80
}

const fn is_ident_continue(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}
