//! Character sets the fragment generator draws from

pub const LETTERS: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const DIGITS: &str = "0123456789";
pub const SPECIAL: &str = "!@#$%^&*(){}[]<>:;,./?\\|~`'\"";
pub const OPERATORS: &str = "+-*/%^=<>!&|#";
pub const WHITESPACE: &str = " \t\n\r";
pub const DELIMITERS: &str = "(){}[];,.";
/// Characters that may follow a backslash inside a string literal
pub const ESCAPES: &str = "\"nrt0\\";
pub const SIGNS: &str = "+-";

/// Non-ASCII characters mixed into string and comment bodies when unicode
/// generation is enabled
pub const UNICODE_EXTRAS: &str = "éüñøßÆλπΩжЯ中文字\u{200B}\u{200F}😀🦀→∀∑";

/// Resolved alphabets for one generator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    pub string_body: Vec<char>,
    pub line_comment: Vec<char>,
    pub block_comment: Vec<char>,
    pub identifier_start: Vec<char>,
    pub identifier_rest: Vec<char>,
    pub digits: Vec<char>,
    pub operators: Vec<char>,
    pub whitespace: Vec<char>,
    pub delimiters: Vec<char>,
    pub escapes: Vec<char>,
    pub signs: Vec<char>,
}

impl Alphabet {
    /// Alphabets for a generator, with or without unicode bodies
    pub fn new(use_unicode: bool) -> Self {
        let extras = if use_unicode { UNICODE_EXTRAS } else { "" };

        Self {
            string_body: chars(&[LETTERS, DIGITS, SPECIAL, WHITESPACE, extras]),
            line_comment: chars(&[LETTERS, DIGITS, SPECIAL, extras]),
            block_comment: chars(&[LETTERS, DIGITS, SPECIAL, "\n", extras]),
            identifier_start: chars(&[LETTERS, "_"]),
            identifier_rest: chars(&[LETTERS, DIGITS, "_"]),
            digits: chars(&[DIGITS]),
            operators: chars(&[OPERATORS]),
            whitespace: chars(&[WHITESPACE]),
            delimiters: chars(&[DELIMITERS]),
            escapes: chars(&[ESCAPES]),
            signs: chars(&[SIGNS]),
        }
    }

    /// Printable ASCII only
    pub fn ascii() -> Self {
        Self::new(false)
    }

    /// Whether any body alphabet can produce non-ASCII text
    pub fn includes_unicode(&self) -> bool {
        self.string_body.iter().any(|c| !c.is_ascii())
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::ascii()
    }
}

fn chars(parts: &[&str]) -> Vec<char> {
    parts.iter().flat_map(|part| part.chars()).collect()
}
