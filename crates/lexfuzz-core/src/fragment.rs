//! Fragment generator - one random lexical unit per call
//!
//! Each fragment mimics the shape of a token the scanner under test knows
//! about, and deliberately includes malformed variants (unterminated strings
//! and block comments, broken escapes, numbers with several dots or a bare
//! exponent) that sit on the boundary of the grammar.

use crate::alphabet::Alphabet;
use crate::rng::FuzzRng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Probability that a string literal gets an escape sequence inserted
pub const ESCAPE_PROBABILITY: f64 = 0.3;
/// Probability that a string literal is closed
pub const CLOSED_STRING_PROBABILITY: f64 = 0.8;
/// Probability that a block comment is closed
pub const CLOSED_COMMENT_PROBABILITY: f64 = 0.8;

pub const MAX_STRING_BODY: usize = 50;
pub const MAX_LINE_COMMENT_BODY: usize = 50;
pub const MAX_BLOCK_COMMENT_BODY: usize = 100;
pub const MAX_IDENTIFIER_LEN: usize = 30;
pub const MAX_OPERATOR_RUN: usize = 5;
pub const MAX_WHITESPACE_RUN: usize = 5;
pub const NUMBER_BOUND: i64 = 1_000_000;

/// The six shapes a fragment can take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FragmentKind {
    StringLiteral,
    NumberLiteral,
    OperatorRun,
    Identifier,
    Comment,
    Whitespace,
}

impl FragmentKind {
    pub const ALL: [FragmentKind; 6] = [
        FragmentKind::StringLiteral,
        FragmentKind::NumberLiteral,
        FragmentKind::OperatorRun,
        FragmentKind::Identifier,
        FragmentKind::Comment,
        FragmentKind::Whitespace,
    ];

    /// Uniform draw over all kinds
    pub fn random(rng: &mut FuzzRng) -> Self {
        Self::ALL[rng.range(0..=Self::ALL.len() - 1)]
    }
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FragmentKind::StringLiteral => "string",
            FragmentKind::NumberLiteral => "number",
            FragmentKind::OperatorRun => "operator",
            FragmentKind::Identifier => "identifier",
            FragmentKind::Comment => "comment",
            FragmentKind::Whitespace => "whitespace",
        };
        f.write_str(name)
    }
}

/// A rendered fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub kind: FragmentKind,
    pub text: String,
}

impl Fragment {
    pub fn new(kind: FragmentKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Produces randomly shaped fragments
#[derive(Debug, Clone, Default)]
pub struct FragmentGenerator {
    alphabet: Alphabet,
}

impl FragmentGenerator {
    pub fn new(alphabet: Alphabet) -> Self {
        Self { alphabet }
    }

    /// Generator over printable ASCII, or with unicode string/comment bodies
    pub fn with_unicode(use_unicode: bool) -> Self {
        Self::new(Alphabet::new(use_unicode))
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// Pick a kind uniformly and render it
    pub fn next_fragment(&self, rng: &mut FuzzRng) -> Fragment {
        let kind = FragmentKind::random(rng);
        Fragment::new(kind, self.generate(kind, rng))
    }

    /// Render one fragment of the given kind
    pub fn generate(&self, kind: FragmentKind, rng: &mut FuzzRng) -> String {
        match kind {
            FragmentKind::StringLiteral => self.string_literal(rng),
            FragmentKind::NumberLiteral => self.number_literal(rng),
            FragmentKind::OperatorRun => self.operator_run(rng),
            FragmentKind::Identifier => self.identifier(rng),
            FragmentKind::Comment => self.comment(rng),
            FragmentKind::Whitespace => self.whitespace(rng),
        }
    }

    fn string_literal(&self, rng: &mut FuzzRng) -> String {
        let closed = rng.chance(CLOSED_STRING_PROBABILITY);
        let body_len = rng.range(0..=MAX_STRING_BODY);
        let mut body: Vec<char> = (0..body_len)
            .map(|_| rng.pick(&self.alphabet.string_body))
            .collect();

        if rng.chance(ESCAPE_PROBABILITY) {
            let at = rng.range(0..=body_len.saturating_sub(1));
            let escaped = rng.pick(&self.alphabet.escapes);
            body.splice(at..at, ['\\', escaped]);
        }

        let mut literal = String::with_capacity(body.len() + 2);
        literal.push('"');
        literal.extend(body);
        if closed {
            literal.push('"');
        }
        literal
    }

    fn number_literal(&self, rng: &mut FuzzRng) -> String {
        match rng.range(0..=2) {
            0 => rng.signed_range(-NUMBER_BOUND..=NUMBER_BOUND).to_string(),
            1 => {
                let bound = NUMBER_BOUND as f64;
                // Debug keeps the fractional part even for integral values.
                format!("{:?}", rng.float(-bound..bound))
            }
            _ => self.malformed_number(rng),
        }
    }

    /// Digits and dots in any order, optional sign and exponent
    fn malformed_number(&self, rng: &mut FuzzRng) -> String {
        let mut number = String::new();

        if rng.chance(0.3) {
            number.push(rng.pick(&self.alphabet.signs));
        }

        for _ in 0..rng.range(1..=10) {
            if rng.chance(0.2) {
                number.push('.');
            } else {
                number.push(rng.pick(&self.alphabet.digits));
            }
        }

        if rng.chance(0.3) {
            number.push('e');
            if rng.chance(0.5) {
                number.push(rng.pick(&self.alphabet.signs));
            }
            for _ in 0..rng.range(0..=5) {
                number.push(rng.pick(&self.alphabet.digits));
            }
        }

        number
    }

    fn operator_run(&self, rng: &mut FuzzRng) -> String {
        let len = rng.range(1..=MAX_OPERATOR_RUN);
        rng.string_from(&self.alphabet.operators, len)
    }

    fn identifier(&self, rng: &mut FuzzRng) -> String {
        let len = rng.range(1..=MAX_IDENTIFIER_LEN);
        let mut ident = String::with_capacity(len);
        ident.push(rng.pick(&self.alphabet.identifier_start));
        ident.push_str(&rng.string_from(&self.alphabet.identifier_rest, len - 1));
        ident
    }

    fn comment(&self, rng: &mut FuzzRng) -> String {
        if rng.chance(0.5) {
            let len = rng.range(0..=MAX_LINE_COMMENT_BODY);
            format!("// {}", rng.string_from(&self.alphabet.line_comment, len))
        } else {
            let len = rng.range(0..=MAX_BLOCK_COMMENT_BODY);
            let body = rng.string_from(&self.alphabet.block_comment, len);
            if rng.chance(CLOSED_COMMENT_PROBABILITY) {
                format!("/* {} */", body)
            } else {
                format!("/* {}", body)
            }
        }
    }

    fn whitespace(&self, rng: &mut FuzzRng) -> String {
        let len = rng.range(1..=MAX_WHITESPACE_RUN);
        rng.string_from(&self.alphabet.whitespace, len)
    }
}
