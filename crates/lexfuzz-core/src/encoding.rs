//! Text encodings for sample and error artifacts

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Replacement for characters an encoding cannot represent
pub const PLACEHOLDER: char = '?';

/// A character could not be represented in the artifact encoding
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{encoding}' codec can't encode character {ch:?} in position {position}")]
pub struct EncodeError {
    pub encoding: &'static str,
    pub ch: char,
    pub position: usize,
}

/// How sample text is turned into artifact bytes
pub trait TextEncoding: Send + Sync {
    fn name(&self) -> &'static str;

    /// Encode text, failing on the first unrepresentable character
    fn encode(&self, text: &str) -> Result<Vec<u8>, EncodeError>;

    /// Replace every unrepresentable character with [`PLACEHOLDER`]
    fn sanitize(&self, text: &str) -> String;
}

/// 7-bit ASCII
#[derive(Debug, Clone, Copy, Default)]
pub struct Ascii;

impl TextEncoding for Ascii {
    fn name(&self) -> &'static str {
        "ascii"
    }

    fn encode(&self, text: &str) -> Result<Vec<u8>, EncodeError> {
        match text.chars().enumerate().find(|(_, c)| !c.is_ascii()) {
            Some((position, ch)) => Err(EncodeError {
                encoding: self.name(),
                ch,
                position,
            }),
            None => Ok(text.as_bytes().to_vec()),
        }
    }

    fn sanitize(&self, text: &str) -> String {
        text.chars()
            .map(|c| if c.is_ascii() { c } else { PLACEHOLDER })
            .collect()
    }
}

/// UTF-8, which represents every `char`
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8;

impl TextEncoding for Utf8 {
    fn name(&self) -> &'static str {
        "utf8"
    }

    fn encode(&self, text: &str) -> Result<Vec<u8>, EncodeError> {
        Ok(text.as_bytes().to_vec())
    }

    fn sanitize(&self, text: &str) -> String {
        text.to_string()
    }
}

/// Built-in encodings, selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingKind {
    #[default]
    Ascii,
    Utf8,
}

impl EncodingKind {
    pub fn codec(self) -> Box<dyn TextEncoding> {
        match self {
            EncodingKind::Ascii => Box::new(Ascii),
            EncodingKind::Utf8 => Box::new(Utf8),
        }
    }
}

impl fmt::Display for EncodingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodingKind::Ascii => f.write_str("ascii"),
            EncodingKind::Utf8 => f.write_str("utf8"),
        }
    }
}

impl FromStr for EncodingKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ascii" => Ok(EncodingKind::Ascii),
            "utf8" | "utf-8" => Ok(EncodingKind::Utf8),
            other => Err(format!("unknown encoding '{}' (expected ascii or utf8)", other)),
        }
    }
}
