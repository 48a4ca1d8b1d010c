//! Sample builder - concatenates fragments into one bounded fuzz input

use crate::fragment::{Fragment, FragmentGenerator};
use crate::rng::FuzzRng;
use std::collections::VecDeque;
use std::fmt;

/// Probability of a delimiter following each fragment
pub const DELIMITER_PROBABILITY: f64 = 0.3;

/// Where the builder gets its fragments and delimiters from
pub trait FragmentSource {
    /// Next fragment, or `None` when the source is exhausted
    fn next_fragment(&mut self) -> Option<Fragment>;

    /// Delimiter to append after a fragment, if any
    fn next_delimiter(&mut self) -> Option<char>;
}

/// Random fragments drawn from a [`FragmentGenerator`]
pub struct RandomSource<'a> {
    generator: &'a FragmentGenerator,
    rng: &'a mut FuzzRng,
}

impl<'a> RandomSource<'a> {
    pub fn new(generator: &'a FragmentGenerator, rng: &'a mut FuzzRng) -> Self {
        Self { generator, rng }
    }
}

impl FragmentSource for RandomSource<'_> {
    fn next_fragment(&mut self) -> Option<Fragment> {
        Some(self.generator.next_fragment(self.rng))
    }

    fn next_delimiter(&mut self) -> Option<char> {
        if self.rng.chance(DELIMITER_PROBABILITY) {
            Some(self.rng.pick(&self.generator.alphabet().delimiters))
        } else {
            None
        }
    }
}

/// A fixed sequence of fragments, used to replay or force specific inputs
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    fragments: VecDeque<(Fragment, Option<char>)>,
    pending_delimiter: Option<char>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a fragment, optionally followed by a delimiter
    pub fn push(mut self, fragment: Fragment, delimiter: Option<char>) -> Self {
        self.fragments.push_back((fragment, delimiter));
        self
    }
}

impl FragmentSource for ScriptedSource {
    fn next_fragment(&mut self) -> Option<Fragment> {
        let (fragment, delimiter) = self.fragments.pop_front()?;
        self.pending_delimiter = delimiter;
        Some(fragment)
    }

    fn next_delimiter(&mut self) -> Option<char> {
        self.pending_delimiter.take()
    }
}

/// One complete fuzz input
///
/// Immutable once built. Lengths are counted in characters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sample {
    text: String,
}

impl Sample {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for Sample {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

/// Accumulates fragments until a target length, then truncates to it
#[derive(Debug, Clone, Copy)]
pub struct SampleBuilder {
    max_length: usize,
}

impl SampleBuilder {
    pub fn new(max_length: usize) -> Self {
        Self { max_length }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Build a sample from random fragments
    pub fn build_random(&self, generator: &FragmentGenerator, rng: &mut FuzzRng) -> Sample {
        self.build(&mut RandomSource::new(generator, rng))
    }

    /// Build a sample from any fragment source
    ///
    /// Stops once the accumulated length reaches `max_length` or the source
    /// runs dry, then cuts the text to exactly `max_length` characters. The
    /// cut may land inside a token.
    pub fn build(&self, source: &mut dyn FragmentSource) -> Sample {
        let mut text = String::new();
        let mut length = 0;

        while length < self.max_length {
            let Some(fragment) = source.next_fragment() else {
                break;
            };
            length += fragment.len();
            text.push_str(&fragment.text);

            if let Some(delimiter) = source.next_delimiter() {
                text.push(delimiter);
                length += 1;
            }
        }

        if length > self.max_length {
            text = text.chars().take(self.max_length).collect();
        }

        Sample::new(text)
    }
}
