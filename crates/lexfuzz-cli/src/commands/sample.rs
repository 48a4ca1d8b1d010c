//! Sample command - print the input a campaign would use for one test

use anyhow::{ensure, Context, Result};
use lexfuzz_core::campaign::{RandomSamples, SampleFactory};
use lexfuzz_core::encoding::EncodingKind;
use lexfuzz_core::fragment::FragmentGenerator;
use lexfuzz_core::sample::{Sample, SampleBuilder};
use std::io::{self, Write};

/// Arguments for the sample command
#[derive(Debug, Clone)]
pub struct SampleArgs {
    pub seed: u64,
    /// 1-based test index
    pub index: usize,
    pub max_length: usize,
    pub use_unicode: bool,
    pub encoding: EncodingKind,
}

/// Regenerate the sample of test `index` in a campaign seeded with `seed`
pub fn generate(args: &SampleArgs) -> Result<Sample> {
    ensure!(args.index >= 1, "test indices start at 1");
    ensure!(args.max_length >= 1, "maximum sample length must be at least 1");

    let mut samples = RandomSamples::new(
        FragmentGenerator::with_unicode(args.use_unicode),
        SampleBuilder::new(args.max_length),
        args.seed,
    );
    Ok(samples.sample(args.index))
}

/// The text the subject receives for this sample under `args.encoding`
///
/// Characters the encoding cannot represent are replaced the same way the
/// invoker's sanitized retry replaces them.
pub fn render(args: &SampleArgs) -> Result<String> {
    let sample = generate(args)?;
    Ok(args.encoding.codec().sanitize(sample.as_str()))
}

/// Write the sample to stdout exactly as the subject would receive it
pub fn run(args: SampleArgs) -> Result<()> {
    let text = render(&args)?;
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.flush())
        .context("Failed to write sample")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(index: usize) -> SampleArgs {
        SampleArgs {
            seed: 11,
            index,
            max_length: 300,
            use_unicode: false,
            encoding: EncodingKind::Ascii,
        }
    }

    #[test]
    fn test_same_arguments_same_sample() {
        assert_eq!(generate(&args(4)).unwrap(), generate(&args(4)).unwrap());
    }

    #[test]
    fn test_length_bound() {
        assert!(generate(&args(2)).unwrap().len() <= 300);
    }

    #[test]
    fn test_index_zero_rejected() {
        assert!(generate(&args(0)).is_err());
    }

    #[test]
    fn test_render_matches_encoding() {
        // Find a unicode sample that actually carries non-ASCII text.
        let unicode = (1..=50)
            .map(|index| SampleArgs {
                index,
                use_unicode: true,
                ..args(1)
            })
            .find(|a| !generate(a).unwrap().as_str().is_ascii())
            .expect("some unicode sample contains non-ASCII text");

        let raw = generate(&unicode).unwrap();
        let ascii = render(&unicode).unwrap();
        assert!(ascii.is_ascii());
        assert_eq!(ascii.chars().count(), raw.as_str().chars().count());

        let utf8 = render(&SampleArgs {
            encoding: EncodingKind::Utf8,
            ..unicode
        })
        .unwrap();
        assert_eq!(utf8, raw.as_str());
    }
}
