//! Grammar-aware fuzzing harness for lexical scanners.
//!
//! lexfuzz synthesizes token-like input (string and number literals,
//! operator runs, identifiers, comments, whitespace), runs an external
//! scanner executable against each input under a time budget, and
//! aggregates the outcomes into a report.
//!
//! # Modules
//!
//! - [`fragment`] -- Random lexical fragments, including malformed variants.
//! - [`sample`] -- Bounded concatenation of fragments into one fuzz input.
//! - [`invoker`] -- Runs the subject against a sample with a deadline.
//! - [`outcome`] -- Outcome classification and campaign statistics.
//! - [`campaign`] -- Drives N independent iterations.
//! - [`report`] -- Markdown summary of a campaign.
//!
//! # Example
//!
//! Generate a reproducible sample:
//!
//! ```
//! use lexfuzz_core::fragment::FragmentGenerator;
//! use lexfuzz_core::rng::FuzzRng;
//! use lexfuzz_core::sample::SampleBuilder;
//!
//! let generator = FragmentGenerator::default();
//! let mut rng = FuzzRng::from_seed(42);
//! let sample = SampleBuilder::new(120).build_random(&generator, &mut rng);
//! assert!(sample.len() <= 120);
//! ```

pub mod alphabet;
pub mod campaign;
pub mod encoding;
pub mod error;
pub mod fragment;
pub mod invoker;
pub mod journal;
pub mod outcome;
pub mod report;
pub mod rng;
pub mod sample;

pub use campaign::{Campaign, CampaignConfig, CampaignObserver, CampaignSummary};
pub use error::{CampaignError, CampaignResult};
pub use outcome::{classify, CampaignStats, InvocationOutcome, Status, TestResult};
pub use sample::{Sample, SampleBuilder};
