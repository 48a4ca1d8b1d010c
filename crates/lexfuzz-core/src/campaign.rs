//! Campaign runner - N independent generate/invoke/classify iterations

use crate::encoding::EncodingKind;
use crate::error::{CampaignError, CampaignResult};
use crate::fragment::FragmentGenerator;
use crate::invoker::{Invocation, SubjectInvoker, DEFAULT_TIMEOUT, MAX_TIMEOUT};
use crate::journal::{CampaignLog, LOG_FILE_NAME};
use crate::outcome::{classify, CampaignStats, InvocationOutcome, TestResult};
use crate::report::ReportGenerator;
use crate::rng::FuzzRng;
use crate::sample::{Sample, SampleBuilder};
use chrono::Local;
use log::{info, warn};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_NUM_TESTS: usize = 100;
pub const DEFAULT_MAX_LENGTH: usize = 1000;
pub const DEFAULT_OUTPUT_DIR: &str = "fuzzing_results";
pub const DEFAULT_SUBJECT: &str = "bin/opal";
pub const SUMMARY_FILE_NAME: &str = "fuzzing_results.json";

/// Everything needed to set up a campaign
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignConfig {
    pub subject: PathBuf,
    pub output_dir: PathBuf,
    pub num_tests: usize,
    pub max_length: usize,
    pub timeout: Duration,
    /// Seed for replay; drawn at random when absent
    pub seed: Option<u64>,
    pub use_unicode: bool,
    pub encoding: EncodingKind,
    pub sample_extension: Option<String>,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            subject: PathBuf::from(DEFAULT_SUBJECT),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            num_tests: DEFAULT_NUM_TESTS,
            max_length: DEFAULT_MAX_LENGTH,
            timeout: DEFAULT_TIMEOUT,
            seed: None,
            use_unicode: false,
            encoding: EncodingKind::default(),
            sample_extension: None,
        }
    }
}

/// Produces the sample for a given iteration
pub trait SampleFactory {
    fn sample(&mut self, index: usize) -> Sample;
}

/// Random samples, each iteration seeded from the campaign seed and its index
#[derive(Debug, Clone)]
pub struct RandomSamples {
    generator: FragmentGenerator,
    builder: SampleBuilder,
    seed: u64,
}

impl RandomSamples {
    pub fn new(generator: FragmentGenerator, builder: SampleBuilder, seed: u64) -> Self {
        Self {
            generator,
            builder,
            seed,
        }
    }
}

impl SampleFactory for RandomSamples {
    fn sample(&mut self, index: usize) -> Sample {
        let mut rng = FuzzRng::for_iteration(self.seed, index);
        self.builder.build_random(&self.generator, &mut rng)
    }
}

impl<F> SampleFactory for F
where
    F: FnMut(usize) -> Sample,
{
    fn sample(&mut self, index: usize) -> Sample {
        self(index)
    }
}

/// Receives progress while a campaign runs
pub trait CampaignObserver {
    fn on_start(&mut self, _total: usize, _seed: u64) {}
    fn on_result(&mut self, result: &TestResult);
    fn on_finish(&mut self, _stats: &CampaignStats) {}
}

impl CampaignObserver for () {
    fn on_result(&mut self, _result: &TestResult) {}
}

/// Final state of a completed campaign
#[derive(Debug, Clone, Serialize)]
pub struct CampaignSummary {
    pub seed: u64,
    pub stats: CampaignStats,
    pub results: Vec<TestResult>,
    pub report_path: PathBuf,
    pub log_path: PathBuf,
    pub summary_path: PathBuf,
}

/// A campaign that passed setup and is ready to run
pub struct Campaign {
    config: CampaignConfig,
    seed: u64,
    invoker: SubjectInvoker,
    samples: Box<dyn SampleFactory>,
    log: CampaignLog,
}

impl Campaign {
    /// Validate the subject, create the output directory and open the log
    ///
    /// Any error here is fatal and happens before the first iteration.
    pub fn setup(config: CampaignConfig) -> CampaignResult<Self> {
        if config.num_tests == 0 {
            return Err(CampaignError::InvalidConfig(
                "number of tests must be at least 1".to_string(),
            ));
        }
        if config.timeout.is_zero() {
            return Err(CampaignError::InvalidConfig(
                "timeout must be greater than zero".to_string(),
            ));
        }
        if config.timeout > MAX_TIMEOUT {
            return Err(CampaignError::InvalidConfig(format!(
                "timeout must be at most {}s, got {:?}",
                MAX_TIMEOUT.as_secs(),
                config.timeout
            )));
        }

        if !config.subject.exists() {
            return Err(CampaignError::SubjectNotFound(config.subject.clone()));
        }
        if !config.subject.is_file() {
            return Err(CampaignError::SubjectNotAFile(config.subject.clone()));
        }

        fs::create_dir_all(&config.output_dir).map_err(|source| CampaignError::OutputDir {
            path: config.output_dir.clone(),
            source,
        })?;

        let log_path = config.output_dir.join(LOG_FILE_NAME);
        let log = CampaignLog::create(&log_path).map_err(|source| CampaignError::Log {
            path: log_path.clone(),
            source,
        })?;

        let seed = FuzzRng::from_optional_seed(config.seed).seed();

        let invoker = SubjectInvoker::new(&config.subject, &config.output_dir)
            .with_timeout(config.timeout)
            .with_encoding(config.encoding.codec())
            .with_sample_extension(config.sample_extension.clone());

        let samples = RandomSamples::new(
            FragmentGenerator::with_unicode(config.use_unicode),
            SampleBuilder::new(config.max_length),
            seed,
        );

        Ok(Self {
            config,
            seed,
            invoker,
            samples: Box::new(samples),
            log,
        })
    }

    /// Replace the random sample source
    pub fn with_sample_factory(mut self, samples: Box<dyn SampleFactory>) -> Self {
        self.samples = samples;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &CampaignConfig {
        &self.config
    }

    pub fn log_path(&self) -> &Path {
        self.log.path()
    }

    /// Run every iteration, then write the report and results
    ///
    /// No iteration can abort the loop; `num_tests` results are always
    /// produced.
    pub fn run(mut self, observer: &mut dyn CampaignObserver) -> CampaignResult<CampaignSummary> {
        let total = self.config.num_tests;
        let mut stats = CampaignStats::new();
        let mut results = Vec::with_capacity(total);

        info!(
            "Starting fuzzing campaign: {} tests against {} (seed {})",
            total,
            self.config.subject.display(),
            self.seed
        );
        self.write_log(&format!("Starting fuzzing campaign: {} tests", total));
        self.write_log(&format!("Seed: {}", self.seed));
        observer.on_start(total, self.seed);

        for index in 1..=total {
            let sample = self.samples.sample(index);
            let invocation = self.invoker.invoke(&sample, index);
            self.log_invocation(index, &invocation);

            let status = classify(&invocation.outcome);
            let result = TestResult::new(index, status, invocation.sample_length);

            self.write_log(&format!(
                "Test {}/{}: {} - {} (Size: {})",
                index,
                total,
                result.status.label(),
                result.status,
                result.sample_length
            ));

            stats.record(&result.status);
            observer.on_result(&result);
            results.push(result);
        }

        debug_assert!(stats.is_consistent());
        observer.on_finish(&stats);

        let report_path = self.write_report(&stats)?;
        self.write_log(&format!("Report generated: {}", report_path.display()));

        let summary = CampaignSummary {
            seed: self.seed,
            stats,
            results,
            report_path,
            log_path: self.log.path().to_path_buf(),
            summary_path: self.config.output_dir.join(SUMMARY_FILE_NAME),
        };
        write_summary(&summary).map_err(|source| CampaignError::Summary {
            path: summary.summary_path.clone(),
            source,
        })?;

        info!(
            "Campaign finished: {} successful, {} failed, {} timeouts, {} exceptions",
            stats.success, stats.failed, stats.timeout, stats.exception
        );

        Ok(summary)
    }

    fn log_invocation(&mut self, index: usize, invocation: &Invocation) {
        if invocation.sanitized {
            self.write_log(&format!(
                "Unicode encoding error in test {}: sample sanitized and retried",
                index
            ));
        }
        match &invocation.outcome {
            InvocationOutcome::TimedOut => self.write_log(&format!("Test {}: TIMEOUT", index)),
            InvocationOutcome::HarnessError(msg) => {
                self.write_log(&format!("Test {}: EXCEPTION - {}", index, msg))
            }
            InvocationOutcome::Exited { .. } => {}
        }
    }

    fn write_report(&self, stats: &CampaignStats) -> CampaignResult<PathBuf> {
        let subject_name = self
            .config
            .subject
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.config.subject.display().to_string());

        ReportGenerator::new(subject_name, Local::now())
            .with_seed(self.seed)
            .write(&self.config.output_dir, stats)
            .map_err(|source| CampaignError::Report {
                path: self.config.output_dir.join(crate::report::REPORT_FILE_NAME),
                source,
            })
    }

    /// Log failures are reported but never stop the campaign
    fn write_log(&mut self, message: &str) {
        if let Err(err) = self.log.append(message) {
            warn!("Could not append to {}: {}", self.log.path().display(), err);
        }
    }
}

fn write_summary(summary: &CampaignSummary) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(&summary.summary_path)?);
    serde_json::to_writer_pretty(&mut writer, summary)?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_setup_missing_subject() {
        let dir = TempDir::new().unwrap();
        let config = CampaignConfig {
            subject: dir.path().join("nope"),
            output_dir: dir.path().join("out"),
            ..Default::default()
        };

        let err = Campaign::setup(config).err().unwrap();
        assert!(matches!(err, CampaignError::SubjectNotFound(_)));
        assert!(err.to_string().contains("not found"));
        // Nothing is created before setup succeeds.
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_setup_subject_is_directory() {
        let dir = TempDir::new().unwrap();
        let config = CampaignConfig {
            subject: dir.path().to_path_buf(),
            output_dir: dir.path().join("out"),
            ..Default::default()
        };

        assert!(matches!(
            Campaign::setup(config),
            Err(CampaignError::SubjectNotAFile(_))
        ));
    }

    #[test]
    fn test_setup_rejects_zero_tests() {
        let config = CampaignConfig {
            num_tests: 0,
            ..Default::default()
        };
        assert!(matches!(
            Campaign::setup(config),
            Err(CampaignError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_setup_rejects_oversized_timeout() {
        let config = CampaignConfig {
            timeout: Duration::from_secs(u64::MAX),
            ..Default::default()
        };
        let err = Campaign::setup(config).err().unwrap();
        assert!(matches!(err, CampaignError::InvalidConfig(_)));
        assert!(err.to_string().contains("at most"));
    }

    #[test]
    fn test_random_samples_are_replayable_per_index() {
        let mut a = RandomSamples::new(FragmentGenerator::default(), SampleBuilder::new(200), 77);
        let mut b = RandomSamples::new(FragmentGenerator::default(), SampleBuilder::new(200), 77);

        // Order of generation must not matter.
        let a5 = a.sample(5);
        let _ = b.sample(1);
        let _ = b.sample(2);
        assert_eq!(b.sample(5), a5);
        assert_ne!(a.sample(6), a5);
    }

    #[test]
    fn test_closure_sample_factory() {
        let mut factory = |index: usize| Sample::new(format!("id_{}", index));
        assert_eq!(factory.sample(3).as_str(), "id_3");
    }
}
