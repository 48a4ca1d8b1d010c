//! Run command - execute a fuzzing campaign

use anyhow::{anyhow, ensure, Context, Result};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use lexfuzz_config::{ConfigLoader, FuzzConfig};
use lexfuzz_core::campaign::{
    DEFAULT_MAX_LENGTH, DEFAULT_NUM_TESTS, DEFAULT_OUTPUT_DIR, DEFAULT_SUBJECT,
};
use lexfuzz_core::encoding::EncodingKind;
use lexfuzz_core::invoker::{DEFAULT_TIMEOUT, MAX_TIMEOUT};
use lexfuzz_core::{
    Campaign, CampaignConfig, CampaignObserver, CampaignStats, CampaignSummary, TestResult,
};
use log::{info, LevelFilter};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Verbose mode prints a progress line this often
const PROGRESS_EVERY: usize = 10;

/// Arguments for the run command
///
/// `None` means "not given on the command line"; the value then comes from
/// lexfuzz.toml, the environment or the built-in default.
#[derive(Debug, Clone)]
pub struct RunArgs {
    pub subject: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub num_tests: Option<usize>,
    pub max_length: Option<usize>,
    pub timeout_secs: Option<f64>,
    pub seed: Option<u64>,
    pub use_unicode: bool,
    pub encoding: Option<EncodingKind>,
    pub sample_extension: Option<String>,
    /// Explicit lexfuzz.toml
    pub config: Option<PathBuf>,
    pub verbose: bool,
    pub json: bool,
    pub no_color: bool,
    /// Where to start looking for lexfuzz.toml
    pub working_dir: PathBuf,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            subject: None,
            output_dir: None,
            num_tests: None,
            max_length: None,
            timeout_secs: None,
            seed: None,
            use_unicode: false,
            encoding: None,
            sample_extension: None,
            config: None,
            verbose: false,
            json: false,
            no_color: false,
            working_dir: PathBuf::from("."),
        }
    }
}

/// Run the campaign described by `args`
pub fn run(args: RunArgs) -> Result<()> {
    if args.no_color {
        colored::control::set_override(false);
    }
    init_logging(&args);

    let loaded = match &args.config {
        Some(path) => ConfigLoader::new().load_from_file(path),
        None => ConfigLoader::new().load_from_directory(&args.working_dir),
    }
    .context("Failed to load lexfuzz configuration")?;

    if let Some(source) = &loaded.source {
        info!("Using configuration from {}", source.display());
    }

    let config = campaign_config(&args, &loaded.file)?;
    let campaign = Campaign::setup(config)?;

    let mut observer = ProgressObserver::new(args.verbose, args.json);
    let summary = campaign.run(&mut observer)?;

    if args.json {
        print_json(&summary)?;
    } else {
        print_summary(&summary);
    }

    if args.no_color {
        colored::control::unset_override();
    }

    Ok(())
}

/// Merge flags over file and environment values over defaults
fn campaign_config(args: &RunArgs, file: &FuzzConfig) -> Result<CampaignConfig> {
    let timeout = match args.timeout_secs.or(file.timeout_secs()) {
        Some(secs) => {
            ensure!(
                secs.is_finite() && secs > 0.0,
                "timeout must be a positive number of seconds, got {}",
                secs
            );
            let timeout = Duration::try_from_secs_f64(secs)
                .map_err(|e| anyhow!("invalid timeout {}: {}", secs, e))?;
            ensure!(
                timeout <= MAX_TIMEOUT,
                "timeout must be at most {} seconds, got {}",
                MAX_TIMEOUT.as_secs(),
                secs
            );
            timeout
        }
        None => DEFAULT_TIMEOUT,
    };

    let encoding = match (args.encoding, file.encoding()) {
        (Some(kind), _) => kind,
        (None, Some(name)) => name.parse::<EncodingKind>().map_err(|e: String| anyhow!(e))?,
        (None, None) => EncodingKind::default(),
    };

    let num_tests = args.num_tests.or(file.num_tests()).unwrap_or(DEFAULT_NUM_TESTS);
    ensure!(num_tests >= 1, "number of tests must be at least 1");

    let max_length = args.max_length.or(file.max_length()).unwrap_or(DEFAULT_MAX_LENGTH);
    ensure!(max_length >= 1, "maximum sample length must be at least 1");

    let sample_extension = args
        .sample_extension
        .as_deref()
        .or(file.sample_extension())
        .map(|ext| ext.trim_start_matches('.').to_string())
        .filter(|ext| !ext.is_empty());

    Ok(CampaignConfig {
        subject: args
            .subject
            .clone()
            .or_else(|| file.subject_path().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SUBJECT)),
        output_dir: args
            .output_dir
            .clone()
            .or_else(|| file.output_dir().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
        num_tests,
        max_length,
        timeout,
        seed: args.seed.or(file.seed()),
        use_unicode: args.use_unicode || file.use_unicode().unwrap_or(false),
        encoding,
        sample_extension,
    })
}

fn init_logging(args: &RunArgs) {
    let level = if args.json {
        LevelFilter::Warn
    } else if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let color = if args.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    let config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .add_filter_allow_str("lexfuzz")
        .build();

    // Already initialized when run more than once in-process.
    let _ = TermLogger::init(level, config, TerminalMode::Stderr, color);
}

/// Progress bar in normal mode, log lines in verbose mode, silence for JSON
struct ProgressObserver {
    bar: Option<ProgressBar>,
    verbose: bool,
    quiet: bool,
    total: usize,
    done: usize,
}

impl ProgressObserver {
    fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            bar: None,
            verbose,
            quiet,
            total: 0,
            done: 0,
        }
    }
}

impl CampaignObserver for ProgressObserver {
    fn on_start(&mut self, total: usize, seed: u64) {
        self.total = total;
        if self.quiet {
            return;
        }
        if !self.verbose {
            let bar = ProgressBar::new(total as u64);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            {
                bar.set_style(style.progress_chars("=> "));
            }
            bar.enable_steady_tick(Duration::from_millis(80));
            self.bar = Some(bar);
        }
        println!(
            "{} {} tests (seed {})",
            "Fuzzing".green().bold(),
            total,
            seed.to_string().bold()
        );
    }

    fn on_result(&mut self, result: &TestResult) {
        self.done += 1;

        if let Some(bar) = &self.bar {
            if !result.status.is_success() {
                bar.set_message(format!("last: test {} {}", result.index, result.status.label()));
            }
            bar.inc(1);
        } else if self.verbose {
            info!(
                "Test {}/{}: {} - {} (Size: {})",
                result.index,
                self.total,
                result.status.label(),
                result.status,
                result.sample_length
            );
            if self.done % PROGRESS_EVERY == 0 {
                info!("Progress: {}/{} tests completed", self.done, self.total);
            }
        }
    }

    fn on_finish(&mut self, _stats: &CampaignStats) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

fn print_summary(summary: &CampaignSummary) {
    let stats = &summary.stats;

    println!();
    println!("{}", "Fuzzing complete".bold());
    println!("  Total tests: {}", stats.total.to_string().bold());
    println!(
        "  {} {} successful ({:.1}%)",
        "✓".green(),
        stats.success,
        stats.percent(stats.success)
    );
    println!(
        "  {} {} failed ({:.1}%)",
        "✗".red(),
        stats.failed,
        stats.percent(stats.failed)
    );
    println!(
        "  {} {} timeouts ({:.1}%)",
        "⏱".yellow(),
        stats.timeout,
        stats.percent(stats.timeout)
    );
    println!(
        "  {} {} exceptions ({:.1}%)",
        "!".magenta(),
        stats.exception,
        stats.percent(stats.exception)
    );
    println!();
    println!("  Report: {}", summary.report_path.display());
    println!("  Log:    {}", summary.log_path.display());
    println!("  Seed:   {}", summary.seed);
}

fn print_json(summary: &CampaignSummary) -> Result<()> {
    let output = serde_json::json!({
        "seed": summary.seed,
        "stats": summary.stats,
        "report": summary.report_path.display().to_string(),
        "log": summary.log_path.display().to_string(),
        "results": summary.summary_path.display().to_string(),
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&output).context("Failed to serialize summary")?
    );
    Ok(())
}
