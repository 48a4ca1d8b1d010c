use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use lexfuzz_core::encoding::EncodingKind;
use std::io;
use std::path::PathBuf;

mod commands;
mod config;

/// Grammar-aware fuzzing harness for lexical scanners.
///
/// lexfuzz generates token-like inputs (string and number literals, operators,
/// identifiers, comments, whitespace), runs a scanner executable against each
/// one with a timeout, and summarizes the outcomes in a report.
///
/// EXAMPLES:
///     lexfuzz run --subject bin/opal           Run 100 tests against bin/opal
///     lexfuzz run -n 1000 -m 500 --seed 7      Larger, reproducible campaign
///     lexfuzz sample --seed 7 --index 42       Print the input of test 42
///     lexfuzz completions zsh                  Generate shell completions
///
/// ENVIRONMENT VARIABLES:
///     LEXFUZZ_SUBJECT     Subject executable
///     LEXFUZZ_TIMEOUT     Per-test timeout in seconds
///     LEXFUZZ_SEED        Campaign seed
///     LEXFUZZ_USE_UNICODE Set to '1' to include unicode in samples
///     LEXFUZZ_OUTPUT_DIR  Directory for artifacts
///     LEXFUZZ_ENCODING    Artifact encoding (ascii or utf8)
///     LEXFUZZ_JSON        Set to '1' for JSON output by default
///     NO_COLOR            Set to disable colored output
#[derive(Parser)]
#[command(name = "lexfuzz")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a fuzzing campaign
    ///
    /// Generates samples, runs the subject against each one and writes
    /// test_<i>, error_<i>.txt, fuzzing_log.txt, fuzzing_report.md and
    /// fuzzing_results.json into the output directory. Settings not given
    /// on the command line come from lexfuzz.toml and LEXFUZZ_* variables.
    ///
    /// EXAMPLES:
    ///     lexfuzz run                                  Use lexfuzz.toml or defaults
    ///     lexfuzz run --subject ./lexer -o results     Custom subject and output
    ///     lexfuzz run --use-unicode --encoding utf8    Feed unicode through
    ///     lexfuzz run --json                           Print summary as JSON
    #[command(visible_alias = "r")]
    Run {
        /// Subject executable (default: bin/opal)
        #[arg(long, short = 's')]
        subject: Option<PathBuf>,
        /// Output directory (default: fuzzing_results)
        #[arg(long, short = 'o')]
        output_dir: Option<PathBuf>,
        /// Number of tests (default: 100)
        #[arg(long, short = 'n')]
        num_tests: Option<usize>,
        /// Maximum sample length in characters (default: 1000)
        #[arg(long, short = 'm')]
        max_length: Option<usize>,
        /// Per-test timeout in seconds (default: 5)
        #[arg(long, short = 't')]
        timeout: Option<f64>,
        /// Seed for a reproducible campaign
        #[arg(long)]
        seed: Option<u64>,
        /// Include unicode characters in string and comment bodies
        #[arg(long)]
        use_unicode: bool,
        /// Artifact encoding: ascii or utf8 (default: ascii)
        #[arg(long)]
        encoding: Option<EncodingKind>,
        /// Extension for sample files, e.g. "op" gives test_1.op
        #[arg(long)]
        ext: Option<String>,
        /// Path to a lexfuzz.toml (default: search upward from cwd)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
        /// Log every result
        #[arg(long, short = 'v')]
        verbose: bool,
        /// Print the campaign summary as JSON
        #[arg(long)]
        json: bool,
        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Print the sample a campaign would use for one test
    ///
    /// Samples depend only on the campaign seed, the test index and the
    /// generation settings, so any test can be reproduced without rerunning
    /// the campaign.
    ///
    /// EXAMPLES:
    ///     lexfuzz sample --seed 7                   Sample of test 1
    ///     lexfuzz sample --seed 7 --index 42 -m 500
    ///     lexfuzz sample --seed 7 --use-unicode --encoding utf8
    Sample {
        /// Campaign seed
        #[arg(long)]
        seed: u64,
        /// Test index, starting at 1
        #[arg(long, short = 'i', default_value_t = 1)]
        index: usize,
        /// Maximum sample length in characters
        #[arg(long, short = 'm', default_value_t = lexfuzz_core::campaign::DEFAULT_MAX_LENGTH)]
        max_length: usize,
        /// Include unicode characters in string and comment bodies
        #[arg(long)]
        use_unicode: bool,
        /// Encoding the sample is rendered in: ascii or utf8
        #[arg(long, default_value_t = EncodingKind::Ascii)]
        encoding: EncodingKind,
    },

    /// Generate shell completions
    ///
    /// EXAMPLES:
    ///     lexfuzz completions bash > ~/.local/share/bash-completion/completions/lexfuzz
    ///     lexfuzz completions zsh > ~/.zfunc/_lexfuzz
    ///     lexfuzz completions fish > ~/.config/fish/completions/lexfuzz.fish
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cli_config = config::Config::from_env();

    match cli.command {
        Commands::Run {
            subject,
            output_dir,
            num_tests,
            max_length,
            timeout,
            seed,
            use_unicode,
            encoding,
            ext,
            config,
            verbose,
            json,
            no_color,
        } => {
            let args = commands::run::RunArgs {
                subject,
                output_dir,
                num_tests,
                max_length,
                timeout_secs: timeout,
                seed,
                use_unicode,
                encoding,
                sample_extension: ext,
                config,
                verbose,
                // Command-line flags override environment variables
                json: json || cli_config.default_json,
                no_color: no_color || cli_config.no_color,
                working_dir: std::env::current_dir()?,
            };
            commands::run::run(args)?;
        }
        Commands::Sample {
            seed,
            index,
            max_length,
            use_unicode,
            encoding,
        } => {
            let args = commands::sample::SampleArgs {
                seed,
                index,
                max_length,
                use_unicode,
                encoding,
            };
            commands::sample::run(args)?;
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_flags() {
        let cli = Cli::parse_from([
            "lexfuzz",
            "run",
            "-o",
            "out",
            "-n",
            "20",
            "-m",
            "64",
            "--seed",
            "5",
            "--encoding",
            "utf8",
            "--use-unicode",
        ]);
        match cli.command {
            Commands::Run {
                output_dir,
                num_tests,
                max_length,
                seed,
                encoding,
                use_unicode,
                ..
            } => {
                assert_eq!(output_dir, Some(PathBuf::from("out")));
                assert_eq!(num_tests, Some(20));
                assert_eq!(max_length, Some(64));
                assert_eq!(seed, Some(5));
                assert_eq!(encoding, Some(EncodingKind::Utf8));
                assert!(use_unicode);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_run_rejects_unknown_encoding() {
        assert!(Cli::try_parse_from(["lexfuzz", "run", "--encoding", "latin1"]).is_err());
    }

    #[test]
    fn test_alias_r_for_run() {
        let cli = Cli::parse_from(["lexfuzz", "r"]);
        assert!(matches!(cli.command, Commands::Run { .. }));
    }

    #[test]
    fn test_sample_defaults() {
        let cli = Cli::parse_from(["lexfuzz", "sample", "--seed", "9"]);
        match cli.command {
            Commands::Sample {
                seed,
                index,
                max_length,
                use_unicode,
                encoding,
            } => {
                assert_eq!(seed, 9);
                assert_eq!(index, 1);
                assert_eq!(max_length, 1000);
                assert!(!use_unicode);
                assert_eq!(encoding, EncodingKind::Ascii);
            }
            _ => panic!("Expected Sample command"),
        }
    }

    #[test]
    fn test_sample_requires_seed() {
        assert!(Cli::try_parse_from(["lexfuzz", "sample"]).is_err());
    }

    #[test]
    fn test_completions_bash() {
        let cli = Cli::parse_from(["lexfuzz", "completions", "bash"]);
        match cli.command {
            Commands::Completions { shell } => assert_eq!(shell, Shell::Bash),
            _ => panic!("Expected Completions command"),
        }
    }
}
