//! Campaign report rendering

use crate::outcome::CampaignStats;
use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const REPORT_FILE_NAME: &str = "fuzzing_report.md";

const FAILED_NOTE: &str = "Failed tests indicate situations where the lexer returned an error.\n\
This may be normal (correctly detecting invalid input) or may reveal potential bugs.";
const TIMEOUT_NOTE: &str = "Timeouts may indicate performance issues or infinite loops.";
const EXCEPTION_NOTE: &str = "Exceptions are typically unhandled errors and should be examined.";
const NEXT_STEPS: [&str; 4] = [
    "Examine failed tests to identify common patterns",
    "Check performance issues for timeout cases",
    "Fix identified bugs and improve lexer robustness",
    "Re-run tests to validate fixes",
];

/// Renders campaign statistics as a markdown report
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    subject_name: String,
    generated_at: DateTime<Local>,
    seed: Option<u64>,
}

impl ReportGenerator {
    pub fn new(subject_name: impl Into<String>, generated_at: DateTime<Local>) -> Self {
        Self {
            subject_name: subject_name.into(),
            generated_at,
            seed: None,
        }
    }

    /// Include the campaign seed so the run can be replayed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Render the report text
    pub fn render(&self, stats: &CampaignStats) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "# Fuzzing Report for {}\n", self.subject_name);
        let _ = writeln!(
            out,
            "Execution date: {}\n",
            self.generated_at.format("%a %b %e %H:%M:%S %Z %Y")
        );
        if let Some(seed) = self.seed {
            let _ = writeln!(out, "Seed: {}\n", seed);
        }

        out.push_str("## Results\n\n");
        let _ = writeln!(out, "- **Total tests**: {}", stats.total);
        let rows = [
            ("Successful tests", stats.success),
            ("Failed tests", stats.failed),
            ("Timeouts", stats.timeout),
            ("Exceptions", stats.exception),
        ];
        for (label, count) in rows {
            let _ = writeln!(
                out,
                "- **{}**: {} ({:.1}%)",
                label,
                count,
                stats.percent(count)
            );
        }
        out.push('\n');

        out.push_str("## Observations\n\n");
        if stats.failed > 0 {
            let _ = writeln!(out, "{}\n", FAILED_NOTE);
        }
        if stats.timeout > 0 {
            let _ = writeln!(out, "{}\n", TIMEOUT_NOTE);
        }
        if stats.exception > 0 {
            let _ = writeln!(out, "{}\n", EXCEPTION_NOTE);
        }

        out.push_str("## Next Steps\n\n");
        for (i, step) in NEXT_STEPS.iter().enumerate() {
            let _ = writeln!(out, "{}. {}", i + 1, step);
        }

        out
    }

    /// Render and write `fuzzing_report.md` into `output_dir`
    pub fn write(&self, output_dir: &Path, stats: &CampaignStats) -> io::Result<PathBuf> {
        let path = output_dir.join(REPORT_FILE_NAME);
        fs::write(&path, self.render(stats))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn generator() -> ReportGenerator {
        let at = Local.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        ReportGenerator::new("opal", at)
    }

    fn stats(success: usize, failed: usize, timeout: usize, exception: usize) -> CampaignStats {
        CampaignStats {
            total: success + failed + timeout + exception,
            success,
            failed,
            timeout,
            exception,
        }
    }

    #[test]
    fn test_percentages() {
        let report = generator().render(&stats(1, 2, 1, 0));
        assert!(report.contains("- **Total tests**: 4"));
        assert!(report.contains("- **Successful tests**: 1 (25.0%)"));
        assert!(report.contains("- **Failed tests**: 2 (50.0%)"));
        assert!(report.contains("- **Timeouts**: 1 (25.0%)"));
        assert!(report.contains("- **Exceptions**: 0 (0.0%)"));
    }

    #[test]
    fn test_empty_campaign_has_zero_percent() {
        let report = generator().render(&CampaignStats::new());
        assert!(report.contains("- **Successful tests**: 0 (0.0%)"));
        assert!(!report.contains("NaN"));
    }

    #[test]
    fn test_notes_are_conditional() {
        let clean = generator().render(&stats(3, 0, 0, 0));
        assert!(!clean.contains("Failed tests indicate"));
        assert!(!clean.contains("Timeouts may indicate"));
        assert!(!clean.contains("Exceptions are typically"));

        let noisy = generator().render(&stats(0, 1, 1, 1));
        assert!(noisy.contains("Failed tests indicate"));
        assert!(noisy.contains("Timeouts may indicate"));
        assert!(noisy.contains("Exceptions are typically"));
    }

    #[test]
    fn test_next_steps_always_present() {
        let report = generator().render(&stats(1, 0, 0, 0));
        let tail: Vec<&str> = report
            .lines()
            .skip_while(|l| *l != "## Next Steps")
            .skip(2)
            .collect();
        assert_eq!(
            tail,
            vec![
                "1. Examine failed tests to identify common patterns",
                "2. Check performance issues for timeout cases",
                "3. Fix identified bugs and improve lexer robustness",
                "4. Re-run tests to validate fixes",
            ]
        );
    }

    #[test]
    fn test_seed_line() {
        let report = generator().with_seed(99).render(&stats(1, 0, 0, 0));
        assert!(report.contains("Seed: 99"));
        assert!(!generator().render(&stats(1, 0, 0, 0)).contains("Seed:"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let s = stats(5, 3, 1, 1);
        assert_eq!(generator().render(&s), generator().render(&s));
    }
}
