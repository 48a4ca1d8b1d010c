//! Invocation outcomes, their classification, and campaign statistics

use serde::{Deserialize, Serialize};
use std::fmt;

/// What happened when the subject was run against one sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationOutcome {
    /// The subject exited within the deadline
    Exited {
        code: i32,
        stdout: String,
        stderr: String,
    },
    /// The deadline elapsed and the subject was killed
    TimedOut,
    /// The harness itself failed to run the test
    HarnessError(String),
}

impl InvocationOutcome {
    pub fn exited(code: i32) -> Self {
        InvocationOutcome::Exited {
            code,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            InvocationOutcome::Exited { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn timed_out(&self) -> bool {
        matches!(self, InvocationOutcome::TimedOut)
    }

    pub fn harness_error(&self) -> Option<&str> {
        match self {
            InvocationOutcome::HarnessError(msg) => Some(msg),
            _ => None,
        }
    }
}

/// Classification of a single test
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Success,
    Failed(i32),
    Timeout,
    Exception(String),
}

impl Status {
    /// Category name without detail
    pub fn label(&self) -> &'static str {
        match self {
            Status::Success => "SUCCESS",
            Status::Failed(_) => "FAILED",
            Status::Timeout => "TIMEOUT",
            Status::Exception(_) => "EXCEPTION",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Status::Success)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Success => write!(f, "OK"),
            Status::Failed(code) => write!(f, "FAILED (code {})", code),
            Status::Timeout => write!(f, "TIMEOUT"),
            Status::Exception(msg) => write!(f, "EXCEPTION: {}", msg),
        }
    }
}

/// Map an outcome to its status
///
/// A nonzero exit is the subject rejecting its input, which is ordinary
/// fuzzing signal rather than a harness problem.
pub fn classify(outcome: &InvocationOutcome) -> Status {
    match outcome {
        InvocationOutcome::TimedOut => Status::Timeout,
        InvocationOutcome::HarnessError(msg) => Status::Exception(msg.clone()),
        InvocationOutcome::Exited { code: 0, .. } => Status::Success,
        InvocationOutcome::Exited { code, .. } => Status::Failed(*code),
    }
}

/// Result of one campaign iteration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestResult {
    pub index: usize,
    #[serde(flatten)]
    pub status: Status,
    pub sample_length: usize,
}

impl TestResult {
    pub fn new(index: usize, status: Status, sample_length: usize) -> Self {
        Self {
            index,
            status,
            sample_length,
        }
    }
}

/// Per-category counters for a campaign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CampaignStats {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub timeout: usize,
    pub exception: usize,
}

impl CampaignStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one status into the counters
    pub fn record(&mut self, status: &Status) {
        self.total += 1;
        match status {
            Status::Success => self.success += 1,
            Status::Failed(_) => self.failed += 1,
            Status::Timeout => self.timeout += 1,
            Status::Exception(_) => self.exception += 1,
        }
    }

    /// Share of `count` in `total`, in percent; 0 for an empty campaign
    pub fn percent(&self, count: usize) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            count as f64 / self.total as f64 * 100.0
        }
    }

    /// Whether the categories add up to the total
    pub fn is_consistent(&self) -> bool {
        self.success + self.failed + self.timeout + self.exception == self.total
    }
}

impl<'a> FromIterator<&'a Status> for CampaignStats {
    fn from_iter<I: IntoIterator<Item = &'a Status>>(iter: I) -> Self {
        let mut stats = CampaignStats::new();
        for status in iter {
            stats.record(status);
        }
        stats
    }
}
