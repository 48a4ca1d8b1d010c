//! Subject invoker - runs the scanner under test against one sample
//!
//! The sample is written to `test_<index>` in the output directory, then the
//! subject is executed with that path as its only argument. The invoker never
//! returns an error: every failure becomes part of the [`InvocationOutcome`],
//! so a single bad test cannot stop a campaign.

use crate::encoding::{Ascii, EncodeError, TextEncoding};
use crate::outcome::InvocationOutcome;
use crate::sample::Sample;
use log::{debug, error, warn};
use std::borrow::Cow;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Default wall-clock budget for one subject run
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound on the per-test budget
pub const MAX_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// The original attempt plus one sanitized retry
pub const MAX_ENCODE_ATTEMPTS: usize = 2;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Failures inside a single invocation
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("failed to write sample artifact {path}: {source}")]
    WriteSample { path: PathBuf, source: io::Error },

    #[error("failed to spawn subject {path}: {source}")]
    Spawn { path: PathBuf, source: io::Error },

    #[error("failed waiting for subject: {0}")]
    Wait(io::Error),
}

/// Everything the campaign needs to know about one run
#[derive(Debug, Clone)]
pub struct Invocation {
    pub outcome: InvocationOutcome,
    /// Length in characters of the text actually handed to the subject
    pub sample_length: usize,
    /// Whether the sample had to be sanitized before it could be written
    pub sanitized: bool,
    pub elapsed: Duration,
}

/// Runs the subject executable against samples
pub struct SubjectInvoker {
    subject: PathBuf,
    output_dir: PathBuf,
    timeout: Duration,
    encoding: Box<dyn TextEncoding>,
    sample_extension: Option<String>,
}

impl SubjectInvoker {
    /// Create an invoker with the default timeout and ASCII artifacts
    pub fn new(subject: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            subject: subject.into(),
            output_dir: output_dir.into(),
            timeout: DEFAULT_TIMEOUT,
            encoding: Box::new(Ascii),
            sample_extension: None,
        }
    }

    /// Per-test budget, capped at [`MAX_TIMEOUT`]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_encoding(mut self, encoding: Box<dyn TextEncoding>) -> Self {
        self.encoding = encoding;
        self
    }

    /// Extension appended to sample artifacts (`test_<index>.<ext>`)
    pub fn with_sample_extension(mut self, extension: Option<String>) -> Self {
        self.sample_extension = extension;
        self
    }

    pub fn subject(&self) -> &Path {
        &self.subject
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn sample_path(&self, index: usize) -> PathBuf {
        let name = match &self.sample_extension {
            Some(ext) => format!("test_{}.{}", index, ext),
            None => format!("test_{}", index),
        };
        self.output_dir.join(name)
    }

    pub fn error_path(&self, index: usize) -> PathBuf {
        self.output_dir.join(format!("error_{}.txt", index))
    }

    /// Run the subject against `sample`
    ///
    /// If the sample cannot be encoded, it is sanitized and the whole
    /// invocation retried once. A second failure is reported as a harness
    /// error.
    pub fn invoke(&self, sample: &Sample, index: usize) -> Invocation {
        let start = Instant::now();
        let mut text = Cow::Borrowed(sample.as_str());
        let mut sanitized = false;
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.try_invoke(&text, index) {
                Ok(outcome) => {
                    return Invocation {
                        outcome,
                        sample_length: text.chars().count(),
                        sanitized,
                        elapsed: start.elapsed(),
                    };
                }
                Err(InvokeError::Encode(err)) if attempt < MAX_ENCODE_ATTEMPTS => {
                    warn!("Encoding error in test {}: {}; retrying sanitized", index, err);
                    text = Cow::Owned(self.encoding.sanitize(&text));
                    sanitized = true;
                }
                Err(err) => {
                    error!("Test {}: harness error: {}", index, err);
                    return Invocation {
                        outcome: InvocationOutcome::HarnessError(err.to_string()),
                        sample_length: text.chars().count(),
                        sanitized,
                        elapsed: start.elapsed(),
                    };
                }
            }
        }
    }

    fn try_invoke(&self, text: &str, index: usize) -> Result<InvocationOutcome, InvokeError> {
        let bytes = self.encoding.encode(text)?;
        let path = self.sample_path(index);
        fs::write(&path, bytes).map_err(|source| InvokeError::WriteSample {
            path: path.clone(),
            source,
        })?;

        let outcome = self.run_subject(&path)?;

        if let InvocationOutcome::Exited {
            code,
            stdout,
            stderr,
        } = &outcome
        {
            debug!("Test {}: subject exited with code {}", index, code);
            if *code != 0 {
                self.write_error_artifact(index, stdout, stderr);
            }
        }

        Ok(outcome)
    }

    fn run_subject(&self, sample_path: &Path) -> Result<InvocationOutcome, InvokeError> {
        let mut child = Command::new(&self.subject)
            .arg(sample_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| InvokeError::Spawn {
                path: self.subject.clone(),
                source,
            })?;

        // Drain both pipes concurrently so a chatty subject cannot block on a
        // full pipe while we wait for it.
        let stdout = StreamReader::spawn(child.stdout.take());
        let stderr = StreamReader::spawn(child.stderr.take());
        let deadline = Instant::now().checked_add(self.timeout.min(MAX_TIMEOUT));

        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    // Background children of the subject may still hold the
                    // pipes; reading stops at the deadline either way.
                    return Ok(InvocationOutcome::Exited {
                        code: exit_code(status),
                        stdout: stdout.collect(deadline),
                        stderr: stderr.collect(deadline),
                    });
                }
                Ok(None) if deadline.is_some_and(|d| Instant::now() >= d) => {
                    terminate(&mut child);
                    debug!("Subject exceeded {:?}; killed", self.timeout);
                    return Ok(InvocationOutcome::TimedOut);
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(err) => {
                    terminate(&mut child);
                    return Err(InvokeError::Wait(err));
                }
            }
        }
    }

    /// Persist captured streams for a failing test. Best effort.
    fn write_error_artifact(&self, index: usize, stdout: &str, stderr: &str) {
        let path = self.error_path(index);
        let content = self
            .encoding
            .sanitize(&format!("STDOUT:\n{}\n\nSTDERR:\n{}", stdout, stderr));

        let written = self
            .encoding
            .encode(&content)
            .map_err(|e| e.to_string())
            .and_then(|bytes| fs::write(&path, bytes).map_err(|e| e.to_string()));

        if let Err(err) = written {
            warn!("Could not write error artifact {}: {}", path.display(), err);
        }
    }
}

/// One output stream, captured on a background thread
struct StreamReader {
    captured: Arc<Mutex<Vec<u8>>>,
    closed: Option<Receiver<()>>,
}

impl StreamReader {
    fn spawn<R: Read + Send + 'static>(pipe: Option<R>) -> Self {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let closed = pipe.map(|mut pipe| {
            let (tx, rx) = mpsc::channel();
            let sink = Arc::clone(&captured);
            thread::spawn(move || {
                let mut chunk = [0u8; 4096];
                loop {
                    match pipe.read(&mut chunk) {
                        Ok(0) => break,
                        Ok(n) => match sink.lock() {
                            Ok(mut buf) => buf.extend_from_slice(&chunk[..n]),
                            Err(_) => break,
                        },
                        Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                        Err(_) => break,
                    }
                }
                let _ = tx.send(());
            });
            rx
        });
        Self { captured, closed }
    }

    /// Wait for end of stream until `deadline`, then take what was read.
    /// A reader still blocked at the deadline is abandoned.
    fn collect(self, deadline: Option<Instant>) -> String {
        if let Some(closed) = &self.closed {
            match deadline {
                Some(d) => {
                    let _ = closed.recv_timeout(d.saturating_duration_since(Instant::now()));
                }
                None => {
                    let _ = closed.recv();
                }
            }
        }
        let buf = match self.captured.lock() {
            Ok(buf) => buf,
            Err(poisoned) => poisoned.into_inner(),
        };
        let text = String::from_utf8_lossy(&buf).into_owned();
        text
    }
}

fn terminate(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// Exit code, or `-signal` for a subject killed by a signal
#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .unwrap_or_else(|| status.signal().map(|sig| -sig).unwrap_or(-1))
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}
