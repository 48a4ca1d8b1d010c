//! Append-only campaign log
//!
//! Opened once when a campaign starts and closed when it is dropped. Every
//! entry is flushed immediately so an interrupted campaign keeps everything
//! written up to that point.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const LOG_FILE_NAME: &str = "fuzzing_log.txt";
pub const LOG_HEADER: &str = "=== Fuzzing Log ===";

#[derive(Debug)]
pub struct CampaignLog {
    path: PathBuf,
    file: File,
}

impl CampaignLog {
    /// Create (or truncate) the log and write its header
    pub fn create(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let mut file = File::create(&path)?;
        writeln!(file, "{}\n", LOG_HEADER)?;
        file.flush()?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one line and flush it to disk
    pub fn append(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.file, "{}", message)?;
        self.file.flush()
    }
}
