//! Project configuration (lexfuzz.toml)

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Encodings accepted for `output.encoding`
pub const ENCODINGS: [&str; 3] = ["ascii", "utf8", "utf-8"];

/// Largest accepted `subject.timeout_secs` (one day)
pub const MAX_TIMEOUT_SECS: f64 = 86_400.0;

/// Campaign configuration from lexfuzz.toml
///
/// Every field is optional; unset values fall back to the campaign defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct FuzzConfig {
    /// The scanner under test
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<SubjectConfig>,

    /// Sample generation and test count
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign: Option<CampaignSection>,

    /// Artifacts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct SubjectConfig {
    /// Path to the executable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Per-test time budget in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<f64>,

    /// Extension for sample artifacts, without the dot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_extension: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct CampaignSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_tests: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_unicode: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,

    /// `ascii` or `utf8`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
}

impl FuzzConfig {
    /// Load configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate value ranges
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(n) = self.num_tests() {
            if n == 0 {
                return Err(invalid("campaign.num_tests", "must be at least 1"));
            }
        }

        if let Some(len) = self.max_length() {
            if len == 0 {
                return Err(invalid("campaign.max_length", "must be at least 1"));
            }
        }

        if let Some(secs) = self.timeout_secs() {
            if !secs.is_finite() || secs <= 0.0 {
                return Err(invalid("subject.timeout_secs", "must be greater than zero"));
            }
            if secs > MAX_TIMEOUT_SECS {
                return Err(invalid("subject.timeout_secs", "must be at most 86400 (one day)"));
            }
        }

        if let Some(ext) = self.sample_extension() {
            if ext.is_empty() {
                return Err(invalid("subject.sample_extension", "cannot be empty"));
            }
            if ext.starts_with('.') {
                return Err(invalid(
                    "subject.sample_extension",
                    "give the extension without a leading dot",
                ));
            }
        }

        if let Some(encoding) = self.encoding() {
            if !is_valid_encoding(encoding) {
                return Err(invalid(
                    "output.encoding",
                    &format!("unknown encoding '{}' (expected ascii or utf8)", encoding),
                ));
            }
        }

        Ok(())
    }

    pub fn subject_path(&self) -> Option<&Path> {
        self.subject.as_ref().and_then(|s| s.path.as_deref())
    }

    pub fn timeout_secs(&self) -> Option<f64> {
        self.subject.as_ref().and_then(|s| s.timeout_secs)
    }

    pub fn sample_extension(&self) -> Option<&str> {
        self.subject
            .as_ref()
            .and_then(|s| s.sample_extension.as_deref())
    }

    pub fn num_tests(&self) -> Option<usize> {
        self.campaign.as_ref().and_then(|c| c.num_tests)
    }

    pub fn max_length(&self) -> Option<usize> {
        self.campaign.as_ref().and_then(|c| c.max_length)
    }

    pub fn seed(&self) -> Option<u64> {
        self.campaign.as_ref().and_then(|c| c.seed)
    }

    pub fn use_unicode(&self) -> Option<bool> {
        self.campaign.as_ref().and_then(|c| c.use_unicode)
    }

    pub fn output_dir(&self) -> Option<&Path> {
        self.output.as_ref().and_then(|o| o.dir.as_deref())
    }

    pub fn encoding(&self) -> Option<&str> {
        self.output.as_ref().and_then(|o| o.encoding.as_deref())
    }

    /// Make relative paths relative to `root` instead of the working directory
    pub fn resolve_paths(&mut self, root: &Path) {
        if let Some(path) = self.subject.as_mut().and_then(|s| s.path.as_mut()) {
            if path.is_relative() {
                *path = root.join(&*path);
            }
        }
        if let Some(dir) = self.output.as_mut().and_then(|o| o.dir.as_mut()) {
            if dir.is_relative() {
                *dir = root.join(&*dir);
            }
        }
    }

    pub(crate) fn subject_mut(&mut self) -> &mut SubjectConfig {
        self.subject.get_or_insert_with(Default::default)
    }

    pub(crate) fn campaign_mut(&mut self) -> &mut CampaignSection {
        self.campaign.get_or_insert_with(Default::default)
    }

    pub(crate) fn output_mut(&mut self) -> &mut OutputConfig {
        self.output.get_or_insert_with(Default::default)
    }
}

pub(crate) fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn is_valid_encoding(encoding: &str) -> bool {
    ENCODINGS.contains(&encoding.to_lowercase().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_config() {
        let config: FuzzConfig = toml::from_str("").unwrap();
        assert_eq!(config, FuzzConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[subject]
path = "bin/opal"
timeout_secs = 2.5
sample_extension = "op"

[campaign]
num_tests = 500
max_length = 256
seed = 42
use_unicode = true

[output]
dir = "results"
encoding = "utf8"
"#;

        let config: FuzzConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.subject_path(), Some(Path::new("bin/opal")));
        assert_eq!(config.timeout_secs(), Some(2.5));
        assert_eq!(config.sample_extension(), Some("op"));
        assert_eq!(config.num_tests(), Some(500));
        assert_eq!(config.max_length(), Some(256));
        assert_eq!(config.seed(), Some(42));
        assert_eq!(config.use_unicode(), Some(true));
        assert_eq!(config.output_dir(), Some(Path::new("results")));
        assert_eq!(config.encoding(), Some("utf8"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<FuzzConfig, _> = toml::from_str("[campaign]\niterations = 3\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_encoding_validation() {
        assert!(is_valid_encoding("ascii"));
        assert!(is_valid_encoding("UTF-8"));
        assert!(is_valid_encoding("utf8"));
        assert!(!is_valid_encoding("latin1"));
    }

    #[test]
    fn test_leading_dot_extension_rejected() {
        let config: FuzzConfig = toml::from_str("[subject]\nsample_extension = \".op\"\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "subject.sample_extension"
        ));
    }

    #[test]
    fn test_resolve_paths_keeps_absolute() {
        let mut config: FuzzConfig =
            toml::from_str("[subject]\npath = \"/usr/bin/lexer\"\n[output]\ndir = \"out\"\n").unwrap();
        config.resolve_paths(Path::new("/work"));
        assert_eq!(config.subject_path(), Some(Path::new("/usr/bin/lexer")));
        assert_eq!(config.output_dir(), Some(Path::new("/work/out")));
    }
}
