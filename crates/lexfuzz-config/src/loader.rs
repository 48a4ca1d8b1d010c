//! Configuration Loader
//!
//! Finds `lexfuzz.toml` and applies environment overrides on top of it.

use crate::file::{invalid, FuzzConfig};
use crate::{ConfigResult, CONFIG_FILE_NAME};
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Configuration loader
///
/// Precedence, lowest first:
/// 1. Project config (lexfuzz.toml)
/// 2. Environment variables (LEXFUZZ_*)
/// 3. CLI flags (handled by caller)
#[derive(Debug, Default)]
pub struct ConfigLoader {
    skip_env: bool,
}

/// Loaded configuration and where it came from
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub file: FuzzConfig,

    /// The lexfuzz.toml that was read, if any
    pub source: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ignore `LEXFUZZ_*` variables
    pub fn without_env(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find lexfuzz.toml. A missing file is
    /// not an error; defaults and environment still apply.
    pub fn load_from_directory(&self, start_dir: &Path) -> ConfigResult<LoadedConfig> {
        let loaded = match find_config_file(start_dir) {
            Some(path) => read_file(&path)?,
            None => LoadedConfig::default(),
        };
        self.finish(loaded)
    }

    /// Load configuration from a specific file, which must exist
    pub fn load_from_file(&self, config_path: &Path) -> ConfigResult<LoadedConfig> {
        let loaded = read_file(config_path)?;
        self.finish(loaded)
    }

    fn finish(&self, mut loaded: LoadedConfig) -> ConfigResult<LoadedConfig> {
        if !self.skip_env {
            apply_env_overrides(&mut loaded.file)?;
            loaded.file.validate()?;
        }
        Ok(loaded)
    }
}

impl LoadedConfig {
    /// Directory holding the config file
    pub fn config_root(&self) -> Option<&Path> {
        self.source.as_deref().and_then(Path::parent)
    }
}

/// Walk up from `start_dir` looking for lexfuzz.toml
pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    start_dir
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

fn read_file(path: &Path) -> ConfigResult<LoadedConfig> {
    let mut file = FuzzConfig::load_from_file(path)?;
    if let Some(root) = path.parent() {
        file.resolve_paths(root);
    }
    Ok(LoadedConfig {
        file,
        source: Some(path.to_path_buf()),
    })
}

/// Apply LEXFUZZ_* overrides
///
/// Paths from the environment stay relative to the working directory.
fn apply_env_overrides(config: &mut FuzzConfig) -> ConfigResult<()> {
    if let Ok(subject) = env::var("LEXFUZZ_SUBJECT") {
        config.subject_mut().path = Some(PathBuf::from(subject));
    }

    if let Ok(timeout) = env::var("LEXFUZZ_TIMEOUT") {
        config.subject_mut().timeout_secs = Some(parse_env("LEXFUZZ_TIMEOUT", &timeout)?);
    }

    if let Ok(seed) = env::var("LEXFUZZ_SEED") {
        config.campaign_mut().seed = Some(parse_env("LEXFUZZ_SEED", &seed)?);
    }

    if let Ok(unicode) = env::var("LEXFUZZ_USE_UNICODE") {
        let unicode_bool = matches!(unicode.to_lowercase().as_str(), "true" | "1" | "yes");
        config.campaign_mut().use_unicode = Some(unicode_bool);
    }

    if let Ok(dir) = env::var("LEXFUZZ_OUTPUT_DIR") {
        config.output_mut().dir = Some(PathBuf::from(dir));
    }

    if let Ok(encoding) = env::var("LEXFUZZ_ENCODING") {
        config.output_mut().encoding = Some(encoding);
    }

    Ok(())
}

fn parse_env<T: FromStr>(name: &str, value: &str) -> ConfigResult<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| invalid(name, &format!("'{}': {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConfigError;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn create_config_file(dir: &Path, content: &str) -> PathBuf {
        let config_path = dir.join(CONFIG_FILE_NAME);
        fs::write(&config_path, content).unwrap();
        config_path
    }

    #[test]
    fn test_find_config_in_parent() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(temp_dir.path(), "[campaign]\nnum_tests = 7\n");

        let sub_dir = temp_dir.path().join("a").join("b");
        fs::create_dir_all(&sub_dir).unwrap();

        let config = ConfigLoader::new()
            .without_env()
            .load_from_directory(&sub_dir)
            .unwrap();

        assert_eq!(config.file.num_tests(), Some(7));
        assert_eq!(config.config_root(), Some(temp_dir.path()));
    }

    #[test]
    fn test_no_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = ConfigLoader::new()
            .without_env()
            .load_from_directory(temp_dir.path())
            .unwrap();

        assert!(config.source.is_none());
        assert_eq!(config.file, FuzzConfig::default());
    }

    #[test]
    fn test_relative_paths_resolved_against_config_dir() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(
            temp_dir.path(),
            "[subject]\npath = \"bin/opal\"\n[output]\ndir = \"results\"\n",
        );

        let config = ConfigLoader::new()
            .without_env()
            .load_from_directory(temp_dir.path())
            .unwrap();

        assert_eq!(
            config.file.subject_path(),
            Some(temp_dir.path().join("bin/opal").as_path())
        );
        assert_eq!(
            config.file.output_dir(),
            Some(temp_dir.path().join("results").as_path())
        );
    }

    #[test]
    fn test_explicit_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = ConfigLoader::new()
            .without_env()
            .load_from_file(&temp_dir.path().join("missing.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(
            temp_dir.path(),
            "[subject]\ntimeout_secs = 5\n[campaign]\nseed = 1\n",
        );

        env::set_var("LEXFUZZ_TIMEOUT", "0.25");
        env::set_var("LEXFUZZ_SEED", "99");
        env::set_var("LEXFUZZ_ENCODING", "utf8");

        let result = ConfigLoader::new().load_from_directory(temp_dir.path());

        env::remove_var("LEXFUZZ_TIMEOUT");
        env::remove_var("LEXFUZZ_SEED");
        env::remove_var("LEXFUZZ_ENCODING");

        let config = result.unwrap();
        assert_eq!(config.file.timeout_secs(), Some(0.25));
        assert_eq!(config.file.seed(), Some(99));
        assert_eq!(config.file.encoding(), Some("utf8"));
    }

    #[test]
    #[serial]
    fn test_unparseable_env_override() {
        let temp_dir = TempDir::new().unwrap();
        env::set_var("LEXFUZZ_SEED", "not-a-number");

        let result = ConfigLoader::new().load_from_directory(temp_dir.path());

        env::remove_var("LEXFUZZ_SEED");

        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { field, .. }) if field == "LEXFUZZ_SEED"
        ));
    }

    #[test]
    #[serial]
    fn test_env_encoding_validated() {
        let temp_dir = TempDir::new().unwrap();
        env::set_var("LEXFUZZ_ENCODING", "ebcdic");

        let result = ConfigLoader::new().load_from_directory(temp_dir.path());

        env::remove_var("LEXFUZZ_ENCODING");

        assert!(result.is_err());
    }
}
