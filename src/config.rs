use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::mirror::path::DEFAULT_MAX_PATH_LEN;

/// Records the read buffer holds when the config does not say.
pub const DEFAULT_BUFFER_EVENTS: usize = 256;

/// Default destination for `-VV` logging.
pub const DEFAULT_LOG_FILE: &str = "duplicator.log";

/// Configuration loaded from the TOML file named by `--config`.
#[derive(Debug, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct DuplicatorConfig {
    /// Path-length limit for built paths, counting the terminating NUL.
    pub max_path_len: Option<usize>,
    /// How many maximal notification records one read may return.
    pub buffer_events: Option<usize>,
    /// Where verbose logs are appended.
    pub log_file: Option<PathBuf>,
}

impl DuplicatorConfig {
    /// Load configuration from `path`, or the defaults when none is given.
    ///
    /// Unlike an absent `--config`, a named file that cannot be read or
    /// parsed is an error.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str::<Self>(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn max_path_len(&self) -> usize {
        self.max_path_len.unwrap_or(DEFAULT_MAX_PATH_LEN)
    }

    pub fn buffer_events(&self) -> usize {
        self.buffer_events.unwrap_or(DEFAULT_BUFFER_EVENTS)
    }

    /// The CLI flag wins over the config file.
    pub fn log_file(&self, cli: Option<&Path>) -> PathBuf {
        cli.map(Path::to_path_buf)
            .or_else(|| self.log_file.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_path_gives_defaults() {
        let config = DuplicatorConfig::load(None).unwrap();
        assert_eq!(config.max_path_len(), DEFAULT_MAX_PATH_LEN);
        assert_eq!(config.buffer_events(), DEFAULT_BUFFER_EVENTS);
        assert_eq!(config.log_file(None), PathBuf::from(DEFAULT_LOG_FILE));
    }

    #[test]
    fn test_load_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("duplicator.toml");
        std::fs::write(
            &path,
            "max_path_len = 128\nbuffer_events = 4\nlog_file = \"/var/log/dup.log\"\n",
        )
        .unwrap();

        let config = DuplicatorConfig::load(Some(&path)).unwrap();
        assert_eq!(config.max_path_len(), 128);
        assert_eq!(config.buffer_events(), 4);
        assert_eq!(config.log_file(None), PathBuf::from("/var/log/dup.log"));
        assert_eq!(
            config.log_file(Some(Path::new("cli.log"))),
            PathBuf::from("cli.log")
        );
    }

    #[test]
    fn test_missing_or_bad_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(DuplicatorConfig::load(Some(&dir.path().join("nope.toml"))).is_err());

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "max_path_len = \"lots\"").unwrap();
        assert!(DuplicatorConfig::load(Some(&bad)).is_err());

        let unknown = dir.path().join("unknown.toml");
        std::fs::write(&unknown, "colour = true").unwrap();
        assert!(DuplicatorConfig::load(Some(&unknown)).is_err());
    }
}
