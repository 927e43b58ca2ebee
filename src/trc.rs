//! Tracing configuration and initialization.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Overrides the verbosity-derived filter with a full directive.
pub const LOG_ENV: &str = "DUPLICATOR_LOG";

/// Default filter for a `-V` count. Quiet runs still show errors.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "error",
        1 => "info",
        _ => "debug",
    }
}

pub struct Trc {
    env_filter: EnvFilter,
    log_file: Option<File>,
}

impl Trc {
    /// Build the logging setup for `verbosity`. At two or more, records are
    /// also appended to `log_path`.
    pub fn new(verbosity: u8, log_path: &Path) -> anyhow::Result<Self> {
        let env_filter = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

        let log_file = if verbosity >= 2 {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_path)
                .with_context(|| format!("could not open log file {}", log_path.display()))?;
            Some(file)
        } else {
            None
        };

        Ok(Self {
            env_filter,
            log_file,
        })
    }

    pub fn init(self) -> anyhow::Result<()> {
        let stderr = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact();
        let file = self.log_file.map(|file| {
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .boxed()
        });

        tracing_subscriber::registry()
            .with(self.env_filter)
            .with(stderr)
            .with(file)
            .try_init()
            .context("could not initialize logging")?;

        Ok(())
    }
}
