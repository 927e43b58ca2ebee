mod cli;
mod config;
mod error;
mod mirror;
mod trc;
mod watcher;

use anyhow::Result;
use clap::Parser;

use cli::Cli;
use config::DuplicatorConfig;
use mirror::MirrorEngine;
use mirror::path::WatchTarget;
use trc::Trc;
use watcher::Inotify;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = DuplicatorConfig::load(cli.config.as_deref())?;
    Trc::new(cli.verbose, &config.log_file(cli.logfile.as_deref()))?.init()?;

    let target = WatchTarget::new(&cli.listen, &cli.target, config.max_path_len())?;
    let mut inotify = Inotify::watch(target.source())?;
    let mut engine = MirrorEngine::new(target);
    tracing::info!(
        "watching {} into {}",
        engine.target().source().display(),
        engine.target().target().display()
    );

    engine.run(&mut inotify, watcher::buffer_len(config.buffer_events()))?;

    Ok(())
}
