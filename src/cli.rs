use std::path::PathBuf;

use clap::Parser;

/// Mirror a directory into another as symlinks, live.
///
/// duplicator watches the listen directory and, for every entry created,
/// deleted or renamed there, creates, removes or renames a symlink of the
/// same name in the target directory.
#[derive(Parser, Debug)]
#[command(
    name = "duplicator",
    version,
    about,
    long_about = None,
    disable_version_flag = true,
    arg(
        clap::Arg::new("version")
            .short('v')
            .long("version")
            .action(clap::ArgAction::Version)
            .help("Print version and exit")
    ),
)]
pub struct Cli {
    /// Path to watch over for events.
    #[arg(short, long, value_name = "PATH")]
    pub listen: PathBuf,

    /// Path to symlink to.
    #[arg(short, long, value_name = "PATH")]
    pub target: PathBuf,

    /// Enable verbose output. Repeat to also log to a file.
    #[arg(short = 'V', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log file used at the highest verbosity.
    #[arg(short = 'L', long, value_name = "FILE")]
    pub logfile: Option<PathBuf>,

    /// TOML configuration file.
    #[arg(short, long, value_name = "FILE", env = "DUPLICATOR_CONFIG")]
    pub config: Option<PathBuf>,
}
