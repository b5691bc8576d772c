use std::path::PathBuf;

use clap::Parser;

use crate::config::DEFAULT_CONFIG_PATH;

pub const VERSION: &str = "v0.1.0";

#[derive(Debug, Parser)]
#[command(
    name = "manual-exec",
    version = VERSION,
    about = "Manually execute a committed CCIP message on its destination chain",
    long_about = None
)]
pub struct Cli {
    /// Path to the JSON configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}
