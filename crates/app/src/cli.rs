//! Command line arguments

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "vibechat", version, about = "Headless Vibechat timeline client")]
pub struct Args {
    /// Config file (defaults to the platform config directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Chat to open
    #[arg(long, default_value = "lobby")]
    pub chat: String,

    /// Older pages to fetch after the first page
    #[arg(long, default_value_t = 0)]
    pub older: u32,

    /// Serve seeded demo data on a loopback port instead of the configured gateway
    #[arg(long)]
    pub demo: bool,
}
