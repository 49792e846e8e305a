//! Command-line surface.

use clap::Parser;

use crate::config::DEFAULT_THRESHOLD;

/// Balance VM load across OpenStack compute nodes.
#[derive(Parser, Debug)]
#[command(name = "fleet-rebalancer", about = "Balance VM load across OpenStack compute nodes")]
pub struct Cli {
    /// Simulate migrations without performing them.
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose (debug) logging.
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Show resources for all nodes and exit without planning.
    #[arg(long)]
    pub show_resources: bool,

    /// Overutilization multiplier for classifying nodes.
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f64,
}
