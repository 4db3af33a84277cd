//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

/// Keygate - single-use access keys behind a link shortener
#[derive(Parser)]
#[command(name = "keygate")]
#[command(version)]
#[command(about = "Issue and redeem single-use access keys", long_about = None)]
pub struct Cli {
    /// Configuration file (default: config.toml)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Print key counters from the keys file
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove expired unused keys from the keys file
    ///
    /// Run only while the server is stopped; a running server would
    /// overwrite the result on its next write.
    Sweep,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Generate {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
