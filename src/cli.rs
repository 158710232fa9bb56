//! Command-line interface for voxlate
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Speak in one language, hear it in another
#[derive(Parser, Debug)]
#[command(
    name = "voxlate",
    version,
    about = "Speech translation from the microphone or over HTTP"
)]
pub struct Cli {
    /// Subcommand to execute (default: listen)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: info, -vv: debug, -vvv: trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Use offline stub services instead of the network backends
    #[arg(long, global = true)]
    pub offline: bool,

    /// Target language code (default: hi). Examples: hi, fr, de, zh-cn
    #[arg(long, short = 't', global = true, value_name = "LANG")]
    pub target: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Listen on the microphone and speak translations (p: pause, h: history, q: quit)
    Listen {
        /// Audio input device (e.g., hw:0)
        #[arg(long, value_name = "DEVICE")]
        device: Option<String>,

        /// How long to wait for speech to start. Examples: 5, 10s, 1m
        #[arg(long, value_name = "DURATION", value_parser = parse_secs)]
        phrase_timeout: Option<u64>,
    },

    /// Run the HTTP server
    Serve {
        /// Address to bind (default: 127.0.0.1:5000)
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },

    /// Translate a WAV file and print the result as JSON
    Translate {
        /// Mono or stereo 16-bit WAV file
        file: PathBuf,
    },

    /// Show recent translations
    History {
        /// Number of entries to show (default: 5)
        #[arg(long, short = 'n', value_name = "N")]
        count: Option<usize>,
    },

    /// List supported languages
    Languages,

    /// List available audio input devices
    Devices,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Parse a duration string into whole seconds.
///
/// Bare numbers are seconds; anything else goes through `humantime`
/// (`30s`, `2m`, `1m30s`).
fn parse_secs(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(secs);
    }
    humantime::parse_duration(s)
        .map(|d| d.as_secs())
        .map_err(|e| e.to_string())
}
