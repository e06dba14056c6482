//! Command-line argument parsing.
//!
//! Usage:
//!   tt [-f <file> | -n] [-c <cmd>] [--buffer-size <n>] [--max-depth <n>] [-v...]

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use directories::{BaseDirs, ProjectDirs};

use crate::config::BridgeConfig;

// ── Public types ──────────────────────────────────────────────────────────────

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "tt", version, about = "TinTin++-style session with embedded Lua")]
pub struct CliArgs {
    /// Config file to load instead of searching the default locations.
    #[arg(short = 'f', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Do not load any config file.
    #[arg(short = 'n', long = "no-config", conflicts_with = "config")]
    pub no_config: bool,

    /// Command line to run after the config file has been loaded.
    #[arg(short = 'c', long = "command", value_name = "CMD")]
    pub command: Option<String>,

    /// Capacity of the Lua staging buffers, in bytes.
    #[arg(long, value_name = "BYTES", value_parser = parse_positive)]
    pub buffer_size: Option<usize>,

    /// Maximum nesting of `#LUA` through `tt.send`.
    #[arg(long, value_name = "N", value_parser = parse_positive)]
    pub max_depth: Option<usize>,

    /// Log verbosity (-v, -vv, -vvv); `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// How to choose the config file.
#[derive(Debug, PartialEq, Eq)]
pub enum ConfigFile {
    /// Search the default locations.
    Search,
    /// `-n`: load nothing.
    Skip,
    /// `-f <file>`: load this specific file.
    Explicit(PathBuf),
}

impl CliArgs {
    pub fn config_file(&self) -> ConfigFile {
        match (&self.config, self.no_config) {
            (_, true) => ConfigFile::Skip,
            (Some(p), false) => ConfigFile::Explicit(p.clone()),
            (None, false) => ConfigFile::Search,
        }
    }

    /// Let command-line values win over the config file.
    pub fn apply_overrides(&self, bridge: &mut BridgeConfig) {
        if let Some(n) = self.buffer_size {
            bridge.buffer_size = n;
        }
        if let Some(n) = self.max_depth {
            bridge.max_script_depth = n;
        }
    }

    /// Default `tracing` filter directive for the `-v` count.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

fn parse_positive(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_owned()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

/// Search for the user config file in the standard locations.
/// Returns the first path that exists, or `None`.
///
/// Order: `~/.ttrc`, `<config dir>/tt/ttrc`, `./.ttrc`.
pub fn find_user_config() -> Option<PathBuf> {
    let home = BaseDirs::new().map(|d| d.home_dir().join(".ttrc"));
    let project = ProjectDirs::from("", "", "tt").map(|d| d.config_dir().join("ttrc"));
    [home, project, Some(PathBuf::from("./.ttrc"))]
        .into_iter()
        .flatten()
        .find(|p| p.exists())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
