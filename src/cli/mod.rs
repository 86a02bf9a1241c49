//! Command-line interface definitions.
//!
//! Two input shapes are accepted:
//! - `sshsweep [OPTIONS] <TARGET>`
//! - `sshsweep [OPTIONS] <TARGET> <USER> <PASSWORD>` (legacy form)

mod scan;

pub use scan::{ResolvedScan, ScanCommand};

use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::time::Duration;

const EXAMPLES: &str = "\
Examples:
  sshsweep 192.168.1.0/24
  sshsweep -u admin -p password -w 200 192.168.1.0/24
  sshsweep 3 root 123456   (same as: -u root -p 123456 192.168.3.0/24)";

/// sshsweep - try one SSH login across an address range.
#[derive(Parser, Debug)]
#[command(name = "sshsweep")]
#[command(author = "HueCodes <huecodes@proton.me>")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Sweep an address range for hosts accepting an SSH login", long_about = None)]
#[command(after_help = EXAMPLES)]
pub struct Cli {
    #[command(flatten)]
    pub scan: ScanCommand,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Hide the live progress line
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to a settings file (defaults to the XDG config location)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Log filter implied by `-v` when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

/// Parse durations such as `3s`, `500ms`, `1m30s`, or a bare number of seconds.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err("empty duration".to_string());
    }

    if let Ok(secs) = s.parse::<f64>() {
        return seconds(secs, input);
    }

    let mut total = Duration::ZERO;
    let mut rest = s;
    while !rest.is_empty() {
        let split = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| format!("missing unit in duration '{}'", input))?;
        let (number, tail) = rest.split_at(split);
        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);

        let value: f64 = number
            .parse()
            .map_err(|_| format!("invalid duration '{}'", input))?;
        let scale = match unit {
            "ms" => 0.001,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            _ => return Err(format!("unknown unit '{}' in duration '{}'", unit, input)),
        };
        total += seconds(value * scale, input)?;
        rest = tail;
    }

    Ok(total)
}

fn seconds(secs: f64, input: &str) -> Result<Duration, String> {
    Duration::try_from_secs_f64(secs).map_err(|_| format!("invalid duration '{}'", input))
}
