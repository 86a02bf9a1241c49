//! Plain text output formatting.
//!
//! Produces human-readable output with colors and formatting.

use crate::scanner::ScanSummary;
use crate::types::Port;
use console::style;
use std::io::{self, Write};
use std::time::Duration;

const RULE: &str = "────────────────────────────────────────";

/// Print the banner shown before scanning begins.
pub fn print_scan_header(target: &str, total: u128, concurrency: usize, port: Port) {
    println!(
        "{} {} v{}",
        style("Starting").cyan(),
        style("sshsweep").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!(
        "{}",
        style(format!(
            "Scanning {} ({} IPs) with {} workers on port {}...",
            target, total, concurrency, port
        ))
        .cyan()
    );
}

/// Print the final summary block.
pub fn print_summary(summary: &ScanSummary) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_summary(&mut out, summary)
}

fn write_summary<W: Write>(out: &mut W, summary: &ScanSummary) -> io::Result<()> {
    writeln!(out, "{}", style(RULE).dim())?;
    if summary.cancelled {
        writeln!(
            out,
            "{} after {} of {} addresses",
            style("Scan cancelled").yellow().bold(),
            summary.attempted,
            summary.total
        )?;
    }
    writeln!(
        out,
        "Scan Complete in {}",
        style(format_duration(summary.elapsed)).cyan()
    )?;
    writeln!(
        out,
        "Rate: {}",
        style(format!("{:.2} IPs/s", summary.rate)).cyan()
    )?;
    writeln!(
        out,
        "Results: {}, {}",
        style(format!("{} Success", summary.succeeded)).green(),
        style(format!("{} Failed", summary.failed)).red()
    )?;

    let f = &summary.failures;
    if summary.failed > 0 {
        writeln!(
            out,
            "         {}",
            style(format!(
                "{} auth rejected, {} unreachable, {} timed out, {} other",
                f.auth_rejected, f.unreachable, f.timeout, f.other
            ))
            .dim()
        )?;
    }

    if let Some(path) = &summary.output {
        writeln!(out, "Saved to: {}", path.display())?;
    }

    Ok(())
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}

/// Millisecond precision under a second, seconds with three decimals above.
fn format_duration(d: Duration) -> String {
    if d < Duration::from_secs(1) {
        format!("{}ms", d.as_millis())
    } else {
        format!("{:.3}s", d.as_secs_f64())
    }
}
