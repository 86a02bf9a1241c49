//! Scan command implementation.

use crate::cli::parse_duration;
use crate::config::AppSettings;
use crate::error::CliResult;
use crate::output::{self, TerminalReporter};
use crate::scanner::{ScanConfig, ScanJob, ScanSummary, SshProber};
use crate::types::{AddressRange, Credentials, Port};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Tokio's default cap on blocking threads.
const DEFAULT_BLOCKING_THREADS: usize = 512;

/// Options describing one scan.
#[derive(Args, Debug, Clone)]
pub struct ScanCommand {
    /// Target range: CIDR (192.168.1.0/24), a single IP, or a bare
    /// number N meaning 192.168.N.0/24
    #[arg(value_name = "TARGET")]
    pub target: String,

    /// Username (legacy positional form; -u takes precedence)
    #[arg(value_name = "USER", requires = "positional_password")]
    pub positional_user: Option<String>,

    /// Password (legacy positional form; -p takes precedence)
    #[arg(value_name = "PASSWORD")]
    pub positional_password: Option<String>,

    /// SSH username [default: test]
    #[arg(short = 'u', long = "user")]
    pub user: Option<String>,

    /// SSH password [default: 123456]
    #[arg(short = 'p', long = "password")]
    pub password: Option<String>,

    /// Number of concurrent workers [default: 100]
    #[arg(short = 'w', long = "workers")]
    pub workers: Option<usize>,

    /// Per-host timeout, e.g. 3s, 500ms [default: 3s]
    #[arg(short = 't', long = "timeout", value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// SSH port [default: 22]
    #[arg(short = 'P', long = "port")]
    pub port: Option<Port>,

    /// Write successful IPs to this file, one per line
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Maximum connection attempts per second (0 = unlimited)
    #[arg(short = 'r', long = "rate")]
    pub rate: Option<u32>,
}

/// Everything a scan needs, after merging flags, positionals and settings.
#[derive(Debug, Clone)]
pub struct ResolvedScan {
    pub range: AddressRange,
    pub credentials: Credentials,
    pub config: ScanConfig,
}

impl ScanCommand {
    /// Merge command-line values over settings and validate the result.
    ///
    /// Precedence: flags, then legacy positionals, then settings.
    pub fn resolve(&self, settings: &AppSettings) -> CliResult<ResolvedScan> {
        let range = AddressRange::parse(&self.target)?;

        let user = self
            .user
            .clone()
            .or_else(|| self.positional_user.clone())
            .unwrap_or_else(|| settings.user.clone());
        let password = self
            .password
            .clone()
            .or_else(|| self.positional_password.clone())
            .unwrap_or_else(|| settings.password.clone());

        let mut config = ScanConfig::new(self.port.unwrap_or(settings.port))
            .with_concurrency(self.workers.unwrap_or(settings.workers))
            .with_timeout(self.timeout.unwrap_or_else(|| settings.timeout()))
            .with_rate_limit(self.rate.unwrap_or(settings.rate_limit));
        if let Some(path) = &self.output {
            config = config.with_output(path);
        }
        config.validate()?;

        Ok(ResolvedScan {
            range,
            credentials: Credentials::new(user, password),
            config,
        })
    }

    /// Blocking threads the runtime needs so that every worker can hold an
    /// SSH attempt at once.
    pub fn blocking_threads(&self, settings: &AppSettings) -> usize {
        self.workers
            .unwrap_or(settings.workers)
            .max(DEFAULT_BLOCKING_THREADS)
    }

    /// Run the scan, rendering progress to the terminal.
    pub async fn execute(&self, settings: &AppSettings, quiet: bool) -> CliResult<ScanSummary> {
        let ResolvedScan {
            range,
            credentials,
            config,
        } = self.resolve(settings)?;
        let total = range.host_count();

        output::print_scan_header(&self.target, total, config.concurrency, config.port);
        tracing::debug!(range = %range, user = credentials.username(), "resolved scan");

        let prober = Arc::new(SshProber::new(credentials, config.timeout));
        let reporter = Arc::new(TerminalReporter::new(total, !quiet));

        let cancel = CancellationToken::new();
        let on_signal = cancel.clone();
        let signal_task = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                output::print_warning("Interrupted; waiting for in-flight attempts to finish...");
                on_signal.cancel();
            }
        });

        let result = ScanJob::new(config, prober)
            .with_reporter(reporter)
            .with_cancellation(cancel)
            .run(&range)
            .await;
        signal_task.abort();

        let summary = result?;
        output::print_summary(&summary)?;
        Ok(summary)
    }
}
