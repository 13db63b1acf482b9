//! # dnsstress
//!
//! DNS load generator: floods one resolver with A queries over UDP, TCP or
//! DNS-over-HTTPS and reports throughput and outcome metrics.

mod bootstrap;
mod report;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use dnsstress_application::LifecycleController;
use dnsstress_domain::config::dispatch::{default_concurrency, DEFAULT_QUERY_TIMEOUT_MS, DEFAULT_SEND_CAP};
use dnsstress_domain::LoggingConfig;
use dnsstress_infrastructure::dns::TransportBuilder;
use std::ffi::OsString;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::error;

#[derive(Parser, Debug)]
#[command(name = "dnsstress")]
#[command(version)]
#[command(about = "Generate DNS query load against a resolver")]
pub struct Cli {
    /// Target domain names, queried in round-robin order
    #[arg(required = true, value_name = "DOMAIN")]
    pub domains: Vec<String>,

    /// Number of concurrent senders (also accepted as -concurrency)
    #[arg(long, default_value_t = default_concurrency())]
    pub concurrency: usize,

    /// Maximum number of queries to send
    #[arg(short = 'm', long = "max", default_value_t = DEFAULT_SEND_CAP)]
    pub max: u64,

    /// Run until interrupted, ignoring -m (also accepted as -inf)
    #[arg(long)]
    pub inf: bool,

    /// Target rate in queries per second, 0 = as fast as possible
    #[arg(short = 't', long = "target-rate", default_value_t = 0)]
    pub target_rate: u32,

    /// Protocol: dns or doh
    #[arg(short = 'd', long = "protocol", default_value = "dns")]
    pub protocol: String,

    /// Resolver address (host:port), or the DoH URL with -d doh
    #[arg(short = 'r', long = "resolver", default_value = "127.0.0.1:53")]
    pub resolver: String,

    /// Transport for -d dns: udp or tcp
    #[arg(short = 'p', long = "sub-protocol", default_value = "udp")]
    pub sub_protocol: String,

    /// Per-query timeout in milliseconds
    #[arg(long, default_value_t = DEFAULT_QUERY_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Statsd collector address, empty to disable
    #[arg(long, default_value = "127.0.0.1:8125")]
    pub statsd: String,

    /// Prefix for statsd metric names
    #[arg(long, default_value = "dnsstress")]
    pub metrics_prefix: String,

    /// Log level (RUST_LOG takes precedence)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,

    /// Seconds between progress lines, 0 disables
    #[arg(long, default_value_t = 1)]
    pub report_interval_secs: u64,
}

/// Long flags that older invocations spell with a single dash.
const SINGLE_DASH_LONG_FLAGS: &[&str] = &["concurrency", "inf"];

/// Rewrites `-concurrency`, `-concurrency=N` and `-inf` to their `--` form.
/// Arguments after a bare `--` are left alone.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator,
    I::Item: Into<OsString>,
{
    let mut positional_only = false;
    args.into_iter()
        .map(Into::into)
        .map(|arg: OsString| {
            if positional_only {
                return arg;
            }
            let Some(text) = arg.to_str() else {
                return arg;
            };
            if text == "--" {
                positional_only = true;
                return arg;
            }
            let Some(rest) = text.strip_prefix('-').filter(|r| !r.starts_with('-')) else {
                return arg;
            };
            let name = rest.split_once('=').map_or(rest, |(name, _)| name);
            if SINGLE_DASH_LONG_FLAGS.contains(&name) {
                OsString::from(format!("-{}", text))
            } else {
                arg
            }
        })
        .collect()
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse_from(normalize_args(std::env::args_os())) {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    bootstrap::init_logging(&LoggingConfig {
        level: cli.log_level.clone(),
        json: cli.log_json,
    });

    let config = match bootstrap::build_dispatch_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            let _ = Cli::command().error(ErrorKind::InvalidValue, e).print();
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(&cli, config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, config: dnsstress_domain::DispatchConfig) -> anyhow::Result<()> {
    report::print_banner(&config);

    let sink = bootstrap::init_metrics(cli)?;
    let factory = TransportBuilder::from_config(&config).await?;
    let controller = Arc::new(LifecycleController::new(config, Arc::new(factory), sink));

    controller.start().await?;

    let done = CancellationToken::new();
    let signals = tokio::spawn(bootstrap::stop_on_signal(
        Arc::clone(&controller),
        done.clone(),
    ));
    let reporter = (cli.report_interval_secs > 0).then(|| {
        tokio::spawn(report::report_progress(
            Arc::clone(controller.run_state()),
            Duration::from_secs(cli.report_interval_secs),
            done.clone(),
        ))
    });

    controller.wait().await;
    done.cancel();

    let _ = signals.await;
    if let Some(reporter) = reporter {
        let _ = reporter.await;
    }

    report::log_summary(&controller.snapshot());
    Ok(())
}
