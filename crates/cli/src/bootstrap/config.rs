use crate::Cli;
use dnsstress_domain::{ConfigError, DispatchConfig, SendCap, TransportKind};
use tracing::info;

pub fn build_dispatch_config(cli: &Cli) -> Result<DispatchConfig, ConfigError> {
    let transport = TransportKind::from_protocols(&cli.protocol, &cli.sub_protocol)?;

    let config = DispatchConfig::new(transport, &cli.resolver, &cli.domains)?
        .with_concurrency(cli.concurrency)
        .with_send_cap(SendCap::from_options(cli.max, cli.inf))
        .with_target_rate(cli.target_rate)
        .with_query_timeout_ms(cli.timeout_ms);
    config.validate()?;

    info!(
        transport = %config.transport,
        endpoint = %config.endpoint,
        concurrency = config.concurrency,
        send_cap = %config.send_cap,
        target_rate = config.target_rate,
        timeout_ms = config.query_timeout_ms,
        "Configuration loaded"
    );

    Ok(config)
}
