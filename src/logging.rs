use time::UtcOffset;
use tracing_subscriber::{
    fmt::time::OffsetTime, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

use crate::config::LoggingConfig;

/// Initializes the global tracing subscriber from `config`. Never called by
/// library code itself; only the demo binary installs a subscriber.
pub fn setup_logging(config: &LoggingConfig) -> Result<(), String> {
    let timer = OffsetTime::new(
        UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC),
        time::format_description::well_known::Rfc3339,
    );

    let base_level = config.get_level_filter();
    let mut env_filter = EnvFilter::default().add_directive(base_level.into());

    if config.trace_frames {
        env_filter = env_filter
            .add_directive("modbus_client::codec=trace".parse().unwrap())
            .add_directive("modbus_client::transport=trace".parse().unwrap());
    }

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(config.thread_ids)
        .with_thread_names(config.thread_names)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_timer(timer);

    if config.format == "json" {
        let layer = fmt_layer.json().with_filter(env_filter);
        Registry::default()
            .with(layer)
            .try_init()
            .map_err(|err| format!("failed to initialize logging: {err}"))
    } else {
        let layer = fmt_layer.with_filter(env_filter);
        Registry::default()
            .with(layer)
            .try_init()
            .map_err(|err| format!("failed to initialize logging: {err}"))
    }
}
