use tracing_subscriber::{
    fmt, fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Filter for this workspace's crates at `log_level`, unless `RUST_LOG` is set
pub fn get_log_env(log_level: String) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "shared_results_api={log_level},shared_results_graphql={log_level}"
        ))
    })
}

pub fn init_global_logger(log_level: String) {
    if let Err(err) = tracing_subscriber::registry()
        .with(get_log_env(log_level))
        .with(fmt::layer().pretty().with_span_events(FmtSpan::NONE))
        .try_init()
    {
        eprintln!(
            "Failed to initialize global logger. This is expected if the logger was already initialized: {}",
            err
        );
    }
}

pub fn global_info_logger() {
    init_global_logger("INFO".to_string())
}

pub fn global_debug_logger() {
    init_global_logger("DEBUG".to_string())
}
