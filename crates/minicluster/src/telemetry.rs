use tracing_log::LogTracer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset. The gRPC and HTTP stacks are chatty
/// at info while a topology starts, so they are held at warn.
pub const DEFAULT_FILTER: &str = "info,h2=warn,hyper=warn,hyper_util=warn,tower=warn";

/// Install the process-wide subscriber for the `minicluster` binary.
///
/// Events go to stderr so stdout carries only the endpoint. `log` records from
/// the libraries are bridged into `tracing`. Repeated calls are no-ops.
pub fn init() {
    init_with_filter(DEFAULT_FILTER);
}

pub fn init_with_filter(fallback: &str) {
    let _ = LogTracer::init();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init();
}
