use tracing_subscriber::{fmt, EnvFilter};

/// Initialize logging with a default filter.
///
/// Use `RUST_LOG` environment variable to override the default filter.
/// Default is `info`, with `debug` for the facade and the resolver.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,kestrel=debug,kestrel_resolve=debug,kestrel_ir=info")
    });

    fmt().with_env_filter(filter).with_target(false).init();
}
