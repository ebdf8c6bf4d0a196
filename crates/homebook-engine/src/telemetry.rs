use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initializes the global tracing subscriber with sensible defaults.
/// Safe to call more than once; only the first call takes effect.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::from_default_env()
            .add_directive("homebook_engine=info".parse().expect("valid directive"));

        fmt().with_env_filter(filter).init();
    });
}
