//! Structured logging setup.

use tracing_subscriber::{
    EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Default filter directive when `VOLLEY_LOG` is unset.
const DEFAULT_DIRECTIVE: &str = if cfg!(debug_assertions) {
    "volley=debug"
} else {
    "volley=info"
};

/// Initializes the global tracing subscriber.
///
/// The filter is taken from the `VOLLEY_LOG` environment variable when
/// present (standard env-filter syntax), falling back to a
/// service-scoped default. Invalid directives fall back too, with a
/// note on stderr.
pub fn init() {
    let filter = std::env::var("VOLLEY_LOG").map_or_else(
        |_| EnvFilter::new(DEFAULT_DIRECTIVE),
        |directives| {
            EnvFilter::try_new(&directives).unwrap_or_else(|_| {
                eprintln!(
                    "Invalid VOLLEY_LOG directives {directives:?}, defaulting to {DEFAULT_DIRECTIVE}"
                );
                EnvFilter::new(DEFAULT_DIRECTIVE)
            })
        },
    );

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(false)
                .with_line_number(false)
                .compact()
                .with_ansi(true)
                .with_timer(tracing_subscriber::fmt::time::ChronoUtc::rfc_3339())
                .with_filter(filter),
        )
        .init();
}
