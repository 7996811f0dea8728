//! Creates a `tracing_subscriber` registry which prints
//! spans and events to stdout, filtered by the environment.
//!
//! An example environment is shown:
//! ```bash
//! RUST_LOG=ptmapper=debug
//! ```

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialises the tracer, using tracing subscription.
/// This is optional, not calling this function will simply
/// not log traces.
///
/// Repeated calls are ignored, the first registered subscriber wins.
pub fn initialize_tracer() {
    let fmt_layer = tracing_subscriber::fmt::layer();

    // Initialise tracing with subscribers and environment filter
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(fmt_layer)
        .try_init();
}
