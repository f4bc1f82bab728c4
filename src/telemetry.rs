//! Structured-logging bootstrap.

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Install the JSON tracing subscriber the services use.
///
/// Call once at startup, before the first dispatch.
pub fn init_tracing() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .json()
        .init();
}
