//! Log output for tests
//!
//! Installs a `tracing` subscriber that writes through the test harness's
//! captured output. Only the first call installs anything.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::once::RunOnce;

static LOGGING: RunOnce = RunOnce::new();

/// Installs the test subscriber; `RUST_LOG` wins over `default_filter`
pub fn init_test_logging(default_filter: &str) {
    LOGGING.call(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(default_filter))
            .unwrap_or_else(|_| EnvFilter::new("warn"));

        // Another subscriber may already be installed by the test binary.
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .try_init();
    });
}
