pub mod builders;
pub mod recording_sink;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use domwatch::logging::LOG_ENV_VAR;
use tracing_subscriber::{fmt, EnvFilter};

pub use builders::ElementBuilder;
pub use recording_sink::RecordingSink;

static INIT: Once = Once::new();

/// How long [`with_timeout`] lets a watcher run before failing the test.
pub const WATCH_DEADLINE: Duration = Duration::from_secs(5);

/// Install a test-captured subscriber once per test binary.
///
/// Reads the same `DOMWATCH_LOG` directive as the library and defaults to
/// `domwatch=debug`, so the watcher's "already present" and "element
/// appeared" events show up next to a failing assertion.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .unwrap_or_else(|_| EnvFilter::new("domwatch=debug"));

        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Await a watcher (or a task wrapping one), failing the test if it is still
/// pending after [`WATCH_DEADLINE`].
///
/// A watcher has no deadline of its own, so an element that never shows up
/// would otherwise hang the test run.
pub async fn with_timeout<F, T>(watch: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(WATCH_DEADLINE, watch).await {
        Ok(out) => out,
        Err(_) => panic!("element did not appear within {WATCH_DEADLINE:?}"),
    }
}
