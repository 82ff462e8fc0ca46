//! Log output for the `relaxed_ik_service` and `collision_viewer` nodes.
//!
//! The dora runtime owns the global subscriber, so each node installs its
//! own for the main thread. Dropping the returned guard ends node logging.

use tracing::subscriber::DefaultGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

/// Compact, one-line-per-event logging for a node's event loop.
///
/// `RUST_LOG` wins when it parses; otherwise `default_directive` applies
/// (both nodes pass `"info"`, so per-request and per-tick `debug!` lines
/// stay quiet unless asked for).
///
/// ```no_run
/// let _guard = relaxed_ik_lib::init_tracing("info");
/// tracing::info!("node up");
/// ```
pub fn init_tracing(default_directive: &str) -> DefaultGuard {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let node_lines = tracing_subscriber::fmt::layer()
        .compact()
        .with_target(false)
        .with_file(false)
        .with_line_number(false);

    tracing::subscriber::set_default(
        tracing_subscriber::Registry::default()
            .with(filter)
            .with(node_lines),
    )
}

