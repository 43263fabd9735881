// Shutdown module
// Drains open connections once the listener has been closed

use hyper_util::server::graceful::GracefulShutdown;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::logger;

/// Ask every watched connection to finish and wait up to `grace` for them.
///
/// Returns how many connections were still open when waiting stopped.
pub async fn drain_connections(
    graceful: GracefulShutdown,
    active_connections: &AtomicUsize,
    grace: Duration,
) -> usize {
    logger::log_shutdown_started(active_connections.load(Ordering::SeqCst));

    let remaining = match tokio::time::timeout(grace, graceful.shutdown()).await {
        Ok(()) => 0,
        Err(_) => active_connections.load(Ordering::SeqCst),
    };

    logger::log_shutdown_finished(remaining);
    remaining
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_drain_without_connections_is_immediate() {
        let active = AtomicUsize::new(0);
        let remaining =
            drain_connections(GracefulShutdown::new(), &active, Duration::from_secs(5)).await;
        assert_eq!(remaining, 0);
    }
}
