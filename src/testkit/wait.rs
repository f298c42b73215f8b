//! Polling helpers for concurrency tests.

use std::time::Duration;

/// Poll `condition` every millisecond until it holds.
///
/// # Panics
///
/// When the condition does not hold within five seconds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let reached = tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await;
    assert!(reached.is_ok(), "condition not reached within 5s");
}
