//! Bounded reconnect scheduling for a [`BrokerSession`](crate::session::BrokerSession).
//!
//! A single fixed delay rather than an exponential backoff ladder: this
//! pipeline's reconnect contract is a bounded constant delay, not a
//! multi-exchange backoff curve.

use crate::config::RECONNECT_DELAY;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::Instant;

/// Re-entrancy guard preventing overlapping reconnect attempts for one
/// session.
#[derive(Debug, Clone, Default)]
pub struct ReconnectGuard(Arc<AtomicBool>);

impl ReconnectGuard {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Attempt to enter the reconnecting state. Returns `false` if a
    /// reconnect is already in flight.
    pub fn try_enter(&self) -> bool {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn exit(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Sleep for the bounded reconnect delay, but return early (without
/// sleeping the full duration) if `cancel` fires first — `disconnect()`
/// always wins over a pending reconnect.
pub async fn sleep_reconnect_delay(cancel: &tokio_util::sync::CancellationToken) {
    let deadline = Instant::now() + RECONNECT_DELAY;
    tokio::select! {
        _ = tokio::time::sleep_until(deadline) => {}
        _ = cancel.cancelled() => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_prevents_reentrant_reconnects() {
        let guard = ReconnectGuard::new();
        assert!(guard.try_enter());
        assert!(!guard.try_enter());
        guard.exit();
        assert!(guard.try_enter());
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_cancel_short_circuits_reconnect_sleep() {
        let cancel = tokio_util::sync::CancellationToken::new();
        cancel.cancel();

        let start = Instant::now();
        sleep_reconnect_delay(&cancel).await;
        assert!(start.elapsed() < RECONNECT_DELAY);
    }
}
