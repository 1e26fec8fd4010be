//! Caller-side cancellation signal.
//!
//! Every suspending transport call accepts a [`CancelToken`]. Cancelling a
//! caller resolves its wait with `Cancelled`; it does not abort writes
//! already committed to the stream, and a late reply is delivered to event
//! subscribers instead of being dropped.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tokio::sync::Notify;

/// A clonable cancellation signal.
///
/// Cloned tokens share state: cancelling any clone cancels them all.
/// Cancellation is sticky — once fired, `cancelled()` resolves immediately
/// forever.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    fired: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    /// Create a fresh, un-fired token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the signal. Idempotent.
    pub fn cancel(&self) {
        self.inner.fired.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// True once [`CancelToken::cancel`] has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.fired.load(Ordering::SeqCst)
    }

    /// Resolve when the signal fires. Resolves immediately if it already
    /// has.
    pub async fn cancelled(&self) {
        // Register interest before the flag check so a concurrent cancel
        // between check and await cannot be missed.
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}
