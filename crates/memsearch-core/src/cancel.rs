use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    condvar: Condvar,
    mutex: Mutex<()>,
}

/// A cooperative cancellation flag shared between a scan and its
/// cancellation sources (Ctrl+C handler, timeout timer).
///
/// Clones observe the same flag. Once set it stays set; the scan loop
/// checks it at region boundaries and before every match delivery.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    /// Create a new token in the non-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation, waking all threads blocked in [`CancelToken::wait`].
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        // Waiters test the flag under the mutex; taking it here closes the
        // window between their check and their wait.
        drop(self.inner.mutex.lock());
        self.inner.condvar.notify_all();
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Wait for the specified duration or until cancellation is requested.
    ///
    /// Returns `true` if the token was cancelled, `false` if the wait timed out.
    pub fn wait(&self, duration: Duration) -> bool {
        if self.is_cancelled() {
            return true;
        }

        let Ok(guard) = self.inner.mutex.lock() else {
            // Poisoned mutex, treat as cancelled
            return true;
        };
        let result = self
            .inner
            .condvar
            .wait_timeout_while(guard, duration, |_| !self.is_cancelled());

        match result {
            Ok((_, timeout_result)) => !timeout_result.timed_out(),
            Err(_) => true,
        }
    }
}
