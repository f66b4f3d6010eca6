//! Wait Mechanisms
//!
//! Async polling used by setup waits and completion polling.

use std::future::Future;
use std::time::Duration;

use crate::result::{GestureError, GestureResult};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for wait operations (30 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 30_000;

/// Default polling interval (100ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// =============================================================================
// POLLING
// =============================================================================

/// Poll `check` until it yields `Some`, sleeping `poll_interval` between
/// attempts.
///
/// `check` always runs at least once, so a zero timeout still succeeds when
/// the condition already holds.
///
/// # Errors
///
/// Returns `Timeout` when the timeout elapses first, or the first error
/// `check` returns
pub async fn poll_until<T, F, Fut>(options: WaitOptions, mut check: F) -> GestureResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = GestureResult<Option<T>>>,
{
    let deadline = tokio::time::Instant::now() + options.timeout();
    let interval = options.poll_interval().max(Duration::from_millis(1));
    loop {
        if let Some(value) = check().await? {
            return Ok(value);
        }
        let now = tokio::time::Instant::now();
        if now >= deadline {
            return Err(GestureError::Timeout {
                ms: options.timeout_ms,
            });
        }
        tokio::time::sleep(interval.min(deadline - now)).await;
    }
}

/// Sleep for a fixed number of milliseconds
pub async fn wait_timeout(duration_ms: u64) {
    tokio::time::sleep(Duration::from_millis(duration_ms)).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    mod options_tests {
        use super::*;

        #[test]
        fn test_defaults_and_builders() {
            let options = WaitOptions::new().with_timeout(500).with_poll_interval(25);
            assert_eq!(options.timeout(), Duration::from_millis(500));
            assert_eq!(options.poll_interval(), Duration::from_millis(25));
            assert_eq!(WaitOptions::default().timeout_ms, DEFAULT_WAIT_TIMEOUT_MS);
        }
    }

    mod poll_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_succeeds_after_retries() {
            let attempts = Arc::new(AtomicU32::new(0));
            let counter = Arc::clone(&attempts);
            let value = poll_until(WaitOptions::new().with_poll_interval(10), move || {
                let counter = Arc::clone(&counter);
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    Ok((n >= 3).then_some(n))
                }
            })
            .await
            .unwrap();
            assert_eq!(value, 3);
            assert_eq!(attempts.load(Ordering::SeqCst), 3);
        }

        #[tokio::test(start_paused = true)]
        async fn test_times_out() {
            let started = tokio::time::Instant::now();
            let err = poll_until(
                WaitOptions::new().with_timeout(250).with_poll_interval(100),
                || async { Ok(None::<()>) },
            )
            .await
            .unwrap_err();
            assert!(matches!(err, GestureError::Timeout { ms: 250 }));
            assert!(started.elapsed() >= Duration::from_millis(250));
        }

        #[tokio::test]
        async fn test_zero_timeout_checks_once() {
            let value = poll_until(WaitOptions::new().with_timeout(0), || async { Ok(Some(7)) })
                .await
                .unwrap();
            assert_eq!(value, 7);
        }

        #[tokio::test]
        async fn test_check_error_propagates() {
            let err = poll_until(WaitOptions::new(), || async {
                Err::<Option<()>, _>(GestureError::dom("gone"))
            })
            .await
            .unwrap_err();
            assert!(matches!(err, GestureError::Dom { .. }));
        }
    }
}
