//! Automation Controller
//!
//! Single-flight wrapper around a [`TestRunner`] for external drivers.
//! Each run publishes an [`AutomationReport`] into a shared
//! [`ResultSlot`]; a driver without a callback channel polls the slot with
//! [`wait_for_completion`] until `completed` is set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::task::{Context, Poll};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::result::{GestureError, GestureResult};
use crate::runner::TestRunner;
use crate::summary::ResultSummary;
use crate::wait::{poll_until, WaitOptions};

/// Outcome of one automated run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationReport {
    /// Unique run identifier
    pub run_id: Uuid,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished
    pub finished_at: DateTime<Utc>,
    /// Set once every suite has run
    pub completed: bool,
    /// Aggregated results
    pub summary: ResultSummary,
}

/// Shared location where the latest report is published
#[derive(Debug, Clone, Default)]
pub struct ResultSlot {
    inner: Arc<RwLock<Option<AutomationReport>>>,
}

impl ResultSlot {
    /// Create an empty slot
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest published report
    #[must_use]
    pub fn get(&self) -> Option<AutomationReport> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the published report
    pub fn publish(&self, report: AutomationReport) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(report);
    }

    /// Remove the published report
    pub fn clear(&self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Whether a completed report is present
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.get().is_some_and(|r| r.completed)
    }

    /// Serialize the slot contents (`null` when empty)
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails
    pub fn to_json(&self) -> GestureResult<String> {
        Ok(serde_json::to_string(&self.get())?)
    }
}

/// Poll `slot` until a completed report appears
///
/// # Errors
///
/// Returns `Timeout` if no completed report appears within
/// `options.timeout_ms`
pub async fn wait_for_completion(
    slot: &ResultSlot,
    options: WaitOptions,
) -> GestureResult<AutomationReport> {
    poll_until(options, || {
        let report = slot.get().filter(|r| r.completed);
        async move { Ok(report) }
    })
    .await
}

// Clears the running flag on drop, including when the run panics.
#[derive(Debug)]
struct RunGuard {
    flag: Arc<AtomicBool>,
}

impl RunGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> GestureResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| GestureError::AlreadyRunning)?;
        Ok(Self {
            flag: Arc::clone(flag),
        })
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Background run started by [`AutomationController::spawn`]
#[derive(Debug)]
pub struct RunHandle {
    inner: JoinHandle<AutomationReport>,
}

impl RunHandle {
    /// Abort the run; the running flag is released
    pub fn abort(&self) {
        self.inner.abort();
    }

    /// Whether the run has finished
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }
}

impl Future for RunHandle {
    type Output = GestureResult<AutomationReport>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.inner).poll(cx).map(|joined| {
            joined.map_err(|e| GestureError::InvalidState {
                message: format!("automation run did not finish: {e}"),
            })
        })
    }
}

/// Guards a runner against overlapping runs and publishes reports
#[derive(Debug, Clone)]
pub struct AutomationController {
    runner: Arc<Mutex<TestRunner>>,
    running: Arc<AtomicBool>,
    slot: ResultSlot,
    poll_interval_ms: u64,
}

impl AutomationController {
    /// Take ownership of a configured runner
    #[must_use]
    pub fn new(runner: TestRunner) -> Self {
        let poll_interval_ms = runner.config().poll_interval_ms;
        Self {
            runner: Arc::new(Mutex::new(runner)),
            running: Arc::new(AtomicBool::new(false)),
            slot: ResultSlot::new(),
            poll_interval_ms,
        }
    }

    /// Publish reports into an existing slot
    #[must_use]
    pub fn with_slot(mut self, slot: ResultSlot) -> Self {
        self.slot = slot;
        self
    }

    /// The shared runner, for registering suites between runs
    #[must_use]
    pub fn runner(&self) -> Arc<Mutex<TestRunner>> {
        Arc::clone(&self.runner)
    }

    /// The slot reports are published into
    #[must_use]
    pub fn slot(&self) -> ResultSlot {
        self.slot.clone()
    }

    /// Whether a run is in flight
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run every suite and publish the report
    ///
    /// # Errors
    ///
    /// Returns `AlreadyRunning` if another run is in flight
    pub async fn run(&self) -> GestureResult<AutomationReport> {
        let _guard = RunGuard::acquire(&self.running)?;
        Ok(execute(&self.runner, &self.slot).await)
    }

    /// Start a run on the tokio runtime
    ///
    /// The running flag is taken before this returns, so a second `run`
    /// or `spawn` is rejected immediately.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyRunning` if another run is in flight
    pub fn spawn(&self) -> GestureResult<RunHandle> {
        let guard = RunGuard::acquire(&self.running)?;
        let runner = Arc::clone(&self.runner);
        let slot = self.slot.clone();
        let inner = tokio::spawn(async move {
            let _guard = guard;
            execute(&runner, &slot).await
        });
        Ok(RunHandle { inner })
    }

    /// Poll this controller's slot until a run completes
    ///
    /// # Errors
    ///
    /// Returns `Timeout` if no run completes within `timeout_ms`
    pub async fn wait_for_completion(&self, timeout_ms: u64) -> GestureResult<AutomationReport> {
        let options = WaitOptions::new()
            .with_timeout(timeout_ms)
            .with_poll_interval(self.poll_interval_ms);
        wait_for_completion(&self.slot, options).await
    }
}

async fn execute(runner: &Mutex<TestRunner>, slot: &ResultSlot) -> AutomationReport {
    slot.clear();
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    tracing::info!(%run_id, "automation run started");

    let summary = {
        let mut runner = runner.lock().await;
        runner.run_all().await;
        runner.summary()
    };

    let report = AutomationReport {
        run_id,
        started_at,
        finished_at: Utc::now(),
        completed: true,
        summary,
    };
    tracing::info!(
        %run_id,
        total = report.summary.total,
        passed = report.summary.passed,
        failed = report.summary.failed,
        "automation run finished"
    );
    slot.publish(report.clone());
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::World;
    use crate::harness::{TestCase, TestSuite};
    use crate::mock_dom::MockDom;
    use crate::registry::{assertion, hook};

    fn controller(warmup_ms: u64) -> AutomationController {
        let mut runner = TestRunner::new(World::new(MockDom::new()));
        runner.register_suite(
            TestSuite::new("smoke")
                .with_before_all(hook(move |world| async move {
                    world.sleep_ms(warmup_ms).await;
                    Ok(())
                }))
                .with_test(TestCase::custom("ok").with_assert(assertion(|_| async { Ok(true) })))
                .with_test(TestCase::custom("nope").with_assert(assertion(|_| async { Ok(false) }))),
        );
        AutomationController::new(runner)
    }

    mod run_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_run_publishes_report() {
            let controller = controller(0);
            assert!(controller.slot().get().is_none());

            let report = controller.run().await.unwrap();
            assert!(report.completed);
            assert_eq!(report.summary.total, 2);
            assert_eq!(report.summary.passed, 1);
            assert!(report.finished_at >= report.started_at);
            assert_eq!(controller.slot().get(), Some(report));
            assert!(!controller.is_running());
        }

        #[tokio::test(start_paused = true)]
        async fn test_overlapping_run_rejected() {
            let controller = controller(500);
            let handle = controller.spawn().unwrap();
            assert!(controller.is_running());

            assert!(matches!(
                controller.run().await,
                Err(GestureError::AlreadyRunning)
            ));
            assert!(matches!(controller.spawn(), Err(GestureError::AlreadyRunning)));

            let report = handle.await.unwrap();
            assert!(report.completed);
            assert!(!controller.is_running());
            assert!(controller.run().await.is_ok());
        }

        #[tokio::test(start_paused = true)]
        async fn test_aborted_run_releases_flag() {
            let controller = controller(10_000);
            let handle = controller.spawn().unwrap();
            handle.abort();
            let err = handle.await.unwrap_err();
            assert!(matches!(err, GestureError::InvalidState { .. }));
            assert!(!controller.is_running());
        }
    }

    mod completion_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_wait_for_completion_sees_spawned_run() {
            let controller = controller(300);
            let _handle = controller.spawn().unwrap();
            let report = controller.wait_for_completion(5_000).await.unwrap();
            assert!(report.completed);
            assert!(controller.slot().is_completed());
        }

        #[tokio::test(start_paused = true)]
        async fn test_wait_times_out_on_empty_slot() {
            let slot = ResultSlot::new();
            let err = wait_for_completion(&slot, WaitOptions::new().with_timeout(250))
                .await
                .unwrap_err();
            assert!(matches!(err, GestureError::Timeout { ms: 250 }));
        }

        #[tokio::test]
        async fn test_slot_json() {
            let slot = ResultSlot::new();
            assert_eq!(slot.to_json().unwrap(), "null");
            let controller = controller(0).with_slot(slot.clone());
            controller.run().await.unwrap();
            let json: serde_json::Value = serde_json::from_str(&slot.to_json().unwrap()).unwrap();
            assert_eq!(json["completed"], true);
            assert_eq!(json["summary"]["total"], 2);
            assert!(json["runId"].is_string());
        }
    }
}
