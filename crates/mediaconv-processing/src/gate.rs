//! Admission control for conversions.
//!
//! At most `max_concurrent` conversions run at once and at most `max_queue`
//! more wait for a slot; anything beyond that is turned away with
//! [`ConvertError::Busy`]. Running work is bounded by a timeout.
//!
//! A timed-out conversion gives up waiting, but blocking work it started
//! keeps the slot until that work returns.

use mediaconv_core::{Config, ConvertError};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

tokio::task_local! {
    static RUNNING_PERMIT: Arc<OwnedSemaphorePermit>;
}

/// Permit of the gated conversion running on this task, if any.
pub(crate) fn current_permit() -> Option<Arc<OwnedSemaphorePermit>> {
    RUNNING_PERMIT.try_with(Arc::clone).ok()
}

pub struct ConversionGate {
    permits: Arc<Semaphore>,
    max_concurrent: usize,
    max_queue: usize,
    waiting: Arc<AtomicUsize>,
    timeout: Duration,
}

/// Holds a place in the wait queue until dropped.
struct QueueSlot(Arc<AtomicUsize>);

impl Drop for QueueSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ConversionGate {
    pub fn new(max_concurrent: usize, max_queue: usize, timeout: Duration) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            max_queue,
            waiting: Arc::new(AtomicUsize::new(0)),
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.max_concurrent_processes,
            config.max_queue_size,
            config.process_timeout,
        )
    }

    /// Conversions currently holding a slot
    pub fn in_flight(&self) -> usize {
        self.max_concurrent
            .saturating_sub(self.permits.available_permits())
    }

    /// Conversions waiting for a slot
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }

    /// Run `work` once a slot is free.
    ///
    /// Dropping `work` on timeout also kills any child process it spawned
    /// with `kill_on_drop`. Work handed to [`blocking`](crate::traits::blocking)
    /// cannot be stopped and holds the slot until it finishes.
    pub async fn run<F, T>(&self, work: F) -> Result<T, ConvertError>
    where
        F: Future<Output = Result<T, ConvertError>>,
    {
        let permit = match self.permits.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(TryAcquireError::NoPermits) => {
                let max_queue = self.max_queue;
                let reserved = self
                    .waiting
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                        (n < max_queue).then_some(n + 1)
                    });
                if reserved.is_err() {
                    tracing::warn!(
                        in_flight = self.in_flight(),
                        waiting = self.waiting(),
                        "Conversion queue full, rejecting request"
                    );
                    return Err(ConvertError::Busy);
                }
                let _slot = QueueSlot(self.waiting.clone());
                tracing::debug!(waiting = self.waiting(), "Conversion queued");
                self.permits
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|_| ConvertError::Busy)?
            }
            Err(TryAcquireError::Closed) => return Err(ConvertError::Busy),
        };

        let work = RUNNING_PERMIT.scope(Arc::new(permit), work);
        match tokio::time::timeout(self.timeout, work).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(
                    timeout_secs = self.timeout.as_secs(),
                    "Conversion timed out"
                );
                Err(ConvertError::Timeout(self.timeout.as_secs()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::blocking;
    use tokio::sync::oneshot;

    const LONG: Duration = Duration::from_secs(30);

    /// Occupy one slot until the returned sender fires.
    async fn hold_slot(
        gate: &Arc<ConversionGate>,
    ) -> (oneshot::Sender<()>, tokio::task::JoinHandle<()>) {
        let (tx, rx) = oneshot::channel::<()>();
        let before = gate.in_flight();
        let gate_clone = gate.clone();
        let handle = tokio::spawn(async move {
            let _ = gate_clone
                .run(async move {
                    let _ = rx.await;
                    Ok::<_, ConvertError>(())
                })
                .await;
        });
        while gate.in_flight() == before {
            tokio::task::yield_now().await;
        }
        (tx, handle)
    }

    #[tokio::test]
    async fn test_runs_work() {
        let gate = ConversionGate::new(2, 5, LONG);
        let value = gate.run(async { Ok::<_, ConvertError>(42) }).await.unwrap();
        assert_eq!(value, 42);
        assert_eq!(gate.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_propagates_work_error() {
        let gate = ConversionGate::new(1, 0, LONG);
        let err = gate
            .run(async { Err::<(), _>(ConvertError::Document("bad".into())) })
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::Document(_)));
    }

    #[tokio::test]
    async fn test_rejects_when_queue_full() {
        let gate = Arc::new(ConversionGate::new(1, 0, LONG));
        let (release, handle) = hold_slot(&gate).await;

        let err = gate
            .run(async { Ok::<_, ConvertError>(()) })
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::Busy));

        release.send(()).unwrap();
        handle.await.unwrap();
        assert!(gate.run(async { Ok::<_, ConvertError>(()) }).await.is_ok());
    }

    #[tokio::test]
    async fn test_queued_work_runs_after_release() {
        let gate = Arc::new(ConversionGate::new(1, 1, LONG));
        let (release, handle) = hold_slot(&gate).await;

        let queued_gate = gate.clone();
        let queued = tokio::spawn(async move {
            queued_gate.run(async { Ok::<_, ConvertError>("done") }).await
        });
        while gate.waiting() == 0 {
            tokio::task::yield_now().await;
        }

        // A third request finds both the slot and the queue taken.
        let err = gate
            .run(async { Ok::<_, ConvertError>("nope") })
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::Busy));

        release.send(()).unwrap();
        handle.await.unwrap();
        assert_eq!(queued.await.unwrap().unwrap(), "done");
        assert_eq!(gate.waiting(), 0);
    }

    #[tokio::test]
    async fn test_timeout() {
        let gate = ConversionGate::new(1, 0, Duration::from_millis(20));
        let err = gate
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, ConvertError>(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::Timeout(0)));
        assert_eq!(gate.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_timed_out_blocking_work_keeps_its_slot() {
        let gate = ConversionGate::new(1, 0, Duration::from_millis(20));
        let (release, wait) = std::sync::mpsc::channel::<()>();

        let err = gate
            .run(blocking(move || {
                let _ = wait.recv();
                Ok(())
            }))
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::Timeout(_)));

        // The abandoned work still runs, so the only slot is still taken.
        assert_eq!(gate.in_flight(), 1);
        let err = gate
            .run(async { Ok::<_, ConvertError>(()) })
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::Busy));

        release.send(()).unwrap();
        for _ in 0..500 {
            if gate.in_flight() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(gate.in_flight(), 0);
        assert!(gate.run(async { Ok::<_, ConvertError>(()) }).await.is_ok());
    }

    #[test]
    fn test_from_config() {
        let gate = ConversionGate::from_config(&Config::default());
        assert_eq!(gate.in_flight(), 0);
        assert_eq!(gate.waiting(), 0);
        assert_eq!(gate.max_concurrent, 2);
        assert_eq!(gate.max_queue, 5);
    }
}
