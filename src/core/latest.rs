//! # Latest-Pending Request Slot
//!
//! A single slot holding at most one pending request. Submitting a new request
//! aborts the pending one, whether it is still inside its quiet window or
//! already waiting on the network. Every submission carries a ticket from a
//! monotonically increasing counter, and a completed request only publishes
//! its output if its ticket is still the newest. A response that arrives for a
//! superseded ticket is dropped.
//!
//! Aborting a request abandons interest locally. Nothing is sent to the
//! remote side.
//!
//! Outputs are published through a `tokio::sync::watch` channel so any number
//! of observers can follow the latest value.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::ClientResult;

/// Latest published value plus the ticket that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Published<T> {
    pub ticket: u64,
    pub value: T,
}

pub struct LatestRequest<T> {
    name: &'static str,
    window: Duration,
    ticket: Arc<AtomicU64>,
    pending: Mutex<Option<JoinHandle<()>>>,
    output: Arc<watch::Sender<Option<Published<T>>>>,
    last_error: Arc<Mutex<Option<String>>>,
}

impl<T> LatestRequest<T>
where
    T: Send + Sync + 'static,
{
    /// `window` is the quiet period a debounced submission waits before running.
    pub fn new(name: &'static str, window: Duration) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            name,
            window,
            ticket: Arc::new(AtomicU64::new(0)),
            pending: Mutex::new(None),
            output: Arc::new(tx),
            last_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Run `make` after the quiet window unless superseded first.
    pub fn submit<F, Fut>(&self, make: F) -> u64
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ClientResult<T>> + Send + 'static,
    {
        self.schedule(self.window, make)
    }

    /// Run `make` immediately, still superseding any pending request.
    pub fn submit_now<F, Fut>(&self, make: F) -> u64
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ClientResult<T>> + Send + 'static,
    {
        self.schedule(Duration::ZERO, make)
    }

    fn schedule<F, Fut>(&self, delay: Duration, make: F) -> u64
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ClientResult<T>> + Send + 'static,
    {
        let mut pending = self.pending_guard();
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        let ticket = self.ticket.fetch_add(1, Ordering::SeqCst) + 1;

        let name = self.name;
        let latest = self.ticket.clone();
        let output = self.output.clone();
        let last_error = self.last_error.clone();
        *pending = Some(tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let result = make().await;
            if latest.load(Ordering::SeqCst) != ticket {
                debug!(slot = name, ticket, "dropping stale response");
                return;
            }
            match result {
                Ok(value) => {
                    output.send_replace(Some(Published { ticket, value }));
                    *lock(&last_error) = None;
                }
                Err(e) => {
                    warn!(slot = name, ticket, error = %e, "request failed");
                    *lock(&last_error) = Some(e.to_string());
                }
            }
        }));
        ticket
    }

    /// Abandon the pending request, if any.
    pub fn cancel(&self) {
        if let Some(previous) = self.pending_guard().take() {
            previous.abort();
        }
        self.ticket.fetch_add(1, Ordering::SeqCst);
    }

    /// True while a submitted request has neither finished nor been superseded.
    pub fn is_pending(&self) -> bool {
        self.pending_guard().as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Ticket of the newest submission.
    pub fn current_ticket(&self) -> u64 {
        self.ticket.load(Ordering::SeqCst)
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Published<T>>> {
        self.output.subscribe()
    }

    pub fn last_error(&self) -> Option<String> {
        lock(&self.last_error).clone()
    }

    fn pending_guard(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        lock(&self.pending)
    }
}

impl<T: Clone> LatestRequest<T> {
    pub fn latest(&self) -> Option<Published<T>> {
        self.output.borrow().clone()
    }
}

impl<T> Drop for LatestRequest<T> {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.pending).take() {
            handle.abort();
        }
    }
}

fn lock<V>(m: &Mutex<V>) -> MutexGuard<'_, V> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test(start_paused = true)]
    async fn rapid_submissions_coalesce() {
        let slot = LatestRequest::new("test", Duration::from_millis(100));
        let calls = Arc::new(AtomicUsize::new(0));

        for i in 0..5u32 {
            let calls = calls.clone();
            slot.submit(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(i)
            });
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(slot.latest(), Some(Published { ticket: 5, value: 4 }));
        assert!(!slot.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_response_is_abandoned_when_superseded() {
        let slot = LatestRequest::new("test", Duration::from_millis(10));
        slot.submit_now(|| async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok("slow")
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(slot.is_pending());

        slot.submit_now(|| async { Ok("fast") });
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(slot.latest().map(|p| p.value), Some("fast"));
    }

    #[tokio::test(start_paused = true)]
    async fn failures_keep_previous_output() {
        let slot = LatestRequest::new("test", Duration::from_millis(10));
        slot.submit_now(|| async { Ok(1u8) });
        tokio::time::sleep(Duration::from_millis(5)).await;
        slot.submit_now(|| async { Err(ClientError::api_rejected("render", "boom")) });
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert_eq!(slot.latest().map(|p| p.value), Some(1));
        assert!(slot.last_error().unwrap().contains("boom"));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_pending() {
        let slot: LatestRequest<u8> = LatestRequest::new("test", Duration::from_millis(100));
        slot.submit(|| async { Ok(9) });
        slot.cancel();
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(slot.latest(), None);
    }
}
