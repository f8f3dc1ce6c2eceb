//! Single-flight coordination for token refresh.
//!
//! At most one refresh network call is in flight at any time. Callers
//! that hit a 401 while one is running are queued and settled together
//! with that call's outcome, so N concurrent 401s produce exactly one
//! refresh request.

use std::sync::Mutex;
use tokio::sync::oneshot;

/// Marker for a refresh that settled unsuccessfully. Every waiter must
/// treat this as session-invalid rather than retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshFailed;

type RefreshResult = Result<String, RefreshFailed>;
type Waiter = oneshot::Sender<RefreshResult>;

/// Role handed to a caller entering the refresh protocol.
pub enum RefreshTicket {
    /// This caller opened the refresh and must perform the network
    /// call, then settle the coordinator. Its own receiver resolves
    /// with the outcome like any waiter's.
    Leader(oneshot::Receiver<RefreshResult>),
    /// A refresh was already in flight; await the shared outcome.
    Waiter(oneshot::Receiver<RefreshResult>),
}

#[derive(Default)]
struct Inner {
    open: bool,
    waiters: Vec<Waiter>,
}

/// Serializer for concurrent 401 recoveries.
#[derive(Default)]
pub struct RefreshCoordinator {
    inner: Mutex<Inner>,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a refresh is in flight.
    pub fn is_open(&self) -> bool {
        self.inner.lock().unwrap().open
    }

    /// Atomically join the in-flight refresh or open a new one. The
    /// check and the open happen under one lock so two callers can
    /// never both become leader.
    pub fn acquire(&self) -> RefreshTicket {
        let mut inner = self.inner.lock().unwrap();
        let (tx, rx) = oneshot::channel();
        inner.waiters.push(tx);
        if inner.open {
            RefreshTicket::Waiter(rx)
        } else {
            inner.open = true;
            RefreshTicket::Leader(rx)
        }
    }

    /// Mark a refresh as started. The caller must settle with exactly
    /// one of `success`/`failed` afterward.
    pub fn open(&self) {
        let mut inner = self.inner.lock().unwrap();
        if inner.open {
            tracing::warn!("Refresh coordinator opened while already open");
            return;
        }
        inner.open = true;
    }

    /// Register a waiting caller. Only valid while a refresh is open;
    /// a receiver enqueued on a closed coordinator resolves as failed.
    pub fn enqueue(&self) -> oneshot::Receiver<RefreshResult> {
        let mut inner = self.inner.lock().unwrap();
        let (tx, rx) = oneshot::channel();
        if !inner.open {
            tracing::warn!("Waiter enqueued while no refresh is in flight");
            drop(tx);
            return rx;
        }
        inner.waiters.push(tx);
        rx
    }

    /// Deliver the fresh token to every queued waiter, in enqueue
    /// order, and close.
    pub fn success(&self, token: String) {
        for waiter in self.drain() {
            let _ = waiter.send(Ok(token.clone()));
        }
    }

    /// Reject every queued waiter and close.
    pub fn failed(&self) {
        for waiter in self.drain() {
            let _ = waiter.send(Err(RefreshFailed));
        }
    }

    /// Take the queue and close the flag in one step, so a caller
    /// arriving after settlement starts a new refresh instead of
    /// joining a settled one.
    fn drain(&self) -> Vec<Waiter> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.open {
            tracing::warn!("Refresh coordinator settled while not open");
        }
        inner.open = false;
        std::mem::take(&mut inner.waiters)
    }
}
