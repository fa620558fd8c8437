//! Reference counting for "the original artifacts are still needed".
//!
//! Every build step that reads the original chunks or maps acquires a
//! [`DependencyToken`] before it starts and releases it when it is done,
//! including on its failure path. The deletion step calls
//! [`DependencyTracker::wait_until_clear`] immediately before it deletes, and
//! proceeds once no token is outstanding.
//!
//! A waiter only fires on an empty set. A token acquired after the waiter was
//! registered, but before the set first drained, therefore still delays it.

use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tracing::debug;
use uuid::Uuid;

/// One outstanding reason not to delete the original artifacts.
///
/// Hand it back with [`DependencyTracker::release`]. Dropping a token without
/// releasing it keeps the artifacts alive for the rest of the build.
#[must_use = "a dependency token must be released or deletion will never run"]
#[derive(PartialEq, Eq, Hash)]
pub struct DependencyToken(Uuid);

impl DependencyToken {
    pub fn id(&self) -> Uuid {
        self.0
    }
}

impl fmt::Debug for DependencyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DependencyToken({})", self.0)
    }
}

struct TrackerState {
    outstanding: HashSet<Uuid>,
    waiters: Vec<oneshot::Sender<()>>,
}

/// Shared registry of outstanding dependency tokens.
///
/// All mutations (acquire, release, register waiter) run under one mutex, so
/// no caller can observe a half-updated set. Waiters are notified while the
/// lock is still held, immediately after the release that drained the set.
pub struct DependencyTracker {
    state: Mutex<TrackerState>,
}

impl DependencyTracker {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TrackerState {
                outstanding: HashSet::new(),
                waiters: Vec::new(),
            }),
        }
    }

    /// Register a new dependency on the original artifacts.
    pub fn acquire(&self) -> DependencyToken {
        let mut state = self.state.lock().expect("dependency tracker mutex poisoned");
        let id = loop {
            let id = Uuid::now_v7();
            if state.outstanding.insert(id) {
                break id;
            }
        };
        debug!(token = %id, outstanding = state.outstanding.len(), "dependency acquired");
        DependencyToken(id)
    }

    /// Release a token. Returns `false` if the token was not outstanding.
    ///
    /// When this empties the set, every registered waiter fires.
    pub fn release(&self, token: DependencyToken) -> bool {
        let mut state = self.state.lock().expect("dependency tracker mutex poisoned");
        if !state.outstanding.remove(&token.0) {
            debug!(token = %token.0, "release of unknown dependency token");
            return false;
        }
        debug!(token = %token.0, outstanding = state.outstanding.len(), "dependency released");

        if state.outstanding.is_empty() {
            let waiters = std::mem::take(&mut state.waiters);
            if !waiters.is_empty() {
                debug!(waiters = waiters.len(), "all dependencies released; notifying waiters");
            }
            for waiter in waiters {
                // A dropped receiver just means nobody is waiting anymore.
                let _ = waiter.send(());
            }
        }
        true
    }

    /// Acquire a token wrapped in a guard that releases it on drop.
    pub fn hold(self: &Arc<Self>) -> DependencyGuard {
        DependencyGuard {
            tracker: Arc::clone(self),
            token: Some(self.acquire()),
        }
    }

    /// Resolve once no token is outstanding.
    ///
    /// The waiter is registered when this method is called, not when the
    /// returned future is first polled. Call it as late as possible: right
    /// before the guarantee is needed.
    pub fn wait_until_clear(&self) -> ClearSignal {
        let mut state = self.state.lock().expect("dependency tracker mutex poisoned");
        if state.outstanding.is_empty() {
            return ClearSignal { receiver: None };
        }
        let (sender, receiver) = oneshot::channel();
        state.waiters.push(sender);
        debug!(outstanding = state.outstanding.len(), "waiting for dependencies to clear");
        ClearSignal {
            receiver: Some(receiver),
        }
    }

    /// Number of outstanding tokens.
    pub fn outstanding(&self) -> usize {
        self.state
            .lock()
            .expect("dependency tracker mutex poisoned")
            .outstanding
            .len()
    }

    /// Returns `true` if no token is outstanding.
    pub fn is_clear(&self) -> bool {
        self.outstanding() == 0
    }

    /// Number of registered waiters that have not fired yet.
    pub fn pending_waiters(&self) -> usize {
        self.state
            .lock()
            .expect("dependency tracker mutex poisoned")
            .waiters
            .len()
    }
}

impl Default for DependencyTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DependencyTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyTracker")
            .field("outstanding", &self.outstanding())
            .field("pending_waiters", &self.pending_waiters())
            .finish()
    }
}

/// Future returned by [`DependencyTracker::wait_until_clear`].
#[must_use = "futures do nothing unless awaited"]
pub struct ClearSignal {
    receiver: Option<oneshot::Receiver<()>>,
}

impl ClearSignal {
    /// Returns `true` if the set was already empty at registration.
    pub fn is_immediate(&self) -> bool {
        self.receiver.is_none()
    }
}

impl Future for ClearSignal {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        match self.receiver.as_mut() {
            None => Poll::Ready(()),
            // A closed channel means the tracker is gone; nothing can hold
            // the artifacts anymore.
            Some(receiver) => Pin::new(receiver).poll(cx).map(|_| ()),
        }
    }
}

/// RAII form of a [`DependencyToken`]; releases on drop.
pub struct DependencyGuard {
    tracker: Arc<DependencyTracker>,
    token: Option<DependencyToken>,
}

impl DependencyGuard {
    /// Release now instead of at drop.
    pub fn release(mut self) -> bool {
        self.token
            .take()
            .is_some_and(|token| self.tracker.release(token))
    }
}

impl Drop for DependencyGuard {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            self.tracker.release(token);
        }
    }
}

impl fmt::Debug for DependencyGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyGuard")
            .field("token", &self.token)
            .finish()
    }
}
