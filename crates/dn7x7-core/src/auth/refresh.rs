//! Single-flight coordination of access token refresh.
//!
//! When many requests fail authentication at once, exactly one of them
//! becomes the refresh *leader*; every other request queues a one-shot
//! continuation and is settled with the leader's outcome. The in-progress
//! flag and the queue live behind one `std::sync::Mutex` that is never held
//! across an `.await`, so check-then-act on the flag is atomic.

use std::collections::VecDeque;
use std::sync::Mutex;

use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Default cap on requests queued behind a single refresh.
pub const DEFAULT_MAX_PENDING: usize = 256;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    #[error("No refresh token stored - please log in again")]
    MissingRefreshToken,

    #[error("Refresh rejected by server (status {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Refresh request failed: {0}")]
    Transport(String),

    #[error("Invalid refresh response: {0}")]
    InvalidResponse(String),

    #[error("Could not persist refreshed tokens: {0}")]
    Storage(String),

    #[error("Refresh timed out after {0}s")]
    TimedOut(u64),

    #[error("Too many requests waiting on token refresh (limit {0})")]
    QueueFull(usize),

    #[error("Token refresh abandoned before completing")]
    Abandoned,
}

type Outcome = Result<String, RefreshError>;

#[derive(Default)]
struct State {
    in_progress: bool,
    /// Bumped on every successful refresh
    generation: u64,
    latest: Option<String>,
    waiters: VecDeque<oneshot::Sender<Outcome>>,
}

/// Result of [`RefreshCoordinator::acquire`].
pub enum Acquire<'a> {
    /// Caller must perform the refresh and settle the guard
    Leader(RefreshGuard<'a>),
    /// A refresh is running; wait for its outcome
    Follower(Waiter),
    /// A refresh completed after the caller sent its request; replay with this token
    Refreshed(String),
}

pub struct RefreshCoordinator {
    state: Mutex<State>,
    max_pending: usize,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::with_max_pending(DEFAULT_MAX_PENDING)
    }

    pub fn with_max_pending(max_pending: usize) -> Self {
        Self {
            state: Mutex::new(State::default()),
            max_pending,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Generation to capture before sending a request, passed back to `acquire`
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    pub fn is_refreshing(&self) -> bool {
        self.lock().in_progress
    }

    /// Number of requests currently queued behind the refresh
    pub fn pending(&self) -> usize {
        self.lock().waiters.len()
    }

    /// Drop the remembered token, e.g. after logout or a fresh login
    pub fn forget(&self) {
        self.lock().latest = None;
    }

    /// Decide what a request that just received a 401 should do.
    ///
    /// `observed` is the generation captured when that request was sent.
    pub fn acquire(&self, observed: u64) -> Result<Acquire<'_>, RefreshError> {
        let mut state = self.lock();

        if state.in_progress {
            if state.waiters.len() >= self.max_pending {
                warn!(limit = self.max_pending, "Refresh queue full, rejecting request");
                return Err(RefreshError::QueueFull(self.max_pending));
            }
            let (tx, rx) = oneshot::channel();
            state.waiters.push_back(tx);
            debug!(pending = state.waiters.len(), "Queued behind in-flight token refresh");
            return Ok(Acquire::Follower(Waiter { rx }));
        }

        if state.generation != observed {
            if let Some(token) = state.latest.clone() {
                return Ok(Acquire::Refreshed(token));
            }
        }

        state.in_progress = true;
        Ok(Acquire::Leader(RefreshGuard {
            coordinator: self,
            outcome: None,
        }))
    }

    fn release(&self, outcome: Outcome) {
        let waiters = {
            let mut state = self.lock();
            state.in_progress = false;
            match &outcome {
                Ok(token) => {
                    state.generation += 1;
                    state.latest = Some(token.clone());
                }
                Err(_) => state.latest = None,
            }
            std::mem::take(&mut state.waiters)
        };

        debug!(
            waiters = waiters.len(),
            success = outcome.is_ok(),
            "Token refresh settled"
        );
        // FIFO: oldest waiter first
        for tx in waiters {
            let _ = tx.send(outcome.clone());
        }
    }
}

impl Default for RefreshCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Held by the refresh leader. Dropping it always clears the in-progress
/// flag and settles every queued waiter; an unsettled guard rejects them
/// with [`RefreshError::Abandoned`].
pub struct RefreshGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    outcome: Option<Outcome>,
}

impl RefreshGuard<'_> {
    pub fn resolve(mut self, token: String) {
        self.outcome = Some(Ok(token));
    }

    pub fn reject(mut self, error: RefreshError) {
        self.outcome = Some(Err(error));
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        let outcome = self.outcome.take().unwrap_or_else(|| {
            warn!("Token refresh leader dropped without settling");
            Err(RefreshError::Abandoned)
        });
        self.coordinator.release(outcome);
    }
}

/// A queued request's continuation.
pub struct Waiter {
    rx: oneshot::Receiver<Outcome>,
}

impl Waiter {
    pub async fn wait(self) -> Outcome {
        self.rx
            .await
            .unwrap_or_else(|_| Err(RefreshError::Abandoned))
    }
}
