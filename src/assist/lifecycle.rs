use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::CompletionConfig;
use crate::language::java::lexer::is_ident_part;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    Idle,
    Pending,
    Cancelled,
    Completed,
}

/// What started a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The user asked for completion.
    Explicit,
    /// A typed character started a background query.
    Auto(char),
}

/// One in-flight completion request.
///
/// Cloning shares the state; the handle stays valid after the controller
/// has forgotten about it.
#[derive(Debug, Clone)]
pub struct QueryHandle {
    id: u64,
    trigger: Trigger,
    token: CancellationToken,
    state: Arc<Mutex<QueryState>>,
}

impl QueryHandle {
    fn new(id: u64, trigger: Trigger) -> Self {
        Self {
            id,
            trigger,
            token: CancellationToken::new(),
            state: Arc::new(Mutex::new(QueryState::Pending)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn trigger(&self) -> Trigger {
        self.trigger
    }

    pub fn state(&self) -> QueryState {
        *self.state.lock()
    }

    pub fn is_pending(&self) -> bool {
        self.state() == QueryState::Pending
    }

    /// Pending -> Cancelled. Returns `false` if the query already finished.
    pub fn cancel(&self) -> bool {
        let mut state = self.state.lock();
        if *state != QueryState::Pending {
            return false;
        }
        *state = QueryState::Cancelled;
        self.token.cancel();
        true
    }

    /// Pending -> Completed. A query cancelled in the meantime stays cancelled
    /// and its result must be dropped.
    fn complete(&self) -> bool {
        let mut state = self.state.lock();
        if *state != QueryState::Pending {
            return false;
        }
        *state = QueryState::Completed;
        true
    }
}

/// Triggering, cancellation and debouncing of the queries of one editor.
///
/// Auto-triggered queries are single-flight: starting one cancels the one
/// before it. Explicit queries are only cancelled by an invalidating
/// keystroke or [`cancel_all`](Self::cancel_all).
#[derive(Debug)]
pub struct QueryController {
    config: RwLock<CompletionConfig>,
    next_id: AtomicU64,
    auto: Mutex<Option<QueryHandle>>,
    explicit: Mutex<Vec<QueryHandle>>,
}

impl QueryController {
    pub fn new(config: &CompletionConfig) -> Self {
        Self {
            config: RwLock::new(config.clone()),
            next_id: AtomicU64::new(1),
            auto: Mutex::new(None),
            explicit: Mutex::new(Vec::new()),
        }
    }

    pub fn set_config(&self, config: &CompletionConfig) {
        *self.config.write() = config.clone();
    }

    /// Idle -> Pending. `None` when the trigger does not qualify.
    pub fn begin(&self, trigger: Trigger) -> Option<QueryHandle> {
        {
            let config = self.config.read();
            if !config.enabled {
                return None;
            }
            if let Trigger::Auto(c) = trigger
                && !config.is_auto_trigger_char(c)
            {
                debug!(?c, "character does not auto-trigger");
                return None;
            }
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let handle = QueryHandle::new(id, trigger);
        match trigger {
            Trigger::Auto(_) => {
                if let Some(previous) = self.auto.lock().replace(handle.clone())
                    && previous.cancel()
                {
                    debug!(id = previous.id, superseded_by = id, "auto query cancelled");
                }
            }
            Trigger::Explicit => {
                let mut explicit = self.explicit.lock();
                explicit.retain(QueryHandle::is_pending);
                explicit.push(handle.clone());
            }
        }
        debug!(id, ?trigger, "query started");
        Some(handle)
    }

    /// Cancels every pending query when `c` cannot continue the word at the
    /// caret. Returns how many were cancelled.
    pub fn on_keystroke(&self, c: char) -> usize {
        if is_ident_part(c) {
            return 0;
        }
        let cancelled = self.cancel_all();
        if cancelled > 0 {
            debug!(?c, cancelled, "keystroke invalidated pending queries");
        }
        cancelled
    }

    pub fn cancel_all(&self) -> usize {
        let mut cancelled = 0;
        if let Some(auto) = self.auto.lock().take()
            && auto.cancel()
        {
            cancelled += 1;
        }
        for handle in self.explicit.lock().drain(..) {
            if handle.cancel() {
                cancelled += 1;
            }
        }
        cancelled
    }

    /// `Pending` while any tracked query is in flight.
    pub fn state(&self) -> QueryState {
        let auto_pending = self.auto.lock().as_ref().is_some_and(QueryHandle::is_pending);
        if auto_pending || self.explicit.lock().iter().any(QueryHandle::is_pending) {
            QueryState::Pending
        } else {
            QueryState::Idle
        }
    }

    /// Drives `backend` for `handle`.
    ///
    /// Auto queries wait out the debounce delay first; `backend` is not polled
    /// if the query is cancelled before that. The result is returned only if
    /// the query is still pending when `backend` finishes.
    pub async fn run<F, T>(&self, handle: &QueryHandle, backend: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        if let Trigger::Auto(_) = handle.trigger {
            let delay = self.config.read().debounce();
            if !delay.is_zero() {
                tokio::select! {
                    biased;
                    _ = handle.token.cancelled() => {
                        debug!(id = handle.id, "query cancelled while debouncing");
                        self.retire(handle);
                        return None;
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }

        let out = tokio::select! {
            biased;
            _ = handle.token.cancelled() => None,
            out = backend => Some(out),
        };
        let result = match out {
            Some(out) if handle.complete() => Some(out),
            _ => {
                debug!(id = handle.id, "dropping result of cancelled query");
                None
            }
        };
        self.retire(handle);
        result
    }

    fn retire(&self, handle: &QueryHandle) {
        let mut auto = self.auto.lock();
        if auto.as_ref().is_some_and(|h| h.id == handle.id) {
            *auto = None;
        }
        drop(auto);
        self.explicit.lock().retain(|h| h.id != handle.id);
    }
}
