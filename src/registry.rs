//! View registry: the set of attached viewer sessions.
//!
//! Attach, detach and per-tick publication all run under the same mutex so
//! that a session attaching while the poll thread publishes sees every
//! sample exactly once, either in its initial snapshot or as an incremental
//! update.

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, RwLock};
use tracing::{debug, info, warn};

use crate::dispatch::{Chart, RenderCommand, SessionQueue};
use crate::series::SeriesSet;

/// Identifier handed out on attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SessionId(u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// A session's render queue, keyed by its id.
#[derive(Debug)]
struct ViewBinding {
    id: SessionId,
    queue: SessionQueue,
}

/// Registry of attached sessions.
#[derive(Debug, Default)]
pub struct ViewRegistry {
    bindings: Mutex<Vec<ViewBinding>>,
    next_id: AtomicU64,
}

/// Commands that bring a fresh session up to date with `series`.
pub fn initial_sync(series: &SeriesSet) -> [RenderCommand; 3] {
    [
        RenderCommand::stream(
            Chart::Now,
            &series.rolling.snapshot(),
            Some(series.rollover_limit()),
        ),
        RenderCommand::replace(Chart::Today, series.today.samples()),
        RenderCommand::replace(Chart::Yesterday, series.yesterday.samples()),
    ]
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ViewBinding>> {
        // A panic while holding the lock cannot leave the Vec half-updated.
        self.bindings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Registers a session and immediately schedules a full sync of the
    /// current series on its queue.
    pub fn attach(&self, queue: SessionQueue, series: &RwLock<SeriesSet>) -> SessionId {
        let id = SessionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut bindings = self.lock();

        {
            let series = series.read().unwrap_or_else(|p| p.into_inner());
            for command in initial_sync(&series) {
                queue.schedule(command);
            }
        }

        bindings.push(ViewBinding { id, queue });
        info!("Attached {} ({} sessions)", id, bindings.len());
        id
    }

    /// Removes the session with `id`. Returns false if it was not attached.
    pub fn detach(&self, id: SessionId) -> bool {
        let mut bindings = self.lock();
        match bindings.iter().position(|b| b.id == id) {
            Some(index) => {
                bindings.remove(index);
                info!("Detached {} ({} sessions)", id, bindings.len());
                true
            }
            None => {
                warn!("Detach of unknown {}", id);
                false
            }
        }
    }

    /// Runs `update` and schedules the commands it returns on every attached
    /// session, all while holding the registry lock. Returns the number of
    /// sessions that accepted every command.
    pub fn publish<F>(&self, update: F) -> usize
    where
        F: FnOnce() -> Vec<RenderCommand>,
    {
        let bindings = self.lock();
        let commands = update();
        if commands.is_empty() {
            return bindings.len();
        }

        let mut delivered = 0;
        for binding in bindings.iter() {
            let ok = commands
                .iter()
                .all(|command| binding.queue.schedule(command.clone()));
            if ok {
                delivered += 1;
            } else {
                debug!("{} queue closed before detach", binding.id);
            }
        }
        delivered
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Ids of attached sessions in attach order.
    pub fn session_ids(&self) -> Vec<SessionId> {
        self.lock().iter().map(|b| b.id).collect()
    }
}
