use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::engine::SessionEngine;
use crate::store::HistoryStore;

/// The single periodic timer source behind a session's rest countdown.
///
/// Ticks go through the shared engine lock, so a UI command and a tick can
/// never interleave inside a read-modify-write of the countdown. One ticker
/// per engine instance; dropping the handle cancels the task, so a torn-down
/// session can never keep mutating a discarded engine from the background.
pub struct RestTicker {
    handle: Option<JoinHandle<()>>,
}

impl RestTicker {
    /// Spawn a 1 Hz tick loop against the shared engine. The first tick fires
    /// one full second after start, not immediately.
    pub fn start<S>(engine: Arc<Mutex<SessionEngine<S>>>) -> Self
    where
        S: HistoryStore + Send + Sync + 'static,
    {
        let handle = tokio::spawn(async move {
            let period = Duration::from_secs(1);
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                interval.tick().await;
                engine.lock().await.tick();
            }
        });

        Self {
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Cancel the tick loop. Safe to call more than once.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for RestTicker {
    fn drop(&mut self) {
        self.stop();
    }
}
