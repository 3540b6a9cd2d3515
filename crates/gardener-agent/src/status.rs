//! Status bar text and the elapsed-time ticker shown while a request runs.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use gardener_core::defaults::{STATUS_PREFIX, STATUS_TICK_SECS};
use gardener_core::{Settings, StatusSink};

/// Writes status text to a [`StatusSink`].
#[derive(Clone)]
pub struct StatusBar {
    sink: Arc<dyn StatusSink>,
    settings: Arc<Settings>,
}

impl StatusBar {
    pub fn new(sink: Arc<dyn StatusSink>, settings: Arc<Settings>) -> Self {
        Self { sink, settings }
    }

    /// Idle text: model, temperature and token budget.
    pub fn idle_text(&self) -> String {
        format!(
            "{}: {} | Temp {} | Tokens {}",
            STATUS_PREFIX, self.settings.model, self.settings.temperature, self.settings.max_tokens
        )
    }

    pub fn show_idle(&self) {
        self.sink.set_status(&self.idle_text());
    }

    pub fn show_no_api_key(&self) {
        self.sink.set_status(&format!("{}: No API Key", STATUS_PREFIX));
    }

    pub fn set(&self, text: &str) {
        self.sink.set_status(text);
    }

    /// Start the elapsed-time ticker. The ticker stops and the idle text is
    /// restored when the returned guard is dropped.
    pub fn start_timer(&self, label: impl Into<String>) -> PendingTimer {
        let label = label.into();
        let sink = Arc::clone(&self.sink);
        let tick = Duration::from_secs(STATUS_TICK_SECS);
        let running = Arc::new(Mutex::new(true));
        let ticking = Arc::clone(&running);

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + tick, tick);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut elapsed = 0u64;
            loop {
                ticker.tick().await;
                elapsed += STATUS_TICK_SECS;
                if !show_tick(&ticking, sink.as_ref(), &format!("{}: {}s", label, elapsed)) {
                    break;
                }
            }
        });

        PendingTimer {
            handle,
            running,
            bar: self.clone(),
        }
    }
}

/// Write a tick unless the timer was stopped. The lock is held while
/// writing so a late tick cannot land after the idle text.
fn show_tick(running: &Mutex<bool>, sink: &dyn StatusSink, text: &str) -> bool {
    let running = running.lock().unwrap_or_else(|e| e.into_inner());
    if *running {
        sink.set_status(text);
    }
    *running
}

/// Drop guard for a running status ticker.
pub struct PendingTimer {
    handle: JoinHandle<()>,
    running: Arc<Mutex<bool>>,
    bar: StatusBar,
}

impl Drop for PendingTimer {
    fn drop(&mut self) {
        self.handle.abort();
        let mut running = self.running.lock().unwrap_or_else(|e| e.into_inner());
        *running = false;
        self.bar.show_idle();
    }
}
