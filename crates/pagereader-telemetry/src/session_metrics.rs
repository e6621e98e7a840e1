use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Shared metrics for cross-task session monitoring.
///
/// Mutated only by the session orchestrator; readable from anywhere
/// (status line, tests) without locking the session itself.
#[derive(Clone, Default)]
pub struct SessionMetrics {
    // Session lifecycle
    pub sessions_started: Arc<AtomicU64>,
    pub sessions_completed: Arc<AtomicU64>,
    pub sessions_stopped: Arc<AtomicU64>,
    pub sessions_superseded: Arc<AtomicU64>,

    // Section outcomes
    pub sections_played: Arc<AtomicU64>,
    pub sections_skipped_heading: Arc<AtomicU64>,
    pub sections_failed: Arc<AtomicU64>,

    // Pre-fetch pipeline
    pub prefetch_hits: Arc<AtomicU64>,
    pub prefetch_misses: Arc<AtomicU64>,
    pub prefetch_failures: Arc<AtomicU64>,

    // Completion detection
    pub completions_primary: Arc<AtomicU64>,
    pub completions_near_end: Arc<AtomicU64>,
    pub completions_forced_timeout: Arc<AtomicU64>,

    // Synthesis
    pub synth_requests: Arc<AtomicU64>,
    pub synth_failures: Arc<AtomicU64>,
    pub synth_bytes: Arc<AtomicU64>,

    pub last_session_start: Arc<RwLock<Option<Instant>>>,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_session_started(&self) {
        self.sessions_started.fetch_add(1, Ordering::Relaxed);
        *self.last_session_start.write() = Some(Instant::now());
    }

    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }
}
