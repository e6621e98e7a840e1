use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Notify;

use pagereader_extract::Section;
use pagereader_foundation::TabId;

/// Session lifecycle states, matching the on-page status vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    /// Preparing a section (extraction or synthesis in flight).
    Reading,
    Playing,
    Error,
    Complete,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "ready",
            SessionStatus::Reading => "reading",
            SessionStatus::Playing => "playing",
            SessionStatus::Error => "error",
            SessionStatus::Complete => "complete",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only view of session progress handed to the presenter.
#[derive(Debug, Clone, Copy)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    /// 1-based ordinal of the section being handled; 0 when idle.
    pub current_section: usize,
    pub total_sections: usize,
    pub is_paused: bool,
}

impl SessionSnapshot {
    pub fn idle() -> Self {
        Self {
            status: SessionStatus::Idle,
            current_section: 0,
            total_sections: 0,
            is_paused: false,
        }
    }
}

/// The single process-wide "now playing" context.
///
/// Mutated only by the orchestrator and its playback task; the generation
/// token lets late async signals verify they still refer to the current
/// session before acting.
pub struct Session {
    pub(crate) tab: TabId,
    pub(crate) generation: u64,
    pub(crate) sections: Arc<Vec<Section>>,
    current_index: AtomicUsize,
    is_paused: AtomicBool,
    status: RwLock<SessionStatus>,
    /// Woken on every advance and queue consumption; paces the pre-fetcher.
    pub(crate) progress: Notify,
}

impl Session {
    pub(crate) fn new(tab: TabId, generation: u64, sections: Vec<Section>) -> Self {
        Self {
            tab,
            generation,
            sections: Arc::new(sections),
            current_index: AtomicUsize::new(0),
            is_paused: AtomicBool::new(false),
            status: RwLock::new(SessionStatus::Reading),
            progress: Notify::new(),
        }
    }

    pub fn tab(&self) -> TabId {
        self.tab
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn total_sections(&self) -> usize {
        self.sections.len()
    }

    pub fn current_index(&self) -> usize {
        self.current_index.load(Ordering::SeqCst)
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> SessionStatus {
        *self.status.read()
    }

    pub(crate) fn set_paused(&self, paused: bool) {
        self.is_paused.store(paused, Ordering::SeqCst);
    }

    pub(crate) fn set_status(&self, status: SessionStatus) {
        let mut current = self.status.write();
        if *current != status {
            tracing::debug!(from = %*current, to = %status, "session status transition");
            *current = status;
        }
    }

    pub(crate) fn advance_to(&self, index: usize) {
        self.current_index.store(index, Ordering::SeqCst);
        self.progress.notify_waiters();
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let index = self.current_index();
        Self::snapshot_parts(
            self.status(),
            (index + 1).min(self.sections.len().max(1)),
            self.sections.len(),
            self.is_paused(),
        )
    }

    fn snapshot_parts(
        status: SessionStatus,
        current_section: usize,
        total_sections: usize,
        is_paused: bool,
    ) -> SessionSnapshot {
        SessionSnapshot {
            status,
            current_section,
            total_sections,
            is_paused,
        }
    }
}
