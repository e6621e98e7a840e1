//! Session orchestration core for PageReader.
//!
//! Turns an ordered list of content sections into a continuous,
//! interruptible audio stream: synthesize section *i*, play it, await the
//! completion race, advance to *i+1* — while a background pre-fetch pipeline
//! keeps the next section's audio one step ahead. A single process-wide
//! session is active at a time; starting a new read supersedes the old one.

use std::time::Duration;

pub mod error;
pub mod orchestrator;
pub mod prefetch;
pub mod presenter;
pub mod session;

pub use error::SessionError;
pub use orchestrator::SessionOrchestrator;
pub use prefetch::{AudioQueueEntry, PrefetchedAudio};
pub use presenter::{NullPresenter, UiPresenter};
pub use session::{Session, SessionSnapshot, SessionStatus};

/// UI pulse for heading sections, which carry no audio.
pub const HEADING_SKIP_DELAY: Duration = Duration::from_millis(200);
/// Delay before the pre-fetch pipeline moves on after a failed fetch.
/// The matching skip backoff for failed playback comes from
/// `AppError::recovery_strategy`.
pub const PREFETCH_RETRY_DELAY: Duration = Duration::from_secs(1);
