use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, trace};

use crate::driver::{PlaybackHandle, PlaybackProgress};

/// How far from the end the secondary check considers playback finished.
pub const NEAR_END_EPSILON: Duration = Duration::from_millis(500);
/// Grace period the secondary check gives the primary signal before forcing.
pub const NEAR_END_CONFIRM_DELAY: Duration = Duration::from_millis(600);
/// Hard per-section ceiling; the session can never hang on one section.
pub const SECTION_TIMEOUT_CEILING: Duration = Duration::from_secs(180);

/// Which of the redundant completion mechanisms fired first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionReason {
    /// Primary: the driver's natural end-of-playback signal.
    Ended,
    /// Secondary: playback position reached the near-end window and the
    /// primary signal did not arrive within the grace period.
    NearEnd,
    /// Tertiary: the hard ceiling expired; forced advance.
    TimedOut,
    /// The driver went away (output replaced or torn down) without signaling.
    DriverGone,
}

/// Single cancellable completion future for one section's playback.
///
/// Composes the three detection mechanisms into one race: first to fire
/// wins and the rest are dropped, so the caller observes exactly one
/// completion per section. Dropping the watch before it resolves cancels
/// all three.
pub struct CompletionWatch {
    handle: PlaybackHandle,
    ceiling: Duration,
    epsilon: Duration,
    confirm_delay: Duration,
}

impl CompletionWatch {
    pub fn new(handle: PlaybackHandle) -> Self {
        Self {
            handle,
            ceiling: SECTION_TIMEOUT_CEILING,
            epsilon: NEAR_END_EPSILON,
            confirm_delay: NEAR_END_CONFIRM_DELAY,
        }
    }

    pub fn with_ceiling(mut self, ceiling: Duration) -> Self {
        self.ceiling = ceiling;
        self
    }

    pub async fn wait(self) -> CompletionReason {
        let PlaybackHandle {
            tab,
            ended,
            mut progress,
        } = self.handle;

        let reason = tokio::select! {
            res = ended => match res {
                Ok(()) => CompletionReason::Ended,
                Err(_) => CompletionReason::DriverGone,
            },
            _ = near_end(&mut progress, self.epsilon, self.confirm_delay) => {
                CompletionReason::NearEnd
            }
            _ = tokio::time::sleep(self.ceiling) => CompletionReason::TimedOut,
        };

        debug!(%tab, ?reason, "section playback completed");
        reason
    }
}

/// Resolve once playback position sits within `epsilon` of the known
/// duration and stays unresolved by the primary for `confirm_delay`.
async fn near_end(
    progress: &mut watch::Receiver<PlaybackProgress>,
    epsilon: Duration,
    confirm_delay: Duration,
) {
    loop {
        let snapshot = *progress.borrow_and_update();
        if let Some(duration) = snapshot.duration {
            if snapshot.position > Duration::ZERO
                && duration.saturating_sub(snapshot.position) <= epsilon
            {
                trace!(?snapshot, "near end of playback, arming forced completion");
                tokio::time::sleep(confirm_delay).await;
                return;
            }
        }
        if progress.changed().await.is_err() {
            // Progress feed gone; leave resolution to the other branches.
            std::future::pending::<()>().await;
        }
    }
}
