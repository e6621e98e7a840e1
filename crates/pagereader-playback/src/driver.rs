use std::time::Duration;

use async_trait::async_trait;
use pagereader_foundation::TabId;
use tokio::sync::{oneshot, watch};

use crate::error::PlaybackResult;

/// Playback position report from a driver.
///
/// `duration` is `None` when the payload's length is unknown (the near-end
/// fallback stays inactive then; the hard ceiling still applies).
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaybackProgress {
    pub position: Duration,
    pub duration: Option<Duration>,
}

/// Subscription returned from one `play` call.
///
/// Owns the primary ended-signal receiver and the progress feed for that one
/// payload. Dropping the handle releases the subscription; it does not stop
/// audio — the driver replaces a tab's output on the next `play`, and `stop`
/// tears it down explicitly.
pub struct PlaybackHandle {
    pub tab: TabId,
    pub(crate) ended: oneshot::Receiver<()>,
    pub(crate) progress: watch::Receiver<PlaybackProgress>,
}

impl PlaybackHandle {
    pub fn new(
        tab: TabId,
        ended: oneshot::Receiver<()>,
        progress: watch::Receiver<PlaybackProgress>,
    ) -> Self {
        Self {
            tab,
            ended,
            progress,
        }
    }

    pub fn progress(&self) -> PlaybackProgress {
        *self.progress.borrow()
    }
}

/// Plays one audio payload in the context of a specific tab.
///
/// One active output per tab: a new `play` replaces whatever that tab was
/// playing. `stop` is idempotent. The ended signal is emitted at most once
/// per `play` call and never by a replaced or stopped output.
#[async_trait]
pub trait PlaybackDriver: Send + Sync {
    async fn play(
        &self,
        tab: TabId,
        audio: Vec<u8>,
        start_paused: bool,
    ) -> PlaybackResult<PlaybackHandle>;

    async fn pause(&self, tab: TabId) -> PlaybackResult<()>;

    async fn resume(&self, tab: TabId) -> PlaybackResult<()>;

    async fn stop(&self, tab: TabId) -> PlaybackResult<()>;
}
