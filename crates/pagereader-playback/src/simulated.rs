use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use pagereader_foundation::TabId;

use crate::driver::{PlaybackDriver, PlaybackHandle, PlaybackProgress};
use crate::error::{PlaybackError, PlaybackResult};

/// Behavior knobs for the simulated driver.
#[derive(Debug, Clone)]
pub struct SimulatedDriverConfig {
    /// Simulated playback speed: payload bytes consumed per millisecond.
    pub bytes_per_ms: usize,
    /// Never emit the primary ended signal (the "ended event failed to
    /// fire" browser hazard); the output stays alive until replaced.
    pub withhold_ended: bool,
    /// Publish position reports while playing.
    pub emit_progress: bool,
}

impl Default for SimulatedDriverConfig {
    fn default() -> Self {
        Self {
            bytes_per_ms: 32,
            withhold_ended: false,
            emit_progress: true,
        }
    }
}

struct ActiveOutput {
    paused_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// In-process driver that plays payloads on tokio time.
///
/// Used by tests and the dry-run binary path; duration is derived from the
/// payload length, pause/resume gate the position clock, and the ended
/// signal fires when the simulated clip drains.
pub struct SimulatedDriver {
    config: SimulatedDriverConfig,
    outputs: Arc<Mutex<HashMap<TabId, ActiveOutput>>>,
}

impl Default for SimulatedDriver {
    fn default() -> Self {
        Self::new(SimulatedDriverConfig::default())
    }
}

impl SimulatedDriver {
    pub fn new(config: SimulatedDriverConfig) -> Self {
        Self {
            config,
            outputs: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn clip_duration(&self, bytes: usize) -> Duration {
        let ms = (bytes / self.config.bytes_per_ms.max(1)).max(20) as u64;
        Duration::from_millis(ms)
    }

    fn remove_output(&self, tab: TabId) -> bool {
        let existing = self.outputs.lock().remove(&tab);
        match existing {
            Some(output) => {
                output.task.abort();
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl PlaybackDriver for SimulatedDriver {
    async fn play(
        &self,
        tab: TabId,
        audio: Vec<u8>,
        start_paused: bool,
    ) -> PlaybackResult<PlaybackHandle> {
        if self.remove_output(tab) {
            debug!(%tab, "replacing existing simulated output");
        }

        let duration = self.clip_duration(audio.len());
        let (ended_tx, ended_rx) = oneshot::channel();
        let (progress_tx, progress_rx) = watch::channel(PlaybackProgress {
            position: Duration::ZERO,
            duration: Some(duration),
        });
        let (paused_tx, mut paused_rx) = watch::channel(start_paused);

        let config = self.config.clone();
        let task = tokio::spawn(async move {
            let step = (duration / 20).max(Duration::from_millis(1));
            let mut position = Duration::ZERO;
            while position < duration {
                // Pause gate: the position clock only runs while unpaused.
                while *paused_rx.borrow_and_update() {
                    if paused_rx.changed().await.is_err() {
                        return;
                    }
                }
                tokio::time::sleep(step).await;
                position = (position + step).min(duration);
                if config.emit_progress {
                    let _ = progress_tx.send(PlaybackProgress {
                        position,
                        duration: Some(duration),
                    });
                }
            }
            if config.withhold_ended {
                // Keep the output (and the unsent signal) alive until the
                // driver replaces or stops it.
                std::future::pending::<()>().await;
            }
            let _ = ended_tx.send(());
        });

        self.outputs
            .lock()
            .insert(tab, ActiveOutput { paused_tx, task });

        debug!(%tab, ?duration, start_paused, "simulated playback started");
        Ok(PlaybackHandle::new(tab, ended_rx, progress_rx))
    }

    async fn pause(&self, tab: TabId) -> PlaybackResult<()> {
        let outputs = self.outputs.lock();
        let output = outputs.get(&tab).ok_or(PlaybackError::NoActiveAudio)?;
        output.paused_tx.send_replace(true);
        Ok(())
    }

    async fn resume(&self, tab: TabId) -> PlaybackResult<()> {
        let outputs = self.outputs.lock();
        let output = outputs.get(&tab).ok_or(PlaybackError::NoActiveAudio)?;
        output.paused_tx.send_replace(false);
        Ok(())
    }

    async fn stop(&self, tab: TabId) -> PlaybackResult<()> {
        if self.remove_output(tab) {
            debug!(%tab, "simulated playback stopped");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    const TAB: TabId = TabId(1);

    #[tokio::test(start_paused = true)]
    async fn plays_for_duration_proportional_to_bytes() {
        let driver = SimulatedDriver::default();
        let start = Instant::now();
        let handle = driver.play(TAB, vec![0u8; 3200], false).await.unwrap();
        handle.ended.await.unwrap();
        // 3200 bytes at 32 bytes/ms -> 100ms of simulated audio.
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn pause_stops_the_clock_and_resume_restarts_it() {
        let driver = SimulatedDriver::default();
        let handle = driver.play(TAB, vec![0u8; 3200], false).await.unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;
        driver.pause(TAB).await.unwrap();
        let frozen = handle.progress().position;
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(handle.progress().position, frozen);

        driver.resume(TAB).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(handle.progress().position > frozen);
    }

    #[tokio::test]
    async fn pause_without_output_is_no_active_audio() {
        let driver = SimulatedDriver::default();
        assert!(matches!(
            driver.pause(TAB).await,
            Err(PlaybackError::NoActiveAudio)
        ));
        assert!(matches!(
            driver.resume(TAB).await,
            Err(PlaybackError::NoActiveAudio)
        ));
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let driver = SimulatedDriver::default();
        driver.stop(TAB).await.unwrap();
        driver.play(TAB, vec![0u8; 320], false).await.unwrap();
        driver.stop(TAB).await.unwrap();
        driver.stop(TAB).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn start_paused_holds_position_at_zero() {
        let driver = SimulatedDriver::default();
        let handle = driver.play(TAB, vec![0u8; 3200], true).await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(handle.progress().position, Duration::ZERO);
        driver.resume(TAB).await.unwrap();
        handle.ended.await.unwrap();
    }
}
