use std::collections::HashMap;
use std::io::Cursor;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rodio::{Decoder, OutputStream, Sink, Source};
use tokio::sync::{oneshot, watch};
use tracing::{debug, warn};

use pagereader_foundation::TabId;

use crate::driver::{PlaybackDriver, PlaybackHandle, PlaybackProgress};
use crate::error::{PlaybackError, PlaybackResult};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

enum SinkCommand {
    Pause,
    Resume,
    Stop,
}

struct ActiveSink {
    cmd_tx: mpsc::Sender<SinkCommand>,
}

/// Local playback through a rodio sink.
///
/// Each `play` gets a dedicated thread owning the output stream (the stream
/// handle is not `Send`); control flows over a command channel and the
/// thread polls the sink to publish progress and the ended signal.
pub struct RodioDriver {
    sinks: Arc<Mutex<HashMap<TabId, ActiveSink>>>,
}

impl Default for RodioDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl RodioDriver {
    pub fn new() -> Self {
        Self {
            sinks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn send_command(&self, tab: TabId, command: SinkCommand) -> PlaybackResult<()> {
        let mut sinks = self.sinks.lock();
        let active = sinks.get(&tab).ok_or(PlaybackError::NoActiveAudio)?;
        if active.cmd_tx.send(command).is_err() {
            // Sink thread already finished; the output is gone.
            sinks.remove(&tab);
            return Err(PlaybackError::NoActiveAudio);
        }
        Ok(())
    }
}

#[async_trait]
impl PlaybackDriver for RodioDriver {
    async fn play(
        &self,
        tab: TabId,
        audio: Vec<u8>,
        start_paused: bool,
    ) -> PlaybackResult<PlaybackHandle> {
        if let Some(previous) = self.sinks.lock().remove(&tab) {
            debug!(%tab, "replacing existing audio output");
            let _ = previous.cmd_tx.send(SinkCommand::Stop);
        }

        let (ready_tx, ready_rx) = oneshot::channel();
        let (ended_tx, ended_rx) = oneshot::channel();
        let (progress_tx, progress_rx) = watch::channel(PlaybackProgress::default());
        let (cmd_tx, cmd_rx) = mpsc::channel();

        std::thread::Builder::new()
            .name(format!("pagereader-sink-{}", tab.0))
            .spawn(move || {
                run_sink(audio, start_paused, ready_tx, ended_tx, progress_tx, cmd_rx)
            })
            .map_err(|e| PlaybackError::Output(e.to_string()))?;

        // The thread reports setup success (with the decoded duration, when
        // the container exposes one) before we hand out the subscription.
        match ready_rx.await {
            Ok(Ok(duration)) => {
                self.sinks.lock().insert(tab, ActiveSink { cmd_tx });
                debug!(%tab, ?duration, start_paused, "audio playback started");
                Ok(PlaybackHandle::new(tab, ended_rx, progress_rx))
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(PlaybackError::Channel(
                "sink thread exited before reporting readiness".to_string(),
            )),
        }
    }

    async fn pause(&self, tab: TabId) -> PlaybackResult<()> {
        self.send_command(tab, SinkCommand::Pause)
    }

    async fn resume(&self, tab: TabId) -> PlaybackResult<()> {
        self.send_command(tab, SinkCommand::Resume)
    }

    async fn stop(&self, tab: TabId) -> PlaybackResult<()> {
        if let Some(active) = self.sinks.lock().remove(&tab) {
            let _ = active.cmd_tx.send(SinkCommand::Stop);
            debug!(%tab, "audio playback stopped");
        }
        Ok(())
    }
}

fn run_sink(
    audio: Vec<u8>,
    start_paused: bool,
    ready_tx: oneshot::Sender<Result<Option<Duration>, PlaybackError>>,
    ended_tx: oneshot::Sender<()>,
    progress_tx: watch::Sender<PlaybackProgress>,
    cmd_rx: mpsc::Receiver<SinkCommand>,
) {
    let (_stream, stream_handle) = match OutputStream::try_default() {
        Ok(v) => v,
        Err(e) => {
            let _ = ready_tx.send(Err(PlaybackError::Output(e.to_string())));
            return;
        }
    };
    let sink = match Sink::try_new(&stream_handle) {
        Ok(s) => s,
        Err(e) => {
            let _ = ready_tx.send(Err(PlaybackError::Output(e.to_string())));
            return;
        }
    };
    let source = match Decoder::new(Cursor::new(audio)) {
        Ok(s) => s,
        Err(e) => {
            let _ = ready_tx.send(Err(PlaybackError::Decode(e.to_string())));
            return;
        }
    };

    let duration = source.total_duration();
    sink.append(source);
    if start_paused {
        sink.pause();
    }
    if ready_tx.send(Ok(duration)).is_err() {
        // Caller gave up; nothing is listening for this output.
        sink.stop();
        return;
    }

    let mut played = Duration::ZERO;
    let mut paused = start_paused;
    let mut ended_tx = Some(ended_tx);
    loop {
        match cmd_rx.recv_timeout(POLL_INTERVAL) {
            Ok(SinkCommand::Pause) => {
                sink.pause();
                paused = true;
            }
            Ok(SinkCommand::Resume) => {
                sink.play();
                paused = false;
            }
            Ok(SinkCommand::Stop) => {
                // Tear down without ever emitting the ended signal.
                sink.stop();
                return;
            }
            Err(RecvTimeoutError::Disconnected) => {
                warn!("sink command channel dropped; stopping output");
                sink.stop();
                return;
            }
            Err(RecvTimeoutError::Timeout) => {
                if !paused {
                    played += POLL_INTERVAL;
                }
                let _ = progress_tx.send(PlaybackProgress {
                    position: played,
                    duration,
                });
                if sink.empty() {
                    if let Some(tx) = ended_tx.take() {
                        let _ = tx.send(());
                    }
                    return;
                }
            }
        }
    }
}
