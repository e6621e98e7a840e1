use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use pagereader_telemetry::SessionMetrics;
use pagereader_tts::{SettingsProvider, SpeechSynthesizer, TtsResult};

use crate::session::Session;
use crate::PREFETCH_RETRY_DELAY;

/// Pre-fetched result for one upcoming section.
#[derive(Debug)]
pub struct AudioQueueEntry {
    pub section_index: usize,
    pub title: String,
    pub payload: PrefetchedAudio,
}

#[derive(Debug)]
pub enum PrefetchedAudio {
    Audio(Vec<u8>),
    /// Heading sections carry no audio; the placeholder keeps the queue
    /// aligned with the section order.
    Heading,
    /// Fetch failed; the orchestrator applies its skip-on-error policy
    /// when it reaches this index.
    Failed(String),
}

/// Background look-ahead fetcher for the active session.
///
/// A single task loop with explicit next-index state: one fetch in flight
/// at a time by construction, staying one section ahead of playback. On
/// failure it appends a `Failed` entry and moves on after a fixed delay
/// rather than failing the pipeline. Cancellation is one task abort.
pub(crate) struct PrefetchPipeline {
    session: Arc<Session>,
    queue: Arc<Mutex<VecDeque<AudioQueueEntry>>>,
    task: JoinHandle<()>,
}

impl PrefetchPipeline {
    pub fn spawn(
        session: Arc<Session>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        settings: Arc<dyn SettingsProvider>,
        metrics: SessionMetrics,
    ) -> Self {
        let queue: Arc<Mutex<VecDeque<AudioQueueEntry>>> = Arc::new(Mutex::new(VecDeque::new()));
        let task = tokio::spawn(run(
            session.clone(),
            synthesizer,
            settings,
            metrics,
            queue.clone(),
        ));
        Self {
            session,
            queue,
            task,
        }
    }

    /// Pop the ready entry for `index`, discarding stale entries for
    /// already-passed sections. Consumption wakes the fetch loop.
    pub fn take(&self, index: usize) -> Option<AudioQueueEntry> {
        let entry = {
            let mut queue = self.queue.lock();
            loop {
                match queue.front() {
                    Some(front) if front.section_index < index => {
                        queue.pop_front();
                    }
                    Some(front) if front.section_index == index => break queue.pop_front(),
                    _ => break None,
                }
            }
        };
        self.session.progress.notify_waiters();
        entry
    }

    pub fn abort(&self) {
        self.task.abort();
    }
}

impl Drop for PrefetchPipeline {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    session: Arc<Session>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    settings: Arc<dyn SettingsProvider>,
    metrics: SessionMetrics,
    queue: Arc<Mutex<VecDeque<AudioQueueEntry>>>,
) {
    let sections = session.sections.clone();
    // Section 0 is synthesized inline by the playback task; look-ahead
    // starts one past it.
    let mut next = session.current_index() + 1;

    while next < sections.len() {
        // Gate: fetch only while the queue is drained and `next` is the
        // section right after the one being played.
        let notified = session.progress.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        let gate_open =
            queue.lock().is_empty() && next <= session.current_index().saturating_add(1);
        if !gate_open {
            notified.await;
            continue;
        }

        let section = &sections[next];
        if section.is_heading() {
            queue.lock().push_back(AudioQueueEntry {
                section_index: next,
                title: section.title.clone(),
                payload: PrefetchedAudio::Heading,
            });
            next += 1;
            continue;
        }

        debug!(index = next, total = sections.len(), "pre-fetching section audio");
        SessionMetrics::incr(&metrics.synth_requests);
        match fetch(&*synthesizer, &*settings, &section.content, &section.title).await {
            Ok(audio) => {
                metrics
                    .synth_bytes
                    .fetch_add(audio.len() as u64, std::sync::atomic::Ordering::Relaxed);
                queue.lock().push_back(AudioQueueEntry {
                    section_index: next,
                    title: section.title.clone(),
                    payload: PrefetchedAudio::Audio(audio),
                });
                next += 1;
            }
            Err(e) => {
                warn!(index = next, error = %e, "pre-fetch failed; queueing error entry");
                SessionMetrics::incr(&metrics.synth_failures);
                SessionMetrics::incr(&metrics.prefetch_failures);
                queue.lock().push_back(AudioQueueEntry {
                    section_index: next,
                    title: section.title.clone(),
                    payload: PrefetchedAudio::Failed(e.to_string()),
                });
                next += 1;
                tokio::time::sleep(PREFETCH_RETRY_DELAY).await;
            }
        }
    }
    debug!("pre-fetch pipeline drained");
}

async fn fetch(
    synthesizer: &dyn SpeechSynthesizer,
    settings: &dyn SettingsProvider,
    content: &str,
    title: &str,
) -> TtsResult<Vec<u8>> {
    let settings = settings.get_settings().await?;
    synthesizer.synthesize(content, Some(title), &settings).await
}
