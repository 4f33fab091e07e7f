//! Speech sources — transcription behind a capability-checked seam.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use steward_config::VoiceConfig;
use tracing::warn;

/// A single transcription result.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedUtterance {
    pub text: String,
    pub confidence: f64,

    /// Float seconds since the Unix epoch
    pub start_ts: f64,
    pub end_ts: f64,
}

/// Facade over speech-to-text engines.
///
/// Selected once at startup by [`probe_native_source`]; call sites never
/// branch on the concrete backend.
pub trait SpeechSource: Send + Sync {
    /// The backend name (e.g. "scripted").
    fn name(&self) -> &str;

    /// Return one transcription result, or `None` when nothing is pending.
    fn transcribe_once(&self) -> Option<RecognizedUtterance>;
}

/// Offline speech source fed by scripted inputs.
///
/// Clones share the same queue, so a handle kept by the orchestrator feeds
/// the boxed trait object.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSpeechSource {
    queue: Arc<Mutex<VecDeque<(String, f64)>>>,
}

impl ScriptedSpeechSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a simulated transcription.
    pub fn enqueue(&self, text: impl Into<String>, confidence: f64) {
        self.queue.lock().expect("speech queue poisoned").push_back((text.into(), confidence));
    }
}

impl SpeechSource for ScriptedSpeechSource {
    fn name(&self) -> &str {
        "scripted"
    }

    fn transcribe_once(&self) -> Option<RecognizedUtterance> {
        let (text, confidence) =
            self.queue.lock().expect("speech queue poisoned").pop_front()?;
        let end_ts = now_seconds();
        let words = text.split_whitespace().count();
        let start_ts = end_ts - (words as f64 * 0.12).max(0.2);
        Some(RecognizedUtterance { text, confidence, start_ts, end_ts })
    }
}

/// Probe for a platform speech backend.
///
/// Returns `None` when no native engine is available (or when the
/// configuration forces the scripted source); the caller then falls back
/// to [`ScriptedSpeechSource`]. Platform implementations register here,
/// keyed by `voice.speech_backend`.
pub fn probe_native_source(config: &VoiceConfig) -> Option<Arc<dyn SpeechSource>> {
    match config.speech_backend.as_str() {
        "scripted" => None,
        // No native engine is linked into this build; "auto" resolves to
        // the scripted fallback.
        "auto" => None,
        other => {
            warn!(backend = other, "Unknown speech backend, falling back to scripted");
            None
        }
    }
}

fn now_seconds() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
