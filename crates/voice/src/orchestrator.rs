//! Wake-word detection, recognition, and synthesis coordination.

use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use steward_config::VoiceConfig;
use steward_core::Intents;
use tracing::{debug, warn};

use crate::source::{ScriptedSpeechSource, SpeechSource, probe_native_source};

/// Wake word listener stub with manual triggers for prototyping.
pub struct WakeWordDetector {
    use_wake_word: bool,
    triggered: AtomicBool,
}

impl WakeWordDetector {
    pub fn new(config: &VoiceConfig) -> Self {
        Self { use_wake_word: config.use_wake_word, triggered: AtomicBool::new(false) }
    }

    /// True if the wake word has been detected (or detection is disabled).
    /// A manual trigger is consumed by the call that observes it.
    pub fn listen(&self) -> bool {
        if !self.use_wake_word {
            return true;
        }
        self.triggered.swap(false, Ordering::SeqCst)
    }

    /// Simulate wake word activation.
    pub fn trigger(&self) {
        self.triggered.store(true, Ordering::SeqCst);
    }
}

/// Bounded log of spoken snippets.
const SPOKEN_LOG_CAPACITY: usize = 20;

/// Delegates text-to-speech playback to the host OS (no-op facade here).
pub struct SpeechSynthesizer {
    enable_tts: bool,
    spoken_log: Mutex<VecDeque<String>>,
}

impl SpeechSynthesizer {
    pub fn new(config: &VoiceConfig) -> Self {
        Self { enable_tts: config.enable_tts, spoken_log: Mutex::new(VecDeque::new()) }
    }

    /// Record synthesized speech. A production build hands the text to the
    /// platform synthesizer here.
    pub fn speak(&self, text: &str) {
        if !self.enable_tts || text.is_empty() {
            return;
        }
        let mut log = self.spoken_log.lock().expect("spoken log poisoned");
        if log.len() == SPOKEN_LOG_CAPACITY {
            log.pop_front();
        }
        log.push_back(text.to_string());
    }

    /// The latest synthesized snippets, oldest first.
    pub fn spoken_log(&self) -> Vec<String> {
        self.spoken_log.lock().expect("spoken log poisoned").iter().cloned().collect()
    }
}

/// Coordinates wake-word detection, recognition, and synthesis.
pub struct VoiceOrchestrator {
    source: Arc<dyn SpeechSource>,

    /// Handle for feeding scripted input; `None` when a native backend won
    /// the startup probe.
    scripted: Option<ScriptedSpeechSource>,

    wake_detector: WakeWordDetector,
    synthesizer: SpeechSynthesizer,
}

impl VoiceOrchestrator {
    /// Select a speech source by capability probe and wire the stubs.
    pub fn new(config: &VoiceConfig) -> Self {
        let (source, scripted) = match probe_native_source(config) {
            Some(native) => {
                debug!(backend = native.name(), "Using native speech source");
                (native, None)
            }
            None => {
                let scripted = ScriptedSpeechSource::new();
                (Arc::new(scripted.clone()) as Arc<dyn SpeechSource>, Some(scripted))
            }
        };
        Self {
            source,
            scripted,
            wake_detector: WakeWordDetector::new(config),
            synthesizer: SpeechSynthesizer::new(config),
        }
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Return a runtime intent derived from speech input, if any.
    pub fn poll_intent(&self) -> Option<Intents> {
        if !self.wake_detector.listen() {
            return None;
        }
        let utterance = self.source.transcribe_once()?;
        Some(Intents::from_value(json!({
            "skill": "assistant",
            "query": utterance.text,
            "confidence": utterance.confidence,
            "source": "voice",
            "timestamps": {"start": utterance.start_ts, "end": utterance.end_ts},
        })))
    }

    /// Add scripted voice input and trigger wake detection.
    pub fn enqueue_transcript(&self, text: &str, confidence: f64) {
        match &self.scripted {
            Some(scripted) => {
                scripted.enqueue(text, confidence);
                self.wake_detector.trigger();
            }
            None => warn!("Scripted input ignored: native speech source active"),
        }
    }

    /// Forward assistant responses to the synthesizer.
    pub fn speak(&self, text: &str) {
        self.synthesizer.speak(text);
    }

    pub fn spoken_log(&self) -> Vec<String> {
        self.synthesizer.spoken_log()
    }
}
