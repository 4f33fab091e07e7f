//! Voice orchestration primitives.
//!
//! Thin I/O adapter over speech backends: a capability-probed
//! [`SpeechSource`], a wake-word detector stub with manual triggers, and a
//! synthesizer facade. No real STT/TTS happens here — platform backends
//! plug in behind the `SpeechSource` trait, and the scripted implementation
//! carries tests and offline operation.

pub mod orchestrator;
pub mod source;

pub use orchestrator::{SpeechSynthesizer, VoiceOrchestrator, WakeWordDetector};
pub use source::{RecognizedUtterance, ScriptedSpeechSource, SpeechSource, probe_native_source};
