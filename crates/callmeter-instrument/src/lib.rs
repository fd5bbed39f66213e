//! Timing adapters around vendor clients.
//!
//! Each adapter implements the same trait as the client it wraps, so the
//! conversational session cannot tell them apart:
//!
//! | Client trait | Adapter | Records |
//! |---|---|---|
//! | [`LanguageModel`] | [`MeteredLlm`] | ttft, token estimates, total time |
//! | [`SpeechSynthesizer`] | [`MeteredTts`] | ttfb, estimated audio length |
//! | [`SpeechRecognizer`] | [`MeteredStt`] | processing time, transcript length |
//!
//! Instrumentation never fails a request. Vendor errors pass through
//! untouched and produce no metric; an adapter built without a collector,
//! or whose metric kind is disabled, forwards calls as-is.
//!
//! [`EouTimer`] covers end-of-utterance delay, which has no vendor client.

mod chunk;
mod estimate;
mod llm;
mod observer;
mod stream;
mod stt;
mod tts;

pub use chunk::{ChatMessage, ChunkText, CompletionChunk, Prompt};
pub use estimate::{estimate_asr_audio, estimate_tokens, estimate_tts_audio, Estimators};
pub use llm::{LanguageModel, LlmResponse, MeteredLlm};
pub use observer::{AsrObserver, EouTimer, LlmObserver, MetricObserver, TtsObserver};
pub use stream::{ChunkStream, ObservedStream};
pub use stt::{MeteredStt, SpeechRecognizer};
pub use tts::{MeteredTts, SpeechSynthesizer};

#[cfg(test)]
mod tests;
