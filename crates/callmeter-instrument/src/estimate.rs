//! Size estimators for quantities vendors do not report.

/// Pluggable estimation functions used by the observers.
///
/// The defaults are coarse heuristics; swap in a real tokenizer or an
/// audio-length measurement where one is available.
#[derive(Debug, Clone, Copy)]
pub struct Estimators {
    /// Token count of a piece of text.
    pub tokens: fn(&str) -> u64,
    /// Seconds of synthesized audio for a text of the given character count.
    pub tts_audio: fn(usize) -> f64,
    /// Seconds of audio consumed by a recognition that took the given
    /// processing time.
    pub asr_audio: fn(f64) -> f64,
}

impl Default for Estimators {
    fn default() -> Self {
        Self {
            tokens: estimate_tokens,
            tts_audio: estimate_tts_audio,
            asr_audio: estimate_asr_audio,
        }
    }
}

/// `floor(words × 1.3)` with words split on whitespace.
pub fn estimate_tokens(text: &str) -> u64 {
    let words = text.split_whitespace().count();
    (words as f64 * 1.3).floor() as u64
}

/// 0.1 s of speech per character.
pub fn estimate_tts_audio(chars: usize) -> f64 {
    chars as f64 * 0.1
}

/// Twice the processing time.
pub fn estimate_asr_audio(processing_time: f64) -> f64 {
    processing_time * 2.0
}
