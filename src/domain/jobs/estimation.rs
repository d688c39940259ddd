use crate::domain::tts::ValidationError;
use parking_lot::Mutex;
use serde::Serialize;

/// Seconds per character assumed before any generation has been observed
pub const DEFAULT_SECONDS_PER_CHAR: f64 = 0.1;
/// Seconds per word assumed before any generation has been observed
pub const DEFAULT_SECONDS_PER_WORD: f64 = 0.5;

const CHAR_WEIGHT: f64 = 0.7;
const WORD_WEIGHT: f64 = 0.3;

/// One observed successful generation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimationSample {
    pub char_count: usize,
    pub word_count: usize,
    pub duration_secs: f64,
}

/// Response for POST /tts/estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Estimate {
    pub estimated_seconds: f64,
    pub char_count: usize,
    pub word_count: usize,
}

#[derive(Debug, Default)]
struct Totals {
    chars: u64,
    words: u64,
    duration_secs: f64,
    samples: u64,
}

/// Approximate generation-time predictor fitted online.
///
/// Keeps running totals of characters, words and seconds over successful
/// generations and blends the per-character and per-word rates 70/30. The
/// result is a rough UX hint, not a calibrated model; with no data it is
/// simply `chars * 0.1` seconds.
#[derive(Debug, Default)]
pub struct EstimationModel {
    totals: Mutex<Totals>,
}

impl EstimationModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, sample: EstimationSample) {
        let mut totals = self.totals.lock();
        totals.chars += sample.char_count as u64;
        totals.words += sample.word_count as u64;
        totals.duration_secs += sample.duration_secs.max(0.0);
        totals.samples += 1;
    }

    pub fn sample_count(&self) -> u64 {
        self.totals.lock().samples
    }

    pub fn estimate_counts(&self, char_count: usize, word_count: usize) -> f64 {
        let totals = self.totals.lock();
        if totals.samples == 0 {
            return char_count as f64 * DEFAULT_SECONDS_PER_CHAR;
        }

        let per_char = if totals.chars == 0 {
            DEFAULT_SECONDS_PER_CHAR
        } else {
            totals.duration_secs / totals.chars as f64
        };
        let per_word = if totals.words == 0 {
            DEFAULT_SECONDS_PER_WORD
        } else {
            totals.duration_secs / totals.words as f64
        };

        CHAR_WEIGHT * (char_count as f64 * per_char) + WORD_WEIGHT * (word_count as f64 * per_word)
    }

    /// Estimate for raw text; blank text is rejected.
    pub fn estimate(&self, text: &str) -> Result<Estimate, ValidationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyText);
        }

        let char_count = text.chars().count();
        let word_count = text.split_whitespace().count();

        Ok(Estimate {
            estimated_seconds: self.estimate_counts(char_count, word_count),
            char_count,
            word_count,
        })
    }
}
