//! Validated pronunciation requests.

use crate::errors::ValidationError;
use crate::voice::{Accent, Gender, Speed, VoiceTable};

/// Longest word accepted, in characters.
pub const MAX_WORD_CHARS: usize = 100;

/// A normalized request: trimmed, case-folded word and a validated accent.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PronunciationRequest {
    /// Trimmed, lowercased word.
    pub word: String,
    /// Accent present in the voice table.
    pub accent: Accent,
    /// Voice gender.
    pub gender: Gender,
    /// Speaking speed.
    pub speed: Speed,
}

impl PronunciationRequest {
    /// Validate raw wire fields, applying defaults for the optional ones.
    ///
    /// Defaults: accent `en-US`, male voice, normal speed.
    pub fn parse(
        word: Option<&str>,
        accent: Option<&str>,
        is_male: Option<bool>,
        speed: Option<&str>,
        voices: &VoiceTable,
    ) -> Result<Self, ValidationError> {
        let word = normalize_word(word.unwrap_or_default())?;
        let accent = voices.resolve_accent(accent.unwrap_or(VoiceTable::DEFAULT_ACCENT))?;
        let speed = match speed {
            Some(s) => s.parse()?,
            None => Speed::default(),
        };
        Ok(Self {
            word,
            accent,
            gender: Gender::from_is_male(is_male.unwrap_or(true)),
            speed,
        })
    }

    /// Deterministic composite key over every identity field.
    pub fn cache_key(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.word, self.accent, self.gender, self.speed
        )
    }

    /// First letter of the word when it is `a..=z`.
    pub fn shard_letter(&self) -> Option<char> {
        shard_letter(&self.word)
    }
}

/// Trim and case-fold a word, rejecting empty or oversized input.
pub fn normalize_word(raw: &str) -> Result<String, ValidationError> {
    let word = raw.trim().to_lowercase();
    if word.is_empty() {
        return Err(ValidationError::MissingWord);
    }
    let chars = word.chars().count();
    if chars > MAX_WORD_CHARS {
        return Err(ValidationError::WordTooLong {
            max: MAX_WORD_CHARS,
            actual: chars,
        });
    }
    Ok(word)
}

/// First letter of `word` when it is an ASCII lowercase letter.
pub fn shard_letter(word: &str) -> Option<char> {
    word.chars().next().filter(char::is_ascii_lowercase)
}
