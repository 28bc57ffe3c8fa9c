//! Accents, voices, speaking rates, and the voice table.
//!
//! The [`VoiceTable`] is built once at startup and shared read-only. It is
//! the single authority on which accents exist: an [`Accent`] value can only
//! be obtained through [`VoiceTable::resolve_accent`], so holding one proves
//! the tag was validated.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

// ─────────────────────────────────────────────────────────────────────────────
// Region
// ─────────────────────────────────────────────────────────────────────────────

/// Regional column of the phonetic dataset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Region {
    /// American transcriptions.
    #[serde(rename = "US")]
    Us,
    /// British transcriptions.
    #[serde(rename = "UK")]
    Uk,
}

impl Region {
    /// Fallback order used when the preferred region has no transcription.
    pub const ALL: [Region; 2] = [Region::Us, Region::Uk];

    /// Column label as it appears in the dataset.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Us => "US",
            Self::Uk => "UK",
        }
    }

    /// Parse a dataset column label, case-insensitively.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_uppercase().as_str() {
            "US" => Some(Self::Us),
            "UK" | "GB" => Some(Self::Uk),
            _ => None,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Gender / Speed
// ─────────────────────────────────────────────────────────────────────────────

/// Voice gender.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    /// Male voice.
    Male,
    /// Female voice.
    Female,
}

impl Gender {
    /// Map the wire-level `isMale` flag.
    pub fn from_is_male(is_male: bool) -> Self {
        if is_male { Self::Male } else { Self::Female }
    }

    /// Lowercase label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested speaking speed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speed {
    /// 0.6x.
    Slow,
    /// 0.9x.
    #[default]
    Normal,
    /// 1.2x.
    Fast,
}

impl Speed {
    /// Speaking-rate multiplier passed to the synthesizer.
    pub fn speaking_rate(self) -> f64 {
        match self {
            Self::Slow => 0.6,
            Self::Normal => 0.9,
            Self::Fast => 1.2,
        }
    }

    /// Lowercase label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Slow => "slow",
            Self::Normal => "normal",
            Self::Fast => "fast",
        }
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Speed {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "slow" => Ok(Self::Slow),
            "normal" => Ok(Self::Normal),
            "fast" => Ok(Self::Fast),
            _ => Err(ValidationError::UnsupportedSpeed(s.to_string())),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Voice profiles
// ─────────────────────────────────────────────────────────────────────────────

/// Voices and phonetic region for one accent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceProfile {
    /// Locale tag, e.g. `en-GB`.
    pub accent: String,
    /// Synthesizer voice id used when `isMale` is true.
    pub male_voice: String,
    /// Synthesizer voice id used when `isMale` is false.
    pub female_voice: String,
    /// Which column of the phonetic dataset this accent reads first.
    pub region: Region,
}

impl VoiceProfile {
    fn new(accent: &str, male_voice: &str, female_voice: &str, region: Region) -> Self {
        Self {
            accent: accent.into(),
            male_voice: male_voice.into(),
            female_voice: female_voice.into(),
            region,
        }
    }

    /// Voice id for the given gender.
    pub fn voice_for(&self, gender: Gender) -> &str {
        match gender {
            Gender::Male => &self.male_voice,
            Gender::Female => &self.female_voice,
        }
    }
}

/// A validated accent tag, in the canonical casing of the voice table.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Accent(String);

impl Accent {
    /// Canonical tag, e.g. `en-US`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Accent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Immutable accent → voice mapping.
#[derive(Clone, Debug)]
pub struct VoiceTable {
    // Keyed by lowercase tag for case-insensitive lookup.
    profiles: BTreeMap<String, VoiceProfile>,
}

impl VoiceTable {
    /// Accent used when a request omits one.
    pub const DEFAULT_ACCENT: &'static str = "en-US";

    /// Build a table from profiles. Later duplicates replace earlier ones.
    pub fn from_profiles(profiles: impl IntoIterator<Item = VoiceProfile>) -> Self {
        let profiles = profiles
            .into_iter()
            .map(|p| (p.accent.to_ascii_lowercase(), p))
            .collect();
        Self { profiles }
    }

    /// Compiled-in profiles: Neural2 voices for the four supported English accents.
    pub fn default_profiles() -> Vec<VoiceProfile> {
        vec![
            VoiceProfile::new("en-US", "en-US-Neural2-D", "en-US-Neural2-F", Region::Us),
            VoiceProfile::new("en-GB", "en-GB-Neural2-B", "en-GB-Neural2-A", Region::Uk),
            VoiceProfile::new("en-AU", "en-AU-Neural2-B", "en-AU-Neural2-A", Region::Us),
            VoiceProfile::new("en-IN", "en-IN-Neural2-B", "en-IN-Neural2-A", Region::Uk),
        ]
    }

    /// Validate an accent tag against the table.
    pub fn resolve_accent(&self, tag: &str) -> Result<Accent, ValidationError> {
        self.profiles
            .get(&tag.trim().to_ascii_lowercase())
            .map(|p| Accent(p.accent.clone()))
            .ok_or_else(|| ValidationError::UnsupportedAccent {
                accent: tag.to_string(),
                supported: self.accents(),
            })
    }

    /// Profile for a validated accent.
    ///
    /// Always `Some` for accents obtained from this table.
    pub fn profile(&self, accent: &Accent) -> Option<&VoiceProfile> {
        self.profiles.get(&accent.0.to_ascii_lowercase())
    }

    /// Phonetic region for an accent, defaulting to US.
    pub fn region_for(&self, accent: &Accent) -> Region {
        self.profile(accent).map_or(Region::Us, |p| p.region)
    }

    /// Supported accent tags in canonical casing, sorted.
    pub fn accents(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.profiles.values().map(|p| p.accent.clone()).collect();
        tags.sort();
        tags
    }

    /// Number of accents.
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Whether the table has no accents.
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl Default for VoiceTable {
    fn default() -> Self {
        Self::from_profiles(Self::default_profiles())
    }
}
