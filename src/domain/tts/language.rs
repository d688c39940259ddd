use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Predefined speakers understood by the CustomVoice models
pub const SPEAKERS: &[&str] = &[
    "Aiden", "Dylan", "Eric", "Ono_anna", "Ryan", "Serena", "Sohee", "Uncle_fu", "Vivian",
];

/// Languages accepted by every generation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    Auto,
    Chinese,
    English,
    Japanese,
    Korean,
    French,
    German,
    Spanish,
    Portuguese,
    Russian,
}

impl Language {
    pub const ALL: [Language; 10] = [
        Language::Auto,
        Language::Chinese,
        Language::English,
        Language::Japanese,
        Language::Korean,
        Language::French,
        Language::German,
        Language::Spanish,
        Language::Portuguese,
        Language::Russian,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Auto => "Auto",
            Language::Chinese => "Chinese",
            Language::English => "English",
            Language::Japanese => "Japanese",
            Language::Korean => "Korean",
            Language::French => "French",
            Language::German => "German",
            Language::Spanish => "Spanish",
            Language::Portuguese => "Portuguese",
            Language::Russian => "Russian",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Language {
    type Err = ();

    /// Case-insensitive match on the language name
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|language| language.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or(())
    }
}

/// Model checkpoint size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelSize {
    #[serde(rename = "0.6B")]
    Small,
    #[serde(rename = "1.7B")]
    Large,
}

impl ModelSize {
    pub const ALL: [ModelSize; 2] = [ModelSize::Small, ModelSize::Large];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelSize::Small => "0.6B",
            ModelSize::Large => "1.7B",
        }
    }

    /// The other checkpoint size, used when falling back between backends
    pub fn other(&self) -> ModelSize {
        match self {
            ModelSize::Small => ModelSize::Large,
            ModelSize::Large => ModelSize::Small,
        }
    }
}

impl fmt::Display for ModelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ModelSize {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "0.6B" => Ok(ModelSize::Small),
            "1.7B" => Ok(ModelSize::Large),
            _ => Err(()),
        }
    }
}

/// What kind of generation a request asks for. Each mode is served by its
/// own family of model checkpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    VoiceDesign,
    VoiceClone,
    CustomVoice,
}

impl GenerationMode {
    pub const ALL: [GenerationMode; 3] = [
        GenerationMode::VoiceDesign,
        GenerationMode::VoiceClone,
        GenerationMode::CustomVoice,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationMode::VoiceDesign => "voice_design",
            GenerationMode::VoiceClone => "voice_clone",
            GenerationMode::CustomVoice => "custom_voice",
        }
    }

    /// Checkpoint sizes published for this mode. Voice design only ships as 1.7B.
    pub fn supported_sizes(&self) -> &'static [ModelSize] {
        match self {
            GenerationMode::VoiceDesign => &[ModelSize::Large],
            GenerationMode::VoiceClone | GenerationMode::CustomVoice => &ModelSize::ALL,
        }
    }

    /// Language used when the request does not name one
    pub fn default_language(&self) -> Language {
        match self {
            GenerationMode::CustomVoice => Language::English,
            GenerationMode::VoiceDesign | GenerationMode::VoiceClone => Language::Auto,
        }
    }

    /// Suggested download filename for generated audio
    pub fn filename(&self) -> String {
        format!("{}.wav", self.as_str())
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for GenerationMode {
    type Err = ();

    /// Accepts both `voice_design` and `voice-design` spellings
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        GenerationMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or(())
    }
}

/// Resolve a speaker name to its canonical spelling, ignoring case and
/// treating spaces as underscores.
pub fn canonical_speaker(name: &str) -> Option<&'static str> {
    let normalized = name.trim().replace(' ', "_");
    SPEAKERS
        .iter()
        .copied()
        .find(|speaker| speaker.eq_ignore_ascii_case(&normalized))
}
