use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The fixed set of languages a user can translate between.
///
/// The display name is the persisted and wire form. Names are kept exactly as
/// existing databases store them (`English` capitalised, the rest lowercase).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "English", alias = "en")]
    English,
    #[serde(rename = "hindi", alias = "hi")]
    Hindi,
    #[serde(rename = "telugu", alias = "te")]
    Telugu,
    #[serde(rename = "tamil", alias = "ta")]
    Tamil,
    #[serde(rename = "kannada", alias = "kn")]
    Kannada,
    #[serde(rename = "malayalam", alias = "ml")]
    Malayalam,
    #[serde(rename = "marathi", alias = "mr")]
    Marathi,
    #[serde(rename = "bengali", alias = "bn")]
    Bengali,
    #[serde(rename = "gujarati", alias = "gu")]
    Gujarati,
    #[serde(rename = "punjabi", alias = "pa")]
    Punjabi,
    #[serde(rename = "urdu", alias = "ur")]
    Urdu,
    #[serde(rename = "spanish", alias = "es")]
    Spanish,
    #[serde(rename = "french", alias = "fr")]
    French,
    #[serde(rename = "german", alias = "de")]
    German,
    #[serde(rename = "chinese", alias = "zh-cn")]
    Chinese,
}

impl Language {
    pub const ALL: [Language; 15] = [
        Language::English,
        Language::Hindi,
        Language::Telugu,
        Language::Tamil,
        Language::Kannada,
        Language::Malayalam,
        Language::Marathi,
        Language::Bengali,
        Language::Gujarati,
        Language::Punjabi,
        Language::Urdu,
        Language::Spanish,
        Language::French,
        Language::German,
        Language::Chinese,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hindi => "hindi",
            Language::Telugu => "telugu",
            Language::Tamil => "tamil",
            Language::Kannada => "kannada",
            Language::Malayalam => "malayalam",
            Language::Marathi => "marathi",
            Language::Bengali => "bengali",
            Language::Gujarati => "gujarati",
            Language::Punjabi => "punjabi",
            Language::Urdu => "urdu",
            Language::Spanish => "spanish",
            Language::French => "french",
            Language::German => "german",
            Language::Chinese => "chinese",
        }
    }

    /// Language code understood by the upstream translation service.
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Hindi => "hi",
            Language::Telugu => "te",
            Language::Tamil => "ta",
            Language::Kannada => "kn",
            Language::Malayalam => "ml",
            Language::Marathi => "mr",
            Language::Bengali => "bn",
            Language::Gujarati => "gu",
            Language::Punjabi => "pa",
            Language::Urdu => "ur",
            Language::Spanish => "es",
            Language::French => "fr",
            Language::German => "de",
            Language::Chinese => "zh-cn",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLanguage(pub String);

impl fmt::Display for UnknownLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported language: {}", self.0)
    }
}

impl std::error::Error for UnknownLanguage {}

impl FromStr for Language {
    type Err = UnknownLanguage;

    /// Accepts the exact display name or the language code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|lang| lang.name() == s || lang.code() == s)
            .ok_or_else(|| UnknownLanguage(s.to_string()))
    }
}
