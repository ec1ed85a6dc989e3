use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::UnknownLanguage;

/// Target languages offered in the language select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TargetLanguage {
    #[default]
    #[serde(rename = "or")]
    Odia,
    #[serde(rename = "hi")]
    Hindi,
    #[serde(rename = "bn")]
    Bengali,
    #[serde(rename = "es")]
    Spanish,
    #[serde(rename = "fr")]
    French,
}

impl TargetLanguage {
    pub const ALL: [TargetLanguage; 5] = [
        TargetLanguage::Odia,
        TargetLanguage::Hindi,
        TargetLanguage::Bengali,
        TargetLanguage::Spanish,
        TargetLanguage::French,
    ];

    /// Code sent to the translation service as `target_lang`.
    pub fn code(&self) -> &'static str {
        match self {
            TargetLanguage::Odia => "or",
            TargetLanguage::Hindi => "hi",
            TargetLanguage::Bengali => "bn",
            TargetLanguage::Spanish => "es",
            TargetLanguage::French => "fr",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TargetLanguage::Odia => "Odia (ଓଡ଼ିଆ)",
            TargetLanguage::Hindi => "Hindi (हिंदी)",
            TargetLanguage::Bengali => "Bengali (বাংলা)",
            TargetLanguage::Spanish => "Spanish (Español)",
            TargetLanguage::French => "French (Français)",
        }
    }
}

impl fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for TargetLanguage {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        TargetLanguage::ALL
            .into_iter()
            .find(|lang| lang.code().eq_ignore_ascii_case(code))
            .ok_or_else(|| UnknownLanguage(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_odia() {
        assert_eq!(TargetLanguage::default(), TargetLanguage::Odia);
        assert_eq!(TargetLanguage::default().code(), "or");
    }

    #[test]
    fn parses_known_codes() {
        assert_eq!("hi".parse::<TargetLanguage>(), Ok(TargetLanguage::Hindi));
        assert_eq!(" FR ".parse::<TargetLanguage>(), Ok(TargetLanguage::French));
        let err = "de".parse::<TargetLanguage>().unwrap_err();
        assert_eq!(err, UnknownLanguage("de".into()));
        assert_eq!(err.to_string(), "unknown target language code: de");
    }

    #[test]
    fn serde_uses_codes() {
        let json = serde_json::to_string(&TargetLanguage::Bengali).unwrap();
        assert_eq!(json, "\"bn\"");
        let lang: TargetLanguage = serde_json::from_str("\"es\"").unwrap();
        assert_eq!(lang, TargetLanguage::Spanish);
    }
}
