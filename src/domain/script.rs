//! Writing systems and the recognition language sets routed from them.
//!
//! The script table is a total mapping: every label the classifier can produce
//! resolves to a non-empty [`LanguageSpec`], and anything the table does not name
//! resolves to English.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A writing system reported by script detection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ScriptLabel {
    Devanagari,
    Tamil,
    Telugu,
    Kannada,
    Malayalam,
    Bengali,
    Gujarati,
    Gurmukhi,
    Arabic,
    Oriya,
    /// Fallback when detection fails.
    #[default]
    Latin,
    Han,
    Hiragana,
    Hangul,
    Cyrillic,
    /// A script name the routing table has no entry for.
    Other(String),
}

impl ScriptLabel {
    /// Every named script in table order.
    pub const NAMED: [ScriptLabel; 15] = [
        ScriptLabel::Devanagari,
        ScriptLabel::Tamil,
        ScriptLabel::Telugu,
        ScriptLabel::Kannada,
        ScriptLabel::Malayalam,
        ScriptLabel::Bengali,
        ScriptLabel::Gujarati,
        ScriptLabel::Gurmukhi,
        ScriptLabel::Arabic,
        ScriptLabel::Oriya,
        ScriptLabel::Latin,
        ScriptLabel::Han,
        ScriptLabel::Hiragana,
        ScriptLabel::Hangul,
        ScriptLabel::Cyrillic,
    ];

    /// Parses a detector's script name. Unknown names become [`ScriptLabel::Other`].
    ///
    /// Matching is case-insensitive. Tesseract OSD reports Japanese text as
    /// `Japanese` or `Katakana` and Korean as `Korean`; those are folded into
    /// `Hiragana` and `Hangul`.
    pub fn from_name(name: &str) -> Self {
        let trimmed = name.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "devanagari" => ScriptLabel::Devanagari,
            "tamil" => ScriptLabel::Tamil,
            "telugu" => ScriptLabel::Telugu,
            "kannada" => ScriptLabel::Kannada,
            "malayalam" => ScriptLabel::Malayalam,
            "bengali" => ScriptLabel::Bengali,
            "gujarati" => ScriptLabel::Gujarati,
            "gurmukhi" => ScriptLabel::Gurmukhi,
            "arabic" => ScriptLabel::Arabic,
            "oriya" | "odia" => ScriptLabel::Oriya,
            "latin" => ScriptLabel::Latin,
            "han" => ScriptLabel::Han,
            "hiragana" | "katakana" | "japanese" => ScriptLabel::Hiragana,
            "hangul" | "korean" => ScriptLabel::Hangul,
            "cyrillic" => ScriptLabel::Cyrillic,
            _ => ScriptLabel::Other(trimmed.to_string()),
        }
    }

    /// The canonical name of the script.
    pub fn name(&self) -> &str {
        match self {
            ScriptLabel::Devanagari => "Devanagari",
            ScriptLabel::Tamil => "Tamil",
            ScriptLabel::Telugu => "Telugu",
            ScriptLabel::Kannada => "Kannada",
            ScriptLabel::Malayalam => "Malayalam",
            ScriptLabel::Bengali => "Bengali",
            ScriptLabel::Gujarati => "Gujarati",
            ScriptLabel::Gurmukhi => "Gurmukhi",
            ScriptLabel::Arabic => "Arabic",
            ScriptLabel::Oriya => "Oriya",
            ScriptLabel::Latin => "Latin",
            ScriptLabel::Han => "Han",
            ScriptLabel::Hiragana => "Hiragana",
            ScriptLabel::Hangul => "Hangul",
            ScriptLabel::Cyrillic => "Cyrillic",
            ScriptLabel::Other(name) => name,
        }
    }

    /// Recognition language packs to load for text in this script.
    pub fn language_spec(&self) -> LanguageSpec {
        let packs: &[&str] = match self {
            ScriptLabel::Devanagari => &["hin", "mar", "san"],
            ScriptLabel::Tamil => &["tam"],
            ScriptLabel::Telugu => &["tel"],
            ScriptLabel::Kannada => &["kan"],
            ScriptLabel::Malayalam => &["mal"],
            ScriptLabel::Bengali => &["ben"],
            ScriptLabel::Gujarati => &["guj"],
            ScriptLabel::Gurmukhi => &["pan"],
            ScriptLabel::Arabic => &["ara", "urd"],
            ScriptLabel::Oriya => &["ori"],
            ScriptLabel::Latin => &["eng", "spa", "fra", "deu", "ita", "por"],
            ScriptLabel::Han => &["chi_sim", "chi_tra"],
            ScriptLabel::Hiragana => &["jpn"],
            ScriptLabel::Hangul => &["kor"],
            ScriptLabel::Cyrillic => &["rus"],
            ScriptLabel::Other(_) => &[DEFAULT_LANGUAGE_PACK],
        };
        LanguageSpec::from_static(packs)
    }
}

impl fmt::Display for ScriptLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<String> for ScriptLabel {
    fn from(name: String) -> Self {
        ScriptLabel::from_name(&name)
    }
}

impl From<ScriptLabel> for String {
    fn from(label: ScriptLabel) -> Self {
        label.name().to_string()
    }
}

/// Resolves a raw detector label straight to its language set.
pub fn language_spec_for_script(name: &str) -> LanguageSpec {
    ScriptLabel::from_name(name).language_spec()
}

/// Pack used when nothing more specific is known.
pub const DEFAULT_LANGUAGE_PACK: &str = "eng";

/// An ordered, non-empty set of recognition language packs, e.g. `hin+mar+san`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageSpec {
    packs: Vec<String>,
}

/// Error returned when a language set string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid language set '{input}': {reason}")]
pub struct LanguageSpecError {
    input: String,
    reason: &'static str,
}

impl LanguageSpec {
    fn from_static(packs: &[&str]) -> Self {
        Self {
            packs: packs.iter().map(|p| (*p).to_string()).collect(),
        }
    }

    /// The default set, `eng`.
    pub fn english() -> Self {
        Self::from_static(&[DEFAULT_LANGUAGE_PACK])
    }

    /// The packs in order.
    pub fn packs(&self) -> &[String] {
        &self.packs
    }

    /// Whether the set contains `pack`.
    pub fn contains(&self, pack: &str) -> bool {
        self.packs.iter().any(|p| p == pack)
    }
}

impl FromStr for LanguageSpec {
    type Err = LanguageSpecError;

    /// Parses `+`-separated pack names. Duplicates are dropped, keeping the first.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let error = |reason| LanguageSpecError {
            input: s.to_string(),
            reason,
        };
        let mut packs: Vec<String> = Vec::new();
        for pack in s.split('+').map(str::trim) {
            if pack.is_empty() {
                return Err(error("empty pack name"));
            }
            if !pack
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            {
                return Err(error("pack names may only contain letters, digits, '_' and '-'"));
            }
            if !packs.iter().any(|p| p == pack) {
                packs.push(pack.to_string());
            }
        }
        Ok(Self { packs })
    }
}

impl TryFrom<String> for LanguageSpec {
    type Error = LanguageSpecError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LanguageSpec> for String {
    fn from(spec: LanguageSpec) -> Self {
        spec.to_string()
    }
}

impl fmt::Display for LanguageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.packs.join("+"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_named_script_has_a_language_set() {
        for script in ScriptLabel::NAMED.iter() {
            let spec = script.language_spec();
            assert!(!spec.packs().is_empty(), "{script} has no packs");
            assert_eq!(ScriptLabel::from_name(script.name()), *script);
        }
    }

    #[test]
    fn test_table_entries() {
        assert_eq!(ScriptLabel::Devanagari.language_spec().to_string(), "hin+mar+san");
        assert_eq!(ScriptLabel::Arabic.language_spec().to_string(), "ara+urd");
        assert_eq!(
            ScriptLabel::Latin.language_spec().to_string(),
            "eng+spa+fra+deu+ita+por"
        );
        assert_eq!(ScriptLabel::Han.language_spec().to_string(), "chi_sim+chi_tra");
        assert_eq!(ScriptLabel::Gurmukhi.language_spec().to_string(), "pan");
        assert_eq!(ScriptLabel::Cyrillic.language_spec().to_string(), "rus");
    }

    #[test]
    fn test_unknown_script_routes_to_english() {
        let label = ScriptLabel::from_name("Fraktur");
        assert_eq!(label, ScriptLabel::Other("Fraktur".to_string()));
        assert_eq!(label.language_spec(), LanguageSpec::english());
        assert_eq!(language_spec_for_script(""), LanguageSpec::english());
    }

    #[test]
    fn test_from_name_is_case_insensitive_and_folds_aliases() {
        assert_eq!(ScriptLabel::from_name(" latin "), ScriptLabel::Latin);
        assert_eq!(ScriptLabel::from_name("Katakana"), ScriptLabel::Hiragana);
        assert_eq!(ScriptLabel::from_name("Japanese"), ScriptLabel::Hiragana);
        assert_eq!(ScriptLabel::from_name("Korean"), ScriptLabel::Hangul);
    }

    #[test]
    fn test_language_spec_parse() {
        let spec: LanguageSpec = "hin+mar+hin".parse().unwrap();
        assert_eq!(spec.packs(), ["hin", "mar"]);
        assert!(spec.contains("mar"));
        assert_eq!(spec.to_string(), "hin+mar");

        assert!("".parse::<LanguageSpec>().is_err());
        assert!("eng++spa".parse::<LanguageSpec>().is_err());
        assert!("eng;rm -rf".parse::<LanguageSpec>().is_err());
    }

    #[test]
    fn test_language_spec_serde_as_string() {
        let spec: LanguageSpec = serde_json::from_str("\"chi_sim+chi_tra\"").unwrap();
        assert_eq!(spec.packs().len(), 2);
        assert_eq!(serde_json::to_string(&spec).unwrap(), "\"chi_sim+chi_tra\"");
    }
}
