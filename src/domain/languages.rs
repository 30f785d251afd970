//! Catalog of the languages offered for translation and explicit recognition.

use super::script::LanguageSpec;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Grouping used to present languages to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Region {
    India,
    Global,
    Europe,
    Asia,
    #[serde(rename = "Middle East")]
    MiddleEast,
    Africa,
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Region::India => "India",
            Region::Global => "Global",
            Region::Europe => "Europe",
            Region::Asia => "Asia",
            Region::MiddleEast => "Middle East",
            Region::Africa => "Africa",
        };
        f.write_str(name)
    }
}

impl FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "india" => Ok(Region::India),
            "global" => Ok(Region::Global),
            "europe" => Ok(Region::Europe),
            "asia" => Ok(Region::Asia),
            "middleeast" => Ok(Region::MiddleEast),
            "africa" => Ok(Region::Africa),
            _ => Err(format!("unknown region '{s}'")),
        }
    }
}

/// A language users can pick as a translation target or recognition language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Language {
    /// ISO 639-1 code, e.g. `hi`.
    pub code: &'static str,
    /// English name.
    pub name: &'static str,
    /// Name in the language itself.
    pub native_name: &'static str,
    pub region: Region,
    /// Tesseract traineddata name for this language.
    pub tesseract_pack: &'static str,
}

const fn lang(
    code: &'static str,
    name: &'static str,
    native_name: &'static str,
    region: Region,
    tesseract_pack: &'static str,
) -> Language {
    Language {
        code,
        name,
        native_name,
        region,
        tesseract_pack,
    }
}

/// All supported languages, Indian languages first.
pub static LANGUAGES: [Language; 33] = [
    lang("hi", "Hindi", "हिन्दी", Region::India, "hin"),
    lang("ta", "Tamil", "தமிழ்", Region::India, "tam"),
    lang("te", "Telugu", "తెలుగు", Region::India, "tel"),
    lang("kn", "Kannada", "ಕನ್ನಡ", Region::India, "kan"),
    lang("ml", "Malayalam", "മലയാളം", Region::India, "mal"),
    lang("mr", "Marathi", "मराठी", Region::India, "mar"),
    lang("bn", "Bengali", "বাংলা", Region::India, "ben"),
    lang("gu", "Gujarati", "ગુજરાતી", Region::India, "guj"),
    lang("pa", "Punjabi", "ਪੰਜਾਬੀ", Region::India, "pan"),
    lang("ur", "Urdu", "اردو", Region::India, "urd"),
    lang("or", "Odia", "ଓଡ଼ିଆ", Region::India, "ori"),
    lang("as", "Assamese", "অসমীয়া", Region::India, "asm"),
    lang("sa", "Sanskrit", "संस्कृतम्", Region::India, "san"),
    lang("en", "English", "English", Region::Global, "eng"),
    lang("es", "Spanish", "Español", Region::Global, "spa"),
    lang("fr", "French", "Français", Region::Global, "fra"),
    lang("de", "German", "Deutsch", Region::Europe, "deu"),
    lang("zh", "Chinese", "中文", Region::Asia, "chi_sim"),
    lang("ja", "Japanese", "日本語", Region::Asia, "jpn"),
    lang("ko", "Korean", "한국어", Region::Asia, "kor"),
    lang("ar", "Arabic", "العربية", Region::MiddleEast, "ara"),
    lang("ru", "Russian", "Русский", Region::Global, "rus"),
    lang("pt", "Portuguese", "Português", Region::Global, "por"),
    lang("it", "Italian", "Italiano", Region::Europe, "ita"),
    lang("nl", "Dutch", "Nederlands", Region::Europe, "nld"),
    lang("tr", "Turkish", "Türkçe", Region::MiddleEast, "tur"),
    lang("pl", "Polish", "Polski", Region::Europe, "pol"),
    lang("vi", "Vietnamese", "Tiếng Việt", Region::Asia, "vie"),
    lang("th", "Thai", "ไทย", Region::Asia, "tha"),
    lang("id", "Indonesian", "Bahasa Indonesia", Region::Asia, "ind"),
    lang("ms", "Malay", "Bahasa Melayu", Region::Asia, "msa"),
    lang("sw", "Swahili", "Kiswahili", Region::Africa, "swa"),
    // Not in the detection table, but selectable for translation.
    lang("ne", "Nepali", "नेपाली", Region::India, "nep"),
];

/// Tesseract packs offered for explicit recognition.
pub const OCR_LANGUAGE_PACKS: [&str; 22] = [
    "eng", "hin", "tam", "tel", "kan", "mal", "mar", "ben", "guj", "pan", "ori", "asm", "spa",
    "fra", "deu", "chi_sim", "jpn", "kor", "ara", "rus", "por", "ita",
];

/// Looks up a language by its code.
pub fn language_by_code(code: &str) -> Option<&'static Language> {
    LANGUAGES.iter().find(|lang| lang.code == code)
}

/// All languages in a region, in catalog order.
pub fn languages_by_region(region: Region) -> Vec<&'static Language> {
    LANGUAGES
        .iter()
        .filter(|lang| lang.region == region)
        .collect()
}

/// Case-insensitive substring search over name, native name and code.
pub fn search_languages(query: &str) -> Vec<&'static Language> {
    let query = query.to_lowercase();
    LANGUAGES
        .iter()
        .filter(|lang| {
            lang.name.to_lowercase().contains(&query)
                || lang.native_name.to_lowercase().contains(&query)
                || lang.code.to_lowercase().contains(&query)
        })
        .collect()
}

/// English name for a code, falling back to the code itself.
pub fn language_name(code: &str) -> &str {
    language_by_code(code).map_or(code, |lang| lang.name)
}

/// Recognition packs for a UI language code, used when recognition is re-run with
/// an explicit language after text-based detection. Unknown codes map to `eng`.
pub fn language_spec_for_code(code: &str) -> LanguageSpec {
    language_by_code(code)
        .and_then(|lang| lang.tesseract_pack.parse().ok())
        .unwrap_or_else(LanguageSpec::english)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::text_language::detect_language_code;

    #[test]
    fn test_codes_are_unique() {
        for (i, a) in LANGUAGES.iter().enumerate() {
            for b in &LANGUAGES[i + 1..] {
                assert_ne!(a.code, b.code);
            }
        }
    }

    #[test]
    fn test_lookup_by_code() {
        let hindi = language_by_code("hi").unwrap();
        assert_eq!(hindi.name, "Hindi");
        assert_eq!(hindi.region, Region::India);
        assert!(language_by_code("xx").is_none());
        assert_eq!(language_name("xx"), "xx");
        assert_eq!(language_name("ta"), "Tamil");
    }

    #[test]
    fn test_by_region() {
        let africa = languages_by_region(Region::Africa);
        assert_eq!(africa.len(), 1);
        assert_eq!(africa[0].code, "sw");
        assert!(
            languages_by_region(Region::MiddleEast)
                .iter()
                .any(|l| l.code == "ar")
        );
    }

    #[test]
    fn test_search_matches_native_names_and_codes() {
        let hits = search_languages("deutsch");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].code, "de");
        assert!(search_languages("PUNJ").iter().any(|l| l.code == "pa"));
        assert!(search_languages("தமிழ்").iter().any(|l| l.code == "ta"));
    }

    #[test]
    fn test_region_parse() {
        assert_eq!("middle east".parse::<Region>().unwrap(), Region::MiddleEast);
        assert_eq!("Middle-East".parse::<Region>().unwrap(), Region::MiddleEast);
        assert!("mars".parse::<Region>().is_err());
        assert_eq!(Region::MiddleEast.to_string(), "Middle East");
    }

    #[test]
    fn test_every_detected_code_is_in_the_catalog() {
        for sample in ["नमस्ते", "வணக்கம்", "Привет", "สวัสดี", "não", "hello"] {
            let code = detect_language_code(sample);
            assert!(language_by_code(code).is_some(), "{code}");
        }
    }

    #[test]
    fn test_language_spec_for_code() {
        assert_eq!(language_spec_for_code("hi").to_string(), "hin");
        assert_eq!(language_spec_for_code("zh").to_string(), "chi_sim");
        assert_eq!(language_spec_for_code("??"), LanguageSpec::english());
    }
}
