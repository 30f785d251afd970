//! Domain types for script routing.
//!
//! This module holds the static routing tables the pipeline consults:
//!
//! - [`ScriptLabel`] and [`LanguageSpec`] - writing systems and the recognition
//!   language sets loaded for them
//! - [`detect_language_code`] - UI language code for already-extracted text
//! - [`LANGUAGES`] - the catalog of user-selectable languages

pub mod languages;
pub mod script;
pub mod text_language;

pub use languages::{
    LANGUAGES, Language, OCR_LANGUAGE_PACKS, Region, language_by_code, language_name,
    language_spec_for_code, languages_by_region, search_languages,
};
pub use script::{
    DEFAULT_LANGUAGE_PACK, LanguageSpec, LanguageSpecError, ScriptLabel, language_spec_for_script,
};
pub use text_language::{DEFAULT_LANGUAGE_CODE, detect_language_code};
