//! Per-language message store and lookup facade.
//!
//! Parsing and resolution are pure; this store is the mutable glue that
//! owns the per-language bundles and the current-language selection. It
//! performs no synchronization of its own: a load mutates the same maps a
//! lookup reads, so callers sharing one store across threads must serialize
//! loads against lookups themselves.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    format,
    resolve::{self, missing_key},
    types::{Message, Metadata, Variables},
};

/// Language selected by a fresh store before any `set_current_language`.
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Messages and settings loaded for one language.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LanguageBundle {
    pub messages: HashMap<String, Message>,
    pub metadata: Metadata,
}

/// The per-language store.
///
/// Language codes are matched case-insensitively and kept normalized to
/// ASCII lowercase internally. Loading the same language again merges new
/// messages over the old ones (keys not re-declared survive) and replaces
/// the metadata wholesale, defaults reapplied for fields the new source
/// omits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Localization {
    languages: HashMap<String, LanguageBundle>,
    current_language: String,
}

impl Default for Localization {
    fn default() -> Self {
        Self::new()
    }
}

impl Localization {
    /// Creates an empty store with [`DEFAULT_LANGUAGE`] selected.
    pub fn new() -> Self {
        Localization {
            languages: HashMap::new(),
            current_language: normalize_language(DEFAULT_LANGUAGE),
        }
    }

    /// The currently selected language code, in normalized form.
    pub fn current_language(&self) -> &str {
        &self.current_language
    }

    /// Selects the language used by [`Localization::get`]. The language
    /// must already be loaded.
    pub fn set_current_language(&mut self, language: &str) -> Result<(), Error> {
        let normalized = normalize_language(language);
        if !self.languages.contains_key(&normalized) {
            return Err(Error::UnknownLanguage(language.to_string()));
        }
        self.current_language = normalized;
        Ok(())
    }

    /// Loads Lingo source for `language` from a file, decoding BOM-aware
    /// (UTF-8 passthrough, UTF-16 with BOM).
    pub fn load_file<P: AsRef<Path>>(&mut self, language: &str, path: P) -> Result<(), Error> {
        let file = File::open(path).map_err(Error::Io)?;
        let mut decoder = encoding_rs_io::DecodeReaderBytesBuilder::new()
            .bom_override(true)
            .build(file);

        let mut source = String::new();
        decoder.read_to_string(&mut source).map_err(Error::Io)?;

        self.load_str(language, &source);
        Ok(())
    }

    /// Parses Lingo source text and merges it into `language`'s bundle.
    pub fn load_str(&mut self, language: &str, source: &str) {
        let document = format::parse(source);
        let bundle = self
            .languages
            .entry(normalize_language(language))
            .or_default();
        bundle.messages.extend(document.messages);
        // last load wins; fields the source omitted are back at defaults
        bundle.metadata = document.metadata;
    }

    /// Resolves `key` in the current language.
    ///
    /// A missing language or key yields the `!key!` placeholder, not an
    /// error; the only error is a `count` variable that cannot be coerced.
    pub fn get(&self, key: &str, variables: &Variables) -> Result<String, Error> {
        self.get_in(&self.current_language, key, variables)
    }

    /// Resolves `key` in an explicit language.
    pub fn get_in(
        &self,
        language: &str,
        key: &str,
        variables: &Variables,
    ) -> Result<String, Error> {
        match self.languages.get(&normalize_language(language)) {
            Some(bundle) => resolve::resolve(&bundle.messages, key, variables),
            None => Ok(missing_key(key)),
        }
    }

    /// Iterates the keys loaded for `language`, or for the current language
    /// when `None`. Unknown languages yield nothing.
    pub fn keys(&self, language: Option<&str>) -> impl Iterator<Item = &str> {
        let language = normalize_language(language.unwrap_or(&self.current_language));
        self.languages
            .get(&language)
            .map(|bundle| bundle.messages.keys())
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// Iterates the loaded language codes.
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.languages.keys().map(String::as_str)
    }

    /// Loaded metadata for `language`, if any.
    pub fn metadata(&self, language: &str) -> Option<&Metadata> {
        self.languages
            .get(&normalize_language(language))
            .map(|bundle| &bundle.metadata)
    }

    /// The whole loaded bundle for `language`, if any.
    pub fn bundle(&self, language: &str) -> Option<&LanguageBundle> {
        self.languages.get(&normalize_language(language))
    }

    /// Serializes every loaded bundle as JSON.
    pub fn cache_to_writer<W: Write>(&self, mut writer: W) -> Result<(), Error> {
        serde_json::to_writer(&mut writer, &self.languages).map_err(Error::Cache)
    }

    /// Caches the loaded bundles to a JSON file, creating parent
    /// directories as needed.
    pub fn cache_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(Error::Io)?;
        }
        let writer = File::create(path).map_err(Error::Io)?;
        self.cache_to_writer(writer)
    }

    /// Restores a store from a JSON cache written by
    /// [`Localization::cache_to_file`]. The current language resets to the
    /// default.
    pub fn load_from_cache<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let reader = File::open(path).map_err(Error::Io)?;
        let languages: HashMap<String, LanguageBundle> =
            serde_json::from_reader(reader).map_err(Error::Cache)?;
        Ok(Localization {
            languages,
            current_language: normalize_language(DEFAULT_LANGUAGE),
        })
    }
}

fn normalize_language(language: &str) -> String {
    language.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_before_any_load_is_placeholder() {
        let store = Localization::new();
        assert_eq!(
            store.get("greet", &Variables::new()).unwrap(),
            "!greet!"
        );
    }

    #[test]
    fn test_load_str_and_get() {
        let mut store = Localization::new();
        store.load_str("en-US", "greet = \"Hello, {name}!\"");
        let vars = Variables::new().with("name", "Ada");
        assert_eq!(store.get("greet", &vars).unwrap(), "Hello, Ada!");
    }

    #[test]
    fn test_language_codes_case_insensitive() {
        let mut store = Localization::new();
        store.load_str("EN-us", "greet = \"Hi\"");
        assert_eq!(store.get("greet", &Variables::new()).unwrap(), "Hi");
        assert!(store.set_current_language("En-US").is_ok());
    }

    #[test]
    fn test_set_current_language_unknown_errors() {
        let mut store = Localization::new();
        let err = store.set_current_language("tlh").unwrap_err();
        assert!(matches!(err, Error::UnknownLanguage(_)));
    }

    #[test]
    fn test_reload_merges_messages_and_replaces_metadata() {
        let mut store = Localization::new();
        store.load_str(
            "de-DE",
            "@meta { direction = \"rtl\" }\nkeep = \"bleibt\"\nboth = \"alt\"",
        );
        store.load_str("de-DE", "both = \"neu\"\nnew = \"dazu\"");

        store.set_current_language("de-DE").unwrap();
        let vars = Variables::new();
        assert_eq!(store.get("keep", &vars).unwrap(), "bleibt");
        assert_eq!(store.get("both", &vars).unwrap(), "neu");
        assert_eq!(store.get("new", &vars).unwrap(), "dazu");

        // the second load carried no @meta, so the direction is back at its
        // default
        assert_eq!(store.metadata("de-DE").unwrap().direction, "ltr");
    }

    #[test]
    fn test_keys_lists_loaded_language_only() {
        let mut store = Localization::new();
        store.load_str("en-US", "a = \"1\"\nb = \"2\"");
        let mut keys: Vec<&str> = store.keys(None).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(store.keys(Some("fr-FR")).count(), 0);
    }

    #[test]
    fn test_get_in_explicit_language() {
        let mut store = Localization::new();
        store.load_str("fr-FR", "greet = \"Bonjour\"");
        assert_eq!(
            store
                .get_in("fr-FR", "greet", &Variables::new())
                .unwrap(),
            "Bonjour"
        );
        // the current language is untouched
        assert_eq!(store.get("greet", &Variables::new()).unwrap(), "!greet!");
    }
}
