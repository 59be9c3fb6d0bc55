//! Core types for lingo.
//! The parser decodes into these; the resolver consumes them.

use std::{
    collections::{BTreeMap, HashMap},
    fmt::Display,
};

use serde::{Deserialize, Serialize};
use unic_langid::LanguageIdentifier;

use crate::error::Error;

/// One localization entry produced by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Fully-qualified key: `namespace.key` when declared under a
    /// `[namespace]` header, bare otherwise. Unique within one parse;
    /// a later duplicate assignment overwrites an earlier one.
    pub key: String,

    /// Which resolution path the entry takes.
    pub kind: MessageKind,

    /// Template with `{name}` placeholders. Empty for plural and choice
    /// entries, which carry their text in `choices`.
    #[serde(skip_serializing_if = "String::is_empty")]
    #[serde(default)]
    pub raw_value: String,

    /// Label → template, populated only for plural and choice entries.
    /// Labels are open strings (`"one"`, `"other"`, `"male"`, ...). The
    /// mapping need not contain `"other"`; a missing branch resolves to `""`.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    #[serde(default)]
    pub choices: BTreeMap<String, String>,

    /// Parent key whose resolved text is spliced into `{parent}`. Not
    /// validated at parse time; a missing parent splices the missing-key
    /// placeholder at resolution.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub inherits_from: Option<String>,

    /// True when a plain value contains `?`. A heuristic flag, not a parse
    /// of the conditional syntax.
    #[serde(default)]
    pub has_conditional: bool,
}

impl Message {
    /// The template for a choice/plural label, if present.
    pub fn choice_text(&self, label: &str) -> Option<&str> {
        self.choices.get(label).map(String::as_str)
    }
}

impl Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Message {{ key: {}, kind: {:?}, value: {} }}",
            self.key, self.kind, self.raw_value
        )
    }
}

/// The mutually-exclusive entry kinds of the Lingo format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Plain,
    Plural,
    Choice,
}

/// Per-language settings from the `@meta` block.
///
/// One instance per language, overwritten wholesale on each load: fields the
/// new source omits fall back to these defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// BCP 47 locale tag (e.g. "en-US").
    pub locale: String,

    /// Plural rule set name. Lingo only implements the binary one/other
    /// choice, whatever this field declares.
    pub plural_rules: String,

    /// Script direction, "ltr" or "rtl".
    pub direction: String,
}

impl Default for Metadata {
    fn default() -> Self {
        Metadata {
            locale: "en-US".to_string(),
            plural_rules: "cardinal".to_string(),
            direction: "ltr".to_string(),
        }
    }
}

impl Metadata {
    /// Parses the locale field as a BCP 47 language identifier, if valid.
    pub fn parse_locale_identifier(&self) -> Option<LanguageIdentifier> {
        self.locale.parse().ok()
    }

    /// Whether the declared script direction is right-to-left.
    pub fn is_rtl(&self) -> bool {
        self.direction.eq_ignore_ascii_case("rtl")
    }
}

/// A variable value passed into resolution.
///
/// A closed union instead of an open dynamic value: each variant has a
/// defined display form (used by interpolation) and a defined integer
/// coercion (used by plural/choice selection and conditionals).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl Value {
    /// Quiet integer coercion: `Int` verbatim, `Bool` as 0/1, `Float` only
    /// when integral, `Str` via an `i64` parse.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Bool(v) => Some(i64::from(*v)),
            Value::Float(v) => (v.is_finite() && v.fract() == 0.0).then(|| *v as i64),
            Value::Str(v) => v.trim().parse().ok(),
        }
    }

    /// Coerces a `count` variable, or returns the one error the resolution
    /// pipeline can produce.
    pub fn as_count(&self) -> Result<i64, Error> {
        self.as_int()
            .ok_or_else(|| Error::invalid_count(self.to_string()))
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Str(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

/// An insertion-ordered variable mapping.
///
/// Interpolation replaces variables in insertion order, so the order of
/// `set` calls is part of the contract; a hash map would not preserve it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Variables {
    entries: Vec<(String, Value)>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a variable. Replacing keeps the original
    /// position, so interpolation order stays stable.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Builder form of [`Variables::set`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }
}

/// Parse result for one source text: the message map plus metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub metadata: Metadata,

    #[serde(skip_serializing_if = "HashMap::is_empty")]
    #[serde(default)]
    pub messages: HashMap<String, Message>,
}

impl Document {
    pub(crate) fn insert(&mut self, message: Message) {
        self.messages.insert(message.key.clone(), message);
    }

    /// Looks up a message by fully-qualified key.
    pub fn get(&self, key: &str) -> Option<&Message> {
        self.messages.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.messages.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.messages.keys().map(String::as_str)
    }
}
