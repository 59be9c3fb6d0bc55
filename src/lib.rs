#![forbid(unsafe_code)]
//! Parser and resolver for the Lingo line-oriented localization format.
//!
//! Lingo source is a line-oriented DSL with metadata blocks, namespaces,
//! plural and choice blocks, array literals, key inheritance, inline
//! conditionals, and `{name}` variable interpolation:
//!
//! ```text
//! @meta { locale = "en-US" plural_rules = "cardinal" direction = "ltr" }
//! [ui]                              # namespace for the keys below
//! greet = "Hello, {name}!"
//! farewell : greet = "{parent} Bye!"
//! items = plural(count) {
//!     one: "1 item"
//!     other: "{count} items"
//! }
//! pronoun = {gender} -> {
//!     [male] "He"
//!     [female] "She"
//!     *[other] "They"
//! }
//! ```
//!
//! Parsing never fails on content: malformed lines are skipped, unclosed
//! blocks are discarded. Resolution runs a fixed pipeline (inheritance,
//! plural/choice selection, conditionals, interpolation, literal
//! unwrapping) and degrades missing data to the `!key!` placeholder or an
//! empty string.
//!
//! # Quick Start
//!
//! ```rust
//! use lingo::{Localization, Variables};
//!
//! let mut l10n = Localization::new();
//! l10n.load_str(
//!     "en-US",
//!     r#"
//!     greeting = "Hello, {name}!"
//!     items = plural(count) {
//!         one: "1 item"
//!         other: "{count} items"
//!     }
//!     "#,
//! );
//!
//! let vars = Variables::new().with("name", "Ada");
//! assert_eq!(l10n.get("greeting", &vars)?, "Hello, Ada!");
//!
//! let vars = Variables::new().with("count", 5);
//! assert_eq!(l10n.get("items", &vars)?, "5 items");
//! # Ok::<(), lingo::Error>(())
//! ```

pub mod error;
pub mod format;
pub mod resolve;
pub mod store;
pub mod traits;
pub mod types;

// Re-export most used items for easy consumption
pub use crate::{
    error::Error,
    format::parse,
    resolve::{missing_key, resolve},
    store::{DEFAULT_LANGUAGE, LanguageBundle, Localization},
    types::{Document, Message, MessageKind, Metadata, Value, Variables},
};
