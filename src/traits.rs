//! The parsing trait seam for lingo.

use std::{
    fs::File,
    io::{BufRead, BufReader, Cursor},
    path::Path,
};

use crate::error::Error;

/// A trait for parsing a Lingo document from any source.
///
/// Parse-only: the Lingo format has no serializer, so there is no writing
/// half. File reads go through [`Parse::read_from`]; BOM-aware decoding for
/// store loads lives in [`crate::Localization::load_file`].
///
/// # Example
///
/// ```rust
/// use lingo::traits::Parse;
///
/// let doc = lingo::Document::from_str("greet = \"Hello\"")?;
/// assert!(doc.contains_key("greet"));
/// # Ok::<(), lingo::Error>(())
/// ```
pub trait Parse {
    /// Parse from any reader.
    fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error>
    where
        Self: Sized;

    /// Parse from a file path.
    fn read_from<P: AsRef<Path>>(path: P) -> Result<Self, Error>
    where
        Self: Sized,
    {
        let file = File::open(path).map_err(Error::Io)?;
        let reader = BufReader::new(file);
        Self::from_reader(reader)
    }

    /// Parse from a string.
    fn from_str(s: &str) -> Result<Self, Error>
    where
        Self: Sized,
    {
        Self::from_reader(Cursor::new(s))
    }

    /// Parse from bytes.
    fn from_bytes(bytes: &[u8]) -> Result<Self, Error>
    where
        Self: Sized,
    {
        Self::from_reader(Cursor::new(bytes))
    }
}
