use std::io::Write;

use serde::de;

use crate::error::Result;
use crate::value::{Map, Value};

/// Configuration for decoding and encoding behavior.
///
/// ## Nesting Depth
///
/// Decoding nests as deeply as the keys ask for by default. Setting
/// `max_depth` bounds it: keys addressing deeper than the limit keep their
/// remaining segments as one literal key at the deepest allowed level, so
/// a maliciously deep key cannot build an arbitrarily deep tree. A
/// `max_depth` of 0 means no nesting is built at all (flat key-value pairs
/// only).
///
/// Default value: unbounded (`usize::MAX`)
///
/// ```
/// use nested_qs::{Config, Value};
///
/// let config = Config::new().max_depth(0);
/// let map = config.decode_str("a[b][c]=1");
/// assert_eq!(map["a[b][c]"], Value::from("1"));
///
/// let config = Config::new().max_depth(1);
/// let map = config.decode_str("a[b][c]=1");
/// assert_eq!(map["a"].get("[b][c]"), Some(&Value::from("1")));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    pub(crate) max_depth: usize,
    pub(crate) use_form_encoding: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub const fn new() -> Self {
        Self {
            max_depth: usize::MAX,
            use_form_encoding: cfg!(feature = "default_to_form_encoding"),
        }
    }

    /// Specifies the maximum nesting depth decoding will build.
    /// Unbounded by default.
    pub const fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// By default, keys and values are percent-encoded the way
    /// `encodeURIComponent` does it: a space becomes `%20` and a `+` is
    /// left alone on both sides.
    ///
    /// With form encoding (`application/x-www-form-urlencoded`) a space is
    /// written as `+`, a literal `+` is escaped, and `+` decodes to a space.
    ///
    /// Alternatively, the `default_to_form_encoding` Cargo feature sets
    /// this to `true` by default.
    pub const fn use_form_encoding(mut self, use_form_encoding: bool) -> Self {
        self.use_form_encoding = use_form_encoding;
        self
    }

    /// Decodes a querystring into a tree using this `Config`.
    pub fn decode_str(self, input: &str) -> Map {
        crate::de::parse::parse(input, self)
    }

    /// Encodes a tree into a querystring using this `Config`.
    pub fn encode_value(self, input: &Value) -> Result<String> {
        // initialize the buffer with 128 bytes
        // this is a guess based on what `serde_json` does
        let mut buffer = Vec::with_capacity(128);
        self.encode_to_writer(input, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| crate::Error::Custom(e.to_string()))
    }

    /// Encodes a tree into a querystring written to `writer`.
    pub fn encode_to_writer<W: Write>(self, input: &Value, writer: &mut W) -> Result<()> {
        crate::ser::QueryWriter::new(self).write(input, writer)
    }

    /// Serializes an object to a querystring using this `Config`.
    pub fn serialize_string<T: serde::Serialize + ?Sized>(self, input: &T) -> Result<String> {
        self.encode_value(&crate::ser::to_value(input)?)
    }

    /// Deserializes a querystring from a `&str` using this `Config`.
    pub fn deserialize_str<T: de::DeserializeOwned>(self, input: &str) -> Result<T> {
        crate::de::from_map(self.decode_str(input))
    }
}
