//! Encoding trees (and serde types) into querystrings.

mod encode;
mod value;

use self::encode::encode as percent_encode;
pub use value::ValueSerializer;

use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::ser;
use tracing::trace;

use crate::error::{Error, Result};
use crate::value::Value;

use std::io::Write;

/// Encodes a tree into a querystring.
///
/// The top level must be a map or a sequence; anything else fails with
/// [`Error::TypeInvalid`].
///
/// ```
/// use nested_qs::Value;
///
/// let value: Value = [(
///     "foo",
///     Value::from(vec![
///         Value::from("bar"),
///         Value::from(vec![Value::from("baz"), [("a", "b")].into_iter().collect()]),
///     ]),
/// )]
/// .into_iter()
/// .collect();
///
/// assert_eq!(
///     nested_qs::encode(&value).unwrap(),
///     "foo%5B0%5D=bar&foo%5B1%5D%5B0%5D=baz&foo%5B1%5D%5B1%5D.a=b"
/// );
/// assert!(nested_qs::encode(&Value::from("not an object")).is_err());
/// ```
pub fn encode(input: &Value) -> Result<String> {
    crate::Config::default().encode_value(input)
}

/// Serializes a value into a querystring.
///
/// ```
/// # use serde::Serialize;
/// #[derive(Serialize)]
/// struct Query {
///     name: String,
///     age: u8,
///     occupation: String,
/// }
///
/// let q = Query {
///     name: "Alice".to_owned(),
///     age: 24,
///     occupation: "Student".to_owned(),
/// };
///
/// assert_eq!(
///     nested_qs::to_string(&q).unwrap(),
///     "name=Alice&age=24&occupation=Student"
/// );
/// ```
pub fn to_string<T: ser::Serialize + ?Sized>(input: &T) -> Result<String> {
    crate::Config::default().serialize_string(input)
}

/// Serializes a value into a generic writer object.
pub fn to_writer<T: ser::Serialize + ?Sized, W: Write>(input: &T, writer: &mut W) -> Result<()> {
    let config = crate::Config::default();
    config.encode_to_writer(&to_value(input)?, writer)
}

/// Converts any `Serialize` type into a tree.
pub fn to_value<T: ser::Serialize + ?Sized>(input: &T) -> Result<Value> {
    input.serialize(ValueSerializer)
}

/// Flattens a tree into percent-encoded `key=value` pairs.
///
/// The key path grows as the walk descends: a sequence element appends
/// `[i]`, a map entry appends `.key` (or just `key` at the top level).
/// Pairs are collected before writing so a key path produced twice keeps
/// its first position and its last value.
pub(crate) struct QueryWriter {
    config: crate::Config,
    key_path: String,
    pairs: IndexMap<String, String>,
}

impl QueryWriter {
    pub fn new(config: crate::Config) -> Self {
        QueryWriter {
            config,
            key_path: String::with_capacity(32),
            pairs: IndexMap::new(),
        }
    }

    pub fn write<W: Write>(mut self, input: &Value, writer: &mut W) -> Result<()> {
        if !matches!(input, Value::Map(_) | Value::Sequence(_)) {
            return Err(Error::TypeInvalid);
        }
        self.collect(input);

        let mut first_kv = true;
        for (key, value) in &self.pairs {
            if first_kv {
                first_kv = false;
            } else {
                writer.write_all(b"&")?;
            }
            writer.write_all(key.as_bytes())?;
            writer.write_all(b"=")?;
            writer.write_all(value.as_bytes())?;
        }
        Ok(())
    }

    fn collect(&mut self, value: &Value) {
        match value {
            Value::Sequence(seq) => {
                let mut buffer = itoa::Buffer::new();
                for (idx, element) in seq.iter().enumerate() {
                    let len = self.key_path.len();
                    self.key_path.push('[');
                    self.key_path.push_str(buffer.format(idx));
                    self.key_path.push(']');
                    self.collect(element);
                    self.key_path.truncate(len);
                }
            }
            Value::Map(map) => {
                for (key, element) in map {
                    let len = self.key_path.len();
                    if !self.key_path.is_empty() && !key.is_empty() {
                        self.key_path.push('.');
                    }
                    self.key_path.push_str(key);
                    self.collect(element);
                    self.key_path.truncate(len);
                }
            }
            Value::String(s) => self.record(s),
            Value::Null => self.record(""),
        }
    }

    fn record(&mut self, value: &str) {
        let use_form_encoding = self.config.use_form_encoding;
        let key = percent_encode(&self.key_path, use_form_encoding).into_owned();
        let value = percent_encode(value, use_form_encoding).into_owned();
        match self.pairs.entry(key) {
            Entry::Occupied(mut o) => {
                trace!(key = o.key().as_str(), "key path produced twice, keeping the last value");
                o.insert(value);
            }
            Entry::Vacant(v) => {
                v.insert(value);
            }
        }
    }
}
