//! Decoding querystrings into trees, and trees into typed values.
//!
//! ### An overview of the design
//!
//! Decoding happens in two independent steps. The `parse` module splits a
//! querystring into `key=value` pairs, percent-decodes both halves, and
//! folds each pair into a `Map` by walking the key path (`a.b[0].c`) one
//! segment at a time. This step never fails: input that does not follow
//! the bracket/dot grammar still produces a best-effort tree.
//!
//! The second, optional step treats the resulting `Value` as a serde
//! `Deserializer`. Leaves are always strings, so when the target type asks
//! for a number or a boolean the leaf is parsed on demand by
//! `StringParsingDeserializer`.

mod decode;
pub(crate) mod parse;
mod string_parser;

pub use parse::segment_suggests_sequence;

use serde::de::{self, Deserializer as _, IntoDeserializer};

use crate::error::{Error, Result};
use crate::value::{Map, Value};

use string_parser::StringParsingDeserializer;

/// Decodes a querystring into a tree.
///
/// A leading URL, up to and including the first `?`, is skipped. Decoding
/// never fails; see the crate documentation for how malformed keys are
/// handled.
///
/// ```
/// use nested_qs::Value;
///
/// let map = nested_qs::decode("foo[0].a=1&foo[1].b=2&baz=3");
/// assert_eq!(
///     Value::Map(map),
///     [
///         (
///             "foo",
///             Value::from(vec![
///                 [("a", "1")].into_iter().collect::<Value>(),
///                 [("b", "2")].into_iter().collect::<Value>(),
///             ]),
///         ),
///         ("baz", Value::from("3")),
///     ]
///     .into_iter()
///     .collect::<Value>()
/// );
/// ```
pub fn decode(input: &str) -> Map {
    crate::Config::default().decode_str(input)
}

/// Folds a single already-decoded `path=value` pair into `tree`.
///
/// This is the step `decode` applies to every pair, without any depth
/// limit. A bracketed path appends to sequences regardless of the index it
/// names.
///
/// ```
/// use nested_qs::{Map, Value};
///
/// let mut tree = Map::new();
/// nested_qs::assign_path(&mut tree, "foo[5]", "x");
/// assert_eq!(tree["foo"], Value::from(vec!["x"]));
/// ```
pub fn assign_path(tree: &mut Map, path: &str, value: impl Into<String>) {
    parse::assign(tree, path, value.into(), usize::MAX, &mut parse::SequenceMarks::default());
}

/// Deserializes a querystring from a `&str`.
///
/// ```
/// # use serde::Deserialize;
/// #[derive(Debug, Deserialize, PartialEq)]
/// struct Query {
///     name: String,
///     age: u8,
///     tags: Vec<String>,
/// }
///
/// assert_eq!(
///     nested_qs::from_str::<Query>("name=Alice&age=24&tags[0]=a&tags[1]=b").unwrap(),
///     Query {
///         name: "Alice".to_owned(),
///         age: 24,
///         tags: vec!["a".to_owned(), "b".to_owned()],
///     }
/// );
/// ```
pub fn from_str<T: de::DeserializeOwned>(input: &str) -> Result<T> {
    crate::Config::default().deserialize_str(input)
}

/// Deserializes a decoded map.
pub fn from_map<T: de::DeserializeOwned>(map: Map) -> Result<T> {
    from_value(Value::Map(map))
}

/// Deserializes any tree.
pub fn from_value<T: de::DeserializeOwned>(value: Value) -> Result<T> {
    T::deserialize(value)
}

macro_rules! deserialize_primitive {
    ($($method:ident,)*) => {
        $(
            fn $method<V>(self, visitor: V) -> Result<V::Value>
            where
                V: de::Visitor<'de>,
            {
                match self {
                    Value::String(s) => StringParsingDeserializer::new(s).$method(visitor),
                    other => Err(other.invalid_type(&visitor)),
                }
            }
        )*
    };
}

impl Value {
    fn invalid_type(&self, exp: &dyn de::Expected) -> Error {
        let unexpected = match self {
            Value::Null => de::Unexpected::Unit,
            Value::String(s) => de::Unexpected::Str(s),
            Value::Sequence(_) => de::Unexpected::Seq,
            Value::Map(_) => de::Unexpected::Map,
        };
        de::Error::invalid_type(unexpected, exp)
    }

    fn is_empty_scalar(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            _ => false,
        }
    }
}

impl<'de> de::Deserializer<'de> for Value {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self {
            Value::Null => visitor.visit_unit(),
            Value::String(s) => visitor.visit_string(s),
            Value::Sequence(seq) => visitor.visit_seq(SeqDeserializer(seq.into_iter())),
            Value::Map(map) => visitor.visit_map(MapDeserializer::new(map)),
        }
    }

    /// An empty string and `Null` are both `None`.
    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        if self.is_empty_scalar() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        if self.is_empty_scalar() {
            visitor.visit_unit()
        } else {
            Err(self.invalid_type(&visitor))
        }
    }

    fn deserialize_unit_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_unit(visitor)
    }

    /// A map deserializes as the sequence of its values, and a single
    /// scalar as a one-element sequence.
    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self {
            Value::Sequence(seq) => visitor.visit_seq(SeqDeserializer(seq.into_iter())),
            Value::Map(map) => visitor.visit_seq(SeqDeserializer(
                map.into_values().collect::<Vec<_>>().into_iter(),
            )),
            Value::Null => visitor.visit_seq(SeqDeserializer(Vec::new().into_iter())),
            scalar => visitor.visit_seq(SeqDeserializer(vec![scalar].into_iter())),
        }
    }

    fn deserialize_tuple<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self {
            Value::Map(map) => visitor.visit_map(MapDeserializer::new(map)),
            Value::Null => visitor.visit_map(MapDeserializer::new(Map::new())),
            other => Err(other.invalid_type(&visitor)),
        }
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_map(visitor)
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    /// A string is a unit variant; a map with a single key is a variant
    /// holding that key's value.
    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self {
            Value::String(s) => visitor.visit_enum(StringParsingDeserializer::<Error>::new(s)),
            Value::Map(map) if map.len() == 1 => {
                let mut entries = map.into_iter();
                match entries.next() {
                    Some((variant, value)) => visitor.visit_enum(VariantDeserializer { variant, value }),
                    None => Err(de::Error::custom("expected a single variant")),
                }
            }
            other => Err(de::Error::custom(format!(
                "expected an enum variant, got {}",
                other.kind()
            ))),
        }
    }

    fn deserialize_bytes<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self {
            Value::String(s) => visitor.visit_byte_buf(s.into_bytes()),
            other => other.deserialize_seq(visitor),
        }
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_unit()
    }

    deserialize_primitive! {
        deserialize_bool,
        deserialize_i8,
        deserialize_i16,
        deserialize_i32,
        deserialize_i64,
        deserialize_i128,
        deserialize_u8,
        deserialize_u16,
        deserialize_u32,
        deserialize_u64,
        deserialize_u128,
        deserialize_f32,
        deserialize_f64,
        deserialize_char,
    }

    serde::forward_to_deserialize_any! {
        str string identifier
    }
}

impl IntoDeserializer<'_, Error> for Value {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self::Deserializer {
        self
    }
}

struct SeqDeserializer(std::vec::IntoIter<Value>);

impl<'de> de::SeqAccess<'de> for SeqDeserializer {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.0.next() {
            Some(value) => seed.deserialize(value).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.0.len())
    }
}

struct MapDeserializer {
    iter: indexmap::map::IntoIter<String, Value>,
    value: Option<Value>,
}

impl MapDeserializer {
    fn new(map: Map) -> Self {
        MapDeserializer {
            iter: map.into_iter(),
            value: None,
        }
    }
}

impl<'de> de::MapAccess<'de> for MapDeserializer {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(StringParsingDeserializer::new(key)).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(value),
            None => Err(de::Error::custom(
                "value requested before its key was deserialized",
            )),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct VariantDeserializer {
    variant: String,
    value: Value,
}

impl<'de> de::EnumAccess<'de> for VariantDeserializer {
    type Error = Error;
    type Variant = Value;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(StringParsingDeserializer::<Error>::new(self.variant))?;
        Ok((variant, self.value))
    }
}

impl<'de> de::VariantAccess<'de> for Value {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        Ok(())
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        seed.deserialize(self)
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        de::Deserializer::deserialize_seq(self, visitor)
    }

    fn struct_variant<V>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        de::Deserializer::deserialize_map(self, visitor)
    }
}
