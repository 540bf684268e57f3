//! Nested querystrings, to and from trees.
//!
//! Querystrings are not formally defined and loosely take the form of
//! _nested_ urlencoded queries. This crate reads and writes one dialect of
//! them: key paths mix dot notation (`a.b.c`) with bracket notation
//! (`a[0][1]`), values are always strings, and the decoded form is a tree
//! of [`Value`]s.
//!
//! ## Decoding
//!
//! [`decode`] never fails. Each `key=value` pair is percent-decoded and
//! folded into the tree along its key path:
//!
//! - a key containing both `[` and `]` is split at the brackets, and a
//!   segment that is all digits creates a sequence, which is appended to
//!   whenever the index is past its end. The index in `foo[5]` is only a
//!   marker.
//! - any other key is split on `.` and only ever creates maps.
//! - a write that conflicts with what is already in the tree is dropped.
//!
//! ```
//! use nested_qs::Value;
//!
//! let map = nested_qs::decode("https://example.com/?a.b=1&c[0]=x&c[1]=y");
//! assert_eq!(map["a"].get("b"), Some(&Value::from("1")));
//! assert_eq!(map["c"], Value::from(vec!["x", "y"]));
//! ```
//!
//! ## Encoding
//!
//! [`encode`] flattens a map or a sequence back into a querystring,
//! writing sequence indices in brackets and map keys with dots. Both keys
//! and values are percent-encoded the way `encodeURIComponent` does it.
//!
//! ```
//! let map = nested_qs::decode("a.b=1&c[0]=x");
//! let query = nested_qs::encode(&map.into()).unwrap();
//! assert_eq!(query, "a.b=1&c%5B0%5D=x");
//! assert_eq!(nested_qs::decode(&query), nested_qs::decode("a.b=1&c[0]=x"));
//! ```
//!
//! ## Serde
//!
//! Any `Serialize` type can be encoded with [`to_string`], and any
//! `Deserialize` type can be read with [`from_str`]. Leaves are parsed on
//! demand when the target asks for a number or a boolean.
//!
//! ```
//! # use serde::{Deserialize, Serialize};
//! #[derive(Debug, PartialEq, Deserialize, Serialize)]
//! struct Address {
//!     city: String,
//!     postcode: String,
//! }
//! #[derive(Debug, PartialEq, Deserialize, Serialize)]
//! struct QueryParams {
//!     id: u8,
//!     name: String,
//!     address: Address,
//!     phone: u32,
//!     user_ids: Vec<u8>,
//! }
//!
//! let params = QueryParams {
//!     id: 42,
//!     name: "Acme".to_string(),
//!     phone: 12345,
//!     address: Address {
//!         city: "Carrot City".to_string(),
//!         postcode: "12345".to_string(),
//!     },
//!     user_ids: vec![1, 2, 3, 4],
//! };
//! let rec_params: QueryParams = nested_qs::from_str(
//!     "name=Acme&id=42&phone=12345&address.postcode=12345&\
//!      address.city=Carrot%20City&user_ids[0]=1&user_ids[1]=2&\
//!      user_ids[2]=3&user_ids[3]=4",
//! )
//! .unwrap();
//! assert_eq!(rec_params, params);
//!
//! let encoded = nested_qs::to_string(&params).unwrap();
//! assert_eq!(nested_qs::from_str::<QueryParams>(&encoded).unwrap(), params);
//! ```
//!
//! ## Paths
//!
//! The [`path`] module has two small helpers for the other half of a URL:
//! [`basename`] and [`ParamsRoute`], which turns `/user/:id` routes into
//! patterns.

mod config;
mod de;
mod error;
pub mod path;
mod ser;
mod value;

pub use config::Config;
#[doc(inline)]
pub use de::{assign_path, decode, from_map, from_str, from_value, segment_suggests_sequence};
pub use error::{Error, Result};
#[doc(inline)]
pub use path::{basename, ParamsRoute};
#[doc(inline)]
pub use ser::{encode, to_string, to_value, to_writer, ValueSerializer};
pub use value::{Map, Value};
