use serde::{de, ser};
use thiserror::Error;

use std::fmt::Display;
use std::io;

/// Errors raised while encoding a tree or bridging to and from serde.
///
/// Decoding a querystring never fails: malformed input degrades to a
/// best-effort tree instead.
#[derive(Debug, Error)]
pub enum Error {
    /// The top-level input to an encode was a scalar or null.
    #[error("input must be an object or an array")]
    TypeInvalid,

    #[error("{0}")]
    Custom(String),

    #[error("unsupported: {0}")]
    Unsupported(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid route pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl Error {
    /// Generate an error for a serde shape that cannot be expressed in a tree.
    pub fn unsupported(what: &'static str) -> Self {
        Error::Unsupported(what)
    }
}

impl ser::Error for Error {
    fn custom<T>(msg: T) -> Self
    where
        T: Display,
    {
        Error::Custom(msg.to_string())
    }
}

impl de::Error for Error {
    fn custom<T>(msg: T) -> Self
    where
        T: Display,
    {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
