use std::borrow::Cow;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};

/// The set `encodeURIComponent` escapes: everything except the ASCII
/// alphanumerics and `-`, `_`, `.`, `!`, `~`, `*`, `'`, `(`, `)`.
///
/// This covers every character with a meaning in a querystring
/// (`&`, `=`, `[`, `]`, `?`, `#`, `%`, `+` and space), so a key path is
/// encoded as a whole and the brackets inside it come out as `%5B`/`%5D`.
const URI_COMPONENT_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// As above, but leaves spaces alone so they can be written as `+`.
const FORM_SET: &AsciiSet = &URI_COMPONENT_SET.remove(b' ');

/// Percent-encodes one key path or value.
///
/// With `use_form_encoding` a space is written as `+` (a literal `+` is
/// still escaped, as `%2B`); otherwise it is `%20`.
pub fn encode(input: &str, use_form_encoding: bool) -> Cow<'_, str> {
    if use_form_encoding {
        let encoded: Cow<'_, str> = percent_encoding::utf8_percent_encode(input, FORM_SET).into();
        replace_space(encoded)
    } else {
        percent_encoding::utf8_percent_encode(input, URI_COMPONENT_SET).into()
    }
}

fn replace_space(input: Cow<'_, str>) -> Cow<'_, str> {
    if input.contains(' ') {
        Cow::Owned(input.replace(' ', "+"))
    } else {
        input
    }
}

#[cfg(test)]
mod test {
    use super::encode;

    #[test]
    fn matches_uri_component_encoding() {
        assert_eq!(encode("hello world", false), "hello%20world");
        assert_eq!(encode("foo[1][1].a", false), "foo%5B1%5D%5B1%5D.a");
        assert_eq!(encode("a&b=c?d#e%f+g", false), "a%26b%3Dc%3Fd%23e%25f%2Bg");
        assert_eq!(encode("-_.!~*'()", false), "-_.!~*'()");
        assert_eq!(encode("café", false), "caf%C3%A9");
    }

    #[test]
    fn form_encoding_uses_plus() {
        assert_eq!(encode("a b+c", true), "a+b%2Bc");
        assert_eq!(encode("plain", true), "plain");
    }
}
