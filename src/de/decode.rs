use std::borrow::Cow;

#[inline(always)]
fn hex_digit(c: u8) -> Option<u8> {
    char::from(c).to_digit(16).map(|d| d as u8)
}

/// Percent-decodes one key or value of a querystring.
///
/// Escapes that are not followed by two hex digits are kept as-is rather
/// than rejected, and bytes that do not form valid UTF-8 once decoded are
/// replaced with U+FFFD. A `+` becomes a space only when
/// `plus_as_space` is set (form encoding).
pub fn decode(input: &str, plus_as_space: bool) -> Cow<'_, str> {
    let bytes = input.as_bytes();
    if !bytes
        .iter()
        .any(|&b| b == b'%' || (plus_as_space && b == b'+'))
    {
        return Cow::Borrowed(input);
    }

    let mut decoded = Vec::with_capacity(bytes.len());
    let mut last_segment = 0;
    let mut idx = 0;

    while idx < bytes.len() {
        match bytes[idx] {
            b'+' if plus_as_space => {
                decoded.extend_from_slice(&bytes[last_segment..idx]);
                decoded.push(b' ');
                idx += 1;
                last_segment = idx;
            }
            b'%' => {
                let high = bytes.get(idx + 1).copied().and_then(hex_digit);
                let low = bytes.get(idx + 2).copied().and_then(hex_digit);
                if let (Some(h), Some(l)) = (high, low) {
                    decoded.extend_from_slice(&bytes[last_segment..idx]);
                    decoded.push(h * 0x10 + l);
                    idx += 3;
                    last_segment = idx;
                } else {
                    // not an escape, leave the `%` in place
                    idx += 1;
                }
            }
            _ => idx += 1,
        }
    }

    decoded.extend_from_slice(&bytes[last_segment..]);
    match String::from_utf8(decoded) {
        Ok(s) => Cow::Owned(s),
        Err(e) => Cow::Owned(String::from_utf8_lossy(e.as_bytes()).into_owned()),
    }
}

#[cfg(test)]
mod test {
    use super::decode;

    #[test]
    fn passes_through_plain_input() {
        assert_eq!(decode("hello", false), "hello");
        assert_eq!(decode("a+b", false), "a+b");
    }

    #[test]
    fn decodes_escapes() {
        assert_eq!(decode("hello%20world", false), "hello world");
        assert_eq!(decode("%5Bx%5D", false), "[x]");
        assert_eq!(decode("caf%C3%A9", false), "café");
    }

    #[test]
    fn plus_is_space_in_form_mode() {
        assert_eq!(decode("a+b%2Bc", true), "a b+c");
    }

    #[test]
    fn malformed_escapes_are_kept() {
        assert_eq!(decode("100%", false), "100%");
        assert_eq!(decode("%zz%4", false), "%zz%4");
        assert_eq!(decode("%%41", false), "%A");
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        assert_eq!(decode("%FF", false), "\u{FFFD}");
    }
}
