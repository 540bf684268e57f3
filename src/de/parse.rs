use std::collections::HashMap;
use std::ops::Range;

use tracing::trace;

use crate::value::{Map, Value};

use super::decode::decode;

/// Parses a querystring into a fresh map.
///
/// Anything up to and including the first `?` is treated as the rest of a
/// URL and skipped. A query without a single `=` decodes to an empty map;
/// otherwise every `&`-separated pair is assigned, an empty one included
/// (as the empty key with an empty value).
pub fn parse(input: &str, config: crate::Config) -> Map {
    let query = input.split_once('?').map_or(input, |(_, query)| query);
    let mut output = Map::new();
    if !query.contains('=') {
        return output;
    }

    let mut marks = SequenceMarks::default();
    for pair in query.split('&') {
        let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = decode(raw_key, config.use_form_encoding);
        let value = decode(raw_value, config.use_form_encoding);
        assign(
            &mut output,
            &key,
            value.into_owned(),
            config.max_depth,
            &mut marks,
        );
    }

    output
}

/// Returns `true` when `segment` is a plain run of ASCII digits, meaning
/// the node it addresses into should be created as a sequence.
pub fn segment_suggests_sequence(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// The segments of one key, as ranges into the (already decoded) key.
struct KeyPath<'k> {
    key: &'k str,
    segments: Vec<Range<usize>>,
    /// Only bracketed keys create sequences; dotted keys always create maps.
    infer_sequences: bool,
}

impl<'k> KeyPath<'k> {
    fn new(key: &'k str) -> Self {
        if key.contains('[') && key.contains(']') {
            Self::bracketed(key)
        } else {
            Self::dotted(key)
        }
    }

    /// `a.b.c`: every `.` separates a segment, empty segments included.
    fn dotted(key: &'k str) -> Self {
        let mut segments = Vec::new();
        let mut start = 0;
        for (idx, b) in key.bytes().enumerate() {
            if b == b'.' {
                segments.push(start..idx);
                start = idx + 1;
            }
        }
        segments.push(start..key.len());
        KeyPath {
            key,
            segments,
            infer_sequences: false,
        }
    }

    /// `a.b[0].c[d.e]`: `[` and `]` delimit fragments and empty fragments are
    /// dropped. A fragment opened by `[` is one segment as written; any other
    /// fragment (the leading one, or `.c` after a `]`) is split on `.`.
    fn bracketed(key: &'k str) -> Self {
        let mut segments = Vec::new();
        let mut start = 0;
        let mut opened_by_bracket = false;
        for (idx, b) in key.bytes().enumerate() {
            if b == b'[' || b == b']' {
                push_fragment(key, start..idx, opened_by_bracket, &mut segments);
                opened_by_bracket = b == b'[';
                start = idx + 1;
            }
        }
        push_fragment(key, start..key.len(), opened_by_bracket, &mut segments);

        if segments.is_empty() {
            // e.g. `[]`: there is nothing to nest under, use the empty key
            segments.push(0..0);
        }
        KeyPath {
            key,
            segments,
            infer_sequences: true,
        }
    }

    /// Collapses everything past `max_depth` levels of nesting into one
    /// literal key at the deepest allowed level.
    fn limit_depth(&mut self, max_depth: usize) {
        if self.segments.len() <= max_depth.saturating_add(1) {
            return;
        }
        let mut tail_start = self.segments[max_depth].start;
        if tail_start > 0 && self.key.as_bytes()[tail_start - 1] == b'[' {
            tail_start -= 1;
        }
        trace!(
            key = self.key,
            max_depth,
            "key exceeds the maximum depth, keeping the rest as a literal key"
        );
        self.segments.truncate(max_depth);
        self.segments.push(tail_start..self.key.len());
    }

    fn segment(&self, idx: usize) -> &'k str {
        &self.key[self.segments[idx].clone()]
    }
}

fn push_fragment(
    key: &str,
    range: Range<usize>,
    opened_by_bracket: bool,
    segments: &mut Vec<Range<usize>>,
) {
    if range.is_empty() {
        return;
    }
    if opened_by_bracket {
        segments.push(range);
        return;
    }
    let mut start = range.start;
    for idx in range.clone() {
        if key.as_bytes()[idx] == b'.' {
            if start < idx {
                segments.push(start..idx);
            }
            start = idx + 1;
        }
    }
    if start < range.end {
        segments.push(start..range.end);
    }
}

/// The index literal each sequence last appended under, keyed by the
/// sequence's path.
///
/// A later key repeating that literal (`foo[1].a=1&foo[1].b=2`) lands in the
/// same element instead of appending a new one.
#[derive(Default)]
pub struct SequenceMarks(HashMap<String, String>);

impl SequenceMarks {
    fn mark(&mut self, path: &str) -> &mut String {
        self.0.entry(path.to_owned()).or_default()
    }
}

/// Appends `segment` to a path identifier, length-prefixed so that
/// segments containing any character stay unambiguous.
fn push_path_segment(path: &mut String, segment: &str) {
    let mut buffer = itoa::Buffer::new();
    path.push_str(buffer.format(segment.len()));
    path.push(':');
    path.push_str(segment);
}

/// Where the walk currently points: always a container.
enum Cursor<'t> {
    Map(&'t mut Map),
    Sequence(&'t mut Vec<Value>),
}

fn empty_container(sequence: bool) -> Value {
    if sequence {
        Value::Sequence(Vec::new())
    } else {
        Value::Map(Map::new())
    }
}

impl<'t> Cursor<'t> {
    /// Moves one level down through `segment`, creating the child if it is
    /// missing. Returns `None` when the existing child cannot hold nested
    /// values.
    ///
    /// `mark` is the sequence's last appended index literal, if the cursor
    /// is a sequence.
    fn descend(
        self,
        segment: &str,
        create_sequence: bool,
        mark: Option<&mut String>,
    ) -> Option<Cursor<'t>> {
        let child = match self {
            Cursor::Map(map) => {
                let child = map
                    .entry(segment.to_owned())
                    .or_insert_with(|| empty_container(create_sequence));
                if child.is_null() {
                    *child = empty_container(create_sequence);
                }
                child
            }
            Cursor::Sequence(seq) => {
                if !segment_suggests_sequence(segment) {
                    return None;
                }
                let repeats_last =
                    !seq.is_empty() && mark.as_deref().is_some_and(|m| m == segment);
                // the index is only a marker: anything past the end appends
                let index = if repeats_last {
                    seq.len() - 1
                } else {
                    segment.parse::<usize>().unwrap_or(usize::MAX)
                };
                if index < seq.len() {
                    &mut seq[index]
                } else {
                    record_mark(mark, segment);
                    seq.push(empty_container(create_sequence));
                    let last = seq.len() - 1;
                    &mut seq[last]
                }
            }
        };

        match child {
            Value::Map(map) => Some(Cursor::Map(map)),
            Value::Sequence(seq) => Some(Cursor::Sequence(seq)),
            Value::String(_) | Value::Null => None,
        }
    }

    fn set(self, segment: &str, value: String, mark: Option<&mut String>) {
        match self {
            Cursor::Map(map) => {
                map.insert(segment.to_owned(), Value::String(value));
            }
            // appends regardless of the index written in the key
            Cursor::Sequence(seq) => {
                record_mark(mark, segment);
                seq.push(Value::String(value));
            }
        }
    }

    fn is_sequence(&self) -> bool {
        matches!(self, Cursor::Sequence(_))
    }
}

fn record_mark(mark: Option<&mut String>, segment: &str) {
    if let Some(mark) = mark {
        mark.clear();
        mark.push_str(segment);
    }
}

/// Folds one decoded `key=value` pair into `root`.
///
/// `marks` carries the sequences' last index literals between the pairs of
/// one querystring.
pub fn assign(
    root: &mut Map,
    key: &str,
    value: String,
    max_depth: usize,
    marks: &mut SequenceMarks,
) {
    let mut path = KeyPath::new(key);
    path.limit_depth(max_depth);

    let last = path.segments.len() - 1;
    let mut cursor = Cursor::Map(root);
    let mut container = String::new();
    for idx in 0..last {
        let segment = path.segment(idx);
        let create_sequence = path.infer_sequences && segment_suggests_sequence(path.segment(idx + 1));
        let mark = if cursor.is_sequence() {
            Some(marks.mark(&container))
        } else {
            None
        };
        match cursor.descend(segment, create_sequence, mark) {
            Some(next) => cursor = next,
            None => {
                trace!(
                    key,
                    segment = path.segment(idx),
                    "conflicting types for the same key path, dropping the value"
                );
                return;
            }
        }
        push_path_segment(&mut container, segment);
    }
    let mark = if cursor.is_sequence() {
        Some(marks.mark(&container))
    } else {
        None
    };
    cursor.set(path.segment(last), value, mark);
}

#[cfg(test)]
mod test {
    use crate::Config;
    use crate::value::{Map, Value};

    use super::{assign, parse, segment_suggests_sequence, SequenceMarks};

    use pretty_assertions::assert_eq;

    static DEFAULT_CONFIG: Config = Config {
        max_depth: 10,
        use_form_encoding: false,
    };
    static FORM_ENCODING_CONFIG: Config = Config {
        use_form_encoding: true,
        ..DEFAULT_CONFIG
    };

    fn map<const N: usize>(entries: [(&str, Value); N]) -> Value {
        entries.into_iter().collect()
    }

    fn seq<const N: usize>(values: [Value; N]) -> Value {
        Value::Sequence(values.into())
    }

    fn parse_value(input: &str, config: Config) -> Value {
        Value::Map(parse(input, config))
    }

    #[test]
    fn parse_empty() {
        assert_eq!(parse("", DEFAULT_CONFIG), Map::default());
        assert_eq!(parse("?", DEFAULT_CONFIG), Map::default());
    }

    #[test]
    fn parse_without_pairs() {
        assert_eq!(parse("http://example.com", DEFAULT_CONFIG), Map::default());
        assert_eq!(parse("http://example.com/?flag", DEFAULT_CONFIG), Map::default());
    }

    #[test]
    fn parse_strips_url_prefix() {
        assert_eq!(
            parse_value("http://example.com/?foo=bar&baz=qux", DEFAULT_CONFIG),
            map([("foo", "bar".into()), ("baz", "qux".into())])
        );
    }

    #[test]
    fn parse_missing_value() {
        assert_eq!(
            parse_value("abc&def=1", DEFAULT_CONFIG),
            map([("abc", "".into()), ("def", "1".into())])
        );
    }

    #[test]
    fn parse_empty_pairs_use_the_empty_key() {
        assert_eq!(
            parse_value("a=1&", DEFAULT_CONFIG),
            map([("a", "1".into()), ("", "".into())])
        );
        assert_eq!(parse_value("=empty&", DEFAULT_CONFIG), map([("", "".into())]));
    }

    #[test]
    fn parse_value_with_equals() {
        assert_eq!(
            parse_value("expr=a%3Db=c", DEFAULT_CONFIG),
            map([("expr", "a=b=c".into())])
        );
    }

    #[test]
    fn parse_sequence_of_maps() {
        assert_eq!(
            parse_value("foo[0].a=1&foo[1].b=2&baz=3", DEFAULT_CONFIG),
            map([
                (
                    "foo",
                    seq([map([("a", "1".into())]), map([("b", "2".into())])])
                ),
                ("baz", "3".into()),
            ])
        );
    }

    #[test]
    fn parse_same_index_merges_into_one_element() {
        assert_eq!(
            parse_value("foo[0].a=1&foo[0].b=2", DEFAULT_CONFIG),
            map([(
                "foo",
                seq([map([("a", "1".into()), ("b", "2".into())])])
            )])
        );
    }

    #[test]
    fn parse_repeated_index_past_the_end_merges() {
        assert_eq!(
            parse_value("foo[1].a=1&foo[1].b=2&foo[4].c=3", DEFAULT_CONFIG),
            map([(
                "foo",
                seq([
                    map([("a", "1".into()), ("b", "2".into())]),
                    map([("c", "3".into())]),
                ])
            )])
        );
        // the same literal under another parent is a different sequence
        assert_eq!(
            parse_value("x[0][5].a=1&x[1][5].b=2", DEFAULT_CONFIG),
            map([(
                "x",
                seq([
                    seq([map([("a", "1".into())])]),
                    seq([map([("b", "2".into())])]),
                ])
            )])
        );
    }

    #[test]
    fn parse_sequence_appends() {
        assert_eq!(
            parse_value("abc[1]=1&abc[0]=0&abc[7]=7", DEFAULT_CONFIG),
            map([("abc", seq(["1".into(), "0".into(), "7".into()]))])
        );
    }

    #[test]
    fn parse_nested_sequences() {
        assert_eq!(
            parse_value(
                "foo%5B0%5D=bar&foo%5B1%5D%5B0%5D=baz&foo%5B1%5D%5B1%5D.a=b",
                DEFAULT_CONFIG
            ),
            map([(
                "foo",
                seq(["bar".into(), seq(["baz".into(), map([("a", "b".into())])])])
            )])
        );
    }

    #[test]
    fn parse_bracketed_map_keys() {
        assert_eq!(
            parse_value("user[name]=ann&user[tags][0]=x&user[a.b]=1", DEFAULT_CONFIG),
            map([(
                "user",
                map([
                    ("name", "ann".into()),
                    ("tags", seq(["x".into()])),
                    ("a.b", "1".into()),
                ])
            )])
        );
    }

    #[test]
    fn parse_dots_before_brackets() {
        assert_eq!(
            parse_value("a.b[0]=x&a.b[1].c.d=y", DEFAULT_CONFIG),
            map([(
                "a",
                map([(
                    "b",
                    seq(["x".into(), map([("c", map([("d", "y".into())]))])])
                )])
            )])
        );
    }

    #[test]
    fn parse_deep_dotted() {
        assert_eq!(
            parse_value("foo.bar.baz.qux=1", DEFAULT_CONFIG),
            map([(
                "foo",
                map([("bar", map([("baz", map([("qux", "1".into())]))]))])
            )])
        );
    }

    #[test]
    fn parse_dotted_digits_stay_maps() {
        assert_eq!(
            parse_value("foo.0=a&foo.1=b", DEFAULT_CONFIG),
            map([("foo", map([("0", "a".into()), ("1", "b".into())]))])
        );
    }

    #[test]
    fn parse_dotted_keeps_empty_segments() {
        assert_eq!(
            parse_value("a..b=1", DEFAULT_CONFIG),
            map([("a", map([("", map([("b", "1".into())]))]))])
        );
    }

    #[test]
    fn parse_duplicate_plain_key_overwrites() {
        assert_eq!(
            parse_value("foo=1&bar=x&foo=2", DEFAULT_CONFIG),
            map([("foo", "2".into()), ("bar", "x".into())])
        );
    }

    #[test]
    fn parse_plain_key_overwrites_sequence() {
        assert_eq!(
            parse_value("foo[0]=1&foo=2", DEFAULT_CONFIG),
            map([("foo", "2".into())])
        );
    }

    #[test]
    fn parse_type_conflicts_keep_the_first_type() {
        // `foo` is already a string, it cannot hold a sequence
        assert_eq!(
            parse_value("foo=1&foo[0]=2", DEFAULT_CONFIG),
            map([("foo", "1".into())])
        );
        // `foo` is already a sequence, `bar` is not an index
        assert_eq!(
            parse_value("foo[0]=1&foo[bar][x]=2", DEFAULT_CONFIG),
            map([("foo", seq(["1".into()]))])
        );
        // `foo` is already a map, a bare `[n]` leaf just sets key `n`
        assert_eq!(
            parse_value("foo.a=1&foo[0]=2", DEFAULT_CONFIG),
            map([("foo", map([("a", "1".into()), ("0", "2".into())]))])
        );
    }

    #[test]
    fn parse_malformed_brackets() {
        assert_eq!(
            parse_value("a[b=1&c]d=2&[]=3", DEFAULT_CONFIG),
            map([
                ("a[b", "1".into()),
                ("c]d", "2".into()),
                ("", "3".into()),
            ])
        );
        assert_eq!(
            parse_value("a[b]c=1", DEFAULT_CONFIG),
            map([("a", map([("b", map([("c", "1".into())]))]))])
        );
        assert_eq!(
            parse_value("a[]=1&a[]=2", DEFAULT_CONFIG),
            map([("a", "2".into())])
        );
    }

    #[test]
    fn parse_huge_index_appends() {
        assert_eq!(
            parse_value("a[0][0]=x&a[99999999999999999999999][0]=y", DEFAULT_CONFIG),
            map([("a", seq([seq(["x".into()]), seq(["y".into()])]))])
        );
    }

    #[test]
    fn parse_max_depth() {
        let config = Config {
            max_depth: 2,
            ..DEFAULT_CONFIG
        };
        assert_eq!(
            parse_value("a[b][c][d][e]=i&x.y.z.w=j", config),
            map([
                ("a", map([("b", map([("[c][d][e]", "i".into())]))])),
                ("x", map([("y", map([("z.w", "j".into())]))])),
            ])
        );

        let flat = Config {
            max_depth: 0,
            ..DEFAULT_CONFIG
        };
        assert_eq!(
            parse_value("a[b]=1&c.d=2", flat),
            map([("a[b]", "1".into()), ("c.d", "2".into())])
        );
    }

    #[test]
    fn parse_unbounded_depth() {
        let config = Config {
            max_depth: usize::MAX,
            ..DEFAULT_CONFIG
        };
        let key = vec!["k"; 30].join(".");
        let mut node = &parse_value(&format!("{key}=v"), config);
        for _ in 0..30 {
            node = node.get("k").unwrap();
        }
        assert_eq!(node, &Value::from("v"));
    }

    #[test]
    fn parse_plus_handling() {
        assert_eq!(
            parse_value("q=a+b&r=c%20d", DEFAULT_CONFIG),
            map([("q", "a+b".into()), ("r", "c d".into())])
        );
        assert_eq!(
            parse_value("q=a+b&r=c%20d", FORM_ENCODING_CONFIG),
            map([("q", "a b".into()), ("r", "c d".into())])
        );
    }

    #[test]
    fn assign_into_existing_tree() {
        let mut tree = Map::new();
        tree.insert("keep".into(), "me".into());
        tree.insert("slot".into(), Value::Null);

        let mut marks = SequenceMarks::default();
        assign(&mut tree, "slot[0]", "a".into(), 10, &mut marks);
        assign(&mut tree, "foo[5]", "x".into(), 10, &mut marks);

        assert_eq!(
            Value::Map(tree),
            map([
                ("keep", "me".into()),
                ("slot", seq(["a".into()])),
                ("foo", seq(["x".into()])),
            ])
        );
    }

    #[test]
    fn sequence_hint() {
        assert!(segment_suggests_sequence("0"));
        assert!(segment_suggests_sequence("0042"));
        assert!(!segment_suggests_sequence(""));
        assert!(!segment_suggests_sequence("-1"));
        assert!(!segment_suggests_sequence("+1"));
        assert!(!segment_suggests_sequence("1a"));
    }
}
