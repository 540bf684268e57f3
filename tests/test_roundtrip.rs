use nested_qs::{Map, Value};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// macro for testing roundtrip serialization and deserialization
/// under both percent-encoding styles
macro_rules! roundtrip_test {
    (
        $data:expr
    ) => {
        let data = &$data;

        for form_encoding in [false, true] {
            let config = nested_qs::Config::new().use_form_encoding(form_encoding);

            let serialized = config.serialize_string(data).expect("serialize");
            let deserialized = config
                .deserialize_str(serialized.as_str())
                .expect("deserialize");

            // check we get the same data back
            pretty_assertions::assert_eq!(data, &deserialized, "querystring: {}", serialized);
        }
    };
}

// ========== BASIC STRUCTS ==========

#[derive(Debug, PartialEq, Deserialize, Serialize)]
struct FlatStruct {
    a: u8,
    b: u8,
}

#[test]
fn flat_struct() {
    roundtrip_test!(FlatStruct { a: 1, b: 2 });
}

#[derive(Debug, PartialEq, Deserialize, Serialize)]
struct PrimitiveTypes {
    bool_val: bool,
    i8_val: i8,
    i64_val: i64,
    u64_val: u64,
    i128_val: i128,
    f32_val: f32,
    f64_val: f64,
    char_val: char,
    string_val: String,
}

#[test]
fn primitive_types() {
    roundtrip_test!(PrimitiveTypes {
        bool_val: true,
        i8_val: -128,
        i64_val: -9223372036854775808,
        u64_val: 18446744073709551615,
        i128_val: -170141183460469231731687303715884105728,
        f32_val: 1.5,
        f64_val: 0.1,
        char_val: '&',
        string_val: "hello world+[x]=y&z".to_string(),
    });
}

// ========== NESTING ==========

#[derive(Debug, PartialEq, Deserialize, Serialize)]
struct Item {
    name: String,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, PartialEq, Deserialize, Serialize)]
struct Order {
    id: u32,
    items: Vec<Item>,
    matrix: Vec<Vec<u8>>,
    meta: BTreeMap<String, String>,
    note: Option<String>,
}

#[test]
fn nested_collections() {
    roundtrip_test!(Order {
        id: 7,
        items: vec![
            Item {
                name: "first".to_string(),
                tags: vec!["a".to_string(), "b".to_string()],
            },
            Item {
                name: "second".to_string(),
                tags: vec![],
            },
        ],
        matrix: vec![vec![1, 2], vec![3]],
        meta: [("source".to_string(), "web".to_string())].into(),
        note: None,
    });
}

#[derive(Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
enum Shape {
    Empty,
    Circle(u32),
    Rect { w: u32, h: u32 },
    Line(i32, i32),
}

#[derive(Debug, PartialEq, Deserialize, Serialize)]
struct Shapes {
    shapes: Vec<Shape>,
    main: Shape,
}

#[test]
fn enums() {
    roundtrip_test!(Shapes {
        shapes: vec![
            Shape::Empty,
            Shape::Circle(3),
            Shape::Rect { w: 4, h: 5 },
            Shape::Line(-1, 1),
        ],
        main: Shape::Rect { w: 1, h: 2 },
    });
}

#[derive(Debug, PartialEq, Deserialize, Serialize)]
struct Wrapper(u16);

#[derive(Debug, PartialEq, Deserialize, Serialize)]
struct Newtypes {
    port: Wrapper,
    pair: (u8, String),
}

#[test]
fn newtypes_and_tuples() {
    roundtrip_test!(Newtypes {
        port: Wrapper(8080),
        pair: (1, "one".to_string()),
    });
}

// ========== UNTYPED ==========

#[test]
fn decoded_trees_reencode() {
    let inputs = [
        "foo=bar&baz=qux",
        "foo[0].a=1&foo[1].b=2&baz=3",
        "foo.bar.baz.qux=1",
        "a[0][0]=x&a[0][1]=y&a[1][0]=z",
        "q=hello%20world&=empty",
    ];
    for input in inputs {
        let decoded = nested_qs::decode(input);
        let encoded = nested_qs::encode(&Value::Map(decoded.clone())).unwrap();
        pretty_assertions::assert_eq!(nested_qs::decode(&encoded), decoded, "input: {}", input);
    }
}

#[test]
fn deep_trees() {
    let mut tree = Value::from("x");
    for level in 0..22 {
        tree = [(format!("k{level}"), tree)].into_iter().collect();
    }
    let encoded = nested_qs::encode(&tree).unwrap();
    pretty_assertions::assert_eq!(Value::Map(nested_qs::decode(&encoded)), tree);

    let mut tree = Value::from(vec!["x"]);
    for level in 0..22 {
        tree = if level % 2 == 0 {
            Value::Sequence(vec![tree])
        } else {
            [(format!("k{level}"), tree)].into_iter().collect()
        };
    }
    let encoded = nested_qs::encode(&tree).unwrap();
    pretty_assertions::assert_eq!(Value::Map(nested_qs::decode(&encoded)), tree);
}

fn random_key(rng: &mut StdRng) -> String {
    let len = rng.random_range(1..6);
    (0..len)
        .map(|_| char::from(rng.random_range(b'a'..=b'z')))
        .collect()
}

fn random_leaf(rng: &mut StdRng) -> Value {
    let len = rng.random_range(0..8);
    let s: String = (0..len)
        .map(|_| {
            if rng.random_bool(0.7) {
                // printable ascii, including every structural character
                char::from(rng.random_range(b' '..=b'~'))
            } else {
                rng.random::<char>()
            }
        })
        .collect();
    Value::String(s)
}

fn random_tree(rng: &mut StdRng, depth: usize) -> Value {
    if depth == 0 {
        return random_leaf(rng);
    }
    match rng.random_range(0..3) {
        0 => random_leaf(rng),
        1 => {
            let len = rng.random_range(1..4);
            Value::Sequence((0..len).map(|_| random_tree(rng, depth - 1)).collect())
        }
        _ => random_map(rng, depth - 1),
    }
}

fn random_map(rng: &mut StdRng, depth: usize) -> Value {
    let len = rng.random_range(1..4);
    let mut map = Map::new();
    while map.len() < len {
        map.insert(random_key(rng), random_tree(rng, depth));
    }
    Value::Map(map)
}

#[test]
fn random_trees() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..500 {
        let tree = random_map(&mut rng, 4);
        for form_encoding in [false, true] {
            let config = nested_qs::Config::new().use_form_encoding(form_encoding);
            let encoded = config.encode_value(&tree).unwrap();
            let decoded = Value::Map(config.decode_str(&encoded));
            pretty_assertions::assert_eq!(decoded, tree, "querystring: {}", encoded);
        }
    }
}
