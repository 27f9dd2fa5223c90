#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use shiguredo_form::multipart::MultipartBuilder;
use shiguredo_form::{EncoderLimits, Map, MultipartEncoder, UrlEncoder, Value};

#[derive(Debug, Arbitrary)]
enum Node {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Double(f64),
    Text(String),
    Sequence(Vec<Node>),
    Map(Vec<(String, Node)>),
}

impl Node {
    fn into_value(self) -> Value {
        match self {
            Node::Null => Value::Null,
            Node::Bool(v) => Value::Bool(v),
            Node::Int(v) => Value::Int(v),
            Node::UInt(v) => Value::UInt(v),
            Node::Double(v) => Value::Double(v),
            Node::Text(v) => Value::String(v),
            Node::Sequence(items) => {
                Value::Sequence(items.into_iter().map(Node::into_value).collect())
            }
            Node::Map(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, v.into_value()))
                    .collect::<Map>(),
            ),
        }
    }
}

fuzz_target!(|input: (Vec<(String, Node)>, bool)| {
    let (entries, allow_null) = input;
    let value: Value = entries
        .into_iter()
        .map(|(k, v)| (k, v.into_value()))
        .collect::<Map>()
        .into();
    let limits = EncoderLimits {
        max_depth: 16,
        ..Default::default()
    };

    let mut url = UrlEncoder::new()
        .with_allow_null(allow_null)
        .with_limits(limits.clone());
    let _ = url.encode(&value);

    // 名前に使えない文字や境界の衝突はエラーになるだけ
    let builder = MultipartBuilder::with_boundary("fuzzboundary").unwrap();
    let mut multipart = MultipartEncoder::new().with_builder(builder).with_limits(limits);
    if let Ok((body, _)) = multipart.encode(&value) {
        let mut streamed = Vec::new();
        multipart.write(&value, &mut streamed).unwrap();
        assert_eq!(body, streamed);
    }
});
