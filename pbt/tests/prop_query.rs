//! クエリ文字列のプロパティテスト

use pbt::{field_key, nested_form, shallow_form, unicode_text};
use proptest::prelude::*;
use shiguredo_form::query::parse_query;
use shiguredo_form::{KeyPath, QueryBuilder, Segment, TextEncoding, UrlEncoder, Value};

// ========================================
// 生成とパースの往復
// ========================================

// エンコーダーが集めたパラメータとクエリ文字列をパースした結果が一致する
proptest! {
    #[test]
    fn query_encode_parse_roundtrip(value in shallow_form(), space_as_plus in any::<bool>()) {
        let mut encoder = UrlEncoder::new()
            .with_query_builder(QueryBuilder::new().with_space_as_plus(space_as_plus));
        let query = encoder.encode(&value).unwrap();

        let parsed = parse_query(&query, space_as_plus, TextEncoding::Utf8).unwrap();
        prop_assert_eq!(parsed.as_slice(), encoder.query().parameters());
    }
}

// add_parameters_from は生成したクエリをそのまま取り込める
proptest! {
    #[test]
    fn query_add_parameters_from_generated(value in shallow_form()) {
        let mut encoder = UrlEncoder::new();
        let query = encoder.encode(&value).unwrap();

        let mut builder = QueryBuilder::new();
        let added = builder.add_parameters_from(&query);
        prop_assert_eq!(added, encoder.query().len());
        prop_assert_eq!(builder.generate().unwrap(), query);
    }
}

// get / set は最上位キーだけを対象にする
proptest! {
    #[test]
    fn query_set_then_get(key in field_key(), first in unicode_text(), second in unicode_text()) {
        let mut builder = QueryBuilder::new();
        builder.add(KeyPath::from(vec![Segment::key(key.as_str()), Segment::Index(0)]), "nested");
        builder.set(&key, first.clone());
        prop_assert_eq!(builder.get(&key), Some(first.as_str()));

        builder.set(&key, second.clone());
        prop_assert_eq!(builder.get(&key), Some(second.as_str()));
        prop_assert_eq!(builder.len(), 2);

        prop_assert!(builder.remove(&key).is_some());
        prop_assert_eq!(builder.get(&key), None);
        prop_assert_eq!(builder.len(), 1);
    }
}

// ========================================
// null と配列の添字
// ========================================

// null を出力しない場合、配列の添字は出力した要素だけで連番になる
proptest! {
    #[test]
    fn query_null_does_not_consume_index(
        items in proptest::collection::vec(proptest::option::of("[a-z]{1,4}"), 0..8)
    ) {
        let value: Value = shiguredo_form::Map::new().with("l", items.clone()).into();
        let mut encoder = UrlEncoder::new()
            .with_query_builder(QueryBuilder::new().with_array_index_as_key(true));
        let query = encoder.encode(&value).unwrap();

        let expected: Vec<String> = items
            .iter()
            .flatten()
            .enumerate()
            .map(|(i, item)| format!("l[{}]={}", i, item))
            .collect();
        prop_assert_eq!(query, expected.join("&"));
    }
}

// null を出力する場合は要素数と添字が一致する
proptest! {
    #[test]
    fn query_null_allowed_keeps_positions(
        items in proptest::collection::vec(proptest::option::of("[a-z]{1,4}"), 0..8)
    ) {
        let value: Value = shiguredo_form::Map::new().with("l", items.clone()).into();
        let mut encoder = UrlEncoder::new().with_allow_null(true);
        encoder.encode(&value).unwrap();

        let parameters = encoder.query().parameters();
        prop_assert_eq!(parameters.len(), items.len());
        for (i, (parameter, item)) in parameters.iter().zip(&items).enumerate() {
            prop_assert_eq!(
                &parameter.key_path,
                &KeyPath::from(vec![Segment::key("l"), Segment::Index(i as u64)])
            );
            prop_assert_eq!(parameter.value.as_str(), item.as_deref().unwrap_or(""));
        }
    }
}

// ========================================
// 任意の構造
// ========================================

// 任意の深さの値でもエンコードは成功し、パースできるクエリになる
proptest! {
    #[test]
    fn query_nested_encodes_and_parses(value in nested_form(), index_as_key in any::<bool>()) {
        let mut encoder = UrlEncoder::new()
            .with_query_builder(QueryBuilder::new().with_array_index_as_key(index_as_key));
        let query = encoder.encode(&value).unwrap();

        let parsed = parse_query(&query, false, TextEncoding::Utf8).unwrap();
        prop_assert_eq!(parsed.len(), encoder.query().len());
        for (parsed, original) in parsed.iter().zip(encoder.query().parameters()) {
            prop_assert_eq!(&parsed.value, &original.value);
            prop_assert_eq!(parsed.key_path.len(), original.key_path.len());
        }
    }
}

// パースは任意の入力でパニックしない
proptest! {
    #[test]
    fn query_parse_never_panics(s in "[a-z0-9%=&\\[\\]+]{0,32}") {
        let _ = parse_query(&s, false, TextEncoding::Utf8);
        let _ = parse_query(&s, true, TextEncoding::Latin1);
    }
}
