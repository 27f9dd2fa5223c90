//! PBT テスト共通ユーティリティ

use proptest::prelude::*;
use shiguredo_form::{Map, Value};

// ========================================
// キー生成
// ========================================

/// ブラケットを含まないキー
pub fn field_key() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9_]{0,8}".prop_map(|s| s)
}

/// 任意の Unicode テキスト
pub fn unicode_text() -> impl Strategy<Value = String> {
    ".{0,16}".prop_map(|s| s)
}

/// Latin-1 で表現できるテキスト
pub fn latin1_text() -> impl Strategy<Value = String> {
    proptest::collection::vec(prop::char::range('\u{0}', '\u{ff}'), 0..16)
        .prop_map(|chars| chars.into_iter().collect())
}

// ========================================
// 値生成
// ========================================

/// 文字列のスカラー
pub fn string_leaf() -> impl Strategy<Value = Value> {
    unicode_text().prop_map(Value::from)
}

/// 任意のスカラー
pub fn scalar_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<u64>().prop_map(Value::from),
        unicode_text().prop_map(Value::from),
    ]
}

/// 最上位がマップで、深さ 2 までの値
///
/// 子は文字列、文字列の配列、文字列のマップのいずれか。
/// `[]` 表記からパースしても添字が元に戻る形に限定している。
pub fn shallow_form() -> impl Strategy<Value = Value> {
    let child = prop_oneof![
        string_leaf(),
        proptest::collection::vec(string_leaf(), 0..4).prop_map(Value::Sequence),
        proptest::collection::vec((field_key(), string_leaf()), 0..4)
            .prop_map(|entries| Value::Map(entries.into_iter().collect())),
    ];
    proptest::collection::vec((field_key(), child), 0..6)
        .prop_map(|entries| Value::Map(entries.into_iter().collect::<Map>()))
}

/// 任意の深さの値 (null を含む)
pub fn nested_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![Just(Value::Null), scalar_value()];
    leaf.prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..4).prop_map(Value::Sequence),
            proptest::collection::vec((field_key(), inner), 0..4)
                .prop_map(|entries| Value::Map(entries.into_iter().collect())),
        ]
    })
}

/// 最上位がマップの任意の深さの値
pub fn nested_form() -> impl Strategy<Value = Value> {
    proptest::collection::vec((field_key(), nested_value()), 0..4)
        .prop_map(|entries| Value::Map(entries.into_iter().collect()))
}
