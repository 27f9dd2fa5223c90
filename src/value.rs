//! エンコード対象の値
//!
//! ## 概要
//!
//! フォームエンコーダーに渡す構造化された値です。
//! スカラー、順序付きシーケンス、挿入順を保持するマップ、
//! そしてバックエンドが独自に扱う不透明な葉 ([`OpaqueLeaf`]) からなります。
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_form::{Map, Value};
//!
//! let mut map = Map::new();
//! map.insert("a", 1);
//! map.insert("b", vec![10, 20]);
//! map.insert("a", 2);
//!
//! let keys: Vec<&str> = map.keys().collect();
//! assert_eq!(keys, ["a", "b"]);
//! assert_eq!(map.get("a"), Some(&Value::Int(2)));
//! ```

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::multipart::MultipartSection;
use crate::text_encoding::TextEncoding;

/// 不透明な葉
///
/// multipart バックエンドはこの値を自分でセクションに変換する。
/// 変換しないバックエンドは [`OpaqueLeaf::describe`] の構造をたどる。
pub trait OpaqueLeaf: fmt::Debug + Send + Sync {
    /// multipart セクションに変換
    fn to_section(&self, name: &str, encoding: TextEncoding) -> Result<MultipartSection>;

    /// 構造としての表現
    ///
    /// `None` の場合、この値をキーパスで表現できない。
    fn describe(&self) -> Option<Value> {
        None
    }
}

/// エンコード対象の値
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f32),
    Double(f64),
    String(String),
    Sequence(Vec<Value>),
    Map(Map),
    Opaque(Arc<dyn OpaqueLeaf>),
}

impl Value {
    /// 不透明な葉を作成
    pub fn opaque<T: OpaqueLeaf + 'static>(leaf: T) -> Self {
        Value::Opaque(Arc::new(leaf))
    }

    /// 種類名 (エラーメッセージ用)
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Sequence(_) => "sequence",
            Value::Map(_) => "map",
            Value::Opaque(_) => "opaque",
        }
    }

    /// マップなら参照を返す
    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// null かどうか
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::UInt(a), Value::UInt(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Sequence(a), Value::Sequence(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            // 不透明な葉は同一インスタンスのみ等しい
            (Value::Opaque(a), Value::Opaque(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

macro_rules! impl_from_int {
    ($variant:ident, $target:ty, $($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(<$target>::from(v))
                }
            }
        )*
    };
}

impl_from_int!(Int, i64, i8, i16, i32, i64);
impl_from_int!(UInt, u64, u8, u16, u32, u64);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Map> for Value {
    fn from(v: Map) -> Self {
        Value::Map(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Sequence(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// 挿入順を保持するマップ
///
/// 既存のキーに挿入すると、その位置のまま値を置き換える。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Map {
    entries: Vec<(String, Value)>,
}

impl Map {
    /// 空のマップを作成
    pub fn new() -> Self {
        Map {
            entries: Vec::new(),
        }
    }

    /// 値を挿入
    ///
    /// キーが既にあれば古い値を返す。
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// ビルダー形式で値を挿入
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// 値を取得
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// 値を可変参照で取得
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// キーがあるか
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// 値を取り除く (残りの順序は保持)
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let position = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(position).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 挿入順にキーと値を返す
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// 挿入順にキーを返す
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Map {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Map::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl IntoIterator for Map {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
