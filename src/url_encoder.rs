//! URL エンコーダー
//!
//! ## 概要
//!
//! [`Value`] を `application/x-www-form-urlencoded` のクエリ文字列に変換します。
//!
//! - bool は `1` / `0`
//! - 数値は Rust の `Display` (ロケール非依存)
//! - null はデフォルトでは出力しない。`allow_null` を有効にすると空の値として出力する
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_form::{Map, UrlEncoder, Value};
//!
//! let value: Value = Map::new().with("a", 1).with("b", vec![10, 20]).into();
//!
//! let mut encoder = UrlEncoder::new();
//! assert_eq!(encoder.encode(&value).unwrap(), "a=1&b[]=10&b[]=20");
//! ```

use crate::content_type::ContentType;
use crate::encoder::{KeyPathEncoder, KeyPathSink};
use crate::error::Result;
use crate::key_path::KeyPath;
use crate::limits::EncoderLimits;
use crate::query::QueryBuilder;
use crate::value::Value;

/// URL エンコーダー
#[derive(Debug, Clone, Default)]
pub struct UrlEncoder {
    query: QueryBuilder,
    allow_null: bool,
    limits: EncoderLimits,
}

impl UrlEncoder {
    /// デフォルト設定のエンコーダーを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 設定済みのクエリビルダーを使う
    ///
    /// クエリビルダーのパラメータは `encode` のたびに消去される。
    pub fn with_query_builder(mut self, query: QueryBuilder) -> Self {
        self.query = query;
        self
    }

    /// null を空の値として出力するか
    pub fn with_allow_null(mut self, allow_null: bool) -> Self {
        self.allow_null = allow_null;
        self
    }

    /// 制限を設定
    pub fn with_limits(mut self, limits: EncoderLimits) -> Self {
        self.limits = limits;
        self
    }

    /// クエリビルダーを取得
    pub fn query(&self) -> &QueryBuilder {
        &self.query
    }

    /// クエリビルダーを取り出す
    pub fn into_query(self) -> QueryBuilder {
        self.query
    }

    /// リクエストボディとして送る場合の Content-Type
    pub fn content_type(&self) -> ContentType {
        ContentType::form_urlencoded(self.query.encoding())
    }

    /// 値をクエリ文字列にエンコード
    ///
    /// 最上位はマップでなければならない。
    pub fn encode(&mut self, value: &Value) -> Result<String> {
        self.query.remove_all();
        let limits = self.limits.clone();
        KeyPathEncoder::with_limits(self, limits).encode(value)?;
        log::debug!("url encoder collected {} parameters", self.query.len());
        self.query.generate()
    }

    /// serde でシリアライズできる値をクエリ文字列にエンコード
    #[cfg(feature = "serde")]
    pub fn encode_serialize<T: serde::Serialize + ?Sized>(&mut self, value: &T) -> Result<String> {
        let value = crate::ser::to_value(value)?;
        self.encode(&value)
    }
}

impl KeyPathSink for UrlEncoder {
    fn encode_str(&mut self, key_path: &KeyPath, value: &str) -> Result<()> {
        self.query.add(key_path.clone(), value);
        Ok(())
    }

    fn encode_bool(&mut self, key_path: &KeyPath, value: bool) -> Result<()> {
        self.encode_str(key_path, if value { "1" } else { "0" })
    }

    fn encode_int(&mut self, key_path: &KeyPath, value: i64) -> Result<()> {
        self.encode_str(key_path, &value.to_string())
    }

    fn encode_uint(&mut self, key_path: &KeyPath, value: u64) -> Result<()> {
        self.encode_str(key_path, &value.to_string())
    }

    fn encode_double(&mut self, key_path: &KeyPath, value: f64) -> Result<()> {
        self.encode_str(key_path, &value.to_string())
    }

    // f64 に変換すると 0.1f32 が 0.10000000149011612 になる
    fn encode_float(&mut self, key_path: &KeyPath, value: f32) -> Result<()> {
        self.encode_str(key_path, &value.to_string())
    }

    fn encode_nil(&mut self, key_path: &KeyPath) -> Result<bool> {
        if self.allow_null {
            self.encode_str(key_path, "")?;
        }
        Ok(self.allow_null)
    }
}
