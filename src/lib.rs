//! # shiguredo_form
//!
//! キーパスで構造化された値をフォームデータにエンコードするライブラリ
//!
//! ## 特徴
//!
//! - **キーパス**: ネストしたマップと配列を `a[b][]` 形式のキーに展開
//! - **URL エンコード**: `application/x-www-form-urlencoded` のクエリ文字列を生成
//! - **マルチパート**: `multipart/form-data` のボディをメモリ上またはファイルに生成
//! - **serde 対応**: `serde` feature で `Serialize` を実装した型をそのままエンコード
//!
//! ## 使い方
//!
//! ### URL エンコード
//!
//! ```rust
//! use shiguredo_form::{Map, UrlEncoder, Value};
//!
//! let value: Value = Map::new()
//!     .with("user", Map::new().with("name", "しぐれ").with("age", 3))
//!     .with("tags", vec!["a", "b"])
//!     .into();
//!
//! let mut encoder = UrlEncoder::new();
//! assert_eq!(
//!     encoder.encode(&value).unwrap(),
//!     "user[name]=%E3%81%97%E3%81%90%E3%82%8C&user[age]=3&tags[]=a&tags[]=b"
//! );
//! ```
//!
//! ### マルチパート
//!
//! ```rust
//! use shiguredo_form::multipart::{Blob, MultipartBuilder};
//! use shiguredo_form::{Map, MultipartEncoder, Value};
//!
//! let value: Value = Map::new()
//!     .with("title", "hello")
//!     .with("data", Value::opaque(Blob::new(b"\x00\x01".to_vec()).with_filename("a.bin")))
//!     .into();
//!
//! let builder = MultipartBuilder::with_boundary("xxxboundaryxxx").unwrap();
//! let mut encoder = MultipartEncoder::new().with_builder(builder);
//! let (body, _log) = encoder.encode(&value).unwrap();
//! assert!(body.starts_with(b"--xxxboundaryxxx\r\n"));
//! assert!(body.ends_with(b"--xxxboundaryxxx--"));
//! ```
//!
//! ### 独自のシンク
//!
//! ```rust
//! use shiguredo_form::{KeyPath, KeyPathEncoder, KeyPathSink, Map, Result, Value};
//!
//! #[derive(Default)]
//! struct Keys(Vec<String>);
//!
//! impl KeyPathSink for Keys {
//!     fn encode_str(&mut self, key_path: &KeyPath, _: &str) -> Result<()> {
//!         self.0.push(key_path.render(true));
//!         Ok(())
//!     }
//!     fn encode_bool(&mut self, key_path: &KeyPath, _: bool) -> Result<()> {
//!         self.encode_str(key_path, "")
//!     }
//!     fn encode_int(&mut self, key_path: &KeyPath, _: i64) -> Result<()> {
//!         self.encode_str(key_path, "")
//!     }
//!     fn encode_uint(&mut self, key_path: &KeyPath, _: u64) -> Result<()> {
//!         self.encode_str(key_path, "")
//!     }
//!     fn encode_double(&mut self, key_path: &KeyPath, _: f64) -> Result<()> {
//!         self.encode_str(key_path, "")
//!     }
//! }
//!
//! let value: Value = Map::new().with("a", vec![Map::new().with("b", true)]).into();
//! let mut keys = Keys::default();
//! KeyPathEncoder::new(&mut keys).encode(&value).unwrap();
//! assert_eq!(keys.0, ["a[0][b]"]);
//! ```

pub mod content_disposition;
pub mod content_type;
mod encoder;
mod error;
pub mod header;
mod key_path;
mod limits;
pub mod multipart;
mod multipart_encoder;
pub mod percent;
pub mod query;
#[cfg(feature = "serde")]
mod ser;
mod text_encoding;
pub mod url;
mod url_encoder;
mod value;

pub use encoder::{KeyPathEncoder, KeyPathSink};
pub use error::{Error, Result};
pub use key_path::{KeyPath, Segment};
pub use limits::EncoderLimits;
pub use multipart_encoder::MultipartEncoder;
pub use query::{QueryBuilder, QueryParameter};
#[cfg(feature = "serde")]
pub use ser::{ValueSerializer, to_value};
pub use text_encoding::TextEncoding;
pub use url::UrlBuilder;
pub use url_encoder::UrlEncoder;
pub use value::{Map, OpaqueLeaf, Value};
