//! キーパスエンコーダー
//!
//! ## 概要
//!
//! [`Value`] を深さ優先でたどり、葉ごとに `(キーパス, スカラー)` を [`KeyPathSink`] に渡します。
//! URL クエリや multipart などのバックエンドは `KeyPathSink` を実装します。
//!
//! コンテナは 3 種類あります。
//!
//! - キー付き (マップ): 子のパスに `Key(k)` を追加する
//! - キーなし (シーケンス): 子のパスに `Index(n)` を追加する。`n` は実際に出力された要素の数
//! - 単一値 (不透明な葉の構造表現): パスを変えない
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_form::{KeyPath, KeyPathEncoder, KeyPathSink, Map, Result, Value};
//!
//! #[derive(Default)]
//! struct Collect(Vec<String>);
//!
//! impl KeyPathSink for Collect {
//!     fn encode_str(&mut self, key_path: &KeyPath, value: &str) -> Result<()> {
//!         self.0.push(format!("{}={}", key_path.render(true), value));
//!         Ok(())
//!     }
//!     fn encode_bool(&mut self, key_path: &KeyPath, value: bool) -> Result<()> {
//!         self.encode_str(key_path, &value.to_string())
//!     }
//!     fn encode_int(&mut self, key_path: &KeyPath, value: i64) -> Result<()> {
//!         self.encode_str(key_path, &value.to_string())
//!     }
//!     fn encode_uint(&mut self, key_path: &KeyPath, value: u64) -> Result<()> {
//!         self.encode_str(key_path, &value.to_string())
//!     }
//!     fn encode_double(&mut self, key_path: &KeyPath, value: f64) -> Result<()> {
//!         self.encode_str(key_path, &value.to_string())
//!     }
//! }
//!
//! let value: Value = Map::new().with("a", 1).with("b", vec!["x", "y"]).into();
//! let mut sink = Collect::default();
//! KeyPathEncoder::new(&mut sink).encode(&value).unwrap();
//! assert_eq!(sink.0, ["a=1", "b[0]=x", "b[1]=y"]);
//! ```

use crate::error::{Error, Result};
use crate::key_path::{KeyPath, Segment};
use crate::limits::EncoderLimits;
use crate::value::{Map, Value};

/// キーパスエンコーダーから葉を受け取るバックエンド
///
/// どのメソッドがエラーを返してもトラバーサルはその場で中断する。
pub trait KeyPathSink {
    fn encode_str(&mut self, key_path: &KeyPath, value: &str) -> Result<()>;

    fn encode_bool(&mut self, key_path: &KeyPath, value: bool) -> Result<()>;

    fn encode_int(&mut self, key_path: &KeyPath, value: i64) -> Result<()>;

    fn encode_uint(&mut self, key_path: &KeyPath, value: u64) -> Result<()>;

    fn encode_double(&mut self, key_path: &KeyPath, value: f64) -> Result<()>;

    /// 単精度浮動小数点数 (デフォルトでは f64 に変換して `encode_double` に渡す)
    fn encode_float(&mut self, key_path: &KeyPath, value: f32) -> Result<()> {
        self.encode_double(key_path, f64::from(value))
    }

    /// null
    ///
    /// 出力したなら `true` を返す。`false` の場合キーなしコンテナの添字は進まない。
    fn encode_nil(&mut self, _key_path: &KeyPath) -> Result<bool> {
        Ok(true)
    }

    /// マップ、シーケンス、不透明な葉に入る前に呼ばれる
    ///
    /// `false` を返すとバックエンドが値を処理したものとして、中には入らない。
    fn will_descend(&mut self, _key_path: &KeyPath, _value: &Value) -> Result<bool> {
        Ok(true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContainerMode {
    Keyed,
    Unkeyed,
    SingleValue,
}

/// コンテナのフレーム
///
/// `base_len` はこのコンテナに入った時点のパスの長さ。
#[derive(Debug, Clone, Copy)]
struct Frame {
    mode: ContainerMode,
    base_len: usize,
    count: u64,
}

/// キーパスエンコーダー
///
/// 1 回の [`encode`](Self::encode) ごとに作成する。
#[derive(Debug)]
pub struct KeyPathEncoder<'a, S: KeyPathSink + ?Sized> {
    sink: &'a mut S,
    limits: EncoderLimits,
    path: KeyPath,
    frames: Vec<Frame>,
}

impl<'a, S: KeyPathSink + ?Sized> KeyPathEncoder<'a, S> {
    /// デフォルトの制限でエンコーダーを作成
    pub fn new(sink: &'a mut S) -> Self {
        Self::with_limits(sink, EncoderLimits::default())
    }

    /// 制限を指定してエンコーダーを作成
    pub fn with_limits(sink: &'a mut S, limits: EncoderLimits) -> Self {
        KeyPathEncoder {
            sink,
            limits,
            path: KeyPath::new(),
            frames: Vec::new(),
        }
    }

    /// 値をエンコード
    ///
    /// 最上位はマップ (または構造表現がマップの不透明な葉) でなければならない。
    pub fn encode(mut self, value: &Value) -> Result<()> {
        match value {
            Value::Map(map) => self.encode_map(map),
            Value::Opaque(leaf) => match leaf.describe() {
                Some(Value::Map(map)) => self.encode_map(&map),
                _ => Err(Error::ParameterNotEncodable(format!(
                    "top-level {:?} is not a map",
                    leaf
                ))),
            },
            other => Err(Error::ParameterNotEncodable(format!(
                "top-level {} is not a map",
                other.kind()
            ))),
        }
    }

    fn push_frame(&mut self, mode: ContainerMode) -> Result<usize> {
        let depth = self.frames.len() + 1;
        if depth > self.limits.max_depth {
            return Err(Error::StructureTooDeep {
                depth,
                limit: self.limits.max_depth,
            });
        }
        self.frames.push(Frame {
            mode,
            base_len: self.path.len(),
            count: 0,
        });
        Ok(self.frames.len() - 1)
    }

    fn pop_frame(&mut self) {
        if let Some(frame) = self.frames.pop() {
            log::trace!("leave {:?} container with {} entries", frame.mode, frame.count);
            self.path.truncate(frame.base_len);
        }
    }

    fn encode_map(&mut self, map: &Map) -> Result<()> {
        let index = self.push_frame(ContainerMode::Keyed)?;
        let base_len = self.frames[index].base_len;
        for (key, value) in map.iter() {
            self.path.truncate(base_len);
            self.path.push(Segment::Key(key.to_string()));
            if self.encode_value(value)? {
                self.frames[index].count += 1;
            }
        }
        self.pop_frame();
        Ok(())
    }

    fn encode_sequence(&mut self, items: &[Value]) -> Result<()> {
        let index = self.push_frame(ContainerMode::Unkeyed)?;
        let base_len = self.frames[index].base_len;
        for value in items {
            self.path.truncate(base_len);
            self.path.push(Segment::Index(self.frames[index].count));
            if self.encode_value(value)? {
                self.frames[index].count += 1;
            }
        }
        self.pop_frame();
        Ok(())
    }

    /// 構造表現を現在のパスのまま (単一値コンテナとして) エンコード
    fn encode_single(&mut self, value: &Value) -> Result<()> {
        let index = self.push_frame(ContainerMode::SingleValue)?;
        if self.encode_value(value)? {
            self.frames[index].count += 1;
        }
        self.pop_frame();
        Ok(())
    }

    /// 値を 1 つエンコードし、出力として数えるかを返す
    fn encode_value(&mut self, value: &Value) -> Result<bool> {
        log::trace!("encode {} at {}", value.kind(), self.path);
        match value {
            Value::Null => return self.sink.encode_nil(&self.path),
            Value::Bool(v) => self.sink.encode_bool(&self.path, *v)?,
            Value::Int(v) => self.sink.encode_int(&self.path, *v)?,
            Value::UInt(v) => self.sink.encode_uint(&self.path, *v)?,
            Value::Float(v) => self.sink.encode_float(&self.path, *v)?,
            Value::Double(v) => self.sink.encode_double(&self.path, *v)?,
            Value::String(v) => self.sink.encode_str(&self.path, v)?,
            Value::Map(map) => {
                if self.sink.will_descend(&self.path, value)? {
                    self.encode_map(map)?;
                }
            }
            Value::Sequence(items) => {
                if self.sink.will_descend(&self.path, value)? {
                    self.encode_sequence(items)?;
                }
            }
            Value::Opaque(leaf) => {
                if self.sink.will_descend(&self.path, value)? {
                    let described = leaf.describe().ok_or_else(|| {
                        Error::ParameterNotEncodable(format!("{:?} at {}", leaf, self.path))
                    })?;
                    self.encode_single(&described)?;
                }
            }
        }
        Ok(true)
    }
}
