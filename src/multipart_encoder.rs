//! multipart/form-data エンコーダー
//!
//! ## 概要
//!
//! [`Value`] を multipart/form-data のボディに変換します。
//! スカラーはキーパスを `name` にしたテキストセクションになり、
//! 不透明な葉 ([`OpaqueLeaf`](crate::OpaqueLeaf)) は自身でセクションに変換されます。
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_form::multipart::{Blob, MultipartBuilder};
//! use shiguredo_form::{Map, MultipartEncoder, Value};
//!
//! let value: Value = Map::new()
//!     .with("title", "hello")
//!     .with("file", Value::opaque(Blob::new(b"abc".to_vec()).with_filename("a.txt")))
//!     .into();
//!
//! let builder = MultipartBuilder::with_boundary("B").unwrap();
//! let mut encoder = MultipartEncoder::new().with_builder(builder);
//! let (body, _log) = encoder.encode(&value).unwrap();
//! assert!(body.starts_with(b"--B\r\nContent-Disposition: form-data; name=\"title\"\r\n"));
//! assert!(body.ends_with(b"\r\nabc\r\n--B--"));
//! ```

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::content_type::ContentType;
use crate::encoder::{KeyPathEncoder, KeyPathSink};
use crate::error::{Error, Result};
use crate::key_path::KeyPath;
use crate::limits::EncoderLimits;
use crate::multipart::{MultipartBuilder, MultipartSection};
use crate::text_encoding::TextEncoding;
use crate::value::Value;

/// 一時ファイル名の衝突時に試す回数
const TEMP_FILE_ATTEMPTS: u32 = 16;

/// multipart/form-data エンコーダー
#[derive(Debug, Clone)]
pub struct MultipartEncoder {
    builder: MultipartBuilder,
    encoding: TextEncoding,
    text_content_type: bool,
    limits: EncoderLimits,
}

impl Default for MultipartEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartEncoder {
    /// 現在時刻から生成した境界でエンコーダーを作成
    pub fn new() -> Self {
        MultipartEncoder {
            builder: MultipartBuilder::new(),
            encoding: TextEncoding::Utf8,
            text_content_type: true,
            limits: EncoderLimits::default(),
        }
    }

    /// ビルダー (境界) を指定
    ///
    /// ビルダーのセクションはエンコードのたびに消去される。
    pub fn with_builder(mut self, builder: MultipartBuilder) -> Self {
        self.builder = builder;
        self
    }

    /// テキストエンコーディングを設定
    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// スカラーのセクションに `Content-Type: text/plain; charset=...` を付けるか (デフォルト: true)
    pub fn with_text_content_type(mut self, text_content_type: bool) -> Self {
        self.text_content_type = text_content_type;
        self
    }

    /// 制限を設定
    ///
    /// `max_log_body_size` はビルダーにも反映される。
    pub fn with_limits(mut self, limits: EncoderLimits) -> Self {
        self.builder = self
            .builder
            .with_max_log_body_size(limits.max_log_body_size);
        self.limits = limits;
        self
    }

    /// ビルダーを取得
    pub fn builder(&self) -> &MultipartBuilder {
        &self.builder
    }

    /// リクエストの Content-Type
    pub fn content_type(&self) -> Result<ContentType> {
        self.builder.content_type()
    }

    fn collect(&mut self, value: &Value) -> Result<()> {
        self.builder.clear();
        let limits = self.limits.clone();
        KeyPathEncoder::with_limits(self, limits).encode(value)?;
        log::debug!(
            "multipart encoder collected {} sections",
            self.builder.sections().len()
        );
        Ok(())
    }

    /// 値をメモリ上のボディにエンコード
    ///
    /// (ボディ, ログ) を返す。
    pub fn encode(&mut self, value: &Value) -> Result<(Vec<u8>, String)> {
        self.collect(value)?;
        self.builder.generate()
    }

    /// 値をエンコードして `out` に逐次書き出し、ログを返す
    pub fn write<W: Write + ?Sized>(&mut self, value: &Value, out: &mut W) -> Result<String> {
        self.collect(value)?;
        self.builder.write(out)
    }

    /// 値をエンコードしてファイルに書き出す
    ///
    /// 既存のファイルは置き換える。
    /// 境界の衝突はファイルを開く前に検出するが、書き込み中に失敗した場合は途中までのファイルが残る。
    pub fn write_to_path(&mut self, value: &Value, path: impl AsRef<Path>) -> Result<String> {
        self.collect(value)?;
        self.builder.validate()?;
        let file = File::create(path.as_ref())?;
        self.write_collected(file)
    }

    /// 値をエンコードしてシステムの一時ディレクトリに書き出す
    ///
    /// (ファイルのパス, ログ) を返す。成功後のファイルの削除は呼び出し側の責任。
    /// 失敗した場合は作成したファイルを削除する。
    pub fn write_to_temp_file(&mut self, value: &Value) -> Result<(PathBuf, String)> {
        self.write_to_temp_dir(value, &std::env::temp_dir())
    }

    fn write_to_temp_dir(&mut self, value: &Value, dir: &Path) -> Result<(PathBuf, String)> {
        self.collect(value)?;
        self.builder.validate()?;
        let (path, file) = create_temp_file(dir)?;
        match self.write_collected(file) {
            Ok(log) => Ok((path, log)),
            Err(e) => {
                if let Err(remove_error) = std::fs::remove_file(&path) {
                    log::warn!(
                        "failed to remove incomplete temp file {}: {}",
                        path.display(),
                        remove_error
                    );
                }
                Err(e)
            }
        }
    }

    fn write_collected(&self, file: File) -> Result<String> {
        let mut writer = BufWriter::new(file);
        let log = self.builder.write(&mut writer)?;
        writer.flush()?;
        Ok(log)
    }

    /// serde でシリアライズできる値をエンコード
    #[cfg(feature = "serde")]
    pub fn encode_serialize<T: serde::Serialize + ?Sized>(
        &mut self,
        value: &T,
    ) -> Result<(Vec<u8>, String)> {
        let value = crate::ser::to_value(value)?;
        self.encode(&value)
    }

    fn push_text(&mut self, key_path: &KeyPath, value: &str) -> Result<()> {
        let name = key_path.render(false);
        let section = if self.text_content_type {
            MultipartSection::text(&name, value, self.encoding)?
        } else {
            MultipartSection::text_field(&name, value, self.encoding)?
        };
        self.builder.push(section);
        Ok(())
    }
}

/// `dir` に重複しない名前のファイルを作成
fn create_temp_file(dir: &Path) -> Result<(PathBuf, File)> {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();

    let mut last_error = io::Error::other("no attempt made");
    for attempt in 0..TEMP_FILE_ATTEMPTS {
        let path = dir.join(format!(
            "form-data-{}-{}-{}.multipart",
            std::process::id(),
            nanos,
            attempt
        ));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => last_error = e,
            Err(e) => return Err(Error::TempFileCreationFailed(e)),
        }
    }
    Err(Error::TempFileCreationFailed(last_error))
}

impl KeyPathSink for MultipartEncoder {
    fn encode_str(&mut self, key_path: &KeyPath, value: &str) -> Result<()> {
        self.push_text(key_path, value)
    }

    fn encode_bool(&mut self, key_path: &KeyPath, value: bool) -> Result<()> {
        self.push_text(key_path, if value { "1" } else { "0" })
    }

    fn encode_int(&mut self, key_path: &KeyPath, value: i64) -> Result<()> {
        self.push_text(key_path, &value.to_string())
    }

    fn encode_uint(&mut self, key_path: &KeyPath, value: u64) -> Result<()> {
        self.push_text(key_path, &value.to_string())
    }

    fn encode_double(&mut self, key_path: &KeyPath, value: f64) -> Result<()> {
        self.push_text(key_path, &value.to_string())
    }

    fn encode_float(&mut self, key_path: &KeyPath, value: f32) -> Result<()> {
        self.push_text(key_path, &value.to_string())
    }

    fn will_descend(&mut self, key_path: &KeyPath, value: &Value) -> Result<bool> {
        let Value::Opaque(leaf) = value else {
            return Ok(true);
        };
        let section = leaf.to_section(&key_path.render(false), self.encoding)?;
        self.builder.push(section);
        Ok(false)
    }
}
