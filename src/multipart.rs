//! multipart/form-data (RFC 7578)
//!
//! ## 概要
//!
//! セクションを蓄積し、multipart/form-data のボディを生成します。
//! メモリ上にまとめて生成する [`MultipartBuilder::generate`] と、
//! `Write` に逐次書き出す [`MultipartBuilder::write`] は同じバイト列を出力します。
//!
//! どちらも診断用のログ文字列を返します。ログにはヘッダーと本文のテキストが含まれ、
//! 大きな本文やデコードできない本文は `BINARY: N bytes` になります。
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_form::multipart::{MultipartBuilder, MultipartSection};
//! use shiguredo_form::TextEncoding;
//!
//! let mut builder = MultipartBuilder::with_boundary("B").unwrap();
//! builder.push(MultipartSection::text_field("x", "hi", TextEncoding::Utf8).unwrap());
//!
//! let (body, _log) = builder.generate().unwrap();
//! assert_eq!(
//!     body,
//!     b"--B\r\nContent-Disposition: form-data; name=\"x\"\r\n\r\nhi\r\n--B--"
//! );
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};

use crate::content_disposition::ContentDisposition;
use crate::content_type::ContentType;
use crate::error::{Error, Result};
use crate::header::HeaderLine;
use crate::limits::EncoderLimits;
use crate::text_encoding::TextEncoding;
use crate::value::OpaqueLeaf;

/// 境界文字列の最大長 (RFC 2046 Section 5.1.1)
pub const MAX_BOUNDARY_LENGTH: usize = 70;

const CRLF: &[u8] = b"\r\n";

/// multipart のセクション
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartSection {
    content_disposition: ContentDisposition,
    content_type: Option<ContentType>,
    raw_bytes: Vec<u8>,
    encoding: TextEncoding,
}

impl MultipartSection {
    /// 新しいセクションを作成
    pub fn new(
        content_disposition: ContentDisposition,
        content_type: Option<ContentType>,
        raw_bytes: Vec<u8>,
        encoding: TextEncoding,
    ) -> Self {
        MultipartSection {
            content_disposition,
            content_type,
            raw_bytes,
            encoding,
        }
    }

    /// Content-Type なしのテキストフィールド
    pub fn text_field(name: &str, value: &str, encoding: TextEncoding) -> Result<Self> {
        Ok(MultipartSection::new(
            ContentDisposition::form_data(name)?,
            None,
            encoding.encode(value)?,
            encoding,
        ))
    }

    /// `text/plain; charset=<encoding>` 付きのテキストフィールド
    pub fn text(name: &str, value: &str, encoding: TextEncoding) -> Result<Self> {
        Ok(MultipartSection::new(
            ContentDisposition::form_data(name)?,
            Some(ContentType::text("plain", encoding)),
            encoding.encode(value)?,
            encoding,
        ))
    }

    /// ファイルを読み込んでセクションを作成
    ///
    /// ファイル名はパスの最後の要素、Content-Type は拡張子から推測する。
    pub fn file(name: &str, path: &Path, encoding: TextEncoding) -> Result<Self> {
        let raw_bytes = std::fs::read(path)?;
        let mut content_disposition = ContentDisposition::form_data(name)?;
        if let Some(filename) = path.file_name() {
            content_disposition =
                content_disposition.with_filename(&filename.to_string_lossy(), encoding)?;
        }
        Ok(MultipartSection::new(
            content_disposition,
            Some(ContentType::from_path(path)),
            raw_bytes,
            encoding,
        ))
    }

    pub fn content_disposition(&self) -> &ContentDisposition {
        &self.content_disposition
    }

    pub fn content_type(&self) -> Option<&ContentType> {
        self.content_type.as_ref()
    }

    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw_bytes
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// フィールド名
    pub fn name(&self) -> Option<&str> {
        self.content_disposition.name()
    }

    /// ヘッダー行 (Content-Disposition, Content-Type の順)
    pub fn header_lines(&self) -> Vec<HeaderLine> {
        let mut lines = vec![self.content_disposition.to_header_line()];
        if let Some(content_type) = &self.content_type {
            lines.push(content_type.to_header_line());
        }
        lines
    }

    /// ヘッダーと本文を書き出し、ログを返す
    fn write_to<W: Write + ?Sized>(&self, out: &mut W, max_log_body_size: usize) -> Result<String> {
        let mut log = String::new();
        for line in self.header_lines() {
            let line = line.generate_line()?;
            out.write_all(&self.encoding.encode(&line)?)?;
            out.write_all(CRLF)?;
            log.push_str(&line);
            log.push('\n');
        }
        out.write_all(CRLF)?;
        log.push('\n');

        out.write_all(&self.raw_bytes)?;
        log.push_str(&self.body_description(max_log_body_size));
        Ok(log)
    }

    fn body_description(&self, max_log_body_size: usize) -> String {
        if self.raw_bytes.len() <= max_log_body_size {
            if let Some(text) = self.encoding.decode(&self.raw_bytes) {
                return text;
            }
        }
        format!("BINARY: {} bytes", self.raw_bytes.len())
    }
}

impl OpaqueLeaf for MultipartSection {
    /// 自分自身をそのまま使う
    fn to_section(&self, _name: &str, _encoding: TextEncoding) -> Result<MultipartSection> {
        Ok(self.clone())
    }
}

/// メモリ上のバイト列 (ファイルのアップロード用)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    bytes: Vec<u8>,
    filename: Option<String>,
    content_type: ContentType,
}

impl Blob {
    /// `application/octet-stream` のバイト列
    pub fn new(bytes: Vec<u8>) -> Self {
        Blob {
            bytes,
            filename: None,
            content_type: ContentType::octet_stream(),
        }
    }

    /// ファイル名を設定
    pub fn with_filename(mut self, filename: &str) -> Self {
        self.filename = Some(filename.to_string());
        self
    }

    /// Content-Type を設定
    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }
}

impl OpaqueLeaf for Blob {
    fn to_section(&self, name: &str, encoding: TextEncoding) -> Result<MultipartSection> {
        let mut content_disposition = ContentDisposition::form_data(name)?;
        if let Some(filename) = &self.filename {
            content_disposition = content_disposition.with_filename(filename, encoding)?;
        }
        Ok(MultipartSection::new(
            content_disposition,
            Some(self.content_type.clone()),
            self.bytes.clone(),
            encoding,
        ))
    }
}

/// ファイルへの参照
///
/// セクションに変換する時点でファイル全体を読み込む。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    path: PathBuf,
    content_type: Option<ContentType>,
}

impl FileRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileRef {
            path: path.into(),
            content_type: None,
        }
    }

    /// 拡張子からの推測の代わりに Content-Type を指定
    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = Some(content_type);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OpaqueLeaf for FileRef {
    fn to_section(&self, name: &str, encoding: TextEncoding) -> Result<MultipartSection> {
        let mut section = MultipartSection::file(name, &self.path, encoding)?;
        if let Some(content_type) = &self.content_type {
            section.content_type = Some(content_type.clone());
        }
        Ok(section)
    }
}

/// 画像フォーマット
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    fn content_type(&self) -> ContentType {
        match self {
            ImageFormat::Png => ContentType::new("image", "png"),
            ImageFormat::Jpeg => ContentType::new("image", "jpeg"),
        }
    }
}

/// エンコード済みの画像
///
/// バイト列は PNG / JPEG としてエンコード済みのものを渡す。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    bytes: Vec<u8>,
    format: ImageFormat,
    filename: Option<String>,
}

impl Image {
    pub fn png(bytes: Vec<u8>) -> Self {
        Image {
            bytes,
            format: ImageFormat::Png,
            filename: None,
        }
    }

    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Image {
            bytes,
            format: ImageFormat::Jpeg,
            filename: None,
        }
    }

    /// ファイル名を設定
    pub fn with_filename(mut self, filename: &str) -> Self {
        self.filename = Some(filename.to_string());
        self
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }
}

impl OpaqueLeaf for Image {
    fn to_section(&self, name: &str, encoding: TextEncoding) -> Result<MultipartSection> {
        let mut content_disposition = ContentDisposition::form_data(name)?;
        if let Some(filename) = &self.filename {
            content_disposition = content_disposition.with_filename(filename, encoding)?;
        }
        Ok(MultipartSection::new(
            content_disposition,
            Some(self.format.content_type()),
            self.bytes.clone(),
            encoding,
        ))
    }
}

/// multipart/form-data ビルダー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartBuilder {
    boundary: String,
    sections: Vec<MultipartSection>,
    max_log_body_size: usize,
}

impl Default for MultipartBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartBuilder {
    /// 現在時刻から境界を生成して作成
    ///
    /// 境界は `xxx<yyyyMMddHHmmss>xxx` 形式。
    pub fn new() -> Self {
        Self::from_timestamp(Local::now().naive_local())
    }

    /// 指定した時刻から境界を生成して作成
    ///
    /// # 例
    ///
    /// ```rust
    /// use chrono::NaiveDate;
    /// use shiguredo_form::multipart::MultipartBuilder;
    ///
    /// let time = NaiveDate::from_ymd_opt(2019, 1, 11)
    ///     .unwrap()
    ///     .and_hms_opt(9, 5, 3)
    ///     .unwrap();
    /// let builder = MultipartBuilder::from_timestamp(time);
    /// assert_eq!(builder.boundary(), "xxx20190111090503xxx");
    /// ```
    pub fn from_timestamp(timestamp: NaiveDateTime) -> Self {
        MultipartBuilder {
            boundary: format!("xxx{}xxx", timestamp.format("%Y%m%d%H%M%S")),
            sections: Vec::new(),
            max_log_body_size: EncoderLimits::default().max_log_body_size,
        }
    }

    /// 境界を指定して作成
    ///
    /// 境界は 1-70 文字の印字可能 US-ASCII で、空白で終わってはならない。
    pub fn with_boundary(boundary: &str) -> Result<Self> {
        let valid = !boundary.is_empty()
            && boundary.len() <= MAX_BOUNDARY_LENGTH
            && boundary.bytes().all(|b| (32..=126).contains(&b))
            && !boundary.ends_with(' ');
        if !valid {
            return Err(Error::InvalidBoundary(boundary.to_string()));
        }
        Ok(MultipartBuilder {
            boundary: boundary.to_string(),
            sections: Vec::new(),
            max_log_body_size: EncoderLimits::default().max_log_body_size,
        })
    }

    /// ログに本文を出力する最大サイズを設定
    pub fn with_max_log_body_size(mut self, max_log_body_size: usize) -> Self {
        self.max_log_body_size = max_log_body_size;
        self
    }

    /// 境界文字列を取得
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Content-Type (`multipart/form-data; boundary=...`)
    pub fn content_type(&self) -> Result<ContentType> {
        ContentType::multipart_form_data(&self.boundary)
    }

    /// セクション一覧
    pub fn sections(&self) -> &[MultipartSection] {
        &self.sections
    }

    /// セクションを追加
    pub fn push(&mut self, section: MultipartSection) {
        self.sections.push(section);
    }

    /// すべてのセクションを取り除く
    pub fn clear(&mut self) {
        self.sections.clear();
    }

    fn delimiter(&self) -> String {
        format!("--{}", self.boundary)
    }

    /// 本文に境界 (`--` + 境界文字列) を含むセクションがないか確認
    ///
    /// 何も書き出さずに [`Error::BoundaryInBody`] を返す。
    pub fn validate(&self) -> Result<()> {
        let delimiter = self.delimiter();
        for section in &self.sections {
            if find_bytes(&section.raw_bytes, delimiter.as_bytes()).is_some() {
                return Err(Error::BoundaryInBody(
                    section.name().unwrap_or_default().to_string(),
                ));
            }
        }
        Ok(())
    }

    /// ボディをメモリ上に生成
    ///
    /// (ボディ, ログ) を返す。
    pub fn generate(&self) -> Result<(Vec<u8>, String)> {
        let mut body = Vec::new();
        let log = self.write(&mut body)?;
        Ok((body, log))
    }

    /// ボディを `out` に逐次書き出し、ログを返す
    ///
    /// 書き込みが途中で失敗した場合、`out` には途中までのバイト列が残る。
    pub fn write<W: Write + ?Sized>(&self, out: &mut W) -> Result<String> {
        self.validate()?;

        let delimiter = self.delimiter();
        let mut log = String::new();
        let mut written = 0usize;
        for section in &self.sections {
            out.write_all(delimiter.as_bytes())?;
            out.write_all(CRLF)?;
            log.push_str(&delimiter);
            log.push('\n');

            log.push_str(&section.write_to(out, self.max_log_body_size)?);
            out.write_all(CRLF)?;
            log.push('\n');
            written += section.raw_bytes.len();
        }
        out.write_all(delimiter.as_bytes())?;
        out.write_all(b"--")?;
        log.push_str(&delimiter);
        log.push_str("--");

        log::debug!(
            "multipart body written: {} sections, {} body bytes, boundary {:?}",
            self.sections.len(),
            written,
            self.boundary
        );
        Ok(log)
    }
}

/// バイト列から部分列を検索
fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    if needle.len() > haystack.len() {
        return None;
    }

    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
