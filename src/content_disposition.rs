//! Content-Disposition ヘッダー (RFC 2183, RFC 7578 Section 4.2)
//!
//! ## 概要
//!
//! multipart/form-data のパートに付ける Content-Disposition を生成します。
//! `name` と `filename` は常に引用符で囲み、埋め込みの `"` はバックスラッシュでエスケープします。
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_form::content_disposition::ContentDisposition;
//! use shiguredo_form::TextEncoding;
//!
//! let cd = ContentDisposition::form_data("user[avatar]").unwrap()
//!     .with_filename("avatar.png", TextEncoding::Utf8)
//!     .unwrap();
//! assert_eq!(
//!     cd.to_string(),
//!     "form-data; name=\"user[avatar]\"; filename=\"avatar.png\""
//! );
//! ```

use core::fmt;

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::header::{HeaderLine, escape_quoted_string, should_quote};
use crate::percent::PercentEncoder;
use crate::text_encoding::TextEncoding;

/// Content-Disposition ヘッダー名
pub const CONTENT_DISPOSITION: &str = "Content-Disposition";

/// RFC 1123 形式 (RFC 2183 Section 2.4 の date-time)
const RFC1123_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Disposition タイプ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispositionType {
    /// inline: コンテンツをインラインで表示
    Inline,
    /// attachment: コンテンツをダウンロードとして扱う
    Attachment,
    /// form-data: multipart/form-data のパート用
    FormData,
}

impl fmt::Display for DispositionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispositionType::Inline => write!(f, "inline"),
            DispositionType::Attachment => write!(f, "attachment"),
            DispositionType::FormData => write!(f, "form-data"),
        }
    }
}

/// Content-Disposition ヘッダー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDisposition {
    disposition_type: DispositionType,
    name: Option<String>,
    filename: Option<String>,
    creation_date: Option<DateTime<Utc>>,
    modification_date: Option<DateTime<Utc>>,
    read_date: Option<DateTime<Utc>>,
    size: Option<u64>,
}

impl ContentDisposition {
    /// 新しい ContentDisposition を作成
    pub fn new(disposition_type: DispositionType) -> Self {
        ContentDisposition {
            disposition_type,
            name: None,
            filename: None,
            creation_date: None,
            modification_date: None,
            read_date: None,
            size: None,
        }
    }

    /// `form-data; name="<name>"`
    ///
    /// `name` は印字可能 ASCII (空白含む) でなければならない。
    pub fn form_data(name: &str) -> Result<Self> {
        ContentDisposition::new(DispositionType::FormData).with_name(name)
    }

    /// name を設定
    pub fn with_name(mut self, name: &str) -> Result<Self> {
        should_quote(name).map_err(|_| Error::InvalidParameterValue(name.to_string()))?;
        self.name = Some(name.to_string());
        Ok(self)
    }

    /// filename を設定
    ///
    /// 印字可能 ASCII 以外を含むファイル名は `encoding` でパーセントエンコードする。
    /// ファイル名がサーバーのファイルシステムで有効かどうかは検証しない。
    pub fn with_filename(mut self, filename: &str, encoding: TextEncoding) -> Result<Self> {
        let filename = match should_quote(filename) {
            Ok(_) => filename.to_string(),
            Err(_) => PercentEncoder::new().with_encoding(encoding).encode(filename)?,
        };
        self.filename = Some(filename);
        Ok(self)
    }

    /// creation-date を設定
    pub fn with_creation_date(mut self, date: DateTime<Utc>) -> Self {
        self.creation_date = Some(date);
        self
    }

    /// modification-date を設定
    pub fn with_modification_date(mut self, date: DateTime<Utc>) -> Self {
        self.modification_date = Some(date);
        self
    }

    /// read-date を設定
    pub fn with_read_date(mut self, date: DateTime<Utc>) -> Self {
        self.read_date = Some(date);
        self
    }

    /// size を設定
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// disposition-type を取得
    pub fn disposition_type(&self) -> DispositionType {
        self.disposition_type
    }

    /// name を取得
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// filename を取得 (エンコード済み)
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// size を取得
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    /// ヘッダー行に変換
    pub fn to_header_line(&self) -> HeaderLine {
        HeaderLine::new(CONTENT_DISPOSITION, &self.to_string())
    }
}

impl fmt::Display for ContentDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.disposition_type)?;

        if let Some(name) = &self.name {
            write!(f, "; name=\"{}\"", escape_quoted_string(name))?;
        }
        if let Some(filename) = &self.filename {
            write!(f, "; filename=\"{}\"", escape_quoted_string(filename))?;
        }

        let dates = [
            ("creation-date", &self.creation_date),
            ("modification-date", &self.modification_date),
            ("read-date", &self.read_date),
        ];
        for (param, date) in dates {
            if let Some(date) = date {
                write!(f, "; {}=\"{}\"", param, date.format(RFC1123_FORMAT))?;
            }
        }

        if let Some(size) = self.size {
            write!(f, "; size={}", size)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_form_data() {
        let cd = ContentDisposition::form_data("x").unwrap();
        assert_eq!(cd.to_string(), "form-data; name=\"x\"");
        assert_eq!(cd.name(), Some("x"));
        assert_eq!(cd.disposition_type(), DispositionType::FormData);
    }

    #[test]
    fn test_name_with_quote() {
        let cd = ContentDisposition::form_data("a\"b").unwrap();
        assert_eq!(cd.to_string(), r#"form-data; name="a\"b""#);
    }

    #[test]
    fn test_name_non_ascii() {
        assert!(matches!(
            ContentDisposition::form_data("名前"),
            Err(Error::InvalidParameterValue(_))
        ));
    }

    #[test]
    fn test_filename_non_ascii_is_percent_encoded() {
        let cd = ContentDisposition::form_data("file")
            .unwrap()
            .with_filename("日本.txt", TextEncoding::Utf8)
            .unwrap();
        assert_eq!(cd.filename(), Some("%E6%97%A5%E6%9C%AC.txt"));
        assert_eq!(
            cd.to_string(),
            "form-data; name=\"file\"; filename=\"%E6%97%A5%E6%9C%AC.txt\""
        );
    }

    #[test]
    fn test_filename_with_space() {
        let cd = ContentDisposition::form_data("file")
            .unwrap()
            .with_filename("my file.txt", TextEncoding::Utf8)
            .unwrap();
        assert_eq!(cd.filename(), Some("my file.txt"));
    }

    #[test]
    fn test_dates_and_size() {
        let date = Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap();
        let cd = ContentDisposition::new(DispositionType::Attachment)
            .with_creation_date(date)
            .with_modification_date(date)
            .with_read_date(date)
            .with_size(42);
        assert_eq!(
            cd.to_string(),
            "attachment; creation-date=\"Sun, 06 Nov 1994 08:49:37 GMT\"; \
             modification-date=\"Sun, 06 Nov 1994 08:49:37 GMT\"; \
             read-date=\"Sun, 06 Nov 1994 08:49:37 GMT\"; size=42"
        );
        assert_eq!(cd.size(), Some(42));
    }

    #[test]
    fn test_to_header_line() {
        let line = ContentDisposition::form_data("a[b][]")
            .unwrap()
            .to_header_line();
        assert_eq!(
            line.generate_line().unwrap(),
            "Content-Disposition: form-data; name=\"a[b][]\""
        );
    }

    #[test]
    fn test_inline_display() {
        let cd = ContentDisposition::new(DispositionType::Inline);
        assert_eq!(cd.to_string(), "inline");
    }
}
