//! Content-Type ヘッダー (RFC 2045 Section 5.1)
//!
//! ## 概要
//!
//! `type/subtype` と最大 1 つのパラメータからなる Content-Type を扱います。
//! 非 ASCII のパラメータ値はサポートしません (RFC 2047 は対象外)。
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_form::content_type::ContentType;
//! use shiguredo_form::TextEncoding;
//!
//! let ct = ContentType::text("plain", TextEncoding::Utf8);
//! assert_eq!(ct.to_string(), "text/plain; charset=utf-8");
//!
//! let ct = ContentType::multipart_form_data("a b").unwrap();
//! assert_eq!(ct.to_string(), "multipart/form-data; boundary=\"a b\"");
//!
//! let ct = ContentType::parse("image/png").unwrap();
//! assert_eq!(ct.mime_type(), "image/png");
//! ```

use core::fmt;
use std::path::Path;

use crate::error::{Error, Result};
use crate::header::{HeaderLine, escape_quoted_string, should_quote};
use crate::percent::MIME_TSPECIALS;
use crate::text_encoding::TextEncoding;

/// Content-Type ヘッダー名
pub const CONTENT_TYPE: &str = "Content-Type";

/// Content-Type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// メディアタイプ (例: "text")
    media_type: String,
    /// サブタイプ (例: "plain")
    subtype: String,
    /// パラメータ (name, value)
    parameter: Option<(String, String)>,
}

impl ContentType {
    /// 新しい ContentType を作成
    ///
    /// `media_type` と `subtype` は検証しない。
    pub fn new(media_type: &str, subtype: &str) -> Self {
        ContentType {
            media_type: media_type.to_string(),
            subtype: subtype.to_string(),
            parameter: None,
        }
    }

    /// パラメータを設定
    ///
    /// 名前は tspecials と空白を含まない印字可能 ASCII、
    /// 値は印字可能 ASCII (必要なら引用符で囲まれる) でなければならない。
    pub fn with_parameter(mut self, name: &str, value: &str) -> Result<Self> {
        let valid_name = !name.is_empty()
            && name
                .bytes()
                .all(|b| (33..=126).contains(&b) && !MIME_TSPECIALS.contains(b));
        if !valid_name {
            return Err(Error::InvalidParameterName(name.to_string()));
        }
        should_quote(value).map_err(|_| Error::InvalidParameterValue(value.to_string()))?;

        self.parameter = Some((name.to_string(), value.to_string()));
        Ok(self)
    }

    /// `text/<subtype>; charset=<encoding>`
    pub fn text(subtype: &str, encoding: TextEncoding) -> Self {
        ContentType {
            media_type: "text".to_string(),
            subtype: subtype.to_string(),
            parameter: Some(("charset".to_string(), encoding.charset().to_string())),
        }
    }

    /// `multipart/form-data; boundary=<boundary>`
    pub fn multipart_form_data(boundary: &str) -> Result<Self> {
        ContentType::new("multipart", "form-data").with_parameter("boundary", boundary)
    }

    /// `application/x-www-form-urlencoded; charset=<encoding>`
    pub fn form_urlencoded(encoding: TextEncoding) -> Self {
        ContentType {
            media_type: "application".to_string(),
            subtype: "x-www-form-urlencoded".to_string(),
            parameter: Some(("charset".to_string(), encoding.charset().to_string())),
        }
    }

    /// `application/octet-stream`
    pub fn octet_stream() -> Self {
        ContentType::new("application", "octet-stream")
    }

    /// ファイル拡張子から推測する (不明なら `application/octet-stream`)
    pub fn from_path(path: &Path) -> Self {
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        ContentType::new(mime.type_().as_str(), mime.subtype().as_str())
    }

    /// Content-Type 文字列をパース
    ///
    /// メディアタイプは小文字に正規化し、パラメータ値の大文字小文字は保持する。
    ///
    /// # 例
    ///
    /// ```rust
    /// use shiguredo_form::content_type::ContentType;
    ///
    /// let ct = ContentType::parse("Text/HTML; charset=\"UTF-8\"").unwrap();
    /// assert_eq!(ct.mime_type(), "text/html");
    /// assert_eq!(ct.parameter(), Some(("charset", "UTF-8")));
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || Error::InvalidHeaderBody(input.to_string());

        let input = input.trim();
        let (media, rest) = match input.split_once(';') {
            Some((media, rest)) => (media.trim(), rest.trim()),
            None => (input, ""),
        };

        let (media_type, subtype) = media.split_once('/').ok_or_else(invalid)?;
        let (media_type, subtype) = (media_type.trim(), subtype.trim());
        if !is_valid_token(media_type) || !is_valid_token(subtype) {
            return Err(invalid());
        }

        let ct = ContentType::new(
            &media_type.to_ascii_lowercase(),
            &subtype.to_ascii_lowercase(),
        );
        if rest.is_empty() {
            return Ok(ct);
        }

        let (name, value) = rest.split_once('=').ok_or_else(invalid)?;
        let name = name.trim().to_ascii_lowercase();
        let value = value.trim();
        let value = match value.strip_prefix('"') {
            Some(quoted) => parse_quoted_string(quoted).ok_or_else(invalid)?,
            None if value.contains(';') => {
                return Err(Error::InvalidParameterValue(value.to_string()));
            }
            None => value.to_string(),
        };
        ct.with_parameter(&name, &value)
    }

    /// メディアタイプを取得 (例: "text")
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// サブタイプを取得 (例: "plain")
    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    /// 完全なメディアタイプを取得 (例: "text/plain")
    pub fn mime_type(&self) -> String {
        format!("{}/{}", self.media_type, self.subtype)
    }

    /// パラメータを取得
    pub fn parameter(&self) -> Option<(&str, &str)> {
        self.parameter
            .as_ref()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// text/* かどうか
    pub fn is_text(&self) -> bool {
        self.media_type.eq_ignore_ascii_case("text")
    }

    /// ヘッダー行に変換
    pub fn to_header_line(&self) -> HeaderLine {
        HeaderLine::new(CONTENT_TYPE, &self.to_string())
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.media_type, self.subtype)?;
        if let Some((name, value)) = &self.parameter {
            // with_parameter で検証済みなので Err にはならない
            if should_quote(value).unwrap_or(true) {
                write!(f, "; {}=\"{}\"", name, escape_quoted_string(value))?;
            } else {
                write!(f, "; {}={}", name, value)?;
            }
        }
        Ok(())
    }
}

/// 引用符付き文字列をパース (閉じ引用符の後は空白のみ許す)
fn parse_quoted_string(input: &str) -> Option<String> {
    let mut result = String::new();
    let mut escaped = false;

    for (i, c) in input.char_indices() {
        if escaped {
            result.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            return input[i + 1..].trim().is_empty().then_some(result);
        } else {
            result.push(c);
        }
    }

    None
}

/// メディアタイプのトークンとして有効か (RFC 2045 Section 5.1)
///
/// `vnd.ms-excel` のようなサブタイプのため `.` は許す。
fn is_valid_token(s: &str) -> bool {
    !s.is_empty()
        && s
            .bytes()
            .all(|b| (33..=126).contains(&b) && (b == b'.' || !MIME_TSPECIALS.contains(b)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let ct = ContentType::new("text", "html");
        assert_eq!(ct.to_string(), "text/html");

        let ct = ContentType::text("plain", TextEncoding::Utf8);
        assert_eq!(ct.to_string(), "text/plain; charset=utf-8");
    }

    #[test]
    fn test_display_quoted() {
        let ct = ContentType::new("text", "plain")
            .with_parameter("name", "hello world")
            .unwrap();
        assert_eq!(ct.to_string(), "text/plain; name=\"hello world\"");
    }

    #[test]
    fn test_display_escaped_quote() {
        let ct = ContentType::new("text", "plain")
            .with_parameter("name", "say\"hi\"")
            .unwrap();
        assert_eq!(ct.to_string(), r#"text/plain; name="say\"hi\"""#);
    }

    #[test]
    fn test_invalid_parameter_name() {
        for name in ["", "a b", "a=b", "名前"] {
            assert!(matches!(
                ContentType::new("text", "plain").with_parameter(name, "v"),
                Err(Error::InvalidParameterName(_))
            ));
        }
    }

    #[test]
    fn test_invalid_parameter_value() {
        assert!(matches!(
            ContentType::new("text", "plain").with_parameter("name", "日本"),
            Err(Error::InvalidParameterValue(_))
        ));
        assert!(matches!(
            ContentType::new("text", "plain").with_parameter("name", "a\r\n"),
            Err(Error::InvalidParameterValue(_))
        ));
    }

    #[test]
    fn test_multipart_form_data() {
        let ct = ContentType::multipart_form_data("xxx20190101000000xxx").unwrap();
        assert_eq!(
            ct.to_string(),
            "multipart/form-data; boundary=xxx20190101000000xxx"
        );
    }

    #[test]
    fn test_form_urlencoded() {
        let ct = ContentType::form_urlencoded(TextEncoding::Utf8);
        assert_eq!(
            ct.to_string(),
            "application/x-www-form-urlencoded; charset=utf-8"
        );
    }

    #[test]
    fn test_from_path() {
        assert_eq!(
            ContentType::from_path(Path::new("photo.png")).mime_type(),
            "image/png"
        );
        assert_eq!(
            ContentType::from_path(Path::new("notes.txt")).mime_type(),
            "text/plain"
        );
        assert_eq!(
            ContentType::from_path(Path::new("data.unknown-ext")).mime_type(),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_parse() {
        let ct = ContentType::parse("text/html").unwrap();
        assert_eq!(ct.media_type(), "text");
        assert_eq!(ct.subtype(), "html");
        assert!(ct.parameter().is_none());

        let ct = ContentType::parse("  TEXT/Plain ; charset = utf-8 ").unwrap();
        assert_eq!(ct.mime_type(), "text/plain");
        assert_eq!(ct.parameter(), Some(("charset", "utf-8")));

        let ct = ContentType::parse("application/vnd.ms-excel").unwrap();
        assert_eq!(ct.subtype(), "vnd.ms-excel");
    }

    #[test]
    fn test_parse_quoted_with_escape() {
        let ct = ContentType::parse("text/plain; name=\"hello\\\"world\"").unwrap();
        assert_eq!(ct.parameter(), Some(("name", "hello\"world")));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(ContentType::parse("").is_err());
        assert!(ContentType::parse("text").is_err());
        assert!(ContentType::parse("text/").is_err());
        assert!(ContentType::parse("text/plain; charset").is_err());
        assert!(ContentType::parse("text/plain; name=\"open").is_err());
        assert!(ContentType::parse("text/plain; a=1; b=2").is_err());
    }

    #[test]
    fn test_to_header_line() {
        let line = ContentType::octet_stream().to_header_line();
        assert_eq!(
            line.generate_line().unwrap(),
            "Content-Type: application/octet-stream"
        );
    }
}
