//! ヘッダー行 (RFC 5322 Section 2.2)
//!
//! ## 概要
//!
//! multipart パートのヘッダー行を検証して生成します。折り返し (folding) はサポートしません。
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_form::header::{HeaderLine, should_quote};
//!
//! let line = HeaderLine::new("Content-Type", "text/plain");
//! assert_eq!(line.generate_line().unwrap(), "Content-Type: text/plain");
//!
//! assert!(should_quote("a b").unwrap());
//! assert!(!should_quote("token").unwrap());
//! ```

use crate::error::{Error, Result};
use crate::percent::MIME_TSPECIALS;

/// ヘッダー行の最大長 (RFC 5322 Section 2.1.1)
pub const MAX_HEADER_LINE_LENGTH: usize = 998;

/// ヘッダー行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLine {
    name: String,
    body: String,
}

impl HeaderLine {
    /// 新しいヘッダー行を作成 (検証は `generate_line` で行う)
    pub fn new(name: &str, body: &str) -> Self {
        HeaderLine {
            name: name.to_string(),
            body: body.to_string(),
        }
    }

    /// ヘッダー名を取得
    pub fn name(&self) -> &str {
        &self.name
    }

    /// ヘッダー値を取得
    pub fn body(&self) -> &str {
        &self.body
    }

    /// ヘッダー名が有効か
    ///
    /// 空白とコロンを除く印字可能 ASCII のみ。
    pub fn is_valid_name(&self) -> bool {
        !self.name.is_empty()
            && self
                .name
                .bytes()
                .all(|b| (33..=126).contains(&b) && b != b':')
    }

    /// ヘッダー値が有効か
    ///
    /// 空白と水平タブを含む印字可能 ASCII のみ、最大 998 バイト。
    pub fn is_valid_body(&self) -> bool {
        self.body.len() <= MAX_HEADER_LINE_LENGTH
            && self
                .body
                .bytes()
                .all(|b| (32..=126).contains(&b) || b == b'\t')
    }

    /// `name: body` 形式の行を生成
    pub fn generate_line(&self) -> Result<String> {
        if !self.is_valid_name() {
            return Err(Error::InvalidHeaderName(self.name.clone()));
        }
        if !self.is_valid_body() {
            return Err(Error::InvalidHeaderBody(self.body.clone()));
        }
        Ok(format!("{}: {}", self.name, self.body))
    }
}

/// パラメータ値を引用符で囲む必要があるか
///
/// tspecials または空白を含む場合は `true`。
/// それ以外の印字可能 ASCII 以外の文字を含む場合はエラー。
pub fn should_quote(value: &str) -> Result<bool> {
    let mut quote = false;
    for byte in value.bytes() {
        if MIME_TSPECIALS.contains(byte) || byte == b' ' {
            quote = true;
        } else if !(33..=126).contains(&byte) {
            return Err(Error::InvalidHeaderBody(value.to_string()));
        }
    }
    Ok(quote)
}

/// 引用符付き文字列用にエスケープ
pub(crate) fn escape_quoted_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '"' || c == '\\' {
            result.push('\\');
        }
        result.push(c);
    }
    result
}
