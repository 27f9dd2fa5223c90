//! パーセントエンコーディング (RFC 3986 Section 2.1)
//!
//! ## 概要
//!
//! 文字集合とテキストエンコーディングを指定してパーセントエンコード/デコードを行います。
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_form::percent::{PercentEncoder, percent_decode, percent_encode};
//! use shiguredo_form::TextEncoding;
//!
//! assert_eq!(percent_encode("hello world"), "hello%20world");
//!
//! let encoder = PercentEncoder::new().with_space_as_plus(true).with_lower_hex(true);
//! assert_eq!(encoder.encode("a b/c").unwrap(), "a+b%2fc");
//!
//! assert_eq!(percent_decode("a+b%2Fc", true, TextEncoding::Utf8).unwrap(), "a b/c");
//! ```

use crate::error::{Error, Result};
use crate::text_encoding::TextEncoding;

/// ASCII 文字の集合
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AsciiSet {
    bits: u128,
}

impl AsciiSet {
    /// 空集合
    pub const EMPTY: AsciiSet = AsciiSet { bits: 0 };

    /// バイト列に含まれる ASCII 文字からなる集合
    pub const fn from_bytes(bytes: &[u8]) -> AsciiSet {
        let mut set = AsciiSet::EMPTY;
        let mut i = 0;
        while i < bytes.len() {
            set = set.add(bytes[i]);
            i += 1;
        }
        set
    }

    /// 文字を追加 (非 ASCII は無視)
    pub const fn add(self, byte: u8) -> AsciiSet {
        if byte >= 0x80 {
            return self;
        }
        AsciiSet {
            bits: self.bits | (1u128 << byte),
        }
    }

    /// 文字を除去
    pub const fn remove(self, byte: u8) -> AsciiSet {
        if byte >= 0x80 {
            return self;
        }
        AsciiSet {
            bits: self.bits & !(1u128 << byte),
        }
    }

    /// 和集合
    pub const fn union(self, other: AsciiSet) -> AsciiSet {
        AsciiSet {
            bits: self.bits | other.bits,
        }
    }

    /// 差集合
    pub const fn difference(self, other: AsciiSet) -> AsciiSet {
        AsciiSet {
            bits: self.bits & !other.bits,
        }
    }

    /// 文字が含まれるか
    pub const fn contains(&self, byte: u8) -> bool {
        byte < 0x80 && self.bits & (1u128 << byte) != 0
    }

    /// 文字列のすべての文字が集合に含まれる ASCII 文字か
    pub fn contains_all(&self, s: &str) -> bool {
        s.bytes().all(|b| self.contains(b))
    }
}

/// ALPHA / DIGIT
pub const ALPHA_NUMERIC: AsciiSet =
    AsciiSet::from_bytes(b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789");
/// unreserved (RFC 3986 Section 2.3)
pub const URI_UNRESERVED: AsciiSet = ALPHA_NUMERIC.union(AsciiSet::from_bytes(b"-._~"));
/// gen-delims (RFC 3986 Section 2.2)
pub const URI_GEN_DELIMS: AsciiSet = AsciiSet::from_bytes(b":/?#[]@");
/// sub-delims (RFC 3986 Section 2.2)
pub const URI_SUB_DELIMS: AsciiSet = AsciiSet::from_bytes(b"!$&'()*+,;=");
/// reserved (RFC 3986 Section 2.2)
pub const URI_RESERVED: AsciiSet = URI_GEN_DELIMS.union(URI_SUB_DELIMS);
/// scheme に使える文字 (RFC 3986 Section 3.1)
pub const URI_SCHEME: AsciiSet = ALPHA_NUMERIC.union(AsciiSet::from_bytes(b"+-."));
/// userinfo でエスケープ不要な文字 (RFC 3986 Section 3.2.1)
pub const URI_USER_INFO: AsciiSet = URI_UNRESERVED.union(URI_SUB_DELIMS).add(b':');
/// reg-name でエスケープ不要な文字 (RFC 3986 Section 3.2.2)
pub const URI_HOST: AsciiSet = URI_UNRESERVED.union(URI_SUB_DELIMS);
/// パスセグメントでエスケープ不要な文字 (RFC 3986 Section 3.3)
pub const URI_PATH_SEGMENT: AsciiSet = URI_UNRESERVED
    .union(URI_SUB_DELIMS)
    .union(AsciiSet::from_bytes(b"@:"));
/// query でエスケープ不要な文字 (RFC 3986 Section 3.4)
pub const URI_QUERY: AsciiSet = URI_PATH_SEGMENT.union(AsciiSet::from_bytes(b"/?"));
/// fragment でエスケープ不要な文字 (RFC 3986 Section 3.5)
pub const URI_FRAGMENT: AsciiSet = URI_QUERY;
/// クエリのキー/値でエスケープ不要な文字
///
/// query の文字から区切りとして意味を持つ `?/&=` と、空白と紛らわしい `+` を除いたもの。
pub const QUERY_COMPONENT: AsciiSet =
    URI_QUERY.difference(AsciiSet::from_bytes(b"?/&=+"));
/// MIME tspecials (RFC 2045 Section 5.1)
pub const MIME_TSPECIALS: AsciiSet = AsciiSet::from_bytes(b"()<>@,;:\\\"/[]?.=");

/// パーセントエンコーダー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PercentEncoder {
    reserved: AsciiSet,
    unreserved: AsciiSet,
    space_as_plus: bool,
    lower_hex: bool,
    encoding: TextEncoding,
}

impl Default for PercentEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl PercentEncoder {
    /// RFC 3986 unreserved 以外をエスケープするエンコーダーを作成
    pub fn new() -> Self {
        PercentEncoder {
            reserved: AsciiSet::EMPTY,
            unreserved: URI_UNRESERVED,
            space_as_plus: false,
            lower_hex: false,
            encoding: TextEncoding::Utf8,
        }
    }

    /// 常にエスケープする文字集合を設定 (unreserved より優先)
    pub fn with_reserved(mut self, reserved: AsciiSet) -> Self {
        self.reserved = reserved;
        self
    }

    /// エスケープしない文字集合を設定
    pub fn with_unreserved(mut self, unreserved: AsciiSet) -> Self {
        self.unreserved = unreserved;
        self
    }

    /// 空白を `+` にするか
    pub fn with_space_as_plus(mut self, space_as_plus: bool) -> Self {
        self.space_as_plus = space_as_plus;
        self
    }

    /// `%xx` を小文字にするか
    pub fn with_lower_hex(mut self, lower_hex: bool) -> Self {
        self.lower_hex = lower_hex;
        self
    }

    /// テキストエンコーディングを設定
    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// テキストエンコーディングを取得
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// 文字列をパーセントエンコード
    ///
    /// 1 バイトになる ASCII 文字のうち unreserved に含まれ reserved に含まれないものだけが
    /// そのまま出力される。それ以外はバイトごとに `%XX` になる。
    pub fn encode(&self, raw: &str) -> Result<String> {
        let mut result = String::with_capacity(raw.len() * 3);
        let mut bytes = Vec::with_capacity(4);
        for c in raw.chars() {
            bytes.clear();
            self.encoding.encode_char(c, &mut bytes)?;

            let escape = match bytes.as_slice() {
                [b] if b.is_ascii() => self.reserved.contains(*b) || !self.unreserved.contains(*b),
                _ => true,
            };

            if !escape {
                result.push(c);
            } else if self.space_as_plus && c == ' ' {
                result.push('+');
            } else {
                for &byte in &bytes {
                    result.push('%');
                    result.push(to_hex_char(byte >> 4, self.lower_hex));
                    result.push(to_hex_char(byte & 0x0F, self.lower_hex));
                }
            }
        }
        Ok(result)
    }
}

/// パーセントエンコーディング (UTF-8, unreserved 以外をエスケープ)
///
/// # 例
///
/// ```rust
/// use shiguredo_form::percent::percent_encode;
///
/// assert_eq!(percent_encode("foo=bar&baz"), "foo%3Dbar%26baz");
/// assert_eq!(percent_encode("日本"), "%E6%97%A5%E6%9C%AC");
/// ```
pub fn percent_encode(input: &str) -> String {
    let mut result = String::with_capacity(input.len() * 3);
    for byte in input.bytes() {
        if URI_UNRESERVED.contains(byte) {
            result.push(byte as char);
        } else {
            result.push('%');
            result.push(to_hex_char(byte >> 4, false));
            result.push(to_hex_char(byte & 0x0F, false));
        }
    }
    result
}

fn to_hex_char(nibble: u8, lower: bool) -> char {
    match nibble {
        0..=9 => (b'0' + nibble) as char,
        10..=15 if lower => (b'a' + nibble - 10) as char,
        10..=15 => (b'A' + nibble - 10) as char,
        _ => unreachable!(),
    }
}

fn from_hex_char(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'A'..=b'F' => Some(c - b'A' + 10),
        b'a'..=b'f' => Some(c - b'a' + 10),
        _ => None,
    }
}

/// パーセントデコーディング
///
/// 連続するエスケープは 1 つのバイト列にまとめてから `encoding` でデコードする。
/// 入力に非 ASCII 文字が含まれる場合、エスケープが不完全な場合、
/// バイト列がデコードできない場合は `Error::InvalidPercentEncoding`。
///
/// # 例
///
/// ```rust
/// use shiguredo_form::percent::percent_decode;
/// use shiguredo_form::TextEncoding;
///
/// assert_eq!(percent_decode("%E6%97%A5%E6%9C%AC", false, TextEncoding::Utf8).unwrap(), "日本");
/// assert_eq!(percent_decode("a+b", false, TextEncoding::Utf8).unwrap(), "a+b");
/// assert!(percent_decode("%E6%97", false, TextEncoding::Utf8).is_err());
/// ```
pub fn percent_decode(input: &str, space_as_plus: bool, encoding: TextEncoding) -> Result<String> {
    if !input.is_ascii() {
        return Err(Error::InvalidPercentEncoding);
    }

    let mut result = String::with_capacity(input.len());
    let mut run: Vec<u8> = Vec::new();
    let mut bytes = input.bytes();

    while let Some(byte) = bytes.next() {
        if byte == b'%' {
            let high = bytes.next().and_then(from_hex_char);
            let low = bytes.next().and_then(from_hex_char);
            match (high, low) {
                (Some(high), Some(low)) => run.push((high << 4) | low),
                _ => return Err(Error::InvalidPercentEncoding),
            }
            continue;
        }

        flush_run(&mut run, encoding, &mut result)?;
        if byte == b'+' && space_as_plus {
            result.push(' ');
        } else {
            result.push(byte as char);
        }
    }
    flush_run(&mut run, encoding, &mut result)?;

    Ok(result)
}

fn flush_run(run: &mut Vec<u8>, encoding: TextEncoding, out: &mut String) -> Result<()> {
    if run.is_empty() {
        return Ok(());
    }
    let decoded = encoding
        .decode(run)
        .ok_or(Error::InvalidPercentEncoding)?;
    out.push_str(&decoded);
    run.clear();
    Ok(())
}
