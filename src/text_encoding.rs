//! テキストエンコーディング
//!
//! パーセントエンコーディングと multipart 本体で使う文字列 <-> バイト列の変換。
//! どのエンコーディングも ASCII 互換なので、ASCII 文字は常に 1 バイトになる。

use crate::error::{Error, Result};

/// テキストエンコーディング
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    /// UTF-8
    #[default]
    Utf8,
    /// US-ASCII (0x00-0x7F)
    Ascii,
    /// ISO-8859-1 (U+0000-U+00FF)
    Latin1,
}

impl TextEncoding {
    /// Content-Type の charset パラメータ値
    pub fn charset(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Ascii => "us-ascii",
            TextEncoding::Latin1 => "iso-8859-1",
        }
    }

    /// 1 文字をエンコードして `out` に追加
    pub fn encode_char(&self, c: char, out: &mut Vec<u8>) -> Result<()> {
        match self {
            TextEncoding::Utf8 => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
            TextEncoding::Ascii => {
                if !c.is_ascii() {
                    return Err(Error::Encoding(c, self.charset()));
                }
                out.push(c as u8);
            }
            TextEncoding::Latin1 => {
                let code = u32::from(c);
                if code > 0xFF {
                    return Err(Error::Encoding(c, self.charset()));
                }
                out.push(code as u8);
            }
        }
        Ok(())
    }

    /// 文字列をエンコード
    pub fn encode(&self, s: &str) -> Result<Vec<u8>> {
        if *self == TextEncoding::Utf8 {
            return Ok(s.as_bytes().to_vec());
        }
        let mut out = Vec::with_capacity(s.len());
        for c in s.chars() {
            self.encode_char(c, &mut out)?;
        }
        Ok(out)
    }

    /// バイト列をデコード
    ///
    /// デコードできない場合は `None`。
    pub fn decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            TextEncoding::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_string),
            TextEncoding::Ascii => {
                if bytes.is_ascii() {
                    Some(bytes.iter().map(|&b| b as char).collect())
                } else {
                    None
                }
            }
            TextEncoding::Latin1 => Some(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }
}
