//! キーパス
//!
//! ## 概要
//!
//! ネストした値の中の位置を `Key` と `Index` のセグメント列で表します。
//! 文字列表現は最初のセグメントをそのまま、以降を `[key]` / `[]` (または `[index]`) で連結したものです。
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_form::{KeyPath, Segment};
//!
//! let path = KeyPath::from(vec![
//!     Segment::key("user"),
//!     Segment::key("tags"),
//!     Segment::Index(1),
//! ]);
//! assert_eq!(path.render(false), "user[tags][]");
//! assert_eq!(path.render(true), "user[tags][1]");
//! ```

use core::fmt;

use crate::error::Result;

/// キーパスのセグメント
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// マップのキー
    Key(String),
    /// シーケンスの添字
    Index(u64),
}

impl Segment {
    /// `Segment::Key` を作成
    pub fn key(key: impl Into<String>) -> Self {
        Segment::Key(key.into())
    }

    /// キーなら文字列を返す
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Segment::Key(key) => Some(key),
            Segment::Index(_) => None,
        }
    }
}

impl From<&str> for Segment {
    fn from(key: &str) -> Self {
        Segment::Key(key.to_string())
    }
}

impl From<String> for Segment {
    fn from(key: String) -> Self {
        Segment::Key(key)
    }
}

impl From<u64> for Segment {
    fn from(index: u64) -> Self {
        Segment::Index(index)
    }
}

/// キーパス
///
/// 等価性は位置ごとの比較 (長さが同じで、同じ位置のセグメントがすべて等しい)。
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct KeyPath(Vec<Segment>);

impl KeyPath {
    /// 空のキーパスを作成
    pub fn new() -> Self {
        KeyPath(Vec::new())
    }

    /// 1 つのキーからなるキーパスを作成
    pub fn key(key: impl Into<String>) -> Self {
        KeyPath(vec![Segment::Key(key.into())])
    }

    /// セグメント列を取得
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    /// セグメント数
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 空かどうか
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 最初のセグメント
    pub fn first(&self) -> Option<&Segment> {
        self.0.first()
    }

    /// 末尾にセグメントを追加
    pub fn push(&mut self, segment: Segment) {
        self.0.push(segment);
    }

    /// 末尾のセグメントを取り除く
    pub fn pop(&mut self) -> Option<Segment> {
        self.0.pop()
    }

    /// 長さ `len` まで切り詰める
    pub fn truncate(&mut self, len: usize) {
        self.0.truncate(len);
    }

    /// ブラケット表記に変換
    ///
    /// `array_index_as_key` が `true` なら添字を `[i]`、`false` なら `[]` にする。
    pub fn render(&self, array_index_as_key: bool) -> String {
        let mut result = String::new();
        for (position, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Key(key) if position == 0 => result.push_str(key),
                Segment::Key(key) => {
                    result.push('[');
                    result.push_str(key);
                    result.push(']');
                }
                Segment::Index(index) if array_index_as_key => {
                    result.push_str(&format!("[{}]", index));
                }
                Segment::Index(_) => result.push_str("[]"),
            }
        }
        result
    }

    /// セグメントのテキストを `escape` で変換しながらブラケット表記にする
    ///
    /// ブラケット自体は変換しない。
    pub fn render_with<F>(&self, array_index_as_key: bool, mut escape: F) -> Result<String>
    where
        F: FnMut(&str) -> Result<String>,
    {
        let mut result = String::new();
        for (position, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Key(key) if position == 0 => result.push_str(&escape(key)?),
                Segment::Key(key) => {
                    result.push('[');
                    result.push_str(&escape(key)?);
                    result.push(']');
                }
                Segment::Index(index) if array_index_as_key => {
                    result.push('[');
                    result.push_str(&escape(&index.to_string())?);
                    result.push(']');
                }
                Segment::Index(_) => result.push_str("[]"),
            }
        }
        Ok(result)
    }
}

impl From<Vec<Segment>> for KeyPath {
    fn from(segments: Vec<Segment>) -> Self {
        KeyPath(segments)
    }
}

impl FromIterator<Segment> for KeyPath {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        KeyPath(iter.into_iter().collect())
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let path: KeyPath = vec![Segment::key("a"), Segment::key("b"), Segment::key("c")].into();
        assert_eq!(path.render(false), "a[b][c]");
        assert_eq!(path.to_string(), "a[b][c]");
    }

    #[test]
    fn test_render_indices() {
        let path: KeyPath = vec![Segment::key("a"), Segment::Index(0), Segment::Index(3)].into();
        assert_eq!(path.render(false), "a[][]");
        assert_eq!(path.render(true), "a[0][3]");
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(KeyPath::new().render(true), "");
        assert_eq!(KeyPath::key("").render(false), "");
    }

    #[test]
    fn test_render_with() {
        let path: KeyPath =
            vec![Segment::key("a b"), Segment::key("c&d"), Segment::Index(2)].into();
        let rendered = path
            .render_with(true, |s| Ok(s.replace(' ', "+").replace('&', "%26")))
            .unwrap();
        assert_eq!(rendered, "a+b[c%26d][2]");
    }

    #[test]
    fn test_positional_equality() {
        let ab: KeyPath = vec![Segment::key("a"), Segment::key("b")].into();
        let ba: KeyPath = vec![Segment::key("b"), Segment::key("a")].into();
        let a: KeyPath = vec![Segment::key("a")].into();
        assert_ne!(ab, ba);
        assert_ne!(ab, a);
        assert_eq!(ab, ab.clone());
        assert_ne!(KeyPath::key("0"), KeyPath::from(vec![Segment::Index(0)]));
    }

    #[test]
    fn test_push_pop_truncate() {
        let mut path = KeyPath::new();
        path.push("a".into());
        path.push(1u64.into());
        path.push("b".into());
        assert_eq!(path.len(), 3);
        assert_eq!(path.pop(), Some(Segment::key("b")));
        path.truncate(1);
        assert_eq!(path, KeyPath::key("a"));
        assert_eq!(path.first().and_then(Segment::as_key), Some("a"));
    }
}
