//! URL クエリ (application/x-www-form-urlencoded)
//!
//! ## 概要
//!
//! キーパス付きのパラメータを蓄積し、`key=value&...` 形式の文字列を生成・パースします。
//!
//! - キーは最初のセグメントをそのまま、以降を `[key]` / `[]` (または `[index]`) で連結する
//! - セグメントの中身と値はパーセントエンコードし、ブラケットはそのまま出力する
//! - パースは fail-closed で、1 つでも不正な要素があれば全体が失敗する
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_form::{KeyPath, QueryBuilder, Segment};
//!
//! let mut query = QueryBuilder::new();
//! query.set("q", "rust lang");
//! query.add(KeyPath::from(vec![Segment::key("tags"), Segment::Index(0)]), "a&b");
//! assert_eq!(query.generate().unwrap(), "q=rust%20lang&tags[]=a%26b");
//!
//! let mut parsed = QueryBuilder::new();
//! assert_eq!(parsed.add_parameters_from("q=rust%20lang&tags[]=a%26b"), 2);
//! assert_eq!(parsed.get("q"), Some("rust lang"));
//! ```

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::key_path::{KeyPath, Segment};
use crate::percent::{AsciiSet, PercentEncoder, QUERY_COMPONENT, percent_decode};
use crate::text_encoding::TextEncoding;

/// クエリパラメータ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParameter {
    pub key_path: KeyPath,
    pub value: String,
}

impl QueryParameter {
    /// 新しいパラメータを作成
    pub fn new(key_path: KeyPath, value: impl Into<String>) -> Self {
        QueryParameter {
            key_path,
            value: value.into(),
        }
    }
}

/// クエリビルダー
///
/// パラメータは追加順に保持され、同じキーパスの重複も許す。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryBuilder {
    parameters: Vec<QueryParameter>,
    unreserved: AsciiSet,
    space_as_plus: bool,
    lower_hex: bool,
    encoding: TextEncoding,
    array_index_as_key: bool,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryBuilder {
    /// 空のクエリビルダーを作成
    pub fn new() -> Self {
        QueryBuilder {
            parameters: Vec::new(),
            unreserved: QUERY_COMPONENT,
            space_as_plus: false,
            lower_hex: false,
            encoding: TextEncoding::Utf8,
            array_index_as_key: false,
        }
    }

    /// エスケープしない文字集合を設定 (デフォルトは [`QUERY_COMPONENT`])
    pub fn with_unreserved(mut self, unreserved: AsciiSet) -> Self {
        self.unreserved = unreserved;
        self
    }

    /// 空白を `+` にするか (パース時は `+` を空白として扱う)
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

    /// 添字を `[i]` として出力するか (デフォルトは `[]`)
    pub fn with_array_index_as_key(mut self, array_index_as_key: bool) -> Self {
        self.array_index_as_key = array_index_as_key;
        self
    }

    /// テキストエンコーディングを取得
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// パラメータ一覧
    pub fn parameters(&self) -> &[QueryParameter] {
        &self.parameters
    }

    /// パラメータ数
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    /// パラメータがないか
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// パラメータを末尾に追加
    pub fn add(&mut self, key_path: KeyPath, value: impl Into<String>) {
        self.parameters.push(QueryParameter::new(key_path, value));
    }

    /// 指定したキーパスの最初のパラメータ
    pub fn parameter(&self, key_path: &KeyPath) -> Option<&QueryParameter> {
        self.parameters.iter().find(|p| p.key_path == *key_path)
    }

    /// 指定したキーパスの最初のパラメータを取り除く
    pub fn remove_parameter(&mut self, key_path: &KeyPath) -> Option<QueryParameter> {
        let position = self
            .parameters
            .iter()
            .position(|p| p.key_path == *key_path)?;
        Some(self.parameters.remove(position))
    }

    /// すべてのパラメータを取り除く
    pub fn remove_all(&mut self) {
        self.parameters.clear();
    }

    /// 最上位キーの値を取得
    pub fn get(&self, key: &str) -> Option<&str> {
        self.parameter(&KeyPath::key(key))
            .map(|p| p.value.as_str())
    }

    /// 最上位キーの値を設定
    ///
    /// 既にあれば最初のものを置き換え、なければ末尾に追加する。
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let key_path = KeyPath::key(key);
        match self.parameters.iter_mut().find(|p| p.key_path == key_path) {
            Some(parameter) => parameter.value = value.into(),
            None => self.add(key_path, value),
        }
    }

    /// 最上位キーのパラメータを取り除く
    pub fn remove(&mut self, key: &str) -> Option<QueryParameter> {
        self.remove_parameter(&KeyPath::key(key))
    }

    fn percent_encoder(&self) -> PercentEncoder {
        PercentEncoder::new()
            .with_unreserved(self.unreserved)
            .with_space_as_plus(self.space_as_plus)
            .with_lower_hex(self.lower_hex)
            .with_encoding(self.encoding)
    }

    /// クエリ文字列を生成
    ///
    /// キーが空になるパラメータは出力しない。
    pub fn generate(&self) -> Result<String> {
        let encoder = self.percent_encoder();
        let mut pairs = Vec::with_capacity(self.parameters.len());
        for parameter in &self.parameters {
            let key = parameter
                .key_path
                .render_with(self.array_index_as_key, |s| encoder.encode(s))?;
            if key.is_empty() {
                continue;
            }
            let value = encoder.encode(&parameter.value)?;
            pairs.push(format!("{}={}", key, value));
        }
        let query = pairs.join("&");
        log::debug!(
            "generated query: {} parameters, {} bytes",
            pairs.len(),
            query.len()
        );
        Ok(query)
    }

    /// クエリ文字列をパースしてパラメータを追加
    ///
    /// 追加した数を返す。不正なクエリの場合は何も追加せず 0 を返す。
    pub fn add_parameters_from(&mut self, query: &str) -> usize {
        match parse_query(query, self.space_as_plus, self.encoding) {
            Ok(parsed) => {
                let count = parsed.len();
                self.parameters.extend(parsed);
                count
            }
            Err(e) => {
                log::warn!("query parse voided: {}", e);
                0
            }
        }
    }
}

/// クエリ文字列をパース
///
/// - `&` で分割し、各要素はちょうど 1 つの `=` を含まなければならない
/// - キーと値はパーセントデコードする
/// - `[]` は最上位キーごとのカウンタから添字を割り当てる
/// - 空の要素、閉じていないブラケット、`]` の後の文字などは `Error::MalformedQuery`
///
/// 空文字列は空のリストになる。
///
/// # 例
///
/// ```rust
/// use shiguredo_form::{KeyPath, Segment, TextEncoding};
/// use shiguredo_form::query::parse_query;
///
/// let params = parse_query("a[]=1&a[]=2&b[c]=3", false, TextEncoding::Utf8).unwrap();
/// assert_eq!(
///     params[1].key_path,
///     KeyPath::from(vec![Segment::key("a"), Segment::Index(1)])
/// );
/// assert_eq!(
///     params[2].key_path,
///     KeyPath::from(vec![Segment::key("b"), Segment::key("c")])
/// );
///
/// assert!(parse_query("a[=1", false, TextEncoding::Utf8).is_err());
/// ```
pub fn parse_query(
    query: &str,
    space_as_plus: bool,
    encoding: TextEncoding,
) -> Result<Vec<QueryParameter>> {
    if query.is_empty() {
        return Ok(Vec::new());
    }

    let mut counters: HashMap<String, u64> = HashMap::new();
    let mut parameters = Vec::new();

    for component in query.split('&') {
        let malformed = || Error::MalformedQuery(component.to_string());

        let (raw_key, raw_value) = component.split_once('=').ok_or_else(malformed)?;
        if raw_value.contains('=') {
            return Err(malformed());
        }

        let key = percent_decode(raw_key, space_as_plus, encoding)?;
        let value = percent_decode(raw_value, space_as_plus, encoding)?;
        let key_path = parse_key(&key, &mut counters).ok_or_else(malformed)?;

        parameters.push(QueryParameter { key_path, value });
    }

    Ok(parameters)
}

/// `main[a][]` 形式のキーを分解
fn parse_key(key: &str, counters: &mut HashMap<String, u64>) -> Option<KeyPath> {
    let mut parts = key.split('[');
    let main = parts.next().filter(|main| !main.is_empty())?;

    let mut key_path = KeyPath::key(main);
    for part in parts {
        let name = part.strip_suffix(']')?;
        if name.contains(']') {
            return None;
        }
        if name.is_empty() {
            let counter = counters.entry(main.to_string()).or_insert(0);
            key_path.push(Segment::Index(*counter));
            *counter += 1;
        } else {
            key_path.push(Segment::Key(name.to_string()));
        }
    }
    Some(key_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(segments: Vec<Segment>) -> KeyPath {
        KeyPath::from(segments)
    }

    #[test]
    fn test_generate_brackets() {
        let mut query = QueryBuilder::new();
        query.add(KeyPath::key("a"), "1");
        query.add(path(vec![Segment::key("b"), Segment::Index(0)]), "10");
        query.add(path(vec![Segment::key("b"), Segment::Index(1)]), "20");
        assert_eq!(query.generate().unwrap(), "a=1&b[]=10&b[]=20");

        let query = query.with_array_index_as_key(true);
        assert_eq!(query.generate().unwrap(), "a=1&b[0]=10&b[1]=20");
    }

    #[test]
    fn test_generate_escapes_segments() {
        let mut query = QueryBuilder::new();
        query.add(path(vec![Segment::key("a=b"), Segment::key("c d")]), "x+y/z?");
        assert_eq!(query.generate().unwrap(), "a%3Db[c%20d]=x%2By%2Fz%3F");
    }

    #[test]
    fn test_generate_options() {
        let mut query = QueryBuilder::new()
            .with_space_as_plus(true)
            .with_lower_hex(true);
        query.set("k", "a b/c");
        assert_eq!(query.generate().unwrap(), "k=a+b%2fc");
    }

    #[test]
    fn test_generate_skips_empty_key() {
        let mut query = QueryBuilder::new();
        query.add(KeyPath::new(), "x");
        query.add(KeyPath::key(""), "y");
        query.add(KeyPath::key("a"), "");
        assert_eq!(query.generate().unwrap(), "a=");
    }

    #[test]
    fn test_generate_latin1() {
        let mut query = QueryBuilder::new().with_encoding(TextEncoding::Latin1);
        query.set("name", "café");
        assert_eq!(query.generate().unwrap(), "name=caf%E9");

        query.set("name", "日本");
        assert!(matches!(query.generate(), Err(Error::Encoding('日', _))));
    }

    #[test]
    fn test_get_set_remove() {
        let mut query = QueryBuilder::new();
        assert_eq!(query.get("a"), None);
        query.set("a", "1");
        query.add(path(vec![Segment::key("a"), Segment::key("b")]), "2");
        query.set("a", "3");
        assert_eq!(query.get("a"), Some("3"));
        assert_eq!(query.len(), 2);

        let nested = path(vec![Segment::key("a"), Segment::key("b")]);
        assert_eq!(query.parameter(&nested).map(|p| p.value.as_str()), Some("2"));

        assert_eq!(query.remove("a").map(|p| p.value), Some("3".to_string()));
        assert_eq!(query.get("a"), None);
        assert!(query.remove_parameter(&nested).is_some());
        assert!(query.is_empty());
    }

    #[test]
    fn test_remove_all() {
        let mut query = QueryBuilder::new();
        query.set("a", "1");
        query.set("b", "2");
        query.remove_all();
        assert!(query.is_empty());
        assert_eq!(query.generate().unwrap(), "");
    }

    #[test]
    fn test_parse_simple() {
        let params = parse_query("a=1&b=x%20y&c=", false, TextEncoding::Utf8).unwrap();
        assert_eq!(
            params,
            [
                QueryParameter::new(KeyPath::key("a"), "1"),
                QueryParameter::new(KeyPath::key("b"), "x y"),
                QueryParameter::new(KeyPath::key("c"), ""),
            ]
        );
    }

    #[test]
    fn test_parse_index_counter_per_top_level_key() {
        let params =
            parse_query("a[]=1&b[]=2&a[]=3&a[x][]=4", false, TextEncoding::Utf8).unwrap();
        let paths: Vec<&KeyPath> = params.iter().map(|p| &p.key_path).collect();
        assert_eq!(
            paths,
            [
                &path(vec![Segment::key("a"), Segment::Index(0)]),
                &path(vec![Segment::key("b"), Segment::Index(0)]),
                &path(vec![Segment::key("a"), Segment::Index(1)]),
                &path(vec![Segment::key("a"), Segment::key("x"), Segment::Index(2)]),
            ]
        );
    }

    #[test]
    fn test_parse_encoded_brackets() {
        let params = parse_query("a%5Bb%5D=1", false, TextEncoding::Utf8).unwrap();
        assert_eq!(
            params[0].key_path,
            path(vec![Segment::key("a"), Segment::key("b")])
        );
    }

    #[test]
    fn test_parse_space_as_plus() {
        let params = parse_query("a=x+y", true, TextEncoding::Utf8).unwrap();
        assert_eq!(params[0].value, "x y");
        let params = parse_query("a=x+y", false, TextEncoding::Utf8).unwrap();
        assert_eq!(params[0].value, "x+y");
    }

    #[test]
    fn test_parse_malformed() {
        for query in [
            "a",
            "a=1=2",
            "a=1&&b=2",
            "a=1&",
            "=1",
            "[]=1",
            "a[=1",
            "a[b]c=1",
            "a[b]]=1",
            "a[b][=1",
        ] {
            assert!(
                matches!(
                    parse_query(query, false, TextEncoding::Utf8),
                    Err(Error::MalformedQuery(_))
                ),
                "{query}"
            );
        }
        assert!(matches!(
            parse_query("a=%zz", false, TextEncoding::Utf8),
            Err(Error::InvalidPercentEncoding)
        ));
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_query("", false, TextEncoding::Utf8).unwrap().is_empty());
    }

    #[test]
    fn test_add_parameters_from_is_all_or_nothing() {
        let mut query = QueryBuilder::new();
        query.set("keep", "1");
        assert_eq!(query.add_parameters_from("a=1&b[=2"), 0);
        assert_eq!(query.len(), 1);
        assert_eq!(query.add_parameters_from("a=1&b[]=2"), 2);
        assert_eq!(query.len(), 3);
    }

    #[test]
    fn test_roundtrip() {
        let mut query = QueryBuilder::new();
        query.add(KeyPath::key("name"), "山田 太郎");
        query.add(path(vec![Segment::key("tags"), Segment::Index(0)]), "a&b");
        query.add(path(vec![Segment::key("tags"), Segment::Index(1)]), "c=d");
        query.add(path(vec![Segment::key("user"), Segment::key("age")]), "42");
        let generated = query.generate().unwrap();

        let parsed = parse_query(&generated, false, TextEncoding::Utf8).unwrap();
        assert_eq!(parsed, query.parameters());
    }
}
