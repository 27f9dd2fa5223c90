use std::io;

/// フォームエンコードエラー
///
/// トラバーサル、パーセントエンコーディング、ヘッダー生成、
/// multipart 出力のいずれで発生したエラーもこの型で返す。
/// エラーが返った時点でバックエンドの状態は不定なので、再利用する前にリセットすること。
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// 指定されたテキストエンコーディングで表現できない文字
    #[error("character {0:?} cannot be represented in {1}")]
    Encoding(char, &'static str),
    /// 不正なパーセントエンコーディング
    #[error("invalid percent encoding")]
    InvalidPercentEncoding,
    /// 不正なヘッダー名 (RFC 5322 Section 2.2)
    #[error("invalid header name: {0:?}")]
    InvalidHeaderName(String),
    /// 不正なヘッダー値 (RFC 5322 Section 2.2)
    #[error("invalid header body: {0:?}")]
    InvalidHeaderBody(String),
    /// URI スキームに使えない文字 (RFC 3986 Section 3.1)
    #[error("invalid scheme character in {0:?}")]
    InvalidSchemeCharacter(String),
    /// 不正な MIME パラメータ名
    #[error("invalid parameter name: {0:?}")]
    InvalidParameterName(String),
    /// 不正な MIME パラメータ値
    #[error("invalid parameter value: {0:?}")]
    InvalidParameterValue(String),
    /// key-path で表現できない値
    #[error("parameter is not encodable: {0}")]
    ParameterNotEncodable(String),
    /// ネストが深すぎる
    #[error("structure too deep: {depth} > {limit}")]
    StructureTooDeep { depth: usize, limit: usize },
    /// 一時ファイルを作成できなかった
    #[error("failed to create temporary file")]
    TempFileCreationFailed(#[source] io::Error),
    /// 不正なクエリ文字列
    #[error("malformed query component: {0:?}")]
    MalformedQuery(String),
    /// 不正な multipart 境界 (RFC 2046 Section 5.1.1)
    #[error("invalid multipart boundary: {0:?}")]
    InvalidBoundary(String),
    /// 境界文字列がパート本体に含まれている
    #[error("multipart boundary appears inside part {0:?}")]
    BoundaryInBody(String),
    /// I/O エラー
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    /// その他 (serde 由来のメッセージなど)
    #[error("{0}")]
    Custom(String),
}

/// このクレートの Result
pub type Result<T> = std::result::Result<T, Error>;
