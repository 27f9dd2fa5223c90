/// エンコーダーの制限設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderLimits {
    /// 最大ネスト深さ (デフォルト: 64)
    ///
    /// トップレベルのコンテナを深さ 1 として数える。
    /// これを超える構造は `Error::StructureTooDeep` になる。
    pub max_depth: usize,
    /// ログに本文をそのまま出力する最大サイズ (デフォルト: 1KB)
    ///
    /// これより大きいパート本体は `BINARY: N bytes` としてログに出す。
    pub max_log_body_size: usize,
}

impl Default for EncoderLimits {
    fn default() -> Self {
        Self {
            max_depth: 64,
            max_log_body_size: 1024, // 1KB
        }
    }
}

impl EncoderLimits {
    /// 制限なしの設定を作成
    pub fn unlimited() -> Self {
        Self {
            max_depth: usize::MAX,
            max_log_body_size: usize::MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let limits = EncoderLimits::default();
        assert_eq!(limits.max_depth, 64);
        assert_eq!(limits.max_log_body_size, 1024);
    }

    #[test]
    fn test_unlimited() {
        let limits = EncoderLimits::unlimited();
        assert_eq!(limits.max_depth, usize::MAX);
        assert_eq!(limits.max_log_body_size, usize::MAX);
    }
}
