//! パーセントエンコーディングのプロパティテスト

use pbt::{latin1_text, unicode_text};
use proptest::prelude::*;
use shiguredo_form::percent::{
    AsciiSet, PercentEncoder, QUERY_COMPONENT, URI_PATH_SEGMENT, URI_UNRESERVED, percent_decode,
    percent_encode,
};
use shiguredo_form::{Error, TextEncoding};

// エンコード結果は ASCII で、デコードすると元に戻る
proptest! {
    #[test]
    fn percent_encode_roundtrip(s in unicode_text()) {
        let encoded = percent_encode(&s);
        prop_assert!(encoded.is_ascii());
        prop_assert_eq!(percent_decode(&encoded, false, TextEncoding::Utf8).unwrap(), s);
    }
}

// エスケープされずに残る文字は unreserved のみ
proptest! {
    #[test]
    fn percent_encode_output_alphabet(s in unicode_text(), lower_hex in any::<bool>()) {
        let encoded = PercentEncoder::new()
            .with_lower_hex(lower_hex)
            .encode(&s)
            .unwrap();

        let bytes = encoded.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'%' {
                let hex = &encoded[i + 1..i + 3];
                prop_assert!(hex.bytes().all(|b| b.is_ascii_hexdigit()));
                if lower_hex {
                    prop_assert_eq!(hex, hex.to_ascii_lowercase());
                } else {
                    prop_assert_eq!(hex, hex.to_ascii_uppercase());
                }
                i += 3;
            } else {
                prop_assert!(URI_UNRESERVED.contains(bytes[i]));
                i += 1;
            }
        }
    }
}

// 空白を + にしても往復できる
proptest! {
    #[test]
    fn percent_space_as_plus_roundtrip(s in unicode_text()) {
        let encoded = PercentEncoder::new()
            .with_unreserved(QUERY_COMPONENT)
            .with_space_as_plus(true)
            .encode(&s)
            .unwrap();
        prop_assert!(!encoded.contains(' '));
        prop_assert_eq!(percent_decode(&encoded, true, TextEncoding::Utf8).unwrap(), s);
    }
}

// reserved に指定した文字は必ずエスケープされる
proptest! {
    #[test]
    fn percent_reserved_always_escaped(s in "[a-z/:@]{0,16}") {
        let encoded = PercentEncoder::new()
            .with_unreserved(URI_PATH_SEGMENT)
            .with_reserved(AsciiSet::from_bytes(b":"))
            .encode(&s)
            .unwrap();
        prop_assert!(!encoded.contains(':'));
        prop_assert_eq!(encoded.matches("%3A").count(), s.matches(':').count());
        prop_assert_eq!(encoded.matches('@').count(), s.matches('@').count());
    }
}

// Latin-1 で表現できる文字は 1 バイトになる
proptest! {
    #[test]
    fn percent_latin1_roundtrip(s in latin1_text()) {
        let encoder = PercentEncoder::new().with_encoding(TextEncoding::Latin1);
        let encoded = encoder.encode(&s).unwrap();
        prop_assert_eq!(
            encoded.matches('%').count(),
            s.chars().filter(|c| !c.is_ascii() || !URI_UNRESERVED.contains(*c as u8)).count()
        );
        prop_assert_eq!(percent_decode(&encoded, false, TextEncoding::Latin1).unwrap(), s);
    }
}

// Latin-1 で表現できない文字はエラー
proptest! {
    #[test]
    fn percent_latin1_rejects_wide_chars(
        prefix in "[a-z]{0,4}",
        c in prop::char::range('\u{100}', '\u{10ffff}'),
    ) {
        let s = format!("{prefix}{c}");
        let result = PercentEncoder::new().with_encoding(TextEncoding::Latin1).encode(&s);
        prop_assert!(matches!(result, Err(Error::Encoding(found, _)) if found == c));
    }
}

// デコードは任意の入力でパニックしない
proptest! {
    #[test]
    fn percent_decode_never_panics(s in "[%0-9a-fA-Fg+ ]{0,32}", space_as_plus in any::<bool>()) {
        let _ = percent_decode(&s, space_as_plus, TextEncoding::Utf8);
        let _ = percent_decode(&s, space_as_plus, TextEncoding::Ascii);
    }
}

#[test]
fn percent_decode_truncated_escape() {
    for input in ["%", "%4", "a%zz", "%E3%81"] {
        assert!(matches!(
            percent_decode(input, false, TextEncoding::Utf8),
            Err(Error::InvalidPercentEncoding)
        ));
    }
}
