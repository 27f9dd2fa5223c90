#![no_main]

use libfuzzer_sys::fuzz_target;
use shiguredo_form::content_type::ContentType;

fuzz_target!(|data: &[u8]| {
    // UTF-8 文字列として解釈できる場合のみテスト
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(ct) = ContentType::parse(s) {
            let _ = ct.mime_type();
            let _ = ct.is_text();
            let _ = ct.to_header_line().generate_line();

            // Display 出力を再パース (ラウンドトリップ)
            let displayed = ct.to_string();
            let reparsed = ContentType::parse(&displayed).unwrap();
            assert_eq!(ct.media_type(), reparsed.media_type());
            assert_eq!(ct.subtype(), reparsed.subtype());
            assert_eq!(ct.parameter(), reparsed.parameter());
        }
    }
});
