#![no_main]

use libfuzzer_sys::fuzz_target;
use shiguredo_form::TextEncoding;
use shiguredo_form::percent::{PercentEncoder, QUERY_COMPONENT, percent_decode, percent_encode};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let encoded = percent_encode(s);
        assert_eq!(percent_decode(&encoded, false, TextEncoding::Utf8).unwrap(), s);

        let encoded = PercentEncoder::new()
            .with_unreserved(QUERY_COMPONENT)
            .with_space_as_plus(true)
            .with_lower_hex(true)
            .encode(s)
            .unwrap();
        assert_eq!(percent_decode(&encoded, true, TextEncoding::Utf8).unwrap(), s);

        // Latin-1 / ASCII で表現できない文字はエラーになるだけ
        let _ = PercentEncoder::new().with_encoding(TextEncoding::Latin1).encode(s);
        let _ = PercentEncoder::new().with_encoding(TextEncoding::Ascii).encode(s);

        for encoding in [TextEncoding::Utf8, TextEncoding::Ascii, TextEncoding::Latin1] {
            let _ = percent_decode(s, false, encoding);
            let _ = percent_decode(s, true, encoding);
        }
    }
});
