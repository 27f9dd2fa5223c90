#![no_main]

use libfuzzer_sys::fuzz_target;
use shiguredo_form::UrlBuilder;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(url) = UrlBuilder::parse(s) {
            // パースできた URL は生成でき、生成結果もパースできる
            if let Ok(generated) = url.generate() {
                let reparsed = UrlBuilder::parse(&generated).unwrap();
                assert_eq!(reparsed.scheme, url.scheme);
                assert_eq!(reparsed.port, url.port);
                assert_eq!(reparsed.fragment, url.fragment);
            }
        }
    }
});
