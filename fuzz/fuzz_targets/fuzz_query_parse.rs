#![no_main]

use libfuzzer_sys::fuzz_target;
use shiguredo_form::query::parse_query;
use shiguredo_form::{QueryBuilder, TextEncoding};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(parameters) = parse_query(s, false, TextEncoding::Utf8) {
            // パースできたクエリは生成し直してもう一度パースできる
            let mut builder = QueryBuilder::new().with_array_index_as_key(true);
            for parameter in &parameters {
                builder.add(parameter.key_path.clone(), parameter.value.clone());
            }
            let generated = builder.generate().unwrap();
            let reparsed = parse_query(&generated, false, TextEncoding::Utf8).unwrap();
            assert_eq!(reparsed.len(), parameters.len());
            for (a, b) in reparsed.iter().zip(&parameters) {
                assert_eq!(a.value, b.value);
            }
        }

        let mut builder = QueryBuilder::new()
            .with_space_as_plus(true)
            .with_encoding(TextEncoding::Latin1);
        let added = builder.add_parameters_from(s);
        assert_eq!(added, builder.len());
    }
});
