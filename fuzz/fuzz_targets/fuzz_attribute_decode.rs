#![no_main]

use libfuzzer_sys::fuzz_target;
use rxel_core::{Converter, FieldConfig, decode, encode};

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };
    for converter in [Converter::Default, Converter::Json, Converter::Flag, Converter::Url] {
        let config = FieldConfig::new("value").with_converter(converter);
        if let Ok(value) = decode(raw, &config) {
            let _ = encode(&value, &config);
        }
    }
});
