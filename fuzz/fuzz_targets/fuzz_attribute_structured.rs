#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rxel_core::{ComponentClass, Converter, decode, encode, to_camel_case, to_kebab_case};

#[derive(Arbitrary, Debug)]
enum FuzzConverter {
    Default,
    Json,
    Flag,
    Url,
}

#[derive(Arbitrary, Debug)]
struct FuzzField {
    name: String,
    converter: FuzzConverter,
    reflect: bool,
    raw: String,
}

impl FuzzConverter {
    fn to_converter(&self) -> Converter {
        match self {
            FuzzConverter::Default => Converter::Default,
            FuzzConverter::Json => Converter::Json,
            FuzzConverter::Flag => Converter::Flag,
            FuzzConverter::Url => Converter::Url,
        }
    }
}

fuzz_target!(|input: Vec<FuzzField>| {
    let class = ComponentClass::new("x-fuzz");
    for field in input.iter().take(32) {
        let kebab = to_kebab_case(&field.name);
        if field.name.starts_with(|c: char| c.is_ascii_lowercase())
            && field.name.chars().all(|c| c.is_ascii_alphanumeric())
        {
            assert_eq!(to_camel_case(&kebab), field.name);
        }
        let Ok(config) = class.configure_field(field.name.as_str(), |f| {
            f.set_converter(field.converter.to_converter())
                .set_reflect(field.reflect);
        }) else {
            continue;
        };
        if let Ok(value) = decode(&field.raw, &config) {
            let _ = encode(&value, &config);
        }
    }
    let config = class.seal();
    assert_eq!(config.len(), class.observed_attribute_names().len());
});
