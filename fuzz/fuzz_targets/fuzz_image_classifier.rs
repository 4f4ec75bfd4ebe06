#![no_main]

use libfuzzer_sys::fuzz_target;
use product_catalog::domain::content_type;

fuzz_target!(|data: &[u8]| {
    let _ = content_type::classify(data);
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = content_type::classify_base64(s);
        let _ = content_type::strip_data_uri(s);
    }
});
