#![no_main]

use libfuzzer_sys::fuzz_target;
use product_catalog::domain::cursor;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(key) = cursor::decode(s) {
            // Anything that decodes must survive a re-encode
            assert_eq!(cursor::decode(&cursor::encode(&key)).ok(), Some(key));
        }
    }
});
