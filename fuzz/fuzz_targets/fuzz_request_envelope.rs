#![no_main]

use libfuzzer_sys::fuzz_target;
use product_catalog::api::rest::params::{FieldExtractor, RequestEnvelope};
use product_catalog::api::rest::routes::RESOURCE_TEMPLATES;

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(envelope) = RequestEnvelope::from_event_json(raw) else {
        return;
    };
    if let Ok(extractor) = FieldExtractor::new(RESOURCE_TEMPLATES, true) {
        let _ = extractor.extract(&envelope, "codigo");
    }
});
