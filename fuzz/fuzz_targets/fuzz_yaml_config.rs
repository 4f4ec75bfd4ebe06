#![no_main]

use figment::Figment;
use figment::providers::{Format, Yaml};
use libfuzzer_sys::fuzz_target;
use product_catalog::CatalogConfig;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = Figment::new().merge(Yaml::string(s)).extract::<CatalogConfig>();
    }
});
