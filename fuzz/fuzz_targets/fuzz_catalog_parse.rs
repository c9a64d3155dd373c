// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fuzz catalog TOML parsing, validation and registry construction.
//!
//! 1. `parse_toml` never panics.
//! 2. `validate_config` never panics and warnings display cleanly.
//! 3. A catalog that validates always builds, with one kind per entry.
//! 4. TOML round-trip is lossless.
#![no_main]
use errata_config::{Catalog, parse_toml, validate_config};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(config) = parse_toml(s) else {
        return;
    };

    match validate_config(&config) {
        Ok(warnings) => {
            for w in &warnings {
                let _ = w.to_string();
            }
            let catalog = Catalog::from_config(&config).expect("validated catalog must build");
            assert_eq!(catalog.len(), config.kind_count());
            for kind in catalog.iter() {
                let _ = catalog.error(&kind.id()).map(|e| e.to_string());
            }
        }
        Err(e) => {
            let _ = e.to_string();
        }
    }

    if let Ok(text) = toml::to_string(&config)
        && let Ok(rt) = parse_toml(&text)
    {
        assert_eq!(config, rt, "TOML round-trip must be lossless");
    }
});
