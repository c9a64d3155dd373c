// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fuzz template parsing and the raw-source fallback.
//!
//! 1. `parse` never panics on arbitrary input.
//! 2. `render_or_raw` never panics, and when parsing failed it returns the
//!    trimmed source and reports exactly one failure.
#![no_main]
use errata_template::{Arguments, CollectingSink, Engine, FailureStage, parse};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };

    let parsed = parse(source);
    if let Err(ref e) = parsed {
        let _ = e.to_string();
    }

    let sink = CollectingSink::new();
    let engine = Engine::builder().sink(sink.clone()).build();
    let out = engine.render_or_raw(source, &Arguments::new());

    if parsed.is_err() {
        assert_eq!(out, source.trim());
        let failures = sink.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].stage, FailureStage::Parse);
    }
});
