// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fuzz error construction: arbitrary identities, builder steps and cause
//! trees.
//!
//! Checks that sensitivity never decreases along a builder sequence, that
//! causes keep insertion order, and that the DTO serialises.
#![no_main]
use arbitrary::Arbitrary;
use errata_error::{Domain, ErrataError, ErrataErrorDto, ErrorKind, Section, Sensitivity};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Step {
    Sensitivity(u8),
    Bug,
    Argument(String, String),
    Cause(String),
    Foreign(String),
}

#[derive(Debug, Arbitrary)]
struct Input {
    domain: String,
    section: String,
    code: String,
    friendly: String,
    steps: Vec<Step>,
}

fuzz_target!(|input: Input| {
    let kind = ErrorKind::new(
        Domain::new(input.domain, ""),
        Section::new(input.section, ""),
        input.code,
        "",
    )
    .with_friendly(input.friendly.clone())
    .with_technical(input.friendly);

    let mut err = ErrataError::new(&kind);
    let mut causes = Vec::new();
    for step in input.steps {
        let before = err.sensitivity();
        err = match step {
            Step::Sensitivity(n) => {
                let level = Sensitivity::LEVELS[usize::from(n) % Sensitivity::LEVELS.len()];
                err.with_sensitivity(level)
            }
            Step::Bug => err.bug(),
            Step::Argument(k, v) => err.with_argument(k, v),
            Step::Cause(code) => {
                causes.push(code.clone());
                err.with_cause(ErrataError::new(&kind.clone().with_title(code)))
            }
            Step::Foreign(message) => {
                causes.push(String::new());
                err.with_cause(std::io::Error::other(message))
            }
        };
        assert!(err.sensitivity() >= before);
    }

    assert_eq!(err.causes().len(), causes.len());
    let _ = err.to_string();
    let dto = ErrataErrorDto::from(&err);
    let _ = serde_json::to_string(&dto).expect("dto serialises");
});
