// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fuzz template execution against structured arguments.
#![no_main]
use arbitrary::Arbitrary;
use errata_template::{Arguments, Engine, NullSink, Value};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Arg {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    List(Vec<String>),
}

impl From<Arg> for Value {
    fn from(arg: Arg) -> Self {
        match arg {
            Arg::Null => Value::Null,
            Arg::Bool(b) => Value::from(b),
            Arg::Int(i) => Value::from(i),
            Arg::Text(s) => Value::from(s),
            Arg::List(items) => Value::from(items),
        }
    }
}

#[derive(Debug, Arbitrary)]
struct Input {
    template: String,
    args: Vec<(String, Arg)>,
}

fuzz_target!(|input: Input| {
    let engine = Engine::builder().sink(NullSink).build();
    let args: Arguments = input
        .args
        .into_iter()
        .map(|(k, v)| (k, Value::from(v)))
        .collect();

    let rendered = engine.render(&input.template, &args);
    let fallback = engine.render_or_raw(&input.template, &args);
    match rendered {
        Ok(text) => assert_eq!(text, fallback),
        Err(_) => assert_eq!(fallback, input.template.trim()),
    }
});
