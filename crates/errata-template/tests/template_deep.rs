// SPDX-License-Identifier: MIT OR Apache-2.0
//! Deep behavioural tests for `errata-template`.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use errata_template::{
    Arguments, CollectingSink, Engine, FailureStage, HelperCall, NullSink, TemplateError, Value,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn engine() -> Engine {
    Engine::builder().sink(NullSink).build()
}

fn collecting() -> (CollectingSink, Engine) {
    let sink = CollectingSink::new();
    let engine = Engine::builder().sink(sink.clone()).build();
    (sink, engine)
}

fn args(pairs: &[(&str, Value)]) -> Arguments {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn hosts(names: &[&str]) -> Value {
    names
        .iter()
        .map(|n| {
            let mut m = BTreeMap::new();
            m.insert("name".to_string(), Value::from(*n));
            Value::Map(m)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// 1. Helper semantics
// ---------------------------------------------------------------------------

#[test]
fn join_zero_and_one_items_have_no_separators() {
    let e = engine();
    let src = "[{{#join items}}{{this}}{{/join}}]";
    assert_eq!(
        e.render(src, &args(&[("items", Value::List(vec![]))])).unwrap(),
        "[]"
    );
    assert_eq!(
        e.render(src, &args(&[("items", Value::from(vec!["only"]))]))
            .unwrap(),
        "[only]"
    );
}

#[test]
fn join_four_items_with_formatted_bodies() {
    let e = engine();
    let a = args(&[("hosts", hosts(&["a", "b", "c", "d"]))]);
    assert_eq!(
        e.render("{{#join hosts}}{{em name}}{{/join}}", &a).unwrap(),
        "*a*, *b*, *c*, and *d*"
    );
}

#[test]
fn enum_has_no_trailing_newline() {
    let e = engine();
    let a = args(&[("items", Value::from(vec!["x", "y"]))]);
    let out = e.render("{{#enum items}}{{this}}{{/enum}}", &a).unwrap();
    assert_eq!(out.lines().collect::<Vec<_>>(), vec!["* x", "* y"]);
    assert!(!out.ends_with('\n'));
}

#[test]
fn enum_of_maps_reads_fields() {
    let e = engine();
    let a = args(&[("hosts", hosts(&["db1", "db2"]))]);
    assert_eq!(
        e.render("{{#enum hosts}}{{pre name}} (#{{@index}}){{/enum}}", &a)
            .unwrap(),
        "* `db1` (#0)\n* `db2` (#1)"
    );
}

#[test]
fn nested_enum_and_join() {
    let e = engine();
    let mut group = BTreeMap::new();
    group.insert("name".to_string(), Value::from("g1"));
    group.insert("members".to_string(), Value::from(vec!["x", "y", "z"]));
    let a = args(&[("groups", Value::List(vec![Value::Map(group)]))]);
    assert_eq!(
        e.render(
            "{{#enum groups}}{{name}}: {{#join members}}{{this}}{{/join}}{{/enum}}",
            &a
        )
        .unwrap(),
        "* g1: x, y, and z"
    );
}

#[test]
fn formatting_helpers_as_blocks_wrap_the_body() {
    let e = engine();
    let a = args(&[("x", "v".into())]);
    assert_eq!(e.render("{{#em}}a {{x}}{{/em}}", &a).unwrap(), "*a v*");
    assert_eq!(e.render("{{#pre}}{{x}}{{/pre}}", &a).unwrap(), "`v`");
}

#[test]
fn quote_of_numbers_and_controls() {
    let e = engine();
    let a = args(&[("n", 42.into()), ("ctl", "a\u{0}b".into())]);
    assert_eq!(e.render("{{quote n}}", &a).unwrap(), "\"42\"");
    assert_eq!(e.render("{{quote ctl}}", &a).unwrap(), "\"a\\x00b\"");
}

#[test]
fn string_literals_may_contain_closing_braces() {
    let (sink, e) = collecting();
    let none = Arguments::new();
    assert_eq!(e.render_or_raw(r#"{{quote "a}}b"}}"#, &none), "\"a}}b\"");
    assert_eq!(e.render_or_raw(r#"x {{em "}}"}} y"#, &none), "x *}}* y");
    assert_eq!(e.render_or_raw(r#"{{pre '}}}'}}"#, &none), "`}}}`");
    assert!(sink.is_empty(), "{:?}", sink.failures());
}

#[test]
fn unterminated_literal_still_falls_back() {
    let (sink, e) = collecting();
    let src = r#"{{quote "a}}b"#;
    assert_eq!(e.render_or_raw(src, &Arguments::new()), src);
    assert_eq!(sink.len(), 1);
}

#[test]
fn hash_arguments_reach_custom_helpers() {
    let e = Engine::builder()
        .sink(NullSink)
        .helper_fn("repeat", |call: &HelperCall<'_>| {
            let times = match call.hash().get("times") {
                Some(Value::Int(n)) => *n as usize,
                _ => 1,
            };
            Ok(call.require(0)?.to_text().repeat(times))
        })
        .build();
    assert_eq!(
        e.render(r#"{{repeat "ab" times=3}}"#, &Arguments::new())
            .unwrap(),
        "ababab"
    );
}

#[test]
fn custom_block_helper_renders_inverse() {
    let e = Engine::builder()
        .sink(NullSink)
        .helper_fn("nonempty", |call: &HelperCall<'_>| {
            if call.param(0).is_some_and(Value::is_truthy) {
                call.render_body_in_place()
            } else {
                call.render_inverse()
            }
        })
        .build();
    let src = "{{#nonempty v}}has {{v}}{{else}}empty{{/nonempty}}";
    assert_eq!(e.render(src, &args(&[("v", "x".into())])).unwrap(), "has x");
    assert_eq!(e.render(src, &Arguments::new()).unwrap(), "empty");
}

#[test]
fn helpers_shadow_arguments_of_the_same_name() {
    let e = engine();
    let a = args(&[("em", "argument".into())]);
    assert!(e.render("{{em}}", &a).is_err());
    assert_eq!(e.render("{{this.em}}", &a).unwrap(), "argument");
}

// ---------------------------------------------------------------------------
// 2. Syntax
// ---------------------------------------------------------------------------

#[test]
fn whitespace_control_in_blocks() {
    let e = engine();
    let a = args(&[("items", Value::from(vec!["a", "b"]))]);
    let src = "{{#each items~}}\n  {{this}}\n{{~/each}}";
    assert_eq!(e.render(src, &a).unwrap(), "ab");
}

#[test]
fn comments_and_triple_stash() {
    let e = engine();
    let a = args(&[("x", "<x>".into())]);
    assert_eq!(
        e.render("{{! hidden }}{{{x}}}{{!-- {{x}} --}}{{&x}}", &a)
            .unwrap(),
        "<x><x>"
    );
}

#[test]
fn literal_types_as_parameters() {
    let e = engine();
    let a = Arguments::new();
    assert_eq!(e.render("{{em 3}}", &a).unwrap(), "*3*");
    assert_eq!(e.render("{{em 2.5}}", &a).unwrap(), "*2.5*");
    assert_eq!(e.render("{{em true}}", &a).unwrap(), "*true*");
    assert_eq!(e.render("{{em null}}", &a).unwrap(), "**");
    assert_eq!(e.render("{{em 'single'}}", &a).unwrap(), "*single*");
}

#[test]
fn list_index_paths() {
    let e = engine();
    let a = args(&[("items", Value::from(vec!["zero", "one"]))]);
    assert_eq!(e.render("{{items.1}}", &a).unwrap(), "one");
    assert_eq!(e.render("{{items}}", &a).unwrap(), "zero, one");
}

#[test]
fn parse_errors_carry_positions() {
    let err = errata_template::parse("ok\n{{#if x}}\n{{/each}}").unwrap_err();
    assert_eq!(
        err,
        TemplateError::MismatchedClose {
            expected: "if".into(),
            found: "each".into(),
            line: 3,
            column: 1,
        }
    );
}

#[test]
fn parsed_templates_are_reusable() {
    let e = engine();
    let template = e.parse("hello {{name}}").unwrap();
    assert_eq!(template.source(), "hello {{name}}");
    for name in ["a", "b"] {
        let out = e
            .execute(&template, &args(&[("name", name.into())]))
            .unwrap();
        assert_eq!(out, format!("hello {name}"));
    }
}

// ---------------------------------------------------------------------------
// 3. Failure policy
// ---------------------------------------------------------------------------

#[test]
fn every_failure_kind_falls_back_to_raw_source() {
    let sink = CollectingSink::new();
    let e = Engine::builder().sink(sink.clone()).build();
    let cases = [
        ("{{#enum items}}{{this}}", FailureStage::Parse),
        ("{{/join}}", FailureStage::Parse),
        ("{{unknown_helper x}}", FailureStage::Render),
        ("{{#if}}x{{/if}}", FailureStage::Render),
        ("{{if x}}", FailureStage::Render),
    ];
    for (src, stage) in cases {
        sink.clear();
        assert_eq!(e.render_or_raw(src, &Arguments::new()), src);
        let failures = sink.failures();
        assert_eq!(failures.len(), 1, "one report for {src:?}");
        assert_eq!(failures[0].stage, stage, "stage for {src:?}");
    }
}

#[test]
fn successful_renders_report_nothing() {
    let sink = CollectingSink::new();
    let e = Engine::builder().sink(sink.clone()).build();
    e.render_or_raw("fine {{x}}", &Arguments::new());
    assert!(sink.is_empty());
}

#[test]
fn failing_custom_helper_falls_back() {
    let sink = CollectingSink::new();
    let e = Engine::builder()
        .sink(sink.clone())
        .helper_fn("boom", |call: &HelperCall<'_>| {
            Err(TemplateError::helper(call.name(), "exploded"))
        })
        .build();
    assert_eq!(e.render_or_raw("a {{boom}} b", &Arguments::new()), "a {{boom}} b");
    assert_eq!(
        sink.failures()[0].error,
        TemplateError::helper("boom", "exploded")
    );
}

#[test]
fn helper_invocations_are_counted_per_render() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let e = Engine::builder()
        .sink(NullSink)
        .helper_fn("tick", move |_: &HelperCall<'_>| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok("t".into())
        })
        .build();
    let a = args(&[("items", Value::from(vec![1, 2, 3]))]);
    assert_eq!(
        e.render("{{#each items}}{{tick}}{{/each}}", &a).unwrap(),
        "ttt"
    );
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}
