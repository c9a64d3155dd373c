// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in helpers and the [`Helper`] extension trait.

use std::sync::Arc;

use crate::error::TemplateError;
use crate::render::{Frame, HelperCall};
use crate::value::Value;

/// A named formatting function callable from a template.
///
/// Helpers are invoked inline (`{{name args}}`) or as blocks
/// (`{{#name args}}body{{/name}}`); [`HelperCall::is_block`] tells them
/// apart.
pub trait Helper: Send + Sync {
    /// Produce the helper's output for one invocation.
    fn call(&self, call: &HelperCall<'_>) -> Result<String, TemplateError>;
}

/// Adapter that lets plain closures act as helpers.
pub(crate) struct FnHelper<F>(pub F);

impl<F> Helper for FnHelper<F>
where
    F: Fn(&HelperCall<'_>) -> Result<String, TemplateError> + Send + Sync,
{
    fn call(&self, call: &HelperCall<'_>) -> Result<String, TemplateError> {
        (self.0)(call)
    }
}

/// The helpers every [`Engine`](crate::Engine) starts with.
pub(crate) fn builtins() -> Vec<(&'static str, Arc<dyn Helper>)> {
    vec![
        ("em", Arc::new(Em) as Arc<dyn Helper>),
        ("pre", Arc::new(Pre) as Arc<dyn Helper>),
        ("quote", Arc::new(Quote) as Arc<dyn Helper>),
        ("enum", Arc::new(Enumerate) as Arc<dyn Helper>),
        ("join", Arc::new(Join) as Arc<dyn Helper>),
        ("if", Arc::new(If) as Arc<dyn Helper>),
        ("unless", Arc::new(Unless) as Arc<dyn Helper>),
        ("each", Arc::new(Each) as Arc<dyn Helper>),
        ("with", Arc::new(With) as Arc<dyn Helper>),
    ]
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

/// Wrap `text` in Markdown emphasis, escaping literal `*`.
pub fn emphasize(text: &str) -> String {
    format!("*{}*", text.replace('*', "\\*"))
}

/// Wrap `text` in inline-code markers, escaping literal backticks.
pub fn inline_code(text: &str) -> String {
    format!("`{}`", text.replace('`', "\\`"))
}

/// Double-quoted string literal with escaped quotes, backslashes and
/// control characters.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{07}' => out.push_str("\\a"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0b}' => out.push_str("\\v"),
            '\u{0c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c if c.is_control() => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Serial-comma natural-language join: `a`, `a and b`, `a, b, and c`.
pub fn natural_join<S: AsRef<str>>(items: &[S]) -> String {
    match items {
        [] => String::new(),
        [only] => only.as_ref().to_owned(),
        [a, b] => format!("{} and {}", a.as_ref(), b.as_ref()),
        [init @ .., last] => {
            let mut out = String::new();
            for item in init {
                out.push_str(item.as_ref());
                out.push_str(", ");
            }
            out.push_str("and ");
            out.push_str(last.as_ref());
            out
        }
    }
}

/// Text argument of an inline formatting helper: the first parameter, or
/// the rendered body when used as a block.
fn text_argument(call: &HelperCall<'_>) -> Result<String, TemplateError> {
    match call.param(0) {
        Some(v) => Ok(v.to_text().into_owned()),
        None if call.is_block() => call.render_body_in_place(),
        None => Err(TemplateError::helper(call.name(), "expects one argument")),
    }
}

struct Em;

impl Helper for Em {
    fn call(&self, call: &HelperCall<'_>) -> Result<String, TemplateError> {
        text_argument(call).map(|t| emphasize(&t))
    }
}

struct Pre;

impl Helper for Pre {
    fn call(&self, call: &HelperCall<'_>) -> Result<String, TemplateError> {
        text_argument(call).map(|t| inline_code(&t))
    }
}

struct Quote;

impl Helper for Quote {
    fn call(&self, call: &HelperCall<'_>) -> Result<String, TemplateError> {
        text_argument(call).map(|t| quote(&t))
    }
}

// ---------------------------------------------------------------------------
// Sequences
// ---------------------------------------------------------------------------

/// Render every item of the first argument through the block body.
/// Non-sequences yield `None`.
fn render_items(call: &HelperCall<'_>) -> Result<Option<Vec<String>>, TemplateError> {
    let Some(Value::List(items)) = call.param(0) else {
        return Ok(None);
    };
    items
        .iter()
        .enumerate()
        .map(|(i, item)| call.render_body(item, Frame::item(i, items.len())))
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// `{{#enum items}}...{{/enum}}`: one `* item` Markdown bullet per line.
struct Enumerate;

impl Helper for Enumerate {
    fn call(&self, call: &HelperCall<'_>) -> Result<String, TemplateError> {
        let Some(lines) = render_items(call)? else {
            return Ok(String::new());
        };
        Ok(lines
            .iter()
            .map(|line| format!("* {line}"))
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

/// `{{#join items}}...{{/join}}`: natural-language list.
struct Join;

impl Helper for Join {
    fn call(&self, call: &HelperCall<'_>) -> Result<String, TemplateError> {
        Ok(render_items(call)?
            .map(|parts| natural_join(&parts))
            .unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Control flow
// ---------------------------------------------------------------------------

fn require_block(call: &HelperCall<'_>) -> Result<(), TemplateError> {
    if call.is_block() {
        Ok(())
    } else {
        Err(TemplateError::helper(call.name(), "must be used as a block"))
    }
}

struct If;

impl Helper for If {
    fn call(&self, call: &HelperCall<'_>) -> Result<String, TemplateError> {
        require_block(call)?;
        if call.require(0)?.is_truthy() {
            call.render_body_in_place()
        } else {
            call.render_inverse()
        }
    }
}

struct Unless;

impl Helper for Unless {
    fn call(&self, call: &HelperCall<'_>) -> Result<String, TemplateError> {
        require_block(call)?;
        if call.require(0)?.is_truthy() {
            call.render_inverse()
        } else {
            call.render_body_in_place()
        }
    }
}

struct Each;

impl Helper for Each {
    fn call(&self, call: &HelperCall<'_>) -> Result<String, TemplateError> {
        require_block(call)?;
        let mut out = String::new();
        match call.require(0)? {
            Value::List(items) if !items.is_empty() => {
                for (i, item) in items.iter().enumerate() {
                    out.push_str(&call.render_body(item, Frame::item(i, items.len()))?);
                }
            }
            Value::Map(map) if !map.is_empty() => {
                for (i, (key, value)) in map.iter().enumerate() {
                    out.push_str(&call.render_body(value, Frame::entry(key, i, map.len()))?);
                }
            }
            _ => out = call.render_inverse()?,
        }
        Ok(out)
    }
}

struct With;

impl Helper for With {
    fn call(&self, call: &HelperCall<'_>) -> Result<String, TemplateError> {
        require_block(call)?;
        let value = call.require(0)?;
        if value.is_truthy() {
            call.render_body(value, Frame::default())
        } else {
            call.render_inverse()
        }
    }
}
