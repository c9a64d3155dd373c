// SPDX-License-Identifier: MIT OR Apache-2.0
//! Template execution: scopes, path resolution and helper dispatch.

use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::Engine;
use crate::error::TemplateError;
use crate::parser::{Block, Call, Node, Param, Path};
use crate::value::Value;

static NULL: Value = Value::Null;

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// Data variables (`@index`, `@first`, `@last`, `@key`) visible to a block
/// body while iterating.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    position: Option<(usize, usize)>,
    key: Option<String>,
}

impl Frame {
    /// Frame for item `index` of a sequence of `len` items.
    pub fn item(index: usize, len: usize) -> Self {
        Self {
            position: Some((index, len)),
            key: None,
        }
    }

    /// Frame for map entry `key`, the `index`-th of `len` entries.
    pub fn entry(key: impl Into<String>, index: usize, len: usize) -> Self {
        Self {
            position: Some((index, len)),
            key: Some(key.into()),
        }
    }

    /// Zero-based position, when iterating.
    pub fn index(&self) -> Option<usize> {
        self.position.map(|(i, _)| i)
    }

    /// `true` for the first item of an iteration.
    pub fn is_first(&self) -> bool {
        self.position.is_some_and(|(i, _)| i == 0)
    }

    /// `true` for the last item of an iteration.
    pub fn is_last(&self) -> bool {
        self.position.is_some_and(|(i, len)| i + 1 == len)
    }

    /// Map key, when iterating a map.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    fn lookup(&self, name: &str) -> Option<Value> {
        match name {
            "index" => self.index().map(Value::from),
            "first" => self.position.map(|_| Value::Bool(self.is_first())),
            "last" => self.position.map(|_| Value::Bool(self.is_last())),
            "key" => self.key.clone().map(Value::String),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub(crate) struct Scope<'a> {
    value: &'a Value,
    frame: Frame,
    parent: Option<&'a Scope<'a>>,
}

impl<'a> Scope<'a> {
    pub fn root(value: &'a Value) -> Self {
        Self {
            value,
            frame: Frame::default(),
            parent: None,
        }
    }

    fn child(value: &'a Value, frame: Frame, parent: &'a Scope<'a>) -> Self {
        Self {
            value,
            frame,
            parent: Some(parent),
        }
    }

    fn ancestor(&self, levels: usize) -> Option<&Scope<'a>> {
        let mut scope = self;
        for _ in 0..levels {
            scope = scope.parent?;
        }
        Some(scope)
    }

    fn root_scope(&self) -> &Scope<'a> {
        let mut scope = self;
        while let Some(parent) = scope.parent {
            scope = parent;
        }
        scope
    }
}

fn descend<'v>(mut value: &'v Value, segments: &[String]) -> &'v Value {
    for segment in segments {
        match value.get(segment) {
            Some(next) => value = next,
            None => return &NULL,
        }
    }
    value
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

pub(crate) struct Renderer<'e> {
    engine: &'e Engine,
}

impl<'e> Renderer<'e> {
    pub fn new(engine: &'e Engine) -> Self {
        Self { engine }
    }

    pub fn render_nodes(
        &self,
        nodes: &[Node],
        scope: &Scope<'_>,
        out: &mut String,
    ) -> Result<(), TemplateError> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Expression(call) => {
                    let value = self.evaluate(call, scope)?;
                    out.push_str(&value.to_text());
                }
                Node::Block(block) => out.push_str(&self.render_block(block, scope)?),
            }
        }
        Ok(())
    }

    fn resolve<'s>(&self, path: &Path, scope: &'s Scope<'s>) -> Cow<'s, Value> {
        let Some(base) = scope.ancestor(path.parents) else {
            return Cow::Borrowed(&NULL);
        };

        if path.data {
            let (first, rest) = path
                .segments
                .split_first()
                .map_or(("", &[][..]), |(f, r)| (f.as_str(), r));
            if first == "root" {
                return Cow::Borrowed(descend(base.root_scope().value, rest));
            }
            let mut cursor = Some(base);
            while let Some(s) = cursor {
                if let Some(v) = s.frame.lookup(first) {
                    return Cow::Owned(descend(&v, rest).clone());
                }
                cursor = s.parent;
            }
            return Cow::Borrowed(&NULL);
        }

        let Some((first, rest)) = path.segments.split_first() else {
            return Cow::Borrowed(base.value);
        };

        let mut cursor = Some(base);
        while let Some(s) = cursor {
            if let Some(v) = s.value.get(first) {
                return Cow::Borrowed(descend(v, rest));
            }
            if path.explicit {
                break;
            }
            cursor = s.parent;
        }
        Cow::Borrowed(&NULL)
    }

    fn param(&self, param: &Param, scope: &Scope<'_>) -> Result<Value, TemplateError> {
        match param {
            Param::Literal(v) => Ok(v.clone()),
            Param::Path(path) => Ok(self.resolve(path, scope).into_owned()),
            Param::SubExpr(call) => self.evaluate(call, scope),
        }
    }

    /// Evaluate a mustache or sub-expression. Registered helpers take
    /// precedence over context lookups.
    fn evaluate(&self, call: &Call, scope: &Scope<'_>) -> Result<Value, TemplateError> {
        if let Some(name) = call.head.helper_name()
            && let Some(helper) = self.engine.helper(name)
        {
            let invocation = self.invocation(name, call, scope, None)?;
            return helper.call(&invocation).map(Value::String);
        }
        if call.has_arguments() {
            return Err(TemplateError::UnknownHelper {
                name: call.head.raw.clone(),
            });
        }
        Ok(self.resolve(&call.head, scope).into_owned())
    }

    fn invocation<'a>(
        &'a self,
        name: &'a str,
        call: &Call,
        scope: &'a Scope<'a>,
        block: Option<&'a Block>,
    ) -> Result<HelperCall<'a>, TemplateError> {
        let params = call
            .params
            .iter()
            .map(|p| self.param(p, scope))
            .collect::<Result<Vec<_>, _>>()?;
        let hash = call
            .hash
            .iter()
            .map(|(k, p)| Ok((k.clone(), self.param(p, scope)?)))
            .collect::<Result<BTreeMap<_, _>, TemplateError>>()?;
        Ok(HelperCall {
            name,
            params,
            hash,
            renderer: self,
            scope,
            body: block.map(|b| b.body.as_slice()),
            inverse: block.map_or(&[][..], |b| b.inverse.as_slice()),
        })
    }

    fn render_block(&self, block: &Block, scope: &Scope<'_>) -> Result<String, TemplateError> {
        let call = &block.call;

        if block.inverted {
            if call.has_arguments() {
                return Err(TemplateError::helper(
                    call.head.raw.clone(),
                    "inverted sections take no arguments",
                ));
            }
            let value = self.resolve(&call.head, scope);
            let nodes = if value.is_truthy() {
                &block.inverse
            } else {
                &block.body
            };
            return self.render_to_string(nodes, scope);
        }

        if let Some(name) = call.head.helper_name()
            && let Some(helper) = self.engine.helper(name)
        {
            let invocation = self.invocation(name, call, scope, Some(block))?;
            return helper.call(&invocation);
        }

        if call.has_arguments() {
            return Err(TemplateError::UnknownHelper {
                name: call.head.raw.clone(),
            });
        }

        // Mustache section over a context value.
        let value = self.resolve(&call.head, scope);
        match &*value {
            Value::List(items) if !items.is_empty() => {
                let mut out = String::new();
                for (i, item) in items.iter().enumerate() {
                    let child = Scope::child(item, Frame::item(i, items.len()), scope);
                    self.render_nodes(&block.body, &child, &mut out)?;
                }
                Ok(out)
            }
            v if v.is_truthy() => {
                let child = Scope::child(v, Frame::default(), scope);
                self.render_to_string(&block.body, &child)
            }
            _ => self.render_to_string(&block.inverse, scope),
        }
    }

    fn render_to_string(
        &self,
        nodes: &[Node],
        scope: &Scope<'_>,
    ) -> Result<String, TemplateError> {
        let mut out = String::new();
        self.render_nodes(nodes, scope, &mut out)?;
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// HelperCall
// ---------------------------------------------------------------------------

/// Everything a [`Helper`](crate::Helper) sees about one invocation.
pub struct HelperCall<'a> {
    name: &'a str,
    params: Vec<Value>,
    hash: BTreeMap<String, Value>,
    renderer: &'a Renderer<'a>,
    scope: &'a Scope<'a>,
    body: Option<&'a [Node]>,
    inverse: &'a [Node],
}

impl HelperCall<'_> {
    /// Name the helper was invoked under.
    pub fn name(&self) -> &str {
        self.name
    }

    /// Evaluated positional arguments.
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Positional argument `index`, if supplied.
    pub fn param(&self, index: usize) -> Option<&Value> {
        self.params.get(index)
    }

    /// Positional argument `index`, or a [`TemplateError::Helper`] naming
    /// the missing argument.
    pub fn require(&self, index: usize) -> Result<&Value, TemplateError> {
        self.params.get(index).ok_or_else(|| {
            TemplateError::helper(self.name, format!("missing argument #{}", index + 1))
        })
    }

    /// Evaluated `key=value` arguments.
    pub fn hash(&self) -> &BTreeMap<String, Value> {
        &self.hash
    }

    /// The context value at the call site (`this`).
    pub fn context(&self) -> &Value {
        self.scope.value
    }

    /// `true` when invoked as `{{#name}}...{{/name}}`.
    pub fn is_block(&self) -> bool {
        self.body.is_some()
    }

    /// Render the block body with `context` as `this` and `frame` as the
    /// data variables. Inline invocations render the context's plain text.
    pub fn render_body(&self, context: &Value, frame: Frame) -> Result<String, TemplateError> {
        let Some(body) = self.body else {
            return Ok(context.to_text().into_owned());
        };
        let child = Scope::child(context, frame, self.scope);
        self.renderer.render_to_string(body, &child)
    }

    /// Render the block body in the call-site scope.
    pub fn render_body_in_place(&self) -> Result<String, TemplateError> {
        match self.body {
            Some(body) => self.renderer.render_to_string(body, self.scope),
            None => Ok(String::new()),
        }
    }

    /// Render the `{{else}}` section in the call-site scope.
    pub fn render_inverse(&self) -> Result<String, TemplateError> {
        self.renderer.render_to_string(self.inverse, self.scope)
    }
}
