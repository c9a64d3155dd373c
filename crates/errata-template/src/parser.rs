// SPDX-License-Identifier: MIT OR Apache-2.0
//! Lexer and parser for the template language.
//!
//! Parsing happens in three passes: the source is split into text and tag
//! tokens, whitespace control (`~`) is applied to neighbouring text, and the
//! token stream is folded into a tree of [`Node`]s.

use crate::error::TemplateError;
use crate::value::Value;

/// Deepest allowed nesting of blocks and sub-expressions.
const MAX_DEPTH: usize = 64;

// ---------------------------------------------------------------------------
// AST
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Text(String),
    Expression(Call),
    Block(Block),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Block {
    pub call: Call,
    /// `{{^name}}` sections render their body when the value is falsy.
    pub inverted: bool,
    pub body: Vec<Node>,
    pub inverse: Vec<Node>,
}

/// `head param* key=param*`
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Call {
    pub head: Path,
    pub params: Vec<Param>,
    pub hash: Vec<(String, Param)>,
}

impl Call {
    pub fn has_arguments(&self) -> bool {
        !self.params.is_empty() || !self.hash.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Param {
    Literal(Value),
    Path(Path),
    SubExpr(Box<Call>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Path {
    pub raw: String,
    /// Number of leading `../`.
    pub parents: usize,
    /// `@index`, `@first`, `@root.x`, ...
    pub data: bool,
    /// Written as `this.x` / `./x` / `../x`: no lookup in enclosing scopes.
    pub explicit: bool,
    pub segments: Vec<String>,
}

impl Path {
    fn parse(raw: &str) -> Result<Self, String> {
        let mut rest = raw;
        let data = if let Some(r) = rest.strip_prefix('@') {
            rest = r;
            true
        } else {
            false
        };

        let mut parents = 0;
        loop {
            if let Some(r) = rest.strip_prefix("../") {
                parents += 1;
                rest = r;
            } else if rest == ".." {
                parents += 1;
                rest = "";
            } else {
                break;
            }
        }

        let mut explicit = parents > 0;
        if rest == "this" || rest == "." {
            rest = "";
            explicit = true;
        } else if let Some(r) = rest
            .strip_prefix("this.")
            .or_else(|| rest.strip_prefix("this/"))
            .or_else(|| rest.strip_prefix("./"))
        {
            rest = r;
            explicit = true;
        }

        let segments = if rest.is_empty() {
            Vec::new()
        } else {
            let segments: Vec<String> = rest.split(['.', '/']).map(str::to_owned).collect();
            if segments.iter().any(String::is_empty) {
                return Err(format!("invalid path `{raw}`"));
            }
            segments
        };

        if data && segments.is_empty() {
            return Err(format!("invalid data variable `{raw}`"));
        }

        Ok(Self {
            raw: raw.to_owned(),
            parents,
            data,
            explicit,
            segments,
        })
    }

    /// The name to look up in the helper registry, if the path is a bare
    /// identifier.
    pub fn helper_name(&self) -> Option<&str> {
        match self.segments.as_slice() {
            [only] if !self.data && !self.explicit => Some(only),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Text(String),
    Comment,
    Mustache(String),
    Open { content: String, inverted: bool },
    Close(String),
    Else,
}

#[derive(Debug, Clone, PartialEq)]
struct Token {
    kind: TokenKind,
    offset: usize,
    strip_left: bool,
    strip_right: bool,
}

fn tokenize(src: &str) -> Result<Vec<Token>, TemplateError> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while let Some(rel) = src[pos..].find("{{") {
        let open = pos + rel;
        if open > pos {
            tokens.push(text_token(&src[pos..open], pos));
        }

        let mut i = open + 2;
        let triple = src[i..].starts_with('{');
        if triple {
            i += 1;
        }
        let strip_left = src[i..].starts_with('~');
        if strip_left {
            i += 1;
        }

        if !triple && src[i..].starts_with("!--") {
            let (end, strip_right) = find_comment_end(src, i + 3)
                .ok_or_else(|| TemplateError::parse_at(src, open, "unterminated comment"))?;
            tokens.push(Token {
                kind: TokenKind::Comment,
                offset: open,
                strip_left,
                strip_right,
            });
            pos = end;
            continue;
        }

        let closer = if triple { "}}}" } else { "}}" };
        let close = if src[i..].starts_with('!') {
            src[i..].find(closer).map(|rel| i + rel)
        } else {
            find_closer(src, i, closer)
        }
        .ok_or_else(|| TemplateError::parse_at(src, open, "unterminated tag"))?;
        let mut content_end = close;
        let strip_right = content_end > i && src[..content_end].ends_with('~');
        if strip_right {
            content_end -= 1;
        }
        let content = src[i..content_end].trim();
        pos = close + closer.len();

        let kind = if triple {
            TokenKind::Mustache(content.to_owned())
        } else {
            classify(src, open, content)?
        };
        tokens.push(Token {
            kind,
            offset: open,
            strip_left,
            strip_right,
        });
    }

    if pos < src.len() {
        tokens.push(text_token(&src[pos..], pos));
    }

    apply_whitespace_control(&mut tokens);
    Ok(tokens)
}

fn text_token(text: &str, offset: usize) -> Token {
    Token {
        kind: TokenKind::Text(text.to_owned()),
        offset,
        strip_left: false,
        strip_right: false,
    }
}

/// Byte offset of `closer` at or after `from`, skipping quoted string
/// literals. An unterminated quote is left for the expression lexer to
/// report.
fn find_closer(src: &str, from: usize, closer: &str) -> Option<usize> {
    let bytes = src.as_bytes();
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'"' | b'\'') => match skip_quoted(bytes, i, quote) {
                Some(next) => i = next,
                None => return src[i..].find(closer).map(|rel| i + rel),
            },
            _ if bytes[i..].starts_with(closer.as_bytes()) => return Some(i),
            _ => i += 1,
        }
    }
    None
}

/// Offset just past the quote closing the literal opened at `start`.
fn skip_quoted(bytes: &[u8], start: usize, quote: u8) -> Option<usize> {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

/// Returns the byte offset just past `--}}` (or `--~}}`) and whether it
/// carried a strip marker.
fn find_comment_end(src: &str, from: usize) -> Option<(usize, bool)> {
    let mut search = from;
    while let Some(rel) = src[search..].find("--") {
        let dashes = search + rel;
        let after = &src[dashes + 2..];
        if after.starts_with("}}") {
            return Some((dashes + 4, false));
        }
        if after.starts_with("~}}") {
            return Some((dashes + 5, true));
        }
        search = dashes + 1;
    }
    None
}

fn classify(src: &str, offset: usize, content: &str) -> Result<TokenKind, TemplateError> {
    let kind = if content.starts_with('!') {
        TokenKind::Comment
    } else if let Some(rest) = content.strip_prefix('#') {
        if rest.starts_with('>') || rest.starts_with('*') {
            return Err(TemplateError::parse_at(
                src,
                offset,
                "partials and decorators are not supported",
            ));
        }
        TokenKind::Open {
            content: rest.trim().to_owned(),
            inverted: false,
        }
    } else if let Some(rest) = content.strip_prefix('^') {
        let rest = rest.trim();
        if rest.is_empty() {
            TokenKind::Else
        } else {
            TokenKind::Open {
                content: rest.to_owned(),
                inverted: true,
            }
        }
    } else if let Some(rest) = content.strip_prefix('/') {
        TokenKind::Close(rest.trim().to_owned())
    } else if content.starts_with('>') {
        return Err(TemplateError::parse_at(
            src,
            offset,
            "partials are not supported",
        ));
    } else if let Some(rest) = content.strip_prefix('&') {
        TokenKind::Mustache(rest.trim().to_owned())
    } else if content == "else" {
        TokenKind::Else
    } else if content.starts_with("else ") {
        return Err(TemplateError::parse_at(
            src,
            offset,
            "chained `else` is not supported",
        ));
    } else {
        TokenKind::Mustache(content.to_owned())
    };

    if let TokenKind::Mustache(c) | TokenKind::Open { content: c, .. } | TokenKind::Close(c) =
        &kind
        && c.is_empty()
    {
        return Err(TemplateError::parse_at(src, offset, "empty tag"));
    }
    Ok(kind)
}

fn apply_whitespace_control(tokens: &mut [Token]) {
    for i in 0..tokens.len() {
        let (strip_left, strip_right) = (tokens[i].strip_left, tokens[i].strip_right);
        if strip_left
            && i > 0
            && let TokenKind::Text(text) = &mut tokens[i - 1].kind
        {
            let trimmed = text.trim_end().len();
            text.truncate(trimmed);
        }
        if strip_right
            && let Some(next) = tokens.get_mut(i + 1)
            && let TokenKind::Text(text) = &mut next.kind
        {
            *text = text.trim_start().to_owned();
        }
    }
}

// ---------------------------------------------------------------------------
// Expression lexing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Lexeme {
    Ident(String),
    Literal(Value),
    Key(String),
    LParen,
    RParen,
}

fn lex_expression(content: &str) -> Result<Vec<Lexeme>, String> {
    let chars: Vec<char> = content.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c == '(' {
            out.push(Lexeme::LParen);
            i += 1;
        } else if c == ')' {
            out.push(Lexeme::RParen);
            i += 1;
        } else if c == '"' || c == '\'' {
            let (s, next) = lex_string(&chars, i)?;
            out.push(Lexeme::Literal(Value::String(s)));
            i = next;
        } else if c.is_ascii_digit()
            || (c == '-' && chars.get(i + 1).is_some_and(char::is_ascii_digit))
        {
            let start = i;
            i += 1;
            while i < chars.len()
                && (chars[i].is_ascii_digit() || matches!(chars[i], '.' | 'e' | 'E' | '+' | '-'))
            {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            let value = if let Ok(n) = text.parse::<i64>() {
                Value::Int(n)
            } else if let Ok(x) = text.parse::<f64>() {
                Value::Float(x)
            } else {
                return Err(format!("invalid number `{text}`"));
            };
            out.push(Lexeme::Literal(value));
        } else if c == '=' {
            return Err("unexpected `=`".into());
        } else {
            let start = i;
            while i < chars.len()
                && !chars[i].is_whitespace()
                && !matches!(chars[i], '(' | ')' | '=' | '"' | '\'')
            {
                i += 1;
            }
            let ident: String = chars[start..i].iter().collect();
            if chars.get(i) == Some(&'=') {
                i += 1;
                out.push(Lexeme::Key(ident));
                continue;
            }
            out.push(match ident.as_str() {
                "true" => Lexeme::Literal(Value::Bool(true)),
                "false" => Lexeme::Literal(Value::Bool(false)),
                "null" | "undefined" => Lexeme::Literal(Value::Null),
                _ => Lexeme::Ident(ident),
            });
        }
    }
    Ok(out)
}

fn lex_string(chars: &[char], start: usize) -> Result<(String, usize), String> {
    let quote = chars[start];
    let mut out = String::new();
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => {
                let Some(&escaped) = chars.get(i + 1) else {
                    break;
                };
                out.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    '0' => '\0',
                    other => other,
                });
                i += 2;
            }
            c if c == quote => return Ok((out, i + 1)),
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    Err("unterminated string literal".into())
}

// ---------------------------------------------------------------------------
// Call parsing
// ---------------------------------------------------------------------------

struct CallParser {
    lexemes: Vec<Lexeme>,
    pos: usize,
}

impl CallParser {
    fn call(&mut self, depth: usize, nested: bool) -> Result<Call, String> {
        if depth > MAX_DEPTH {
            return Err("sub-expressions nested too deeply".into());
        }
        let head = match self.lexemes.get(self.pos) {
            Some(Lexeme::Ident(name)) => Path::parse(name)?,
            Some(_) => return Err("expected a name".into()),
            None => return Err("empty expression".into()),
        };
        self.pos += 1;

        let mut params = Vec::new();
        let mut hash = Vec::new();
        loop {
            match self.lexemes.get(self.pos) {
                None if nested => return Err("unclosed `(`".into()),
                None => break,
                Some(Lexeme::RParen) if nested => {
                    self.pos += 1;
                    break;
                }
                Some(Lexeme::RParen) => return Err("unexpected `)`".into()),
                Some(Lexeme::Key(key)) => {
                    let key = key.clone();
                    self.pos += 1;
                    let value = self.param(depth)?;
                    hash.push((key, value));
                }
                Some(_) => params.push(self.param(depth)?),
            }
        }
        Ok(Call { head, params, hash })
    }

    fn param(&mut self, depth: usize) -> Result<Param, String> {
        let lexeme = self
            .lexemes
            .get(self.pos)
            .cloned()
            .ok_or_else(|| "missing value".to_string())?;
        self.pos += 1;
        match lexeme {
            Lexeme::Ident(name) => Ok(Param::Path(Path::parse(&name)?)),
            Lexeme::Literal(value) => Ok(Param::Literal(value)),
            Lexeme::LParen => Ok(Param::SubExpr(Box::new(self.call(depth + 1, true)?))),
            Lexeme::RParen => Err("unexpected `)`".into()),
            Lexeme::Key(key) => Err(format!("unexpected `{key}=`")),
        }
    }
}

fn parse_call(src: &str, offset: usize, content: &str) -> Result<Call, TemplateError> {
    let lexemes = lex_expression(content).map_err(|m| TemplateError::parse_at(src, offset, m))?;
    let mut parser = CallParser { lexemes, pos: 0 };
    parser
        .call(0, false)
        .map_err(|m| TemplateError::parse_at(src, offset, m))
}

// ---------------------------------------------------------------------------
// Tree building
// ---------------------------------------------------------------------------

enum End {
    Eof,
    Else(usize),
    Close(String, usize),
}

struct TreeBuilder<'s> {
    src: &'s str,
    tokens: std::vec::IntoIter<Token>,
}

impl TreeBuilder<'_> {
    fn sequence(&mut self, depth: usize) -> Result<(Vec<Node>, End), TemplateError> {
        let mut nodes = Vec::new();
        while let Some(token) = self.tokens.next() {
            match token.kind {
                TokenKind::Text(text) => {
                    if !text.is_empty() {
                        nodes.push(Node::Text(text));
                    }
                }
                TokenKind::Comment => {}
                TokenKind::Mustache(content) => {
                    nodes.push(Node::Expression(parse_call(
                        self.src,
                        token.offset,
                        &content,
                    )?));
                }
                TokenKind::Open { content, inverted } => {
                    if depth >= MAX_DEPTH {
                        return Err(TemplateError::parse_at(
                            self.src,
                            token.offset,
                            "blocks nested too deeply",
                        ));
                    }
                    let call = parse_call(self.src, token.offset, &content)?;
                    nodes.push(Node::Block(self.block(call, inverted, token.offset, depth)?));
                }
                TokenKind::Else => return Ok((nodes, End::Else(token.offset))),
                TokenKind::Close(name) => return Ok((nodes, End::Close(name, token.offset))),
            }
        }
        Ok((nodes, End::Eof))
    }

    fn block(
        &mut self,
        call: Call,
        inverted: bool,
        offset: usize,
        depth: usize,
    ) -> Result<Block, TemplateError> {
        let (body, mut end) = self.sequence(depth + 1)?;
        let mut inverse = Vec::new();
        if let End::Else(else_offset) = end {
            let (nodes, next) = self.sequence(depth + 1)?;
            if let End::Else(_) = next {
                return Err(TemplateError::parse_at(
                    self.src,
                    else_offset,
                    "duplicate `else` in block",
                ));
            }
            inverse = nodes;
            end = next;
        }

        match end {
            End::Close(name, _) if name == call.head.raw => Ok(Block {
                call,
                inverted,
                body,
                inverse,
            }),
            End::Close(found, close_offset) => {
                let (line, column) = crate::error::line_column(self.src, close_offset);
                Err(TemplateError::MismatchedClose {
                    expected: call.head.raw,
                    found,
                    line,
                    column,
                })
            }
            End::Eof | End::Else(_) => {
                let (line, column) = crate::error::line_column(self.src, offset);
                Err(TemplateError::UnclosedBlock {
                    name: call.head.raw,
                    line,
                    column,
                })
            }
        }
    }
}

/// Parse template source into a node tree.
pub(crate) fn parse(src: &str) -> Result<Vec<Node>, TemplateError> {
    let tokens = tokenize(src)?;
    let mut builder = TreeBuilder {
        src,
        tokens: tokens.into_iter(),
    };
    let (nodes, end) = builder.sequence(0)?;
    match end {
        End::Eof => Ok(nodes),
        End::Else(offset) => Err(TemplateError::parse_at(
            src,
            offset,
            "`else` outside of a block",
        )),
        End::Close(found, offset) => {
            let (line, column) = crate::error::line_column(src, offset);
            Err(TemplateError::MismatchedClose {
                expected: String::new(),
                found,
                line,
                column,
            })
        }
    }
}
