//! Generic directive syntax.
//!
//! `:::name[label]{#id .class}` ... `:::` wraps its content in a
//! `<div class="name">`, `::name[label]` on its own line becomes a `<div>`
//! holding the label, and `:name[label]` inside text becomes a
//! `<span class="name">`. Names carry no meaning here; styling decides
//! what a `warning` or `tip` looks like.
//!
//! Containers and leaves are lowered on the source text, before parsing, so
//! the body of a container is still parsed as markdown. Inline directives
//! are rewritten on the event stream so code spans are never touched.

use super::html_escape;
use pulldown_cmark::{CowStr, Event, Tag, TagEnd};
use regex::Regex;
use std::iter::Peekable;
use std::str::Chars;
use std::sync::OnceLock;

/// Attributes from a `{...}` block. Only id and classes are kept.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DirectiveAttrs {
    pub id: Option<String>,
    pub classes: Vec<String>,
}

impl DirectiveAttrs {
    /// Parse `#id .class key=value key="quoted value"`
    pub fn parse(raw: &str) -> Self {
        let mut attrs = Self::default();
        let mut chars = raw.chars().peekable();

        loop {
            take_while(&mut chars, char::is_whitespace);
            match chars.peek() {
                None => break,
                Some('#') => {
                    chars.next();
                    let id = take_while(&mut chars, |c| !c.is_whitespace());
                    if !id.is_empty() {
                        attrs.id = Some(id);
                    }
                }
                Some('.') => {
                    chars.next();
                    let class = take_while(&mut chars, |c| !c.is_whitespace());
                    if !class.is_empty() {
                        attrs.classes.push(class);
                    }
                }
                Some(_) => {
                    let key = take_while(&mut chars, |c| !c.is_whitespace() && c != '=');
                    if chars.peek() != Some(&'=') {
                        tracing::debug!("Ignoring bare directive attribute {:?}", key);
                        continue;
                    }
                    chars.next();
                    let value = match chars.peek().copied() {
                        Some(quote @ ('"' | '\'')) => {
                            chars.next();
                            let value = take_while(&mut chars, |c| c != quote);
                            chars.next();
                            value
                        }
                        _ => take_while(&mut chars, |c| !c.is_whitespace()),
                    };
                    match key.as_str() {
                        "id" => attrs.id = Some(value),
                        "class" => attrs
                            .classes
                            .extend(value.split_whitespace().map(str::to_string)),
                        _ => tracing::debug!("Ignoring directive attribute {:?}", key),
                    }
                }
            }
        }

        attrs
    }
}

fn take_while(chars: &mut Peekable<Chars<'_>>, keep: impl Fn(char) -> bool) -> String {
    let mut out = String::new();
    while let Some(&c) = chars.peek() {
        if !keep(c) {
            break;
        }
        out.push(c);
        chars.next();
    }
    out
}

fn open_tag(tag: &str, name: &str, attrs: &DirectiveAttrs) -> String {
    let mut classes = vec![name];
    classes.extend(attrs.classes.iter().map(String::as_str));

    let mut html = format!("<{} class=\"{}\"", tag, html_escape(&classes.join(" ")));
    if let Some(id) = &attrs.id {
        html.push_str(&format!(" id=\"{}\"", html_escape(id)));
    }
    html.push('>');
    html
}

struct BlockDirective<'a> {
    name: &'a str,
    label: Option<&'a str>,
    attrs: DirectiveAttrs,
}

fn block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?P<name>[A-Za-z][\w-]*)(?:\[(?P<label>[^\]]*)\])?(?:\{(?P<attrs>[^}]*)\})?\s*$",
        )
        .expect("valid regex")
    })
}

fn inline_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r":(?P<name>[A-Za-z][\w-]*)(?:\[(?P<label>[^\]]*)\])?(?:\{(?P<attrs>[^}]*)\})?")
            .expect("valid regex")
    })
}

fn parse_block(rest: &str) -> Option<BlockDirective<'_>> {
    let caps = block_regex().captures(rest)?;
    Some(BlockDirective {
        name: caps.name("name")?.as_str(),
        label: caps
            .name("label")
            .map(|m| m.as_str())
            .filter(|l| !l.trim().is_empty()),
        attrs: caps
            .name("attrs")
            .map(|m| DirectiveAttrs::parse(m.as_str()))
            .unwrap_or_default(),
    })
}

/// Up to three leading spaces are allowed before block syntax
fn strip_indent(line: &str) -> &str {
    let spaces = line.bytes().take(3).take_while(|&b| b == b' ').count();
    &line[spaces..]
}

/// A code fence opener: fence character and run length
fn opens_fence(line: &str) -> Option<(char, usize)> {
    let line = strip_indent(line);
    let ch = line.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = line.chars().take_while(|&c| c == ch).count();
    if len < 3 || (ch == '`' && line[len..].contains('`')) {
        return None;
    }
    Some((ch, len))
}

fn closes_fence(line: &str, ch: char, len: usize) -> bool {
    let line = strip_indent(line);
    let run = line.chars().take_while(|&c| c == ch).count();
    run >= len && line[run * ch.len_utf8()..].trim().is_empty()
}

/// Lower container and leaf directives to HTML wrappers.
///
/// Containers close at the first colon-only line at least as long as their
/// opener; any left open at the end of the document are closed there. A
/// stray closing line or an opener with an invalid name stays as text.
/// Emitted lines keep the directive line's indent so a container inside a
/// list item stays in that item.
pub fn lower_directives(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut open: Vec<(usize, &str)> = Vec::new();
    let mut fence: Option<(char, usize)> = None;

    for line in source.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);

        if let Some((ch, len)) = fence {
            if closes_fence(content, ch, len) {
                fence = None;
            }
            out.push_str(line);
            continue;
        }
        if let Some(opened) = opens_fence(content) {
            fence = Some(opened);
            out.push_str(line);
            continue;
        }

        let trimmed = content.trim_start_matches(' ');
        let indent = &content[..content.len() - trimmed.len()];
        let colons = trimmed.bytes().take_while(|&b| b == b':').count();
        let rest = &trimmed[colons..];

        if colons >= 3 && rest.trim().is_empty() {
            if open.last().is_some_and(|&(top, _)| colons >= top) {
                open.pop();
                out.push_str(&format!("\n{}</div>\n\n", indent));
            } else {
                tracing::debug!("Stray directive fence {:?}", content);
                out.push_str(line);
            }
        } else if colons >= 3 {
            match parse_block(rest) {
                Some(directive) => {
                    open.push((colons, indent));
                    out.push('\n');
                    out.push_str(indent);
                    out.push_str(&open_tag("div", directive.name, &directive.attrs));
                    out.push('\n');
                    if let Some(label) = directive.label {
                        out.push_str(&format!(
                            "{}<p class=\"directive-label\">{}</p>\n",
                            indent,
                            html_escape(label.trim())
                        ));
                    }
                    out.push('\n');
                }
                None => {
                    tracing::debug!("Malformed container directive {:?}", content);
                    out.push_str(line);
                }
            }
        } else if colons == 2 {
            match parse_block(rest) {
                Some(directive) => {
                    out.push('\n');
                    out.push_str(indent);
                    out.push_str(&open_tag("div", directive.name, &directive.attrs));
                    if let Some(label) = directive.label {
                        out.push_str(&html_escape(label.trim()));
                    }
                    out.push_str("</div>\n\n");
                }
                None => out.push_str(line),
            }
        } else {
            out.push_str(line);
        }
    }

    if !open.is_empty() {
        tracing::debug!("Closing {} unterminated directive container(s)", open.len());
        while let Some((_, indent)) = open.pop() {
            out.push_str(&format!("\n\n{}</div>\n", indent));
        }
    }

    out
}

/// Rewrites `:name[label]{attrs}` in text events into spans.
///
/// A label may hold inline markup: the events between `:name[` and the
/// matching `]` end up inside the span. A label still open when its
/// enclosing block ends is put back as plain text.
#[derive(Debug, Default)]
pub struct DirectiveTransformer;

impl DirectiveTransformer {
    pub fn new() -> Self {
        Self
    }

    pub fn transform(&self, events: Vec<Event<'static>>) -> Vec<Event<'static>> {
        let mut result = Vec::with_capacity(events.len());
        let mut in_code_block = false;
        let mut open: Option<OpenSpan> = None;

        for event in events {
            match event {
                Event::Text(text) if !in_code_block => {
                    open = scan_text(&text, open, &mut result);
                }
                Event::Start(tag) => {
                    if matches!(tag, Tag::CodeBlock(_)) {
                        in_code_block = true;
                    }
                    match open.as_mut() {
                        Some(span) => {
                            span.depth += 1;
                            span.inner.push(Event::Start(tag));
                        }
                        None => result.push(Event::Start(tag)),
                    }
                }
                Event::End(tag) => {
                    if tag == TagEnd::CodeBlock {
                        in_code_block = false;
                    }
                    match open.take() {
                        Some(mut span) if span.depth > 0 => {
                            span.depth -= 1;
                            span.inner.push(Event::End(tag));
                            open = Some(span);
                        }
                        Some(span) => {
                            span.into_literal(&mut result);
                            result.push(Event::End(tag));
                        }
                        None => result.push(Event::End(tag)),
                    }
                }
                other => match open.as_mut() {
                    Some(span) => span.inner.push(other),
                    None => result.push(other),
                },
            }
        }

        if let Some(span) = open {
            span.into_literal(&mut result);
        }

        result
    }
}

/// An inline directive whose label runs past the text event it started in
struct OpenSpan {
    name: String,
    /// `:name[` as written
    opener: String,
    inner: Vec<Event<'static>>,
    /// Tags opened inside the label and not yet closed
    depth: usize,
}

impl OpenSpan {
    fn close(self, attrs: &DirectiveAttrs, out: &mut Vec<Event<'static>>) {
        out.push(Event::InlineHtml(CowStr::from(open_tag("span", &self.name, attrs))));
        out.extend(self.inner);
        out.push(Event::InlineHtml(CowStr::Borrowed("</span>")));
    }

    fn into_literal(self, out: &mut Vec<Event<'static>>) {
        tracing::debug!("Unclosed inline directive {:?}", self.opener);
        out.push(Event::Text(CowStr::from(self.opener)));
        out.extend(self.inner);
    }
}

fn text_event(text: &str) -> Event<'static> {
    Event::Text(CowStr::from(text.to_string()))
}

fn leading_attrs_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\{(?P<attrs>[^}]*)\}").expect("valid regex"))
}

/// Handle one text event, closing `open` if its `]` is here
fn scan_text(
    text: &str,
    open: Option<OpenSpan>,
    out: &mut Vec<Event<'static>>,
) -> Option<OpenSpan> {
    let mut rest = text;

    if let Some(mut span) = open {
        let close = if span.depth == 0 { rest.find(']') } else { None };
        let Some(close) = close else {
            span.inner.push(text_event(rest));
            return Some(span);
        };
        if close > 0 {
            span.inner.push(text_event(&rest[..close]));
        }
        rest = &rest[close + 1..];

        let (attrs, skip) = match leading_attrs_regex().captures(rest) {
            Some(caps) => (
                DirectiveAttrs::parse(caps.name("attrs").map_or("", |m| m.as_str())),
                caps.get(0).map_or(0, |m| m.end()),
            ),
            None => (DirectiveAttrs::default(), 0),
        };
        span.close(&attrs, out);
        rest = &rest[skip..];
    }

    if !rest.contains(':') {
        if !rest.is_empty() {
            out.push(text_event(rest));
        }
        return None;
    }
    split_inline(rest, out)
}

/// Emit `text` with complete directives as spans. A directive whose `[`
/// has no `]` in this text is returned open.
fn split_inline(text: &str, out: &mut Vec<Event<'static>>) -> Option<OpenSpan> {
    let mut last = 0;

    for caps in inline_regex().captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let prev = text[..whole.start()].chars().next_back();
        if matches!(prev, Some(c) if c.is_alphanumeric() || c == ':') {
            continue;
        }

        if whole.start() > last {
            out.push(text_event(&text[last..whole.start()]));
        }

        let unclosed = caps.name("label").is_none()
            && caps.name("attrs").is_none()
            && text[whole.end()..].starts_with('[');
        if unclosed {
            let label_start = whole.end() + 1;
            let mut inner = Vec::new();
            if label_start < text.len() {
                inner.push(text_event(&text[label_start..]));
            }
            return Some(OpenSpan {
                name: caps["name"].to_string(),
                opener: text[whole.start()..label_start].to_string(),
                inner,
                depth: 0,
            });
        }

        let attrs = caps
            .name("attrs")
            .map(|m| DirectiveAttrs::parse(m.as_str()))
            .unwrap_or_default();
        out.push(Event::InlineHtml(CowStr::from(open_tag(
            "span",
            &caps["name"],
            &attrs,
        ))));
        if let Some(label) = caps.name("label").filter(|m| !m.as_str().is_empty()) {
            out.push(text_event(label.as_str()));
        }
        out.push(Event::InlineHtml(CowStr::Borrowed("</span>")));

        last = whole.end();
    }

    if last < text.len() {
        out.push(text_event(&text[last..]));
    }

    None
}
