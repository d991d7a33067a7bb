//! Markdown processing pipeline with custom extensions.
//!
//! Stages run in a fixed order, and the order matters:
//!
//! 1. [`title::strip_title`]: drop a leading `# Title` line (source text).
//! 2. [`directives::lower_directives`]: turn `:::name` containers and
//!    `::name` leaves into HTML wrappers (source text).
//! 3. Parse with GFM extensions; raw HTML passes through untouched.
//! 4. [`directives::DirectiveTransformer`] and
//!    [`autolink::AutolinkTransformer`]: inline directives and bare URLs
//!    (event stream).
//! 5. [`Parsed`]: code blocks lifted out of the stream as [`CodeBlock`] nodes.
//! 6. [`csv_table::CsvTableTransformer`]: `Parsed -> Tabulated`, CSV code
//!    blocks become tables.
//! 7. [`highlight::HighlightTransformer`]: `Tabulated -> Highlighted`, the
//!    only way to get HTML out. Since `Tabulated` can only come from the CSV
//!    stage, a CSV block can never reach the highlighter as code.

pub mod autolink;
pub mod csv_table;
pub mod directives;
pub mod highlight;
pub mod title;

use pulldown_cmark::{CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};

pub use autolink::AutolinkTransformer;
pub use csv_table::{CsvTableTransformer, Tabulated};
pub use directives::{lower_directives, DirectiveTransformer};
pub use highlight::{theme_css, HighlightTransformer, Highlighted};
pub use title::strip_title;

/// Bumped whenever the rendered output of the pipeline changes shape
pub const PIPELINE_VERSION: u32 = 1;

/// Markdown processor with custom extensions
#[derive(Debug, Clone)]
pub struct MarkdownProcessor {
    options: Options,
}

impl MarkdownProcessor {
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_GFM);

        Self { options }
    }

    /// Render an article body to HTML.
    ///
    /// Pure: the same input always yields byte-identical output, and no
    /// authoring mistake makes it fail.
    pub fn render(&self, raw_body: &str) -> String {
        let body = strip_title(raw_body);
        let source = lower_directives(body);

        let events: Vec<Event<'static>> = Parser::new_ext(&source, self.options)
            .map(Event::into_static)
            .collect();
        let events = coalesce_text(events);

        let events = DirectiveTransformer::new().transform(events);
        let events = AutolinkTransformer::new().transform(events);

        let parsed = Parsed::from_events(events);
        let tabulated = CsvTableTransformer::new().transform(parsed);
        HighlightTransformer::new().transform(tabulated).into_html()
    }
}

impl Default for MarkdownProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// A fenced or indented code block lifted out of the event stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// First word of the info string, if any
    pub lang: Option<String>,
    pub source: String,
}

impl CodeBlock {
    pub fn is_lang(&self, name: &str) -> bool {
        self.lang
            .as_deref()
            .is_some_and(|lang| lang.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Event(Event<'static>),
    Code(CodeBlock),
    /// Finished markup produced by a stage
    Html(String),
}

/// Parsed document with code blocks as standalone nodes
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    nodes: Vec<Node>,
}

impl Parsed {
    pub fn from_events(events: Vec<Event<'static>>) -> Self {
        let mut nodes = Vec::with_capacity(events.len());
        let mut current: Option<CodeBlock> = None;

        for event in events {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => info
                            .split_whitespace()
                            .next()
                            .map(str::to_string),
                        CodeBlockKind::Indented => None,
                    };
                    current = Some(CodeBlock {
                        lang,
                        source: String::new(),
                    });
                }
                Event::Text(text) if current.is_some() => {
                    if let Some(block) = current.as_mut() {
                        block.source.push_str(&text);
                    }
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some(block) = current.take() {
                        nodes.push(Node::Code(block));
                    }
                }
                other => nodes.push(Node::Event(other)),
            }
        }

        Self { nodes }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }
}

/// Merge runs of adjacent text events; the parser splits text arbitrarily
/// around characters that might have started inline markup.
fn coalesce_text(events: Vec<Event<'static>>) -> Vec<Event<'static>> {
    let mut out: Vec<Event<'static>> = Vec::with_capacity(events.len());

    for event in events {
        if let Event::Text(text) = &event {
            if let Some(Event::Text(prev)) = out.last_mut() {
                let mut merged = prev.to_string();
                merged.push_str(text);
                *prev = CowStr::from(merged);
                continue;
            }
        }
        out.push(event);
    }

    out
}

pub(crate) fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
