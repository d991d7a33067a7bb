//! Code syntax highlighting using syntect.
//!
//! Output is class based (`<span class="source rust">`), so colours come
//! from a stylesheet; see [`theme_css`].

use super::csv_table::Tabulated;
use super::{html_escape, CodeBlock, Node};
use pulldown_cmark::{html, CowStr, Event};
use std::sync::OnceLock;
use syntect::highlighting::ThemeSet;
use syntect::html::{css_for_theme_with_class_style, ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
static THEME_SET: OnceLock<ThemeSet> = OnceLock::new();

fn syntax_set() -> &'static SyntaxSet {
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn theme_set() -> &'static ThemeSet {
    THEME_SET.get_or_init(ThemeSet::load_defaults)
}

/// Languages rendered without highlighting. `csv` is listed so a CSV block
/// that somehow escaped table conversion is never coloured as code.
const PLAIN_ALIASES: &[&str] = &["csv", "plaintext", "plain", "text", "txt"];

/// Stylesheet for a syntect theme, matching the classes emitted here.
/// Returns `None` for unknown theme names.
pub fn theme_css(theme_name: &str) -> Option<String> {
    let theme = theme_set().themes.get(theme_name)?;
    match css_for_theme_with_class_style(theme, ClassStyle::Spaced) {
        Ok(css) => Some(css),
        Err(e) => {
            tracing::warn!("Failed to build CSS for theme {}: {}", theme_name, e);
            None
        }
    }
}

/// Fully rendered document; nothing left to transform
#[derive(Debug, Clone, PartialEq)]
pub struct Highlighted {
    events: Vec<Event<'static>>,
}

impl Highlighted {
    pub fn into_html(self) -> String {
        let mut html_output = String::new();
        html::push_html(&mut html_output, self.events.into_iter());
        html_output
    }
}

/// Transformer for syntax highlighting code blocks
#[derive(Debug, Default)]
pub struct HighlightTransformer;

impl HighlightTransformer {
    pub fn new() -> Self {
        Self
    }

    /// Replace every remaining code block with highlighted markup
    pub fn transform(&self, doc: Tabulated) -> Highlighted {
        let events = doc
            .into_nodes()
            .into_iter()
            .map(|node| match node {
                Node::Event(event) => event,
                Node::Html(html) => Event::Html(CowStr::from(html)),
                Node::Code(block) => Event::Html(CowStr::from(self.render_block(&block))),
            })
            .collect();

        Highlighted { events }
    }

    fn render_block(&self, block: &CodeBlock) -> String {
        let ss = syntax_set();

        match block.lang.as_deref() {
            Some(lang) if PLAIN_ALIASES.iter().any(|a| a.eq_ignore_ascii_case(lang)) => {
                plain_block(&block.source, Some("plaintext"))
            }
            Some(lang) => match find_syntax(ss, lang) {
                Some(syntax) => self.highlight_code(&block.source, syntax, lang),
                None => {
                    tracing::debug!("No syntax for language {:?}", lang);
                    plain_block(&block.source, Some(lang))
                }
            },
            None => match ss.find_syntax_by_first_line(&block.source) {
                Some(syntax) => {
                    let lang = syntax
                        .file_extensions
                        .first()
                        .cloned()
                        .unwrap_or_else(|| syntax.name.to_lowercase().replace(' ', "-"));
                    self.highlight_code(&block.source, syntax, &lang)
                }
                None => plain_block(&block.source, None),
            },
        }
    }

    fn highlight_code(&self, code: &str, syntax: &SyntaxReference, lang: &str) -> String {
        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, syntax_set(), ClassStyle::Spaced);

        for line in LinesWithEndings::from(code) {
            if let Err(e) = generator.parse_html_for_line_which_includes_newline(line) {
                tracing::warn!("Highlighting {} failed: {}", lang, e);
                return plain_block(code, Some(lang));
            }
        }

        format!(
            "<pre><code class=\"hljs language-{}\">{}</code></pre>\n",
            html_escape(lang),
            generator.finalize()
        )
    }
}

fn find_syntax<'a>(ss: &'a SyntaxSet, lang: &str) -> Option<&'a SyntaxReference> {
    ss.find_syntax_by_token(lang)
        .or_else(|| ss.find_syntax_by_extension(lang))
}

fn plain_block(code: &str, lang: Option<&str>) -> String {
    match lang {
        Some(lang) => format!(
            "<pre><code class=\"language-{}\">{}</code></pre>\n",
            html_escape(lang),
            html_escape(code)
        ),
        None => format!("<pre><code>{}</code></pre>\n", html_escape(code)),
    }
}
