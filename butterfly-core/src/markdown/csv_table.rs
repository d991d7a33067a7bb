//! CSV code blocks rendered as tables.
//!
//! Cells are split on every comma; quoted fields are not understood, so
//! `"a,b"` becomes two cells.

use super::{html_escape, Node, Parsed};

/// Document whose CSV blocks have been turned into tables. Only
/// [`CsvTableTransformer`] can produce one.
#[derive(Debug, Clone, PartialEq)]
pub struct Tabulated {
    nodes: Vec<Node>,
}

impl Tabulated {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub(super) fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }
}

#[derive(Debug, Default)]
pub struct CsvTableTransformer;

impl CsvTableTransformer {
    pub fn new() -> Self {
        Self
    }

    pub fn transform(&self, parsed: Parsed) -> Tabulated {
        let nodes = parsed
            .into_nodes()
            .into_iter()
            .map(|node| match node {
                Node::Code(block) if block.is_lang("csv") => {
                    let mut table = render_csv_table(&block.source);
                    table.push('\n');
                    Node::Html(table)
                }
                other => other,
            })
            .collect();

        Tabulated { nodes }
    }
}

/// Split CSV text into trimmed cells. The first row is the header.
pub fn parse_rows(csv: &str) -> Vec<Vec<&str>> {
    csv.trim()
        .split('\n')
        .map(|row| row.split(',').map(str::trim).collect())
        .collect()
}

pub fn render_csv_table(csv: &str) -> String {
    let mut rows = parse_rows(csv).into_iter();
    let header = rows.next().unwrap_or_default();

    let mut html = String::from(r#"<div class="csv-table-wrapper"><table class="csv-table"><thead><tr>"#);
    for cell in header {
        html.push_str(&format!("<th>{}</th>", html_escape(cell)));
    }
    html.push_str("</tr></thead><tbody>");
    for row in rows {
        html.push_str("<tr>");
        for cell in row {
            html.push_str(&format!("<td>{}</td>", html_escape(cell)));
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table></div>");
    html
}
