//! Minimal static HTML rendering of a crate, stored as `ro-crate-preview.html`.

use std::fmt::Write;

use serde_json::Value;

use crate::entity::{as_reference, Entity};
use crate::graph::CrateGraph;
use crate::vocab;

/// Render the crate as a single self-contained HTML page.
pub fn render_preview(graph: &CrateGraph) -> String {
    let root = graph.root();
    let title = root.first_str(vocab::NAME).unwrap_or(root.id());

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(html, "<title>{}</title>", escape(title));
    html.push_str("</head>\n<body>\n");
    let _ = writeln!(html, "<h1>{}</h1>", escape(title));
    if let Some(description) = root.first_str(vocab::DESCRIPTION) {
        let _ = writeln!(html, "<p>{}</p>", escape(description));
    }

    render_entity(graph, root, &mut html);
    for entity in graph.entities() {
        if entity.id() != root.id() && entity.id() != vocab::METADATA_FILE {
            render_entity(graph, entity, &mut html);
        }
    }
    html.push_str("</body>\n</html>\n");
    html
}

fn render_entity(graph: &CrateGraph, entity: &Entity, html: &mut String) {
    let _ = writeln!(html, "<section id=\"{}\">", escape(&anchor(entity.id())));
    let _ = writeln!(
        html,
        "<h2>{} <small>{}</small></h2>",
        escape(entity.first_str(vocab::NAME).unwrap_or(entity.id())),
        escape(&entity.types().join(", "))
    );
    html.push_str("<table>\n");
    let _ = writeln!(html, "<tr><th>@id</th><td>{}</td></tr>", escape(entity.id()));
    for (prop, values) in entity.props() {
        if values.is_empty() {
            continue;
        }
        let cells: Vec<String> = values.iter().map(|v| render_value(graph, v)).collect();
        let _ = writeln!(
            html,
            "<tr><th>{}</th><td>{}</td></tr>",
            escape(prop),
            cells.join("<br>")
        );
    }
    html.push_str("</table>\n</section>\n");
}

fn render_value(graph: &CrateGraph, value: &Value) -> String {
    if let Some(target) = as_reference(value) {
        return match graph.get(target) {
            Some(e) => format!(
                "<a href=\"#{}\">{}</a>",
                escape(&anchor(target)),
                escape(e.first_str(vocab::NAME).unwrap_or(target))
            ),
            None => format!("<a href=\"{0}\">{0}</a>", escape(target)),
        };
    }
    match value {
        Value::String(s) => escape(s),
        other => escape(&other.to_string()),
    }
}

fn anchor(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::reference;
    use serde_json::json;

    #[test]
    fn renders_title_and_links() {
        let mut g = CrateGraph::new();
        g.root_mut().set("name", vec![json!("Demo <corpus>")]);
        g.root_mut().set("description", vec![json!("A & B")]);
        let root = g.root_id().to_string();
        g.push_entity(
            &root,
            "author",
            Entity::new("#alice").with_type("Person").with("name", "Alice"),
        )
        .unwrap();
        g.root_mut().push("license", reference("https://spdx.org/licenses/MIT"));

        let html = render_preview(&g);
        assert!(html.contains("<title>Demo &lt;corpus&gt;</title>"));
        assert!(html.contains("<p>A &amp; B</p>"));
        assert!(html.contains("<a href=\"#_alice\">Alice</a>"));
        assert!(html.contains("<a href=\"https://spdx.org/licenses/MIT\">"));
        assert!(html.contains("<section id=\"_alice\">"));
    }

    #[test]
    fn unnamed_root_falls_back_to_id() {
        let html = render_preview(&CrateGraph::new());
        assert!(html.contains("<h1>./</h1>"));
        assert!(!html.contains("ro-crate-metadata.json</h2>"));
    }
}
