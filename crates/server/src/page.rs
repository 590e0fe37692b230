//! HTML rendering for the listing and viewer pages.

use std::fmt::Write;
use std::path::Path;

use axum::body::Bytes;
use logyard_protocol::constants::{PATH_PLACEHOLDER, SOURCES_PLACEHOLDER};
use logyard_protocol::source_endpoint;
use logyard_sources::Catalog;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

const INDEX_TEMPLATE: &str = include_str!("../assets/index.html");
const VIEWER_TEMPLATE: &str = include_str!("../assets/viewer.html");

/// Bytes that must be escaped in a URL path. `/` stays literal.
const PATH_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Renders the listing page for a catalog.
///
/// Directory roots become a group headed by the root path, with one link
/// per child labelled by its path relative to the root. File roots are a
/// single link. The output depends only on the catalog.
pub fn render_listing(catalog: &Catalog) -> Bytes {
    tracing::debug!(roots = catalog.sources().len(), "rendering listing");

    let mut items = String::new();
    for src in catalog.sources() {
        match &src.children {
            Some(children) => {
                let mut group = String::new();
                for child in children {
                    let Ok(rel) = child.path.strip_prefix(&src.path) else {
                        tracing::warn!(
                            root = %src.path.display(),
                            child = %child.path.display(),
                            "child outside its root"
                        );
                        continue;
                    };
                    push_link(&mut group, &child.path, &rel.to_string_lossy());
                }
                let _ = write!(
                    items,
                    "<li><h3>{}</h3><ul>{group}</ul></li>",
                    escape_html(&src.path.to_string_lossy())
                );
            }
            None => push_link(&mut items, &src.path, &src.path.to_string_lossy()),
        }
    }

    Bytes::from(INDEX_TEMPLATE.replacen(SOURCES_PLACEHOLDER, &items, 1))
}

/// Renders the viewer page for one source file.
pub fn render_viewer(path: &Path) -> Bytes {
    let shown = escape_html(&path.to_string_lossy());
    Bytes::from(VIEWER_TEMPLATE.replace(PATH_PLACEHOLDER, &shown))
}

/// Returns the viewer route for `path`, percent-encoded for use as a
/// link target.
pub fn source_href(path: &Path) -> String {
    utf8_percent_encode(&source_endpoint(path), PATH_ENCODE_SET).to_string()
}

fn push_link(out: &mut String, path: &Path, label: &str) {
    let _ = write!(
        out,
        "<li><a href=\"{}\">{}</a></li>",
        escape_html(&source_href(path)),
        escape_html(label)
    );
}

/// Escapes the characters that are significant in HTML text and
/// attribute values.
pub fn escape_html(s: &str) -> String {
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
