//! Content normalization: raw book content into one canonical document.
//!
//! Both acquisition paths converge here. Raw HTML is parsed and
//! re-serialized with the executable/styling elements removed
//! (parse-tree removal is the single sanitization strategy; no regex
//! stripping). Raw plain text is split on blank-line boundaries and
//! wrapped into paragraph elements. Both paths produce markup wrapped in
//! the same reader container and differing only in a container class, so
//! rendering and navigation never need to know which path produced the
//! document.
//!
//! Inline images are handled in two phases: normalization collects the
//! image references it finds, and [`resolve_images`] later swaps each
//! reference for a fetched `data:` URI handle, dropping images whose fetch
//! failed. One broken image never aborts the read.

use std::collections::HashMap;
use std::sync::LazyLock;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use regex::Regex;
use ego_tree::NodeRef;
use scraper::{Html, Node, Selector};

/// Container opening tag for the markup normalization path.
const CONTAINER_OPEN_MARKUP: &str = r#"<div class="reader-content reader-content--markup">"#;

/// Container opening tag for the plain-text normalization path.
const CONTAINER_OPEN_PLAIN: &str = r#"<div class="reader-content reader-content--plain">"#;

const CONTAINER_CLOSE: &str = "</div>";

/// Elements removed wholesale, subtree included.
const BLOCKED_TAGS: [&str; 5] = ["script", "style", "link", "meta", "iframe"];

/// Void elements serialized without a closing tag.
const VOID_TAGS: [&str; 12] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "param", "source", "track", "wbr",
];

/// Compiles a regex at static init; panics on invalid pattern.
fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

fn compile_static_selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid static selector '{css}': {e}"))
}

/// Blank-line boundary: two or more consecutive newlines.
static PARAGRAPH_BREAK: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"\n{2,}"));

static BODY: LazyLock<Selector> = LazyLock::new(|| compile_static_selector("body"));

/// Sanitized markup still carrying its original image references.
#[derive(Debug, Clone)]
pub struct NormalizedContent {
    /// Container-wrapped sanitized markup.
    pub html: String,
    /// Distinct `img src` references found, in document order. Empty on
    /// the plain-text path.
    pub image_refs: Vec<String>,
}

/// The canonical rendered document the reader displays.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    /// Final container-wrapped markup with image references resolved.
    pub html: String,
}

/// A fetched-content-backed handle for one inline image.
#[derive(Debug, Clone)]
pub enum ImageAsset {
    /// The image fetched successfully; holds its `data:` URI.
    Data(String),
    /// The image fetch failed; the reference is dropped from the document.
    Hidden,
}

/// Normalizes raw content into the canonical document representation.
///
/// Pure transform: no network access. The markup path parses the content
/// as a document tree, drops `script`/`style`/`link`/`meta`/`iframe`
/// subtrees, and keeps the body subtree only. The plain-text path wraps
/// blank-line-separated units in paragraph elements.
#[must_use]
pub fn normalize(raw: &str, is_markup: bool) -> NormalizedContent {
    if is_markup {
        normalize_markup(raw)
    } else {
        NormalizedContent {
            html: normalize_plain_text(raw),
            image_refs: Vec::new(),
        }
    }
}

/// Produces the final document by swapping image references for fetched
/// handles.
///
/// Every reference present in `assets` as [`ImageAsset::Data`] is
/// rewritten to its `data:` URI; references marked [`ImageAsset::Hidden`]
/// or absent from the map are removed from the document.
#[must_use]
pub fn resolve_images(
    content: &NormalizedContent,
    assets: &HashMap<String, ImageAsset>,
) -> RenderedDocument {
    if content.image_refs.is_empty() {
        return RenderedDocument {
            html: content.html.clone(),
        };
    }

    // The normalized markup is our own output, so re-parsing it is safe
    // and keeps the rewrite on the parse tree instead of on strings.
    let document = Html::parse_document(&content.html);
    let mut out = String::with_capacity(content.html.len());
    let mut pass = ImagePass::Resolve(assets);
    if let Some(body) = document.select(&BODY).next() {
        render_children(*body, &mut out, &mut pass);
    }
    RenderedDocument { html: out }
}

/// Builds a `data:` URI for a fetched image body.
///
/// The MIME type comes from the response Content-Type with any parameters
/// stripped; absent or blank types fall back to `image/jpeg`.
#[must_use]
pub fn image_data_uri(body: &[u8], content_type: Option<&str>) -> String {
    let mime = content_type
        .map(|value| value.split(';').next().unwrap_or(value).trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "image/jpeg".to_string());
    format!("data:{mime};base64,{}", BASE64.encode(body))
}

fn normalize_markup(raw: &str) -> NormalizedContent {
    let document = Html::parse_document(raw);
    let mut image_refs = Vec::new();
    let mut out = String::with_capacity(raw.len() / 2 + CONTAINER_OPEN_MARKUP.len());
    out.push_str(CONTAINER_OPEN_MARKUP);
    let mut pass = ImagePass::Collect(&mut image_refs);
    if let Some(body) = document.select(&BODY).next() {
        render_children(*body, &mut out, &mut pass);
    }
    out.push_str(CONTAINER_CLOSE);
    NormalizedContent {
        html: out,
        image_refs,
    }
}

fn normalize_plain_text(raw: &str) -> String {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");
    let mut out = String::with_capacity(unified.len() + CONTAINER_OPEN_PLAIN.len());
    out.push_str(CONTAINER_OPEN_PLAIN);
    for unit in PARAGRAPH_BREAK.split(&unified) {
        let trimmed = unit.trim();
        if trimmed.is_empty() {
            continue;
        }
        out.push_str("<p>");
        push_escaped_text(&mut out, trimmed);
        out.push_str("</p>");
    }
    out.push_str(CONTAINER_CLOSE);
    out
}

enum ImagePass<'a> {
    /// Scan phase: record references, keep them in place.
    Collect(&'a mut Vec<String>),
    /// Commit phase: swap references for fetched handles.
    Resolve(&'a HashMap<String, ImageAsset>),
}

fn render_children(node: NodeRef<'_, Node>, out: &mut String, pass: &mut ImagePass<'_>) {
    for child in node.children() {
        render_node(child, out, pass);
    }
}

fn render_node(node: NodeRef<'_, Node>, out: &mut String, pass: &mut ImagePass<'_>) {
    match node.value() {
        Node::Text(text) => push_escaped_text(out, &text.text),
        Node::Element(element) => {
            // html5ever lowercases tag names during parsing, which makes
            // this removal case-insensitive for free.
            let name = element.name();
            if BLOCKED_TAGS.contains(&name) {
                return;
            }
            if name == "img" {
                render_image(node, out, pass);
                return;
            }

            out.push('<');
            out.push_str(name);
            for (attr, value) in element.attrs() {
                push_attribute(out, attr, value);
            }
            out.push('>');
            if VOID_TAGS.contains(&name) {
                return;
            }
            render_children(node, out, pass);
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
        // Comments, doctypes, and processing instructions are dropped.
        _ => {}
    }
}

fn render_image(node: NodeRef<'_, Node>, out: &mut String, pass: &mut ImagePass<'_>) {
    let Node::Element(element) = node.value() else {
        return;
    };
    let Some(src) = element.attr("src") else {
        // An image without a source renders nothing; drop it.
        return;
    };

    let resolved_src: Option<String> = match pass {
        ImagePass::Collect(refs) => {
            if !refs.iter().any(|existing| existing == src) {
                refs.push(src.to_string());
            }
            Some(src.to_string())
        }
        ImagePass::Resolve(assets) => match assets.get(src) {
            Some(ImageAsset::Data(uri)) => Some(uri.clone()),
            Some(ImageAsset::Hidden) | None => None,
        },
    };

    let Some(resolved_src) = resolved_src else {
        return;
    };

    out.push_str("<img");
    for (attr, value) in element.attrs() {
        if attr == "src" {
            push_attribute(out, "src", &resolved_src);
        } else {
            push_attribute(out, attr, value);
        }
    }
    out.push('>');
}

fn push_attribute(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out.push('"');
}

fn push_escaped_text(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_markup_path_strips_script_elements() {
        let raw = "<html><body><p>Keep</p><script>alert('x')</script></body></html>";
        let content = normalize(raw, true);
        assert!(
            !content.html.to_ascii_lowercase().contains("<script"),
            "script must be removed: {}",
            content.html
        );
        assert!(content.html.contains("<p>Keep</p>"));
    }

    #[test]
    fn test_markup_path_strips_script_case_insensitively() {
        let raw = "<body><SCRIPT>alert(1)</SCRIPT><ScRiPt src=\"x.js\"></ScRiPt><p>a</p></body>";
        let content = normalize(raw, true);
        let lower = content.html.to_ascii_lowercase();
        assert!(!lower.contains("<script"), "got: {}", content.html);
        assert!(!lower.contains("alert"), "script body must go too");
    }

    #[test]
    fn test_markup_path_strips_malformed_nested_script() {
        let raw = "<body><script><script>alert(1)</script></script><p>safe</p></body>";
        let content = normalize(raw, true);
        let lower = content.html.to_ascii_lowercase();
        assert!(!lower.contains("<script"), "got: {}", content.html);
        assert!(content.html.contains("safe"));
    }

    #[test]
    fn test_markup_path_strips_all_blocked_elements() {
        let raw = concat!(
            "<html><head><meta charset=\"utf-8\"><link rel=\"stylesheet\" href=\"a.css\">",
            "<style>p { color: red }</style></head>",
            "<body><iframe src=\"https://evil.example\"></iframe><p>text</p></body></html>"
        );
        let content = normalize(raw, true);
        let lower = content.html.to_ascii_lowercase();
        for tag in ["<style", "<link", "<meta", "<iframe"] {
            assert!(!lower.contains(tag), "{tag} must be removed: {}", content.html);
        }
        assert!(content.html.contains("<p>text</p>"));
    }

    #[test]
    fn test_markup_path_keeps_body_subtree_only() {
        let raw = "<html><head><title>Head title</title></head><body><h1>Chapter 1</h1></body></html>";
        let content = normalize(raw, true);
        assert!(!content.html.contains("Head title"));
        assert!(content.html.contains("<h1>Chapter 1</h1>"));
    }

    #[test]
    fn test_markup_path_wraps_in_reader_container() {
        let content = normalize("<body><p>x</p></body>", true);
        assert!(content.html.starts_with(CONTAINER_OPEN_MARKUP));
        assert!(content.html.ends_with(CONTAINER_CLOSE));
    }

    #[test]
    fn test_markup_path_collects_distinct_image_refs_in_order() {
        let raw = concat!(
            "<body><img src=\"a.png\" alt=\"first\">",
            "<img src=\"b.png\"><img src=\"a.png\"></body>"
        );
        let content = normalize(raw, true);
        assert_eq!(content.image_refs, vec!["a.png".to_string(), "b.png".to_string()]);
        assert!(content.html.contains("src=\"a.png\""));
        assert!(content.html.contains("alt=\"first\""));
    }

    #[test]
    fn test_both_paths_differ_only_in_container_class() {
        let markup = normalize("<body><p>alpha</p></body>", true);
        let plain = normalize("alpha", false);
        assert_eq!(
            markup.html.replace("--markup", "--plain"),
            plain.html,
            "paths must converge on identical structure"
        );
    }

    #[test]
    fn test_plain_text_splits_on_blank_lines() {
        let raw = "First paragraph.\n\nSecond paragraph,\nsame unit.\n\n\n\nThird.";
        let content = normalize(raw, false);
        assert!(content.html.contains("<p>First paragraph.</p>"));
        assert!(content.html.contains("<p>Second paragraph,\nsame unit.</p>"));
        assert!(content.html.contains("<p>Third.</p>"));
        assert_eq!(content.html.matches("<p>").count(), 3);
    }

    #[test]
    fn test_plain_text_discards_whitespace_only_units() {
        let content = normalize("one\n\n   \n\ntwo\n\n\t\n\n", false);
        assert_eq!(content.html.matches("<p>").count(), 2);
    }

    #[test]
    fn test_plain_text_trims_and_escapes_units() {
        let content = normalize("  a < b & c > d  ", false);
        assert!(content.html.contains("<p>a &lt; b &amp; c &gt; d</p>"));
    }

    #[test]
    fn test_plain_text_handles_crlf_boundaries() {
        let content = normalize("one\r\n\r\ntwo", false);
        assert_eq!(content.html.matches("<p>").count(), 2);
    }

    #[test]
    fn test_plain_text_split_is_idempotent() {
        let raw = "alpha\n\nbeta\n\n\ngamma";
        let first = normalize(raw, false);

        // Re-split the already-normalized paragraph units.
        let units: Vec<&str> = first
            .html
            .trim_start_matches(CONTAINER_OPEN_PLAIN)
            .trim_end_matches(CONTAINER_CLOSE)
            .split("</p>")
            .filter_map(|unit| unit.strip_prefix("<p>"))
            .collect();
        let rejoined = units.join("\n\n");
        let second = normalize(&rejoined, false);
        assert_eq!(first.html, second.html, "re-normalization must be stable");
    }

    #[test]
    fn test_resolve_images_rewrites_to_data_uri() {
        let content = normalize("<body><img src=\"pic.jpg\" alt=\"a\"></body>", true);
        let mut assets = HashMap::new();
        assets.insert(
            "pic.jpg".to_string(),
            ImageAsset::Data("data:image/jpeg;base64,AAAA".to_string()),
        );
        let document = resolve_images(&content, &assets);
        assert!(document.html.contains("src=\"data:image/jpeg;base64,AAAA\""));
        assert!(document.html.contains("alt=\"a\""));
        assert!(!document.html.contains("pic.jpg"));
    }

    #[test]
    fn test_resolve_images_drops_failed_images_only() {
        let content = normalize(
            "<body><img src=\"ok.jpg\"><img src=\"broken.jpg\"><p>text</p></body>",
            true,
        );
        let mut assets = HashMap::new();
        assets.insert(
            "ok.jpg".to_string(),
            ImageAsset::Data("data:image/jpeg;base64,BBBB".to_string()),
        );
        assets.insert("broken.jpg".to_string(), ImageAsset::Hidden);
        let document = resolve_images(&content, &assets);
        assert!(document.html.contains("base64,BBBB"));
        assert!(!document.html.contains("broken.jpg"));
        assert!(document.html.contains("<p>text</p>"), "document must survive");
    }

    #[test]
    fn test_resolve_images_without_refs_is_passthrough() {
        let content = normalize("plain book", false);
        let document = resolve_images(&content, &HashMap::new());
        assert_eq!(document.html, content.html);
    }

    #[test]
    fn test_image_data_uri_strips_mime_parameters() {
        let uri = image_data_uri(b"abc", Some("image/png; charset=binary"));
        assert!(uri.starts_with("data:image/png;base64,"), "got: {uri}");
    }

    #[test]
    fn test_image_data_uri_defaults_to_jpeg() {
        let uri = image_data_uri(b"abc", None);
        assert!(uri.starts_with("data:image/jpeg;base64,"), "got: {uri}");
        let blank = image_data_uri(b"abc", Some("  "));
        assert!(blank.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_markup_path_serializes_void_elements_without_closing_tag() {
        let raw = "<body><p>a<br>b</p><hr><input type=\"text\"></body>";
        let content = normalize(raw, true);
        for closer in ["</br>", "</hr>", "</input>"] {
            assert!(!content.html.contains(closer), "got: {}", content.html);
        }
        assert!(content.html.contains("<br>"));
        assert!(content.html.contains("<input type=\"text\">"));
    }

    #[test]
    fn test_markup_path_escapes_attribute_values() {
        let raw = "<body><a href=\"x?a=1&amp;b=2\">link</a></body>";
        let content = normalize(raw, true);
        assert!(
            content.html.contains("href=\"x?a=1&amp;b=2\""),
            "got: {}",
            content.html
        );
    }
}
