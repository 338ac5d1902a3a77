//! Rendering of portable content blocks into a visual tree of HTML
//! elements, plus the plain-text projection used for reading time.

use std::fmt::Write;

use quick_xml::escape::escape;

use crate::content::portable_text::{BlockStyle, ListInfo};
use crate::content::{ContentBlock, ImageBlock, ListKind, Mark, Span, TextBlock};

pub const DEFAULT_WORDS_PER_MINUTE: usize = 200;
const IMAGE_ALT_FALLBACK: &str = "Blog image";

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: &'static str,
    pub attrs: Vec<(&'static str, String)>,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct VisualTree {
    pub nodes: Vec<Node>,
}

impl Element {
    fn new(tag: &'static str) -> Self {
        Element { tag, attrs: vec![], children: vec![] }
    }

    fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((name, value.into()));
        self
    }

    fn class(self, value: &str) -> Self {
        self.attr("class", value)
    }

    fn child(mut self, node: Node) -> Self {
        self.children.push(node);
        self
    }

    fn children(mut self, nodes: Vec<Node>) -> Self {
        self.children.extend(nodes);
        self
    }

    fn is_void(&self) -> bool {
        matches!(self.tag, "img" | "br")
    }
}

impl From<Element> for Node {
    fn from(value: Element) -> Self {
        Node::Element(value)
    }
}

impl Node {
    fn write_html(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(&escape(text.as_str())),
            Node::Element(el) => {
                out.push('<');
                out.push_str(el.tag);
                for (name, value) in el.attrs.iter() {
                    let _ = write!(out, " {}=\"{}\"", name, escape(value.as_str()));
                }
                out.push('>');
                if el.is_void() {
                    return;
                }
                for child in el.children.iter() {
                    child.write_html(out);
                }
                let _ = write!(out, "</{}>", el.tag);
            }
        }
    }
}

impl VisualTree {
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for node in self.nodes.iter() {
            node.write_html(&mut out);
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

fn heading_class(level: u8) -> &'static str {
    match level {
        1 => "text-4xl font-bold my-6",
        2 => "text-3xl font-semibold my-5",
        3 => "text-2xl font-semibold my-4",
        4 => "text-xl font-semibold my-3",
        5 => "text-lg font-semibold my-2",
        _ => "text-base font-semibold my-2",
    }
}

fn heading_tag(level: u8) -> &'static str {
    match level {
        1 => "h1",
        2 => "h2",
        3 => "h3",
        4 => "h4",
        5 => "h5",
        _ => "h6",
    }
}

fn render_mark(mark: &Mark, inner: Node) -> Node {
    match mark {
        Mark::Bold => Element::new("strong").class("font-bold").child(inner).into(),
        Mark::Italic => Element::new("em").class("italic").child(inner).into(),
        Mark::Code => Element::new("code").class("inline-code").child(inner).into(),
        Mark::Link { href, blank } => {
            let href = href.clone().unwrap_or_else(|| "#".to_string());
            let link = Element::new("a").attr("href", href);
            let link = if *blank {
                link.attr("target", "_blank").attr("rel", "noopener noreferrer")
            } else {
                link.attr("target", "_self")
            };
            let link = link.class("text-link").child(inner);
            if *blank {
                link.child(Element::new("span")
                    .class("external-link-icon")
                    .attr("aria-hidden", "true")
                    .child(Node::Text("↗".to_string()))
                    .into())
                    .into()
            } else {
                link.into()
            }
        }
    }
}

// The first mark of a span becomes the outermost element.
fn render_span(span: &Span) -> Node {
    span.marks.iter().rev()
        .fold(Node::Text(span.text.clone()), |inner, mark| render_mark(mark, inner))
}

fn render_spans(spans: &[Span]) -> Vec<Node> {
    spans.iter().map(render_span).collect()
}

fn render_text_block(block: &TextBlock) -> Node {
    let el = match block.style {
        BlockStyle::Normal => Element::new("p").class("my-3"),
        BlockStyle::Heading(level) => Element::new(heading_tag(level)).class(heading_class(level)),
        BlockStyle::Quote => Element::new("blockquote")
            .class("border-l-4 border-blue-600 pl-4 italic my-4 text-gray-700"),
    };
    el.children(render_spans(&block.spans)).into()
}

fn render_image(image: &ImageBlock) -> Option<Node> {
    let src = image.asset_url.as_ref()?;
    let alt = image.alt.clone().unwrap_or_else(|| IMAGE_ALT_FALLBACK.to_string());

    let img = Element::new("img")
        .attr("src", src.as_str())
        .attr("alt", alt)
        .attr("width", "600")
        .attr("height", "300")
        .attr("loading", "lazy")
        .class("rounded-lg object-cover");
    let figure = Element::new("figure").class("my-6 flex justify-center").child(img.into());
    let figure = match image.caption {
        Some(ref caption) => figure.child(Element::new("figcaption")
            .child(Node::Text(caption.clone()))
            .into()),
        None => figure,
    };
    Some(figure.into())
}

fn list_container(kind: ListKind) -> Element {
    match kind {
        ListKind::Bullet => Element::new("ul").class("list-disc list-inside mb-3"),
        ListKind::Number => Element::new("ol").class("list-decimal list-inside mb-3"),
    }
}

fn list_info(block: &ContentBlock) -> Option<ListInfo> {
    block.as_text().and_then(|text| text.list)
}

// Groups consecutive list items starting at `start` into one container.
// Deeper items nest inside the preceding item; a shallower item or a
// different list kind at the same level ends the container.
fn render_list(blocks: &[ContentBlock], start: usize) -> (Node, usize) {
    let Some(info) = list_info(&blocks[start]) else {
        return (Node::Text(String::new()), start + 1);
    };
    let mut container = list_container(info.kind);
    let mut idx = start;

    while idx < blocks.len() {
        let Some(item) = list_info(&blocks[idx]) else { break };

        if item.level == info.level && item.kind == info.kind {
            let spans = blocks[idx].as_text().map(|t| render_spans(&t.spans)).unwrap_or_default();
            container = container.child(Element::new("li").class("mb-1").children(spans).into());
            idx += 1;
        } else if item.level > info.level {
            let (nested, next) = render_list(blocks, idx);
            match container.children.last_mut() {
                Some(Node::Element(last)) => last.children.push(nested),
                _ => container.children.push(Element::new("li").child(nested).into()),
            }
            idx = next;
        } else {
            break;
        }
    }

    (container.into(), idx)
}

/// Depth-first rendering of `blocks`. Unknown block kinds and images
/// without an asset produce nothing.
pub fn render(blocks: &[ContentBlock]) -> VisualTree {
    let mut nodes = vec![];
    let mut idx = 0;

    while idx < blocks.len() {
        match &blocks[idx] {
            ContentBlock::Text(text) if text.list.is_some() => {
                let (list, next) = render_list(blocks, idx);
                nodes.push(list);
                idx = next;
                continue;
            }
            ContentBlock::Text(text) => nodes.push(render_text_block(text)),
            ContentBlock::Image(image) => nodes.extend(render_image(image)),
            ContentBlock::Unknown(_) => {}
        }
        idx += 1;
    }

    VisualTree { nodes }
}

/// Text of every text block, space separated. Media blocks contribute nothing.
pub fn plain_text(blocks: &[ContentBlock]) -> String {
    blocks.iter()
        .filter_map(ContentBlock::as_text)
        .map(TextBlock::plain_text)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn word_count(blocks: &[ContentBlock]) -> usize {
    plain_text(blocks).split_whitespace().count()
}

/// Minutes needed to read `blocks`, rounded up, never less than one.
pub fn estimate_reading_minutes(blocks: &[ContentBlock], words_per_minute: usize) -> usize {
    let wpm = if words_per_minute == 0 { DEFAULT_WORDS_PER_MINUTE } else { words_per_minute };
    word_count(blocks).div_ceil(wpm).max(1)
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;

    fn blocks(values: Vec<Value>) -> Vec<ContentBlock> {
        values.into_iter().map(ContentBlock::from_value).collect()
    }

    fn para(text: &str) -> Value {
        json!({"_type": "block", "style": "normal", "children": [{"_type": "span", "text": text}]})
    }

    fn item(kind: &str, level: u32, text: &str) -> Value {
        json!({"_type": "block", "style": "normal", "listItem": kind, "level": level,
               "children": [{"_type": "span", "text": text}]})
    }

    #[test]
    fn test_paragraph_and_headings() {
        let body = blocks(vec![
            para("Hello"),
            json!({"_type": "block", "style": "h1", "children": [{"text": "Big"}]}),
            json!({"_type": "block", "style": "h6", "children": [{"text": "Small"}]}),
            json!({"_type": "block", "style": "blockquote", "children": [{"text": "Quoted"}]}),
        ]);
        let html = render(&body).to_html();
        assert_eq!(html, concat!(
            r#"<p class="my-3">Hello</p>"#,
            r#"<h1 class="text-4xl font-bold my-6">Big</h1>"#,
            r#"<h6 class="text-base font-semibold my-2">Small</h6>"#,
            r#"<blockquote class="border-l-4 border-blue-600 pl-4 italic my-4 text-gray-700">Quoted</blockquote>"#,
        ));
    }

    #[test]
    fn test_heading_levels_are_distinct() {
        let classes: Vec<&str> = (1..=6).map(heading_class).collect();
        for (i, a) in classes.iter().enumerate() {
            for b in classes.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_marks_compose() {
        let body = blocks(vec![json!({
            "_type": "block", "style": "normal",
            "children": [{"text": "x", "marks": ["strong", "em", "code"]}]
        })]);
        assert_eq!(render(&body).to_html(),
                   r#"<p class="my-3"><strong class="font-bold"><em class="italic"><code class="inline-code">x</code></em></strong></p>"#);
    }

    #[test]
    fn test_links() {
        let body = blocks(vec![json!({
            "_type": "block", "style": "normal",
            "markDefs": [
                {"_key": "a", "_type": "link", "href": "https://example.com", "blank": true},
                {"_key": "b", "_type": "link", "href": "/about"},
                {"_key": "c", "_type": "link"}
            ],
            "children": [
                {"text": "out", "marks": ["a"]},
                {"text": "in", "marks": ["b"]},
                {"text": "none", "marks": ["c"]}
            ]
        })]);
        let html = render(&body).to_html();
        assert!(html.contains(r#"<a href="https://example.com" target="_blank" rel="noopener noreferrer" class="text-link">out<span class="external-link-icon" aria-hidden="true">↗</span></a>"#));
        assert!(html.contains(r#"<a href="/about" target="_self" class="text-link">in</a>"#));
        assert!(html.contains(r##"<a href="#" target="_self" class="text-link">none</a>"##));
    }

    #[test]
    fn test_lists_group_and_nest() {
        let body = blocks(vec![
            item("bullet", 1, "a"),
            item("bullet", 2, "a.1"),
            item("bullet", 1, "b"),
            item("number", 1, "one"),
            para("after"),
        ]);
        let html = render(&body).to_html();
        assert_eq!(html, concat!(
            r#"<ul class="list-disc list-inside mb-3">"#,
            r#"<li class="mb-1">a<ul class="list-disc list-inside mb-3"><li class="mb-1">a.1</li></ul></li>"#,
            r#"<li class="mb-1">b</li>"#,
            r#"</ul>"#,
            r#"<ol class="list-decimal list-inside mb-3"><li class="mb-1">one</li></ol>"#,
            r#"<p class="my-3">after</p>"#,
        ));
    }

    #[test]
    fn test_list_starting_deep() {
        let body = blocks(vec![item("number", 2, "deep"), item("number", 1, "top")]);
        let tree = render(&body);
        assert_eq!(tree.nodes.len(), 2);
    }

    #[test]
    fn test_image() {
        let body = blocks(vec![
            json!({"_type": "image", "asset": {"url": "https://cdn.example.com/a.png"}, "caption": "Team"}),
            json!({"_type": "image", "asset": {"_ref": "image-unresolved"}}),
        ]);
        let html = render(&body).to_html();
        assert_eq!(html, concat!(
            r#"<figure class="my-6 flex justify-center">"#,
            r#"<img src="https://cdn.example.com/a.png" alt="Blog image" width="600" height="300" loading="lazy" class="rounded-lg object-cover">"#,
            r#"<figcaption>Team</figcaption></figure>"#,
        ));
    }

    #[test]
    fn test_unknown_blocks_are_skipped() {
        let body = blocks(vec![json!({"_type": "youtube", "id": "x"}), para("kept")]);
        assert_eq!(render(&body).to_html(), r#"<p class="my-3">kept</p>"#);
    }

    #[test]
    fn test_text_is_escaped() {
        let body = blocks(vec![para("<script>alert('x')</script> & co")]);
        let html = render(&body).to_html();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("&amp; co"));
    }

    #[test]
    fn test_plain_text() {
        let body = blocks(vec![
            para("word"),
            json!({"_type": "image", "asset": {"url": "x"}}),
            para("word"),
            json!({"_type": "block", "children": [{"text": "two", "marks": ["strong"]}, {"text": "spans"}]}),
        ]);
        assert_eq!(plain_text(&body), "word word two spans");
        assert_eq!(plain_text(&[]), "");
    }

    #[test]
    fn test_reading_time() {
        let body = blocks((0..200).map(|_| para("word")).collect());
        assert_eq!(plain_text(&body).split(' ').count(), 200);
        assert_eq!(estimate_reading_minutes(&body, DEFAULT_WORDS_PER_MINUTE), 1);

        let body = blocks((0..201).map(|_| para("word")).collect());
        assert_eq!(estimate_reading_minutes(&body, 200), 2);

        assert_eq!(estimate_reading_minutes(&[], 200), 1);
        assert_eq!(estimate_reading_minutes(&body, 0), 2);
    }
}
