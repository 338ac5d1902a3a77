//! Portable content blocks: the structured body format used by the content
//! store. Text blocks carry spans with marks, media blocks carry an asset.
//! Unknown block types are kept as [`ContentBlock::Unknown`] so rendering
//! can skip them instead of failing the whole post.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Text(TextBlock),
    Image(ImageBlock),
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStyle {
    Normal,
    Heading(u8),
    Quote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Bullet,
    Number,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListInfo {
    pub kind: ListKind,
    pub level: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub style: BlockStyle,
    pub list: Option<ListInfo>,
    pub spans: Vec<Span>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub text: String,
    pub marks: Vec<Mark>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mark {
    Bold,
    Italic,
    Code,
    Link { href: Option<String>, blank: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageBlock {
    pub asset_url: Option<String>,
    pub asset_ref: Option<String>,
    pub alt: Option<String>,
    pub caption: Option<String>,
}

impl TextBlock {
    /// Raw span texts joined with single spaces, marks ignored.
    pub fn plain_text(&self) -> String {
        self.spans.iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl BlockStyle {
    fn from_name(name: Option<&str>) -> Self {
        match name {
            Some("h1") => BlockStyle::Heading(1),
            Some("h2") => BlockStyle::Heading(2),
            Some("h3") => BlockStyle::Heading(3),
            Some("h4") => BlockStyle::Heading(4),
            Some("h5") => BlockStyle::Heading(5),
            Some("h6") => BlockStyle::Heading(6),
            Some("blockquote") => BlockStyle::Quote,
            _ => BlockStyle::Normal,
        }
    }
}

#[derive(Deserialize)]
struct RawTextBlock {
    style: Option<String>,
    #[serde(rename = "listItem")]
    list_item: Option<String>,
    level: Option<u32>,
    #[serde(default)]
    children: Option<Vec<RawSpan>>,
    #[serde(rename = "markDefs", default)]
    mark_defs: Option<Vec<RawMarkDef>>,
}

// Fields may be missing or explicitly null; either reads as empty.
#[derive(Deserialize)]
struct RawSpan {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    marks: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct RawMarkDef {
    #[serde(rename = "_key", default)]
    key: Option<String>,
    #[serde(rename = "_type", default)]
    kind: Option<String>,
    href: Option<String>,
    blank: Option<bool>,
}

#[derive(Deserialize)]
struct RawImageBlock {
    asset: Option<RawAsset>,
    alt: Option<String>,
    caption: Option<String>,
}

#[derive(Deserialize)]
struct RawAsset {
    url: Option<String>,
    #[serde(rename = "_ref")]
    reference: Option<String>,
}

fn resolve_mark(name: &str, mark_defs: &[RawMarkDef]) -> Option<Mark> {
    match name {
        "strong" => Some(Mark::Bold),
        "em" => Some(Mark::Italic),
        "code" => Some(Mark::Code),
        key => mark_defs.iter()
            .find(|def| def.key.as_deref() == Some(key) && def.kind.as_deref() == Some("link"))
            .map(|def| Mark::Link {
                href: def.href.clone(),
                blank: def.blank.unwrap_or(false),
            }),
    }
}

impl From<RawTextBlock> for TextBlock {
    fn from(raw: RawTextBlock) -> Self {
        let list = match raw.list_item.as_deref() {
            Some("bullet") => Some(ListKind::Bullet),
            Some("number") => Some(ListKind::Number),
            _ => None,
        }.map(|kind| ListInfo { kind, level: raw.level.unwrap_or(1).max(1) });

        let mark_defs = raw.mark_defs.unwrap_or_default();
        let spans = raw.children.unwrap_or_default().into_iter()
            .map(|child| Span {
                marks: child.marks.unwrap_or_default().iter()
                    .filter_map(|m| resolve_mark(m, &mark_defs))
                    .collect(),
                text: child.text.unwrap_or_default(),
            })
            .collect();

        TextBlock {
            style: BlockStyle::from_name(raw.style.as_deref()),
            list,
            spans,
        }
    }
}

impl From<RawImageBlock> for ImageBlock {
    fn from(raw: RawImageBlock) -> Self {
        let (asset_url, asset_ref) = match raw.asset {
            Some(asset) => (asset.url, asset.reference),
            None => (None, None),
        };
        ImageBlock { asset_url, asset_ref, alt: raw.alt, caption: raw.caption }
    }
}

impl ContentBlock {
    pub fn from_value(value: Value) -> ContentBlock {
        let kind = value.get("_type")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();

        match kind.as_str() {
            "block" => match serde_json::from_value::<RawTextBlock>(value) {
                Ok(raw) => ContentBlock::Text(raw.into()),
                Err(_) => ContentBlock::Unknown(kind),
            },
            "image" => match serde_json::from_value::<RawImageBlock>(value) {
                Ok(raw) => ContentBlock::Image(raw.into()),
                Err(_) => ContentBlock::Unknown(kind),
            },
            _ => ContentBlock::Unknown(kind),
        }
    }

    pub fn as_text(&self) -> Option<&TextBlock> {
        match self {
            ContentBlock::Text(block) => Some(block),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for ContentBlock {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(ContentBlock::from_value(value))
    }
}
