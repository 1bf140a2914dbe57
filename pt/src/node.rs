//! Content node model
//!
//! A page is an ordered list of [`ContentNode`]s. Each variant carries only the
//! payload its kind defines, so a todo always has a `checked` flag and a divider
//! never has text.
//!
//! The wire form is the workspace API's block JSON:
//!
//! ```json
//! { "object": "block", "type": "paragraph", "paragraph": { "rich_text": [ ... ] } }
//! ```
//!
//! Reading is total. An unknown `type` becomes [`ContentNode::Unsupported`] and
//! a known type whose payload is missing or malformed becomes
//! [`ContentNode::Malformed`], so one odd block never fails a whole page.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Value, json};
use tracing::debug;

/// Language written for code blocks that don't specify one
const DEFAULT_CODE_LANGUAGE: &str = "plain text";

/// A contiguous span of text with optional formatting
///
/// Annotations are carried through untouched; nothing here interprets them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    pub annotations: Option<Value>,
    pub link: Option<String>,
}

impl TextRun {
    /// Create a run with no annotations and no link
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            annotations: None,
            link: None,
        }
    }

    /// Attach a color annotation
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.annotations = Some(json!({ "color": color.into() }));
        self
    }

    /// Attach a link target
    pub fn with_link(mut self, url: impl Into<String>) -> Self {
        self.link = Some(url.into());
        self
    }

    /// Read one rich-text element
    ///
    /// Prefers `plain_text` (present on everything the API returns) and falls
    /// back to `text.content` (the shape callers write).
    pub fn from_rich_text(value: &Value) -> Self {
        let text = value
            .get("plain_text")
            .and_then(Value::as_str)
            .or_else(|| value.pointer("/text/content").and_then(Value::as_str))
            .unwrap_or_default()
            .to_string();

        let link = value
            .get("href")
            .and_then(Value::as_str)
            .or_else(|| value.pointer("/text/link/url").and_then(Value::as_str))
            .map(str::to_string);

        let annotations = value.get("annotations").filter(|a| !a.is_null()).cloned();

        Self {
            text,
            annotations,
            link,
        }
    }

    /// Render as a writable rich-text element
    pub fn to_rich_text(&self) -> Value {
        let mut text = json!({ "content": self.text });
        if let Some(url) = &self.link {
            text["link"] = json!({ "url": url });
        }

        let mut run = json!({ "type": "text", "text": text });
        if let Some(annotations) = &self.annotations {
            run["annotations"] = annotations.clone();
        }
        run
    }
}

/// Discriminator for the kinds this crate understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Paragraph,
    Heading1,
    Heading2,
    Heading3,
    BulletedItem,
    NumberedItem,
    Todo,
    Quote,
    Code,
    Callout,
    Divider,
}

impl NodeKind {
    /// Wire name used in the block `type` field
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paragraph => "paragraph",
            Self::Heading1 => "heading_1",
            Self::Heading2 => "heading_2",
            Self::Heading3 => "heading_3",
            Self::BulletedItem => "bulleted_list_item",
            Self::NumberedItem => "numbered_list_item",
            Self::Todo => "to_do",
            Self::Quote => "quote",
            Self::Code => "code",
            Self::Callout => "callout",
            Self::Divider => "divider",
        }
    }

    /// Parse a wire name, `None` for kinds we don't model
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "paragraph" => Some(Self::Paragraph),
            "heading_1" => Some(Self::Heading1),
            "heading_2" => Some(Self::Heading2),
            "heading_3" => Some(Self::Heading3),
            "bulleted_list_item" => Some(Self::BulletedItem),
            "numbered_list_item" => Some(Self::NumberedItem),
            "to_do" => Some(Self::Todo),
            "quote" => Some(Self::Quote),
            "code" => Some(Self::Code),
            "callout" => Some(Self::Callout),
            "divider" => Some(Self::Divider),
            _ => None,
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One structural unit of a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentNode {
    Paragraph { runs: Vec<TextRun> },
    Heading1 { runs: Vec<TextRun> },
    Heading2 { runs: Vec<TextRun> },
    Heading3 { runs: Vec<TextRun> },
    BulletedItem { runs: Vec<TextRun> },
    NumberedItem { runs: Vec<TextRun> },
    Todo { runs: Vec<TextRun>, checked: bool },
    Quote { runs: Vec<TextRun> },
    Code { runs: Vec<TextRun>, language: Option<String> },
    Callout {
        runs: Vec<TextRun>,
        icon: Option<String>,
        color: Option<String>,
    },
    Divider,
    /// A known kind whose payload was missing or malformed
    Malformed { kind: NodeKind },
    /// A kind this crate doesn't model; kept so reading stays total
    Unsupported { kind: String },
}

impl ContentNode {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::Paragraph {
            runs: vec![TextRun::plain(text)],
        }
    }

    pub fn heading_1(text: impl Into<String>) -> Self {
        Self::Heading1 {
            runs: vec![TextRun::plain(text)],
        }
    }

    pub fn heading_2(text: impl Into<String>) -> Self {
        Self::Heading2 {
            runs: vec![TextRun::plain(text)],
        }
    }

    pub fn heading_3(text: impl Into<String>) -> Self {
        Self::Heading3 {
            runs: vec![TextRun::plain(text)],
        }
    }

    pub fn bulleted_item(text: impl Into<String>) -> Self {
        Self::BulletedItem {
            runs: vec![TextRun::plain(text)],
        }
    }

    pub fn numbered_item(text: impl Into<String>) -> Self {
        Self::NumberedItem {
            runs: vec![TextRun::plain(text)],
        }
    }

    pub fn todo(text: impl Into<String>, checked: bool) -> Self {
        Self::Todo {
            runs: vec![TextRun::plain(text)],
            checked,
        }
    }

    pub fn quote(text: impl Into<String>) -> Self {
        Self::Quote {
            runs: vec![TextRun::plain(text)],
        }
    }

    pub fn code(text: impl Into<String>, language: Option<String>) -> Self {
        Self::Code {
            runs: vec![TextRun::plain(text)],
            language,
        }
    }

    /// Callout with an emoji icon and a background color
    pub fn callout(text: impl Into<String>, emoji: impl Into<String>, color: impl Into<String>) -> Self {
        Self::Callout {
            runs: vec![TextRun::plain(text)],
            icon: Some(emoji.into()),
            color: Some(color.into()),
        }
    }

    pub fn divider() -> Self {
        Self::Divider
    }

    /// Build a node of `kind` holding a single plain run
    ///
    /// Dividers ignore the text; todos start unchecked.
    pub fn of_kind(kind: NodeKind, text: impl Into<String>) -> Self {
        let runs = vec![TextRun::plain(text)];
        match kind {
            NodeKind::Paragraph => Self::Paragraph { runs },
            NodeKind::Heading1 => Self::Heading1 { runs },
            NodeKind::Heading2 => Self::Heading2 { runs },
            NodeKind::Heading3 => Self::Heading3 { runs },
            NodeKind::BulletedItem => Self::BulletedItem { runs },
            NodeKind::NumberedItem => Self::NumberedItem { runs },
            NodeKind::Todo => Self::Todo { runs, checked: false },
            NodeKind::Quote => Self::Quote { runs },
            NodeKind::Code => Self::Code { runs, language: None },
            NodeKind::Callout => Self::Callout {
                runs,
                icon: None,
                color: None,
            },
            NodeKind::Divider => Self::Divider,
        }
    }

    /// The node's kind, `None` for unsupported nodes
    pub fn kind(&self) -> Option<NodeKind> {
        match self {
            Self::Paragraph { .. } => Some(NodeKind::Paragraph),
            Self::Heading1 { .. } => Some(NodeKind::Heading1),
            Self::Heading2 { .. } => Some(NodeKind::Heading2),
            Self::Heading3 { .. } => Some(NodeKind::Heading3),
            Self::BulletedItem { .. } => Some(NodeKind::BulletedItem),
            Self::NumberedItem { .. } => Some(NodeKind::NumberedItem),
            Self::Todo { .. } => Some(NodeKind::Todo),
            Self::Quote { .. } => Some(NodeKind::Quote),
            Self::Code { .. } => Some(NodeKind::Code),
            Self::Callout { .. } => Some(NodeKind::Callout),
            Self::Divider => Some(NodeKind::Divider),
            Self::Malformed { kind } => Some(*kind),
            Self::Unsupported { .. } => None,
        }
    }

    /// Wire name of the node's kind
    pub fn kind_name(&self) -> &str {
        match self {
            Self::Unsupported { kind } => kind,
            other => other.kind().map(|k| k.as_str()).unwrap_or_default(),
        }
    }

    /// Text runs, empty for dividers, malformed and unsupported nodes
    pub fn runs(&self) -> &[TextRun] {
        match self {
            Self::Paragraph { runs }
            | Self::Heading1 { runs }
            | Self::Heading2 { runs }
            | Self::Heading3 { runs }
            | Self::BulletedItem { runs }
            | Self::NumberedItem { runs }
            | Self::Todo { runs, .. }
            | Self::Quote { runs }
            | Self::Code { runs, .. }
            | Self::Callout { runs, .. } => runs,
            Self::Divider | Self::Malformed { .. } | Self::Unsupported { .. } => &[],
        }
    }

    /// Read a block object as returned by the workspace API
    pub fn from_block(block: &Value) -> Self {
        let type_name = block.get("type").and_then(Value::as_str).unwrap_or_default();
        let Some(kind) = NodeKind::from_wire(type_name) else {
            debug!(%type_name, "ContentNode::from_block: unsupported kind");
            return Self::Unsupported {
                kind: type_name.to_string(),
            };
        };

        if kind == NodeKind::Divider {
            return Self::Divider;
        }

        let payload = block.get(type_name);
        let Some(items) = payload.and_then(|p| p.get("rich_text")).and_then(Value::as_array) else {
            debug!(%kind, "ContentNode::from_block: payload missing or malformed");
            return Self::Malformed { kind };
        };
        let runs: Vec<TextRun> = items.iter().map(TextRun::from_rich_text).collect();

        let field = |name: &str| payload.and_then(|p| p.get(name));

        match kind {
            NodeKind::Paragraph => Self::Paragraph { runs },
            NodeKind::Heading1 => Self::Heading1 { runs },
            NodeKind::Heading2 => Self::Heading2 { runs },
            NodeKind::Heading3 => Self::Heading3 { runs },
            NodeKind::BulletedItem => Self::BulletedItem { runs },
            NodeKind::NumberedItem => Self::NumberedItem { runs },
            NodeKind::Todo => Self::Todo {
                runs,
                checked: field("checked").and_then(Value::as_bool).unwrap_or(false),
            },
            NodeKind::Quote => Self::Quote { runs },
            NodeKind::Code => Self::Code {
                runs,
                language: field("language").and_then(Value::as_str).map(str::to_string),
            },
            NodeKind::Callout => Self::Callout {
                runs,
                icon: field("icon")
                    .and_then(|i| i.get("emoji"))
                    .and_then(Value::as_str)
                    .map(str::to_string),
                color: field("color").and_then(Value::as_str).map(str::to_string),
            },
            NodeKind::Divider => Self::Divider,
        }
    }

    /// Render as an append-ready block object
    ///
    /// Unsupported nodes render as an empty paragraph since the API rejects
    /// blocks it can't create. Malformed nodes render as their kind with no runs.
    pub fn to_block(&self) -> Value {
        let rich_text = |runs: &[TextRun]| Value::Array(runs.iter().map(TextRun::to_rich_text).collect());

        let (kind, payload) = match self {
            Self::Todo { runs, checked } => (
                NodeKind::Todo,
                json!({ "rich_text": rich_text(runs), "checked": checked }),
            ),
            Self::Code { runs, language } => (
                NodeKind::Code,
                json!({
                    "rich_text": rich_text(runs),
                    "language": language.as_deref().unwrap_or(DEFAULT_CODE_LANGUAGE),
                }),
            ),
            Self::Callout { runs, icon, color } => {
                let mut payload = json!({ "rich_text": rich_text(runs) });
                if let Some(emoji) = icon {
                    payload["icon"] = json!({ "type": "emoji", "emoji": emoji });
                }
                if let Some(color) = color {
                    payload["color"] = json!(color);
                }
                (NodeKind::Callout, payload)
            }
            Self::Divider => (NodeKind::Divider, json!({})),
            Self::Malformed { kind: NodeKind::Divider } => (NodeKind::Divider, json!({})),
            Self::Malformed { kind } => {
                debug!(%kind, "ContentNode::to_block: writing malformed node with no runs");
                (*kind, json!({ "rich_text": [] }))
            }
            Self::Unsupported { kind } => {
                debug!(%kind, "ContentNode::to_block: writing unsupported kind as empty paragraph");
                (NodeKind::Paragraph, json!({ "rich_text": [] }))
            }
            other => {
                // Remaining kinds share the plain { rich_text } payload
                let kind = other.kind().unwrap_or(NodeKind::Paragraph);
                (kind, json!({ "rich_text": rich_text(other.runs()) }))
            }
        };

        let name = kind.as_str();
        let mut block = json!({ "object": "block", "type": name });
        block[name] = payload;
        block
    }
}

impl Serialize for ContentNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_block().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ContentNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_block(&value))
    }
}

/// Read a list of blocks
///
/// Accepts a bare array or a list response of the form `{ "results": [...] }`.
/// Anything else yields an empty list.
pub fn parse_blocks(value: &Value) -> Vec<ContentNode> {
    let items = match value {
        Value::Array(items) => Some(items),
        Value::Object(_) => value.get("results").and_then(Value::as_array),
        _ => None,
    };

    match items {
        Some(items) => {
            debug!(count = items.len(), "parse_blocks: reading blocks");
            items.iter().map(ContentNode::from_block).collect()
        }
        None => {
            debug!("parse_blocks: no block list found");
            Vec::new()
        }
    }
}
