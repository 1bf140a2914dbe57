//! Block text extraction
//!
//! Flattens a page's nodes into one newline-separated text stream in reading
//! order. Each text-bearing node becomes one line:
//!
//! | kind | rendering |
//! |------|-----------|
//! | paragraph, heading 1/2/3 | run text |
//! | bulleted item | `• ` + run text |
//! | numbered item | `1. ` + run text |
//! | todo | `✓ ` or `☐ ` + run text |
//! | quote | `> ` + run text |
//! | code | run text fenced by ```` ``` ```` lines |
//!
//! Callouts, dividers, malformed nodes and unsupported kinds contribute
//! nothing.

use tracing::debug;

use crate::node::{ContentNode, TextRun};

/// Concatenate run texts with no separator
pub fn plain_text(runs: &[TextRun]) -> String {
    runs.iter().map(|r| r.text.as_str()).collect()
}

/// Flatten nodes into a single string
///
/// Numbered items always render with a literal `1.` marker; positions are
/// not tracked across the list.
pub fn extract(nodes: &[ContentNode]) -> String {
    debug!(node_count = nodes.len(), "extract: called");
    let mut out = String::new();

    for node in nodes {
        match node {
            ContentNode::Paragraph { runs }
            | ContentNode::Heading1 { runs }
            | ContentNode::Heading2 { runs }
            | ContentNode::Heading3 { runs } => {
                out.push_str(&plain_text(runs));
                out.push('\n');
            }
            ContentNode::BulletedItem { runs } => {
                out.push_str("• ");
                out.push_str(&plain_text(runs));
                out.push('\n');
            }
            ContentNode::NumberedItem { runs } => {
                out.push_str("1. ");
                out.push_str(&plain_text(runs));
                out.push('\n');
            }
            ContentNode::Todo { runs, checked } => {
                out.push_str(if *checked { "✓ " } else { "☐ " });
                out.push_str(&plain_text(runs));
                out.push('\n');
            }
            ContentNode::Quote { runs } => {
                out.push_str("> ");
                out.push_str(&plain_text(runs));
                out.push('\n');
            }
            ContentNode::Code { runs, .. } => {
                out.push_str("```\n");
                out.push_str(&plain_text(runs));
                out.push_str("\n```\n");
            }
            ContentNode::Callout { .. }
            | ContentNode::Divider
            | ContentNode::Malformed { .. }
            | ContentNode::Unsupported { .. } => {
                debug!(kind = %node.kind_name(), "extract: skipping node");
            }
        }
    }

    out
}
