//! Content assembly
//!
//! The write-back direction: turns chunked text into nodes ready to append.

use tracing::debug;

use crate::node::{ContentNode, TextRun};

/// One paragraph per chunk, each holding a single plain run
pub fn to_paragraphs<S: AsRef<str>>(chunks: &[S]) -> Vec<ContentNode> {
    debug!(chunk_count = chunks.len(), "to_paragraphs: called");
    chunks
        .iter()
        .map(|c| ContentNode::Paragraph {
            runs: vec![TextRun::plain(c.as_ref())],
        })
        .collect()
}

/// Put `header` in front of the paragraphs built from `chunks`
pub fn with_header<S: AsRef<str>>(header: ContentNode, chunks: &[S]) -> Vec<ContentNode> {
    debug!(header = %header.kind_name(), chunk_count = chunks.len(), "with_header: called");
    let mut nodes = Vec::with_capacity(chunks.len() + 1);
    nodes.push(header);
    nodes.extend(to_paragraphs(chunks));
    nodes
}

/// Lay out several sections in order, each its header nodes then its paragraphs
pub fn sections<S: AsRef<str>>(parts: Vec<(Vec<ContentNode>, Vec<S>)>) -> Vec<ContentNode> {
    debug!(section_count = parts.len(), "sections: called");
    let mut nodes = Vec::new();
    for (headers, chunks) in parts {
        nodes.extend(headers);
        nodes.extend(to_paragraphs(&chunks));
    }
    nodes
}
