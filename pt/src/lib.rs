//! PageText - block flattening and size-bounded chunking
//!
//! Pure functions shared by everything that moves text between a workspace
//! page and a text-generation model:
//!
//! ```text
//! blocks ──extract──▶ flat text ──(model)──▶ result text ──chunk──▶ chunks ──assemble──▶ blocks
//! ```
//!
//! Nothing in this crate performs I/O. Inputs are borrowed, outputs are new
//! values, so every function is safe to call from any number of tasks at once.
//!
//! # Example
//!
//! ```
//! use pagetext::{ContentNode, chunk, extract, to_paragraphs};
//!
//! let nodes = vec![ContentNode::heading_1("A"), ContentNode::paragraph("B")];
//! assert_eq!(extract(&nodes), "A\nB\n");
//!
//! let chunks = chunk("One. Two. Three.", 8).unwrap();
//! assert_eq!(chunks, vec!["One.", "Two.", "Three."]);
//! assert_eq!(to_paragraphs(&chunks).len(), 3);
//! ```

pub mod assemble;
pub mod chunk;
pub mod cli;
mod error;
pub mod extract;
pub mod node;

pub use assemble::{sections, to_paragraphs, with_header};
pub use chunk::chunk;
pub use error::ChunkError;
pub use extract::{extract, plain_text};
pub use node::{ContentNode, NodeKind, TextRun, parse_blocks};

/// Default chunk ceiling, kept under the workspace API's 2000-character
/// rich-text limit per block
pub const DEFAULT_MAX_LENGTH: usize = 1800;
