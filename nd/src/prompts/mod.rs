//! Prompt Template System
//!
//! Loads and renders `.pmt` (prompt template) files.
//!
//! Template loading chain:
//! 1. `.notiond/prompts/{name}.pmt` (user override)
//! 2. `prompts/{name}.pmt` (repo default)
//! 3. Embedded fallback in code
//!
//! Templates use Handlebars syntax for variable substitution. Output is plain
//! text, so nothing is HTML-escaped.

pub mod embedded;
mod loader;

pub use loader::{Prompt, PromptLoader};
