//! Sentence-aware text chunking
//!
//! Splits text into pieces no longer than a ceiling, preferring to cut between
//! sentences. A sentence ends at `.`, `!` or `?` followed by whitespace; the
//! punctuation stays with its sentence and the whitespace run is dropped.
//!
//! Sentences are packed greedily into a buffer joined by single spaces. A
//! sentence longer than the ceiling is hard-split: each full-length piece is
//! emitted on its own and the shorter tail seeds the next buffer, so it can
//! still merge with the sentences after it.
//!
//! Lengths count `char`s, and hard splits never land inside one.

use tracing::debug;

use crate::ChunkError;

/// Split `text` into chunks of at most `max_length` characters
///
/// - blank input yields no chunks
/// - input that already fits is returned as a single unchanged chunk
/// - no chunk is ever empty
pub fn chunk(text: &str, max_length: usize) -> Result<Vec<String>, ChunkError> {
    debug!(text_len = text.len(), %max_length, "chunk: called");
    if max_length == 0 {
        debug!("chunk: rejecting zero max_length");
        return Err(ChunkError::InvalidMaxLength(max_length));
    }

    if text.trim().is_empty() {
        debug!("chunk: blank input");
        return Ok(Vec::new());
    }

    if text.chars().count() <= max_length {
        debug!("chunk: input fits in one chunk");
        return Ok(vec![text.to_string()]);
    }

    let mut packer = Packer::new(max_length);
    for sentence in split_sentences(text) {
        packer.push_sentence(sentence);
    }
    let chunks = packer.finish();

    debug!(chunk_count = chunks.len(), "chunk: done");
    Ok(chunks)
}

/// Split on whitespace runs that directly follow sentence-terminal punctuation
///
/// Empty candidates are skipped.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut prev: Option<char> = None;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if ch.is_whitespace() && matches!(prev, Some('.' | '!' | '?')) {
            let sentence = &text[start..idx];
            if !sentence.is_empty() {
                sentences.push(sentence);
            }

            // Consume the rest of the whitespace run
            let mut end = idx + ch.len_utf8();
            while let Some(&(next_idx, next)) = chars.peek() {
                if !next.is_whitespace() {
                    break;
                }
                end = next_idx + next.len_utf8();
                chars.next();
            }
            start = end;
            prev = None;
            continue;
        }
        prev = Some(ch);
    }

    if start < text.len() {
        sentences.push(&text[start..]);
    }

    sentences
}

/// Greedy accumulator behind [`chunk`]
struct Packer {
    max_length: usize,
    chunks: Vec<String>,
    buffer: String,
    buffer_len: usize,
}

impl Packer {
    fn new(max_length: usize) -> Self {
        Self {
            max_length,
            chunks: Vec::new(),
            buffer: String::new(),
            buffer_len: 0,
        }
    }

    fn push_sentence(&mut self, sentence: &str) {
        let sentence_len = sentence.chars().count();

        let fits = if self.buffer.is_empty() {
            sentence_len <= self.max_length
        } else {
            self.buffer_len + 1 + sentence_len <= self.max_length
        };

        if fits {
            if !self.buffer.is_empty() {
                self.buffer.push(' ');
                self.buffer_len += 1;
            }
            self.buffer.push_str(sentence);
            self.buffer_len += sentence_len;
            return;
        }

        self.flush();

        if sentence_len <= self.max_length {
            self.buffer.push_str(sentence);
            self.buffer_len = sentence_len;
            return;
        }

        debug!(%sentence_len, max_length = %self.max_length, "Packer::push_sentence: hard splitting sentence");
        let chars: Vec<char> = sentence.chars().collect();
        for piece in chars.chunks(self.max_length) {
            let piece: String = piece.iter().collect();
            if piece.chars().count() == self.max_length {
                self.chunks.push(piece);
            } else {
                // Tail stays open for the next sentence
                self.buffer_len = piece.chars().count();
                self.buffer = piece;
            }
        }
    }

    fn flush(&mut self) {
        if !self.buffer.is_empty() {
            self.chunks.push(std::mem::take(&mut self.buffer));
        }
        self.buffer_len = 0;
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.chunks
    }
}
