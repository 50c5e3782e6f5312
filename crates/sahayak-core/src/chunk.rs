//! Sliding-window text chunker.
//!
//! Splits document text into fixed-size windows of characters, each window
//! overlapping the previous one by a fixed number of characters so that a
//! sentence straddling a boundary still appears whole in at least one chunk.
//!
//! Sizes are measured in characters (Unicode scalar values), never bytes, so
//! a window can not split a multi-byte character. Scheme documents routinely
//! mix English with Devanagari or Telugu script.
//!
//! # Algorithm
//!
//! 1. If the text has at most `max_chars` characters, return it whole.
//! 2. Otherwise take `[start, start + max_chars)`, then advance `start` by
//!    `max_chars - overlap` until the window reaches the end of the text.
//! 3. The final window may be shorter than `max_chars`.
//!
//! # Example
//!
//! ```rust
//! use sahayak_core::chunk::chunk_text;
//!
//! let text = "a".repeat(1200);
//! let chunks = chunk_text(&text, 500, 100);
//! assert_eq!(chunks.len(), 3);
//! assert_eq!(chunks[2].chars().count(), 400);
//! ```

use thiserror::Error;

/// Rejected chunking parameters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkParamsError {
    #[error("chunk size must be > 0")]
    ZeroSize,
    #[error("chunk overlap ({overlap}) must be smaller than the chunk size ({max_chars})")]
    OverlapTooLarge { max_chars: usize, overlap: usize },
}

/// Validated window and overlap, in characters.
///
/// Constructing through [`ChunkParams::new`] guarantees `overlap < max_chars`,
/// which is what keeps [`chunk_text`] from looping forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkParams {
    max_chars: usize,
    overlap: usize,
}

impl ChunkParams {
    pub fn new(max_chars: usize, overlap: usize) -> Result<Self, ChunkParamsError> {
        if max_chars == 0 {
            return Err(ChunkParamsError::ZeroSize);
        }
        if overlap >= max_chars {
            return Err(ChunkParamsError::OverlapTooLarge { max_chars, overlap });
        }
        Ok(Self { max_chars, overlap })
    }

    /// Window used for question answering: wide chunks give the model more
    /// context per retrieved passage.
    pub fn for_qa() -> Self {
        Self {
            max_chars: 2000,
            overlap: 300,
        }
    }

    /// Window used by the multi-stage summarization pipeline.
    pub fn for_summary() -> Self {
        Self {
            max_chars: 3000,
            overlap: 300,
        }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        chunk_text(text, self.max_chars, self.overlap)
    }
}

/// Split `text` into overlapping windows of at most `max_chars` characters.
///
/// # Guarantees
///
/// - Text no longer than `max_chars` (including empty text) yields exactly
///   one chunk equal to the input.
/// - Chunk `i` starts at character `i * (max_chars - overlap)`.
/// - Every chunk except the last has exactly `max_chars` characters.
/// - Together the chunks cover every character of the input.
///
/// # Panics
///
/// Panics if `overlap >= max_chars`. Use [`ChunkParams::new`] to validate
/// user-supplied values up front.
pub fn chunk_text(text: &str, max_chars: usize, overlap: usize) -> Vec<String> {
    assert!(
        overlap < max_chars,
        "chunk overlap ({overlap}) must be smaller than the chunk size ({max_chars})"
    );

    let total = text.chars().count();
    if total <= max_chars {
        return vec![text.to_string()];
    }

    // Byte offset of every char boundary, plus the end of the string.
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();

    let stride = max_chars - overlap;
    let mut chunks = Vec::with_capacity(total.div_ceil(stride));
    let mut start = 0;

    loop {
        let end = (start + max_chars).min(total);
        chunks.push(text[offsets[start]..offsets[end]].to_string());
        if end >= total {
            break;
        }
        start += stride;
    }

    chunks
}

/// Longest prefix of `text` with at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Like [`truncate_chars`], appending `...` when anything was cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    let head = truncate_chars(text, max_chars);
    if head.len() < text.len() {
        format!("{head}...")
    } else {
        head.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = chunk_text("Hello, world!", 500, 100);
        assert_eq!(chunks, vec!["Hello, world!".to_string()]);
    }

    #[test]
    fn test_exact_size_single_chunk() {
        let text = "x".repeat(500);
        let chunks = chunk_text(&text, 500, 100);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], text);
    }

    #[test]
    fn test_empty_text() {
        let chunks = chunk_text("", 500, 100);
        assert_eq!(chunks, vec![String::new()]);
    }

    #[test]
    fn test_offsets_for_1200_chars() {
        let text: String = (0..1200).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let chunks = chunk_text(&text, 500, 100);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], text[0..500]);
        assert_eq!(chunks[1], text[400..900]);
        assert_eq!(chunks[2], text[800..1200]);
        assert_eq!(chunks[2].len(), 400);
    }

    #[test]
    fn test_all_but_last_are_full_width() {
        let text = "abcdefghij".repeat(97);
        let chunks = chunk_text(&text, 64, 16);
        let (last, rest) = chunks.split_last().unwrap();
        for c in rest {
            assert_eq!(c.chars().count(), 64);
        }
        assert!(last.chars().count() <= 64);
    }

    #[test]
    fn test_chunks_cover_every_char() {
        let text: String = (0..1013).map(|i| char::from(b'0' + (i % 10) as u8)).collect();
        for (max, overlap) in [(100, 0), (100, 99), (37, 5), (1013, 10), (2000, 300)] {
            let chunks = chunk_text(&text, max, overlap);
            let stride = max - overlap;
            let mut covered = vec![false; text.len()];
            for (i, c) in chunks.iter().enumerate() {
                let start = i * stride;
                assert_eq!(&text[start..start + c.len()], c.as_str());
                for flag in &mut covered[start..start + c.len()] {
                    *flag = true;
                }
            }
            assert!(covered.iter().all(|&f| f), "gap with max={max} overlap={overlap}");
        }
    }

    #[test]
    fn test_multibyte_chars_are_never_split() {
        let text = "ప్రధాన మంత్రి కిసాన్ సమ్మాన్ నిధి ".repeat(20);
        let chunks = chunk_text(&text, 50, 10);
        assert!(chunks.len() > 1);
        for c in &chunks[..chunks.len() - 1] {
            assert_eq!(c.chars().count(), 50);
        }
    }

    #[test]
    #[should_panic(expected = "must be smaller")]
    fn test_overlap_not_smaller_panics() {
        chunk_text("some text that is long enough", 10, 10);
    }

    #[test]
    fn test_params_validation() {
        assert_eq!(ChunkParams::new(0, 0), Err(ChunkParamsError::ZeroSize));
        assert_eq!(
            ChunkParams::new(100, 100),
            Err(ChunkParamsError::OverlapTooLarge {
                max_chars: 100,
                overlap: 100
            })
        );
        let p = ChunkParams::new(100, 20).unwrap();
        assert_eq!(p.max_chars(), 100);
        assert_eq!(p.overlap(), 20);
    }

    #[test]
    fn test_deterministic() {
        let text = "Alpha beta gamma delta. ".repeat(200);
        assert_eq!(chunk_text(&text, 300, 50), chunk_text(&text, 300, 50));
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("0123456789abc", 10), "0123456789...");
        assert_eq!(truncate_chars("నిధి", 2).chars().count(), 2);
    }
}
