//! Splits extracted document text into overlapping chunks for embedding.
//!
//! Chunks advance by a fixed stride of `chunk_size - overlap` characters.
//! Each chunk ends at the hard cut `start + chunk_size`, unless a paragraph,
//! sentence, or word boundary exists inside the overlap window, in which
//! case the chunk is shortened to end there (leaving at least half the
//! configured overlap with the next chunk). Chunks are always contiguous
//! substrings of the source text.

/// Split `text` into overlapping chunks of at most `chunk_size` characters.
///
/// `overlap` must be smaller than `chunk_size`. Returns an empty vec for
/// whitespace-only input and a single chunk when the text fits.
pub fn split_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    assert!(overlap < chunk_size, "overlap must be smaller than chunk_size");

    let text = text.trim();
    if text.is_empty() {
        return vec![];
    }

    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= chunk_size {
        return vec![text.to_string()];
    }

    let step = chunk_size - overlap;
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let hard_end = (start + chunk_size).min(chars.len());
        let end = if hard_end == chars.len() {
            hard_end
        } else {
            // Boundaries are only accepted inside the overlap window so the
            // next chunk still shares at least `overlap / 2` characters.
            let min_end = start + step + overlap / 2;
            pick_break(&chars, min_end, hard_end)
        };
        chunks.push(chars[start..end].iter().collect());
        start += step;
    }

    chunks
}

/// Find the best break position in `(min_end, hard_end]`, preferring
/// paragraph, then sentence, then word boundaries, falling back to the
/// hard character cut.
fn pick_break(chars: &[char], min_end: usize, hard_end: usize) -> usize {
    // Paragraph: break just after a blank line.
    for i in (min_end + 1..=hard_end).rev() {
        if i >= 2 && chars[i - 1] == '\n' && chars[i - 2] == '\n' {
            return i;
        }
    }
    // Sentence: break just after terminal punctuation followed by whitespace.
    for i in (min_end + 1..=hard_end).rev() {
        if matches!(chars[i - 1], '.' | '!' | '?')
            && chars.get(i).map(|c| c.is_whitespace()).unwrap_or(true)
        {
            return i;
        }
    }
    // Word: break before whitespace.
    for i in (min_end + 1..=hard_end).rev() {
        if chars[i - 1].is_whitespace() {
            return i;
        }
    }
    hard_end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_one_chunk() {
        let chunks = split_text("Hello world", 1000, 200);
        assert_eq!(chunks, vec!["Hello world"]);
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        assert!(split_text("", 1000, 200).is_empty());
        assert!(split_text("   \n\n  ", 1000, 200).is_empty());
    }

    #[test]
    fn test_2500_chars_yields_four_chunks() {
        let text = "a".repeat(2500);
        let chunks = split_text(&text, 1000, 200);
        assert_eq!(chunks.len(), 4);

        // Uniform text has no boundaries, so cuts are hard: every adjacent
        // pair except the last overlaps by exactly the configured overlap.
        let starts = [0, 800, 1600, 2400];
        for (i, chunk) in chunks.iter().enumerate() {
            let end = (starts[i] + 1000).min(2500);
            assert_eq!(chunk.len(), end - starts[i]);
        }
        for i in 0..chunks.len() - 2 {
            let this_end = (starts[i] + 1000).min(2500);
            let overlap = this_end - starts[i + 1];
            assert!(overlap >= 200, "chunk {i} overlaps successor by {overlap}");
        }
    }

    #[test]
    fn test_chunks_are_contiguous_substrings() {
        let text: String = (0..3000).map(|i| ((i % 26) as u8 + b'a') as char).collect();
        let chunks = split_text(&text, 1000, 200);
        let mut start = 0;
        for chunk in &chunks {
            assert_eq!(&text[start..start + chunk.len()], chunk.as_str());
            start += 800;
        }
    }

    #[test]
    fn test_prefers_paragraph_boundary() {
        let text = format!("{}\n\n{}", "a".repeat(950), "b".repeat(1000));
        let chunks = split_text(&text, 1000, 200);
        // The blank line at 950..952 is inside the overlap window (900, 1000],
        // so the first chunk ends there instead of at the hard cut.
        assert!(chunks[0].ends_with('\n'));
        assert_eq!(chunks[0].len(), 952);
    }

    #[test]
    fn test_prefers_sentence_boundary_over_word() {
        let text = format!(
            "{} end. {}",
            "a".repeat(930),
            "word ".repeat(300).trim()
        );
        let chunks = split_text(&text, 1000, 200);
        assert!(chunks[0].ends_with("end."));
    }

    #[test]
    fn test_falls_back_to_word_boundary() {
        let text = format!("{} {}", "a".repeat(950), "b".repeat(1000));
        let chunks = split_text(&text, 1000, 200);
        assert_eq!(chunks[0].len(), 951);
        assert!(chunks[0].ends_with(' '));
    }

    #[test]
    #[should_panic(expected = "overlap must be smaller")]
    fn test_overlap_must_be_smaller_than_size() {
        split_text("some text", 100, 100);
    }
}
