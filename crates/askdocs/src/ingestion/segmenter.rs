//! Text segmentation with overlap along natural boundaries

use unicode_segmentation::UnicodeSegmentation;

/// Chars of lookahead past the window edge when computing sentence bounds,
/// so a sentence ending exactly at the edge is seen as a boundary rather
/// than a truncation.
const SENTENCE_LOOKAHEAD: usize = 32;

/// Split `text` into overlapping chunks of at most `chunk_size` characters.
///
/// Each chunk ends at the largest natural boundary available inside its
/// window: a paragraph break, else a sentence boundary, else a hard cut at
/// `chunk_size`. Each chunk after the first starts `overlap` characters
/// before the previous chunk's end, so a sentence straddling a cut is fully
/// contained in at least one chunk. Every character of the input appears in
/// at least one chunk. Empty or whitespace-only input yields no chunks.
///
/// # Panics
///
/// Panics when `chunk_size == 0` or `overlap >= chunk_size`.
pub fn segment(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    segment_spans(text, chunk_size, overlap)
        .into_iter()
        .map(|(start, end)| text[start..end].to_string())
        .collect()
}

/// Byte spans of the chunks `segment` returns, in order.
fn segment_spans(text: &str, chunk_size: usize, overlap: usize) -> Vec<(usize, usize)> {
    assert!(chunk_size > 0, "chunk_size must be positive");
    assert!(
        overlap < chunk_size,
        "overlap must be smaller than chunk_size"
    );

    if text.trim().is_empty() {
        return Vec::new();
    }

    // Byte offset of every char boundary, one past the end included, so
    // windows are taken in char space and sliced in byte space.
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let total_chars = offsets.len() - 1;

    let mut spans = Vec::new();
    let mut start = 0usize;
    loop {
        let window_end = (start + chunk_size).min(total_chars);
        let end = if window_end == total_chars {
            total_chars
        } else {
            cut_point(text, &offsets, start, window_end)
        };
        spans.push((offsets[start], offsets[end]));
        if end == total_chars {
            break;
        }
        // Step back by the overlap for the next window, but always make
        // forward progress.
        start = (end.saturating_sub(overlap)).max(start + 1);
    }
    spans
}

/// Choose where to end the chunk starting at char `start`, given that the
/// full window `[start, window_end)` does not reach the end of the text.
/// Returns a char index in `(start, window_end]`.
fn cut_point(text: &str, offsets: &[usize], start: usize, window_end: usize) -> usize {
    let window = &text[offsets[start]..offsets[window_end]];

    // Largest boundary first: cut just after the last paragraph break.
    if let Some(pos) = window.rfind("\n\n") {
        let cut = char_index(offsets, offsets[start] + pos + 2);
        if cut > start {
            return cut;
        }
    }

    // Sentence boundaries next.
    let total_chars = offsets.len() - 1;
    let lookahead_end = (window_end + SENTENCE_LOOKAHEAD).min(total_chars);
    let extended = &text[offsets[start]..offsets[lookahead_end]];
    let mut best = 0usize;
    for (pos, _) in extended.split_sentence_bound_indices() {
        if pos > 0 && pos <= window.len() {
            best = best.max(pos);
        }
    }
    if best > 0 {
        let cut = char_index(offsets, offsets[start] + best);
        if cut > start {
            return cut;
        }
    }

    // No natural boundary in reach: hard cut at the window edge.
    window_end
}

/// Map an absolute byte position back to its char index.
fn char_index(offsets: &[usize], byte: usize) -> usize {
    offsets
        .binary_search(&byte)
        .expect("cut position must fall on a char boundary")
}
