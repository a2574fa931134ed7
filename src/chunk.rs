//! Overlapping character-window text splitter.
//!
//! Splits a page's text into pieces of at most `max_chars` characters,
//! with the tail of each piece repeated at the head of the next
//! (`overlap_chars`). Breaks prefer the last whitespace inside the
//! window so words survive intact; a single unbroken run longer than the
//! window is cut hard.

/// Split text into overlapping pieces of at most `max_chars` characters.
///
/// Empty and whitespace-only input yields no pieces. `overlap_chars` is
/// clamped below `max_chars` so every step makes forward progress.
pub fn split_text(text: &str, max_chars: usize, overlap_chars: usize) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() || max_chars == 0 {
        return Vec::new();
    }

    let chars: Vec<char> = trimmed.chars().collect();
    if chars.len() <= max_chars {
        return vec![trimmed.to_string()];
    }

    let overlap = overlap_chars.min(max_chars - 1);
    let mut pieces = Vec::new();
    let mut start = 0usize;

    while start < chars.len() {
        let window_end = (start + max_chars).min(chars.len());

        let end = if window_end == chars.len() {
            window_end
        } else {
            // Break at the last whitespace in the window when there is one.
            match chars[start..window_end].iter().rposition(|c| c.is_whitespace()) {
                Some(pos) if pos > 0 => start + pos,
                _ => window_end,
            }
        };

        let piece: String = chars[start..end].iter().collect();
        let piece = piece.trim();
        if !piece.is_empty() {
            pieces.push(piece.to_string());
        }

        if end == chars.len() {
            break;
        }
        // Step back by the overlap, but never stall.
        start = end.saturating_sub(overlap).max(start + 1);
    }

    pieces
}
