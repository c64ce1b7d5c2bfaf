use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

const ELLIPSIS: char = '\u{2026}';

/// Width of `s` in terminal cells
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Cut `s` to at most `max_cells` cells, ending in `…` when anything was cut.
/// Never splits a grapheme cluster.
pub fn truncate_to_width(s: &str, max_cells: usize) -> String {
    if display_width(s) <= max_cells {
        return s.to_string();
    }
    if max_cells == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for g in s.graphemes(true) {
        let w = display_width(g);
        if used + w + 1 > max_cells {
            break;
        }
        used += w;
        out.push_str(g);
    }
    out.push(ELLIPSIS);
    out
}

/// Right-pad `s` with spaces to `cells` wide (no-op when already wider)
pub fn pad_to_width(s: &str, cells: usize) -> String {
    let w = display_width(s);
    let mut out = s.to_string();
    if w < cells {
        out.extend(std::iter::repeat_n(' ', cells - w));
    }
    out
}

/// Byte offset of the grapheme after the one at `at`, if any
pub fn next_grapheme_boundary(s: &str, at: usize) -> Option<usize> {
    s.get(at..)?
        .graphemes(true)
        .next()
        .map(|g| at + g.len())
}

/// Byte offset of the grapheme ending at `at`, if any
pub fn prev_grapheme_boundary(s: &str, at: usize) -> Option<usize> {
    s.get(..at)?
        .graphemes(true)
        .next_back()
        .map(|g| at - g.len())
}

/// Start of the word before `at`, skipping whitespace first
pub fn word_start_before(s: &str, at: usize) -> usize {
    let Some(head) = s.get(..at) else {
        return 0;
    };
    let trimmed = head.trim_end();
    match trimmed.rfind(char::is_whitespace) {
        Some(i) => i + trimmed[i..].chars().next().map_or(1, char::len_utf8),
        None => 0,
    }
}

/// Start of the next word after `at`
pub fn word_start_after(s: &str, at: usize) -> usize {
    let Some(tail) = s.get(at..) else {
        return s.len();
    };
    let word_end = tail.find(char::is_whitespace).unwrap_or(tail.len());
    let rest = &tail[word_end..];
    let gap = rest.len() - rest.trim_start().len();
    at + word_end + gap
}
