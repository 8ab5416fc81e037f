/// One overlapping window of a source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextWindow {
    pub text: String,
    pub index: usize,
}

/// Splits `text` into windows of at most `size` characters, each starting
/// `overlap` characters before the previous one ended. Windows end on the last
/// paragraph, line, sentence or word break available.
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Vec<TextWindow> {
    let text = text.trim();
    if text.is_empty() || size == 0 {
        return Vec::new();
    }

    // Byte offset of every char, plus the end of the text.
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_count = bounds.len() - 1;

    if char_count <= size {
        return vec![TextWindow {
            text: text.to_string(),
            index: 0,
        }];
    }

    let mut windows = Vec::new();
    let mut start = 0;

    while start < char_count {
        let end = (start + size).min(char_count);
        let end_byte = if end < char_count {
            find_break_point(text, bounds[start], bounds[end])
        } else {
            bounds[end]
        };
        // Break points always fall after an ASCII separator, so this is exact.
        let actual_end = bounds.partition_point(|&b| b < end_byte);

        let piece = text[bounds[start]..end_byte].trim();
        if !piece.is_empty() {
            windows.push(TextWindow {
                text: piece.to_string(),
                index: windows.len(),
            });
        }

        if actual_end >= char_count {
            break;
        }

        let next_start = actual_end.saturating_sub(overlap);
        start = if next_start <= start { actual_end } else { next_start };
    }

    windows
}

fn find_break_point(text: &str, start: usize, max_end: usize) -> usize {
    let segment = &text[start..max_end];

    if let Some(pos) = segment.rfind("\n\n") {
        if pos > 0 {
            return start + pos + 2;
        }
    }
    if let Some(pos) = segment.rfind('\n') {
        if pos > 0 {
            return start + pos + 1;
        }
    }
    for sentinel in [". ", "? ", "! "] {
        if let Some(pos) = segment.rfind(sentinel) {
            return start + pos + sentinel.len();
        }
    }
    if let Some(pos) = segment.rfind(' ') {
        if pos > 0 {
            return start + pos + 1;
        }
    }
    max_end
}
