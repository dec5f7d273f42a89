/// Splits `content` into the sections that follow each occurrence of
/// `marker` at the start of a line.
///
/// Occurrences in the middle of a line are part of the surrounding section.
/// Text before the first line-start marker is dropped, and the marker itself
/// is not included in the returned sections.
#[must_use]
pub fn split_at_line_markers<'a>(content: &'a str, marker: &str) -> Vec<&'a str> {
    let starts: Vec<usize> = content
        .match_indices(marker)
        .map(|(idx, _)| idx)
        .filter(|&idx| is_line_start(content, idx))
        .collect();

    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(content.len());
            &content[start + marker.len()..end]
        })
        .collect()
}

/// Returns true if `offset` is at the beginning of `content` or directly
/// after a newline.
#[must_use]
pub fn is_line_start(content: &str, offset: usize) -> bool {
    offset == 0 || content[..offset].ends_with('\n')
}
