// ==============================================================================
// String Similarity Utilities
// ==============================================================================
//
// Edit-distance helpers behind the "did you mean?" hint on references to
// schemas that are missing from the catalog.

/// Compute the Levenshtein edit distance between two strings.
///
/// Uses the standard dynamic programming algorithm with a two-row buffer.
/// Schema names are short, so this is plenty.
pub(crate) fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev_row: Vec<usize> = (0..=b.len()).collect();
    let mut curr_row = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr_row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr_row[j + 1] = (prev_row[j] + cost) // substitution
                .min(prev_row[j + 1] + 1) // deletion
                .min(curr_row[j] + 1); // insertion
        }
        std::mem::swap(&mut prev_row, &mut curr_row);
    }
    prev_row[b.len()]
}

/// Maximum edit distance for a suggestion to be considered "close enough."
///
/// For short names (length <= 4), we require distance <= 1 to avoid noisy
/// suggestions. For longer names, we allow distance <= 2.
pub(crate) fn max_edit_distance(name_len: usize) -> usize {
    if name_len <= 4 { 1 } else { 2 }
}

/// Pick the candidate closest to `name`, if any is within the threshold.
/// Ties go to the earliest candidate.
pub(crate) fn closest<'a>(
    name: &str,
    candidates: impl IntoIterator<Item = &'a str>,
) -> Option<&'a str> {
    let mut best: Option<(&str, usize)> = None;
    for candidate in candidates {
        let dist = levenshtein(name, candidate);
        let threshold = max_edit_distance(name.chars().count().min(candidate.chars().count()));
        if dist <= threshold && best.is_none_or(|(_, d)| dist < d) {
            best = Some((candidate, dist));
        }
    }
    best.map(|(candidate, _)| candidate)
}
