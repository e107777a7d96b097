//! The fuzzy-match primitive.
//!
//! A query matches a window when the number of mismatching symbols stays
//! within an error budget. Windows running past the end of a record's text
//! charge every remaining query symbol as a mismatch (the overhang rule)
//! instead of being disqualified. Scanning is first-acceptable: the first
//! offset of the first record that fits the budget wins, not the best one.

use crate::libs::fastaline::FastaLineSource;

/// Tolerated mismatches for a candidate of length `len` at `accept` percent.
///
/// Recomputed from the current length at every probe; monotonic
/// non-decreasing in `len` for a fixed `accept`. An `accept` above 100
/// clamps to a zero budget.
pub fn error_budget(len: usize, accept: usize) -> usize {
    len * 100usize.saturating_sub(accept) / 100
}

/// Mismatches of `query` against `text` starting at `offset`, or `None`
/// once the running count exceeds `max_errors`.
pub fn window_mismatches(
    text: &[u8],
    offset: usize,
    query: &[u8],
    max_errors: usize,
) -> Option<usize> {
    let mut errors = 0;
    for (j, &q) in query.iter().enumerate() {
        if offset + j >= text.len() {
            // overhang: everything left in the query is charged
            errors += query.len() - j;
            break;
        }
        if text[offset + j] != q {
            errors += 1;
        }
        if errors > max_errors {
            return None;
        }
    }

    if errors <= max_errors {
        Some(errors)
    } else {
        None
    }
}

/// Mismatch count at the first acceptable offset of `text`, in scan order.
pub fn record_contains(text: &[u8], query: &[u8], max_errors: usize) -> Option<usize> {
    (0..text.len()).find_map(|offset| window_mismatches(text, offset, query, max_errors))
}

/// Whether `query` occurs within `max_errors` anywhere in `source`.
///
/// Probes records in source order and stops at the first hit. The handle is
/// rewound before returning so the same source can be probed again.
pub fn source_contains(
    source: &mut FastaLineSource,
    query: &str,
    max_errors: usize,
) -> anyhow::Result<bool> {
    if query.is_empty() {
        anyhow::bail!("empty query for {}", source.path().display());
    }

    let mut found = false;
    while let Some(record) = source.next_record()? {
        if record_contains(record.text.as_bytes(), query.as_bytes(), max_errors).is_some() {
            found = true;
            break;
        }
    }
    source.rewind()?;

    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source_with(content: &str) -> (tempfile::TempDir, FastaLineSource) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.fastaline");
        std::fs::write(&path, content).unwrap();
        let source = FastaLineSource::open(&path).unwrap();
        (dir, source)
    }

    #[test]
    fn test_budget_monotonic() {
        for accept in [0, 50, 90, 100] {
            for len in 1..200 {
                assert!(error_budget(len, accept) >= error_budget(len - 1, accept));
            }
        }
        assert_eq!(error_budget(8, 90), 0);
        assert_eq!(error_budget(10, 90), 1);
        assert_eq!(error_budget(10, 100), 0);
        assert_eq!(error_budget(10, 0), 10);
    }

    #[test]
    fn test_budget_accept_above_range() {
        // out-of-range accept clamps instead of underflowing
        assert_eq!(error_budget(10, 101), 0);
        assert_eq!(error_budget(10, 1000), 0);
        assert_eq!(error_budget(0, 101), 0);
    }

    #[test]
    fn test_window_mismatches() {
        assert_eq!(window_mismatches(b"ACGT", 0, b"ACGT", 0), Some(0));
        assert_eq!(window_mismatches(b"ACGT", 0, b"ACTT", 0), None);
        assert_eq!(window_mismatches(b"ACGT", 0, b"ACTT", 1), Some(1));
        // overhang: record len 3, offset 1, query len 5 -> 2 compared + 3 charged
        assert_eq!(window_mismatches(b"ACG", 1, b"CGXXX", 3), Some(3));
        assert_eq!(window_mismatches(b"ACG", 1, b"CGXXX", 2), None);
        // overhang plus a compared mismatch
        assert_eq!(window_mismatches(b"ACG", 1, b"CTXXX", 4), Some(4));
    }

    #[test]
    fn test_record_contains_first_offset() {
        // both offsets 0 (1 error) and 4 (0 errors) qualify; offset 0 wins
        assert_eq!(record_contains(b"ACGTACGA", b"ACGA", 1), Some(1));
        assert_eq!(record_contains(b"ACGTACGA", b"ACGA", 0), Some(0));
        assert_eq!(record_contains(b"TTTT", b"ACGT", 0), None);
    }

    #[test]
    fn test_source_reflexivity() -> anyhow::Result<()> {
        let (_dir, mut source) = source_with(">s1\nTTACGTACGTTT\n");
        for max_errors in [0, 1, 5] {
            assert!(source_contains(&mut source, "ACGTACGT", max_errors)?);
        }
        Ok(())
    }

    #[test]
    fn test_source_rewound_between_probes() -> anyhow::Result<()> {
        let (_dir, mut source) = source_with(">s1\nAAAA\n>s2\nCCCC\n");
        // hit in the second record, then probe the first again
        assert!(source_contains(&mut source, "CCCC", 0)?);
        assert!(source_contains(&mut source, "AAAA", 0)?);
        assert!(!source_contains(&mut source, "GGGG", 0)?);
        assert!(source_contains(&mut source, "AAAA", 0)?);
        Ok(())
    }

    #[test]
    fn test_overhang_across_source() -> anyhow::Result<()> {
        // query longer than every record still matches when the charged
        // overhang stays within budget
        let (_dir, mut source) = source_with(">s1\nACG\n");
        assert!(source_contains(&mut source, "ACGTT", 2)?);
        assert!(!source_contains(&mut source, "ACGTT", 1)?);
        Ok(())
    }

    #[test]
    fn test_empty_query_rejected() {
        let (_dir, mut source) = source_with(">s1\nACGT\n");
        assert!(source_contains(&mut source, "", 0).is_err());
    }
}
