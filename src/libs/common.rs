//! Candidate generation for one anchor/partner pair, and the merge that
//! turns per-worker partial results into the shared common set.
//!
//! For every anchor sequence the prefix lengths `len .. 1` are tried in
//! decreasing order against the partner; the longest acceptable prefix is
//! that sequence's candidate. Only prefixes are tried - a greedy prefix
//! shrink, not a full longest-common-substring search.

use std::path::Path;

use indexmap::IndexMap;
use rayon::prelude::*;

use crate::libs::fastaline::{FastaLineSource, Sequence};
use crate::libs::fuzzy;

/// One successful probe produced inside a generation worker.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub seq_index: usize,
    pub length: usize,
    pub text: String,
    pub origin: String,
}

/// Candidate substrings of `anchor` found in the partner file, as a map
/// from substring text to origin sequence name.
///
/// Prefix lengths are sharded by `length % workers` across a fixed-size
/// pool; every worker opens its own partner handle and walks its shard in
/// decreasing order, stopping at its first success per sequence. The merge
/// after the pool joins is single-threaded.
pub fn pair_candidates(
    anchor: &[Sequence],
    partner: &Path,
    accept: usize,
    workers: usize,
) -> anyhow::Result<IndexMap<String, String>> {
    let pool = rayon::ThreadPoolBuilder::new().num_threads(workers).build()?;

    let partials: Vec<anyhow::Result<Vec<Candidate>>> = pool.install(|| {
        (0..workers)
            .into_par_iter()
            .map(|shard| shard_candidates(anchor, partner, accept, workers, shard))
            .collect()
    });

    let partials = partials.into_iter().collect::<anyhow::Result<Vec<_>>>()?;

    Ok(merge_partials(partials, anchor.len()))
}

fn shard_candidates(
    anchor: &[Sequence],
    partner: &Path,
    accept: usize,
    shards: usize,
    shard: usize,
) -> anyhow::Result<Vec<Candidate>> {
    let mut source = FastaLineSource::open(partner)?;
    let mut found = vec![];

    for (seq_index, seq) in anchor.iter().enumerate() {
        for length in (1..=seq.text.len()).rev() {
            if length % shards != shard {
                continue;
            }
            let prefix = &seq.text[..length];
            let max_errors = fuzzy::error_budget(length, accept);
            if fuzzy::source_contains(&mut source, prefix, max_errors)? {
                found.push(Candidate {
                    seq_index,
                    length,
                    text: prefix.to_string(),
                    origin: seq.name.clone(),
                });
                break;
            }
        }
    }

    Ok(found)
}

/// Merges per-worker partial results into one common set.
///
/// Per anchor sequence the longest successful length wins, which equals the
/// answer of a sequential decreasing-length walk. Candidates then fold into
/// the map in sequence order under first-writer-wins: an existing key's
/// origin is never overwritten by a later write.
pub fn merge_partials(partials: Vec<Vec<Candidate>>, n_seqs: usize) -> IndexMap<String, String> {
    let mut best: Vec<Option<Candidate>> = vec![None; n_seqs];
    for partial in partials {
        for cand in partial {
            let slot = &mut best[cand.seq_index];
            if slot.as_ref().map_or(true, |held| cand.length > held.length) {
                *slot = Some(cand);
            }
        }
    }

    let mut common = IndexMap::new();
    for cand in best.into_iter().flatten() {
        common.entry(cand.text).or_insert(cand.origin);
    }

    common
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(seq_index: usize, text: &str, origin: &str) -> Candidate {
        Candidate {
            seq_index,
            length: text.len(),
            text: text.to_string(),
            origin: origin.to_string(),
        }
    }

    #[test]
    fn test_merge_longest_per_sequence() {
        // two shards found different lengths for the same sequence
        let partials = vec![vec![cand(0, "ACGTA", "seq1")], vec![cand(0, "ACG", "seq1")]];
        let common = merge_partials(partials, 1);
        assert_eq!(common.len(), 1);
        assert_eq!(common.get("ACGTA"), Some(&"seq1".to_string()));
    }

    #[test]
    fn test_merge_first_writer_wins() {
        // seq1 and seq2 shrink to the same text; seq1 merges first and keeps
        // the key
        let partials = vec![vec![cand(1, "ACGT", "seq2")], vec![cand(0, "ACGT", "seq1")]];
        let common = merge_partials(partials, 2);
        assert_eq!(common.len(), 1);
        assert_eq!(common.get("ACGT"), Some(&"seq1".to_string()));
    }

    #[test]
    fn test_pair_candidates_verbatim() -> anyhow::Result<()> {
        // anchor "ACGTACGT" (len 8), partner holds it verbatim; accept 90
        // gives budget floor(8 * 10 / 100) = 0 and the full prefix matches
        let dir = tempfile::tempdir()?;
        let partner = dir.path().join("p.fastaline");
        std::fs::write(&partner, ">p1\nTTACGTACGTTT\n")?;

        let anchor = vec![Sequence {
            name: "seq1".to_string(),
            text: "ACGTACGT".to_string(),
        }];

        for workers in [1, 3] {
            let common = pair_candidates(&anchor, &partner, 90, workers)?;
            assert_eq!(common.len(), 1);
            assert_eq!(common.get("ACGTACGT"), Some(&"seq1".to_string()));
        }

        Ok(())
    }

    #[test]
    fn test_pair_candidates_shrinks() -> anyhow::Result<()> {
        // only the 4-symbol prefix of seq1 occurs in the partner
        let dir = tempfile::tempdir()?;
        let partner = dir.path().join("p.fastaline");
        std::fs::write(&partner, ">p1\nGGACGTGG\n")?;

        let anchor = vec![Sequence {
            name: "seq1".to_string(),
            text: "ACGTTTTTTTTT".to_string(),
        }];

        let common = pair_candidates(&anchor, &partner, 100, 2)?;
        assert_eq!(common.len(), 1);
        assert_eq!(common.get("ACGT"), Some(&"seq1".to_string()));

        Ok(())
    }

    #[test]
    fn test_pair_candidates_no_match() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let partner = dir.path().join("p.fastaline");
        std::fs::write(&partner, ">p1\nGGGG\n")?;

        let anchor = vec![Sequence {
            name: "seq1".to_string(),
            text: "ACTA".to_string(),
        }];

        let common = pair_candidates(&anchor, &partner, 100, 1)?;
        assert!(common.is_empty());

        Ok(())
    }
}
