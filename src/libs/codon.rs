//! Codon usage counting over fastaline records.

use crate::libs::alphabet::{self, CODONS};
use crate::libs::fastaline::Sequence;

/// Counts per codon, indexed like [`CODONS`].
#[derive(Debug, Clone)]
pub struct CodonCounts {
    counts: [usize; 64],
    total: usize,
}

// not derivable: [usize; 64] has no Default impl
impl Default for CodonCounts {
    fn default() -> Self {
        Self::new()
    }
}

impl CodonCounts {
    pub fn new() -> Self {
        CodonCounts {
            counts: [0; 64],
            total: 0,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Steps the residue string three symbols at a time. Unknown codons,
    /// including a trailing partial one, are reported and not counted.
    pub fn count_record(&mut self, seq: &Sequence) {
        let text = seq.text.as_bytes();
        for chunk in text.chunks(3) {
            let codon = std::str::from_utf8(chunk).unwrap_or("");
            match alphabet::codon_index(codon) {
                Some(idx) => {
                    self.counts[idx] += 1;
                    self.total += 1;
                }
                None => {
                    eprintln!("Contig : {}, codon : {} unknown", seq.name, codon);
                }
            }
        }
    }

    pub fn add(&mut self, other: &CodonCounts) {
        for (idx, &count) in other.counts.iter().enumerate() {
            self.counts[idx] += count;
        }
        self.total += other.total;
    }

    /// Non-zero `(codon, count, percentage)` rows in sorted codon order.
    pub fn rows(&self) -> Vec<(&'static str, usize, f64)> {
        CODONS
            .iter()
            .zip(self.counts.iter())
            .filter(|(_, &count)| count > 0)
            .map(|(&codon, &count)| (codon, count, count as f64 / self.total as f64 * 100.0))
            .collect()
    }
}
