//! Classifies which records of a target file contain each reference
//! sequence, exactly or within tolerance.
//!
//! The classifier is a lazy iterator of match records and performs no file
//! I/O of its own; the `find` command consumes it and writes result files.

use std::path::Path;

use crate::libs::fastaline::{FastaLineSource, Sequence};
use crate::libs::fuzzy;

/// One match of a reference inside a target file. Immutable once emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    /// Name of the target record the reference was found in.
    pub target: String,
    /// Name of the reference sequence.
    pub query: String,
    /// The matched text (the reference's residues).
    pub text: String,
    /// Mismatch percentage; `None` in exact mode.
    pub error_pct: Option<f64>,
}

/// Lazy sequence of [`MatchRecord`]s for one target source.
///
/// References are probed in order; each yields at most one record - the
/// first qualifying record and offset in scan order, not the lowest-error
/// one. Restartable via [`Classifier::restart`].
pub struct Classifier<'a> {
    source: FastaLineSource,
    refs: &'a [Sequence],
    accept: usize,
    next_ref: usize,
}

impl<'a> Classifier<'a> {
    pub fn open<P: AsRef<Path>>(
        target: P,
        refs: &'a [Sequence],
        accept: usize,
    ) -> anyhow::Result<Self> {
        Ok(Classifier {
            source: FastaLineSource::open(target)?,
            refs,
            accept,
            next_ref: 0,
        })
    }

    /// Rewinds to the first reference so the sequence can be replayed.
    pub fn restart(&mut self) -> anyhow::Result<()> {
        self.next_ref = 0;
        self.source.rewind()
    }

    /// First qualifying target record for one reference, in scan order.
    fn classify_one(&mut self, query: &Sequence) -> anyhow::Result<Option<MatchRecord>> {
        let text = query.text.as_bytes();
        // exact mode (accept = 100) degenerates to a zero budget
        let max_errors = fuzzy::error_budget(text.len(), self.accept);

        let mut hit = None;
        while let Some(record) = self.source.next_record()? {
            if let Some(mismatches) = fuzzy::record_contains(record.text.as_bytes(), text, max_errors)
            {
                let error_pct = if self.accept == 100 {
                    None
                } else {
                    Some(mismatches as f64 / text.len() as f64 * 100.0)
                };
                hit = Some(MatchRecord {
                    target: record.name,
                    query: query.name.clone(),
                    text: query.text.clone(),
                    error_pct,
                });
                break;
            }
        }
        self.source.rewind()?;

        Ok(hit)
    }
}

impl Iterator for Classifier<'_> {
    type Item = anyhow::Result<MatchRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let refs = self.refs;
        while self.next_ref < refs.len() {
            let query = &refs[self.next_ref];
            self.next_ref += 1;

            if query.text.is_empty() {
                eprintln!("Reference {} is empty; skipped", query.name);
                continue;
            }

            match self.classify_one(query) {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }

        None
    }
}
