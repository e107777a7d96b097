//! Two-phase validation of the common set against the keep and exclude
//! groups.
//!
//! Both phases fan files out over a fixed-size worker pool. Workers probe a
//! shared immutable snapshot of the candidates and collect removals in a
//! private list; nothing shared is mutated inside the parallel region.
//! Removals are applied only after every worker of the phase has finished,
//! so the common set shrinks monotonically and each phase is idempotent.

use std::path::PathBuf;

use indexmap::IndexMap;

use crate::libs::fastaline::FastaLineSource;
use crate::libs::fuzzy;

/// Phase 1: drop candidates that fail in any keep source.
///
/// `files` must not include the anchor or partner - those seeded the set.
pub fn keep_closure(
    common: &mut IndexMap<String, String>,
    files: &[PathBuf],
    accept: usize,
    workers: usize,
) -> anyhow::Result<()> {
    closure(common, files, accept, workers, false)
}

/// Phase 2: drop candidates that succeed in any exclude source.
pub fn exclude_closure(
    common: &mut IndexMap<String, String>,
    files: &[PathBuf],
    accept: usize,
    workers: usize,
) -> anyhow::Result<()> {
    closure(common, files, accept, workers, true)
}

fn closure(
    common: &mut IndexMap<String, String>,
    files: &[PathBuf],
    accept: usize,
    workers: usize,
    remove_on_found: bool,
) -> anyhow::Result<()> {
    if common.is_empty() || files.is_empty() {
        return Ok(());
    }

    let candidates: Vec<String> = common.keys().cloned().collect();

    // Channel 1 - files to scan
    let (snd1, rcv1) = crossbeam::channel::unbounded::<PathBuf>();
    // Channel 2 - per-file removal lists
    let (snd2, rcv2) = crossbeam::channel::unbounded::<anyhow::Result<Vec<String>>>();

    for file in files {
        snd1.send(file.clone()).unwrap();
    }
    // Close the channel - this is necessary to exit the for-loop in the worker
    drop(snd1);

    crossbeam::scope(|s| {
        for _ in 0..workers {
            // Send to sink, receive from source
            let (sendr, recvr) = (snd2.clone(), rcv1.clone());
            let candidates = &candidates;
            s.spawn(move |_| {
                // Receive until channel closes
                for file in recvr.iter() {
                    sendr
                        .send(scan_file(&file, candidates, accept, remove_on_found))
                        .unwrap();
                }
            });
        }
        drop(snd2);
    })
    .unwrap();

    // The scope has joined every worker; apply removals behind the barrier.
    // A failed worker fails the phase, but only after all of them finished.
    let mut removals = vec![];
    let mut first_err = None;
    for result in rcv2.iter() {
        match result {
            Ok(list) => removals.extend(list),
            Err(e) => {
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
    }
    if let Some(e) = first_err {
        return Err(e);
    }

    for text in removals {
        common.shift_remove(&text);
    }

    Ok(())
}

fn scan_file(
    file: &PathBuf,
    candidates: &[String],
    accept: usize,
    remove_on_found: bool,
) -> anyhow::Result<Vec<String>> {
    // the worker owns this handle; probes rewind it between candidates
    let mut source = FastaLineSource::open(file)?;
    let mut removals = vec![];

    for text in candidates {
        // budget always comes from the candidate's current length
        let max_errors = fuzzy::error_budget(text.len(), accept);
        let found = fuzzy::source_contains(&mut source, text, max_errors)?;
        if found == remove_on_found {
            removals.push(text.clone());
        }
    }

    Ok(removals)
}
