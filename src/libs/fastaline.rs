//! Normalized sequence files and the rewindable source over them.
//!
//! A `.fastaline` file holds one record per two physical lines: a `>` header
//! and the whole residue string on a single line. Matching always runs
//! against this form; [`to_fasta_line`] produces it from plain or gzipped
//! FASTA.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::libs::alphabet::{self, SeqType};

/// A named residue string. Immutable once read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    pub name: String,
    pub text: String,
}

const FASTA_EXTS: [&str; 5] = ["fa", "fasta", "fna", "faa", "ffn"];

fn plain_path(path: &Path) -> PathBuf {
    // Strip a trailing .gz so "x.fa.gz" classifies like "x.fa"
    if path.extension() == Some(std::ffi::OsStr::new("gz")) {
        path.with_extension("")
    } else {
        path.to_path_buf()
    }
}

pub fn is_fasta_file<P: AsRef<Path>>(path: P) -> bool {
    let plain = plain_path(path.as_ref());
    match plain.extension().and_then(|e| e.to_str()) {
        Some(ext) => FASTA_EXTS.contains(&ext.to_ascii_lowercase().as_str()),
        None => false,
    }
}

pub fn is_fastaline_file<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref().extension() == Some(std::ffi::OsStr::new("fastaline"))
}

/// Output files carry a `-result` stem suffix so they are never picked up
/// as inputs on a second run.
pub fn is_result_file<P: AsRef<Path>>(path: P) -> bool {
    match plain_path(path.as_ref()).file_stem().and_then(|s| s.to_str()) {
        Some(stem) => stem.ends_with("-result"),
        None => false,
    }
}

/// The `.fastaline` sibling of a FASTA path.
pub fn fastaline_path<P: AsRef<Path>>(path: P) -> PathBuf {
    plain_path(path.as_ref()).with_extension("fastaline")
}

/// Normalizes a FASTA file into its `.fastaline` sibling and returns that
/// path. Out-of-alphabet symbols are reported per record but kept.
pub fn to_fasta_line<P: AsRef<Path>>(path: P, seq_type: SeqType) -> anyhow::Result<PathBuf> {
    let path = path.as_ref();
    let reader = crate::reader(&path.display().to_string())?;
    let mut fa_in = noodles_fasta::io::Reader::new(reader);

    let out_path = fastaline_path(path);
    let file = File::create(&out_path)
        .with_context(|| format!("could not create {}", out_path.display()))?;
    let mut fa_out = noodles_fasta::io::writer::Builder::default()
        .set_line_base_count(usize::MAX)
        .build_from_writer(std::io::BufWriter::new(file));

    for result in fa_in.records() {
        let record = result?;
        let name = String::from_utf8(record.name().into())?;
        let seq = record
            .sequence()
            .get(..)
            .ok_or_else(|| anyhow::anyhow!("Invalid sequence in {}", path.display()))?;

        let unknown = alphabet::unknown_symbols(seq_type, seq);
        if !unknown.is_empty() {
            eprintln!(
                "Unknown symbol(s) {:?} in record {} of {}",
                unknown.iter().map(|&b| b as char).collect::<String>(),
                name,
                path.display()
            );
        }

        fa_out.write_record(&record)?;
    }

    Ok(out_path)
}

/// Sorted FASTA files of a directory, result files excluded.
pub fn fasta_files_in<P: AsRef<Path>>(dir: P) -> anyhow::Result<Vec<PathBuf>> {
    files_in(dir.as_ref(), |p| is_fasta_file(p) && !is_result_file(p))
}

/// Sorted `.fastaline` files of a directory, result files excluded.
pub fn fastaline_files_in<P: AsRef<Path>>(dir: P) -> anyhow::Result<Vec<PathBuf>> {
    files_in(dir.as_ref(), |p| is_fastaline_file(p) && !is_result_file(p))
}

fn files_in(dir: &Path, keep: impl Fn(&Path) -> bool) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths = vec![];
    for entry in
        std::fs::read_dir(dir).with_context(|| format!("could not read {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() && keep(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// A rewindable handle over one `.fastaline` file.
///
/// Every worker opens its own source; handles are never shared, so probing
/// and rewinding need no coordination.
pub struct FastaLineSource {
    path: PathBuf,
    reader: BufReader<File>,
    pushed_back: Option<String>,
}

impl FastaLineSource {
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file =
            File::open(&path).with_context(|| format!("could not open {}", path.display()))?;
        Ok(FastaLineSource {
            path,
            reader: BufReader::new(file),
            pushed_back: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rewind(&mut self) -> anyhow::Result<()> {
        self.pushed_back = None;
        self.reader.seek(SeekFrom::Start(0))?;
        Ok(())
    }

    fn read_line(&mut self) -> anyhow::Result<Option<String>> {
        if let Some(line) = self.pushed_back.take() {
            return Ok(Some(line));
        }
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
    }

    fn push_back(&mut self, line: String) {
        self.pushed_back = Some(line);
    }

    /// Next well-formed record, or `None` at end of file. Lines violating
    /// the two-line contract are reported and skipped.
    pub fn next_record(&mut self) -> anyhow::Result<Option<Sequence>> {
        loop {
            let header = match self.read_line()? {
                Some(line) => line,
                None => return Ok(None),
            };
            if header.is_empty() {
                continue;
            }
            if !header.starts_with('>') {
                eprintln!(
                    "Malformed record in {}: expected header, got {:?}; skipped",
                    self.path.display(),
                    header
                );
                continue;
            }

            let text = match self.read_line()? {
                Some(line) => line,
                None => {
                    eprintln!(
                        "Malformed record in {}: header {:?} without residues; skipped",
                        self.path.display(),
                        header
                    );
                    return Ok(None);
                }
            };
            if text.starts_with('>') {
                eprintln!(
                    "Malformed record in {}: header {:?} without residues; skipped",
                    self.path.display(),
                    header
                );
                self.push_back(text);
                continue;
            }

            return Ok(Some(Sequence {
                name: header[1..].to_string(),
                text,
            }));
        }
    }
}

/// All records of a `.fastaline` file, in file order.
pub fn read_all<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Sequence>> {
    let mut source = FastaLineSource::open(path)?;
    let mut seqs = vec![];
    while let Some(seq) = source.next_record()? {
        seqs.push(seq);
    }
    Ok(seqs)
}
