//! Symbol alphabets and the static codon table.
//!
//! Tables are `const` and sorted, so iteration order is deterministic and
//! lookups are binary searches.

/// Nucleic residues.
pub const NUCLEIC: &[u8] = b"ACGT";

/// The 20 standard amino-acid letters, sorted.
pub const PROTEIN: &[u8] = b"ACDEFGHIKLMNPQRSTVWY";

/// All 64 codons in lexicographic order.
pub const CODONS: [&str; 64] = [
    "AAA", "AAC", "AAG", "AAT", "ACA", "ACC", "ACG", "ACT", //
    "AGA", "AGC", "AGG", "AGT", "ATA", "ATC", "ATG", "ATT", //
    "CAA", "CAC", "CAG", "CAT", "CCA", "CCC", "CCG", "CCT", //
    "CGA", "CGC", "CGG", "CGT", "CTA", "CTC", "CTG", "CTT", //
    "GAA", "GAC", "GAG", "GAT", "GCA", "GCC", "GCG", "GCT", //
    "GGA", "GGC", "GGG", "GGT", "GTA", "GTC", "GTG", "GTT", //
    "TAA", "TAC", "TAG", "TAT", "TCA", "TCC", "TCG", "TCT", //
    "TGA", "TGC", "TGG", "TGT", "TTA", "TTC", "TTG", "TTT", //
];

/// Kind of residues a file holds, from the `--type` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqType {
    Nucl,
    Prot,
}

impl SeqType {
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s {
            "nucl" => Ok(SeqType::Nucl),
            "prot" => Ok(SeqType::Prot),
            _ => Err(anyhow::anyhow!("Invalid sequence type: {}", s)),
        }
    }

    pub fn symbols(&self) -> &'static [u8] {
        match self {
            SeqType::Nucl => NUCLEIC,
            SeqType::Prot => PROTEIN,
        }
    }

    pub fn is_valid(&self, symbol: u8) -> bool {
        self.symbols().binary_search(&symbol.to_ascii_uppercase()).is_ok()
    }
}

/// Distinct out-of-alphabet symbols in `text`, in first-seen order.
pub fn unknown_symbols(seq_type: SeqType, text: &[u8]) -> Vec<u8> {
    let mut seen = Vec::new();
    for &b in text {
        if !seq_type.is_valid(b) && !seen.contains(&b) {
            seen.push(b);
        }
    }
    seen
}

/// Index of `codon` in [`CODONS`], or `None` for anything unknown.
pub fn codon_index(codon: &str) -> Option<usize> {
    CODONS.binary_search(&codon).ok()
}
