use std::path::Path;

use anyhow::bail;
use clap::*;
use std::io::Write;

use ctg::libs::alphabet::SeqType;
use ctg::libs::codon::CodonCounts;
use ctg::libs::fastaline::{self, FastaLineSource};

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("codon")
        .about("Codon usage tables for a directory of sequence files")
        .after_help(
            r###"
Counts codons record by record, stepping three symbols at a time. Codons
outside the 64-entry table (and a trailing partial codon) are reported and
not counted.

Outputs, under --outdir:
* `<file>.txt` per input file: name, codon, count, percentage per record
* `total_output.txt`: aggregate counts over the whole run

Examples:
1. Codon usage for every FASTA file of a directory:
   ctg codon genomes/ --outdir out

"###,
        )
        .arg(
            Arg::new("dir")
                .required(true)
                .num_args(1)
                .index(1)
                .help("Directory of FASTA files"),
        )
        .arg(
            Arg::new("outdir")
                .long("outdir")
                .short('o')
                .num_args(1)
                .default_value(".")
                .help("Output directory"),
        )
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let dir = Path::new(args.get_one::<String>("dir").unwrap());
    let outdir = Path::new(args.get_one::<String>("outdir").unwrap());

    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }
    std::fs::create_dir_all(outdir)?;

    //----------------------------
    // Process
    //----------------------------
    let mut grand_total = CodonCounts::new();

    for file in fastaline::fasta_files_in(dir)? {
        let fastaline_path = fastaline::to_fasta_line(&file, SeqType::Nucl)?;
        let stem = fastaline_path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| anyhow::anyhow!("Invalid path {}", file.display()))?;

        let out_path = outdir.join(format!("{}.txt", stem));
        let mut writer = ctg::writer(&out_path.display().to_string())?;
        writer.write_fmt(format_args!("#name\tcodon\tcount\tpercentage\n"))?;

        let mut source = FastaLineSource::open(&fastaline_path)?;
        while let Some(seq) = source.next_record()? {
            let mut counts = CodonCounts::new();
            counts.count_record(&seq);
            grand_total.add(&counts);

            for (codon, count, pct) in counts.rows() {
                writer.write_fmt(format_args!(
                    "{}\t{}\t{}\t{:.2}%\n",
                    seq.name, codon, count, pct
                ))?;
            }
        }
    }

    //----------------------------
    // Output total
    //----------------------------
    let total_path = outdir.join("total_output.txt");
    let mut writer = ctg::writer(&total_path.display().to_string())?;
    writer.write_fmt(format_args!("#codon\tcount\tpercentage\n"))?;
    for (codon, count, pct) in grand_total.rows() {
        writer.write_fmt(format_args!("{}\t{}\t{:.2}%\n", codon, count, pct))?;
    }

    Ok(())
}
