use std::path::{Path, PathBuf};

use anyhow::bail;
use clap::*;
use std::io::Write;

use ctg::libs::alphabet::SeqType;
use ctg::libs::{common, fastaline, validate};

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("common")
        .about("Substrings shared by every keep file and absent from every exclude file")
        .after_help(
            r###"
For every sequence of the first keep file, the longest prefix that occurs
(within the error budget) in the second keep file becomes a candidate. The
candidate set is then validated in two phases:

1. keep closure    - a candidate missing from any remaining keep file is dropped
2. exclude closure - a candidate present in any exclude file is dropped

Notes:
* The keep directory needs at least two FASTA files
* `--accept 90` tolerates floor(len * 10 / 100) mismatched symbols per probe;
  the budget is recomputed from each candidate's own length
* FASTA inputs (plain or .gz) are first normalized to `.fastaline` files
  placed next to them
* Work is partitioned over `--parallel` workers; each worker owns its own
  file handles

Examples:
1. Substrings common to dir_a and absent from dir_b:
   ctg common --keep dir_a --exclude dir_b

2. Tolerate 10% mismatches, 4 workers:
   ctg common --keep dir_a --exclude dir_b --accept 90 --parallel 4

"###,
        )
        .arg(
            Arg::new("keep")
                .long("keep")
                .num_args(1)
                .required(true)
                .help("Directory of files every candidate must occur in"),
        )
        .arg(
            Arg::new("exclude")
                .long("exclude")
                .num_args(1)
                .required(true)
                .help("Directory of files no candidate may occur in"),
        )
        .arg(
            Arg::new("type")
                .long("type")
                .value_parser(["nucl", "prot"])
                .default_value("nucl")
                .help("Residue type of the input files"),
        )
        .arg(
            Arg::new("accept")
                .long("accept")
                .value_parser(value_parser!(usize))
                .num_args(1)
                .default_value("100")
                .help("Minimum identity percentage for accepting an occurrence"),
        )
        .arg(
            Arg::new("parallel")
                .long("parallel")
                .short('p')
                .value_parser(value_parser!(usize))
                .num_args(1)
                .default_value("1")
                .help("Number of worker threads"),
        )
        .arg(
            Arg::new("outfile")
                .long("outfile")
                .short('o')
                .num_args(1)
                .default_value("stdout")
                .help("Output filename. [stdout] for screen"),
        )
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let keep_dir = Path::new(args.get_one::<String>("keep").unwrap());
    let exclude_dir = Path::new(args.get_one::<String>("exclude").unwrap());
    let seq_type = SeqType::parse(args.get_one::<String>("type").unwrap())?;
    let opt_accept = *args.get_one::<usize>("accept").unwrap();
    let opt_parallel = *args.get_one::<usize>("parallel").unwrap();

    if !keep_dir.is_dir() {
        bail!("--keep {} is not a directory", keep_dir.display());
    }
    if !exclude_dir.is_dir() {
        bail!("--exclude {} is not a directory", exclude_dir.display());
    }
    if opt_accept > 100 {
        bail!("--accept must be within [0, 100], got {}", opt_accept);
    }
    if opt_parallel == 0 {
        bail!("--parallel must be at least 1");
    }

    //----------------------------
    // Normalize inputs
    //----------------------------
    eprintln!("Convert keep files to fastaline");
    let keep_files = normalize_dir(keep_dir, seq_type)?;
    eprintln!("Convert exclude files to fastaline");
    let exclude_files = normalize_dir(exclude_dir, seq_type)?;

    if keep_files.len() < 2 {
        bail!(
            "--keep {} needs at least 2 FASTA files, found {}",
            keep_dir.display(),
            keep_files.len()
        );
    }

    //----------------------------
    // Candidate generation
    //----------------------------
    let anchor_path = &keep_files[0];
    let partner_path = &keep_files[1];
    eprintln!(
        "Seed candidates from {} against {}",
        anchor_path.display(),
        partner_path.display()
    );

    let anchor = fastaline::read_all(anchor_path)?;
    let mut common_set =
        common::pair_candidates(&anchor, partner_path, opt_accept, opt_parallel)?;
    eprintln!("Candidates after seeding: {}", common_set.len());

    //----------------------------
    // Two-phase validation
    //----------------------------
    validate::keep_closure(&mut common_set, &keep_files[2..], opt_accept, opt_parallel)?;
    eprintln!("Candidates after keep closure: {}", common_set.len());

    validate::exclude_closure(&mut common_set, &exclude_files, opt_accept, opt_parallel)?;
    eprintln!("Candidates after exclude closure: {}", common_set.len());

    //----------------------------
    // Output
    //----------------------------
    let mut writer = ctg::writer(args.get_one::<String>("outfile").unwrap())?;
    writer.write_fmt(format_args!("#substring\torigin\n"))?;
    for (text, origin) in &common_set {
        writer.write_fmt(format_args!("{}\t{}\n", text, origin))?;
    }

    Ok(())
}

fn normalize_dir(dir: &Path, seq_type: SeqType) -> anyhow::Result<Vec<PathBuf>> {
    let mut fastalines = vec![];
    for file in fastaline::fasta_files_in(dir)? {
        fastalines.push(fastaline::to_fasta_line(&file, seq_type)?);
    }
    fastalines.sort();
    Ok(fastalines)
}
