use std::path::{Path, PathBuf};

use anyhow::bail;
use clap::*;
use itertools::Itertools;
use std::io::Write;

use ctg::libs::alphabet::SeqType;
use ctg::libs::classify::Classifier;
use ctg::libs::fastaline;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("find")
        .about("Which target files contain each reference contig, exactly or approximately")
        .after_help(
            r###"
Each reference sequence is searched in every FASTA file of the target
directory. A reference matches a target record at the first offset whose
mismatch percentage stays within `100 - accept`; with `--accept 100` the
reference must occur verbatim.

Outputs, under --outdir:
* `<target>-result.fasta` per target file, one block per match:
      >targetName -> queryName[ -> errorPercentage%]
      matchedText
* `output.txt`, one line per result file listing the matched query names

Notes:
* Targets are evaluated independently; a reference may match several files
* The first qualifying record and offset wins, not the lowest-error one
* Target files fan out over `--parallel` workers

Examples:
1. Exact classification:
   ctg find refs.fa targets/ --outdir out

2. Tolerate 10% mismatches, 4 workers:
   ctg find refs.fa targets/ --accept 90 --parallel 4 --outdir out

"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .num_args(1)
                .index(1)
                .help("Reference FASTA file"),
        )
        .arg(
            Arg::new("dir")
                .required(true)
                .num_args(1)
                .index(2)
                .help("Directory of target FASTA files"),
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
    let infile = Path::new(args.get_one::<String>("infile").unwrap());
    let target_dir = Path::new(args.get_one::<String>("dir").unwrap());
    let outdir = Path::new(args.get_one::<String>("outdir").unwrap());
    let seq_type = SeqType::parse(args.get_one::<String>("type").unwrap())?;
    let opt_accept = *args.get_one::<usize>("accept").unwrap();
    let opt_parallel = *args.get_one::<usize>("parallel").unwrap();

    if !infile.is_file() || !fastaline::is_fasta_file(infile) {
        bail!("{} is not a FASTA file", infile.display());
    }
    if !target_dir.is_dir() {
        bail!("{} is not a directory", target_dir.display());
    }
    if opt_accept > 100 {
        bail!("--accept must be within [0, 100], got {}", opt_accept);
    }
    if opt_parallel == 0 {
        bail!("--parallel must be at least 1");
    }
    std::fs::create_dir_all(outdir)?;

    //----------------------------
    // Normalize inputs
    //----------------------------
    eprintln!("Convert reference and target files to fastaline");
    let ref_path = fastaline::to_fasta_line(infile, seq_type)?;
    let refs = fastaline::read_all(&ref_path)?;

    let mut targets = vec![];
    for file in fastaline::fasta_files_in(target_dir)? {
        targets.push(fastaline::to_fasta_line(&file, seq_type)?);
    }
    targets.sort();
    eprintln!("References: {}, target files: {}", refs.len(), targets.len());

    //----------------------------
    // Classify targets in parallel
    //----------------------------
    // Channel 1 - target files
    let (snd1, rcv1) = crossbeam::channel::unbounded::<PathBuf>();
    // Channel 2 - per-target summaries
    let (snd2, rcv2) =
        crossbeam::channel::unbounded::<anyhow::Result<(String, Vec<String>)>>();

    for target in &targets {
        snd1.send(target.clone()).unwrap();
    }
    // Close the channel - this is necessary to exit the for-loop in the worker
    drop(snd1);

    let refs = &refs;
    crossbeam::scope(|s| {
        for _ in 0..opt_parallel {
            let (sendr, recvr) = (snd2.clone(), rcv1.clone());
            s.spawn(move |_| {
                for target in recvr.iter() {
                    sendr
                        .send(classify_target(&target, outdir, refs, opt_accept))
                        .unwrap();
                }
            });
        }
        drop(snd2);
    })
    .unwrap();

    //----------------------------
    // Summary, after all workers joined
    //----------------------------
    let mut summaries = vec![];
    let mut first_err = None;
    for result in rcv2.iter() {
        match result {
            Ok(summary) => summaries.push(summary),
            Err(e) => {
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
    }
    if let Some(e) = first_err {
        // discard the uncommitted temp files; no partial output survives
        if let Ok(entries) = std::fs::read_dir(outdir) {
            for path in entries.flatten().map(|entry| entry.path()) {
                if path.extension() == Some(std::ffi::OsStr::new("tmp")) {
                    let _ = std::fs::remove_file(&path);
                }
            }
        }
        return Err(e);
    }

    // commit result files under their final names, after every worker succeeded
    for (filename, _) in &summaries {
        std::fs::rename(
            outdir.join(format!("{}.tmp", filename)),
            outdir.join(filename),
        )?;
    }

    // worker completion order is not deterministic
    summaries.sort();

    let summary_path = outdir.join("output.txt");
    let mut writer = ctg::writer(&summary_path.display().to_string())?;
    writer.write_fmt(format_args!("#filename\tqueries\n"))?;
    for (filename, queries) in &summaries {
        writer.write_fmt(format_args!(
            "{}\t{}\n",
            filename,
            queries.iter().join("\t")
        ))?;
    }

    Ok(())
}

/// Classifies one target file and writes its `-result.fasta` under a `.tmp`
/// name; the caller renames it after the join so a failed run commits
/// nothing. Returns the result filename and the matched query names for the
/// summary.
fn classify_target(
    target: &Path,
    outdir: &Path,
    refs: &[fastaline::Sequence],
    accept: usize,
) -> anyhow::Result<(String, Vec<String>)> {
    let stem = target
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid target path {}", target.display()))?;
    let result_name = format!("{}-result.fasta", stem);

    let classifier = Classifier::open(target, refs, accept)?;

    let tmp_path = outdir.join(format!("{}.tmp", result_name));
    let mut writer = std::io::BufWriter::new(std::fs::File::create(&tmp_path)?);
    let mut queries = vec![];
    for result in classifier {
        let record = result?;
        match record.error_pct {
            Some(pct) => writer.write_fmt(format_args!(
                ">{} -> {} -> {}%\n{}\n",
                record.target, record.query, pct, record.text
            ))?,
            None => writer.write_fmt(format_args!(
                ">{} -> {}\n{}\n",
                record.target, record.query, record.text
            ))?,
        }
        queries.push(record.query);
    }
    writer.flush()?;

    Ok((result_name, queries))
}
