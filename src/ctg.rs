extern crate clap;
use clap::*;

mod cmd_ctg;

fn main() -> anyhow::Result<()> {
    let app = Command::new("ctg")
        .version(crate_version!())
        .author(crate_authors!())
        .about("`ctg` - approximate contig matching across FASTA file collections")
        .propagate_version(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .subcommand(cmd_ctg::common::make_subcommand())
        .subcommand(cmd_ctg::find::make_subcommand())
        .subcommand(cmd_ctg::codon::make_subcommand())
        .after_help(
            r###"Subcommands:

* common - Substrings shared by every file of one group and absent from another
* find   - Which target files contain each reference contig, exactly or approximately
* codon  - Codon usage tables for a directory of sequence files

Input files are FASTA (optionally gzipped). Each command first normalizes its
inputs to `.fastaline` files: one header line, then the whole residue string
on a single line.

"###,
        );

    // Check which subcomamnd the user ran...
    match app.get_matches().subcommand() {
        Some(("common", sub_matches)) => cmd_ctg::common::execute(sub_matches),
        Some(("find", sub_matches)) => cmd_ctg::find::execute(sub_matches),
        Some(("codon", sub_matches)) => cmd_ctg::codon::execute(sub_matches),
        _ => unreachable!(),
    }?;

    Ok(())
}
