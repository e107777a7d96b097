use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn command_find_exact() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let targets = temp.path().join("targets");
    let out = temp.path().join("out");
    fs::create_dir(&targets)?;

    // multi-line reference, normalized before matching
    let refs = temp.path().join("refs.fa");
    fs::write(&refs, ">q1\nACGT\nACGT\n>q2\nTTTTTTTT\n")?;

    fs::write(targets.join("t1.fa"), ">t1\nGGACGTACGTGG\n")?;
    fs::write(targets.join("t2.fa"), ">t2\nCCCCCCCCCCCC\n")?;

    let mut cmd = Command::cargo_bin("ctg")?;
    cmd.arg("find")
        .arg(&refs)
        .arg(&targets)
        .arg("--outdir")
        .arg(&out)
        .arg("--parallel")
        .arg("2")
        .assert()
        .success();

    let t1 = fs::read_to_string(out.join("t1-result.fasta"))?;
    assert_eq!(t1, ">t1 -> q1\nACGTACGT\n");

    let t2 = fs::read_to_string(out.join("t2-result.fasta"))?;
    assert_eq!(t2, "");

    // results are committed under their final names only
    assert!(!out.join("t1-result.fasta.tmp").exists());
    assert!(!out.join("t2-result.fasta.tmp").exists());

    let summary = fs::read_to_string(out.join("output.txt"))?;
    assert!(summary.contains("t1-result.fasta\tq1"));
    assert!(summary.contains("t2-result.fasta"));

    Ok(())
}

#[test]
fn command_find_tolerant() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let targets = temp.path().join("targets");
    let out = temp.path().join("out");
    fs::create_dir(&targets)?;

    // the target differs from the length-10 reference in one symbol
    let refs = temp.path().join("refs.fa");
    fs::write(&refs, ">q1\nACGTACGTAC\n")?;
    fs::write(targets.join("t1.fa"), ">t1\nACGTACGTAA\n")?;

    // exact mode yields nothing
    let mut cmd = Command::cargo_bin("ctg")?;
    cmd.arg("find")
        .arg(&refs)
        .arg(&targets)
        .arg("--outdir")
        .arg(&out)
        .assert()
        .success();
    assert_eq!(fs::read_to_string(out.join("t1-result.fasta"))?, "");

    // accept 90 tolerates the single mismatch and reports 10%
    let mut cmd = Command::cargo_bin("ctg")?;
    cmd.arg("find")
        .arg(&refs)
        .arg(&targets)
        .arg("--accept")
        .arg("90")
        .arg("--outdir")
        .arg(&out)
        .assert()
        .success();

    let t1 = fs::read_to_string(out.join("t1-result.fasta"))?;
    assert_eq!(t1, ">t1 -> q1 -> 10%\nACGTACGTAC\n");

    Ok(())
}

#[test]
fn command_find_gz_input() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let targets = temp.path().join("targets");
    let out = temp.path().join("out");
    fs::create_dir(&targets)?;

    let refs = temp.path().join("refs.fa");
    fs::write(&refs, ">q1\nACGT\n")?;

    // gzipped target
    {
        use flate2::write::GzEncoder;
        use std::io::Write;
        let file = fs::File::create(targets.join("t1.fa.gz"))?;
        let mut encoder = GzEncoder::new(file, flate2::Compression::default());
        writeln!(encoder, ">t1\nTTACGTTT")?;
        encoder.finish()?;
    }

    let mut cmd = Command::cargo_bin("ctg")?;
    cmd.arg("find")
        .arg(&refs)
        .arg(&targets)
        .arg("--outdir")
        .arg(&out)
        .assert()
        .success();

    let t1 = fs::read_to_string(out.join("t1-result.fasta"))?;
    assert_eq!(t1, ">t1 -> q1\nACGT\n");

    Ok(())
}

#[test]
fn command_find_config_errors() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let targets = temp.path().join("targets");
    fs::create_dir(&targets)?;

    // missing reference file
    let mut cmd = Command::cargo_bin("ctg")?;
    cmd.arg("find")
        .arg(temp.path().join("nope.fa"))
        .arg(&targets)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a FASTA file"));

    // target path is not a directory
    let refs = temp.path().join("refs.fa");
    fs::write(&refs, ">q1\nACGT\n")?;
    let mut cmd = Command::cargo_bin("ctg")?;
    cmd.arg("find")
        .arg(&refs)
        .arg(temp.path().join("nope"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a directory"));

    Ok(())
}
