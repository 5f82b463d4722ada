use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::TempDir;

use tigs::encode::Encoding;
use tigs::pipeline::{self, process_file, Params};
use tigs::spss::{ExtendingMethod, SeedingMethod};

fn params(input: &Path, encoding: Encoding) -> Params {
    Params {
        input: input.to_path_buf(),
        fasta_out: None,
        counts_out: None,
        kmer_size: 3,
        seeding: SeedingMethod::First,
        extending: ExtendingMethod::First,
        encoding,
        skip_counts: false,
        batch: false,
        debug: true,
        rng_seed: Some(7),
    }
}

fn run_on(text: &str, encoding: Encoding) -> (String, String) {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.unitigs.fa");
    fs::write(&input, text).unwrap();
    let fasta = dir.path().join("out.fa");
    let counts = dir.path().join("out.counts");
    process_file(&input, &fasta, &counts, &params(&input, encoding)).unwrap();
    (
        fs::read_to_string(&fasta).unwrap(),
        fs::read_to_string(&counts).unwrap(),
    )
}

#[test]
fn test_two_unitig_forward_chain() {
    let (fasta, counts) = run_on(
        ">0 LN:i:5 ab:Z:2 2 1   L:+:1:+\nACGTA\n>1 LN:i:4 ab:Z:1 3\nTACC\n",
        Encoding::Plain,
    );
    assert_eq!(fasta, ">0\nACGTACC\n");
    assert_eq!(counts, "2\n2\n1\n1\n3\n");
}

#[test]
fn test_reverse_complement_extension() {
    // the arc enters node 1 on the '-' strand: its unitig is spelled
    // reverse-complemented and its counts come out reversed
    let (fasta, counts) = run_on(
        ">0 LN:i:5 ab:Z:2 2 1 L:+:1:-\nACGTA\n>1 LN:i:4 ab:Z:1 3\nGGTA\n",
        Encoding::Plain,
    );
    assert_eq!(fasta, ">0\nACGTACC\n");
    assert_eq!(counts, "2\n2\n1\n3\n1\n");
}

#[test]
fn test_single_node_input() {
    let (fasta, counts) = run_on(">0 LN:i:5 ab:Z:2 2 1\nACGTA\n", Encoding::Plain);
    assert_eq!(fasta, ">0\nACGTA\n");
    assert_eq!(counts, "2\n2\n1\n");
}

#[test]
fn test_alternative_dialect() {
    let (fasta, counts) = run_on(">SRR1_0 ka:f:5.0\nACGTACG\n", Encoding::Plain);
    assert_eq!(fasta, ">0\nACGTACG\n");
    assert_eq!(counts, "5\n5\n5\n5\n5\n");
}

#[test]
fn test_rle_spans_simplitig_boundary() {
    // two isolated unitigs: first ends on 7, second starts on 7
    let (fasta, counts) = run_on(
        ">0 LN:i:4 ab:Z:3 7\nAAAC\n>1 LN:i:4 ab:Z:7 2\nGGGT\n",
        Encoding::Rle,
    );
    assert_eq!(fasta, ">0\nAAAC\n>1\nGGGT\n");
    assert_eq!(counts, "3 1\n7 2\n2 1\n");
}

#[test]
fn test_flip_rle_joins_boundary_runs() {
    // second unitig ends on 7: flipping it continues the run of 7s
    let (fasta, counts) = run_on(
        ">0 LN:i:4 ab:Z:3 7\nAAAC\n>1 LN:i:4 ab:Z:2 7\nGGGT\n",
        Encoding::FlipRle,
    );
    assert_eq!(fasta, ">0\nAAAC\n>1\nACCC\n");
    assert_eq!(counts, "3 1\n7 2\n2 1\n");
}

#[test]
fn test_avg_rle_orders_by_mean() {
    let (fasta, counts) = run_on(
        ">0 LN:i:4 ab:Z:9 9\nAAAC\n>1 LN:i:4 ab:Z:1 1\nGGGT\n",
        Encoding::AvgRle,
    );
    // the low-mean simplitig comes first after the stable sort
    assert_eq!(fasta, ">0\nGGGT\n>1\nAAAC\n");
    assert_eq!(counts, "1 2\n9 2\n");
}

#[test]
fn test_deterministic_outputs() {
    let text = ">0 LN:i:5 ab:Z:2 2 1 L:+:1:+ L:+:2:+\nACGTA\n\
                >1 LN:i:4 ab:Z:1 3\nTACC\n\
                >2 LN:i:4 ab:Z:5 6\nTAGG\n";
    let first = run_on(text, Encoding::Plain);
    let second = run_on(text, Encoding::Plain);
    assert_eq!(first, second);
}

#[test]
fn test_skip_counts_writes_no_counts_file() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.unitigs.fa");
    fs::write(&input, ">0 LN:i:5 ab:Z:2 2 1\nACGTA\n").unwrap();
    let fasta = dir.path().join("out.fa");
    let counts = dir.path().join("out.counts");

    let mut p = params(&input, Encoding::Plain);
    p.skip_counts = true;
    process_file(&input, &fasta, &counts, &p).unwrap();

    assert!(fasta.exists());
    assert!(!counts.exists());
}

#[test]
fn test_failure_leaves_no_partial_outputs() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.unitigs.fa");
    fs::write(&input, ">0 LN:i:5 ab:Z:2 2\nACGTA\n").unwrap(); // missing abundance
    let fasta = dir.path().join("out.fa");
    let counts = dir.path().join("out.counts");

    assert!(process_file(&input, &fasta, &counts, &params(&input, Encoding::Plain)).is_err());
    assert!(!fasta.exists());
    assert!(!counts.exists());
}

#[test]
fn test_gzipped_input_and_output() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.unitigs.fa.gz");
    let mut encoder = GzEncoder::new(File::create(&input).unwrap(), Compression::default());
    encoder
        .write_all(b">0 LN:i:5 ab:Z:2 2 1\nACGTA\n")
        .unwrap();
    encoder.finish().unwrap();

    let fasta = dir.path().join("out.fa.gz");
    let counts = dir.path().join("out.counts");
    process_file(&input, &fasta, &counts, &params(&input, Encoding::Plain)).unwrap();

    let mut decoded = String::new();
    MultiGzDecoder::new(File::open(&fasta).unwrap())
        .read_to_string(&mut decoded)
        .unwrap();
    assert_eq!(decoded, ">0\nACGTA\n");
    assert_eq!(fs::read_to_string(&counts).unwrap(), "2\n2\n1\n");
}

#[test]
fn test_batch_mode_isolates_failures() {
    let dir = TempDir::new().unwrap();
    let good1 = dir.path().join("good1.unitigs.fa");
    let bad = dir.path().join("bad.unitigs.fa");
    let good2 = dir.path().join("good2.unitigs.fa");
    fs::write(&good1, ">0 LN:i:5 ab:Z:2 2 1\nACGTA\n").unwrap();
    fs::write(&bad, "no def-line here\n").unwrap();
    fs::write(&good2, ">0 LN:i:4 ab:Z:4 4\nGGGT\n").unwrap();

    let list = dir.path().join("list.txt");
    let missing = dir.path().join("missing.unitigs.fa");
    fs::write(
        &list,
        format!(
            "{}\n{}\n{}\n{}\n\n",
            good1.display(),
            bad.display(),
            missing.display(),
            good2.display()
        ),
    )
    .unwrap();

    let out_dir = dir.path().join("out");
    let mut p = params(&list, Encoding::Plain);
    p.batch = true;
    p.fasta_out = Some(out_dir.clone());
    pipeline::run(&p).unwrap();

    assert!(out_dir.join("good1.tigs.fa").exists());
    assert!(out_dir.join("good2.tigs.fa").exists());
    assert!(!out_dir.join("bad.tigs.fa").exists());
    assert_eq!(
        fs::read_to_string(out_dir.join("good1.tigs.fa")).unwrap(),
        ">0\nACGTA\n"
    );
}

#[test]
fn test_run_derives_output_names() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("sample.unitigs.fa");
    fs::write(&input, ">0 LN:i:5 ab:Z:2 2 1\nACGTA\n").unwrap();

    let mut p = params(&input, Encoding::AvgRle);
    p.input = input.clone();
    pipeline::run(&p).unwrap();

    assert!(dir.path().join("sample.tigs.fa").exists());
    assert!(dir.path().join("sample.tigs.avg_rle.counts").exists());
}

#[test]
fn test_even_kmer_size_is_rejected() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.unitigs.fa");
    fs::write(&input, ">0 LN:i:5 ab:Z:2 2 1\nACGTA\n").unwrap();

    let mut p = params(&input, Encoding::Plain);
    p.kmer_size = 4;
    assert!(pipeline::run(&p).is_err());
}
