//! Drives one input through graph construction, path cover, encoding and
//! output emission; batch mode repeats this per file with failure isolation.

use std::fs;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{error, info, warn};

use crate::encode::{Encoder, Encoding};
use crate::error::{Error, Result};
use crate::graph::Graph;
use crate::spss::{ExtendingMethod, SeedingMethod, Sorter, Spss};

pub struct Params {
    pub input: PathBuf,
    /// FASTA output; in batch mode an output directory prefix.
    pub fasta_out: Option<PathBuf>,
    pub counts_out: Option<PathBuf>,
    pub kmer_size: usize,
    pub seeding: SeedingMethod,
    pub extending: ExtendingMethod,
    pub encoding: Encoding,
    pub skip_counts: bool,
    pub batch: bool,
    pub debug: bool,
    pub rng_seed: Option<u64>,
}

pub fn validate_kmer_size(kmer_size: usize) -> Result<()> {
    if kmer_size == 0 {
        return Err(Error::Config("kmer size must be positive".to_string()));
    }
    if kmer_size % 2 == 0 {
        return Err(Error::Config(
            "an even kmer size creates self-loops in the dBG, use an odd one".to_string(),
        ));
    }
    Ok(())
}

/// Entry point for the `compute` subcommand.
pub fn run(params: &Params) -> Result<()> {
    validate_kmer_size(params.kmer_size)?;
    print_params(params);

    if params.batch {
        run_batch(params)
    } else {
        let (derived_fasta, derived_counts) = derived_names(&params.input, None, params.encoding);
        let fasta_out = params.fasta_out.clone().unwrap_or(derived_fasta);
        let counts_out = params.counts_out.clone().unwrap_or(derived_counts);
        process_file(&params.input, &fasta_out, &counts_out, params)
    }
}

/// Process a list of graph files, one per line. A failing file is reported
/// and the remaining files still run.
fn run_batch(params: &Params) -> Result<()> {
    info!("Batch mode: reading file list from {}", params.input.display());
    let reader = crate::io::open_text(&params.input)?;
    let prefix = params.fasta_out.as_deref();

    let mut n_files = 0;
    let mut n_ok = 0;
    for line in reader.lines() {
        let line = line?;
        let entry = line.trim();
        if entry.is_empty() {
            continue;
        }
        n_files += 1;

        let input = PathBuf::from(entry);
        if !input.exists() {
            warn!("file not found, skipping: {}", input.display());
            continue;
        }

        let (fasta_out, counts_out) = derived_names(&input, prefix, params.encoding);
        match process_file(&input, &fasta_out, &counts_out, params) {
            Ok(()) => n_ok += 1,
            Err(e) => error!("failed to process {}: {}", input.display(), e),
        }
    }
    info!("Batch complete: {}/{} files processed", n_ok, n_files);
    Ok(())
}

/// Run the full pipeline on one graph file. Output files are only created
/// once the string set and its encoding are fully computed, so a failure
/// never leaves partial outputs behind.
pub fn process_file(
    input: &Path,
    fasta_out: &Path,
    counts_out: &Path,
    params: &Params,
) -> Result<()> {
    info!("Reading {}", input.display());
    let start = Instant::now();
    let graph = Graph::from_file(input, params.kmer_size)?;
    info!(
        "Parsed {} nodes in {:.2}s",
        graph.n_nodes(),
        start.elapsed().as_secs_f32()
    );
    println!("{}", graph.stats());

    if params.debug {
        if graph.verify_overlaps() {
            info!("overlap invariant holds on every arc");
        } else {
            warn!("overlap invariant violated, continuing anyway");
        }
        let source = crate::io::open_text(input)?;
        if graph.round_trip_matches(source)? {
            info!("round-trip serialization matches the input");
        } else {
            warn!("round-trip serialization differs from the input");
        }
    }

    let sorter = Sorter::new(params.seeding, params.extending, params.rng_seed);
    let mut spss = Spss::new(&graph, sorter);

    info!("Computing a path cover...");
    let start = Instant::now();
    spss.compute_path_cover();
    info!("Path cover computed in {} ms", start.elapsed().as_millis());

    spss.extract_simplitigs_and_counts();
    println!("{}", spss.stats());

    if params.debug {
        if spss.verify_spectrum() {
            info!("k-mer spectrum of the simplitigs matches the input");
        } else {
            warn!("k-mer spectrum of the simplitigs differs from the input");
        }
    }

    let (simplitigs, counts) = spss.into_parts();
    let mut encoder = Encoder::new(simplitigs, counts, params.encoding);
    encoder.encode();
    println!("{}", encoder.stats());

    create_parent_dir(fasta_out)?;
    encoder.to_fasta_file(fasta_out)?;
    info!("Simplitigs written to {}", fasta_out.display());

    if params.skip_counts {
        info!("Skipping counts file");
    } else {
        create_parent_dir(counts_out)?;
        encoder.to_counts_file(counts_out)?;
        info!("Counts written to {}", counts_out.display());
    }
    Ok(())
}

/// Entry point for the `stats` subcommand.
pub fn graph_stats(input: &Path, kmer_size: usize, json_out: Option<&Path>) -> Result<()> {
    validate_kmer_size(kmer_size)?;
    let graph = Graph::from_file(input, kmer_size)?;
    let stats = graph.stats();
    println!("{}", stats);

    if let Some(path) = json_out {
        let json = serde_json::to_string_pretty(&stats)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        fs::write(path, json)?;
        info!("Stats written to {}", path.display());
    }
    Ok(())
}

fn print_params(params: &Params) {
    println!("Params:");
    println!("   input file:             {}", params.input.display());
    println!("   kmer size:              {}", params.kmer_size);
    println!("   seeding method:         {}", params.seeding);
    println!("   extending method:       {}", params.extending);
    println!("   encoding:               {}", params.encoding);
    println!("   skip counts:            {}", params.skip_counts);
    println!("   batch mode:             {}", params.batch);
    println!("   debug:                  {}", params.debug);
}

/// Derive `<base>.tigs.fa` and `<base>.tigs<suffix>.counts` next to the
/// input, or under `dir` when given (batch output prefix).
fn derived_names(input: &Path, dir: Option<&Path>, encoding: Encoding) -> (PathBuf, PathBuf) {
    let base = base_name(input);
    let dir = match dir {
        Some(d) => d.to_path_buf(),
        None => input.parent().unwrap_or(Path::new("")).to_path_buf(),
    };
    let fasta = dir.join(format!("{base}.tigs.fa"));
    let counts = dir.join(format!("{base}.tigs{}.counts", encoding.suffix()));
    (fasta, counts)
}

fn base_name(input: &Path) -> String {
    let name = input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("output");
    for suffix in [".unitigs.fa.gz", ".unitigs.fa", ".fa.gz", ".fasta", ".fa"] {
        if let Some(stripped) = name.strip_suffix(suffix) {
            return stripped.to_string();
        }
    }
    name.to_string()
}

fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_name_strips_bcalm_suffixes() {
        assert_eq!(base_name(Path::new("a/SRR1.unitigs.fa")), "SRR1");
        assert_eq!(base_name(Path::new("SRR1.unitigs.fa.gz")), "SRR1");
        assert_eq!(base_name(Path::new("graph.fa")), "graph");
        assert_eq!(base_name(Path::new("graph.txt")), "graph.txt");
    }

    #[test]
    fn test_derived_names() {
        let (fasta, counts) =
            derived_names(Path::new("data/x.unitigs.fa"), None, Encoding::AvgRle);
        assert_eq!(fasta, PathBuf::from("data/x.tigs.fa"));
        assert_eq!(counts, PathBuf::from("data/x.tigs.avg_rle.counts"));

        let (fasta, _) = derived_names(
            Path::new("data/x.unitigs.fa"),
            Some(Path::new("out")),
            Encoding::Plain,
        );
        assert_eq!(fasta, PathBuf::from("out/x.tigs.fa"));
    }

    #[test]
    fn test_kmer_size_validation() {
        assert!(validate_kmer_size(31).is_ok());
        assert!(validate_kmer_size(0).is_err());
        assert!(validate_kmer_size(32).is_err());
    }
}
