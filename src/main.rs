mod cli_main;

use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use tracing_subscriber::FmtSubscriber;

use cli_main::{Cli, Commands};
use tigs::error::Result;
use tigs::pipeline::{self, Params};

fn main() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(tracing::Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Setting tracing default failed");

    let cli = Cli::parse();
    if let Err(e) = dispatch(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Compute {
            input,
            output,
            counts,
            kmer_size,
            seeding,
            extending,
            encoding,
            skip_counts,
            batch,
            seed,
            debug,
        } => {
            let params = Params {
                input: PathBuf::from(input),
                fasta_out: output.map(PathBuf::from),
                counts_out: counts.map(PathBuf::from),
                kmer_size,
                seeding: seeding.parse()?,
                extending: extending.parse()?,
                encoding: encoding.parse()?,
                skip_counts,
                batch,
                debug,
                rng_seed: seed,
            };
            pipeline::run(&params)
        }
        Commands::Stats {
            input,
            kmer_size,
            json,
        } => pipeline::graph_stats(
            Path::new(&input),
            kmer_size,
            json.as_deref().map(Path::new),
        ),
    }
}
