use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "tigs",
    version,
    about = "Spectrum-preserving string sets (simplitigs) and k-mer count streams from compacted de Bruijn graphs",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute simplitigs and their k-mer count stream from a unitig graph
    Compute {
        /// Input unitig graph (BCALM2-style, optionally gzipped); with
        /// --batch, a list of such files, one per line
        #[arg(short, long)]
        input: String,

        /// Output FASTA file; in batch mode an output directory prefix
        #[arg(short, long)]
        output: Option<String>,

        /// Output counts file
        #[arg(short = 'c', long)]
        counts: Option<String>,

        /// k-mer size the graph was built with, must be odd
        #[arg(short = 'k', long, default_value_t = 31)]
        kmer_size: usize,

        /// Seeding method: f, r, -ma, +aa, -aa, =a, -l, +l, -c, +c
        #[arg(short = 's', long, default_value = "f", allow_hyphen_values = true)]
        seeding: String,

        /// Extending method: f, r, =a, =ma, -ma, -l, +l, -c, +c
        #[arg(short = 'x', long, default_value = "f", allow_hyphen_values = true)]
        extending: String,

        /// Counts encoding: plain, rle, avg_rle, flip_rle, avg_flip_rle
        #[arg(short = 'e', long, default_value = "plain")]
        encoding: String,

        /// Do not write the counts file
        #[arg(short = 'n', long)]
        skip_counts: bool,

        /// Treat the input as a list of graph files, one per line
        #[arg(short = 'b', long)]
        batch: bool,

        /// Seed for the random policies, for reproducible runs
        #[arg(long)]
        seed: Option<u64>,

        /// Verify overlaps, round-trip serialization and the k-mer spectrum
        #[arg(short = 'd', long)]
        debug: bool,
    },

    /// Parse a unitig graph and print its statistics
    Stats {
        /// Input unitig graph (BCALM2-style, optionally gzipped)
        #[arg(short, long)]
        input: String,

        /// k-mer size the graph was built with
        #[arg(short = 'k', long, default_value_t = 31)]
        kmer_size: usize,

        /// Also write the statistics to this path as JSON
        #[arg(long)]
        json: Option<String>,
    },
}
