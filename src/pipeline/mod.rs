//! Orchestration of one input through the full pipeline.

pub mod run;

pub use run::{graph_stats, process_file, run, validate_kmer_size, Params};
