//! Spectrum-preserving string sets (simplitigs) with aligned k-mer count
//! streams, computed from the unitigs of a compacted de Bruijn graph.
//!
//! The pipeline parses a BCALM2-style unitig graph, chooses a path cover of
//! the bidirected graph under configurable seeding/extending policies,
//! spells one simplitig per path, and emits the simplitigs as FASTA next to
//! the traversal-ordered k-mer counts, optionally run-length encoded.

pub mod encode;
pub mod error;
pub mod graph;
pub mod io;
pub mod pipeline;
pub mod seq;
pub mod spss;
