//! Greedy path cover of the bidirected unitig graph and extraction of the
//! simplitigs with their aligned count streams.

use std::fmt;

use crate::graph::{Graph, Step};
use crate::seq;
use crate::spss::sorter::Sorter;

/// Summary of an extracted string set.
#[derive(Debug, Clone)]
pub struct SpssStats {
    pub n_simplitigs: usize,
    pub total_length: usize,
    pub avg_simplitig_len: f64,
    pub n_kmers: usize,
}

impl fmt::Display for SpssStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SPSS stats:")?;
        writeln!(f, "   number of simplitigs:       {}", self.n_simplitigs)?;
        writeln!(f, "   total length:               {}", self.total_length)?;
        writeln!(
            f,
            "   average simplitig length:   {:.2}",
            self.avg_simplitig_len
        )?;
        write!(f, "   number of kmers:            {}", self.n_kmers)
    }
}

/// Builds a path cover of the graph: every node is placed in exactly one
/// path, and consecutive steps always follow an arc on the strand the walk
/// currently travels.
pub struct Spss<'a> {
    graph: &'a Graph,
    sorter: Sorter,
    paths: Vec<Vec<Step>>,
    simplitigs: Vec<String>,
    counts: Vec<Vec<u32>>,
}

impl<'a> Spss<'a> {
    pub fn new(graph: &'a Graph, sorter: Sorter) -> Spss<'a> {
        Spss {
            graph,
            sorter,
            paths: Vec::new(),
            simplitigs: Vec::new(),
            counts: Vec::new(),
        }
    }

    /// Greedy cover: seed, extend forward as far as possible, then extend
    /// backward from the seed by walking the reversed, strand-flipped path
    /// forward and restoring the canonical direction afterwards.
    pub fn compute_path_cover(&mut self) {
        let mut mask = vec![false; self.graph.n_nodes()];

        while let Some(seed) = self.sorter.pick_seed(self.graph, &mask) {
            mask[seed.node as usize] = true;
            let mut path = vec![seed];

            self.extend(&mut path, &mut mask);
            reverse_and_flip(&mut path);
            self.extend(&mut path, &mut mask);
            reverse_and_flip(&mut path);

            debug_assert!(self.graph.check_path(&path));
            self.paths.push(path);
        }
    }

    fn extend(&mut self, path: &mut Vec<Step>, mask: &mut [bool]) {
        loop {
            let tail = *path.last().unwrap();
            let candidates = self
                .graph
                .consistent_neighbors(tail.node, tail.forward, mask);
            let Some(choice) = self.sorter.pick_extension(self.graph, tail.node, &candidates)
            else {
                break;
            };
            let step = candidates[choice];
            mask[step.node as usize] = true;
            path.push(step);
        }
    }

    /// Spell every path and materialize its count stream.
    pub fn extract_simplitigs_and_counts(&mut self) {
        self.simplitigs = self.paths.iter().map(|p| self.graph.spell(p)).collect();
        self.counts = self.paths.iter().map(|p| self.graph.path_counts(p)).collect();
    }

    pub fn paths(&self) -> &[Vec<Step>] {
        &self.paths
    }

    pub fn simplitigs(&self) -> &[String] {
        &self.simplitigs
    }

    pub fn counts(&self) -> &[Vec<u32>] {
        &self.counts
    }

    /// Hand the extracted simplitigs and counts to the encoder.
    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<u32>>) {
        (self.simplitigs, self.counts)
    }

    pub fn stats(&self) -> SpssStats {
        let total_length: usize = self.simplitigs.iter().map(|s| s.len()).sum();
        let n_kmers: usize = self.counts.iter().map(|c| c.len()).sum();
        SpssStats {
            n_simplitigs: self.simplitigs.len(),
            total_length,
            avg_simplitig_len: if self.simplitigs.is_empty() {
                0.0
            } else {
                total_length as f64 / self.simplitigs.len() as f64
            },
            n_kmers,
        }
    }

    /// Diagnostic: the canonical k-mer multiset of the simplitigs must equal
    /// that of the input unitigs.
    pub fn verify_spectrum(&self) -> bool {
        let k = self.graph.kmer_size();
        let unitigs =
            seq::kmer_spectrum(self.graph.nodes().iter().map(|n| n.unitig.as_str()), k);
        let spelled = seq::kmer_spectrum(self.simplitigs.iter().map(|s| s.as_str()), k);
        unitigs == spelled
    }
}

fn reverse_and_flip(path: &mut [Step]) {
    path.reverse();
    for step in path.iter_mut() {
        step.forward = !step.forward;
    }
}
