//! Seed and extension selection policies for the path cover.
//!
//! Every policy reduces to a total ordering over candidate nodes, applied as
//! an argmin over a numeric key; ties always go to the smaller node index.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::Error;
use crate::graph::{Graph, Node, NodeIndex, Step};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedingMethod {
    /// `f`: first unmasked node.
    First,
    /// `r`: uniform random unmasked node.
    Random,
    /// `-ma`: smallest median abundance.
    MinMedian,
    /// `+aa`: largest average abundance.
    MaxAverage,
    /// `-aa`: smallest average abundance.
    MinAverage,
    /// `=a`: average abundance closest to the last selected node's.
    SimilarAverage,
    /// `-l`: shortest unitig.
    MinLength,
    /// `+l`: longest unitig.
    MaxLength,
    /// `-c`: fewest arcs.
    MinArcs,
    /// `+c`: most arcs.
    MaxArcs,
}

impl SeedingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeedingMethod::First => "f",
            SeedingMethod::Random => "r",
            SeedingMethod::MinMedian => "-ma",
            SeedingMethod::MaxAverage => "+aa",
            SeedingMethod::MinAverage => "-aa",
            SeedingMethod::SimilarAverage => "=a",
            SeedingMethod::MinLength => "-l",
            SeedingMethod::MaxLength => "+l",
            SeedingMethod::MinArcs => "-c",
            SeedingMethod::MaxArcs => "+c",
        }
    }
}

impl FromStr for SeedingMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_ascii_lowercase().as_str() {
            "f" => Ok(SeedingMethod::First),
            "r" => Ok(SeedingMethod::Random),
            "-ma" => Ok(SeedingMethod::MinMedian),
            "+aa" => Ok(SeedingMethod::MaxAverage),
            "-aa" => Ok(SeedingMethod::MinAverage),
            "=a" => Ok(SeedingMethod::SimilarAverage),
            "-l" => Ok(SeedingMethod::MinLength),
            "+l" => Ok(SeedingMethod::MaxLength),
            "-c" => Ok(SeedingMethod::MinArcs),
            "+c" => Ok(SeedingMethod::MaxArcs),
            _ => Err(Error::Config(format!("'{s}' is not a valid seeding method"))),
        }
    }
}

impl fmt::Display for SeedingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtendingMethod {
    /// `f`: first candidate in arc order.
    First,
    /// `r`: uniform random candidate.
    Random,
    /// `=a`: average abundance closest to the tail's.
    SimilarAverage,
    /// `=ma`: median abundance closest to the tail's.
    SimilarMedian,
    /// `-ma`: smallest median abundance.
    MinMedian,
    /// `-l`: shortest unitig.
    MinLength,
    /// `+l`: longest unitig.
    MaxLength,
    /// `-c`: fewest arcs.
    MinArcs,
    /// `+c`: most arcs.
    MaxArcs,
}

impl ExtendingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtendingMethod::First => "f",
            ExtendingMethod::Random => "r",
            ExtendingMethod::SimilarAverage => "=a",
            ExtendingMethod::SimilarMedian => "=ma",
            ExtendingMethod::MinMedian => "-ma",
            ExtendingMethod::MinLength => "-l",
            ExtendingMethod::MaxLength => "+l",
            ExtendingMethod::MinArcs => "-c",
            ExtendingMethod::MaxArcs => "+c",
        }
    }
}

impl FromStr for ExtendingMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_ascii_lowercase().as_str() {
            "f" => Ok(ExtendingMethod::First),
            "r" => Ok(ExtendingMethod::Random),
            "=a" => Ok(ExtendingMethod::SimilarAverage),
            "=ma" => Ok(ExtendingMethod::SimilarMedian),
            "-ma" => Ok(ExtendingMethod::MinMedian),
            "-l" => Ok(ExtendingMethod::MinLength),
            "+l" => Ok(ExtendingMethod::MaxLength),
            "-c" => Ok(ExtendingMethod::MinArcs),
            "+c" => Ok(ExtendingMethod::MaxArcs),
            _ => Err(Error::Config(format!(
                "'{s}' is not a valid extending method"
            ))),
        }
    }
}

impl fmt::Display for ExtendingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Selects seeds and extensions for the SPSS builder.
///
/// Holds the RNG for the `r` policies and the last selected node for the
/// `=a`/`=ma` policies; everything else is a pure function of graph and mask.
pub struct Sorter {
    seeding: SeedingMethod,
    extending: ExtendingMethod,
    rng: StdRng,
    last: Option<NodeIndex>,
}

impl Sorter {
    /// `rng_seed` fixes the random policies for reproducible runs; without it
    /// the generator is seeded from entropy.
    pub fn new(seeding: SeedingMethod, extending: ExtendingMethod, rng_seed: Option<u64>) -> Sorter {
        let rng = match rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Sorter {
            seeding,
            extending,
            rng,
            last: None,
        }
    }

    /// Select the next seed among unmasked nodes. Seeds always start on the
    /// forward strand.
    pub fn pick_seed(&mut self, graph: &Graph, mask: &[bool]) -> Option<Step> {
        let node = match self.seeding {
            SeedingMethod::First => first_unmasked(mask),
            SeedingMethod::Random => {
                let free: Vec<NodeIndex> = unmasked(mask).collect();
                if free.is_empty() {
                    None
                } else {
                    Some(free[self.rng.gen_range(0..free.len())])
                }
            }
            SeedingMethod::MinMedian => {
                argmin_unmasked(graph, mask, |n| n.median_abundance as f64)
            }
            SeedingMethod::MaxAverage => argmin_unmasked(graph, mask, |n| -n.average_abundance),
            SeedingMethod::MinAverage => argmin_unmasked(graph, mask, |n| n.average_abundance),
            SeedingMethod::SimilarAverage => match self.last {
                None => first_unmasked(mask),
                Some(last) => {
                    let reference = graph.node(last).average_abundance;
                    argmin_unmasked(graph, mask, |n| (n.average_abundance - reference).abs())
                }
            },
            SeedingMethod::MinLength => argmin_unmasked(graph, mask, |n| n.length as f64),
            SeedingMethod::MaxLength => argmin_unmasked(graph, mask, |n| -(n.length as f64)),
            SeedingMethod::MinArcs => argmin_unmasked(graph, mask, |n| n.arcs.len() as f64),
            SeedingMethod::MaxArcs => argmin_unmasked(graph, mask, |n| -(n.arcs.len() as f64)),
        }?;
        self.last = Some(node);
        Some(Step {
            node,
            forward: true,
        })
    }

    /// Select among candidate next steps; returns an index into `candidates`.
    /// `tail` is the node the path currently ends on.
    pub fn pick_extension(
        &mut self,
        graph: &Graph,
        tail: NodeIndex,
        candidates: &[Step],
    ) -> Option<usize> {
        if candidates.is_empty() {
            return None;
        }
        let chosen = match self.extending {
            ExtendingMethod::First => 0,
            ExtendingMethod::Random => self.rng.gen_range(0..candidates.len()),
            ExtendingMethod::SimilarAverage => {
                let reference = graph.node(tail).average_abundance;
                argmin_candidate(graph, candidates, |n| {
                    (n.average_abundance - reference).abs()
                })
            }
            ExtendingMethod::SimilarMedian => {
                let reference = graph.node(tail).median_abundance as i64;
                argmin_candidate(graph, candidates, |n| {
                    (n.median_abundance as i64 - reference).abs() as f64
                })
            }
            ExtendingMethod::MinMedian => {
                argmin_candidate(graph, candidates, |n| n.median_abundance as f64)
            }
            ExtendingMethod::MinLength => argmin_candidate(graph, candidates, |n| n.length as f64),
            ExtendingMethod::MaxLength => {
                argmin_candidate(graph, candidates, |n| -(n.length as f64))
            }
            ExtendingMethod::MinArcs => {
                argmin_candidate(graph, candidates, |n| n.arcs.len() as f64)
            }
            ExtendingMethod::MaxArcs => {
                argmin_candidate(graph, candidates, |n| -(n.arcs.len() as f64))
            }
        };
        self.last = Some(candidates[chosen].node);
        Some(chosen)
    }
}

fn unmasked(mask: &[bool]) -> impl Iterator<Item = NodeIndex> + '_ {
    mask.iter()
        .enumerate()
        .filter(|(_, &masked)| !masked)
        .map(|(idx, _)| idx as NodeIndex)
}

fn first_unmasked(mask: &[bool]) -> Option<NodeIndex> {
    unmasked(mask).next()
}

/// Argmin over unmasked nodes; iteration in index order means equal keys
/// keep the smaller index.
fn argmin_unmasked(
    graph: &Graph,
    mask: &[bool],
    mut key: impl FnMut(&Node) -> f64,
) -> Option<NodeIndex> {
    let mut best: Option<(NodeIndex, f64)> = None;
    for idx in unmasked(mask) {
        let k = key(graph.node(idx));
        match best {
            None => best = Some((idx, k)),
            Some((_, best_key)) if k.total_cmp(&best_key) == Ordering::Less => {
                best = Some((idx, k))
            }
            _ => {}
        }
    }
    best.map(|(idx, _)| idx)
}

/// Argmin over candidates; equal keys go to the smaller node index even when
/// the candidates are not in index order.
fn argmin_candidate(
    graph: &Graph,
    candidates: &[Step],
    mut key: impl FnMut(&Node) -> f64,
) -> usize {
    let mut best = 0;
    let mut best_key = key(graph.node(candidates[0].node));
    for (i, cand) in candidates.iter().enumerate().skip(1) {
        let k = key(graph.node(cand.node));
        match k.total_cmp(&best_key) {
            Ordering::Less => {
                best = i;
                best_key = k;
            }
            Ordering::Equal if cand.node < candidates[best].node => best = i,
            _ => {}
        }
    }
    best
}
