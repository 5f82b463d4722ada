//! Bidirected unitig graph: parsing, neighbor queries, path spelling.
//!
//! Each node is a unitig of a compacted de Bruijn graph together with one
//! abundance per k-mer and its outgoing arcs. Traversal positions are
//! `(node, forward)` steps; `forward = false` reads the unitig
//! reverse-complemented. An arc may only be taken out of the strand its
//! `forward` flag names.

use std::fmt::Write as _;
use std::fs;
use std::io::BufRead;
use std::path::Path;

use crate::error::{Error, Result};
use crate::graph::stats::GraphStats;
use crate::seq::{self, reverse_complement};

pub type NodeIndex = u32;

/// Outgoing arc: leaves the source on strand `forward`, enters
/// `successor` on strand `to_forward`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arc {
    pub forward: bool,
    pub successor: NodeIndex,
    pub to_forward: bool,
}

/// One unitig with its per-k-mer abundances. Immutable after parsing.
#[derive(Debug, Clone)]
pub struct Node {
    pub unitig: String,
    pub length: usize,
    pub abundances: Vec<u32>,
    pub arcs: Vec<Arc>,
    pub average_abundance: f64,
    pub median_abundance: u32,
}

/// A traversal position: which node, and on which strand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub node: NodeIndex,
    pub forward: bool,
}

#[derive(Debug)]
pub struct Graph {
    nodes: Vec<Node>,
    kmer_size: usize,
    n_arcs: usize,
    n_kmers: usize,
    n_isolated: usize,
    avg_unitig_len: f64,
    avg_abundance: f64,
}

/// Header fields collected before the sequence line is available.
struct Header {
    serial: usize,
    line_no: usize,
    /// `LN:i:` value (standard dialect only).
    length: Option<usize>,
    /// `ab:Z:` values (standard dialect only).
    abundances: Vec<u32>,
    /// `ka:f:` value (alternative dialect only).
    avg: Option<f64>,
    arcs: Vec<Arc>,
}

impl Graph {
    /// Parse a unitig graph file. `.gz` inputs are decompressed on the fly.
    pub fn from_file(path: &Path, kmer_size: usize) -> Result<Graph> {
        let capacity = estimate_n_nodes(path, kmer_size);
        let reader = crate::io::open_text(path)?;
        Graph::from_reader(reader, kmer_size, capacity)
    }

    /// Parse a unitig graph from any buffered reader.
    ///
    /// Records are a header line (`>` prefixed) followed by the unitig
    /// sequence on the next non-empty line. Lines starting with `#` between
    /// records are comments. `capacity` preallocates the node table.
    pub fn from_reader<R: BufRead>(reader: R, kmer_size: usize, capacity: usize) -> Result<Graph> {
        let mut nodes: Vec<Node> = Vec::with_capacity(capacity);
        let mut pending: Option<Header> = None;

        for (idx, line) in reader.lines().enumerate() {
            let line_no = idx + 1;
            let line = line?;
            let trimmed = line.trim();

            match pending.take() {
                None => {
                    if trimmed.is_empty() || trimmed.starts_with('#') {
                        continue;
                    }
                    if !trimmed.starts_with('>') {
                        return Err(Error::format(line_no, "expected a '>' def-line"));
                    }
                    pending = Some(parse_header(trimmed, line_no, nodes.len())?);
                }
                Some(header) => {
                    if trimmed.is_empty() {
                        pending = Some(header);
                        continue;
                    }
                    let unitig = seq::normalize(trimmed).ok_or_else(|| {
                        Error::format(line_no, "unrecognized nucleotide in sequence")
                    })?;
                    nodes.push(build_node(header, unitig, kmer_size)?);
                }
            }
        }
        if let Some(header) = pending {
            return Err(Error::format(
                header.line_no,
                "expected a sequence line after the final header",
            ));
        }

        Ok(Graph::assemble(nodes, kmer_size))
    }

    /// Compute the aggregate statistics in one pass over the parsed nodes.
    fn assemble(nodes: Vec<Node>, kmer_size: usize) -> Graph {
        let mut n_arcs = 0;
        let mut n_kmers = 0;
        let mut n_isolated = 0;
        let mut sum_unitig_len = 0usize;
        let mut sum_abundance = 0.0;
        for node in &nodes {
            n_arcs += node.arcs.len();
            n_kmers += node.abundances.len();
            sum_unitig_len += node.length;
            sum_abundance += node.average_abundance * node.abundances.len() as f64;
            if node.arcs.is_empty() {
                n_isolated += 1;
            }
        }
        let avg_unitig_len = if nodes.is_empty() {
            0.0
        } else {
            sum_unitig_len as f64 / nodes.len() as f64
        };
        let avg_abundance = if n_kmers == 0 {
            0.0
        } else {
            sum_abundance / n_kmers as f64
        };

        Graph {
            nodes,
            kmer_size,
            n_arcs,
            n_kmers,
            n_isolated,
            avg_unitig_len,
            avg_abundance,
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_kmers(&self) -> usize {
        self.n_kmers
    }

    pub fn kmer_size(&self) -> usize {
        self.kmer_size
    }

    pub fn node(&self, idx: NodeIndex) -> &Node {
        &self.nodes[idx as usize]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn stats(&self) -> GraphStats {
        let n_nodes = self.nodes.len();
        GraphStats {
            n_nodes,
            n_kmers: self.n_kmers,
            n_arcs: self.n_arcs,
            n_isolated: self.n_isolated,
            isolated_fraction: if n_nodes == 0 {
                0.0
            } else {
                self.n_isolated as f64 / n_nodes as f64
            },
            // each node has at most 8 arcs (4 per strand)
            density: if n_nodes == 0 {
                0.0
            } else {
                self.n_arcs as f64 / (8.0 * n_nodes as f64)
            },
            avg_unitig_len: self.avg_unitig_len,
            avg_abundance: self.avg_abundance,
        }
    }

    /// All outgoing arcs of `v` whose target is not masked.
    pub fn neighbors_from(&self, v: NodeIndex, mask: &[bool]) -> Vec<Arc> {
        self.nodes[v as usize]
            .arcs
            .iter()
            .filter(|arc| matches!(mask.get(arc.successor as usize), Some(false)))
            .copied()
            .collect()
    }

    /// Candidate next steps when standing on `v` with strand `forward`.
    ///
    /// Only arcs leaving on the current strand qualify; out-of-range
    /// successors (unchecked at parse time) are skipped here.
    pub fn consistent_neighbors(&self, v: NodeIndex, forward: bool, mask: &[bool]) -> Vec<Step> {
        self.nodes[v as usize]
            .arcs
            .iter()
            .filter(|arc| arc.forward == forward)
            .filter(|arc| matches!(mask.get(arc.successor as usize), Some(false)))
            .map(|arc| Step {
                node: arc.successor,
                forward: arc.to_forward,
            })
            .collect()
    }

    /// Spell the simplitig of a path: the first oriented unitig, then each
    /// following oriented unitig minus its (k-1)-overlap.
    pub fn spell(&self, path: &[Step]) -> String {
        assert!(!path.is_empty(), "cannot spell an empty path");
        let k = self.kmer_size;

        let first = &self.nodes[path[0].node as usize];
        let mut contig = if path[0].forward {
            first.unitig.clone()
        } else {
            reverse_complement(&first.unitig)
        };

        for step in &path[1..] {
            let unitig = &self.nodes[step.node as usize].unitig;
            if step.forward {
                contig.push_str(&unitig[k - 1..]);
            } else {
                let kept = unitig.len() - (k - 1);
                contig.push_str(&reverse_complement(&unitig[..kept]));
            }
        }
        contig
    }

    /// Abundance stream of a path, one value per k-mer in spelling order.
    /// Backward steps contribute their abundances reversed.
    pub fn path_counts(&self, path: &[Step]) -> Vec<u32> {
        let mut counts = Vec::new();
        for step in path {
            let abundances = &self.nodes[step.node as usize].abundances;
            if step.forward {
                counts.extend_from_slice(abundances);
            } else {
                counts.extend(abundances.iter().rev());
            }
        }
        counts
    }

    /// Check that every consecutive pair of steps is connected by an arc
    /// matching both strand flags.
    pub fn check_path(&self, path: &[Step]) -> bool {
        path.windows(2).all(|pair| {
            self.nodes[pair[0].node as usize].arcs.iter().any(|arc| {
                arc.forward == pair[0].forward
                    && arc.successor == pair[1].node
                    && arc.to_forward == pair[1].forward
            })
        })
    }

    /// Verify the (k-1)-overlap invariant on every arc.
    pub fn verify_overlaps(&self) -> bool {
        self.nodes
            .iter()
            .all(|node| node.arcs.iter().all(|arc| self.arc_overlaps(node, arc)))
    }

    fn arc_overlaps(&self, node: &Node, arc: &Arc) -> bool {
        let Some(target) = self.nodes.get(arc.successor as usize) else {
            return false;
        };
        let k = self.kmer_size;

        let suffix = if arc.forward {
            node.unitig[node.unitig.len() - (k - 1)..].to_string()
        } else {
            reverse_complement(&node.unitig[..k - 1])
        };
        let prefix = if arc.to_forward {
            target.unitig[..k - 1].to_string()
        } else {
            reverse_complement(&target.unitig[target.unitig.len() - (k - 1)..])
        };
        suffix == prefix
    }

    /// Serialize the graph in the canonical standard dialect.
    pub fn to_standard_string(&self) -> String {
        let mut out = String::new();
        for (id, node) in self.nodes.iter().enumerate() {
            write!(out, ">{} LN:i:{} ab:Z:", id, node.length).unwrap();
            for (i, ab) in node.abundances.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                write!(out, "{}", ab).unwrap();
            }
            for arc in &node.arcs {
                write!(
                    out,
                    " L:{}:{}:{}",
                    if arc.forward { '+' } else { '-' },
                    arc.successor,
                    if arc.to_forward { '+' } else { '-' }
                )
                .unwrap();
            }
            out.push('\n');
            out.push_str(&node.unitig);
            out.push('\n');
        }
        out
    }

    /// Round-trip check: compare the canonical serialization against the
    /// original input, whitespace token by whitespace token. Comment lines in
    /// the source are skipped. Only meaningful for standard-dialect inputs.
    pub fn round_trip_matches<R: BufRead>(&self, source: R) -> Result<bool> {
        let ours = self.to_standard_string();
        let mut mine = ours.split_ascii_whitespace();
        for line in source.lines() {
            let line = line?;
            if line.starts_with('#') {
                continue;
            }
            for token in line.split_ascii_whitespace() {
                if mine.next() != Some(token) {
                    return Ok(false);
                }
            }
        }
        Ok(mine.next().is_none())
    }
}

/// Preallocation heuristic: the smallest possible record is
/// `>0 LN:i:k ab:Z:1` plus a k-character sequence line.
fn estimate_n_nodes(path: &Path, kmer_size: usize) -> usize {
    let min_entry_size = 18 + kmer_size + 2;
    fs::metadata(path)
        .map(|m| m.len() as usize / min_entry_size)
        .unwrap_or(0)
}

fn parse_header(line: &str, line_no: usize, expected_serial: usize) -> Result<Header> {
    let is_standard = line.contains("LN:i:") && line.contains("ab:Z:");
    let is_alternative = line.contains("ka:f:");
    if !is_standard && !is_alternative {
        return Err(Error::format(
            line_no,
            "unknown header dialect: need 'LN:i:' and 'ab:Z:', or 'ka:f:'",
        ));
    }

    let mut tokens = line[1..].split_ascii_whitespace().peekable();
    let id = tokens
        .next()
        .ok_or_else(|| Error::format(line_no, "empty def-line"))?;

    let serial: usize = if is_standard {
        id.parse()
            .map_err(|_| Error::format(line_no, format!("malformed serial '{id}'")))?
    } else {
        // named ids carry the serial after the last '_'
        let digits = id.rsplit_once('_').map(|(_, d)| d).unwrap_or(id);
        digits
            .parse()
            .map_err(|_| Error::format(line_no, format!("no serial found in id '{id}'")))?
    };
    if serial != expected_serial {
        return Err(Error::format(
            line_no,
            format!("serials must be progressive: expected {expected_serial}, found {serial}"),
        ));
    }

    let mut header = Header {
        serial,
        line_no,
        length: None,
        abundances: Vec::new(),
        avg: None,
        arcs: Vec::new(),
    };

    if is_standard {
        let ln = tokens
            .next()
            .filter(|t| t.starts_with("LN:i:"))
            .ok_or_else(|| Error::format(line_no, "expected 'LN:i:' after the serial"))?;
        header.length = Some(ln["LN:i:".len()..].parse().map_err(|_| {
            Error::format(line_no, format!("malformed unitig length '{ln}'"))
        })?);

        let ab = tokens
            .next()
            .filter(|t| t.starts_with("ab:Z:"))
            .ok_or_else(|| Error::format(line_no, "expected 'ab:Z:' after the length"))?;
        let first = &ab["ab:Z:".len()..];
        if !first.is_empty() {
            header.abundances.push(parse_abundance(first, line_no)?);
        }
        while let Some(&token) = tokens.peek() {
            if token.starts_with("L:") {
                break;
            }
            header.abundances.push(parse_abundance(token, line_no)?);
            tokens.next();
        }
    } else {
        let ka = tokens
            .next()
            .filter(|t| t.starts_with("ka:f:"))
            .ok_or_else(|| Error::format(line_no, "expected 'ka:f:' after the id"))?;
        header.avg = Some(ka["ka:f:".len()..].parse().map_err(|_| {
            Error::format(line_no, format!("malformed average abundance '{ka}'"))
        })?);
    }

    for token in tokens {
        header.arcs.push(parse_arc(token, line_no)?);
    }
    Ok(header)
}

fn parse_abundance(token: &str, line_no: usize) -> Result<u32> {
    token
        .parse()
        .map_err(|_| Error::format(line_no, format!("malformed abundance '{token}'")))
}

/// Arc token grammar: `L:<s1>:<succ>:<s2>` with signs in {+,-}. The
/// successor may be a forward reference; bounds are not checked here.
fn parse_arc(token: &str, line_no: usize) -> Result<Arc> {
    let malformed = || Error::format(line_no, format!("malformed arc token '{token}'"));

    let mut parts = token.split(':');
    match (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) {
        (Some("L"), Some(s1), Some(succ), Some(s2), None)
            if matches!(s1, "+" | "-") && matches!(s2, "+" | "-") =>
        {
            Ok(Arc {
                forward: s1 == "+",
                successor: succ.parse().map_err(|_| malformed())?,
                to_forward: s2 == "+",
            })
        }
        _ => Err(malformed()),
    }
}

fn build_node(header: Header, unitig: String, kmer_size: usize) -> Result<Node> {
    if unitig.len() < kmer_size {
        return Err(Error::format(
            header.line_no,
            format!(
                "node {}: unitig of {} bp is shorter than k = {}",
                header.serial,
                unitig.len(),
                kmer_size
            ),
        ));
    }
    let n_kmers = unitig.len() - kmer_size + 1;

    let node = match header.avg {
        // alternative dialect: replicate the average for every k-mer,
        // keeping the original integer-cast compromise
        Some(avg) => Node {
            length: unitig.len(),
            abundances: vec![avg as u32; n_kmers],
            arcs: header.arcs,
            average_abundance: avg,
            median_abundance: avg as u32,
            unitig,
        },
        None => {
            let abundances = header.abundances;
            let sum: u64 = abundances.iter().map(|&a| a as u64).sum();
            let average = sum as f64 / abundances.len().max(1) as f64;
            let median = if abundances.is_empty() {
                0
            } else {
                seq::median(&abundances)
            };
            Node {
                length: header.length.unwrap_or(unitig.len()),
                abundances,
                arcs: header.arcs,
                average_abundance: average,
                median_abundance: median,
                unitig,
            }
        }
    };

    if node.abundances.len() != n_kmers {
        return Err(Error::AbundanceMismatch {
            serial: header.serial,
            length: node.unitig.len(),
            expected: n_kmers,
            found: node.abundances.len(),
            kmer_size,
        });
    }
    Ok(node)
}
