//! Output encoding: optional reordering and flipping of simplitigs to
//! lengthen count runs, plus the run-length scheme itself.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::io::counts::CountsWriter;
use crate::io::fasta::FastaWriter;
use crate::seq::reverse_complement;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// One count per line, traversal order.
    Plain,
    /// Run-length encoded counts.
    Rle,
    /// Sort simplitigs by average count, then RLE.
    AvgRle,
    /// Flip simplitigs to join runs across boundaries, then RLE.
    FlipRle,
    /// Sort by average, flip, then RLE.
    AvgFlipRle,
}

impl Encoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Plain => "plain",
            Encoding::Rle => "rle",
            Encoding::AvgRle => "avg_rle",
            Encoding::FlipRle => "flip_rle",
            Encoding::AvgFlipRle => "avg_flip_rle",
        }
    }

    /// Suffix spliced into derived counts file names.
    pub fn suffix(&self) -> &'static str {
        match self {
            Encoding::Plain => "",
            Encoding::Rle => ".rle",
            Encoding::AvgRle => ".avg_rle",
            Encoding::FlipRle => ".flip_rle",
            Encoding::AvgFlipRle => ".avg_flip_rle",
        }
    }

    fn sorts(&self) -> bool {
        matches!(self, Encoding::AvgRle | Encoding::AvgFlipRle)
    }

    fn flips(&self) -> bool {
        matches!(self, Encoding::FlipRle | Encoding::AvgFlipRle)
    }

    fn run_length(&self) -> bool {
        !matches!(self, Encoding::Plain)
    }
}

impl FromStr for Encoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "plain" => Ok(Encoding::Plain),
            "rle" => Ok(Encoding::Rle),
            "avg_rle" => Ok(Encoding::AvgRle),
            "flip_rle" => Ok(Encoding::FlipRle),
            "avg_flip_rle" => Ok(Encoding::AvgFlipRle),
            _ => Err(Error::Config(format!("'{s}' is not a valid encoding"))),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct EncoderStats {
    pub n_simplitigs: usize,
    pub n_counts: usize,
    pub n_runs: usize,
    pub n_flipped: usize,
}

impl fmt::Display for EncoderStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Encoder stats:")?;
        writeln!(f, "   number of simplitigs:       {}", self.n_simplitigs)?;
        writeln!(f, "   number of counts:           {}", self.n_counts)?;
        writeln!(f, "   number of runs:             {}", self.n_runs)?;
        writeln!(
            f,
            "   runs per count:             {:.4}",
            if self.n_counts == 0 {
                0.0
            } else {
                self.n_runs as f64 / self.n_counts as f64
            }
        )?;
        write!(f, "   flipped simplitigs:         {}", self.n_flipped)
    }
}

/// One simplitig with its aligned count vector. Flipping reverse-complements
/// the spelling and reverses the counts together.
struct Entry {
    seq: String,
    counts: Vec<u32>,
}

impl Entry {
    fn flip(&mut self) {
        self.seq = reverse_complement(&self.seq);
        self.counts.reverse();
    }

    fn mean(&self) -> f64 {
        if self.counts.is_empty() {
            return 0.0;
        }
        let sum: u64 = self.counts.iter().map(|&c| c as u64).sum();
        sum as f64 / self.counts.len() as f64
    }
}

/// Owns the extracted string set, applies the configured reorder/flip
/// transforms, and writes the two output files.
pub struct Encoder {
    entries: Vec<Entry>,
    encoding: Encoding,
    n_flipped: usize,
}

impl Encoder {
    pub fn new(simplitigs: Vec<String>, counts: Vec<Vec<u32>>, encoding: Encoding) -> Encoder {
        debug_assert_eq!(simplitigs.len(), counts.len());
        let entries = simplitigs
            .into_iter()
            .zip(counts)
            .map(|(seq, counts)| Entry { seq, counts })
            .collect();
        Encoder {
            entries,
            encoding,
            n_flipped: 0,
        }
    }

    /// Apply the transforms of the configured mode. Emission itself happens
    /// in [`to_fasta_file`](Self::to_fasta_file) and
    /// [`to_counts_file`](Self::to_counts_file).
    pub fn encode(&mut self) {
        if self.encoding.sorts() {
            self.sort_by_average();
        }
        if self.encoding.flips() {
            self.flip_to_join_runs();
        }
    }

    /// Stable sort by mean count ascending: equal means keep their relative
    /// order.
    fn sort_by_average(&mut self) {
        let mut keyed: Vec<(f64, Entry)> = self
            .entries
            .drain(..)
            .map(|e| (e.mean(), e))
            .collect();
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
        self.entries = keyed.into_iter().map(|(_, e)| e).collect();
    }

    /// Boundary heuristic: flip a simplitig when its leading count breaks
    /// the previous run but its trailing count would continue it. A local
    /// optimum only; a simplitig whose head already joins the run is never
    /// touched.
    fn flip_to_join_runs(&mut self) {
        let mut tail: Option<u32> = None;
        for entry in &mut self.entries {
            if let Some(tail) = tail {
                let head = *entry.counts.first().unwrap();
                let last = *entry.counts.last().unwrap();
                if head != tail && last == tail {
                    entry.flip();
                    self.n_flipped += 1;
                }
            }
            tail = entry.counts.last().copied();
        }
    }

    /// Runs of the global count stream, crossing simplitig boundaries.
    fn runs(&self) -> Vec<(u32, u64)> {
        let mut runs: Vec<(u32, u64)> = Vec::new();
        for count in self.entries.iter().flat_map(|e| e.counts.iter().copied()) {
            match runs.last_mut() {
                Some((value, length)) if *value == count => *length += 1,
                _ => runs.push((count, 1)),
            }
        }
        runs
    }

    pub fn stats(&self) -> EncoderStats {
        EncoderStats {
            n_simplitigs: self.entries.len(),
            n_counts: self.entries.iter().map(|e| e.counts.len()).sum(),
            n_runs: self.runs().len(),
            n_flipped: self.n_flipped,
        }
    }

    /// Write the simplitigs as `>i` FASTA records.
    pub fn to_fasta_file(&self, path: &Path) -> Result<()> {
        let mut writer = FastaWriter::create(path)?;
        for (id, entry) in self.entries.iter().enumerate() {
            writer.write_record(id, &entry.seq)?;
        }
        writer.finish()?;
        Ok(())
    }

    /// Write the count stream: one value per line in plain mode, one
    /// `value length` run per line otherwise.
    pub fn to_counts_file(&self, path: &Path) -> Result<()> {
        let mut writer = CountsWriter::create(path)?;
        if self.encoding.run_length() {
            for (value, length) in self.runs() {
                writer.write_run(value, length)?;
            }
        } else {
            for entry in &self.entries {
                for &count in &entry.counts {
                    writer.write_count(count)?;
                }
            }
        }
        writer.finish()?;
        Ok(())
    }

    pub fn simplitigs(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.seq.as_str())
    }

    pub fn counts(&self) -> impl Iterator<Item = &[u32]> {
        self.entries.iter().map(|e| e.counts.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder(data: &[(&str, &[u32])], encoding: Encoding) -> Encoder {
        Encoder::new(
            data.iter().map(|(s, _)| s.to_string()).collect(),
            data.iter().map(|(_, c)| c.to_vec()).collect(),
            encoding,
        )
    }

    fn expand(runs: &[(u32, u64)]) -> Vec<u32> {
        runs.iter()
            .flat_map(|&(v, l)| std::iter::repeat(v).take(l as usize))
            .collect()
    }

    #[test]
    fn test_runs_cross_boundaries() {
        let enc = encoder(
            &[("ACGTA", &[2, 7, 7]), ("TTTTT", &[7, 7, 1])],
            Encoding::Rle,
        );
        assert_eq!(enc.runs(), vec![(2, 1), (7, 4), (1, 1)]);
    }

    #[test]
    fn test_rle_round_trip() {
        let enc = encoder(
            &[("ACGTA", &[3, 3, 1]), ("TTTTT", &[1, 2, 2])],
            Encoding::Rle,
        );
        let stream: Vec<u32> = enc.counts().flatten().copied().collect();
        assert_eq!(expand(&enc.runs()), stream);
    }

    #[test]
    fn test_sort_by_average_is_stable() {
        let mut enc = encoder(
            &[
                ("AAAA", &[9, 9]),   // mean 9.0
                ("CCCC", &[1, 3]),   // mean 2.0
                ("GGGG", &[2, 2]),   // mean 2.0, after CCCC
            ],
            Encoding::AvgRle,
        );
        enc.encode();
        let order: Vec<&str> = enc.simplitigs().collect();
        assert_eq!(order, vec!["CCCC", "GGGG", "AAAA"]);
    }

    #[test]
    fn test_flip_joins_runs() {
        // second simplitig starts with 5 but ends with 7: flipping joins the
        // run of 7s
        let mut enc = encoder(
            &[("ACGTA", &[2, 7, 7]), ("AACCG", &[5, 1, 7])],
            Encoding::FlipRle,
        );
        enc.encode();
        assert_eq!(enc.stats().n_flipped, 1);
        let seqs: Vec<&str> = enc.simplitigs().collect();
        assert_eq!(seqs, vec!["ACGTA", "CGGTT"]);
        let counts: Vec<&[u32]> = enc.counts().collect();
        assert_eq!(counts[1], &[7, 1, 5]);
        assert_eq!(enc.runs(), vec![(2, 1), (7, 3), (1, 1), (5, 1)]);
    }

    #[test]
    fn test_flip_leaves_joined_heads_alone() {
        let mut enc = encoder(
            &[("ACGTA", &[2, 7, 7]), ("AACCG", &[7, 1, 7])],
            Encoding::FlipRle,
        );
        enc.encode();
        assert_eq!(enc.stats().n_flipped, 0);
    }

    #[test]
    fn test_flip_is_an_involution() {
        let mut entry = Entry {
            seq: "ACGTA".to_string(),
            counts: vec![1, 2, 3],
        };
        entry.flip();
        assert_eq!(entry.seq, "TACGT");
        assert_eq!(entry.counts, vec![3, 2, 1]);
        entry.flip();
        assert_eq!(entry.seq, "ACGTA");
        assert_eq!(entry.counts, vec![1, 2, 3]);
    }

    #[test]
    fn test_encoding_names() {
        for name in ["plain", "rle", "avg_rle", "flip_rle", "avg_flip_rle"] {
            assert_eq!(name.parse::<Encoding>().unwrap().as_str(), name);
        }
        assert!("zip".parse::<Encoding>().is_err());
    }

    #[test]
    fn test_plain_mode_transforms_nothing() {
        let mut enc = encoder(
            &[("AAAA", &[9, 9]), ("CCCC", &[1, 3])],
            Encoding::Plain,
        );
        enc.encode();
        let order: Vec<&str> = enc.simplitigs().collect();
        assert_eq!(order, vec!["AAAA", "CCCC"]);
        assert_eq!(enc.stats().n_flipped, 0);
    }
}
