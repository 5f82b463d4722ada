use std::fmt;

use serde::Serialize;

/// Aggregate statistics of a parsed unitig graph.
#[derive(Debug, Clone, Serialize)]
pub struct GraphStats {
    pub n_nodes: usize,
    pub n_kmers: usize,
    pub n_arcs: usize,
    pub n_isolated: usize,
    pub isolated_fraction: f64,
    pub density: f64,
    pub avg_unitig_len: f64,
    pub avg_abundance: f64,
}

impl fmt::Display for GraphStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "dBG stats:")?;
        writeln!(f, "   number of kmers:            {}", self.n_kmers)?;
        writeln!(f, "   number of nodes:            {}", self.n_nodes)?;
        writeln!(
            f,
            "   number of isolated nodes:   {} ({:.2}%)",
            self.n_isolated,
            self.isolated_fraction * 100.0
        )?;
        writeln!(f, "   number of arcs:             {}", self.n_arcs)?;
        writeln!(f, "   graph density:              {:.4}%", self.density * 100.0)?;
        writeln!(f, "   average unitig length:      {:.2}", self.avg_unitig_len)?;
        write!(f, "   average abundance:          {:.2}", self.avg_abundance)
    }
}
