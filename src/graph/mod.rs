//! The bidirected unitig graph and its statistics.

pub mod dbg;
pub mod stats;

pub use dbg::{Arc, Graph, Node, NodeIndex, Step};
pub use stats::GraphStats;
