//! Path cover computation and its selection policies.

pub mod builder;
pub mod sorter;

pub use builder::{Spss, SpssStats};
pub use sorter::{ExtendingMethod, SeedingMethod, Sorter};
