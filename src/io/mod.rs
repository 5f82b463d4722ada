//! File plumbing: gz-aware readers and the two output writers.

pub mod counts;
pub mod fasta;

pub use counts::CountsWriter;
pub use fasta::FastaWriter;

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;

/// Open a text file for reading; `.gz` inputs are decompressed on the fly.
pub fn open_text(path: &Path) -> io::Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    if has_gz_extension(path) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

pub(crate) fn has_gz_extension(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("gz")
}
