use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;

/// Simplitig FASTA writer; outputs ending in `.gz` are compressed.
pub enum FastaWriter {
    Plain(BufWriter<File>),
    Compressed(BufWriter<GzEncoder<File>>),
}

impl FastaWriter {
    pub fn create(path: &Path) -> io::Result<FastaWriter> {
        let file = File::create(path)?;
        if super::has_gz_extension(path) {
            let encoder = GzEncoder::new(file, Compression::default());
            Ok(FastaWriter::Compressed(BufWriter::new(encoder)))
        } else {
            Ok(FastaWriter::Plain(BufWriter::new(file)))
        }
    }

    fn inner(&mut self) -> &mut dyn Write {
        match self {
            FastaWriter::Plain(w) => w,
            FastaWriter::Compressed(w) => w,
        }
    }

    /// Write one record: `>id` then the sequence on a single line.
    pub fn write_record(&mut self, id: usize, sequence: &str) -> io::Result<()> {
        let w = self.inner();
        writeln!(w, ">{}", id)?;
        writeln!(w, "{}", sequence)
    }

    /// Flush buffers and, for compressed outputs, finish the gzip stream.
    pub fn finish(self) -> io::Result<()> {
        match self {
            FastaWriter::Plain(mut w) => w.flush(),
            FastaWriter::Compressed(w) => {
                let encoder = w.into_inner().map_err(|e| e.into_error())?;
                encoder.finish()?;
                Ok(())
            }
        }
    }
}
