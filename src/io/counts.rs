use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;

/// Counts stream writer: one count per line in plain mode, `value length`
/// pairs in the RLE modes. Outputs ending in `.gz` are compressed.
pub enum CountsWriter {
    Plain(BufWriter<File>),
    Compressed(BufWriter<GzEncoder<File>>),
}

impl CountsWriter {
    pub fn create(path: &Path) -> io::Result<CountsWriter> {
        let file = File::create(path)?;
        if super::has_gz_extension(path) {
            let encoder = GzEncoder::new(file, Compression::default());
            Ok(CountsWriter::Compressed(BufWriter::new(encoder)))
        } else {
            Ok(CountsWriter::Plain(BufWriter::new(file)))
        }
    }

    fn inner(&mut self) -> &mut dyn Write {
        match self {
            CountsWriter::Plain(w) => w,
            CountsWriter::Compressed(w) => w,
        }
    }

    pub fn write_count(&mut self, count: u32) -> io::Result<()> {
        writeln!(self.inner(), "{}", count)
    }

    pub fn write_run(&mut self, value: u32, length: u64) -> io::Result<()> {
        writeln!(self.inner(), "{} {}", value, length)
    }

    pub fn finish(self) -> io::Result<()> {
        match self {
            CountsWriter::Plain(mut w) => w.flush(),
            CountsWriter::Compressed(w) => {
                let encoder = w.into_inner().map_err(|e| e.into_error())?;
                encoder.finish()?;
                Ok(())
            }
        }
    }
}
