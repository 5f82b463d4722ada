use thiserror::Error;

/// Errors that abort processing of the current input file.
///
/// In batch mode these are reported and the next file proceeds; in
/// single-file mode they terminate the process with a non-zero exit code.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("format error at line {line}: {message}")]
    Format { line: usize, message: String },

    #[error(
        "node {serial}: {length} bp unitig needs {expected} abundances, found {found} (k = {kmer_size})"
    )]
    AbundanceMismatch {
        serial: usize,
        length: usize,
        expected: usize,
        found: usize,
        kmer_size: usize,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn format(line: usize, message: impl Into<String>) -> Self {
        Error::Format {
            line,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
