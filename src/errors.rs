use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /* ==================== Configuration errors ===================== */
    #[error("invalid thread count: must be at least 1, got {count}")]
    InvalidThreadCount { count: usize },
    #[error("invalid memory footprint {value:?}; expected e.g. '500MB', '2GB' or a plain byte count")]
    InvalidFootprint { value: String },
    #[error(
        "invalid contig output order {value:?}; expected one of as-in-reference-index, \
         as-in-reference-index-reversed, lex-ascending, lex-descending, contig-size-ascending, \
         contig-size-descending"
    )]
    InvalidContigOrder { value: String },
    #[error("invalid genomic region {value:?}; use CONTIG:START-END syntax")]
    InvalidRegion { value: String },
    #[error("haplotype holdout threshold ({threshold}) must not exceed haplotype overflow ({overflow})")]
    InvalidHoldoutThreshold { threshold: usize, overflow: usize },
    #[error("unable to read settings from {path}: {source}")]
    InvalidSettingsFile {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    /* ======================= Registry errors ======================= */
    #[error("{name} is not a valid measure; valid measures are: {known}")]
    UnknownMeasure { name: String, known: String },
    #[error("{name} is not a valid caller; valid callers are: {known}")]
    UnknownCaller { name: String, known: String },
    /* ========================= Data errors ========================= */
    #[error("candidate variant file is unsorted (record at {contig}:{pos} is behind its predecessor)")]
    UnsortedCandidateFile { contig: String, pos: u64 },
    #[error("contig {contig} not found in the candidate file header")]
    UnknownContig { contig: String },
    /* ========================== I/O errors ========================= */
    #[error("giving up reading {what} after {attempts} attempts: {source}")]
    ReadExhausted {
        what: String,
        attempts: u32,
        #[source]
        source: anyhow::Error,
    },
}

impl Error {
    /// Errors that must abort the whole run instead of failing a single
    /// region. These are user/configuration mistakes that would make every
    /// remaining region fail the same way.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::InvalidThreadCount { .. }
                | Error::InvalidFootprint { .. }
                | Error::InvalidContigOrder { .. }
                | Error::InvalidRegion { .. }
                | Error::InvalidHoldoutThreshold { .. }
                | Error::InvalidSettingsFile { .. }
                | Error::UnknownMeasure { .. }
                | Error::UnknownCaller { .. }
        )
    }
}
