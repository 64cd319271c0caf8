//! Error types for the progressive aligner.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for alignment operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to parse FASTA input: {0}")]
    FastaParse(String),

    #[error("failed to parse CLUSTAL input: {0}")]
    ClustalParse(String),

    #[error("input file is empty")]
    EmptyInput,

    #[error("failed to read input from '{path}': {source}")]
    ReadInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("symbol '{symbol}' has no score in the weight matrix (wrong molecule type?)")]
    IncompatibleAlphabet { symbol: char },

    #[error("invalid parameter: {0}")]
    ParameterError(String),

    #[error("failed to write output: {0}")]
    WriteOutput(#[from] io::Error),

    #[error("failed to write report to '{path}': {source}")]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write guide tree to '{path}': {source}")]
    TreeWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
