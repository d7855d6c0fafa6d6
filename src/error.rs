use std::path::PathBuf;

use thiserror::Error;

/// Network or archive failure while retrieving the source feed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid source url {url:?}: {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("archive from {url} unreadable: {source}")]
    Archive {
        url: String,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("archive from {url} contains no csv entry")]
    NoCsvEntry { url: String },
}

/// The source feed does not match the expected tabular shape.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("expected column {0:?} missing from source feed")]
    MissingColumn(&'static str),

    #[error("row {row}, column {column:?}: cannot parse {value:?}")]
    Cell {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("reading source csv: {0}")]
    Csv(#[from] csv::Error),
}

/// The output file could not be produced.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("creating output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("writing {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("flushing {path}: {source}")]
    Flush {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Any fault in the fetch → transform → write run. Nothing is caught or
/// retried internally; the first error aborts the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Write(#[from] WriteError),
}
