use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{export} export is missing required column(s): {}", .columns.join(", "))]
    MissingColumns {
        export: &'static str,
        columns: Vec<String>,
    },

    #[error("{} contains no data rows", .path.display())]
    Empty { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, LoadError>;
