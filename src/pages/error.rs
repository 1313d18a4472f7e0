use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or selecting pages.
#[derive(Debug, Error)]
pub enum PageError {
    /// Grid column count must be at least one.
    #[error("Invalid column count {columns}: must be at least 1")]
    InvalidColumns { columns: usize },

    /// The page directory contains no page images.
    #[error("No page images found in {}", dir.display())]
    NoPages { dir: PathBuf },

    /// Reading the page directory or one of its files failed.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
