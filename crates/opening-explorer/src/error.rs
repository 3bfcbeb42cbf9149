//! Explorer error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExplorerError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Bincode(#[from] bincode::Error),
}
