pub mod cache;
pub mod client;
pub mod error;

pub use cache::ExplorerCache;
pub use client::{Continuation, ExplorerClient};
pub use error::ExplorerError;
