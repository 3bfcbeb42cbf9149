pub mod display;
pub mod engine;
pub mod error;
pub mod options;
pub mod session;

pub use engine::{InfoLine, UciEngine};
pub use error::AnalysisError;
pub use session::{AnalysisHandle, AnalysisRequest, AnalysisUpdate};
