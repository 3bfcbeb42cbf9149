pub mod arrows;
pub mod coords;
pub mod cursor;
pub mod database;
pub mod error;
pub mod history;
pub mod movetree;
pub mod oracle;
pub mod session;

pub use error::CoreError;
pub use movetree::{MoveTree, NodeId};
pub use session::Session;
