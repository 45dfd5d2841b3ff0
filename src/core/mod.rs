pub mod config;
pub mod error;
pub mod types;

pub use config::PlacementConfig;
pub use error::{PlacementError, Result};
pub use types::{EntityId, Severity};
