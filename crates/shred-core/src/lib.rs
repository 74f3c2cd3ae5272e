//! shred-core: types and configuration shared by the shred crates

pub mod config;
pub mod error;
pub mod types;

pub use config::ShredConfig;
pub use error::{ShredError, ShredResult};
pub use types::{KeyGeneration, SubjectId};
