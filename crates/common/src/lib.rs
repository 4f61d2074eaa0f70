//! Shared building blocks for the gallery client workspace

mod error;
mod secret;
pub mod telemetry;

pub use error::{Error, Result};
pub use secret::Secret;
