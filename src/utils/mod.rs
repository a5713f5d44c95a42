//! Utils Module - Shared Helpers
//!
//! Constants, `.env` syntax, result cache and usage telemetry.

pub mod cache;
pub mod constants;
pub mod env_file;
pub mod telemetry;

pub use cache::*;
pub use constants::*;
pub use env_file::*;
pub use telemetry::*;
