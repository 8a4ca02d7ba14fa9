//! Error type shared by every stage of a build.
//!
//! Each stage raises the kind that names its failure; callers see the
//! originating error unchanged.

// Submodule declarations
pub mod types;
pub mod conversions;

// Re-exports
pub use types::{Error, Result};
