//! Common types shared across the crate.
//!
//! [`error`] defines the crate error type; [`xml`] the XML tree every package
//! part is edited through.

pub mod error;
pub mod xml;

pub use error::{Error, Result};
