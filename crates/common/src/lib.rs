//! Shared error plumbing used across the connecty crates.

pub mod error;

pub use error::FromMessage;
