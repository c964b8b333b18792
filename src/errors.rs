// src/errors.rs

//! Error aliases for the crate.
//!
//! Everything currently flows through `anyhow`; re-exporting here keeps a
//! single place to introduce structured error types if the tool grows ones.

pub use anyhow::{Error, Result};
