//! Infrastructure-level services shared across the server: configuration
//! parsing and logger bootstrap. This crate has no dependencies on the other
//! internal crates so every layer can consume it.

pub mod config;
pub mod logging;
