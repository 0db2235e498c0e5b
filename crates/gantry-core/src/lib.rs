//! Gantry Core - Shared types for the gantry device-cloud test step
//!
//! This crate provides the error taxonomy and the explicit tool-path
//! configuration threaded through the solution, build, and cloud layers.

pub mod config;
pub mod error;

pub use config::ToolPaths;
pub use error::{ArtifactError, BuildError, GantryError, ParseError, Result, SubmissionError};
