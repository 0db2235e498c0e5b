//! Gantry Build - Backend-agnostic build and artifact discovery
//!
//! Two build-tool dialects behind one trait, plus the backend-specific
//! logic for locating the installable package and debug-symbol bundle a
//! build leaves behind.

pub mod artifacts;
pub mod backend;
pub mod mdtool;
pub mod xbuild;

pub use artifacts::{locate_artifacts, BuildArtifacts};
pub use backend::{backend_for, BackendKind, BuildBackend};
pub use mdtool::MdtoolBackend;
pub use xbuild::XbuildBackend;
