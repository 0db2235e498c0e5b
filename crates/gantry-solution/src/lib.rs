//! Gantry Solution - Project graph resolution
//!
//! Parses the solution manifest and the project descriptors it lists, and
//! resolves which application project is exercised by which UI-test project.

pub mod descriptor;
pub mod pairs;
pub mod solution;

mod xml;

pub use descriptor::{BuildGroup, OutputSettings, ProjectDescriptor, ProjectKind};
pub use pairs::{resolve_pairs, BuildPair};
pub use solution::{find_owning_solutions, Solution, SolutionMember};
