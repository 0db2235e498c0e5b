//! Application/test pair resolution
//!
//! A pure join over the reference graph: a test project is paired with every
//! application project whose identity appears in its reference set. No I/O.

use crate::descriptor::ProjectDescriptor;

/// An (application, UI-test) pair to build and submit together
#[derive(Debug, Clone)]
pub struct BuildPair {
    /// The application project
    pub app: ProjectDescriptor,
    /// The UI-test project referencing it
    pub test: ProjectDescriptor,
    /// Resolved build configuration
    pub configuration: String,
    /// Resolved build platform
    pub platform: String,
}

/// Resolve every (application, test) pair for which the test project
/// declares a reference to the application.
///
/// Pairs are emitted in application discovery order, then test discovery
/// order, keeping the build/submit sequence deterministic for the same
/// inputs. An application no test references contributes nothing; whether
/// zero pairs is fatal is the caller's decision.
pub fn resolve_pairs(
    applications: &[ProjectDescriptor],
    test_projects: &[ProjectDescriptor],
    configuration: &str,
    platform: &str,
) -> Vec<BuildPair> {
    let mut pairs = Vec::new();
    for app in applications {
        for test in test_projects {
            if test.references.contains(&app.id) {
                pairs.push(BuildPair {
                    app: app.clone(),
                    test: test.clone(),
                    configuration: configuration.to_string(),
                    platform: platform.to_string(),
                });
            }
        }
    }
    pairs
}
