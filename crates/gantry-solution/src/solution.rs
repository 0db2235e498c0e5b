//! Solution manifest parsing and project collection
//!
//! A solution manifest lists member projects one per line:
//!
//! ```text
//! Project("{TYPE-GUID}") = "Name", "Rel\Path.csproj", "{PROJECT-GUID}"
//! ```
//!
//! The graph is allowed to be partial: members that cannot be read or parsed,
//! or that do not target the requested configuration/platform, are skipped
//! with a warning rather than failing the run.

use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::warn;
use walkdir::WalkDir;

use gantry_core::error::ParseError;

use crate::descriptor::{ProjectDescriptor, ProjectKind};

/// One member entry of a solution manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionMember {
    /// Project identity (normalized GUID)
    pub id: String,
    /// Display name
    pub name: String,
    /// Descriptor path relative to the solution directory
    pub relative_path: PathBuf,
}

/// A parsed solution manifest
#[derive(Debug, Clone)]
pub struct Solution {
    path: PathBuf,
    members: Vec<SolutionMember>,
}

impl Solution {
    /// Load a solution manifest.
    pub fn load(path: &Path) -> Result<Self, ParseError> {
        if !path.exists() {
            return Err(ParseError::SolutionNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Ok(Self::parse(path, &content))
    }

    /// Parse solution content. Lines that do not match the member grammar
    /// are ignored; member order is preserved.
    pub fn parse(path: &Path, content: &str) -> Self {
        let entry = Regex::new(
            r#"^Project\("\{[0-9A-Fa-f-]+\}"\)\s*=\s*"([^"]+)",\s*"([^"]+)",\s*"\{([0-9A-Fa-f-]+)\}""#,
        )
        .expect("static regex");

        let members = content
            .lines()
            .filter_map(|line| entry.captures(line.trim()))
            .filter_map(|caps| {
                let relative = caps[2].replace('\\', "/");
                // Solution folders and similar entries carry no descriptor.
                if !Path::new(&relative)
                    .extension()
                    .map(|e| e.to_string_lossy().ends_with("proj"))
                    .unwrap_or(false)
                {
                    return None;
                }
                Some(SolutionMember {
                    id: caps[3].to_ascii_uppercase(),
                    name: caps[1].to_string(),
                    relative_path: PathBuf::from(relative),
                })
            })
            .collect();

        Self {
            path: path.to_path_buf(),
            members,
        }
    }

    /// The solution manifest path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The solution directory.
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Member entries in manifest order.
    pub fn members(&self) -> &[SolutionMember] {
        &self.members
    }

    /// Application projects (iOS kind) targeting the given configuration
    /// and platform.
    pub fn collect_applications(
        &self,
        configuration: &str,
        platform: &str,
    ) -> Vec<ProjectDescriptor> {
        self.collect(|descriptor| {
            if descriptor.kind != ProjectKind::IosApp {
                return false;
            }
            if descriptor.output_for(configuration, platform).is_none() {
                warn!(
                    project = %descriptor.name,
                    configuration, platform,
                    "project does not target the requested build group, skipping"
                );
                return false;
            }
            true
        })
    }

    /// UI-test projects targeting the given configuration. Test projects
    /// commonly declare only AnyCPU groups, so the platform token does not
    /// participate in this filter (the build dialects suppress it for
    /// test-only operations for the same reason).
    pub fn collect_test_projects(&self, configuration: &str) -> Vec<ProjectDescriptor> {
        self.collect(|descriptor| {
            if descriptor.kind != ProjectKind::UiTest {
                return false;
            }
            let targets_configuration = descriptor
                .outputs
                .keys()
                .any(|group| group.matches_configuration(configuration));
            if !targets_configuration {
                warn!(
                    project = %descriptor.name,
                    configuration,
                    "test project does not target the requested configuration, skipping"
                );
            }
            targets_configuration
        })
    }

    fn collect(&self, keep: impl Fn(&ProjectDescriptor) -> bool) -> Vec<ProjectDescriptor> {
        let mut projects = Vec::new();
        for member in &self.members {
            let descriptor_path = self.directory().join(&member.relative_path);
            let descriptor = match ProjectDescriptor::load(&descriptor_path) {
                Ok(descriptor) => descriptor,
                Err(err) => {
                    warn!(
                        member = %member.name,
                        path = %descriptor_path.display(),
                        error = %err,
                        "skipping unreadable solution member"
                    );
                    continue;
                }
            };
            if keep(&descriptor) {
                projects.push(descriptor);
            }
        }
        projects
    }
}

/// Find every solution that lists the given project, searching the tree
/// rooted two levels above the project file. Multiple owners are all
/// returned (each is consulted for test candidates); zero owners is an
/// error at this entry point.
pub fn find_owning_solutions(project_path: &Path) -> Result<Vec<PathBuf>, ParseError> {
    let project_file = project_path
        .file_name()
        .ok_or_else(|| ParseError::DescriptorNotFound(project_path.to_path_buf()))?;

    let root = project_path
        .parent()
        .and_then(Path::parent)
        .unwrap_or_else(|| Path::new("."));

    let mut owners = Vec::new();
    for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
        if entry.path().extension().map(|e| e == "sln").unwrap_or(false) {
            let solution = match Solution::load(entry.path()) {
                Ok(solution) => solution,
                Err(err) => {
                    warn!(path = %entry.path().display(), error = %err, "skipping unreadable solution");
                    continue;
                }
            };
            let lists_project = solution
                .members()
                .iter()
                .any(|m| m.relative_path.file_name() == Some(project_file));
            if lists_project {
                owners.push(entry.path().to_path_buf());
            }
        }
    }

    if owners.is_empty() {
        return Err(ParseError::NoOwningSolution(project_path.to_path_buf()));
    }
    owners.sort();
    Ok(owners)
}
