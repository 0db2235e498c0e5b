//! mdtool dialect
//!
//! mdtool takes `--flag:value` pairs and a combined
//! `"configuration|platform"` token. It never emits an installable package
//! itself; the locator packages the produced application bundle afterwards.
//! Test-only cleans drop the platform from the combined token.

use std::path::{Path, PathBuf};

use gantry_core::error::BuildError;
use gantry_solution::ProjectDescriptor;

use crate::backend::{output_directory, run_tool, BackendKind, BuildBackend};

/// Build backend invoking mdtool
pub struct MdtoolBackend {
    tool: PathBuf,
}

impl MdtoolBackend {
    pub fn new(tool: PathBuf) -> Self {
        Self { tool }
    }
}

fn configuration_token(configuration: &str, platform: Option<&str>) -> String {
    match platform {
        Some(platform) => format!("--configuration:{configuration}|{platform}"),
        None => format!("--configuration:{configuration}"),
    }
}

pub(crate) fn clean_args(
    project: &Path,
    configuration: &str,
    platform: &str,
    is_test: bool,
) -> Vec<String> {
    vec![
        "-v".to_string(),
        "build".to_string(),
        project.display().to_string(),
        "--target:Clean".to_string(),
        configuration_token(configuration, (!is_test).then_some(platform)),
    ]
}

pub(crate) fn build_args(project: &Path, configuration: &str, platform: &str) -> Vec<String> {
    vec![
        "-v".to_string(),
        "build".to_string(),
        project.display().to_string(),
        configuration_token(configuration, Some(platform)),
        "--target:Build".to_string(),
    ]
}

impl BuildBackend for MdtoolBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Mdtool
    }

    fn clean(
        &self,
        project: &ProjectDescriptor,
        configuration: &str,
        platform: &str,
        is_test: bool,
    ) -> Result<(), BuildError> {
        run_tool(
            &self.tool,
            &clean_args(&project.path, configuration, platform, is_test),
        )
    }

    fn build(
        &self,
        project: &ProjectDescriptor,
        configuration: &str,
        platform: &str,
    ) -> Result<PathBuf, BuildError> {
        run_tool(
            &self.tool,
            &build_args(&project.path, configuration, platform),
        )?;
        Ok(output_directory(project, configuration, platform))
    }

    fn archive(
        &self,
        project: &ProjectDescriptor,
        configuration: &str,
        platform: &str,
    ) -> Result<PathBuf, BuildError> {
        // mdtool has no package-production switch; archiving is a plain
        // build and packaging happens during artifact discovery.
        self.build(project, configuration, platform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_args_combine_configuration_and_platform() {
        let args = clean_args(Path::new("/w/App/App.csproj"), "Release", "iPhone", false);
        assert_eq!(
            args,
            vec![
                "-v",
                "build",
                "/w/App/App.csproj",
                "--target:Clean",
                "--configuration:Release|iPhone",
            ]
        );
    }

    #[test]
    fn test_test_clean_drops_platform_token() {
        let args = clean_args(Path::new("/w/T/T.csproj"), "Release", "iPhone", true);
        assert!(args.contains(&"--configuration:Release".to_string()));
        assert!(!args.iter().any(|a| a.contains('|')));
    }

    #[test]
    fn test_build_args() {
        let args = build_args(Path::new("/w/App/App.csproj"), "Release", "iPhone");
        assert_eq!(
            args,
            vec![
                "-v",
                "build",
                "/w/App/App.csproj",
                "--configuration:Release|iPhone",
                "--target:Build",
            ]
        );
    }
}
