//! xbuild dialect
//!
//! xbuild takes `/t:` targets and `/p:Key=Value` properties, with separate
//! configuration and platform properties. Archiving requests the package
//! natively via `/p:BuildIpa=true`, so the locator only has to glob for it.

use std::path::{Path, PathBuf};

use gantry_core::error::BuildError;
use gantry_solution::ProjectDescriptor;

use crate::backend::{output_directory, run_tool, BackendKind, BuildBackend};

/// Build backend invoking xbuild
pub struct XbuildBackend {
    tool: PathBuf,
}

impl XbuildBackend {
    pub fn new(tool: PathBuf) -> Self {
        Self { tool }
    }
}

/// Relative output path passed to the tool; trailing separator is part of
/// the property grammar.
fn output_property(configuration: &str, platform: &str) -> String {
    format!("/p:OutputPath=bin/{platform}/{configuration}/")
}

pub(crate) fn clean_args(
    project: &Path,
    configuration: &str,
    platform: &str,
    is_test: bool,
) -> Vec<String> {
    let mut args = vec![
        project.display().to_string(),
        "/t:Clean".to_string(),
        format!("/p:Configuration={configuration}"),
    ];
    if !is_test {
        args.push(format!("/p:Platform={platform}"));
    }
    args
}

pub(crate) fn build_args(
    project: &Path,
    configuration: &str,
    platform: &str,
    build_ipa: bool,
) -> Vec<String> {
    let mut args = vec![
        project.display().to_string(),
        "/t:Build".to_string(),
        format!("/p:Configuration={configuration}"),
        format!("/p:Platform={platform}"),
    ];
    if build_ipa {
        args.push("/p:BuildIpa=true".to_string());
    }
    args.push(output_property(configuration, platform));
    args
}

impl BuildBackend for XbuildBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Xbuild
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
            &build_args(&project.path, configuration, platform, false),
        )?;
        Ok(output_directory(project, configuration, platform))
    }

    fn archive(
        &self,
        project: &ProjectDescriptor,
        configuration: &str,
        platform: &str,
    ) -> Result<PathBuf, BuildError> {
        run_tool(
            &self.tool,
            &build_args(&project.path, configuration, platform, true),
        )?;
        Ok(output_directory(project, configuration, platform))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_args() {
        let args = clean_args(Path::new("/w/App/App.csproj"), "Release", "iPhone", false);
        assert_eq!(
            args,
            vec![
                "/w/App/App.csproj",
                "/t:Clean",
                "/p:Configuration=Release",
                "/p:Platform=iPhone",
            ]
        );
    }

    #[test]
    fn test_test_clean_suppresses_platform() {
        let args = clean_args(Path::new("/w/T/T.csproj"), "Release", "iPhone", true);
        assert!(!args.iter().any(|a| a.starts_with("/p:Platform")));
    }

    #[test]
    fn test_build_args() {
        let args = build_args(Path::new("/w/App/App.csproj"), "Release", "iPhone", false);
        assert_eq!(
            args,
            vec![
                "/w/App/App.csproj",
                "/t:Build",
                "/p:Configuration=Release",
                "/p:Platform=iPhone",
                "/p:OutputPath=bin/iPhone/Release/",
            ]
        );
    }

    #[test]
    fn test_archive_requests_package() {
        let args = build_args(Path::new("/w/App/App.csproj"), "Release", "iPhone", true);
        assert!(args.contains(&"/p:BuildIpa=true".to_string()));
    }
}
