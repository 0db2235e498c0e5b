//! Build backend abstraction
//!
//! The two supported build tools differ in argument grammar, not just in
//! executable. Dialect-specific argument assembly lives entirely inside
//! each implementation; pipeline code only branches on `BackendKind` when
//! selecting the artifact-discovery strategy.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::info;

use gantry_core::error::BuildError;
use gantry_core::ToolPaths;
use gantry_solution::ProjectDescriptor;

use crate::mdtool::MdtoolBackend;
use crate::xbuild::XbuildBackend;

/// Identity of a build backend, used only for artifact-discovery selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// xbuild: `/property:Key=Value` flags, separate configuration and
    /// platform properties
    Xbuild,
    /// mdtool: `--flag:value` pairs, combined `"configuration|platform"`
    /// token
    Mdtool,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Xbuild => "xbuild",
            BackendKind::Mdtool => "mdtool",
        }
    }
}

/// A build tool capable of cleaning, building, and archiving projects.
///
/// Every operation is a single blocking child process; success is defined
/// strictly by the exit status. Any non-zero exit aborts the whole run,
/// clean failures included.
pub trait BuildBackend {
    /// Backend identity, for artifact-discovery selection.
    fn kind(&self) -> BackendKind;

    /// Clean a project. Test-only cleans suppress the platform token in
    /// both dialects.
    fn clean(
        &self,
        project: &ProjectDescriptor,
        configuration: &str,
        platform: &str,
        is_test: bool,
    ) -> Result<(), BuildError>;

    /// Build a project, returning the output directory.
    fn build(
        &self,
        project: &ProjectDescriptor,
        configuration: &str,
        platform: &str,
    ) -> Result<PathBuf, BuildError>;

    /// Build a project requesting installable-package production where the
    /// backend supports it natively, returning the output directory.
    fn archive(
        &self,
        project: &ProjectDescriptor,
        configuration: &str,
        platform: &str,
    ) -> Result<PathBuf, BuildError>;
}

/// Construct the backend for the given kind.
pub fn backend_for(kind: BackendKind, tools: &ToolPaths) -> Box<dyn BuildBackend> {
    match kind {
        BackendKind::Xbuild => Box::new(XbuildBackend::new(tools.xbuild.clone())),
        BackendKind::Mdtool => Box::new(MdtoolBackend::new(tools.mdtool.clone())),
    }
}

/// Conventional output directory for a build: `bin/<platform>/<configuration>`
/// under the project directory.
pub(crate) fn output_directory(
    project: &ProjectDescriptor,
    configuration: &str,
    platform: &str,
) -> PathBuf {
    project
        .directory()
        .join("bin")
        .join(platform)
        .join(configuration)
}

/// Run a build tool to completion, streaming its output to the console.
pub(crate) fn run_tool(program: &Path, args: &[String]) -> Result<(), BuildError> {
    let printable = format!("{} {}", program.display(), args.join(" "));
    info!("$ {printable}");

    let status = Command::new(program)
        .args(args)
        .status()
        .map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => {
                BuildError::ToolNotFound(program.display().to_string())
            }
            _ => BuildError::SpawnFailed {
                command: printable.clone(),
                source,
            },
        })?;

    if !status.success() {
        return Err(BuildError::CommandFailed {
            command: printable,
            code: status.code(),
        });
    }
    Ok(())
}
