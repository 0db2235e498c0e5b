//! Tool-path configuration
//!
//! Paths to the external executables the pipeline shells out to. The step
//! historically read these from ambient globals; here they are one explicit
//! value constructed at startup and threaded through the backend, locator,
//! and submission constructors.

use std::path::{Path, PathBuf};

/// Default mdtool location inside a Xamarin Studio install.
pub const DEFAULT_MDTOOL: &str = "/Applications/Xamarin Studio.app/Contents/MacOS/mdtool";

/// Paths to the external tools invoked by the pipeline.
#[derive(Debug, Clone)]
pub struct ToolPaths {
    /// xbuild executable
    pub xbuild: PathBuf,
    /// mdtool executable
    pub mdtool: PathBuf,
    /// xcrun, used for the PackageApplication packaging step
    pub xcrun: PathBuf,
    /// mono runtime, used to host the test-cloud runner
    pub mono: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            xbuild: PathBuf::from("xbuild"),
            mdtool: PathBuf::from(DEFAULT_MDTOOL),
            xcrun: PathBuf::from("xcrun"),
            mono: PathBuf::from("mono"),
        }
    }
}

impl ToolPaths {
    /// Resolve bare tool names against PATH where possible.
    ///
    /// Tools that cannot be resolved keep their configured value; whether a
    /// missing tool matters is decided at invocation time, since a run may
    /// only ever touch one of the two backends.
    pub fn resolved(mut self) -> Self {
        for tool in [&mut self.xbuild, &mut self.mdtool, &mut self.xcrun, &mut self.mono] {
            if tool.components().count() == 1 {
                if let Ok(found) = which::which(&*tool) {
                    *tool = found;
                }
            }
        }
        self
    }

    /// Override the xbuild executable.
    pub fn with_xbuild(mut self, path: impl Into<PathBuf>) -> Self {
        self.xbuild = path.into();
        self
    }

    /// Override the mdtool executable.
    pub fn with_mdtool(mut self, path: impl Into<PathBuf>) -> Self {
        self.mdtool = path.into();
        self
    }

    /// True when the given executable exists on disk or resolves on PATH.
    pub fn available(path: &Path) -> bool {
        path.exists() || which::which(path).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let tools = ToolPaths::default();
        assert_eq!(tools.xbuild, PathBuf::from("xbuild"));
        assert!(tools.mdtool.to_string_lossy().contains("mdtool"));
    }

    #[test]
    fn test_builder_overrides() {
        let tools = ToolPaths::default()
            .with_xbuild("/opt/mono/bin/xbuild")
            .with_mdtool("/opt/mdtool");
        assert_eq!(tools.xbuild, PathBuf::from("/opt/mono/bin/xbuild"));
        assert_eq!(tools.mdtool, PathBuf::from("/opt/mdtool"));
    }

    #[test]
    fn test_resolved_keeps_absolute_paths() {
        let tools = ToolPaths::default()
            .with_xbuild("/nonexistent/xbuild")
            .resolved();
        assert_eq!(tools.xbuild, PathBuf::from("/nonexistent/xbuild"));
    }
}
