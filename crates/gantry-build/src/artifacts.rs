//! Artifact discovery
//!
//! Locates the installable package and debug-symbol bundle a build left
//! under its output directory. xbuild emits the package directly when
//! archiving was requested; mdtool leaves an application bundle that has to
//! be run through the platform packaging utility first. Symbol discovery is
//! independent of packaging and never fatal.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{info, warn};

use gantry_core::error::ArtifactError;
use gantry_core::ToolPaths;

use crate::backend::BackendKind;

/// Resolved artifacts for one built application project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifacts {
    /// Installable package path
    pub package: PathBuf,
    /// Debug-symbol bundle path, when one was produced
    pub symbols: Option<PathBuf>,
}

/// Locate the package and symbol bundle under a build's output directory.
pub fn locate_artifacts(
    kind: BackendKind,
    output_dir: &Path,
    tools: &ToolPaths,
) -> Result<BuildArtifacts, ArtifactError> {
    let package = match kind {
        BackendKind::Xbuild => find_package(output_dir)?,
        BackendKind::Mdtool => package_bundle(output_dir, tools)?,
    };

    let search_dir = package.parent().unwrap_or(output_dir);
    Ok(BuildArtifacts {
        symbols: find_symbols(search_dir),
        package,
    })
}

/// Find the package xbuild emitted under the output tree. Zero matches is
/// fatal; with more than one the first is used and the rest reported.
fn find_package(output_dir: &Path) -> Result<PathBuf, ArtifactError> {
    let matches = glob_paths(&format!("{}/**/*.ipa", output_dir.display()));
    match matches.as_slice() {
        [] => Err(ArtifactError::PackageNotFound(output_dir.to_path_buf())),
        [package] => Ok(package.canonicalize()?),
        [package, rest @ ..] => {
            warn!(
                package = %package.display(),
                others = rest.len(),
                "multiple packages found, using the first"
            );
            Ok(package.canonicalize()?)
        }
    }
}

/// Resolve mdtool's application bundle and produce the installable package
/// from it when one does not already exist.
fn package_bundle(output_dir: &Path, tools: &ToolPaths) -> Result<PathBuf, ArtifactError> {
    let bundles = glob_paths(&format!("{}/*.app", output_dir.display()));
    let Some(bundle) = bundles.first() else {
        return Err(ArtifactError::BundleNotFound(output_dir.to_path_buf()));
    };

    // The bundle may be reached through symlink indirection; package next
    // to its real location.
    let bundle = bundle.canonicalize()?;
    let stem = bundle
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "Application".to_string());
    let bundle_dir = bundle.parent().unwrap_or(output_dir).to_path_buf();
    let package = bundle_dir.join(format!("{stem}.ipa"));

    if package.exists() {
        return Ok(package);
    }

    // Package into a run-scoped temp dir first, then copy into place; the
    // temp dir is removed on every exit path.
    let staging = tempfile::tempdir()?;
    let staged = staging.path().join(format!("{stem}.ipa"));
    run_packaging(&tools.xcrun, &bundle, &staged)?;
    std::fs::copy(&staged, &package)?;

    info!(package = %package.display(), "packaged application bundle");
    Ok(package)
}

pub(crate) fn packaging_args(bundle: &Path, package: &Path) -> Vec<String> {
    vec![
        "-sdk".to_string(),
        "iphoneos".to_string(),
        "PackageApplication".to_string(),
        "-v".to_string(),
        bundle.display().to_string(),
        "-o".to_string(),
        package.display().to_string(),
    ]
}

fn run_packaging(xcrun: &Path, bundle: &Path, package: &Path) -> Result<(), ArtifactError> {
    let args = packaging_args(bundle, package);
    let printable = format!("{} {}", xcrun.display(), args.join(" "));
    info!("$ {printable}");

    let status = Command::new(xcrun)
        .args(&args)
        .status()
        .map_err(ArtifactError::Io)?;

    if !status.success() {
        return Err(ArtifactError::PackagingFailed {
            command: printable,
            code: status.code(),
        });
    }
    Ok(())
}

/// Find the debug-symbol bundle next to the package, also consulting a
/// structured archive's own dSYMs subfolder. Missing symbols are a
/// warning, never an error.
pub fn find_symbols(search_dir: &Path) -> Option<PathBuf> {
    let mut matches = glob_paths(&format!("{}/*.app.dSYM", search_dir.display()));
    if matches.is_empty() {
        matches = glob_paths(&format!("{}/dSYMs/*.app.dSYM", search_dir.display()));
    }

    match matches.as_slice() {
        [] => {
            warn!(dir = %search_dir.display(), "no symbol bundle found, continuing without symbols");
            None
        }
        [symbols] => Some(symbols.clone()),
        [symbols, rest @ ..] => {
            warn!(
                symbols = %symbols.display(),
                others = rest.len(),
                "multiple symbol bundles found, using the first"
            );
            Some(symbols.clone())
        }
    }
}

fn glob_paths(pattern: &str) -> Vec<PathBuf> {
    match glob::glob(pattern) {
        Ok(paths) => paths.filter_map(|p| p.ok()).collect(),
        Err(err) => {
            warn!(pattern, error = %err, "invalid glob pattern");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tools() -> ToolPaths {
        ToolPaths::default()
    }

    #[test]
    fn test_xbuild_package_found() {
        let dir = tempfile::tempdir().unwrap();
        let ipa = dir.path().join("App.ipa");
        std::fs::write(&ipa, b"ipa").unwrap();

        let artifacts = locate_artifacts(BackendKind::Xbuild, dir.path(), &tools()).unwrap();
        assert_eq!(artifacts.package, ipa.canonicalize().unwrap());
        assert_eq!(artifacts.symbols, None);
    }

    #[test]
    fn test_xbuild_zero_packages_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let result = locate_artifacts(BackendKind::Xbuild, dir.path(), &tools());
        assert!(matches!(result, Err(ArtifactError::PackageNotFound(_))));
    }

    #[test]
    fn test_xbuild_package_found_in_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("App.iOS");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("App.ipa"), b"ipa").unwrap();

        let artifacts = locate_artifacts(BackendKind::Xbuild, dir.path(), &tools()).unwrap();
        assert!(artifacts.package.ends_with("App.ipa"));
    }

    #[test]
    fn test_symbols_found_next_to_package() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("App.ipa"), b"ipa").unwrap();
        std::fs::create_dir(dir.path().join("App.app.dSYM")).unwrap();

        let artifacts = locate_artifacts(BackendKind::Xbuild, dir.path(), &tools()).unwrap();
        assert!(artifacts
            .symbols
            .as_ref()
            .map(|p| p.ends_with("App.app.dSYM"))
            .unwrap_or(false));
    }

    #[test]
    fn test_symbols_found_in_archive_subfolder() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("dSYMs/App.app.dSYM")).unwrap();

        let symbols = find_symbols(dir.path()).unwrap();
        assert!(symbols.ends_with("dSYMs/App.app.dSYM"));
    }

    #[test]
    fn test_mdtool_missing_bundle_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let result = locate_artifacts(BackendKind::Mdtool, dir.path(), &tools());
        assert!(matches!(result, Err(ArtifactError::BundleNotFound(_))));
    }

    #[test]
    fn test_mdtool_existing_package_skips_packaging() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("Foo.app")).unwrap();
        std::fs::write(dir.path().join("Foo.ipa"), b"ipa").unwrap();

        // The packaging tool is never invoked when the package already
        // exists, so this passes without xcrun on the machine.
        let artifacts = locate_artifacts(BackendKind::Mdtool, dir.path(), &tools()).unwrap();
        assert!(artifacts.package.ends_with("Foo.ipa"));
    }

    #[test]
    fn test_mdtool_failed_packaging_yields_no_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("Foo.app")).unwrap();

        let mut broken = ToolPaths::default();
        broken.xcrun = PathBuf::from("false");
        let result = locate_artifacts(BackendKind::Mdtool, dir.path(), &broken);
        assert!(matches!(
            result,
            Err(ArtifactError::PackagingFailed { .. })
        ));
    }

    #[test]
    fn test_packaging_args() {
        let args = packaging_args(Path::new("/out/Foo.app"), Path::new("/tmp/Foo.ipa"));
        assert_eq!(
            args,
            vec![
                "-sdk",
                "iphoneos",
                "PackageApplication",
                "-v",
                "/out/Foo.app",
                "-o",
                "/tmp/Foo.ipa",
            ]
        );
    }
}
