//! Project descriptor parsing
//!
//! Extracts the subset of a project descriptor the pipeline needs: identity,
//! API kind, per-(configuration|platform) output settings, and the identities
//! of referenced projects.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use regex::Regex;

use gantry_core::error::ParseError;

/// Project-type GUIDs identifying an iOS application project.
const IOS_TYPE_GUIDS: &[&str] = &[
    "FEACFBD2-3405-455C-9665-78FE426C6842",
    "6BC8ED88-2882-458C-8E55-DFD12B67127B",
];

/// Project-type GUID identifying an Android application project.
const ANDROID_TYPE_GUID: &str = "EFBA0AD7-5A72-4C68-AF49-83D382785DCF";

/// Assembly references marking a UI-test project.
const UITEST_REFERENCE: &str = "Xamarin.UITest";

/// Assembly references marking an iOS application project.
const IOS_REFERENCES: &[&str] = &["Xamarin.iOS", "monotouch"];

/// Assembly reference marking an Android application project.
const ANDROID_REFERENCE: &str = "Mono.Android";

/// API/platform kind of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectKind {
    /// iOS application project
    IosApp,
    /// Application project for another platform
    OtherApp,
    /// UI-test project
    UiTest,
    /// Unclassifiable; excluded from matching, never a hard error
    Unknown,
}

/// A (configuration, platform) build group key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BuildGroup {
    pub configuration: String,
    pub platform: String,
}

impl BuildGroup {
    pub fn new(configuration: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            configuration: configuration.into(),
            platform: platform.into(),
        }
    }

    /// Whitespace-insensitive match; solutions write "Any CPU" where
    /// descriptors write "AnyCPU".
    pub fn matches(&self, configuration: &str, platform: &str) -> bool {
        self.matches_configuration(configuration)
            && squash(&self.platform).eq_ignore_ascii_case(&squash(platform))
    }

    /// Configuration-only match, for operations where the platform token
    /// does not apply (test projects).
    pub fn matches_configuration(&self, configuration: &str) -> bool {
        squash(&self.configuration).eq_ignore_ascii_case(&squash(configuration))
    }
}

/// Output settings declared for one build group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSettings {
    /// Output path relative to the project directory
    pub output_path: PathBuf,
    /// Whether installable-package production was requested
    pub build_ipa: bool,
}

/// Parsed project descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectDescriptor {
    /// Project identity (normalized GUID), unique within a solution
    pub id: String,
    /// Display name
    pub name: String,
    /// Descriptor file path
    pub path: PathBuf,
    /// Classified API kind
    pub kind: ProjectKind,
    /// Declared build groups and their output settings
    pub outputs: HashMap<BuildGroup, OutputSettings>,
    /// Identities of referenced projects
    pub references: BTreeSet<String>,
}

impl ProjectDescriptor {
    /// Load and parse a descriptor file.
    pub fn load(path: &Path) -> Result<Self, ParseError> {
        if !path.exists() {
            return Err(ParseError::DescriptorNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(path, &content)
    }

    /// Parse descriptor content.
    pub fn parse(path: &Path, content: &str) -> Result<Self, ParseError> {
        let id = crate::xml::element(content, "ProjectGuid")
            .map(|g| normalize_guid(&g))
            .ok_or_else(|| ParseError::MalformedDescriptor {
                path: path.to_path_buf(),
                message: "missing ProjectGuid".to_string(),
            })?;

        let name = crate::xml::element(content, "AssemblyName").unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default()
        });

        let type_guids: Vec<String> = crate::xml::element(content, "ProjectTypeGuids")
            .map(|s| s.split(';').map(|g| normalize_guid(g)).collect())
            .unwrap_or_default();

        let assembly_refs = parse_assembly_references(content);
        let kind = classify(&type_guids, &assembly_refs);

        Ok(Self {
            id,
            name,
            path: path.to_path_buf(),
            kind,
            outputs: parse_output_groups(content),
            references: parse_project_references(content),
        })
    }

    /// Output settings for a build group, with whitespace-insensitive
    /// platform matching.
    pub fn output_for(&self, configuration: &str, platform: &str) -> Option<&OutputSettings> {
        self.outputs
            .iter()
            .find(|(group, _)| group.matches(configuration, platform))
            .map(|(_, settings)| settings)
    }

    /// Directory containing the descriptor file.
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }
}

fn squash(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Normalize a GUID: uppercase, no braces, no surrounding whitespace.
fn normalize_guid(raw: &str) -> String {
    raw.trim()
        .trim_start_matches('{')
        .trim_end_matches('}')
        .to_ascii_uppercase()
}

/// Classify a project from its type GUIDs and assembly references.
///
/// UI-test detection wins over application detection: a test project also
/// references the platform assemblies of the app it drives.
fn classify(type_guids: &[String], assembly_refs: &[String]) -> ProjectKind {
    if assembly_refs.iter().any(|r| r == UITEST_REFERENCE) {
        return ProjectKind::UiTest;
    }

    let is_ios = type_guids.iter().any(|g| IOS_TYPE_GUIDS.contains(&g.as_str()))
        || assembly_refs
            .iter()
            .any(|r| IOS_REFERENCES.iter().any(|known| r.eq_ignore_ascii_case(known)));
    if is_ios {
        return ProjectKind::IosApp;
    }

    let is_android = type_guids.iter().any(|g| g == ANDROID_TYPE_GUID)
        || assembly_refs.iter().any(|r| r == ANDROID_REFERENCE);
    if is_android {
        return ProjectKind::OtherApp;
    }

    ProjectKind::Unknown
}

/// Collect `<Reference Include="Name" …>` assembly names, stripping any
/// trailing version qualifier.
fn parse_assembly_references(content: &str) -> Vec<String> {
    let include = Regex::new(r#"Include\s*=\s*"([^",]+)"#).expect("static regex");

    crate::xml::blocks(content, "Reference")
        .iter()
        .filter_map(|(attrs, _)| include.captures(attrs))
        .map(|c| c[1].trim().to_string())
        .collect()
}

/// Collect referenced project identities from `<ProjectReference>` blocks.
fn parse_project_references(content: &str) -> BTreeSet<String> {
    crate::xml::blocks(content, "ProjectReference")
        .iter()
        .filter_map(|(_, body)| crate::xml::element(body, "Project"))
        .map(|g| normalize_guid(&g))
        .collect()
}

/// Collect `(configuration, platform)` build groups from conditioned
/// `<PropertyGroup>` blocks.
fn parse_output_groups(content: &str) -> HashMap<BuildGroup, OutputSettings> {
    let condition = Regex::new(
        r"'\$\(Configuration\)\|\$\(Platform\)'\s*==\s*'([^'|]*)\|([^']*)'",
    )
    .expect("static regex");

    let mut groups = HashMap::new();
    for (attrs, body) in crate::xml::blocks(content, "PropertyGroup") {
        let Some(caps) = condition.captures(&attrs) else {
            continue;
        };
        let group = BuildGroup::new(caps[1].trim(), caps[2].trim());

        let Some(output_path) = crate::xml::element(&body, "OutputPath") else {
            continue;
        };
        let build_ipa = crate::xml::element(&body, "BuildIpa")
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        groups.insert(
            group,
            OutputSettings {
                output_path: PathBuf::from(output_path.replace('\\', "/")),
                build_ipa,
            },
        );
    }
    groups
}
