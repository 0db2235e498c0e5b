//! CLI definition
//!
//! Every option carries a `GANTRY_*` environment binding so the step can be
//! driven either from a shell or from a CI workflow's environment.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use tracing::info;

use gantry_build::BackendKind;
use gantry_cloud::Parallelization;
use gantry_core::ToolPaths;

use crate::pipeline::{Options, SubmissionParams};

/// Build a mobile solution and submit its UI tests to a device cloud
#[derive(Debug, Parser)]
#[command(name = "gantry")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Solution manifest to process
    #[arg(long, env = "GANTRY_SOLUTION", conflicts_with = "project")]
    pub solution: Option<PathBuf>,

    /// Single project descriptor; its owning solutions are discovered
    #[arg(long, env = "GANTRY_PROJECT")]
    pub project: Option<PathBuf>,

    /// Build configuration, e.g. Release
    #[arg(long, env = "GANTRY_CONFIGURATION")]
    pub configuration: String,

    /// Build platform, e.g. iPhone
    #[arg(long, env = "GANTRY_PLATFORM")]
    pub platform: String,

    /// Build backend to invoke
    #[arg(long, env = "GANTRY_BACKEND", value_enum, default_value = "mdtool")]
    pub backend: BackendArg,

    /// Device-cloud account user
    #[arg(long, env = "GANTRY_USER")]
    pub user: String,

    /// Device-cloud API key
    #[arg(long, env = "GANTRY_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Device-selection token
    #[arg(long, env = "GANTRY_DEVICES")]
    pub devices: String,

    /// Submit asynchronously and parse the embedded JSON response
    #[arg(long = "async", env = "GANTRY_ASYNC")]
    pub is_async: bool,

    /// Test series label
    #[arg(long, env = "GANTRY_SERIES", default_value = "master")]
    pub series: String,

    /// Test-distribution strategy: by_test_fixture or by_test_chunk
    #[arg(long, env = "GANTRY_PARALLELIZATION")]
    pub parallelization: Option<Parallelization>,

    /// Free-form parameters passed through to the runner
    #[arg(long, env = "GANTRY_OTHER_PARAMETERS")]
    pub other_parameters: Option<String>,

    /// Directory receiving the result log
    #[arg(long, env = "GANTRY_DEPLOY_DIR", default_value = ".")]
    pub deploy_dir: PathBuf,

    /// Override the xbuild executable
    #[arg(long, env = "GANTRY_XBUILD_PATH")]
    pub xbuild_path: Option<PathBuf>,

    /// Override the mdtool executable
    #[arg(long, env = "GANTRY_MDTOOL_PATH")]
    pub mdtool_path: Option<PathBuf>,
}

/// Build backend argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    Xbuild,
    Mdtool,
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Xbuild => BackendKind::Xbuild,
            BackendArg::Mdtool => BackendKind::Mdtool,
        }
    }
}

impl Cli {
    /// Validate the inputs clap cannot: entry-point presence and non-empty
    /// values arriving through empty environment variables.
    pub fn validate(&self) -> anyhow::Result<()> {
        let entry = match (&self.solution, &self.project) {
            (Some(solution), _) => solution,
            (None, Some(project)) => project,
            (None, None) => bail!("either --solution or --project must be specified"),
        };
        if !entry.exists() {
            bail!("input not found at: {}", entry.display());
        }

        for (value, name) in [
            (&self.configuration, "configuration"),
            (&self.platform, "platform"),
            (&self.user, "user"),
            (&self.api_key, "api-key"),
            (&self.devices, "devices"),
        ] {
            if value.trim().is_empty() {
                bail!("no {name} specified");
            }
        }

        std::fs::create_dir_all(&self.deploy_dir)
            .with_context(|| format!("failed to create deploy dir {}", self.deploy_dir.display()))?;
        Ok(())
    }

    /// Echo the effective configuration, API key masked.
    pub fn print_configs(&self) {
        info!("Build configs:");
        if let Some(solution) = &self.solution {
            info!("- solution: {}", solution.display());
        }
        if let Some(project) = &self.project {
            info!("- project: {}", project.display());
        }
        info!("- configuration: {}", self.configuration);
        info!("- platform: {}", self.platform);
        info!("- backend: {:?}", self.backend);
        info!("Device-cloud configs:");
        info!("- user: {}", self.user);
        info!("- api key: ***");
        info!("- devices: {}", self.devices);
        info!("- async: {}", self.is_async);
        info!("- series: {}", self.series);
        info!("- parallelization: {:?}", self.parallelization);
        info!("- other parameters: {:?}", self.other_parameters);
        info!("- deploy dir: {}", self.deploy_dir.display());
    }

    /// Convert to pipeline options.
    pub fn into_options(self) -> Options {
        let mut tools = ToolPaths::default();
        if let Some(xbuild) = self.xbuild_path {
            tools = tools.with_xbuild(xbuild);
        }
        if let Some(mdtool) = self.mdtool_path {
            tools = tools.with_mdtool(mdtool);
        }

        Options {
            solution: self.solution,
            project: self.project,
            configuration: self.configuration,
            platform: self.platform,
            backend: self.backend.into(),
            tools: tools.resolved(),
            deploy_dir: self.deploy_dir,
            submission: SubmissionParams {
                user: self.user,
                api_key: self.api_key,
                devices: self.devices,
                is_async: self.is_async,
                series: self.series,
                parallelization: self.parallelization,
                other_parameters: self.other_parameters,
            },
        }
    }
}
