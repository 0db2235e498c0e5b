//! The canonical build/submit pipeline
//!
//! One sequential flow: resolve solutions, collect application and UI-test
//! projects, pair them over the reference graph, then per pair build both
//! sides, locate the artifacts, and submit. The first failure aborts the
//! run; there are no retries.

use std::collections::HashSet;
use std::path::PathBuf;

use tracing::{info, warn};

use gantry_build::{backend_for, locate_artifacts, BackendKind, BuildBackend};
use gantry_cloud::{locate_runner, Parallelization, Submission};
use gantry_core::error::{GantryError, SubmissionError};
use gantry_core::ToolPaths;
use gantry_solution::{find_owning_solutions, resolve_pairs, BuildPair, Solution};

/// Device-cloud submission parameters
#[derive(Debug, Clone)]
pub struct SubmissionParams {
    pub user: String,
    pub api_key: String,
    pub devices: String,
    pub is_async: bool,
    pub series: String,
    pub parallelization: Option<Parallelization>,
    pub other_parameters: Option<String>,
}

/// Pipeline options, assembled by the CLI
#[derive(Debug, Clone)]
pub struct Options {
    pub solution: Option<PathBuf>,
    pub project: Option<PathBuf>,
    pub configuration: String,
    pub platform: String,
    pub backend: BackendKind,
    pub tools: ToolPaths,
    pub deploy_dir: PathBuf,
    pub submission: SubmissionParams,
}

fn is_same_file(a: &std::path::Path, b: &std::path::Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// The build/submit pipeline
pub struct Pipeline {
    options: Options,
    result_log: Option<String>,
}

impl Pipeline {
    pub fn new(options: Options) -> Self {
        Self {
            options,
            result_log: None,
        }
    }

    /// Content of the last result log the runner wrote, for the reporting
    /// sink.
    pub fn result_log(&self) -> Option<&str> {
        self.result_log.as_deref()
    }

    /// Run the pipeline to completion or first failure.
    pub fn run(&mut self) -> gantry_core::Result<()> {
        let solutions = self.resolve_solutions()?;
        let backend = backend_for(self.options.backend, &self.options.tools);

        let tool = match self.options.backend {
            BackendKind::Xbuild => &self.options.tools.xbuild,
            BackendKind::Mdtool => &self.options.tools.mdtool,
        };
        if !ToolPaths::available(tool) {
            warn!(tool = %tool.display(), "build tool not found on this machine; builds will fail");
        }

        let mut processed = 0usize;
        let mut seen: HashSet<(String, String)> = HashSet::new();

        for solution_path in &solutions {
            let solution = Solution::load(solution_path).map_err(GantryError::Parse)?;
            info!(solution = %solution_path.display(), "collecting projects");

            let mut applications = solution
                .collect_applications(&self.options.configuration, &self.options.platform);
            // In single-project mode the given project is the application;
            // owning solutions are only consulted for test candidates.
            if let Some(project) = &self.options.project {
                applications.retain(|app| is_same_file(&app.path, project));
            }
            let test_projects = solution.collect_test_projects(&self.options.configuration);
            let pairs = resolve_pairs(
                &applications,
                &test_projects,
                &self.options.configuration,
                &self.options.platform,
            );
            if pairs.is_empty() {
                continue;
            }

            let runner = locate_runner(solution.directory()).map_err(GantryError::Submission)?;

            for pair in pairs {
                // The same pair can surface through several owning solutions.
                if !seen.insert((pair.app.id.clone(), pair.test.id.clone())) {
                    continue;
                }
                self.process_pair(backend.as_ref(), &runner, &pair)?;
                processed += 1;
            }
        }

        if processed == 0 {
            return Err(GantryError::other(
                "no application/UI-test pairs found for the requested configuration and platform",
            ));
        }
        Ok(())
    }

    fn resolve_solutions(&self) -> gantry_core::Result<Vec<PathBuf>> {
        if let Some(solution) = &self.options.solution {
            return Ok(vec![solution.clone()]);
        }
        let project = self
            .options
            .project
            .as_ref()
            .ok_or_else(|| GantryError::other("no solution or project specified"))?;
        let owners = find_owning_solutions(project).map_err(GantryError::Parse)?;
        info!(count = owners.len(), "solutions listing the project");
        Ok(owners)
    }

    fn process_pair(
        &mut self,
        backend: &dyn BuildBackend,
        runner: &PathBuf,
        pair: &BuildPair,
    ) -> gantry_core::Result<()> {
        let configuration = &pair.configuration;
        let platform = &pair.platform;

        info!(
            app = %pair.app.name,
            test = %pair.test.name,
            "building pair"
        );

        let requests_package = pair
            .app
            .output_for(configuration, platform)
            .map(|settings| settings.build_ipa)
            .unwrap_or(false);
        if !requests_package {
            warn!(
                project = %pair.app.name,
                "build group does not request a package; archiving anyway"
            );
        }

        backend.clean(&pair.app, configuration, platform, false)?;
        let app_output = backend.archive(&pair.app, configuration, platform)?;

        backend.clean(&pair.test, configuration, platform, true)?;
        let test_output = backend.build(&pair.test, configuration, platform)?;

        let artifacts = locate_artifacts(backend.kind(), &app_output, &self.options.tools)?;
        info!(package = %artifacts.package.display(), "package resolved");
        if let Some(symbols) = &artifacts.symbols {
            info!(symbols = %symbols.display(), "symbol bundle resolved");
        }

        let params = &self.options.submission;
        let submission = Submission::new(
            runner.clone(),
            self.options.tools.mono.clone(),
            params.api_key.clone(),
            params.user.clone(),
            params.devices.clone(),
            self.options.deploy_dir.join("TestResult.xml"),
        )
        .with_async(params.is_async)
        .with_series(Some(params.series.clone()))
        .with_parallelization(params.parallelization)
        .with_symbols(artifacts.symbols.clone())
        .with_extra_parameters(params.other_parameters.as_deref());

        info!(
            test = %pair.test.name,
            app = %pair.app.name,
            "submitting to device cloud"
        );
        let result = submission
            .submit(&artifacts.package, &test_output)
            .map_err(GantryError::Submission)?;

        self.result_log = result.log.clone();

        if let Some(id) = &result.test_run_id {
            info!("test run id: {id}");
        }

        if !result.passed {
            if let Some(log) = &result.log {
                info!("result log:\n{log}");
            }
            let err = if result.errors.is_empty() {
                SubmissionError::ExitFailure {
                    code: result.exit_code,
                }
            } else {
                SubmissionError::ServiceRejected(result.errors)
            };
            return Err(GantryError::Submission(err));
        }
        Ok(())
    }
}
