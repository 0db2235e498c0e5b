//! Submission invocation and result interpretation
//!
//! Builds the runner invocation from the submission parameters, executes it
//! once, and drains its combined output concurrently with the child's
//! execution: each line is echoed live and buffered for payload extraction,
//! without re-reading the process (the stream exists only once).

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::str::FromStr;
use std::sync::mpsc;
use std::thread;

use tracing::{info, warn};

use gantry_core::error::SubmissionError;

use crate::response::{extract_payload, verdict};

/// Test-distribution strategy; the two chunking flags are mutually
/// exclusive by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parallelization {
    /// One chunk per test fixture
    ByTestFixture,
    /// One chunk per test case
    ByTestChunk,
}

impl Parallelization {
    /// The runner flag selecting this strategy.
    pub fn flag(&self) -> &'static str {
        match self {
            Parallelization::ByTestFixture => "--fixture-chunk",
            Parallelization::ByTestChunk => "--test-chunk",
        }
    }
}

impl FromStr for Parallelization {
    type Err = SubmissionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "by_test_fixture" => Ok(Parallelization::ByTestFixture),
            "by_test_chunk" => Ok(Parallelization::ByTestChunk),
            other => Err(SubmissionError::InvalidParameter(format!(
                "unknown parallelization: {other}"
            ))),
        }
    }
}

/// Outcome of one submission
#[derive(Debug, Clone)]
pub struct SubmissionResult {
    /// Overall verdict: exit-status success and, in async mode, no
    /// structured service errors
    pub passed: bool,
    /// Job identifier extracted in async mode, when present
    pub test_run_id: Option<String>,
    /// Service-reported error messages
    pub errors: Vec<String>,
    /// Content of the runner's result-log file, when it was written
    pub log: Option<String>,
    /// Child exit code
    pub exit_code: Option<i32>,
}

/// A configured submission to the device-test service
#[derive(Debug, Clone)]
pub struct Submission {
    runner: PathBuf,
    mono: PathBuf,
    api_key: String,
    user: String,
    devices: String,
    result_log: PathBuf,
    async_json: bool,
    series: Option<String>,
    parallelization: Option<Parallelization>,
    symbols: Option<PathBuf>,
    extra_args: Vec<String>,
}

impl Submission {
    pub fn new(
        runner: PathBuf,
        mono: PathBuf,
        api_key: impl Into<String>,
        user: impl Into<String>,
        devices: impl Into<String>,
        result_log: PathBuf,
    ) -> Self {
        Self {
            runner,
            mono,
            api_key: api_key.into(),
            user: user.into(),
            devices: devices.into(),
            result_log,
            async_json: false,
            series: None,
            parallelization: None,
            symbols: None,
            extra_args: Vec::new(),
        }
    }

    /// Request asynchronous completion with an embedded JSON payload.
    pub fn with_async(mut self, async_json: bool) -> Self {
        self.async_json = async_json;
        self
    }

    /// Label the run with a test series.
    pub fn with_series(mut self, series: Option<String>) -> Self {
        self.series = series;
        self
    }

    /// Select a test-distribution strategy.
    pub fn with_parallelization(mut self, parallelization: Option<Parallelization>) -> Self {
        self.parallelization = parallelization;
        self
    }

    /// Attach a debug-symbol bundle.
    pub fn with_symbols(mut self, symbols: Option<PathBuf>) -> Self {
        self.symbols = symbols;
        self
    }

    /// Append free-form passthrough parameters, whitespace-separated.
    pub fn with_extra_parameters(mut self, parameters: Option<&str>) -> Self {
        self.extra_args = parameters
            .map(|p| p.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        self
    }

    /// Arguments handed to the mono runtime, runner first.
    pub fn args(&self, package: &Path, assembly_dir: &Path) -> Vec<String> {
        let mut args = vec![
            self.runner.display().to_string(),
            "submit".to_string(),
            package.display().to_string(),
            self.api_key.clone(),
            "--user".to_string(),
            self.user.clone(),
            "--devices".to_string(),
            self.devices.clone(),
            "--assembly-dir".to_string(),
            assembly_dir.display().to_string(),
            "--nunit-xml".to_string(),
            self.result_log.display().to_string(),
        ];
        if self.async_json {
            args.push("--async-json".to_string());
        }
        if let Some(symbols) = &self.symbols {
            args.push("--dsym".to_string());
            args.push(symbols.display().to_string());
        }
        if let Some(series) = &self.series {
            args.push("--series".to_string());
            args.push(series.clone());
        }
        if let Some(parallelization) = self.parallelization {
            args.push(parallelization.flag().to_string());
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }

    /// Printable form of the invocation with the API key masked.
    pub fn printable(&self, package: &Path, assembly_dir: &Path) -> String {
        let args: Vec<String> = self
            .args(package, assembly_dir)
            .into_iter()
            .map(|arg| {
                if arg == self.api_key {
                    "***".to_string()
                } else {
                    arg
                }
            })
            .collect();
        format!("{} {}", self.mono.display(), args.join(" "))
    }

    /// Submit the package and test assembly, returning the interpreted
    /// result. Spawn and stream failures are errors; a failed run is an
    /// `Ok` result with `passed == false`.
    pub fn submit(
        &self,
        package: &Path,
        assembly_dir: &Path,
    ) -> Result<SubmissionResult, SubmissionError> {
        let printable = self.printable(package, assembly_dir);
        info!("$ {printable}");

        let mut child = Command::new(&self.mono)
            .args(self.args(package, assembly_dir))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| SubmissionError::SpawnFailed {
                command: printable,
                source,
            })?;

        // Drain both pipes while the child runs; an unread pipe would fill
        // and deadlock the runner on large streamed output.
        let (sender, receiver) = mpsc::channel::<String>();
        let mut readers = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_reader(stdout, sender.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_reader(stderr, sender.clone()));
        }
        drop(sender);

        let mut lines = Vec::new();
        for line in receiver {
            info!("{line}");
            lines.push(line);
        }
        for reader in readers {
            let _ = reader.join();
        }

        let status = child.wait()?;

        let payload = if self.async_json {
            let payload = extract_payload(&lines);
            match &payload {
                Some(payload) if !payload.test_run_id.is_empty() => {
                    info!(test_run_id = %payload.test_run_id, "run accepted");
                }
                _ => warn!("no job identifier found in async response"),
            }
            payload
        } else {
            None
        };

        for message in payload.iter().flat_map(|p| &p.error_messages) {
            warn!("service error: {message}");
        }

        let log = self.read_result_log();
        Ok(SubmissionResult {
            passed: verdict(status.success(), self.async_json, payload.as_ref()),
            test_run_id: payload
                .as_ref()
                .filter(|p| !p.test_run_id.is_empty())
                .map(|p| p.test_run_id.clone()),
            errors: payload.map(|p| p.error_messages).unwrap_or_default(),
            log,
            exit_code: status.code(),
        })
    }

    /// The runner writes its result log as a side effect at a fixed path;
    /// absence is tolerated.
    fn read_result_log(&self) -> Option<String> {
        if !self.result_log.exists() {
            warn!(path = %self.result_log.display(), "no result log written");
            return None;
        }
        match std::fs::read_to_string(&self.result_log) {
            Ok(content) => Some(content),
            Err(err) => {
                warn!(path = %self.result_log.display(), error = %err, "failed to read result log");
                None
            }
        }
    }
}

fn spawn_reader(
    stream: impl std::io::Read + Send + 'static,
    sender: mpsc::Sender<String>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for line in BufReader::new(stream).lines() {
            let Ok(line) = line else { break };
            if sender.send(line).is_err() {
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission() -> Submission {
        Submission::new(
            PathBuf::from("/w/packages/Xamarin.UITest.1.0.0/tools/test-cloud.exe"),
            PathBuf::from("mono"),
            "0123456789abcdef",
            "ci@example.com",
            "device-set-token",
            PathBuf::from("/deploy/TestResult.xml"),
        )
    }

    #[test]
    fn test_args_minimal() {
        let args = submission().args(Path::new("/out/App.ipa"), Path::new("/out/tests"));
        assert_eq!(
            args,
            vec![
                "/w/packages/Xamarin.UITest.1.0.0/tools/test-cloud.exe",
                "submit",
                "/out/App.ipa",
                "0123456789abcdef",
                "--user",
                "ci@example.com",
                "--devices",
                "device-set-token",
                "--assembly-dir",
                "/out/tests",
                "--nunit-xml",
                "/deploy/TestResult.xml",
            ]
        );
    }

    #[test]
    fn test_args_with_options() {
        let args = submission()
            .with_async(true)
            .with_symbols(Some(PathBuf::from("/out/App.app.dSYM")))
            .with_series(Some("master".to_string()))
            .with_parallelization(Some(Parallelization::ByTestFixture))
            .with_extra_parameters(Some("--category smoke"))
            .args(Path::new("/out/App.ipa"), Path::new("/out/tests"));

        assert!(args.contains(&"--async-json".to_string()));
        assert!(args.contains(&"--dsym".to_string()));
        assert!(args.contains(&"--series".to_string()));
        assert!(args.contains(&"--fixture-chunk".to_string()));
        assert!(!args.contains(&"--test-chunk".to_string()));
        let category = args.iter().position(|a| a == "--category").unwrap();
        assert_eq!(args[category + 1], "smoke");
    }

    #[test]
    fn test_printable_masks_api_key() {
        let printable = submission().printable(Path::new("/out/App.ipa"), Path::new("/out/tests"));
        assert!(!printable.contains("0123456789abcdef"));
        assert!(printable.contains("***"));
    }

    #[test]
    fn test_parallelization_parsing() {
        assert_eq!(
            "by_test_fixture".parse::<Parallelization>().unwrap(),
            Parallelization::ByTestFixture
        );
        assert_eq!(
            "by_test_chunk".parse::<Parallelization>().unwrap(),
            Parallelization::ByTestChunk
        );
        assert!("none".parse::<Parallelization>().is_err());
    }

    /// Stand-in runner: a shell script played through `sh`, so the full
    /// spawn/drain/interpret path runs without mono on the machine.
    fn fake_runner(dir: &Path, script: &str) -> Submission {
        let path = dir.join("fake-runner.sh");
        std::fs::write(&path, script).unwrap();
        Submission::new(
            path,
            PathBuf::from("sh"),
            "key",
            "user",
            "devices",
            dir.join("TestResult.xml"),
        )
    }

    #[test]
    fn test_submit_accepted_async_run() {
        let dir = tempfile::tempdir().unwrap();
        let submission = fake_runner(
            dir.path(),
            "echo uploading\necho '{\"TestRunId\":\"abc123\",\"ErrorMessages\":[]}'\n",
        )
        .with_async(true);

        let result = submission
            .submit(Path::new("/out/App.ipa"), Path::new("/out/tests"))
            .unwrap();
        assert!(result.passed);
        assert_eq!(result.test_run_id.as_deref(), Some("abc123"));
        assert!(result.errors.is_empty());
        assert_eq!(result.exit_code, Some(0));
    }

    #[test]
    fn test_submit_service_rejection_fails_despite_zero_exit() {
        let dir = tempfile::tempdir().unwrap();
        let submission = fake_runner(
            dir.path(),
            "echo '{\"TestRunId\":\"abc123\",\"ErrorMessages\":[\"Invalid device\"]}'\n",
        )
        .with_async(true);

        let result = submission
            .submit(Path::new("/out/App.ipa"), Path::new("/out/tests"))
            .unwrap();
        assert!(!result.passed);
        assert_eq!(result.errors, vec!["Invalid device".to_string()]);
        assert_eq!(result.exit_code, Some(0));
    }

    #[test]
    fn test_submit_nonzero_exit_fails_regardless_of_output() {
        let dir = tempfile::tempdir().unwrap();
        let submission = fake_runner(
            dir.path(),
            "echo '{\"TestRunId\":\"abc123\",\"ErrorMessages\":[]}'\nexit 3\n",
        )
        .with_async(true);

        let result = submission
            .submit(Path::new("/out/App.ipa"), Path::new("/out/tests"))
            .unwrap();
        assert!(!result.passed);
        assert_eq!(result.exit_code, Some(3));
    }

    #[test]
    fn test_submit_reads_result_log() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("TestResult.xml");
        let script = format!("echo '<test-results/>' > {}\n", log_path.display());
        let submission = fake_runner(dir.path(), &script);

        let result = submission
            .submit(Path::new("/out/App.ipa"), Path::new("/out/tests"))
            .unwrap();
        assert!(result.passed);
        assert_eq!(result.log.as_deref(), Some("<test-results/>\n"));
    }
}
