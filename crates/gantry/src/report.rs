//! Result reporting boundary
//!
//! The CI host learns the outcome through a sink accepting the success flag
//! and the result-log text. Reporting is best-effort: a sink failure is
//! logged and never turns a finished run into a failed one.

use std::io::Write;
use std::path::PathBuf;

use tracing::warn;

/// Sink receiving the final outcome
pub trait ResultSink {
    fn report(&self, success: bool, log_text: &str);
}

/// Writes `key=value` records to the output file named by `GANTRY_OUTPUT`,
/// in the heredoc form CI output files use for multi-line values. Without
/// the variable the outcome is only logged.
pub struct EnvFileSink {
    path: Option<PathBuf>,
}

impl EnvFileSink {
    pub fn from_env() -> Self {
        Self {
            path: std::env::var_os("GANTRY_OUTPUT").map(PathBuf::from),
        }
    }

    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    fn write(&self, success: bool, log_text: &str) -> std::io::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;

        let result = if success { "succeeded" } else { "failed" };
        writeln!(file, "GANTRY_TEST_RESULT={result}")?;
        writeln!(file, "GANTRY_TEST_FULL_RESULTS_TEXT<<GANTRY_EOF")?;
        writeln!(file, "{log_text}")?;
        writeln!(file, "GANTRY_EOF")?;
        Ok(())
    }
}

impl ResultSink for EnvFileSink {
    fn report(&self, success: bool, log_text: &str) {
        if let Err(err) = self.write(success, log_text) {
            warn!(error = %err, "failed to report result to output file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_success_and_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output");
        let sink = EnvFileSink::new(Some(path.clone()));

        sink.report(true, "<test-results/>");

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("GANTRY_TEST_RESULT=succeeded"));
        assert!(content.contains("<test-results/>"));
    }

    #[test]
    fn test_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output");
        let sink = EnvFileSink::new(Some(path.clone()));

        sink.report(false, "");

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("GANTRY_TEST_RESULT=failed"));
    }

    #[test]
    fn test_missing_output_file_is_tolerated() {
        // No configured path: reporting is a no-op, never a panic.
        EnvFileSink::new(None).report(true, "log");
    }
}
