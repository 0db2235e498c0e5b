//! Structured completion data embedded in runner output
//!
//! In asynchronous mode the runner prints a single JSON object amid its
//! otherwise unstructured output. Extraction is isolated here behind typed
//! accessors so the async-result contract can be tested without spawning
//! processes.

use serde::Deserialize;
use tracing::warn;

/// The structured payload the runner embeds in async mode
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResultPayload {
    /// Service-side log lines
    #[serde(default, rename = "Log")]
    pub log: Vec<String>,

    /// Validation errors reported by the service; non-empty means the
    /// submission failed even when the runner exited zero
    #[serde(default, rename = "ErrorMessages")]
    pub error_messages: Vec<String>,

    /// Job identifier for the accepted run
    #[serde(default, rename = "TestRunId")]
    pub test_run_id: String,

    /// Service URL for the accepted run
    #[serde(default, rename = "LaunchUrl")]
    pub launch_url: String,
}

/// Extract the payload from the buffered output: the last line that forms
/// a complete JSON object. A malformed payload line is reported and treated
/// as absent.
pub fn extract_payload(lines: &[String]) -> Option<ResultPayload> {
    let candidate = lines.iter().rev().find(|line| {
        let trimmed = line.trim();
        trimmed.starts_with('{') && trimmed.ends_with('}')
    })?;

    match serde_json::from_str(candidate.trim()) {
        Ok(payload) => Some(payload),
        Err(err) => {
            warn!(error = %err, "failed to parse result payload, ignoring");
            None
        }
    }
}

/// Overall submission verdict. Exit-status success is necessary but not
/// sufficient: in async mode a structured error field fails the run even
/// on exit zero.
pub fn verdict(exit_ok: bool, async_mode: bool, payload: Option<&ResultPayload>) -> bool {
    if !exit_ok {
        return false;
    }
    if async_mode {
        if let Some(payload) = payload {
            return payload.error_messages.is_empty();
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn test_extract_accepted_run() {
        let output = lines(&[
            "Uploading negotiated files...",
            r#"{"TestRunId":"abc123","ErrorMessages":[],"Log":["accepted"]}"#,
        ]);
        let payload = extract_payload(&output).unwrap();
        assert_eq!(payload.test_run_id, "abc123");
        assert!(payload.error_messages.is_empty());
    }

    #[test]
    fn test_extract_takes_last_json_line() {
        let output = lines(&[
            r#"{"TestRunId":"first"}"#,
            "noise",
            r#"{"TestRunId":"second"}"#,
        ]);
        assert_eq!(extract_payload(&output).unwrap().test_run_id, "second");
    }

    #[test]
    fn test_extract_without_json_line() {
        assert_eq!(extract_payload(&lines(&["no structure here"])), None);
    }

    #[test]
    fn test_extract_malformed_payload_is_absent() {
        assert_eq!(extract_payload(&lines(&["{not json}"])), None);
    }

    #[test]
    fn test_verdict_requires_zero_exit() {
        assert!(!verdict(false, false, None));
        assert!(!verdict(false, true, Some(&ResultPayload::default())));
    }

    #[test]
    fn test_verdict_fails_on_service_errors_despite_zero_exit() {
        let payload = ResultPayload {
            error_messages: vec!["Invalid device".to_string()],
            ..Default::default()
        };
        assert!(!verdict(true, true, Some(&payload)));
        // Synchronous runs do not carry a payload contract.
        assert!(verdict(true, false, Some(&payload)));
    }

    #[test]
    fn test_verdict_passes_on_clean_async_run() {
        let payload = ResultPayload {
            test_run_id: "abc123".to_string(),
            ..Default::default()
        };
        assert!(verdict(true, true, Some(&payload)));
        assert!(verdict(true, true, None));
    }
}
