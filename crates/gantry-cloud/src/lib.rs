//! Gantry Cloud - Test-cloud submission
//!
//! Locates the external test runner, assembles and executes the submission
//! invocation, and interprets the structured completion data embedded in
//! the runner's output stream.

pub mod response;
pub mod runner;
pub mod submission;

pub use response::{extract_payload, verdict, ResultPayload};
pub use runner::locate_runner;
pub use submission::{Parallelization, Submission, SubmissionResult};
