//! Load-test execution inside a provisioned runtime

pub mod k6;

pub use k6::K6Executor;

/// Raw console output captured from a load-test run.
///
/// Owned by the pipeline invocation that produced it; handed to the parser
/// verbatim and not retained afterwards.
#[derive(Debug, Clone)]
pub struct RawReport(String);

impl RawReport {
    pub fn new(text: String) -> Self {
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}
