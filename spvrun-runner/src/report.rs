//! # Results & Reporting
//!
//! Per-test outcomes, the aggregate summary, and the progress lines the
//! harness prints for CI consumption.

use spvrun_device::ApiError;
use std::fmt;

/// How one entry point's launch was classified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TestOutcome {
    /// Result word was 0.
    Pass,
    /// Result word mapped to the skip sentinel.
    Skip,
    /// Non-zero result word; `name` is the symbolic error name, or
    /// `"unknown error"` when the code is outside the table.
    Fail { code: u32, name: String },
    /// The launch itself raised a runtime-level failure; the result buffer
    /// never speaks for this test.
    ExecutionError(ApiError),
}

/// One entry point's result. Produced once per run; never retried.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestResult {
    pub name: String,
    pub outcome: TestOutcome,
    pub elapsed_us: u64,
}

/// Aggregate counts across the run. Execution errors count as failures.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub results: Vec<TestResult>,
    pub passed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn record(&mut self, result: TestResult) {
        match result.outcome {
            TestOutcome::Pass => self.passed += 1,
            TestOutcome::Skip => self.skipped += 1,
            TestOutcome::Fail { .. } | TestOutcome::ExecutionError(_) => self.failed += 1,
        }
        self.results.push(result);
    }

    /// Whether the run gates CI as successful. Reducing mode reports
    /// success unconditionally so an external minimizer can iterate on a
    /// crash instead of a logical test failure.
    pub fn success(&self, reduce_mode: bool) -> bool {
        reduce_mode || self.failed == 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} passed; {} skipped; {} failed",
            self.passed, self.skipped, self.failed
        )
    }
}

/// Prints per-test progress lines and the final summary.
#[derive(Clone, Copy, Debug, Default)]
pub struct Reporter {
    /// Also print per-test elapsed device time.
    pub verbose: bool,
}

impl Reporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn test_line(&self, result: &TestResult) {
        let verdict = match &result.outcome {
            TestOutcome::Pass => "pass".to_string(),
            TestOutcome::Skip => "skip".to_string(),
            TestOutcome::Fail { code, name } => format!("fail, {name} ({code})"),
            TestOutcome::ExecutionError(error) => format!("error, {error}"),
        };
        if self.verbose {
            println!("{}... {} [{} us]", result.name, verdict, result.elapsed_us);
        } else {
            println!("{}... {}", result.name, verdict);
        }
    }

    pub fn summary(&self, summary: &RunSummary) {
        println!("{summary}");
    }
}
