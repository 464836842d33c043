//! # Run Pipeline
//!
//! The multi-phase execution pipeline and per-entry result classification.
//! All device work is issued-then-waited; the context, queue, program, and
//! result buffer are created once per run, while the kernel and the
//! buffer's contents are per-entry.

use crate::error::HarnessError;
use crate::report::{Reporter, RunSummary, TestOutcome, TestResult};
use crate::validate::{ModuleValidator, ValidationOutcome};
use spvrun_device::{
    enumerate, select_device, ApiError, BufferId, BuildError, ComputeApi, ProgramId, QueueId,
};
use spvrun_module::{correlate, introspect, EntryPoint, IntrospectOptions, Module, SKIP_NAME};

/// Per-run configuration, threaded explicitly through the pipeline.
#[derive(Clone, Debug, Default)]
pub struct HarnessConfig {
    /// Platform display-name substring filter.
    pub platform_filter: Option<String>,
    /// Device display-name substring filter.
    pub device_filter: Option<String>,
    /// Print per-test elapsed device time.
    pub verbose: bool,
    /// Always report success (external-minimizer support).
    pub reduce: bool,
    /// Rewrite entry-point names for platforms with name restrictions.
    pub rewrite_names: bool,
}

impl HarnessConfig {
    /// Defaults used by the binary: workaround on, everything else off.
    pub fn new() -> Self {
        Self {
            rewrite_names: true,
            ..Self::default()
        }
    }
}

/// Run every test entry point of `bytes` on the selected device.
///
/// Fatal errors (bad module, validation, selection, build) come back as
/// `Err`; per-test failures are classified inside the returned summary.
pub fn run_harness<A, V>(
    api: &mut A,
    validator: &V,
    config: &HarnessConfig,
    bytes: &[u8],
) -> Result<RunSummary, HarnessError>
where
    A: ComputeApi,
    V: ModuleValidator,
{
    let module = Module::from_bytes(bytes)?;
    tracing::debug!(
        words = module.len_words(),
        version = module.version(),
        "module loaded"
    );

    if let ValidationOutcome::Invalid { index, message } = validator.validate(bytes)? {
        let diagnostic = correlate(&module, index, &message);
        return Err(HarnessError::Validation {
            diagnostic: diagnostic.to_string(),
        });
    }

    let introspection = introspect(
        &module,
        &IntrospectOptions {
            rewrite_names: config.rewrite_names,
        },
    )?;
    tracing::debug!(
        entry_points = introspection.entry_points.len(),
        error_names = introspection.error_names.len(),
        "module introspected"
    );

    let reporter = Reporter::new(config.verbose);
    let mut summary = RunSummary::default();

    // A module with no surviving entry points is trivially successful and
    // must not touch any device.
    if introspection.entry_points.is_empty() {
        tracing::info!("module declares no invocable test entry points");
        reporter.summary(&summary);
        return Ok(summary);
    }

    let platforms = enumerate(api)?;
    let selection = select_device(
        &platforms,
        config.platform_filter.as_deref(),
        config.device_filter.as_deref(),
    )?;
    tracing::info!(
        platform = %selection.platform.name,
        device = %selection.device.name,
        "selected device"
    );

    let context = api.create_context(selection.device.id)?;
    let queue = api.create_queue(context, selection.device.id)?;

    let program = match api.build_program(context, selection.device.id, bytes) {
        Ok(program) => program,
        Err(BuildError::BuildFailed { log }) => {
            tracing::error!("program build failed:\n{log}");
            return Err(BuildError::BuildFailed { log }.into());
        }
        Err(other) => return Err(other.into()),
    };

    let result_buffer = api.create_buffer(context, 4)?;

    for entry in &introspection.entry_points {
        let result = run_entry(
            api,
            queue,
            program,
            result_buffer,
            entry,
            &introspection.error_names,
        );
        reporter.test_line(&result);
        summary.record(result);
    }

    reporter.summary(&summary);
    Ok(summary)
}

/// Execute one entry point in isolation. A runtime-level failure becomes an
/// `ExecutionError` outcome; it never aborts the remaining entries.
fn run_entry<A: ComputeApi>(
    api: &mut A,
    queue: QueueId,
    program: ProgramId,
    result_buffer: BufferId,
    entry: &EntryPoint,
    error_names: &[String],
) -> TestResult {
    match launch(api, queue, program, result_buffer, entry) {
        Ok((code, elapsed_us)) => TestResult {
            name: entry.name.clone(),
            outcome: classify(code, error_names),
            elapsed_us,
        },
        Err(error) => TestResult {
            name: entry.name.clone(),
            outcome: TestOutcome::ExecutionError(error),
            elapsed_us: 0,
        },
    }
}

fn launch<A: ComputeApi>(
    api: &mut A,
    queue: QueueId,
    program: ProgramId,
    result_buffer: BufferId,
    entry: &EntryPoint,
) -> Result<(u32, u64), ApiError> {
    let kernel = api.create_kernel(program, &entry.name)?;

    let launched: Result<(u32, u64), ApiError> = (|| {
        api.set_buffer_arg(kernel, 0, result_buffer)?;
        api.write_buffer_u32(queue, result_buffer, 0)?;
        let timing = api.enqueue_single_item(queue, kernel)?;
        let code = api.read_buffer_u32(queue, result_buffer)?;
        Ok((code, timing.elapsed_us()))
    })();

    // release even when the launch failed mid-way
    let _ = api.release_kernel(kernel);
    launched
}

/// Map a result word through the symbolic error-name table.
fn classify(code: u32, error_names: &[String]) -> TestOutcome {
    if code == 0 {
        return TestOutcome::Pass;
    }
    match error_names.get(code as usize) {
        Some(name) if name == SKIP_NAME => TestOutcome::Skip,
        Some(name) => TestOutcome::Fail {
            code,
            name: name.clone(),
        },
        None => TestOutcome::Fail {
            code,
            name: "unknown error".to_string(),
        },
    }
}
