//! # Compute-API Capability
//!
//! Opaque handles, device descriptions, and the trait the orchestrator
//! calls into. Method-for-method this mirrors the subset of an OpenCL-style
//! runtime the harness needs: platform/device enumeration, one context and
//! queue, one program built from the whole module, then per-test kernel
//! launches against a shared one-word result buffer.
//!
//! Every operation is synchronous: enqueue calls block until the device
//! signals completion and report start/end timestamps from the event.

use thiserror::Error;

macro_rules! handle {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub struct $name(pub u64);
    };
}

handle!(/** Opaque platform handle. */ PlatformId);
handle!(/** Opaque device handle. */ DeviceId);
handle!(/** Opaque context handle. */ ContextId);
handle!(/** Opaque command-queue handle. */ QueueId);
handle!(/** Opaque program handle. */ ProgramId);
handle!(/** Opaque kernel handle. */ KernelId);
handle!(/** Opaque buffer handle. */ BufferId);

/// An enumerated platform, annotated with its display name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlatformDesc {
    pub id: PlatformId,
    pub name: String,
}

/// An enumerated device, annotated with its display name and the
/// intermediate-language versions it advertises.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceDesc {
    pub id: DeviceId,
    pub name: String,
    /// Space-separated `<name>_<version>` entries, e.g. `"SPIR-V_1.2 SPIR-V_1.5"`.
    pub il_versions: String,
}

impl DeviceDesc {
    /// Whether the device can ingest the module format directly.
    pub fn supports_module_format(&self, format: &str) -> bool {
        self.il_versions
            .split_whitespace()
            .any(|entry| entry.starts_with(format))
    }
}

/// Device-side start/end timestamps of one launch, in nanoseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LaunchTiming {
    pub start_ns: u64,
    pub end_ns: u64,
}

impl LaunchTiming {
    /// Elapsed device time in microseconds.
    pub fn elapsed_us(&self) -> u64 {
        self.end_ns.saturating_sub(self.start_ns) / 1_000
    }
}

/// Runtime-level API failures, one named kind per distinct status code.
///
/// The harness never matches on raw codes; everything crossing this
/// boundary is translated through [`ApiError::from_status`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("no devices found")]
    DeviceNotFound,
    #[error("device not available")]
    DeviceNotAvailable,
    #[error("compiler not available")]
    CompilerNotAvailable,
    #[error("out of device resources")]
    OutOfResources,
    #[error("out of host memory")]
    OutOfHostMemory,
    #[error("profiling info not available")]
    ProfilingInfoNotAvailable,
    #[error("program build failure")]
    BuildProgramFailure,
    #[error("invalid value")]
    InvalidValue,
    #[error("invalid device")]
    InvalidDevice,
    #[error("invalid context")]
    InvalidContext,
    #[error("invalid command queue")]
    InvalidCommandQueue,
    #[error("invalid memory object")]
    InvalidMemObject,
    #[error("invalid program")]
    InvalidProgram,
    #[error("no kernel with the requested name")]
    InvalidKernelName,
    #[error("invalid kernel")]
    InvalidKernel,
    #[error("unrecognized API status code {0}")]
    Unrecognized(i32),
}

impl ApiError {
    /// Translate a raw status code into a named kind.
    pub fn from_status(status: i32) -> Self {
        match status {
            -1 => Self::DeviceNotFound,
            -2 => Self::DeviceNotAvailable,
            -3 => Self::CompilerNotAvailable,
            -5 => Self::OutOfResources,
            -6 => Self::OutOfHostMemory,
            -7 => Self::ProfilingInfoNotAvailable,
            -11 => Self::BuildProgramFailure,
            -30 => Self::InvalidValue,
            -33 => Self::InvalidDevice,
            -34 => Self::InvalidContext,
            -36 => Self::InvalidCommandQueue,
            -38 => Self::InvalidMemObject,
            -44 => Self::InvalidProgram,
            -46 => Self::InvalidKernelName,
            -48 => Self::InvalidKernel,
            other => Self::Unrecognized(other),
        }
    }
}

/// A program build failure, carrying the compiler's diagnostic log.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("program build failed:\n{log}")]
    BuildFailed { log: String },
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// The compute capability the orchestrator runs against.
///
/// Implementations are drivers (or the in-process [`crate::mock::MockApi`]).
/// All methods block until the device operation completes.
pub trait ComputeApi {
    /// Enumerate platforms in the runtime's order.
    fn platforms(&mut self) -> Result<Vec<PlatformDesc>, ApiError>;

    /// Enumerate a platform's devices in the runtime's order.
    fn devices(&mut self, platform: PlatformId) -> Result<Vec<DeviceDesc>, ApiError>;

    fn create_context(&mut self, device: DeviceId) -> Result<ContextId, ApiError>;

    /// Create a profiling-enabled queue so launches carry timestamps.
    fn create_queue(&mut self, context: ContextId, device: DeviceId) -> Result<QueueId, ApiError>;

    /// Build one program from the whole module binary.
    fn build_program(
        &mut self,
        context: ContextId,
        device: DeviceId,
        module: &[u8],
    ) -> Result<ProgramId, BuildError>;

    fn create_buffer(&mut self, context: ContextId, bytes: usize) -> Result<BufferId, ApiError>;

    fn create_kernel(&mut self, program: ProgramId, name: &str) -> Result<KernelId, ApiError>;

    fn set_buffer_arg(
        &mut self,
        kernel: KernelId,
        index: u32,
        buffer: BufferId,
    ) -> Result<(), ApiError>;

    /// Blocking one-word buffer write.
    fn write_buffer_u32(&mut self, queue: QueueId, buffer: BufferId, value: u32)
        -> Result<(), ApiError>;

    /// Enqueue a single-work-item execution and wait for completion.
    fn enqueue_single_item(
        &mut self,
        queue: QueueId,
        kernel: KernelId,
    ) -> Result<LaunchTiming, ApiError>;

    /// Blocking one-word buffer read-back.
    fn read_buffer_u32(&mut self, queue: QueueId, buffer: BufferId) -> Result<u32, ApiError>;

    fn release_kernel(&mut self, kernel: KernelId) -> Result<(), ApiError>;
}
