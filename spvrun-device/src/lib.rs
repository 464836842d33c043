//! # Compute-API Surface & Device Selection
//!
//! The harness drives an accelerator through a vendor-neutral compute API.
//! This crate owns that boundary:
//!
//! - [`ComputeApi`]: the capability trait the orchestrator calls into
//!   (enumeration, context/queue/program/kernel/buffer lifecycle, blocking
//!   enqueue-and-wait with event timestamps)
//! - [`ApiError`]: raw API status codes translated into a closed set of
//!   named kinds so handling logic can match symbolically
//! - [`select_device`]: the filter-driven platform/device selection rule
//! - [`mock`]: an in-process simulated backend for tests
//!
//! The real runtime (contexts, queues, drivers) is an external collaborator;
//! nothing here links against a driver.

pub mod api;
pub mod mock;
pub mod select;

pub use api::{
    ApiError, BufferId, BuildError, ComputeApi, ContextId, DeviceDesc, DeviceId, KernelId,
    LaunchTiming, PlatformDesc, PlatformId, ProgramId, QueueId,
};
pub use select::{enumerate, select_device, Platform, SelectError, Selection, MODULE_FORMAT};
