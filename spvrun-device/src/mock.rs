//! # Simulated Backend
//!
//! An in-process implementation of [`ComputeApi`] with scripted platforms,
//! devices, and per-kernel results. Handle bookkeeping and error surfaces
//! behave like a real runtime (stale or foreign handles are rejected), and
//! launch timestamps come from a monotonic fake clock, so orchestrator
//! logic can be exercised without a driver.

use crate::api::{
    ApiError, BufferId, BuildError, ComputeApi, ContextId, DeviceDesc, DeviceId, KernelId,
    LaunchTiming, PlatformDesc, PlatformId, ProgramId, QueueId,
};
use std::collections::HashMap;

/// Scripted behavior of one kernel launch.
#[derive(Clone, Debug)]
pub enum KernelScript {
    /// The launch completes and leaves this word in the result buffer.
    Result(u32),
    /// The launch raises a runtime-level failure.
    Fail(ApiError),
}

/// A scripted device.
#[derive(Clone, Debug)]
pub struct MockDevice {
    pub name: String,
    pub il_versions: String,
}

impl MockDevice {
    /// A device advertising SPIR-V ingestion.
    pub fn capable(name: &str) -> Self {
        Self {
            name: name.to_string(),
            il_versions: "SPIR-V_1.2 SPIR-V_1.5".to_string(),
        }
    }

    /// A device advertising only a vendor IL.
    pub fn incapable(name: &str) -> Self {
        Self {
            name: name.to_string(),
            il_versions: "VENDOR-IL_2.0".to_string(),
        }
    }
}

/// A scripted platform.
#[derive(Clone, Debug)]
pub struct MockPlatform {
    pub name: String,
    pub devices: Vec<MockDevice>,
}

#[derive(Debug, Default)]
struct MockKernel {
    name: String,
    bound_buffer: Option<u64>,
}

/// The simulated backend.
#[derive(Debug)]
pub struct MockApi {
    platforms: Vec<MockPlatform>,
    kernels_by_name: HashMap<String, KernelScript>,
    build_failure_log: Option<String>,
    next_handle: u64,
    contexts: Vec<u64>,
    queues: Vec<u64>,
    programs: Vec<u64>,
    buffers: HashMap<u64, u32>,
    live_kernels: HashMap<u64, MockKernel>,
    clock_ns: u64,
    calls: usize,
    launches: Vec<String>,
}

impl MockApi {
    /// One platform, one capable device, no scripted kernels.
    pub fn new() -> Self {
        Self::with_platforms(vec![MockPlatform {
            name: "Mock Platform".to_string(),
            devices: vec![MockDevice::capable("Mock Device")],
        }])
    }

    pub fn with_platforms(platforms: Vec<MockPlatform>) -> Self {
        Self {
            platforms,
            kernels_by_name: HashMap::new(),
            build_failure_log: None,
            next_handle: 1,
            contexts: Vec::new(),
            queues: Vec::new(),
            programs: Vec::new(),
            buffers: HashMap::new(),
            live_kernels: HashMap::new(),
            clock_ns: 1_000,
            calls: 0,
            launches: Vec::new(),
        }
    }

    /// Script one kernel: creating a kernel with an unscripted name fails
    /// with [`ApiError::InvalidKernelName`], like a program that does not
    /// contain the entry point.
    pub fn script_kernel(mut self, name: &str, script: KernelScript) -> Self {
        self.kernels_by_name.insert(name.to_string(), script);
        self
    }

    /// Make every program build fail with this compiler log.
    pub fn script_build_failure(mut self, log: &str) -> Self {
        self.build_failure_log = Some(log.to_string());
        self
    }

    /// How many API calls were issued (any method).
    pub fn calls(&self) -> usize {
        self.calls
    }

    /// Names of kernels launched, in order.
    pub fn launches(&self) -> &[String] {
        &self.launches
    }

    /// Kernels created but never released.
    pub fn leaked_kernels(&self) -> usize {
        self.live_kernels.len()
    }

    fn handle(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    fn lookup_device(&self, device: DeviceId) -> Result<&MockDevice, ApiError> {
        let platform_index = (device.0 >> 16) as usize;
        let device_index = (device.0 & 0xFFFF) as usize;
        self.platforms
            .get(platform_index)
            .and_then(|p| p.devices.get(device_index))
            .ok_or(ApiError::InvalidDevice)
    }
}

impl Default for MockApi {
    fn default() -> Self {
        Self::new()
    }
}

impl ComputeApi for MockApi {
    fn platforms(&mut self) -> Result<Vec<PlatformDesc>, ApiError> {
        self.calls += 1;
        Ok(self
            .platforms
            .iter()
            .enumerate()
            .map(|(i, p)| PlatformDesc {
                id: PlatformId(i as u64),
                name: p.name.clone(),
            })
            .collect())
    }

    fn devices(&mut self, platform: PlatformId) -> Result<Vec<DeviceDesc>, ApiError> {
        self.calls += 1;
        let platform_index = platform.0 as usize;
        let platform = self
            .platforms
            .get(platform_index)
            .ok_or(ApiError::InvalidValue)?;
        Ok(platform
            .devices
            .iter()
            .enumerate()
            .map(|(i, d)| DeviceDesc {
                id: DeviceId((platform_index as u64) << 16 | i as u64),
                name: d.name.clone(),
                il_versions: d.il_versions.clone(),
            })
            .collect())
    }

    fn create_context(&mut self, device: DeviceId) -> Result<ContextId, ApiError> {
        self.calls += 1;
        self.lookup_device(device)?;
        let handle = self.handle();
        self.contexts.push(handle);
        Ok(ContextId(handle))
    }

    fn create_queue(&mut self, context: ContextId, device: DeviceId) -> Result<QueueId, ApiError> {
        self.calls += 1;
        if !self.contexts.contains(&context.0) {
            return Err(ApiError::InvalidContext);
        }
        self.lookup_device(device)?;
        let handle = self.handle();
        self.queues.push(handle);
        Ok(QueueId(handle))
    }

    fn build_program(
        &mut self,
        context: ContextId,
        device: DeviceId,
        module: &[u8],
    ) -> Result<ProgramId, BuildError> {
        self.calls += 1;
        if !self.contexts.contains(&context.0) {
            return Err(ApiError::InvalidContext.into());
        }
        self.lookup_device(device)?;
        if module.is_empty() {
            return Err(ApiError::InvalidValue.into());
        }
        if let Some(log) = &self.build_failure_log {
            return Err(BuildError::BuildFailed { log: log.clone() });
        }
        let handle = self.handle();
        self.programs.push(handle);
        Ok(ProgramId(handle))
    }

    fn create_buffer(&mut self, context: ContextId, bytes: usize) -> Result<BufferId, ApiError> {
        self.calls += 1;
        if !self.contexts.contains(&context.0) {
            return Err(ApiError::InvalidContext);
        }
        if bytes == 0 {
            return Err(ApiError::InvalidValue);
        }
        let handle = self.handle();
        self.buffers.insert(handle, 0);
        Ok(BufferId(handle))
    }

    fn create_kernel(&mut self, program: ProgramId, name: &str) -> Result<KernelId, ApiError> {
        self.calls += 1;
        if !self.programs.contains(&program.0) {
            return Err(ApiError::InvalidProgram);
        }
        if !self.kernels_by_name.contains_key(name) {
            return Err(ApiError::InvalidKernelName);
        }
        let handle = self.handle();
        self.live_kernels.insert(
            handle,
            MockKernel {
                name: name.to_string(),
                bound_buffer: None,
            },
        );
        Ok(KernelId(handle))
    }

    fn set_buffer_arg(
        &mut self,
        kernel: KernelId,
        _index: u32,
        buffer: BufferId,
    ) -> Result<(), ApiError> {
        self.calls += 1;
        if !self.buffers.contains_key(&buffer.0) {
            return Err(ApiError::InvalidMemObject);
        }
        let kernel = self
            .live_kernels
            .get_mut(&kernel.0)
            .ok_or(ApiError::InvalidKernel)?;
        kernel.bound_buffer = Some(buffer.0);
        Ok(())
    }

    fn write_buffer_u32(
        &mut self,
        queue: QueueId,
        buffer: BufferId,
        value: u32,
    ) -> Result<(), ApiError> {
        self.calls += 1;
        if !self.queues.contains(&queue.0) {
            return Err(ApiError::InvalidCommandQueue);
        }
        let slot = self
            .buffers
            .get_mut(&buffer.0)
            .ok_or(ApiError::InvalidMemObject)?;
        *slot = value;
        Ok(())
    }

    fn enqueue_single_item(
        &mut self,
        queue: QueueId,
        kernel: KernelId,
    ) -> Result<LaunchTiming, ApiError> {
        self.calls += 1;
        if !self.queues.contains(&queue.0) {
            return Err(ApiError::InvalidCommandQueue);
        }
        let (name, bound_buffer) = {
            let kernel = self
                .live_kernels
                .get(&kernel.0)
                .ok_or(ApiError::InvalidKernel)?;
            (kernel.name.clone(), kernel.bound_buffer)
        };
        self.launches.push(name.clone());

        let start_ns = self.clock_ns;
        self.clock_ns += 50_000; // fixed 50 us per simulated launch
        let end_ns = self.clock_ns;

        match self.kernels_by_name.get(&name).cloned() {
            Some(KernelScript::Result(word)) => {
                let buffer = bound_buffer.ok_or(ApiError::InvalidValue)?;
                if let Some(slot) = self.buffers.get_mut(&buffer) {
                    *slot = word;
                }
                Ok(LaunchTiming { start_ns, end_ns })
            }
            Some(KernelScript::Fail(error)) => Err(error),
            None => Err(ApiError::InvalidKernel),
        }
    }

    fn read_buffer_u32(&mut self, queue: QueueId, buffer: BufferId) -> Result<u32, ApiError> {
        self.calls += 1;
        if !self.queues.contains(&queue.0) {
            return Err(ApiError::InvalidCommandQueue);
        }
        self.buffers
            .get(&buffer.0)
            .copied()
            .ok_or(ApiError::InvalidMemObject)
    }

    fn release_kernel(&mut self, kernel: KernelId) -> Result<(), ApiError> {
        self.calls += 1;
        self.live_kernels
            .remove(&kernel.0)
            .map(|_| ())
            .ok_or(ApiError::InvalidKernel)
    }
}
