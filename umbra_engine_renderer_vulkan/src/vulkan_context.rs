/// GpuContext - Device and allocator shared by every pass resource
///
/// The host application owns the Vulkan instance and device. A context only
/// borrows them: the host must drop every context (and every resource built
/// from it) before destroying the device.

use ash::vk;
use gpu_allocator::vulkan::Allocator;
use std::sync::{Arc, Mutex};

use umbra_engine::umbra::{Error, Result};

/// Shared GPU context for compute pass resources.
///
/// Shared (via `Arc`) by buffers, shader modules and passes so each of them
/// can release its own Vulkan objects on drop.
pub struct GpuContext {
    /// Vulkan logical device
    pub device: ash::Device,

    /// GPU memory allocator (shared, requires mutex for thread safety)
    pub allocator: Arc<Mutex<Allocator>>,

    /// Queue the host submits compute work to
    pub compute_queue: vk::Queue,

    /// Family of `compute_queue`
    pub compute_queue_family: u32,
}

impl GpuContext {
    /// Create a new GPU context
    ///
    /// # Arguments
    ///
    /// * `device` - Vulkan logical device
    /// * `allocator` - GPU memory allocator created for `device`
    /// * `compute_queue` - Queue with compute support
    /// * `compute_queue_family` - Family index of `compute_queue`
    pub fn new(
        device: ash::Device,
        allocator: Arc<Mutex<Allocator>>,
        compute_queue: vk::Queue,
        compute_queue_family: u32,
    ) -> Self {
        Self {
            device,
            allocator,
            compute_queue,
            compute_queue_family,
        }
    }

    /// Run `f` with the allocator locked
    pub(crate) fn with_allocator<T>(&self, f: impl FnOnce(&mut Allocator) -> Result<T>) -> Result<T> {
        let mut allocator = self
            .allocator
            .lock()
            .map_err(|_| Error::BackendError("GPU allocator mutex poisoned".to_string()))?;
        f(&mut allocator)
    }
}
