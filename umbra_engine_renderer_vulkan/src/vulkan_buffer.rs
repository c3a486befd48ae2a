/// Buffer - Host-visible Vulkan buffer backed by gpu-allocator

use umbra_engine::umbra::{Error, Result};
use umbra_engine::{engine_bail, engine_err, engine_error};
use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

const LOG_SOURCE: &str = "umbra::vulkan::Buffer";

/// Vulkan buffer the host writes every frame
pub struct Buffer {
    /// Shared GPU context (device, allocator)
    ctx: Arc<GpuContext>,
    /// Vulkan buffer
    pub(crate) buffer: vk::Buffer,
    /// GPU memory allocation
    pub(crate) allocation: Option<Allocation>,
    /// Buffer size
    pub(crate) size: u64,
}

impl Buffer {
    /// Create a CPU-to-GPU buffer of `size` bytes
    ///
    /// # Arguments
    ///
    /// * `ctx` - Shared GPU context
    /// * `size` - Buffer size in bytes (must be non-zero)
    /// * `usage` - Vulkan usage flags (e.g. `UNIFORM_BUFFER`)
    /// * `name` - Allocation name shown by allocator reports
    pub fn new_host_visible(
        ctx: Arc<GpuContext>,
        size: u64,
        usage: vk::BufferUsageFlags,
        name: &str,
    ) -> Result<Self> {
        if size == 0 {
            engine_bail!(LOG_SOURCE, "Cannot create empty buffer '{}'", name);
        }

        unsafe {
            let buffer_create_info = vk::BufferCreateInfo::default()
                .size(size)
                .usage(usage)
                .sharing_mode(vk::SharingMode::EXCLUSIVE);

            let buffer = ctx.device.create_buffer(&buffer_create_info, None)
                .map_err(|e| engine_err!(LOG_SOURCE, "Failed to create buffer of size {} bytes: {:?}", size, e))?;

            let requirements = ctx.device.get_buffer_memory_requirements(buffer);

            let allocation = ctx.with_allocator(|allocator| {
                allocator
                    .allocate(&AllocationCreateDesc {
                        name,
                        requirements,
                        location: MemoryLocation::CpuToGpu,
                        linear: true,
                        allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                    })
                    .map_err(|_e| {
                        let size_kb = requirements.size as f64 / 1024.0;
                        engine_error!(LOG_SOURCE, "Out of GPU memory for buffer '{}' (required: {:.2} KB)", name, size_kb);
                        Error::OutOfMemory
                    })
            });
            let allocation = match allocation {
                Ok(allocation) => allocation,
                Err(e) => {
                    ctx.device.destroy_buffer(buffer, None);
                    return Err(e);
                }
            };

            if let Err(e) = ctx.device.bind_buffer_memory(buffer, allocation.memory(), allocation.offset()) {
                ctx.with_allocator(|allocator| {
                    allocator.free(allocation).ok();
                    Ok(())
                }).ok();
                ctx.device.destroy_buffer(buffer, None);
                return Err(engine_err!(LOG_SOURCE, "Failed to bind buffer memory: {:?}", e));
            }

            Ok(Self {
                ctx,
                buffer,
                allocation: Some(allocation),
                size,
            })
        }
    }

    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Copy `data` into the buffer at `offset`
    pub fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        let end = offset.checked_add(data.len() as u64);
        if end.map_or(true, |end| end > self.size) {
            engine_bail!(LOG_SOURCE,
                "Buffer update out of bounds (offset {} + {} bytes > size {})",
                offset, data.len(), self.size);
        }

        let Some(allocation) = &self.allocation else {
            engine_error!(LOG_SOURCE, "Buffer update failed: no GPU allocation");
            return Err(Error::BackendError("Buffer has no allocation".to_string()));
        };

        let mapped_ptr = allocation
            .mapped_ptr()
            .ok_or_else(|| Error::BackendError("Buffer is not CPU-accessible".to_string()))?
            .as_ptr() as *mut u8;

        unsafe {
            std::ptr::copy_nonoverlapping(
                data.as_ptr(),
                mapped_ptr.add(offset as usize),
                data.len(),
            );
        }
        Ok(())
    }

    /// Copy `out.len()` bytes starting at `offset` out of the buffer
    ///
    /// Used for readbacks; the caller must wait for the GPU writes first.
    pub fn read_into(&self, offset: u64, out: &mut [u8]) -> Result<()> {
        let end = offset.checked_add(out.len() as u64);
        if end.map_or(true, |end| end > self.size) {
            engine_bail!(LOG_SOURCE,
                "Buffer read out of bounds (offset {} + {} bytes > size {})",
                offset, out.len(), self.size);
        }

        let mapped_ptr = self
            .allocation
            .as_ref()
            .and_then(|allocation| allocation.mapped_ptr())
            .ok_or_else(|| Error::BackendError("Buffer is not CPU-accessible".to_string()))?
            .as_ptr() as *const u8;

        unsafe {
            std::ptr::copy_nonoverlapping(
                mapped_ptr.add(offset as usize),
                out.as_mut_ptr(),
                out.len(),
            );
        }
        Ok(())
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe {
            // Free GPU memory even if the allocator lock is poisoned
            if let Some(allocation) = self.allocation.take() {
                if let Ok(mut allocator) = self.ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }

            self.ctx.device.destroy_buffer(self.buffer, None);
        }
    }
}
