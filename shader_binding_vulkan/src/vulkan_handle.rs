/// VkHandle - move-only owner of a Vulkan device object
///
/// One generic wrapper for every handle type the backend creates. The
/// object is destroyed with the device it came from when the handle drops.

use ash::vk;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// Vulkan object destroyed through `vkDestroy*`
pub trait DeviceObject: Copy {
    /// # Safety
    ///
    /// `self` was created from `device` and is no longer in use by the GPU.
    unsafe fn destroy(self, device: &ash::Device);
}

impl DeviceObject for vk::DescriptorSetLayout {
    unsafe fn destroy(self, device: &ash::Device) {
        device.destroy_descriptor_set_layout(self, None);
    }
}

impl DeviceObject for vk::PipelineLayout {
    unsafe fn destroy(self, device: &ash::Device) {
        device.destroy_pipeline_layout(self, None);
    }
}

/// Owned device object
pub struct VkHandle<T: DeviceObject> {
    ctx: Arc<GpuContext>,
    raw: T,
}

impl<T: DeviceObject> VkHandle<T> {
    pub(crate) fn new(ctx: Arc<GpuContext>, raw: T) -> Self {
        Self { ctx, raw }
    }

    /// Raw Vulkan handle (still owned by `self`)
    pub fn raw(&self) -> T {
        self.raw
    }
}

impl<T: DeviceObject> Drop for VkHandle<T> {
    fn drop(&mut self) {
        unsafe {
            self.raw.destroy(&self.ctx.device);
        }
    }
}

/// Descriptor set layout created for descriptor buffer storage
pub type SetLayout = VkHandle<vk::DescriptorSetLayout>;

pub type PipelineLayout = VkHandle<vk::PipelineLayout>;
