use ash::vk;

use crate::access::AccessKind;
use crate::error::{RgError, RgResult};
use crate::handle::{ExportedHandle, Handle, RawHandle, ResourceKind};

/// Where a buffer's memory should live. Mirrors the three placements every
/// backend in the pack exposes (device-local, and the two staging
/// directions), without pulling in a concrete allocator crate.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum MemoryKind {
    GpuOnly,
    CpuToGpu,
    GpuToCpu,
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ImageDesc {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub mip_levels: u32,
    pub array_layers: u32,
    pub samples: vk::SampleCountFlags,
    pub format: vk::Format,
    pub usage: vk::ImageUsageFlags,
}

impl ImageDesc {
    pub fn new_2d(width: u32, height: u32, format: vk::Format) -> Self {
        Self {
            width,
            height,
            depth: 1,
            mip_levels: 1,
            array_layers: 1,
            samples: vk::SampleCountFlags::TYPE_1,
            format,
            usage: vk::ImageUsageFlags::empty(),
        }
    }

    pub fn with_usage(mut self, usage: vk::ImageUsageFlags) -> Self {
        self.usage |= usage;
        self
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct BufferDesc {
    pub size: u64,
    pub usage: vk::BufferUsageFlags,
    pub memory: MemoryKind,
}

impl BufferDesc {
    pub fn new(size: u64, memory: MemoryKind) -> Self {
        Self {
            size,
            usage: vk::BufferUsageFlags::empty(),
            memory,
        }
    }

    pub fn with_usage(mut self, usage: vk::BufferUsageFlags) -> Self {
        self.usage |= usage;
        self
    }
}

pub struct ImageKind;
impl ResourceKind for ImageKind {
    type Desc = ImageDesc;
}

pub struct BufferKind;
impl ResourceKind for BufferKind {
    type Desc = BufferDesc;
}

pub type ImageHandle = Handle<ImageKind>;
pub type BufferHandle = Handle<BufferKind>;
pub type ExportedImageHandle = ExportedHandle<ImageKind>;
pub type ExportedBufferHandle = ExportedHandle<BufferKind>;

#[derive(Clone, PartialEq, Eq, Debug)]
pub(crate) enum ResourceDescKind {
    Image(ImageDesc),
    Buffer(BufferDesc),
}

/// How a resource's backing memory is provided to the graph.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum ResourceOrigin {
    /// Backed by a fresh allocation the Executor requests from the Device
    /// (or reuses from an aliasing pool) when the frame is prepared.
    Transient,
    /// Backed by a resource the caller already owns; `last_access` seeds
    /// the first barrier's source state.
    Imported,
    /// The swapchain's current backbuffer. Its underlying image is not
    /// known until `Executor::acquire` runs, so accesses against it are
    /// recorded against the placeholder and only bound to a real image
    /// handle at submission time.
    Swapchain,
}

/// The concrete backend object a resource entry is already bound to, if
/// any. Transient resources have none until the Executor allocates one at
/// prepare time; the swapchain placeholder has none until acquire.
#[derive(Clone, Copy)]
pub(crate) enum BoundResource {
    Image(crate::recorder::DeviceImage),
    Buffer(crate::recorder::DeviceBuffer),
}

pub(crate) struct ResourceEntry {
    pub desc: ResourceDescKind,
    pub origin: ResourceOrigin,
    pub last_access: AccessKind,
    pub generation: u32,
    pub exported: bool,
    pub bound: Option<BoundResource>,
}

/// Resource Registry: the arena of record for every resource a frame's
/// graph touches, and the single source of truth for each one's last-known
/// access state — consulted by the Builder (to seed import access), the
/// Compiler (for aliasing/lifetime analysis) and the Executor (to compute
/// each transition's source state and write back the final one).
#[derive(Default)]
pub struct ResourceRegistry {
    entries: Vec<ResourceEntry>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(
        &mut self,
        desc: ResourceDescKind,
        origin: ResourceOrigin,
        last_access: AccessKind,
        bound: Option<BoundResource>,
    ) -> RawHandle {
        let id = self.entries.len() as u32;
        self.entries.push(ResourceEntry {
            desc,
            origin,
            last_access,
            generation: 0,
            exported: false,
            bound,
        });
        RawHandle { id, generation: 0 }
    }

    pub fn create_image(&mut self, desc: ImageDesc) -> ImageHandle {
        let raw = self.push(ResourceDescKind::Image(desc.clone()), ResourceOrigin::Transient, AccessKind::Undefined, None);
        Handle::new(raw, desc)
    }

    pub fn create_buffer(&mut self, desc: BufferDesc) -> BufferHandle {
        let raw = self.push(ResourceDescKind::Buffer(desc.clone()), ResourceOrigin::Transient, AccessKind::Undefined, None);
        Handle::new(raw, desc)
    }

    /// Imports an image the caller already owns. `image` is the concrete
    /// backend object the Executor will bind this handle to for the whole
    /// frame; `initial_access` seeds the first transition's source state.
    pub fn import_image(
        &mut self,
        image: crate::recorder::DeviceImage,
        desc: ImageDesc,
        initial_access: AccessKind,
    ) -> ImageHandle {
        let raw = self.push(
            ResourceDescKind::Image(desc.clone()),
            ResourceOrigin::Imported,
            initial_access,
            Some(BoundResource::Image(image)),
        );
        Handle::new(raw, desc)
    }

    pub fn import_buffer(
        &mut self,
        buffer: crate::recorder::DeviceBuffer,
        desc: BufferDesc,
        initial_access: AccessKind,
    ) -> BufferHandle {
        let raw = self.push(
            ResourceDescKind::Buffer(desc.clone()),
            ResourceOrigin::Imported,
            initial_access,
            Some(BoundResource::Buffer(buffer)),
        );
        Handle::new(raw, desc)
    }

    /// Registers this frame's swapchain backbuffer as a resource whose
    /// underlying image is not yet known. `desc` describes the swapchain's
    /// image format/extent so accesses can be validated before the image is
    /// ever acquired.
    pub fn import_swapchain_image(&mut self, desc: ImageDesc) -> ImageHandle {
        let raw = self.push(ResourceDescKind::Image(desc.clone()), ResourceOrigin::Swapchain, AccessKind::Present, None);
        Handle::new(raw, desc)
    }

    /// Binds the actual acquired backbuffer to the swapchain placeholder
    /// registered via [`ResourceRegistry::import_swapchain_image`]. Called
    /// by the Executor once `Swapchain::acquire` returns, never by
    /// application code.
    pub(crate) fn bind_swapchain_image(&mut self, raw: RawHandle, image: crate::recorder::DeviceImage) -> RgResult<()> {
        let entry = self.resolve_mut(raw)?;
        entry.bound = Some(BoundResource::Image(image));
        Ok(())
    }

    pub fn export_image(&mut self, handle: &ImageHandle) -> RgResult<ExportedImageHandle> {
        self.mark_exported(handle.raw())?;
        Ok(ExportedHandle::new(handle.raw()))
    }

    pub fn export_buffer(&mut self, handle: &BufferHandle) -> RgResult<ExportedBufferHandle> {
        self.mark_exported(handle.raw())?;
        Ok(ExportedHandle::new(handle.raw()))
    }

    fn mark_exported(&mut self, raw: RawHandle) -> RgResult<()> {
        let entry = self.resolve_mut(raw)?;
        entry.exported = true;
        Ok(())
    }

    pub(crate) fn resolve(&self, raw: RawHandle) -> RgResult<&ResourceEntry> {
        self.entries
            .get(raw.id as usize)
            .filter(|e| e.generation == raw.generation)
            .ok_or(RgError::UnknownHandle(raw))
    }

    pub(crate) fn resolve_mut(&mut self, raw: RawHandle) -> RgResult<&mut ResourceEntry> {
        self.entries
            .get_mut(raw.id as usize)
            .filter(|e| e.generation == raw.generation)
            .ok_or(RgError::UnknownHandle(raw))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (u32, &ResourceEntry)> {
        self.entries.iter().enumerate().map(|(i, e)| (i as u32, e))
    }

    pub(crate) fn has_swapchain_image(&self) -> bool {
        self.entries.iter().any(|e| e.origin == ResourceOrigin::Swapchain)
    }

    pub(crate) fn set_last_access(&mut self, id: u32, access: AccessKind) {
        if let Some(entry) = self.entries.get_mut(id as usize) {
            entry.last_access = access;
        }
    }

    pub fn get_exported_access<K: ResourceKind>(&self, handle: ExportedHandle<K>) -> RgResult<AccessKind> {
        Ok(self.resolve(handle.raw())?.last_access)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_freshly_created_buffer_has_no_prior_access() {
        let mut registry = ResourceRegistry::new();
        let handle = registry.create_buffer(BufferDesc::new(64, MemoryKind::GpuOnly));
        assert_eq!(registry.resolve(handle.raw()).unwrap().last_access, AccessKind::Undefined);
    }

    #[test]
    fn a_freshly_created_image_has_no_prior_access() {
        let mut registry = ResourceRegistry::new();
        let handle = registry.create_image(ImageDesc::new_2d(64, 64, vk::Format::R8G8B8A8_UNORM));
        assert_eq!(registry.resolve(handle.raw()).unwrap().last_access, AccessKind::Undefined);
    }
}
