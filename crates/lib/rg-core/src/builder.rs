use crate::access::{AccessDescriptor, AccessKind, AccessRange, ByteRange, LoadOp, QueueKind, StoreOp, SubresourceRange};
use crate::error::{RgError, RgResult};
use crate::pass::{Pass, PassAccess, PassAccessTarget};
use crate::resource::{
    BufferHandle, ExportedBufferHandle, ExportedImageHandle, ImageHandle, ResourceRegistry,
};
use crate::resource::{BufferDesc, ImageDesc};

/// The per-frame declarative surface an application uses to register
/// resources and passes. Consumed by [`crate::compiler::compile`] once the
/// frame is fully declared.
///
/// Collapses resource registration and pass declaration into one type; this
/// crate carries no cross-frame temporal-resource bookkeeping (persistent
/// resource-memory ownership is out of scope — callers that want a resource
/// to persist import it fresh each frame from their own cross-frame store).
pub struct GraphBuilder {
    pub(crate) registry: ResourceRegistry,
    pub(crate) passes: Vec<Pass>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            registry: ResourceRegistry::new(),
            passes: Vec::new(),
        }
    }

    pub fn create_image(&mut self, desc: ImageDesc) -> ImageHandle {
        self.registry.create_image(desc)
    }

    pub fn create_buffer(&mut self, desc: BufferDesc) -> BufferHandle {
        self.registry.create_buffer(desc)
    }

    pub fn import_image(
        &mut self,
        image: crate::recorder::DeviceImage,
        desc: ImageDesc,
        initial_access: AccessKind,
    ) -> ImageHandle {
        self.registry.import_image(image, desc, initial_access)
    }

    pub fn import_buffer(
        &mut self,
        buffer: crate::recorder::DeviceBuffer,
        desc: BufferDesc,
        initial_access: AccessKind,
    ) -> BufferHandle {
        self.registry.import_buffer(buffer, desc, initial_access)
    }

    /// Registers this frame's swapchain backbuffer. A frame carries at most
    /// one: a second call returns [`RgError::SwapchainMisuse`] rather than
    /// silently discarding every swapchain resource but the first the
    /// Compiler happens to find.
    pub fn import_swapchain_image(&mut self, desc: ImageDesc) -> RgResult<ImageHandle> {
        if self.registry.has_swapchain_image() {
            return Err(RgError::SwapchainMisuse(
                "a frame may only import one swapchain image; a second import_swapchain_image call was made".into(),
            ));
        }
        Ok(self.registry.import_swapchain_image(desc))
    }

    pub fn export_image(&mut self, handle: &ImageHandle) -> RgResult<ExportedImageHandle> {
        self.registry.export_image(handle)
    }

    pub fn export_buffer(&mut self, handle: &BufferHandle) -> RgResult<ExportedBufferHandle> {
        self.registry.export_buffer(handle)
    }

    /// Begins declaring a new pass. The pass is appended to the graph when
    /// the returned builder is dropped, unconditionally, so a pass with no
    /// accesses (or an early return from a `?`-propagating setup function)
    /// still lands in the graph rather than being silently lost.
    pub fn add_pass<'rg>(&'rg mut self, name: impl Into<String>, queue: QueueKind) -> PassBuilder<'rg> {
        let id = self.passes.len() as u32;
        PassBuilder {
            builder: self,
            pass: Some(Pass {
                id,
                name: name.into(),
                queue,
                accesses: Vec::new(),
                render_func: None,
            }),
        }
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_kind_for_queue(kind: AccessKind, queue: QueueKind) -> RgResult<()> {
    if kind.is_attachment() && queue != QueueKind::Graphics {
        return Err(RgError::InvalidAccess {
            handle: crate::handle::RawHandle { id: u32::MAX, generation: 0 },
            reason: format!("{:?} is only valid on the graphics queue", kind),
        });
    }
    Ok(())
}

pub struct PassBuilder<'rg> {
    builder: &'rg mut GraphBuilder,
    pass: Option<Pass>,
}

impl<'rg> PassBuilder<'rg> {
    fn pass_mut(&mut self) -> &mut Pass {
        self.pass.as_mut().expect("PassBuilder used after being finalized")
    }

    fn push_access(&mut self, target: PassAccessTarget, desc: AccessDescriptor) -> RgResult<()> {
        let queue = self.pass_mut().queue;
        validate_kind_for_queue(desc.kind, queue)?;

        let raw = crate::pass::target_raw(target);
        self.builder.registry.resolve(raw)?;

        let pass = self.pass_mut();
        if desc.kind.is_write() {
            for existing in &pass.accesses {
                if crate::pass::target_raw(existing.target) == raw
                    && existing.desc.kind.is_write()
                    && existing.desc.overlaps(&desc)
                {
                    return Err(RgError::InvalidAccess {
                        handle: raw,
                        reason: "two overlapping writes to the same resource within one pass".into(),
                    });
                }
            }
        }
        pass.accesses.push(PassAccess { target, desc });
        Ok(())
    }

    pub fn read_image(
        &mut self,
        handle: &ImageHandle,
        kind: AccessKind,
        stages: ash::vk::PipelineStageFlags,
        range: Option<SubresourceRange>,
    ) -> RgResult<&mut Self> {
        if !kind.is_read() {
            return Err(RgError::InvalidAccess {
                handle: handle.raw(),
                reason: format!("{:?} is not a read access", kind),
            });
        }
        let range = range.unwrap_or_else(|| SubresourceRange::whole_image(ash::vk::ImageAspectFlags::COLOR));
        self.push_access(
            PassAccessTarget::Image(handle.raw()),
            AccessDescriptor {
                kind,
                stages,
                range: AccessRange::Image(range),
                load_op: LoadOp::Load,
                store_op: StoreOp::DontCare,
            },
        )?;
        Ok(self)
    }

    pub fn write_image(
        &mut self,
        handle: &ImageHandle,
        kind: AccessKind,
        stages: ash::vk::PipelineStageFlags,
        range: Option<SubresourceRange>,
        load_op: LoadOp,
        store_op: StoreOp,
    ) -> RgResult<&mut Self> {
        if !kind.is_write() {
            return Err(RgError::InvalidAccess {
                handle: handle.raw(),
                reason: format!("{:?} is not a write access", kind),
            });
        }
        let range = range.unwrap_or_else(|| SubresourceRange::whole_image(ash::vk::ImageAspectFlags::COLOR));
        self.push_access(
            PassAccessTarget::Image(handle.raw()),
            AccessDescriptor {
                kind,
                stages,
                range: AccessRange::Image(range),
                load_op,
                store_op,
            },
        )?;
        Ok(self)
    }

    pub fn read_buffer(
        &mut self,
        handle: &BufferHandle,
        kind: AccessKind,
        stages: ash::vk::PipelineStageFlags,
        range: Option<ByteRange>,
    ) -> RgResult<&mut Self> {
        if !kind.is_read() {
            return Err(RgError::InvalidAccess {
                handle: handle.raw(),
                reason: format!("{:?} is not a read access", kind),
            });
        }
        self.push_access(
            PassAccessTarget::Buffer(handle.raw()),
            AccessDescriptor {
                kind,
                stages,
                range: AccessRange::Buffer(range.unwrap_or_else(ByteRange::whole_buffer)),
                load_op: LoadOp::Load,
                store_op: StoreOp::DontCare,
            },
        )?;
        Ok(self)
    }

    pub fn write_buffer(
        &mut self,
        handle: &BufferHandle,
        kind: AccessKind,
        stages: ash::vk::PipelineStageFlags,
        range: Option<ByteRange>,
    ) -> RgResult<&mut Self> {
        if !kind.is_write() {
            return Err(RgError::InvalidAccess {
                handle: handle.raw(),
                reason: format!("{:?} is not a write access", kind),
            });
        }
        self.push_access(
            PassAccessTarget::Buffer(handle.raw()),
            AccessDescriptor {
                kind,
                stages,
                range: AccessRange::Buffer(range.unwrap_or_else(ByteRange::whole_buffer)),
                load_op: LoadOp::DontCare,
                store_op: StoreOp::Store,
            },
        )?;
        Ok(self)
    }

    /// Attaches the command-recording callback and finalizes the pass.
    /// Consumes the builder; the subsequent `Drop` then sees `self.pass`
    /// already holding the callback.
    pub fn render(mut self, func: impl FnOnce(&mut crate::pass_context::PassContext) -> RgResult<()> + Send + 'static) {
        self.pass_mut().render_func = Some(Box::new(func));
    }
}

impl<'rg> Drop for PassBuilder<'rg> {
    fn drop(&mut self) {
        if let Some(pass) = self.pass.take() {
            self.builder.passes.push(pass);
        }
    }
}
