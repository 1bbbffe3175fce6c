use ash::vk;

/// Which hardware queue a pass is submitted on.
///
/// The Compiler groups contiguous same-queue passes together; the Barrier
/// Solver emits a queue-ownership transfer pair whenever an edge crosses
/// queues.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum QueueKind {
    Graphics,
    Compute,
    Transfer,
}

/// The coarse way a pass touches a resource.
///
/// Coarser than a driver's own access-type table (a full Vulkan access-type
/// enumeration runs to forty-odd variants): each variant here names
/// a *role* a resource plays in a pass, and the pipeline stages that use it
/// are carried separately on `AccessDescriptor::stages` so one role can be
/// driven from more than one shader stage without multiplying variants.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum AccessKind {
    ColorAttachmentRead,
    ColorAttachmentWrite,
    DepthStencilAttachmentRead,
    DepthStencilAttachmentWrite,
    ShaderRead,
    ShaderWrite,
    TransferRead,
    TransferWrite,
    /// Multisample-resolve write target; routed into the Resolve barrier
    /// slot rather than ordinary Epilogue.
    Resolve,
    /// Terminal state for a swapchain image about to be handed to the
    /// presentation engine. Never a *source* access, only ever a target.
    Present,
    /// No pass has touched this resource yet. Seeded onto a freshly created
    /// transient resource's `last_access`; never a valid *declared* access
    /// and never produced by anything but resource creation.
    Undefined,
}

impl AccessKind {
    pub fn is_write(self) -> bool {
        matches!(
            self,
            AccessKind::ColorAttachmentWrite
                | AccessKind::DepthStencilAttachmentWrite
                | AccessKind::ShaderWrite
                | AccessKind::TransferWrite
                | AccessKind::Resolve
        )
    }

    pub fn is_read(self) -> bool {
        !self.is_write() && !matches!(self, AccessKind::Present | AccessKind::Undefined)
    }

    pub fn is_attachment(self) -> bool {
        matches!(
            self,
            AccessKind::ColorAttachmentRead
                | AccessKind::ColorAttachmentWrite
                | AccessKind::DepthStencilAttachmentRead
                | AccessKind::DepthStencilAttachmentWrite
                | AccessKind::Resolve
        )
    }
}

/// A half-open mip/array range. `level_count`/`layer_count` of `None` means
/// "to the end of the image", mirroring `ImageViewDesc::level_count`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SubresourceRange {
    pub aspect_mask: vk::ImageAspectFlags,
    pub base_mip_level: u32,
    pub level_count: Option<u32>,
    pub base_array_layer: u32,
    pub layer_count: Option<u32>,
}

impl SubresourceRange {
    pub fn whole_image(aspect_mask: vk::ImageAspectFlags) -> Self {
        Self {
            aspect_mask,
            base_mip_level: 0,
            level_count: None,
            base_array_layer: 0,
            layer_count: None,
        }
    }

    /// Whether `self` and `other` can describe two distinct, non-aliasing
    /// views of the same image (used to permit two non-overlapping writes
    /// within a single pass rather than rejecting it as write/write
    /// aliasing).
    pub fn overlaps(&self, other: &Self) -> bool {
        if self.aspect_mask & other.aspect_mask == vk::ImageAspectFlags::empty() {
            return false;
        }

        let mips_overlap = match (self.level_count, other.level_count) {
            (Some(a), Some(b)) => {
                self.base_mip_level < other.base_mip_level + b
                    && other.base_mip_level < self.base_mip_level + a
            }
            _ => true,
        };
        let layers_overlap = match (self.layer_count, other.layer_count) {
            (Some(a), Some(b)) => {
                self.base_array_layer < other.base_array_layer + b
                    && other.base_array_layer < self.base_array_layer + a
            }
            _ => true,
        };

        mips_overlap && layers_overlap
    }
}

/// A half-open byte range within a buffer. `size` of `None` means
/// `vk::WHOLE_SIZE`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ByteRange {
    pub offset: u64,
    pub size: Option<u64>,
}

impl ByteRange {
    pub fn whole_buffer() -> Self {
        Self {
            offset: 0,
            size: None,
        }
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        let self_end = self.size.map(|s| self.offset + s);
        let other_end = other.size.map(|s| other.offset + s);
        let self_before_other_end = other_end.map_or(true, |e| self.offset < e);
        let other_before_self_end = self_end.map_or(true, |e| other.offset < e);
        self_before_other_end && other_before_self_end
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LoadOp {
    Load,
    Clear,
    DontCare,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StoreOp {
    Store,
    DontCare,
}

/// The subresource a resource access touches: an image mip/layer range or a
/// buffer byte range.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AccessRange {
    Image(SubresourceRange),
    Buffer(ByteRange),
}

/// One pass's declared touch of one resource: what it does to it (`kind`),
/// from which pipeline stages, over which subresource, and — for
/// attachments — how the contents should be loaded/stored.
#[derive(Clone, Debug)]
pub struct AccessDescriptor {
    pub kind: AccessKind,
    pub stages: vk::PipelineStageFlags,
    pub range: AccessRange,
    pub load_op: LoadOp,
    pub store_op: StoreOp,
}

impl AccessDescriptor {
    pub fn overlaps(&self, other: &AccessDescriptor) -> bool {
        match (&self.range, &other.range) {
            (AccessRange::Image(a), AccessRange::Image(b)) => a.overlaps(b),
            (AccessRange::Buffer(a), AccessRange::Buffer(b)) => a.overlaps(b),
            _ => true,
        }
    }
}

/// The derived Vulkan-facing shape of an `AccessKind` + stage mask: the
/// stage/access mask pair and, for images, the required layout.
///
/// Produced by [`crate::barrier::derive_stage_access`]'s per-variant match
/// table, keyed on the coarser [`AccessKind`] instead of a full Vulkan
/// access-type enumeration.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct AccessInfo {
    pub stage_mask: vk::PipelineStageFlags,
    pub access_mask: vk::AccessFlags,
    pub image_layout: vk::ImageLayout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_image_ranges_always_overlap() {
        let a = SubresourceRange::whole_image(vk::ImageAspectFlags::COLOR);
        let b = SubresourceRange::whole_image(vk::ImageAspectFlags::COLOR);
        assert!(a.overlaps(&b));
    }

    #[test]
    fn disjoint_mips_do_not_overlap() {
        let a = SubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: 0,
            level_count: Some(1),
            base_array_layer: 0,
            layer_count: None,
        };
        let b = SubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: 1,
            level_count: Some(1),
            base_array_layer: 0,
            layer_count: None,
        };
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn disjoint_aspects_do_not_overlap() {
        let a = SubresourceRange::whole_image(vk::ImageAspectFlags::COLOR);
        let b = SubresourceRange::whole_image(vk::ImageAspectFlags::DEPTH);
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn byte_ranges_overlap_on_shared_bytes() {
        let a = ByteRange { offset: 0, size: Some(16) };
        let b = ByteRange { offset: 8, size: Some(16) };
        assert!(a.overlaps(&b));
    }

    #[test]
    fn byte_ranges_adjacent_do_not_overlap() {
        let a = ByteRange { offset: 0, size: Some(16) };
        let b = ByteRange { offset: 16, size: Some(16) };
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn present_is_neither_read_nor_write() {
        assert!(!AccessKind::Present.is_read());
        assert!(!AccessKind::Present.is_write());
    }

    #[test]
    fn undefined_is_neither_read_nor_write() {
        assert!(!AccessKind::Undefined.is_read());
        assert!(!AccessKind::Undefined.is_write());
    }
}
