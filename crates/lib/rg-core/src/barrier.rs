use ash::vk;

use crate::access::{AccessInfo, AccessKind, ByteRange, QueueKind, SubresourceRange};
use crate::recorder::{DeviceBuffer, DeviceImage};

/// Which point in a Pass Group's command recording a barrier belongs to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum BarrierSlot {
    /// Before the group's passes run: acquire-side ownership transfers and
    /// ordinary wait-before-read/write transitions.
    Prologue,
    /// After the group's passes run: release-side ownership transfers and
    /// transitions a later, different-queue group depends on.
    Epilogue,
    /// Multisample-resolve target transitions, and the final swapchain
    /// `Present` transition, folded into the epilogue of the last pass
    /// that writes the backbuffer rather than held in a separate trailing
    /// command list.
    Resolve,
}

#[derive(Clone, Copy, Debug, derive_builder::Builder)]
#[builder(pattern = "owned")]
pub struct ImageBarrier {
    pub image: DeviceImage,
    pub range: SubresourceRange,
    pub previous_access: AccessInfo,
    pub next_access: AccessInfo,
    #[builder(default)]
    pub src_queue_family: Option<QueueKind>,
    #[builder(default)]
    pub dst_queue_family: Option<QueueKind>,
    #[builder(default)]
    pub discard_contents: bool,
}

impl ImageBarrier {
    pub fn builder() -> ImageBarrierBuilder {
        ImageBarrierBuilder::default()
    }

    /// Whether this barrier performs a queue-family ownership transfer
    /// rather than a same-queue transition.
    pub fn is_ownership_transfer(&self) -> bool {
        match (self.src_queue_family, self.dst_queue_family) {
            (Some(a), Some(b)) => a != b,
            _ => false,
        }
    }
}

#[derive(Clone, Copy, Debug, derive_builder::Builder)]
#[builder(pattern = "owned")]
pub struct BufferBarrier {
    pub buffer: DeviceBuffer,
    pub range: ByteRange,
    pub previous_access: AccessInfo,
    pub next_access: AccessInfo,
    #[builder(default)]
    pub src_queue_family: Option<QueueKind>,
    #[builder(default)]
    pub dst_queue_family: Option<QueueKind>,
}

impl BufferBarrier {
    pub fn builder() -> BufferBarrierBuilder {
        BufferBarrierBuilder::default()
    }

    pub fn is_ownership_transfer(&self) -> bool {
        match (self.src_queue_family, self.dst_queue_family) {
            (Some(a), Some(b)) => a != b,
            _ => false,
        }
    }
}

/// Barrier Solver, stage/access/layout half: derives the Vulkan-facing
/// `AccessInfo` for a declared `(kind, stages)` pair.
///
/// A per-variant match table keyed on this crate's coarser [`AccessKind`],
/// taking the declaring pass's stage mask as an input instead of carrying
/// one fixed stage per variant.
pub fn derive_stage_access(kind: AccessKind, stages: vk::PipelineStageFlags) -> AccessInfo {
    use AccessKind::*;

    match kind {
        ColorAttachmentRead => AccessInfo {
            stage_mask: stages,
            access_mask: vk::AccessFlags::COLOR_ATTACHMENT_READ,
            image_layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        },
        ColorAttachmentWrite => AccessInfo {
            stage_mask: stages,
            access_mask: vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
            image_layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        },
        DepthStencilAttachmentRead => AccessInfo {
            stage_mask: stages,
            access_mask: vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ,
            image_layout: vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL,
        },
        DepthStencilAttachmentWrite => AccessInfo {
            stage_mask: stages,
            access_mask: vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            image_layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        },
        ShaderRead => AccessInfo {
            stage_mask: stages,
            access_mask: vk::AccessFlags::SHADER_READ,
            image_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        },
        ShaderWrite => AccessInfo {
            stage_mask: stages,
            access_mask: vk::AccessFlags::SHADER_WRITE,
            image_layout: vk::ImageLayout::GENERAL,
        },
        TransferRead => AccessInfo {
            stage_mask: vk::PipelineStageFlags::TRANSFER,
            access_mask: vk::AccessFlags::TRANSFER_READ,
            image_layout: vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
        },
        TransferWrite => AccessInfo {
            stage_mask: vk::PipelineStageFlags::TRANSFER,
            access_mask: vk::AccessFlags::TRANSFER_WRITE,
            image_layout: vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        },
        Resolve => AccessInfo {
            stage_mask: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            access_mask: vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
            image_layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        },
        Present => AccessInfo {
            stage_mask: vk::PipelineStageFlags::BOTTOM_OF_PIPE,
            access_mask: vk::AccessFlags::empty(),
            image_layout: vk::ImageLayout::PRESENT_SRC_KHR,
        },
        Undefined => undefined_access_info(),
    }
}

/// The access a freshly created or freshly imported resource starts in,
/// before any pass has touched it. Never a valid *declared* access, only a
/// transition source.
pub fn undefined_access_info() -> AccessInfo {
    AccessInfo {
        stage_mask: vk::PipelineStageFlags::TOP_OF_PIPE,
        access_mask: vk::AccessFlags::empty(),
        image_layout: vk::ImageLayout::UNDEFINED,
    }
}

/// Whether a transition from `previous` to `next` can be skipped entirely
/// — both states agree on layout and neither side needs to wait on a write
/// that already happened (matches `executing_graph.rs`'s
/// `skip_sync_if_same` fast path, generalized into a pure predicate).
pub fn is_noop_transition(previous: AccessInfo, next: AccessInfo) -> bool {
    previous.image_layout == next.image_layout
        && previous.access_mask == vk::AccessFlags::empty()
        && next.access_mask == vk::AccessFlags::empty()
}

/// Merges image barriers that target the same image, subresource range,
/// access transition and queue-transfer direction. Several passes in a
/// group discovering the identical transition independently is common
/// (e.g. two passes both reading a texture for the first time) and should
/// cost one barrier, not one per edge.
pub fn collapse_image_barriers(mut barriers: Vec<ImageBarrier>) -> Vec<ImageBarrier> {
    let mut collapsed: Vec<ImageBarrier> = Vec::with_capacity(barriers.len());
    'outer: for barrier in barriers.drain(..) {
        for existing in collapsed.iter_mut() {
            if existing.image == barrier.image
                && existing.range == barrier.range
                && existing.previous_access == barrier.previous_access
                && existing.next_access == barrier.next_access
                && existing.src_queue_family == barrier.src_queue_family
                && existing.dst_queue_family == barrier.dst_queue_family
            {
                existing.discard_contents &= barrier.discard_contents;
                continue 'outer;
            }
        }
        collapsed.push(barrier);
    }
    collapsed
}

pub fn collapse_buffer_barriers(mut barriers: Vec<BufferBarrier>) -> Vec<BufferBarrier> {
    let mut collapsed: Vec<BufferBarrier> = Vec::with_capacity(barriers.len());
    'outer: for barrier in barriers.drain(..) {
        for existing in collapsed.iter() {
            if existing.buffer == barrier.buffer
                && existing.range == barrier.range
                && existing.previous_access == barrier.previous_access
                && existing.next_access == barrier.next_access
                && existing.src_queue_family == barrier.src_queue_family
                && existing.dst_queue_family == barrier.dst_queue_family
            {
                continue 'outer;
            }
        }
        collapsed.push(barrier);
    }
    collapsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::DeviceImage;

    #[test]
    fn same_layout_with_no_access_is_a_noop() {
        let undefined = undefined_access_info();
        assert!(is_noop_transition(undefined, undefined));
    }

    #[test]
    fn read_after_read_is_not_a_noop_when_layout_changes() {
        let read = derive_stage_access(AccessKind::ShaderRead, vk::PipelineStageFlags::FRAGMENT_SHADER);
        let write = derive_stage_access(AccessKind::ShaderWrite, vk::PipelineStageFlags::COMPUTE_SHADER);
        assert!(!is_noop_transition(read, write));
    }

    #[test]
    fn present_layout_is_present_src() {
        let info = derive_stage_access(AccessKind::Present, vk::PipelineStageFlags::BOTTOM_OF_PIPE);
        assert_eq!(info.image_layout, vk::ImageLayout::PRESENT_SRC_KHR);
    }

    #[test]
    fn identical_image_barriers_collapse_into_one() {
        let range = SubresourceRange::whole_image(vk::ImageAspectFlags::COLOR);
        let previous = undefined_access_info();
        let next = derive_stage_access(AccessKind::ColorAttachmentWrite, vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT);

        let a = ImageBarrier::builder()
            .image(DeviceImage(1))
            .range(range)
            .previous_access(previous)
            .next_access(next)
            .src_queue_family(None)
            .dst_queue_family(None)
            .discard_contents(true)
            .build()
            .unwrap();
        let b = ImageBarrier::builder()
            .image(DeviceImage(1))
            .range(range)
            .previous_access(previous)
            .next_access(next)
            .src_queue_family(None)
            .dst_queue_family(None)
            .discard_contents(true)
            .build()
            .unwrap();

        let collapsed = collapse_image_barriers(vec![a, b]);
        assert_eq!(collapsed.len(), 1);
    }

    #[test]
    fn ownership_transfer_is_detected_only_across_distinct_queues() {
        let range = SubresourceRange::whole_image(vk::ImageAspectFlags::COLOR);
        let info = undefined_access_info();
        let same_queue = ImageBarrier::builder()
            .image(DeviceImage(1))
            .range(range)
            .previous_access(info)
            .next_access(info)
            .src_queue_family(Some(QueueKind::Graphics))
            .dst_queue_family(Some(QueueKind::Graphics))
            .discard_contents(false)
            .build()
            .unwrap();
        let cross_queue = ImageBarrier::builder()
            .image(DeviceImage(1))
            .range(range)
            .previous_access(info)
            .next_access(info)
            .src_queue_family(Some(QueueKind::Graphics))
            .dst_queue_family(Some(QueueKind::Transfer))
            .discard_contents(false)
            .build()
            .unwrap();

        assert!(!same_queue.is_ownership_transfer());
        assert!(cross_queue.is_ownership_transfer());
    }
}
