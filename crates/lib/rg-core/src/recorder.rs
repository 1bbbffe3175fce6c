use std::time::Duration;

use crate::access::QueueKind;
use crate::barrier::{BufferBarrier, ImageBarrier};
use crate::error::RgResult;
use crate::resource::{BufferDesc, ImageDesc};
use crate::timeline::TimelinePoint;

/// An opaque reference to a backend-owned image. The render graph core
/// never looks inside it; only a concrete `Device`/`Recorder` pair
/// (out of scope here per the crate's purpose — see crate docs) knows what
/// it actually addresses.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct DeviceImage(pub u64);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct DeviceBuffer(pub u64);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct DeviceImageView(pub u64);

/// A binary (non-timeline) semaphore the presentation engine signals once
/// it hands a swapchain image over. Distinct from [`TimelinePoint`] because
/// Vulkan's `VK_KHR_swapchain` acquire/present path is still binary-
/// semaphore-based even on a device that otherwise tracks everything else
/// through timeline semaphores.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct AcquireSemaphore(pub u64);

/// One color or depth/stencil attachment of a dynamic-rendering scope.
#[derive(Clone, Copy, Debug)]
pub struct RenderingAttachment {
    pub view: DeviceImageView,
    pub load_op: crate::access::LoadOp,
    pub store_op: crate::access::StoreOp,
    pub clear_value: Option<[f32; 4]>,
}

/// Device interface: the capability set a concrete backend exposes to the
/// render graph. Deliberately free of associated types so it stays
/// `dyn`-compatible — the Executor holds it as `&dyn Device` /
/// `Arc<dyn Device>` without knowing the concrete backend at compile time.
pub trait Device: Send + Sync {
    fn create_image(&self, desc: &ImageDesc) -> RgResult<DeviceImage>;
    fn destroy_image(&self, image: DeviceImage);
    fn create_image_view(&self, image: DeviceImage, desc: &ImageDesc) -> RgResult<DeviceImageView>;

    fn create_buffer(&self, desc: &BufferDesc) -> RgResult<DeviceBuffer>;
    fn destroy_buffer(&self, buffer: DeviceBuffer);

    /// Opens a new command recorder bound to the given queue. The Executor
    /// calls this once per Pass Group (a maximal contiguous run of passes
    /// on one queue), not once per pass.
    fn begin_recording(&self, queue: QueueKind) -> Box<dyn Recorder>;

    /// Submits a finished recording, waiting on the given timeline points
    /// (possibly on other queues) and, if this is the group that first
    /// touches a just-acquired swapchain image, on `acquire` as well,
    /// before executing and signaling `signal` once complete. `signal.queue`
    /// must equal the queue the recorder was opened on.
    fn submit(
        &self,
        recorder: Box<dyn Recorder>,
        waits: &[TimelinePoint],
        acquire: Option<AcquireSemaphore>,
        signal: TimelinePoint,
    ) -> RgResult<()>;

    /// Blocks until every queue is idle. Used only at shutdown.
    fn wait_idle(&self);
}

/// Swapchain contract: acquire hands back the backbuffer and the binary
/// semaphore the Executor must wait on before the first pass that touches
/// it runs; present consumes a point that the Executor has arranged to be
/// signaled once the last pass touching the backbuffer has retired it to
/// `AccessKind::Present`.
pub trait Swapchain: Send + Sync {
    fn image_desc(&self) -> ImageDesc;
    fn acquire(&self, timeout: Duration) -> RgResult<(DeviceImage, DeviceImageView, AcquireSemaphore)>;
    fn present(&self, wait: TimelinePoint) -> RgResult<()>;
}

/// Recorder interface: the command-recording surface a pass callback is
/// actually handed (by way of [`crate::pass_context::PassContext`], which
/// exposes only a curated subset of this trait — see its doc comment).
///
/// The barrier- and dynamic-rendering-scope methods are part of this trait
/// because a single object-safe trait is simpler than splitting user-facing
/// and executor-only capabilities across two traits with overlapping
/// concrete implementations; they are kept out of user reach by
/// `PassContext` simply never forwarding to them.
pub trait Recorder {
    fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32);
    fn draw_indexed(&mut self, index_count: u32, instance_count: u32, first_index: u32);
    fn dispatch(&mut self, group_count_x: u32, group_count_y: u32, group_count_z: u32);

    fn copy_buffer(&mut self, src: DeviceBuffer, dst: DeviceBuffer, size: u64);
    fn copy_buffer_to_image(&mut self, src: DeviceBuffer, dst: DeviceImage);

    fn push_debug_marker(&mut self, name: &str);
    fn pop_debug_marker(&mut self);

    /// Predicated draw/dispatch skipping, gated on a GPU-visible byte in
    /// `predicate_buffer` at `offset`. Kept as a bare primitive with no
    /// culling policy layered on top.
    fn begin_conditional_rendering(&mut self, predicate_buffer: DeviceBuffer, offset: u64);
    fn end_conditional_rendering(&mut self);

    /// Executor-only: emits the barriers the Barrier Solver derived for one
    /// slot of one pass. Never called from a pass callback.
    fn pipeline_barrier(&mut self, image_barriers: &[ImageBarrier], buffer_barriers: &[BufferBarrier]);

    /// Executor-only: opens/closes a dynamic-rendering scope around a
    /// raster pass's callback.
    fn begin_rendering(&mut self, color_targets: &[RenderingAttachment], depth_target: Option<RenderingAttachment>);
    fn end_rendering(&mut self);

    /// Lets a `Device::submit` implementation recover its own concrete
    /// recorder type from the `Box<dyn Recorder>` it's handed back, e.g.
    /// to read out a recorded command log in tests. A production backend
    /// can just return `self`.
    fn as_any(&self) -> &dyn std::any::Any;
}
