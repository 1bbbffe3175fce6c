//! In-memory mock `Device`/`Recorder`/`Swapchain` implementations. Always
//! compiled (not feature-gated) so both this crate's own test suite and a
//! downstream crate's integration tests can exercise the render graph
//! end-to-end without a real GPU backend — a concrete backend is out of
//! scope for this crate, so this is the only `Device` it ships.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::access::QueueKind;
use crate::barrier::{BufferBarrier, ImageBarrier};
use crate::error::RgResult;
use crate::recorder::{
    AcquireSemaphore, Device, DeviceBuffer, DeviceImage, DeviceImageView, Recorder, RenderingAttachment, Swapchain,
};
use crate::resource::{BufferDesc, ImageDesc};
use crate::timeline::TimelinePoint;

/// One recorded event, kept around so tests can assert on what a frame
/// actually did without a real driver to inspect.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedCommand {
    Draw { vertex_count: u32, instance_count: u32 },
    DrawIndexed { index_count: u32, instance_count: u32 },
    Dispatch { x: u32, y: u32, z: u32 },
    CopyBuffer { size: u64 },
    CopyBufferToImage,
    PushDebugMarker(String),
    PopDebugMarker,
    BeginConditionalRendering,
    EndConditionalRendering,
    PipelineBarrier { image_barriers: usize, buffer_barriers: usize },
    BeginRendering { color_targets: usize, has_depth: bool },
    EndRendering,
}

/// A submitted recording, captured for inspection instead of being played
/// back on a real queue.
pub struct RecordedSubmission {
    pub queue: QueueKind,
    pub commands: Vec<RecordedCommand>,
    pub waits: Vec<TimelinePoint>,
    pub acquire_wait: Option<AcquireSemaphore>,
    pub signal: TimelinePoint,
}

pub struct MockRecorder {
    queue: QueueKind,
    commands: Vec<RecordedCommand>,
}

impl Recorder for MockRecorder {
    fn draw(&mut self, vertex_count: u32, instance_count: u32, _first_vertex: u32) {
        self.commands.push(RecordedCommand::Draw { vertex_count, instance_count });
    }

    fn draw_indexed(&mut self, index_count: u32, instance_count: u32, _first_index: u32) {
        self.commands.push(RecordedCommand::DrawIndexed { index_count, instance_count });
    }

    fn dispatch(&mut self, group_count_x: u32, group_count_y: u32, group_count_z: u32) {
        self.commands.push(RecordedCommand::Dispatch {
            x: group_count_x,
            y: group_count_y,
            z: group_count_z,
        });
    }

    fn copy_buffer(&mut self, _src: DeviceBuffer, _dst: DeviceBuffer, size: u64) {
        self.commands.push(RecordedCommand::CopyBuffer { size });
    }

    fn copy_buffer_to_image(&mut self, _src: DeviceBuffer, _dst: DeviceImage) {
        self.commands.push(RecordedCommand::CopyBufferToImage);
    }

    fn push_debug_marker(&mut self, name: &str) {
        self.commands.push(RecordedCommand::PushDebugMarker(name.to_string()));
    }

    fn pop_debug_marker(&mut self) {
        self.commands.push(RecordedCommand::PopDebugMarker);
    }

    fn begin_conditional_rendering(&mut self, _predicate_buffer: DeviceBuffer, _offset: u64) {
        self.commands.push(RecordedCommand::BeginConditionalRendering);
    }

    fn end_conditional_rendering(&mut self) {
        self.commands.push(RecordedCommand::EndConditionalRendering);
    }

    fn pipeline_barrier(&mut self, image_barriers: &[ImageBarrier], buffer_barriers: &[BufferBarrier]) {
        self.commands.push(RecordedCommand::PipelineBarrier {
            image_barriers: image_barriers.len(),
            buffer_barriers: buffer_barriers.len(),
        });
    }

    fn begin_rendering(&mut self, color_targets: &[RenderingAttachment], depth_target: Option<RenderingAttachment>) {
        self.commands.push(RecordedCommand::BeginRendering {
            color_targets: color_targets.len(),
            has_depth: depth_target.is_some(),
        });
    }

    fn end_rendering(&mut self) {
        self.commands.push(RecordedCommand::EndRendering);
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// An in-memory `Device` that hands out incrementing fake handles and
/// records every submission instead of executing it, for use in this
/// crate's own tests and by downstream integration tests.
pub struct MockDevice {
    next_handle: AtomicU64,
    pub submissions: Mutex<Vec<RecordedSubmission>>,
    pub wait_idle_calls: AtomicU64,
}

impl MockDevice {
    pub fn new() -> Self {
        Self {
            next_handle: AtomicU64::new(1),
            submissions: Mutex::new(Vec::new()),
            wait_idle_calls: AtomicU64::new(0),
        }
    }

    fn alloc_handle(&self) -> u64 {
        self.next_handle.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl Device for MockDevice {
    fn create_image(&self, _desc: &ImageDesc) -> RgResult<DeviceImage> {
        Ok(DeviceImage(self.alloc_handle()))
    }

    fn destroy_image(&self, _image: DeviceImage) {}

    fn create_image_view(&self, image: DeviceImage, _desc: &ImageDesc) -> RgResult<DeviceImageView> {
        Ok(DeviceImageView(image.0))
    }

    fn create_buffer(&self, _desc: &BufferDesc) -> RgResult<DeviceBuffer> {
        Ok(DeviceBuffer(self.alloc_handle()))
    }

    fn destroy_buffer(&self, _buffer: DeviceBuffer) {}

    fn begin_recording(&self, queue: QueueKind) -> Box<dyn Recorder> {
        Box::new(MockRecorder { queue, commands: Vec::new() })
    }

    fn submit(
        &self,
        recorder: Box<dyn Recorder>,
        waits: &[TimelinePoint],
        acquire: Option<AcquireSemaphore>,
        signal: TimelinePoint,
    ) -> RgResult<()> {
        let commands = recorder
            .as_any()
            .downcast_ref::<MockRecorder>()
            .map(|r| r.commands.clone())
            .unwrap_or_default();
        self.submissions.lock().unwrap().push(RecordedSubmission {
            queue: signal.queue,
            commands,
            waits: waits.to_vec(),
            acquire_wait: acquire,
            signal,
        });
        Ok(())
    }

    fn wait_idle(&self) {
        self.wait_idle_calls.fetch_add(1, Ordering::Relaxed);
    }
}

/// A fixed-size mock swapchain: every `acquire` hands back the same image,
/// `present` just records the wait point it was given.
pub struct MockSwapchain {
    desc: ImageDesc,
    image: DeviceImage,
    next_semaphore: AtomicU64,
    pub presents: Mutex<Vec<TimelinePoint>>,
}

impl MockSwapchain {
    pub fn new(desc: ImageDesc) -> Self {
        Self {
            desc,
            image: DeviceImage(u64::MAX),
            next_semaphore: AtomicU64::new(1),
            presents: Mutex::new(Vec::new()),
        }
    }
}

impl Swapchain for MockSwapchain {
    fn image_desc(&self) -> ImageDesc {
        self.desc.clone()
    }

    fn acquire(&self, _timeout: Duration) -> RgResult<(DeviceImage, DeviceImageView, AcquireSemaphore)> {
        let semaphore = AcquireSemaphore(self.next_semaphore.fetch_add(1, Ordering::Relaxed));
        Ok((self.image, DeviceImageView(self.image.0), semaphore))
    }

    fn present(&self, wait: TimelinePoint) -> RgResult<()> {
        self.presents.lock().unwrap().push(wait);
        Ok(())
    }
}
