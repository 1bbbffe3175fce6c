use crate::handle::RawHandle;
use crate::recorder::{DeviceBuffer, DeviceImage, Recorder};
use crate::resource::{BufferHandle, ImageHandle};

/// Maps a pass's declared resource handles to the concrete backend objects
/// the Executor bound them to for this frame. Populated by
/// `compiler::CompiledFrame::bind` and consulted only through
/// [`PassContext`].
pub struct ResourceBindings {
    pub(crate) images: Vec<DeviceImage>,
    pub(crate) buffers: Vec<DeviceBuffer>,
}

impl ResourceBindings {
    pub(crate) fn image(&self, raw: RawHandle) -> DeviceImage {
        self.images[raw.id as usize]
    }

    pub(crate) fn buffer(&self, raw: RawHandle) -> DeviceBuffer {
        self.buffers[raw.id as usize]
    }
}

/// The curated surface a pass callback actually sees: resource lookups and
/// ordinary drawing/dispatch/copy/debug-marker commands. Barrier emission
/// and dynamic-rendering begin/end calls are made by the Executor before
/// and after the callback runs, never by the callback itself. This wrapper
/// is what enforces that: it holds a `&mut dyn Recorder` but only forwards
/// the user-facing subset of that trait.
pub struct PassContext<'a> {
    recorder: &'a mut dyn Recorder,
    bindings: &'a ResourceBindings,
}

impl<'a> PassContext<'a> {
    pub(crate) fn new(recorder: &'a mut dyn Recorder, bindings: &'a ResourceBindings) -> Self {
        Self { recorder, bindings }
    }

    pub fn image(&self, handle: &ImageHandle) -> DeviceImage {
        self.bindings.image(handle.raw())
    }

    pub fn buffer(&self, handle: &BufferHandle) -> DeviceBuffer {
        self.bindings.buffer(handle.raw())
    }

    pub fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32) {
        self.recorder.draw(vertex_count, instance_count, first_vertex);
    }

    pub fn draw_indexed(&mut self, index_count: u32, instance_count: u32, first_index: u32) {
        self.recorder.draw_indexed(index_count, instance_count, first_index);
    }

    pub fn dispatch(&mut self, group_count_x: u32, group_count_y: u32, group_count_z: u32) {
        self.recorder.dispatch(group_count_x, group_count_y, group_count_z);
    }

    pub fn copy_buffer(&mut self, src: DeviceBuffer, dst: DeviceBuffer, size: u64) {
        self.recorder.copy_buffer(src, dst, size);
    }

    pub fn copy_buffer_to_image(&mut self, src: DeviceBuffer, dst: DeviceImage) {
        self.recorder.copy_buffer_to_image(src, dst);
    }

    pub fn push_debug_marker(&mut self, name: &str) {
        self.recorder.push_debug_marker(name);
    }

    pub fn pop_debug_marker(&mut self) {
        self.recorder.pop_debug_marker();
    }

    pub fn begin_conditional_rendering(&mut self, predicate_buffer: DeviceBuffer, offset: u64) {
        self.recorder.begin_conditional_rendering(predicate_buffer, offset);
    }

    pub fn end_conditional_rendering(&mut self) {
        self.recorder.end_conditional_rendering();
    }
}
