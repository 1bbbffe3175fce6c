use crate::access::{AccessDescriptor, QueueKind};
use crate::error::RgResult;
use crate::handle::RawHandle;
use crate::pass_context::PassContext;

/// The callback a pass runs once the Executor has emitted its barriers and
/// opened (for raster passes) a dynamic-rendering scope. Boxed and
/// type-erased so a compiled frame can hold a homogeneous list of passes
/// regardless of each one's captured closure state.
pub type RenderFunc = dyn FnOnce(&mut PassContext) -> RgResult<()> + Send;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum PassAccessTarget {
    Image(RawHandle),
    Buffer(RawHandle),
}

pub(crate) struct PassAccess {
    pub target: PassAccessTarget,
    pub desc: AccessDescriptor,
}

/// A single node of the render graph: a named unit of GPU work, the queue
/// it runs on, the resources it touches and how, and the callback that
/// records its commands.
pub struct Pass {
    pub(crate) id: u32,
    pub(crate) name: String,
    pub(crate) queue: QueueKind,
    pub(crate) accesses: Vec<PassAccess>,
    pub(crate) render_func: Option<Box<RenderFunc>>,
}

impl Pass {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn queue(&self) -> QueueKind {
        self.queue
    }

    pub(crate) fn writes_resource(&self, raw: RawHandle) -> bool {
        self.accesses
            .iter()
            .any(|a| a.desc.kind.is_write() && target_raw(a.target) == raw)
    }

    pub(crate) fn reads_or_writes_resource(&self, raw: RawHandle) -> bool {
        self.accesses.iter().any(|a| target_raw(a.target) == raw)
    }
}

pub(crate) fn target_raw(t: PassAccessTarget) -> RawHandle {
    match t {
        PassAccessTarget::Image(h) => h,
        PassAccessTarget::Buffer(h) => h,
    }
}
