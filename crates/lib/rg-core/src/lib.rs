//! A per-frame declarative render graph: applications register resources
//! and passes against a [`builder::GraphBuilder`], [`compiler::compile`]
//! topologically sorts and groups the passes and plans transient resource
//! aliasing, the derivations in [`barrier`] work out every synchronization
//! point, and an [`executor::Executor`] drives a concrete [`recorder::Device`]
//! through submission and presentation.
//!
//! The concrete backend (Vulkan, or anything else) is out of scope for
//! this crate — [`recorder::Device`] and [`recorder::Recorder`] are the
//! capability interfaces a backend implements; [`testing`] ships an
//! in-memory mock of both for use in tests.

pub mod access;
pub mod barrier;
pub mod builder;
pub mod compiler;
pub mod config;
pub mod error;
pub mod executor;
pub mod handle;
pub mod pass;
pub mod pass_context;
pub mod recorder;
pub mod resource;
pub mod testing;
pub mod timeline;

pub use access::{AccessDescriptor, AccessKind, ByteRange, LoadOp, QueueKind, StoreOp, SubresourceRange};
pub use builder::{GraphBuilder, PassBuilder};
pub use compiler::{compile, CompiledFrame};
pub use config::{RenderGraphConfig, RenderGraphConfigBuilder};
pub use error::{RgError, RgResult};
pub use executor::Executor;
pub use handle::{ExportedHandle, Handle, RawHandle};
pub use pass::Pass;
pub use pass_context::PassContext;
pub use recorder::{Device, DeviceBuffer, DeviceImage, DeviceImageView, Recorder, Swapchain};
pub use resource::{
    BufferDesc, BufferHandle, ExportedBufferHandle, ExportedImageHandle, ImageDesc, ImageHandle, MemoryKind,
    ResourceRegistry,
};

extern crate log as glog;
