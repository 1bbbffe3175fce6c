use std::sync::Arc;
use std::time::Duration;

use crate::access::QueueKind;
use crate::barrier::{self, BarrierSlot, BufferBarrier, ImageBarrier};
use crate::compiler::{CompiledFrame, ResourceTransition};
use crate::config::RenderGraphConfig;
use crate::error::{RgError, RgResult};
use crate::pass::PassAccessTarget;
use crate::pass_context::{PassContext, ResourceBindings};
use crate::recorder::{AcquireSemaphore, Device, DeviceBuffer, DeviceImage, RenderingAttachment, Swapchain};
use crate::resource::{BoundResource, ResourceOrigin};
use crate::timeline::{TimelinePoint, TimelineTracker};

/// Executor: walks a [`CompiledFrame`]'s Pass Groups in submission order,
/// binding resources, emitting the Barrier Solver's transitions and running
/// each pass's callback, then submits and — if the frame touched a
/// swapchain — presents.
///
/// Owns no cross-frame temporal-resource cache — see
/// [`crate::builder::GraphBuilder`]'s doc comment for why. It does throttle
/// how many frames' worth of submissions the CPU is allowed to get ahead of
/// the GPU by, per [`RenderGraphConfig::frames_in_flight`]: every time that
/// many frames have been submitted without a wait, `execute` blocks on
/// `Device::wait_idle` before recording the next one.
pub struct Executor {
    device: Arc<dyn Device>,
    config: RenderGraphConfig,
    timeline: TimelineTracker,
    last_signal: std::collections::HashMap<QueueKind, u64>,
    frames_submitted: u64,
}

impl Executor {
    pub fn new(device: Arc<dyn Device>) -> Self {
        Self::with_config(device, RenderGraphConfig::default())
    }

    pub fn with_config(device: Arc<dyn Device>, config: RenderGraphConfig) -> Self {
        Self {
            device,
            config,
            timeline: TimelineTracker::new(),
            last_signal: std::collections::HashMap::new(),
            frames_submitted: 0,
        }
    }

    /// Executes a compiled frame against a swapchain, acquiring the
    /// backbuffer with [`RenderGraphConfig::default_wait_timeout`].
    pub fn execute_with_default_timeout(&mut self, frame: CompiledFrame, swapchain: &dyn Swapchain) -> RgResult<CompiledFrame> {
        let timeout = self.config.default_wait_timeout;
        self.execute(frame, swapchain, timeout)
    }

    /// Executes a compiled frame against a swapchain, acquiring the
    /// backbuffer as late as possible (only once the passes preceding the
    /// first swapchain-touching pass have already been recorded) and
    /// presenting once the frame's last pass has retired it.
    ///
    /// Blocks on `Device::wait_idle` first if this frame would put more
    /// than [`RenderGraphConfig::frames_in_flight`] frames' worth of
    /// submissions ahead of the GPU, so aliased transient allocations from a
    /// frame that far back are safe to reuse without the Executor needing
    /// its own cross-frame fence bookkeeping.
    ///
    /// Returns the retired frame so the caller can read back the final
    /// access state of anything it exported via
    /// [`crate::builder::GraphBuilder::export_image`]/`export_buffer`
    /// through [`CompiledFrame::get_exported_access`].
    pub fn execute(&mut self, mut frame: CompiledFrame, swapchain: &dyn Swapchain, acquire_timeout: Duration) -> RgResult<CompiledFrame> {
        if self.config.frames_in_flight > 0 && self.frames_submitted % self.config.frames_in_flight as u64 == 0 && self.frames_submitted > 0
        {
            self.device.wait_idle();
        }
        self.frames_submitted += 1;

        let bindings = self.bind_resources(&mut frame)?;

        let first_swapchain_pass = frame.swapchain_resource.and_then(|resource_id| {
            frame
                .order
                .iter()
                .find(|&&pass_id| {
                    let pass = frame.passes.iter().find(|p| p.id == pass_id).unwrap();
                    pass.reads_or_writes_resource(crate::handle::RawHandle { id: resource_id, generation: 0 })
                })
                .copied()
        });

        let mut bindings = bindings;
        let mut acquired = false;

        for group_idx in 0..frame.groups.len() {
            let queue = frame.groups[group_idx].queue;
            let pass_ids = frame.groups[group_idx].passes.clone();
            let mut acquire_wait = None;

            if !acquired {
                if let Some(first_pass) = first_swapchain_pass {
                    if pass_ids.contains(&first_pass) {
                        let (image, _view, semaphore) = swapchain.acquire(acquire_timeout)?;
                        let resource_id = frame.swapchain_resource.unwrap();
                        frame
                            .registry
                            .bind_swapchain_image(crate::handle::RawHandle { id: resource_id, generation: 0 }, image)?;
                        bindings.images[resource_id as usize] = image;
                        acquired = true;
                        acquire_wait = Some(semaphore);
                    }
                }
            }

            self.submit_group(&mut frame, queue, &pass_ids, &bindings, acquire_wait)?;
        }

        if let Some(resource_id) = frame.swapchain_resource {
            let signal_queue = frame
                .passes
                .iter()
                .find(|p| p.id == first_swapchain_pass.unwrap_or(u32::MAX))
                .map(|p| p.queue)
                .unwrap_or(QueueKind::Graphics);
            let value = self.timeline.current_value(signal_queue);
            swapchain.present(TimelinePoint { queue: signal_queue, value })?;
            let _ = resource_id;
        }

        self.write_back_access(&mut frame);

        Ok(frame)
    }

    fn bind_resources(&self, frame: &mut CompiledFrame) -> RgResult<ResourceBindings> {
        let count = frame.registry.len();
        let mut images = vec![DeviceImage(0); count];
        let mut buffers = vec![DeviceBuffer(0); count];

        // one allocation per alias slot; the first resource to claim a slot
        // triggers the real `create_image`/`create_buffer` call, every
        // later resource aliased onto that slot reuses the same handle.
        let mut slot_images: std::collections::HashMap<u32, DeviceImage> = std::collections::HashMap::new();
        let mut slot_buffers: std::collections::HashMap<u32, DeviceBuffer> = std::collections::HashMap::new();

        for (id, entry) in frame.registry.iter() {
            match entry.bound {
                Some(BoundResource::Image(image)) => images[id as usize] = image,
                Some(BoundResource::Buffer(buffer)) => buffers[id as usize] = buffer,
                None => match entry.origin {
                    ResourceOrigin::Swapchain => {}
                    ResourceOrigin::Transient => match &entry.desc {
                        crate::resource::ResourceDescKind::Image(desc) => {
                            let slot = frame.alias_plan.get(&id).copied();
                            let image = match slot.and_then(|s| slot_images.get(&s).copied()) {
                                Some(existing) => existing,
                                None => {
                                    let created = self.device.create_image(desc)?;
                                    if let Some(slot) = slot {
                                        slot_images.insert(slot, created);
                                    }
                                    created
                                }
                            };
                            images[id as usize] = image;
                        }
                        crate::resource::ResourceDescKind::Buffer(desc) => {
                            let slot = frame.alias_plan.get(&id).copied();
                            let buffer = match slot.and_then(|s| slot_buffers.get(&s).copied()) {
                                Some(existing) => existing,
                                None => {
                                    let created = self.device.create_buffer(desc)?;
                                    if let Some(slot) = slot {
                                        slot_buffers.insert(slot, created);
                                    }
                                    created
                                }
                            };
                            buffers[id as usize] = buffer;
                        }
                    },
                    ResourceOrigin::Imported => {
                        return Err(RgError::UnknownHandle(crate::handle::RawHandle { id, generation: 0 }));
                    }
                },
            }
        }

        Ok(ResourceBindings { images, buffers })
    }

    fn submit_group(
        &mut self,
        frame: &mut CompiledFrame,
        queue: QueueKind,
        pass_ids: &[u32],
        bindings: &ResourceBindings,
        acquire_wait: Option<AcquireSemaphore>,
    ) -> RgResult<()> {
        let mut recorder = self.device.begin_recording(queue);

        let mut waits = Vec::new();
        for &pass_id in pass_ids {
            for transition in frame.barriers_for(pass_id, BarrierSlot::Prologue) {
                if let Some(src_queue) = transition.src_queue {
                    if src_queue != queue && !waits.iter().any(|w: &TimelinePoint| w.queue == src_queue) {
                        let value = self.last_signal.get(&src_queue).copied().unwrap_or(0);
                        waits.push(TimelinePoint { queue: src_queue, value });
                    }
                }
            }
        }

        for &pass_id in pass_ids {
            emit_barriers(recorder.as_mut(), frame, pass_id, BarrierSlot::Prologue, bindings);

            let pass = frame.passes.iter_mut().find(|p| p.id == pass_id).unwrap();
            recorder.push_debug_marker(pass.name());

            let is_raster = pass.accesses.iter().any(|a| a.desc.kind.is_attachment());
            let func = pass
                .render_func
                .take()
                .expect("compiled pass must carry a render callback");

            if is_raster {
                let (color_targets, depth_target) = rendering_attachments(pass, bindings);
                recorder.begin_rendering(&color_targets, depth_target);
                run_pass(func, recorder.as_mut(), bindings)?;
                recorder.end_rendering();
            } else {
                run_pass(func, recorder.as_mut(), bindings)?;
            }

            recorder.pop_debug_marker();

            emit_barriers(recorder.as_mut(), frame, pass_id, BarrierSlot::Epilogue, bindings);
            emit_barriers(recorder.as_mut(), frame, pass_id, BarrierSlot::Resolve, bindings);
        }

        let signal_value = self.timeline.next_value(queue);
        self.device
            .submit(recorder, &waits, acquire_wait, TimelinePoint { queue, value: signal_value })?;
        self.last_signal.insert(queue, signal_value);

        Ok(())
    }

    fn write_back_access(&self, frame: &mut CompiledFrame) {
        let mut updates = Vec::new();
        for &pass_id in &frame.order {
            for slot in [BarrierSlot::Prologue, BarrierSlot::Epilogue, BarrierSlot::Resolve] {
                for transition in frame.barriers_for(pass_id, slot) {
                    let raw = crate::pass::target_raw(transition.target);
                    updates.push((raw.id, access_kind_from_info(transition.next)));
                }
            }
        }
        for (id, kind) in updates {
            frame.registry.set_last_access(id, kind);
        }
    }
}

fn rendering_attachments(
    pass: &crate::pass::Pass,
    bindings: &ResourceBindings,
) -> (Vec<RenderingAttachment>, Option<RenderingAttachment>) {
    let mut color = Vec::new();
    let mut depth = None;
    for access in &pass.accesses {
        if !access.desc.kind.is_attachment() {
            continue;
        }
        let raw = crate::pass::target_raw(access.target);
        let view = crate::recorder::DeviceImageView(bindings.image(raw).0);
        let attachment = RenderingAttachment {
            view,
            load_op: access.desc.load_op,
            store_op: access.desc.store_op,
            clear_value: None,
        };
        match access.desc.kind {
            crate::access::AccessKind::ColorAttachmentWrite | crate::access::AccessKind::ColorAttachmentRead => {
                color.push(attachment)
            }
            crate::access::AccessKind::DepthStencilAttachmentWrite
            | crate::access::AccessKind::DepthStencilAttachmentRead => depth = Some(attachment),
            _ => {}
        }
    }
    (color, depth)
}

fn run_pass(
    func: Box<crate::pass::RenderFunc>,
    recorder: &mut dyn crate::recorder::Recorder,
    bindings: &ResourceBindings,
) -> RgResult<()> {
    let mut ctx = PassContext::new(recorder, bindings);
    func(&mut ctx)
}

fn emit_barriers(
    recorder: &mut dyn crate::recorder::Recorder,
    frame: &CompiledFrame,
    pass_id: u32,
    slot: BarrierSlot,
    bindings: &ResourceBindings,
) {
    let transitions = frame.barriers_for(pass_id, slot);
    if transitions.is_empty() {
        return;
    }

    let mut image_barriers = Vec::new();
    let mut buffer_barriers = Vec::new();
    for transition in transitions {
        match transition.target {
            PassAccessTarget::Image(raw) => {
                let image = bindings.image(raw);
                let range = match transition.range {
                    crate::access::AccessRange::Image(r) => r,
                    _ => unreachable!("image target must carry an image range"),
                };
                image_barriers.push(to_image_barrier(transition, image, range));
            }
            PassAccessTarget::Buffer(raw) => {
                let buffer = bindings.buffer(raw);
                let range = match transition.range {
                    crate::access::AccessRange::Buffer(r) => r,
                    _ => unreachable!("buffer target must carry a buffer range"),
                };
                buffer_barriers.push(to_buffer_barrier(transition, buffer, range));
            }
        }
    }

    let image_barriers = barrier::collapse_image_barriers(image_barriers);
    let buffer_barriers = barrier::collapse_buffer_barriers(buffer_barriers);
    recorder.pipeline_barrier(&image_barriers, &buffer_barriers);
}

fn to_image_barrier(transition: &ResourceTransition, image: DeviceImage, range: crate::access::SubresourceRange) -> ImageBarrier {
    ImageBarrier::builder()
        .image(image)
        .range(range)
        .previous_access(transition.previous)
        .next_access(transition.next)
        .src_queue_family(transition.src_queue)
        .dst_queue_family(transition.dst_queue)
        .discard_contents(transition.discard_contents)
        .build()
        .expect("all ImageBarrier fields are populated above")
}

fn to_buffer_barrier(transition: &ResourceTransition, buffer: DeviceBuffer, range: crate::access::ByteRange) -> BufferBarrier {
    BufferBarrier::builder()
        .buffer(buffer)
        .range(range)
        .previous_access(transition.previous)
        .next_access(transition.next)
        .src_queue_family(transition.src_queue)
        .dst_queue_family(transition.dst_queue)
        .build()
        .expect("all BufferBarrier fields are populated above")
}

fn access_kind_from_info(info: crate::access::AccessInfo) -> crate::access::AccessKind {
    use crate::access::AccessKind::*;
    match info.image_layout {
        ash::vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL => ColorAttachmentWrite,
        ash::vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL => DepthStencilAttachmentWrite,
        ash::vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL => DepthStencilAttachmentRead,
        ash::vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL => ShaderRead,
        ash::vk::ImageLayout::TRANSFER_SRC_OPTIMAL => TransferRead,
        ash::vk::ImageLayout::TRANSFER_DST_OPTIMAL => TransferWrite,
        ash::vk::ImageLayout::PRESENT_SRC_KHR => Present,
        ash::vk::ImageLayout::GENERAL => ShaderWrite,
        _ => ShaderRead,
    }
}
