use std::sync::Arc;
use std::time::Duration;

use ash::vk;
use rg_core::testing::{MockDevice, MockSwapchain, RecordedCommand};
use rg_core::{AccessKind, BufferDesc, Device, GraphBuilder, ImageDesc, LoadOp, MemoryKind, QueueKind, StoreOp};

#[test]
fn a_single_graphics_pass_clears_and_presents_the_backbuffer() {
    let device = Arc::new(MockDevice::new());
    let swapchain_desc = ImageDesc::new_2d(1280, 720, vk::Format::B8G8R8A8_UNORM)
        .with_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT);
    let swapchain = MockSwapchain::new(swapchain_desc.clone());

    let mut builder = GraphBuilder::new();
    let backbuffer = builder.import_swapchain_image(swapchain_desc).unwrap();
    {
        let mut pass = builder.add_pass("clear", QueueKind::Graphics);
        pass.write_image(
            &backbuffer,
            AccessKind::ColorAttachmentWrite,
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            None,
            LoadOp::Clear,
            StoreOp::Store,
        )
        .unwrap();
        pass.render(|ctx| {
            ctx.draw(3, 1, 0);
            Ok(())
        });
    }

    let frame = rg_core::compile(builder).unwrap();
    let mut executor = rg_core::Executor::new(device.clone());
    executor.execute(frame, &swapchain, Duration::from_millis(16)).unwrap();

    assert_eq!(swapchain.presents.lock().unwrap().len(), 1);

    let submissions = device.submissions.lock().unwrap();
    assert_eq!(submissions.len(), 1);
    assert!(submissions[0].acquire_wait.is_some());
    let commands = &submissions[0].commands;
    assert!(commands.iter().any(|c| matches!(c, RecordedCommand::BeginRendering { .. })));
    assert!(commands.iter().any(|c| matches!(c, RecordedCommand::Draw { vertex_count: 3, .. })));
    assert!(commands.iter().any(|c| matches!(c, RecordedCommand::PipelineBarrier { .. })));
}

#[test]
fn a_transfer_then_graphics_chain_submits_two_groups_with_a_cross_queue_wait() {
    let device = Arc::new(MockDevice::new());
    let swapchain_desc = ImageDesc::new_2d(64, 64, vk::Format::B8G8R8A8_UNORM).with_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT);
    let swapchain = MockSwapchain::new(swapchain_desc.clone());

    let mut builder = GraphBuilder::new();
    let staging = builder.create_buffer(BufferDesc::new(4096, MemoryKind::CpuToGpu).with_usage(vk::BufferUsageFlags::TRANSFER_SRC));
    let backbuffer = builder.import_swapchain_image(swapchain_desc).unwrap();

    {
        let mut pass = builder.add_pass("upload", QueueKind::Transfer);
        pass.write_buffer(&staging, AccessKind::TransferWrite, vk::PipelineStageFlags::TRANSFER, None)
            .unwrap();
        pass.render(|_ctx| Ok(()));
    }
    {
        let mut pass = builder.add_pass("draw", QueueKind::Graphics);
        pass.read_buffer(&staging, AccessKind::ShaderRead, vk::PipelineStageFlags::VERTEX_SHADER, None)
            .unwrap();
        pass.write_image(
            &backbuffer,
            AccessKind::ColorAttachmentWrite,
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            None,
            LoadOp::Clear,
            StoreOp::Store,
        )
        .unwrap();
        pass.render(|ctx| {
            ctx.draw_indexed(6, 1, 0);
            Ok(())
        });
    }

    let frame = rg_core::compile(builder).unwrap();
    let mut executor = rg_core::Executor::new(device.clone());
    executor.execute(frame, &swapchain, Duration::from_millis(16)).unwrap();

    let submissions = device.submissions.lock().unwrap();
    assert_eq!(submissions.len(), 2);
    assert_eq!(submissions[0].queue, QueueKind::Transfer);
    assert_eq!(submissions[1].queue, QueueKind::Graphics);
    assert_eq!(submissions[1].waits.len(), 1);
    assert_eq!(submissions[1].waits[0].queue, QueueKind::Transfer);
    assert_eq!(submissions[1].waits[0].value, submissions[0].signal.value);
    assert!(submissions[0].acquire_wait.is_none());
    assert!(submissions[1].acquire_wait.is_some());
}

#[test]
fn an_imported_resources_last_access_is_written_back_after_execution() {
    let device = Arc::new(MockDevice::new());
    let swapchain_desc = ImageDesc::new_2d(32, 32, vk::Format::B8G8R8A8_UNORM);
    let swapchain = MockSwapchain::new(swapchain_desc.clone());

    let backing_buffer = device.create_buffer(&BufferDesc::new(256, MemoryKind::GpuOnly)).unwrap();

    let mut builder = GraphBuilder::new();
    let imported = builder.import_buffer(backing_buffer, BufferDesc::new(256, MemoryKind::GpuOnly), AccessKind::ShaderRead);
    let exported = builder.export_buffer(&imported).unwrap();

    {
        let mut pass = builder.add_pass("write_imported", QueueKind::Compute);
        pass.write_buffer(&imported, AccessKind::ShaderWrite, vk::PipelineStageFlags::COMPUTE_SHADER, None)
            .unwrap();
        pass.render(|_ctx| Ok(()));
    }

    let frame = rg_core::compile(builder).unwrap();
    let mut executor = rg_core::Executor::new(device);
    let retired = executor.execute(frame, &swapchain, Duration::from_millis(16)).unwrap();

    assert_eq!(retired.get_exported_access(exported).unwrap(), AccessKind::ShaderWrite);
}

#[test]
fn the_cpu_waits_for_the_device_once_frames_in_flight_is_exhausted() {
    let device = Arc::new(MockDevice::new());
    let swapchain_desc = ImageDesc::new_2d(32, 32, vk::Format::B8G8R8A8_UNORM);
    let swapchain = MockSwapchain::new(swapchain_desc);

    let config = rg_core::RenderGraphConfig::builder().frames_in_flight(2).build().unwrap();
    let mut executor = rg_core::Executor::with_config(device.clone(), config);

    for _ in 0..3 {
        let mut builder = GraphBuilder::new();
        let buffer = builder.create_buffer(BufferDesc::new(64, MemoryKind::GpuOnly));
        let mut pass = builder.add_pass("touch", QueueKind::Compute);
        pass.write_buffer(&buffer, AccessKind::ShaderWrite, vk::PipelineStageFlags::COMPUTE_SHADER, None)
            .unwrap();
        pass.render(|_ctx| Ok(()));

        let frame = rg_core::compile(builder).unwrap();
        executor.execute(frame, &swapchain, Duration::from_millis(16)).unwrap();
    }

    assert_eq!(device.wait_idle_calls.load(std::sync::atomic::Ordering::Relaxed), 1);
}
