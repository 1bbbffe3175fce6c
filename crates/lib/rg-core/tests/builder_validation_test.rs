use ash::vk;
use rg_core::{AccessKind, BufferDesc, GraphBuilder, ImageDesc, MemoryKind, QueueKind};

#[test]
fn overlapping_writes_to_the_same_resource_in_one_pass_are_rejected() {
    let mut builder = GraphBuilder::new();
    let image = builder.create_image(ImageDesc::new_2d(64, 64, vk::Format::R8G8B8A8_UNORM));

    let mut pass = builder.add_pass("double_write", QueueKind::Graphics);
    pass.write_image(
        &image,
        AccessKind::ColorAttachmentWrite,
        vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
        None,
        rg_core::LoadOp::Clear,
        rg_core::StoreOp::Store,
    )
    .unwrap();

    let result = pass.write_image(
        &image,
        AccessKind::ColorAttachmentWrite,
        vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
        None,
        rg_core::LoadOp::Load,
        rg_core::StoreOp::Store,
    );

    assert!(result.is_err());
}

#[test]
fn attachment_access_is_rejected_off_the_graphics_queue() {
    let mut builder = GraphBuilder::new();
    let image = builder.create_image(ImageDesc::new_2d(64, 64, vk::Format::R8G8B8A8_UNORM));

    let mut pass = builder.add_pass("compute_attachment", QueueKind::Compute);
    let result = pass.write_image(
        &image,
        AccessKind::ColorAttachmentWrite,
        vk::PipelineStageFlags::COMPUTE_SHADER,
        None,
        rg_core::LoadOp::Clear,
        rg_core::StoreOp::Store,
    );

    assert!(result.is_err());
}

#[test]
fn read_image_rejects_a_write_only_access_kind() {
    let mut builder = GraphBuilder::new();
    let image = builder.create_image(ImageDesc::new_2d(64, 64, vk::Format::R8G8B8A8_UNORM));

    let mut pass = builder.add_pass("misuse", QueueKind::Graphics);
    let result = pass.read_image(&image, AccessKind::ColorAttachmentWrite, vk::PipelineStageFlags::FRAGMENT_SHADER, None);

    assert!(result.is_err());
}

#[test]
fn a_pass_with_no_accesses_is_still_added_to_the_graph() {
    let mut builder = GraphBuilder::new();
    {
        let pass = builder.add_pass("empty", QueueKind::Transfer);
        pass.render(|_ctx| Ok(()));
    }

    let compiled = rg_core::compile(builder).expect("an empty pass is a degenerate but valid frame");
    assert_eq!(compiled.groups().len(), 1);
}

#[test]
fn exporting_an_unknown_buffer_handle_fails() {
    let mut builder = GraphBuilder::new();
    let other = GraphBuilder::new().create_buffer(BufferDesc::new(256, MemoryKind::GpuOnly));
    assert!(builder.export_buffer(&other).is_err());
}

#[test]
fn importing_a_second_swapchain_image_in_one_frame_is_rejected() {
    let mut builder = GraphBuilder::new();
    let desc = ImageDesc::new_2d(1280, 720, vk::Format::B8G8R8A8_UNORM);
    builder.import_swapchain_image(desc.clone()).unwrap();

    let err = builder.import_swapchain_image(desc).unwrap_err();
    assert!(matches!(err, rg_core::RgError::SwapchainMisuse(_)));
}
