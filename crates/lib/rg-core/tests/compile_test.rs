use ash::vk;
use rg_core::{AccessKind, BufferDesc, GraphBuilder, ImageDesc, LoadOp, MemoryKind, QueueKind, StoreOp};

#[test]
fn same_queue_passes_collapse_into_one_group() {
    let mut builder = GraphBuilder::new();
    let buffer = builder.create_buffer(BufferDesc::new(1024, MemoryKind::GpuOnly));

    {
        let mut pass = builder.add_pass("produce", QueueKind::Transfer);
        pass.write_buffer(&buffer, AccessKind::TransferWrite, vk::PipelineStageFlags::TRANSFER, None)
            .unwrap();
        pass.render(|_ctx| Ok(()));
    }
    {
        let mut pass = builder.add_pass("consume", QueueKind::Transfer);
        pass.read_buffer(&buffer, AccessKind::TransferRead, vk::PipelineStageFlags::TRANSFER, None)
            .unwrap();
        pass.render(|_ctx| Ok(()));
    }

    let compiled = rg_core::compile(builder).unwrap();
    assert_eq!(compiled.groups().len(), 1);
    assert_eq!(compiled.groups()[0].passes.len(), 2);
}

#[test]
fn passes_on_different_queues_form_distinct_groups() {
    let mut builder = GraphBuilder::new();
    let buffer = builder.create_buffer(BufferDesc::new(1024, MemoryKind::GpuOnly));

    {
        let mut pass = builder.add_pass("upload", QueueKind::Transfer);
        pass.write_buffer(&buffer, AccessKind::TransferWrite, vk::PipelineStageFlags::TRANSFER, None)
            .unwrap();
        pass.render(|_ctx| Ok(()));
    }
    {
        let mut pass = builder.add_pass("dispatch", QueueKind::Compute);
        pass.read_buffer(&buffer, AccessKind::ShaderRead, vk::PipelineStageFlags::COMPUTE_SHADER, None)
            .unwrap();
        pass.render(|_ctx| Ok(()));
    }

    let compiled = rg_core::compile(builder).unwrap();
    assert_eq!(compiled.groups().len(), 2);
    assert_eq!(compiled.groups()[0].queue, QueueKind::Transfer);
    assert_eq!(compiled.groups()[1].queue, QueueKind::Compute);
}

#[test]
fn non_overlapping_transient_images_are_aliased_onto_one_slot() {
    let mut builder = GraphBuilder::new();
    let desc = ImageDesc::new_2d(256, 256, vk::Format::R8G8B8A8_UNORM).with_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT);

    let first = builder.create_image(desc.clone());
    {
        let mut pass = builder.add_pass("write_first", QueueKind::Graphics);
        pass.write_image(
            &first,
            AccessKind::ColorAttachmentWrite,
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            None,
            LoadOp::Clear,
            StoreOp::Store,
        )
        .unwrap();
        pass.render(|_ctx| Ok(()));
    }
    {
        let mut pass = builder.add_pass("read_first", QueueKind::Graphics);
        pass.read_image(&first, AccessKind::ShaderRead, vk::PipelineStageFlags::FRAGMENT_SHADER, None)
            .unwrap();
        pass.render(|_ctx| Ok(()));
    }

    let second = builder.create_image(desc);
    {
        let mut pass = builder.add_pass("write_second", QueueKind::Graphics);
        pass.write_image(
            &second,
            AccessKind::ColorAttachmentWrite,
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            None,
            LoadOp::Clear,
            StoreOp::Store,
        )
        .unwrap();
        pass.render(|_ctx| Ok(()));
    }

    // both images are never alive at the same time, so the Compiler should
    // be free to alias them onto the same physical slot.
    let first_raw = first.raw();
    let second_raw = second.raw();
    let compiled = rg_core::compile(builder).unwrap();
    assert_eq!(compiled.groups().len(), 1);
    assert_eq!(compiled.alias_slot_of(first_raw), compiled.alias_slot_of(second_raw));
}

#[test]
fn a_fan_out_from_one_writer_compiles_in_declared_order() {
    let mut builder = GraphBuilder::new();
    let buffer = builder.create_buffer(BufferDesc::new(64, MemoryKind::GpuOnly));
    for i in 0..5 {
        let mut pass = builder.add_pass(format!("pass_{i}"), QueueKind::Graphics);
        if i == 0 {
            pass.write_buffer(&buffer, AccessKind::TransferWrite, vk::PipelineStageFlags::TRANSFER, None)
                .unwrap();
        } else {
            pass.read_buffer(&buffer, AccessKind::ShaderRead, vk::PipelineStageFlags::VERTEX_SHADER, None)
                .unwrap();
        }
        pass.render(|_ctx| Ok(()));
    }

    let compiled = rg_core::compile(builder).unwrap();
    assert_eq!(compiled.groups()[0].passes.len(), 5);
}

#[test]
fn two_passes_each_producing_the_others_dependency_is_rejected_as_cyclic() {
    let mut builder = GraphBuilder::new();
    let x = builder.create_buffer(BufferDesc::new(64, MemoryKind::GpuOnly));
    let y = builder.create_buffer(BufferDesc::new(64, MemoryKind::GpuOnly));

    {
        let mut pass = builder.add_pass("a", QueueKind::Graphics);
        pass.write_buffer(&x, AccessKind::ShaderWrite, vk::PipelineStageFlags::COMPUTE_SHADER, None)
            .unwrap();
        pass.read_buffer(&y, AccessKind::ShaderRead, vk::PipelineStageFlags::COMPUTE_SHADER, None)
            .unwrap();
        pass.render(|_ctx| Ok(()));
    }
    {
        let mut pass = builder.add_pass("b", QueueKind::Graphics);
        pass.write_buffer(&y, AccessKind::ShaderWrite, vk::PipelineStageFlags::COMPUTE_SHADER, None)
            .unwrap();
        pass.read_buffer(&x, AccessKind::ShaderRead, vk::PipelineStageFlags::COMPUTE_SHADER, None)
            .unwrap();
        pass.render(|_ctx| Ok(()));
    }

    let err = rg_core::compile(builder).unwrap_err();
    assert!(matches!(err, rg_core::RgError::CyclicDependency(_)));
}
