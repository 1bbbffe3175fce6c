#[macro_use]
extern crate log;

use std::sync::Arc;
use std::time::Duration;

use rg_core::{compile, AccessKind, Executor, GraphBuilder, LoadOp, QueueKind, StoreOp};
use rg_log::LogConfig;
use structopt::StructOpt;

#[derive(StructOpt)]
#[structopt(name = "sandbox", about = "exercises rg-core against the mock backend")]
struct Args {
    /// log level (trace, debug, info, warn, error)
    #[structopt(short, long, default_value = "debug")]
    level: String,
}

fn parse_level(s: &str) -> rg_log::LevelFilter {
    match s.to_lowercase().trim() {
        "trace" => rg_log::LevelFilter::Trace,
        "debug" => rg_log::LevelFilter::Debug,
        "info" => rg_log::LevelFilter::Info,
        "warn" => rg_log::LevelFilter::Warn,
        "error" => rg_log::LevelFilter::Error,
        other => panic!("unknown log level: {}", other),
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::from_args();
    rg_log::init(LogConfig {
        level: parse_level(&args.level),
        log_file: None,
    });

    info!("building a one-pass frame against the mock backend");

    let device = Arc::new(rg_core::testing::MockDevice::new());
    let swapchain_desc = rg_core::ImageDesc::new_2d(1920, 1080, ash::vk::Format::B8G8R8A8_UNORM)
        .with_usage(ash::vk::ImageUsageFlags::COLOR_ATTACHMENT);
    let swapchain = rg_core::testing::MockSwapchain::new(swapchain_desc.clone());

    let mut builder = GraphBuilder::new();
    let backbuffer = builder.import_swapchain_image(swapchain_desc)?;

    let mut pass = builder.add_pass("clear_backbuffer", QueueKind::Graphics);
    pass.write_image(
        &backbuffer,
        AccessKind::ColorAttachmentWrite,
        ash::vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
        None,
        LoadOp::Clear,
        StoreOp::Store,
    )?;
    pass.render(|ctx| {
        ctx.draw(3, 1, 0);
        Ok(())
    });

    let frame = compile(builder)?;
    debug!("compiled frame has {} pass group(s)", frame.groups().len());

    let mut executor = Executor::new(device);
    executor.execute(frame, &swapchain, Duration::from_millis(16))?;

    info!("frame submitted and presented");
    Ok(())
}
