//! Process-wide logger setup shared by anything sitting on top of `rg-core`.
//! `rg-core` itself never calls [`init`] — it only emits `log` macro calls —
//! so a host binary (or a test harness that wants readable output) installs
//! this once at startup.

use std::path::PathBuf;

use fern::colors::{Color, ColoredLevelConfig};
pub use log::LevelFilter;

/// What to log at, and where the persistent copy goes.
#[derive(Clone)]
pub struct LogConfig {
    pub level: LevelFilter,
    /// Path the full (uncolored) log is additionally written to. `None`
    /// disables the file sink.
    pub log_file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Debug,
            log_file: Some(PathBuf::from("rg.log")),
        }
    }
}

/// Installs the global logger. Panics if a logger is already installed —
/// call this once, as early as possible in `main`.
pub fn init(config: LogConfig) {
    setup_logger(&config).expect("failed to initialize logging");
    log::info!("logging initialized at {:?}", config.level);
}

fn setup_logger(config: &LogConfig) -> anyhow::Result<()> {
    let colors = ColoredLevelConfig::new()
        .trace(Color::White)
        .debug(Color::Magenta)
        .info(Color::Cyan)
        .warn(Color::Yellow)
        .error(Color::Red);

    let stdout = fern::Dispatch::new()
        .filter(|metadata| metadata.level() >= log::Level::Info)
        .chain(std::io::stdout());

    let stderr = fern::Dispatch::new().level(LevelFilter::Warn).chain(std::io::stderr());

    let mut console_output = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                colors.color(record.level()),
                message
            ))
        })
        .chain(stdout)
        .chain(stderr);

    if let Some(path) = &config.log_file {
        let file_output = fern::Dispatch::new()
            .format(|out, message, record| {
                out.finish(format_args!(
                    "{}[{}][{}] {}",
                    chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                    record.target(),
                    record.level(),
                    message
                ))
            })
            .chain(
                std::fs::OpenOptions::new()
                    .create(true)
                    .write(true)
                    .truncate(true)
                    .open(path)?,
            );
        console_output = console_output.chain(file_output);
    }

    fern::Dispatch::new().level(config.level).chain(console_output).apply()?;

    Ok(())
}
