mod cli;
mod lang;
mod path;
mod prelude;
mod process;
mod report;
mod resource;
mod scan;
mod serialization;

#[cfg(test)]
mod testing;

use crate::{
    lang::TRANSLATOR,
    prelude::{app_dir, CONFIG_DIR, VERSION},
};

/// The logger handle must be kept alive until the end of `main`,
/// or buffered lines may be lost.
fn prepare_logging() -> Result<flexi_logger::LoggerHandle, flexi_logger::FlexiLoggerError> {
    flexi_logger::Logger::try_with_env_or_str("egsmend=warn")?
        .log_to_file(flexi_logger::FileSpec::default().directory(app_dir().as_std_path_buf()))
        .write_mode(flexi_logger::WriteMode::BufferAndFlush)
        .rotate(
            flexi_logger::Criterion::Size(1024 * 1024 * 10),
            flexi_logger::Naming::Timestamps,
            flexi_logger::Cleanup::KeepLogFiles(4),
        )
        .use_utc()
        .format_for_files(|w, now, record| {
            write!(
                w,
                "[{}] {} [{}] {}",
                now.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
                record.level(),
                record.module_path().unwrap_or("<unnamed>"),
                &record.args(),
            )
        })
        .start()
}

fn main() {
    let args = cli::parse();
    if let Some(config_dir) = args.config.as_deref() {
        if let Ok(mut guard) = CONFIG_DIR.lock() {
            *guard = Some(config_dir.to_path_buf());
        }
    }

    let logger = prepare_logging();
    if let Err(e) = &logger {
        eprintln!("Unable to initialize logging: {e}");
    }

    log::debug!("Version: {}", *VERSION);

    if let Err(e) = cli::run(args.sub) {
        eprintln!("{}", TRANSLATOR.handle_error(&e));
        drop(logger);
        std::process::exit(1);
    }
}
