use core::fmt::Arguments;
use log::{LevelFilter, Record};
use std::io;
use std::path::Path;

fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Log to `path`; the terminal belongs to the UI. With `echo_stderr` warnings
/// and errors are mirrored to stderr as well (headless mode).
pub fn init_logger(path: &Path, verbosity: u8, echo_stderr: bool) -> Result<(), fern::InitError> {
    let file = fern::Dispatch::new()
        .format(file_format)
        .level(LevelFilter::Warn)
        .level_for("pokedex_gallery", level_for(verbosity))
        .chain(fern::log_file(path)?);

    let mut root = fern::Dispatch::new().chain(file);
    if echo_stderr {
        let err_console = fern::Dispatch::new()
            .format(console_format)
            .level(LevelFilter::Warn)
            .chain(io::stderr());
        root = root.chain(err_console);
    }
    root.apply()?;
    Ok(())
}

fn file_format(cb: fern::FormatCallback, message: &Arguments, record: &Record) {
    let line = record.line().map(|v| format!(":{}", v));

    cb.finish(format_args!(
        "{} {:<5} {}{} {}",
        chrono::Local::now().format("%F %T%.3f"),
        record.level(),
        record.target(),
        line.unwrap_or_default(),
        message,
    ))
}

fn console_format(cb: fern::FormatCallback, message: &Arguments, record: &Record) {
    cb.finish(format_args!("[{}] {}", record.level(), message))
}
