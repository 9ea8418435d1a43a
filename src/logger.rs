use std::io;

use chrono::Local;
use fern::Dispatch;
use log::LevelFilter;

/// Environment variable selecting the log level.
pub const LOG_ENV: &str = "BULLETIN_DEBUG";

pub fn logging_level() -> LevelFilter {
    parse_level(std::env::var(LOG_ENV).ok().as_deref())
}

fn parse_level(value: Option<&str>) -> LevelFilter {
    match value {
        Some("trace") => LevelFilter::Trace,
        Some("debug") => LevelFilter::Debug,
        Some("info") => LevelFilter::Info,
        Some("warn") => LevelFilter::Warn,
        Some("error") => LevelFilter::Error,
        _ => LevelFilter::Info, // default if unset or unknown
    }
}

/// Install the process logger. Output goes to stderr; stdout is left to the binaries.
pub fn setup_logger() {
    let level_filter = logging_level();

    if let Err(e) = Dispatch::new()
        .format(move |out, message, record| {
            let file = record.file().unwrap_or("unknown_file");
            let line = record.line().unwrap_or(0);

            if level_filter == LevelFilter::Info {
                out.finish(format_args!(
                    "[{}]: {} <{}:{}>",
                    record.level(),
                    message,
                    file,
                    line,
                ));
            } else {
                out.finish(format_args!(
                    "[{}][{}]: {} <{}:{}>",
                    Local::now().format("%b-%d-%Y %H:%M:%S.%f"),
                    record.level(),
                    message,
                    file,
                    line,
                ));
            }
        })
        .level(level_filter)
        .chain(io::stderr())
        .apply()
    {
        eprintln!("Logger initialization failed: {e}");
    }
}
