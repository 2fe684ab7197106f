//! Command-line plumbing shared by the simulator binaries: clap styling,
//! verbosity flags and the tracing subscriber setup.

pub use clap;
pub use clap_verbosity_flag as verbose;

use clap::builder::{styling::AnsiColor, Styles};

/// Colour scheme of the help message.
pub fn get_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Yellow.on_default().bold())
        .usage(AnsiColor::Yellow.on_default().bold())
        .literal(AnsiColor::Green.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default())
        .valid(AnsiColor::Green.on_default())
        .invalid(AnsiColor::Red.on_default().bold())
        .error(AnsiColor::Red.on_default().bold())
}

/// Map the `-v`/`-q` verbosity of the command line to a tracing level.
///
/// Without `-v` or `-q` the flag yields `Level::Error`, which maps to WARN.
/// Each `-v` unlocks one more level, `-q` drops to ERROR only.
pub fn verbose_level_to_trace(level: Option<verbose::Level>) -> &'static tracing::Level {
    match level {
        Some(verbose::Level::Error) => &tracing::Level::WARN,
        Some(verbose::Level::Warn) => &tracing::Level::INFO,
        Some(verbose::Level::Info) => &tracing::Level::DEBUG,
        Some(verbose::Level::Debug) => &tracing::Level::TRACE,
        Some(verbose::Level::Trace) => &tracing::Level::TRACE,
        None => &tracing::Level::ERROR,
    }
}

/// Install the global tracing subscriber.
///
/// Logs go to stderr as plain text. If `log_file` is given they are written
/// there as JSON lines instead.
pub fn logging_setup(
    level: &tracing::Level,
    log_file: Option<&std::fs::File>,
) -> std::io::Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_max_level(*level)
        .with_target(false);

    let r = if let Some(file) = log_file {
        let file = file.try_clone()?;
        builder
            .json()
            .with_writer(std::sync::Mutex::new(file))
            .try_init()
    } else {
        builder
            .without_time()
            .with_writer(std::io::stderr)
            .try_init()
    };
    r.map_err(std::io::Error::other)
}
