// the collection of small helpers to switch on output of the log facade used
// throughout the crate; callers that want silence simply never initialize
use simplelog::*;
use std::fs::File;

/// Log to the terminal only. Safe to call more than once, a second
/// initialization is ignored.
pub fn init_console_logger(level: LevelFilter) {
    let _ = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    );
}

/// Log to the terminal and to a file at the same time.
pub fn init_combined_logger(level: LevelFilter, filename: &str) {
    let logger_instance = CombinedLogger::init(vec![
        TermLogger::new(
            level,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(level, Config::default(), File::create(filename).unwrap()),
    ]);
    if let Err(e) = logger_instance {
        eprintln!("logger already initialized: {}", e);
    }
}
