//! Logging setup for the CLI

use std::str::FromStr;
use tracing::Level;

/// Parse a level name, falling back to `info` for anything unrecognized.
pub fn parse_level(name: &str) -> Level {
    Level::from_str(name.trim()).unwrap_or(Level::INFO)
}

/// Install a fmt subscriber writing to stderr.
///
/// Calling this twice is harmless; the second call leaves the first
/// subscriber in place.
pub fn init(level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(parse_level(level))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
