//! catline: serve the lines of a file over TCP and check them on the
//! other side.
//!
//! - `catserver <file> <port>` accepts one client and answers each `LINE`
//!   request with the next line of the file, uppercased, wrapping around
//!   at end of file.
//! - `catclient <file> <port>` requests a line every few seconds, folds it
//!   back to lowercase and reports `OK` or `MISSING` depending on whether
//!   the line occurs in its own copy of the file.

pub mod client;
pub mod config;
pub mod lines;
pub mod protocol;
pub mod server;

use tracing_subscriber::EnvFilter;

/// Install the stderr log subscriber. `RUST_LOG` overrides `level`.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
