//! Log output for the desk.
//!
//! `RUST_LOG` wins when set; otherwise `--verbose` picks `debug` over `info`.
//! Logs go to stderr so the rendered page on stdout stays clean.

use tracing_subscriber::fmt::time::uptime;
use tracing_subscriber::EnvFilter;

pub fn setup_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_timer(uptime())
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
