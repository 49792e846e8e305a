//! Logging configuration.

use std::io::Write;

/// Configure `env_logger` with appropriate level and format. `--verbose` raises the default
/// filter from `info` to `debug`; `RUST_LOG` still overrides both when set.
pub fn setup_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                buf.timestamp(),
                record.level(),
                record.args()
            )
        })
        .init();
}
