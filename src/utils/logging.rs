//! Logging setup for the graduation monitor.
//!
//! Filtering is controlled by `GRADWATCH_LOG` (and `GRADWATCH_LOG_STYLE` for
//! color); the HTTP stack underneath the RPC and Discord clients is kept at
//! `warn` unless asked for explicitly.

use chrono::Utc;
use env_logger::{Builder, Env, Target};
use log::Level;
use std::io::Write;

fn level_color(level: Level) -> &'static str {
    match level {
        Level::Error => "\x1b[31m",
        Level::Warn => "\x1b[33m",
        Level::Info => "\x1b[32m",
        Level::Debug => "\x1b[36m",
        Level::Trace => "\x1b[35m",
    }
}

/// Initialize the logging system. Safe to call more than once; only the
/// first call takes effect.
pub fn init_logging(level: &str) {
    // Transport crates are chatty at info; keep them quiet by default.
    let default_filter = format!("{},hyper=warn,reqwest=warn,solana_client=warn", level);

    let env = Env::default()
        .filter_or("GRADWATCH_LOG", default_filter)
        .write_style_or("GRADWATCH_LOG_STYLE", "auto");

    Builder::from_env(env)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {}{:5}\x1b[0m {} > {}",
                Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
                level_color(record.level()),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(Target::Stdout)
        .try_init()
        .ok();
}
