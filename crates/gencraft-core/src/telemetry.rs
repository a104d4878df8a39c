//! Log output for the `gencraft` command.
//!
//! Stage progress, fallbacks and backend retries are reported through
//! `tracing`. The CLI's `--json` flag picks the line format and `--verbose`
//! the default level; `RUST_LOG` still wins per target, for example
//! `RUST_LOG=gencraft_gemini=debug` to watch only the HTTP backend.
//!
//! Everything is written to stderr. Stdout carries the rendered prompt of
//! `gencraft prompt` and the run summary of `gencraft craft`, so it can be
//! piped without log noise.

use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Install the process-wide subscriber. Only the first call has any effect.
pub fn init_tracing(json: bool, level: Level) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    let lines = fmt::layer().with_writer(std::io::stderr);
    let format = if json {
        lines.json().boxed()
    } else {
        lines.compact().boxed()
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_twice_is_harmless() {
        init_tracing(false, Level::WARN);
        init_tracing(true, Level::DEBUG);
    }
}
