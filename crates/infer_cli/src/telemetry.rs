//! Tracing initialisation for the binary.

use crate::GlobalArgs;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Default log level for the global flags.
pub fn default_level(global: &GlobalArgs) -> Level {
    if global.verbose {
        Level::DEBUG
    } else if global.quiet {
        Level::ERROR
    } else {
        Level::WARN
    }
}

/// Installs the global subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence over the level derived from `--quiet` and
/// `--verbose`. Only the first call takes effect.
pub fn init_tracing(global: &GlobalArgs) {
    let level = default_level(global);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(global.color)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global(quiet: bool, verbose: bool) -> GlobalArgs {
        GlobalArgs {
            quiet,
            verbose,
            color: false,
        }
    }

    #[test]
    fn levels_follow_flags() {
        assert_eq!(default_level(&global(false, false)), Level::WARN);
        assert_eq!(default_level(&global(true, false)), Level::ERROR);
        assert_eq!(default_level(&global(false, true)), Level::DEBUG);
    }

    #[test]
    fn init_twice_is_harmless() {
        init_tracing(&global(false, false));
        init_tracing(&global(false, true));
    }
}
