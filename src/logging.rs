//! Process-wide logging setup.
//!
//! Verbosity is gated by [`Environment`]: development logs `debug` for this
//! crate, production only logs errors. Records emitted through [`critical!`]
//! use the `critical` target, which is always enabled regardless of
//! environment or `RUST_LOG`.

use crate::config::{Config, Environment};
use crate::error::{AppError, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

/// Target used by [`critical!`].
pub const CRITICAL_TARGET: &str = "critical";

/// Logs an error that must be visible in every environment.
#[macro_export]
macro_rules! critical {
    ($($arg:tt)*) => {
        ::tracing::error!(target: $crate::logging::CRITICAL_TARGET, $($arg)*)
    };
}

/// Builds the filter for an environment, honouring `RUST_LOG` when set.
pub fn build_filter(environment: Environment) -> Result<EnvFilter> {
    let default = match environment {
        Environment::Development => "nefes=debug,info",
        Environment::Production => "error",
    };
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default));
    let filter = filter.map_err(|e| AppError::Config(format!("invalid log filter: {}", e)))?;
    Ok(filter.add_directive(critical_directive()?))
}

fn critical_directive() -> Result<Directive> {
    format!("{}=error", CRITICAL_TARGET)
        .parse()
        .map_err(|e| AppError::Config(format!("invalid critical directive: {}", e)))
}

/// Installs the global subscriber. Must be called once at process start.
///
/// When `log_dir` is configured, records go to a daily rolling file and the
/// returned guard must be kept alive until exit.
pub fn init(config: &Config) -> Result<Option<WorkerGuard>> {
    let filter = build_filter(config.environment)?;

    match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "nefes.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .try_init()
                .map_err(|e| AppError::Config(format!("logging already initialised: {}", e)))?;
            Ok(Some(guard))
        },
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|e| AppError::Config(format!("logging already initialised: {}", e)))?;
            Ok(None)
        },
    }
}
