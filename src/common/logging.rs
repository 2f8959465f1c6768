//! Logging and tracing configuration
//!
//! Status lines for plan steps go to the caller's writer; everything
//! else (command invocations, retry attempts) goes through `tracing`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when `RUST_LOG` is unset
const DEFAULT_FILTER: &str = "funk_deploy=info,warn";

/// Placeholder logged instead of command output for redacted invocations
pub const REDACTED: &str = "<redacted>";

/// Initialize tracing for the CLI (stderr logging)
///
/// Logs are controlled by the `RUST_LOG` environment variable.
/// Default level is INFO for this crate, WARN for dependencies.
pub fn init_cli() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // Stdout belongs to plan status and command output
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// Text to log for command output, honouring redaction
pub fn loggable(output: &str, redact: bool) -> &str {
    if redact {
        REDACTED
    } else {
        output
    }
}
