//! Logging and observability infrastructure for cloudpilot.
//!
//! Structured logging with stage timing via `tracing`. The engine logs every
//! stage execution with `flow_id`, `stage`, and `duration_ms` fields.

use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter,
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Initialize the tracing subscriber for structured logging.
///
/// `RUST_LOG` takes precedence when set; otherwise `verbose` selects between
/// debug-level and info-level output for cloudpilot crates.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("cloudpilot=debug,info")
            } else {
                EnvFilter::try_new("cloudpilot=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(verbose)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_line_number(false)
                .with_file(false)
                .compact(),
        )
        .try_init()?;

    Ok(())
}

/// Log stage completion with duration.
pub fn log_stage_complete(flow_id: &str, stage: &str, duration_ms: u128) {
    info!(
        flow_id = %flow_id,
        stage = %stage,
        duration_ms = %duration_ms,
        "Stage completed"
    );
}

/// Log a stage failure that was captured into flow state.
pub fn log_stage_error(flow_id: &str, stage: &str, error: &str, duration_ms: u128) {
    warn!(
        flow_id = %flow_id,
        stage = %stage,
        error = %error,
        duration_ms = %duration_ms,
        "Stage failed; routing to user-interaction"
    );
}
