// file: src/logging/logger.rs
// version: 1.1.0
// guid: eb32e217-1e05-4f3a-a8f8-ee0e55ada9a9

//! Subscriber setup for processes embedding the resolver.
//!
//! The resolver only emits `tracing` events; installing a subscriber is left
//! to the host. Both installers fail with a configuration error when the
//! host already installed one.

use crate::error::ResolverError;
use crate::Result;
use tracing::Instrument;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Directive used when `RUST_LOG` is unset or unreadable
const DEFAULT_DIRECTIVE: &str = "info";

/// `quiet` wins over `verbose`
fn console_directive(verbose: bool, quiet: bool) -> &'static str {
    match (verbose, quiet) {
        (_, true) => "error",
        (true, false) => "debug",
        (false, false) => DEFAULT_DIRECTIVE,
    }
}

fn install_failed(kind: &str, e: impl std::fmt::Display) -> ResolverError {
    ResolverError::config(format!("Failed to initialize {} logger: {}", kind, e))
}

/// Compact console output for interactive runs (inventory dumps, disk
/// discovery against a lab host)
pub fn init_logger(verbose: bool, quiet: bool) -> Result<()> {
    let console = fmt::layer()
        .compact()
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false);

    tracing_subscriber::registry()
        .with(EnvFilter::new(console_directive(verbose, quiet)))
        .with(console)
        .try_init()
        .map_err(|e| install_failed("console", e))
}

/// One JSON object per event, filtered by `RUST_LOG`. Meant for the web
/// application that serves the option sets.
pub fn init_json_logger() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_current_span(true))
        .try_init()
        .map_err(|e| install_failed("JSON", e))
}

/// Run `f` with an `operation` span entered, so events carry the option
/// set being resolved
pub fn with_operation_span<F, R>(operation: &str, f: F) -> R
where
    F: FnOnce() -> R,
{
    let span = tracing::info_span!("operation", name = operation);
    span.in_scope(f)
}

/// Async form of [`with_operation_span`]; the span follows the future
/// across await points
pub async fn with_async_operation_span<F, Fut, R>(operation: &str, f: F) -> R
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = R>,
{
    f().instrument(tracing::info_span!("operation", name = operation))
        .await
}
