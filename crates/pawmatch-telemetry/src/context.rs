//! Per-command trace context.
//!
//! Each CLI invocation gets a trace id that is attached to its span and sent to
//! the remote service as `x-request-id`.

use tracing::Span;

use crate::init::build_sha;

/// Span wrapping one command invocation.
#[must_use]
pub fn command_span(command: &str, trace_id: &str) -> Span {
    tracing::info_span!(
        "command",
        command = %command,
        trace_id = %trace_id,
        build_sha = %build_sha()
    )
}
