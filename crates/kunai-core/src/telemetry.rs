//! Tracing subscriber setup shared by the binaries.

use tracing_subscriber::{
    EnvFilter, Registry, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt,
};

use crate::error::{CoreError, CoreResult};

/// Handle used to swap the active log filter after configuration is loaded.
pub type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// ## Summary
/// Installs the global subscriber with a reloadable filter starting at `initial_level`.
/// Log lines go to stderr.
///
/// ## Errors
/// Returns `CoreError::ValidationError` if `initial_level` is not a valid filter
/// directive, or `CoreError::ConfigError` if a global subscriber is already set.
pub fn init_tracing(initial_level: &str) -> CoreResult<FilterHandle> {
    let filter = EnvFilter::try_new(initial_level)
        .map_err(|e| CoreError::ValidationError(format!("log filter {initial_level:?}: {e}")))?;
    let (filter_layer, filter_handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .try_init()
        .map_err(|e| CoreError::ConfigError(format!("tracing already initialised: {e}")))?;

    Ok(filter_handle)
}

/// ## Summary
/// Replaces the active filter with `level`.
///
/// ## Errors
/// Returns `CoreError::ValidationError` for an invalid directive and
/// `CoreError::InvariantViolation` if the subscriber owning the filter is gone.
pub fn apply_level(handle: &FilterHandle, level: &str) -> CoreResult<()> {
    let filter = EnvFilter::try_new(level)
        .map_err(|e| CoreError::ValidationError(format!("log filter {level:?}: {e}")))?;
    handle
        .modify(|current| *current = filter)
        .map_err(|_e| CoreError::InvariantViolation("log filter layer no longer installed"))
}
