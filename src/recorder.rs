//! Top-level acquisition loop of the lab logger.

use crate::config::Settings;
use crate::error::AppResult;

/// Main loop of the lab logger.
///
/// Intended to walk every configured stream, prompt a measurement, and post
/// the measured data to the origin server. The polling cadence and recovery
/// behavior are not yet specified, so the loop currently does nothing
/// beyond announcing itself.
pub async fn record(settings: &Settings) -> AppResult<()> {
    log::debug!(
        "recorder invoked for namespace '{}'; acquisition loop not yet implemented",
        settings.namespace
    );
    Ok(())
}
