//! Station upload handler.
//!
//! Station firmware only checks for a 200 with body `success`, so the
//! response does not depend on how publishing went.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use tracing::{debug, warn};
use wxbridge_core::{build_reading, StationParams};

use crate::server::BridgeState;

/// Response body expected by station firmware.
pub const SUCCESS_BODY: &str = "success";

/// Handle one PWS upload.
pub async fn update_handler(
    State(state): State<BridgeState>,
    query: Result<Query<StationParams>, QueryRejection>,
) -> &'static str {
    let params = match query {
        Ok(Query(params)) => params,
        Err(e) => {
            warn!(error = %e, "Unparseable upload query, publishing empty reading");
            StationParams::default()
        }
    };

    let reading = build_reading(&params, state.units, state.tz);
    let summary = state.publisher.publish(&reading).await;
    debug!(
        backend = state.publisher.name(),
        published = summary.published,
        failed = summary.failed,
        skipped = summary.skipped,
        measured_on = %reading.measured_on,
        "Upload processed"
    );

    if let Some(forwarder) = &state.forwarder {
        forwarder.forward_logged(&params).await;
    }

    SUCCESS_BODY
}
