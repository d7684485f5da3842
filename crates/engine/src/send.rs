//! The synchronous-looking send helper.
//!
//! From the strategy's point of view `send` blocks until the response is
//! back; underneath, the task yields with a want matching the host-assigned
//! token, so out-of-order completions across strategies are fine. The
//! callback stopwatch is paused for the duration: the wait counts toward
//! wall time but not cooperative time.

use std::sync::Arc;

use host_core::{Event, RequestPayload, ResponsePayload, TransportError};
use tracing::trace;

use crate::error::EngineError;
use crate::task::StrategyCtx;

/// Sends `request` and waits for the matching response.
///
/// An errored response surfaces as [`EngineError::Transport`] carrying the
/// typed failure kind plus url, status, and content. If no matching
/// response ever arrives the strategy stays suspended; there are no
/// spurious resumptions.
pub(crate) async fn send(
    ctx: &StrategyCtx,
    request: RequestPayload,
) -> Result<Arc<ResponsePayload>, EngineError> {
    let url = request.url.clone();
    let token = ctx.host().send(request);
    trace!(strategy = %ctx.name(), %token, %url, "sent request");

    ctx.pause_timer();
    let payload = ctx
        .suspend(move |event| match event {
            Event::SendResponse {
                token: response_token,
                payload,
            } if *response_token == token => Some(Arc::clone(payload)),
            _ => None,
        })
        .await;
    ctx.resume_timer();

    if payload.error {
        return Err(EngineError::Transport(TransportError::from_payload(
            &payload,
        )));
    }
    Ok(payload)
}

/// Sends `request` and decodes the response content as JSON.
pub(crate) async fn send_json(
    ctx: &StrategyCtx,
    request: RequestPayload,
) -> Result<serde_json::Value, EngineError> {
    let payload = send(ctx, request).await?;
    serde_json::from_str(&payload.content).map_err(|err| {
        EngineError::Callback(format!(
            "response from {} is not valid JSON: {err}",
            payload.url
        ))
    })
}
