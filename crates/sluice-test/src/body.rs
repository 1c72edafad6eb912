//! Draining response bodies.

use futures_util::StreamExt;
use sluice_sse::SseBody;

use crate::error::TestError;

/// Collect every frame of `body` until it ends.
///
/// The body only ends once its writer is closed or dropped.
pub async fn collect_body(mut body: SseBody) -> Result<Vec<u8>, TestError> {
    let mut out = Vec::new();
    while let Some(frame) = body.next().await {
        let frame = frame.map_err(|e| TestError::BodyRead(e.to_string()))?;
        out.extend_from_slice(&frame);
    }
    Ok(out)
}

/// Collect `body` as text.
pub async fn collect_text(body: SseBody) -> Result<String, TestError> {
    Ok(String::from_utf8(collect_body(body).await?)?)
}
