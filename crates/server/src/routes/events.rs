// crates/server/src/routes/events.rs
//! Server-Sent Events stream of download progress.
//!
//! On connect the client gets a confirmation frame, then every published
//! progress event as a JSON data frame. Idle periods are bridged with
//! keepalive comments so proxies don't drop the connection. The channel is
//! torn down when the client disconnects (the subscription drops with the
//! stream) or when the bus evicts a subscriber that stopped reading.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, Sse};
use axum::routing::get;
use axum::Router;

use clipdeck_core::RecvOutcome;

use crate::state::AppState;

/// How long a receive blocks before a keepalive comment is emitted.
const KEEPALIVE_TIMEOUT: Duration = Duration::from_secs(30);

/// GET /api/events — SSE stream of all download progress events.
async fn stream_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let mut subscription = state.controller.subscribe();

    let stream = async_stream::stream! {
        let connected = serde_json::json!({
            "type": "connected",
            "client_id": subscription.id().to_string(),
        });
        yield Ok(Event::default().data(connected.to_string()));

        loop {
            match subscription.next(KEEPALIVE_TIMEOUT).await {
                RecvOutcome::Event(event) => match serde_json::to_string(&event) {
                    Ok(json) => yield Ok(Event::default().data(json)),
                    Err(e) => tracing::error!(error = %e, "failed to serialize progress event"),
                },
                RecvOutcome::Timeout => {
                    yield Ok(Event::default().comment("keepalive"));
                }
                RecvOutcome::Closed => break,
            }
        }
    };

    Sse::new(stream)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/events", get(stream_events))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{test_app_with_config, test_controller_config};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_events_endpoint_returns_event_stream() {
        // Tiny subscriber queue: publishing past it evicts the SSE
        // subscriber, which terminates the stream so the body can be read
        // to completion.
        let mut config = test_controller_config();
        config.subscriber_capacity = 1;
        let (app, state) = test_app_with_config(config);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/events")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap();
        assert!(
            content_type.contains("text/event-stream"),
            "Expected text/event-stream, got: {content_type}"
        );

        // Overflow the subscriber so the stream ends. The body is not
        // polled until the job has finished publishing, so the capacity-1
        // queue is guaranteed to overflow and evict the subscriber.
        let ids = state
            .controller
            .submit_batch(
                vec![clipdeck_types::DownloadItem {
                    url: "https://example.com/a".to_string(),
                    options: clipdeck_types::DownloadOptions::default(),
                }],
                None,
            )
            .await;
        assert_eq!(ids.len(), 1);
        for _ in 0..200 {
            match state.controller.status(&ids[0]) {
                Some(record) if record.status.is_terminal() => break,
                _ => tokio::time::sleep(std::time::Duration::from_millis(5)).await,
            }
        }

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body_str = String::from_utf8(body.to_vec()).unwrap();

        assert!(
            body_str.contains("\"type\":\"connected\""),
            "Expected connected frame in body: {body_str}"
        );
        assert!(
            body_str.contains("client_id"),
            "Expected client_id in body: {body_str}"
        );
    }
}
