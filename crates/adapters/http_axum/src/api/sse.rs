//! Server-Sent Events (SSE) stream for real-time updates.

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

use crate::state::AppState;

/// `GET /api/events/stream` — SSE stream of real-time domain events.
///
/// Subscribes to the event bus broadcast channel and sends JSON-encoded
/// events as SSE `data:` frames. The stream continues until the client
/// disconnects or the event bus is closed. A client that falls behind
/// skips the dropped events and keeps receiving from the current point.
pub async fn stream(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, std::convert::Infallible>>> {
    let event_rx = state.hub.subscribe();
    let event_stream = BroadcastStream::new(event_rx).filter_map(|result| match result {
        Ok(event) => match serde_json::to_string(&event) {
            Ok(json) => Some(Ok(Event::default().data(json))),
            Err(err) => {
                tracing::warn!(%err, "failed to serialize event to JSON for SSE stream");
                None
            }
        },
        Err(tokio_stream::wrappers::errors::BroadcastStreamRecvError::Lagged(n)) => {
            tracing::warn!(
                skipped = n,
                "SSE subscriber lagged, some events were dropped"
            );
            None
        }
    });

    Sse::new(event_stream).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use hearth_app::hub::Hub;
    use hearth_app::registry::DeviceRegistry;
    use hearth_domain::device::{AttributeValue, Device, DeviceKind};
    use hearth_domain::event::Event as DomainEvent;

    fn test_state() -> AppState {
        let registry = Arc::new(DeviceRegistry::new());
        registry
            .register(Device::new("Living Room Light", DeviceKind::Light))
            .unwrap();
        AppState::new(Arc::new(Hub::new(registry)))
    }

    #[tokio::test]
    async fn should_subscribe_to_event_bus_when_stream_created() {
        let state = test_state();

        // Create a direct subscription to verify events are being published
        let mut rx = state.hub.subscribe();

        // Create SSE stream (this also subscribes internally)
        let _sse_response = stream(State(state.clone())).await;

        state
            .hub
            .issue_command("Living Room Light", "power", AttributeValue::Bool(true))
            .await
            .unwrap();

        let received = rx.recv().await.unwrap();
        assert!(matches!(received, DomainEvent::StateChanged { .. }));
    }
}
