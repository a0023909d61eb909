//! SSE connection handler

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode, Version},
    response::{
        sse::{Event, Sse},
        IntoResponse, Response,
    },
};
use futures::Stream;
use tracing::{info, warn};

use crate::api::rest::ApiError;
use crate::api::state::AppState;
use crate::broker::Subscription;

/// GET /events/ - Subscribe to account change notifications
pub async fn events_handler(State(state): State<Arc<AppState>>, version: Version) -> Response {
    // HTTP/1.0 has no chunked transfer, so the stream could not be flushed
    // incrementally.
    if matches!(version, Version::HTTP_09 | Version::HTTP_10) {
        warn!(?version, "rejecting event stream on non-streaming transport");
        return (StatusCode::INTERNAL_SERVER_ERROR, "Streaming unsupported!").into_response();
    }

    let subscription = match state.broker.register().await {
        Ok(subscription) => subscription,
        Err(e) => {
            warn!(error = %e, "unable to register event stream client");
            return ApiError::Unavailable("event broker is not running".to_string())
                .into_response();
        }
    };
    info!(subscriber = %subscription.id(), "HTTP event stream opened");

    let mut response = Sse::new(subscription_stream(subscription)).into_response();
    if version == Version::HTTP_11 {
        response
            .headers_mut()
            .insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    }
    response
}

/// Relay broker messages as `data:` events until the sink closes.
///
/// Dropping the stream drops the subscription, which deregisters it.
fn subscription_stream(
    mut subscription: Subscription,
) -> impl Stream<Item = Result<Event, Infallible>> {
    async_stream::stream! {
        while let Some(message) = subscription.recv().await {
            yield Ok(Event::default().data(message.as_str()));
        }
        info!(subscriber = %subscription.id(), "Finished event stream");
    }
}
