//! JSON views of the auth state for scripts on the console pages.

use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use console_core::AuthState;
use futures::Stream;
use tokio_stream::{wrappers::WatchStream, StreamExt};

pub async fn session_state(State(state): State<AppState>) -> Json<AuthState> {
    Json(state.auth.snapshot())
}

/// Server-sent `auth` events: the current state first, then every change.
pub async fn session_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let stream = WatchStream::new(state.auth.subscribe())
        .map(|auth| Event::default().event("auth").json_data(&auth));

    Sse::new(stream).keep_alive(KeepAlive::default())
}
