//! Shared application state for axum handlers.

use std::sync::Arc;

use hearth_app::hub::Hub;

/// Application state shared across all axum handlers.
///
/// Only the `Arc` is cloned per request; the hub itself is shared.
#[derive(Clone)]
pub struct AppState {
    /// The assembled control core.
    pub hub: Arc<Hub>,
}

impl AppState {
    /// Wrap an assembled hub.
    #[must_use]
    pub fn new(hub: Arc<Hub>) -> Self {
        Self { hub }
    }
}
