//! Application state shared across handlers.

use std::sync::Arc;

use gateway_core::HttpConfig;
use gateway_rdfi::Trigger;
use gateway_stream::Publisher;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Event publisher (Kafka in production, mock in tests)
    pub publisher: Arc<dyn Publisher>,
    /// Manual-trigger handle into the RDFI scheduler
    pub trigger: Trigger,
    /// Ingress limits and compliance envelope
    pub http: HttpConfig,
}

impl AppState {
    pub fn new(publisher: Arc<dyn Publisher>, trigger: Trigger, http: HttpConfig) -> Self {
        Self {
            publisher,
            trigger,
            http,
        }
    }
}
