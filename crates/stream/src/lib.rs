//! Event bus publishing for the ACH gateway.

pub mod config;
pub mod publisher;

pub use config::StreamConfig;
pub use publisher::{KafkaPublisher, MockPublisher, Publisher};
