//! Core types, configuration, and the event model for the ACH gateway.

pub mod compliance;
pub mod config;
pub mod error;
pub mod events;

pub use config::*;
pub use error::{Error, Result};
pub use events::*;
