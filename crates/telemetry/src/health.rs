//! Health check aggregation.
//!
//! The gateway has exactly two external dependencies worth probing: the
//! event bus and the cluster lock backend. Each is tracked as a fault
//! slot (`None` = reachable, `Some(reason)` = not), and the aggregate
//! status is the two-component matrix rather than a generic roll-up.

use serde::{Deserialize, Serialize};

/// Health status for the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Health state for one dependency. A component starts faulted until the
/// startup checks clear it.
#[derive(Debug)]
pub struct ComponentHealth {
    name: &'static str,
    fault: parking_lot::RwLock<Option<String>>,
}

impl ComponentHealth {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            fault: parking_lot::RwLock::new(Some("pending startup checks".to_string())),
        }
    }

    /// Clears the fault slot.
    pub fn set_healthy(&self) {
        *self.fault.write() = None;
    }

    /// Records why the dependency is unreachable.
    pub fn set_unhealthy(&self, reason: impl Into<String>) {
        *self.fault.write() = Some(reason.into());
    }

    pub fn is_healthy(&self) -> bool {
        self.fault.read().is_none()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn message(&self) -> Option<String> {
        self.fault.read().clone()
    }

    fn entry(&self) -> ComponentHealthReport {
        let fault = self.fault.read().clone();
        ComponentHealthReport {
            name: self.name.to_string(),
            healthy: fault.is_none(),
            message: fault,
        }
    }
}

/// Per-component health report entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealthReport {
    pub name: String,
    pub healthy: bool,
    pub message: Option<String>,
}

/// Aggregated health report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub components: Vec<ComponentHealthReport>,
}

/// Global health registry.
pub struct HealthRegistry {
    /// The event bus the processors publish to.
    pub bus: ComponentHealth,
    /// The cluster lock backend.
    pub lock_backend: ComponentHealth,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self {
            bus: ComponentHealth::new("bus"),
            lock_backend: ComponentHealth::new("lock_backend"),
        }
    }

    /// Generate a health report.
    pub fn report(&self) -> HealthReport {
        let bus = self.bus.entry();
        let lock_backend = self.lock_backend.entry();

        let status = match (bus.healthy, lock_backend.healthy) {
            (true, true) => HealthStatus::Healthy,
            (false, false) => HealthStatus::Unhealthy,
            _ => HealthStatus::Degraded,
        };

        HealthReport {
            status,
            components: vec![bus, lock_backend],
        }
    }

    /// Whether the service can accept traffic. Ingress needs the bus; the
    /// lock backend only gates tick scheduling.
    pub fn is_ready(&self) -> bool {
        self.bus.is_healthy()
    }
}

impl Default for HealthRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Global health registry.
pub static HEALTH: std::sync::LazyLock<HealthRegistry> =
    std::sync::LazyLock::new(HealthRegistry::new);

/// Get the global health registry.
pub fn health() -> &'static HealthRegistry {
    &HEALTH
}
