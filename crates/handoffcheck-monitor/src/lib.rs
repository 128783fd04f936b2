//! Validation health monitoring
//!
//! [`ValidationMonitor`] keeps rolling performance metrics, per-agent stats and
//! critical events for handoff validations. It scores overall health and can
//! run a background loop that publishes [`HealthReport`]s through a
//! [`HealthCheckReceiver`].

mod health;
mod health_loop;
mod monitor;
mod types;

pub use health_loop::HealthCheckReceiver;
pub use monitor::ValidationMonitor;
pub use types::{
    AgentHealthReport, AgentPerformanceStats, CriticalEvent, CriticalEventType, HealthReport,
    HealthStatus, MonitorMetrics, MonitorSettings, MonitoringConfig, NewCriticalEvent,
    PerformanceMetric, SystemTrends, TrendDirection, ValidationEvent,
};
