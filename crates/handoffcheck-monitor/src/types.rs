use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use handoffcheck_config::MonitorConfig;
use handoffcheck_contracts::Severity;

/// Thresholds and buffer sizes for a [`ValidationMonitor`](crate::ValidationMonitor)
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSettings {
    /// A validation slower than this raises a timeout event
    pub timeout_threshold: Duration,
    /// Rolling success rate below this raises a system_error event
    pub success_rate_floor: f64,
    pub min_samples_for_alert: usize,
    pub max_recent_validations: usize,
    pub max_alerts: usize,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self::from(&MonitorConfig::default())
    }
}

impl From<&MonitorConfig> for MonitorSettings {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            timeout_threshold: Duration::from_millis(config.timeout_threshold_ms),
            success_rate_floor: config.success_rate_floor,
            min_samples_for_alert: config.min_samples_for_alert,
            max_recent_validations: config.max_recent_validations,
            max_alerts: config.max_alerts,
        }
    }
}

/// Intervals of the background monitoring loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitoringConfig {
    pub metrics_interval: Duration,
    pub health_check_interval: Duration,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self::from(&MonitorConfig::default())
    }
}

impl From<&MonitorConfig> for MonitoringConfig {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            metrics_interval: Duration::from_secs(config.metrics_interval_secs),
            health_check_interval: Duration::from_secs(config.health_check_interval_secs),
        }
    }
}

/// One finished validation, as reported by the handoff validator
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationEvent {
    pub agent_id: String,
    pub agent_type: String,
    pub success: bool,
    pub duration: Duration,
    /// Handoff type or contract name
    pub validation_type: String,
    /// Primary error type of a failed validation
    pub error_details: Option<String>,
}

/// Stored record of one validation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceMetric {
    pub agent_id: String,
    pub agent_type: String,
    pub validation_type: String,
    pub duration_ms: u64,
    pub success: bool,
    pub error_type: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CriticalEventType {
    Timeout,
    CorrectionFailure,
    SystemError,
}

impl CriticalEventType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::CorrectionFailure => "correction_failure",
            Self::SystemError => "system_error",
        }
    }
}

impl fmt::Display for CriticalEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input to [`record_critical_event`](crate::ValidationMonitor::record_critical_event)
#[derive(Debug, Clone, PartialEq)]
pub struct NewCriticalEvent {
    pub event_type: CriticalEventType,
    pub severity: Severity,
    pub agent_id: Option<String>,
    pub message: String,
}

impl NewCriticalEvent {
    pub fn new(event_type: CriticalEventType, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            event_type,
            severity,
            agent_id: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn with_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }
}

/// Alert raised by the monitor or reported by a caller. Never auto-expires.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriticalEvent {
    pub id: String,
    pub event_type: CriticalEventType,
    pub severity: Severity,
    pub agent_id: Option<String>,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub resolved: bool,
    pub resolution_details: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentPerformanceStats {
    pub agent_id: String,
    pub agent_type: String,
    pub total_validations: u64,
    pub successful_validations: u64,
    pub failed_validations: u64,
    /// Running mean over every validation of this agent
    pub average_duration_ms: f64,
    pub success_rate: f64,
    pub last_validation: Option<DateTime<Utc>>,
}

impl AgentPerformanceStats {
    pub(crate) fn new(agent_id: &str, agent_type: &str) -> Self {
        Self {
            agent_id: agent_id.to_string(),
            agent_type: agent_type.to_string(),
            total_validations: 0,
            successful_validations: 0,
            failed_validations: 0,
            average_duration_ms: 0.0,
            success_rate: 1.0,
            last_validation: None,
        }
    }

    pub(crate) fn record(&mut self, success: bool, duration_ms: f64, at: DateTime<Utc>) {
        self.total_validations += 1;
        if success {
            self.successful_validations += 1;
        } else {
            self.failed_validations += 1;
        }
        let n = self.total_validations as f64;
        self.average_duration_ms += (duration_ms - self.average_duration_ms) / n;
        self.success_rate = self.successful_validations as f64 / n;
        self.last_validation = Some(at);
    }
}

/// Aggregate counters since construction (or the last reset)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorMetrics {
    pub total_validations: u64,
    pub successful_validations: u64,
    pub failed_validations: u64,
    /// 1.0 when nothing has been validated yet
    pub success_rate: f64,
    pub total_corrections: u64,
    pub successful_corrections: u64,
    /// 1.0 when no correction has finished yet
    pub correction_success_rate: f64,
    /// Unresolved critical events
    pub critical_events: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Critical,
}

impl HealthStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentHealthReport {
    pub stats: AgentPerformanceStats,
    pub status: HealthStatus,
    pub recommendation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Stable,
    Degrading,
}

/// Validation behaviour over a recent time window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemTrends {
    pub window_minutes: u32,
    pub total_validations: u64,
    pub failed_validations: u64,
    pub failure_rate: f64,
    pub average_duration_ms: f64,
    pub failures_by_error_type: BTreeMap<String, u64>,
    pub failures_by_agent: BTreeMap<String, u64>,
    /// Compares failure rates of the older and newer half of the window
    pub direction: TrendDirection,
    pub recommendation: String,
}

/// Result of one health check
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    /// 0 to 100
    pub score: u8,
    pub status: HealthStatus,
    pub metrics: MonitorMetrics,
    pub unresolved_critical_events: usize,
    pub checked_at: DateTime<Utc>,
}
