use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

use handoffcheck_contracts::Severity;
use handoffcheck_utils::error::MonitorError;
use handoffcheck_utils::ring_buffer::RingBuffer;

use crate::health;
use crate::health_loop::{self, HealthCheckReceiver, LoopHandle};
use crate::types::{
    AgentHealthReport, AgentPerformanceStats, CriticalEvent, CriticalEventType, HealthReport,
    MonitorMetrics, MonitorSettings, MonitoringConfig, NewCriticalEvent, PerformanceMetric,
    SystemTrends, ValidationEvent,
};

struct MonitorState {
    total_validations: u64,
    successful_validations: u64,
    total_corrections: u64,
    successful_corrections: u64,
    recent: RingBuffer<PerformanceMetric>,
    events: RingBuffer<CriticalEvent>,
    agents: HashMap<String, AgentPerformanceStats>,
    next_event_seq: u64,
}

impl MonitorState {
    fn new(settings: &MonitorSettings) -> Self {
        Self {
            total_validations: 0,
            successful_validations: 0,
            total_corrections: 0,
            successful_corrections: 0,
            recent: RingBuffer::new(settings.max_recent_validations),
            events: RingBuffer::new(settings.max_alerts),
            agents: HashMap::new(),
            next_event_seq: 0,
        }
    }

    fn metrics(&self) -> MonitorMetrics {
        MonitorMetrics {
            total_validations: self.total_validations,
            successful_validations: self.successful_validations,
            failed_validations: self.total_validations - self.successful_validations,
            success_rate: ratio(self.successful_validations, self.total_validations),
            total_corrections: self.total_corrections,
            successful_corrections: self.successful_corrections,
            correction_success_rate: ratio(self.successful_corrections, self.total_corrections),
            critical_events: self.unresolved_count(),
        }
    }

    fn unresolved_count(&self) -> usize {
        self.events.iter().filter(|e| !e.resolved).count()
    }

    fn recent_success_rate(&self) -> f64 {
        let successes = self.recent.iter().filter(|m| m.success).count();
        ratio(successes as u64, self.recent.len() as u64)
    }

    fn push_event(&mut self, event: NewCriticalEvent, at: DateTime<Utc>) -> String {
        self.next_event_seq += 1;
        let id = format!("evt-{}-{:04}", at.timestamp_millis(), self.next_event_seq);
        warn!(
            event_id = %id,
            event_type = %event.event_type,
            severity = %event.severity,
            agent_id = event.agent_id.as_deref().unwrap_or("-"),
            "Critical event: {}",
            event.message
        );
        let evicted = self.events.push(CriticalEvent {
            id: id.clone(),
            event_type: event.event_type,
            severity: event.severity,
            agent_id: event.agent_id,
            message: event.message,
            timestamp: at,
            resolved: false,
            resolution_details: None,
            resolved_at: None,
        });
        if let Some(old) = evicted
            && !old.resolved
        {
            debug!(event_id = %old.id, "Evicted unresolved critical event from full buffer");
        }
        id
    }
}

fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        1.0
    } else {
        part as f64 / whole as f64
    }
}

/// Tracks validation outcomes, critical events and overall health.
///
/// Constructed explicitly and shared as `Arc<ValidationMonitor>`. Every update
/// happens under a single lock, so concurrent callers never lose counts.
pub struct ValidationMonitor {
    settings: MonitorSettings,
    state: Mutex<MonitorState>,
    health_loop: Mutex<Option<LoopHandle>>,
}

impl std::fmt::Debug for ValidationMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationMonitor")
            .field("settings", &self.settings)
            .field("monitoring", &self.is_monitoring())
            .finish_non_exhaustive()
    }
}

impl Default for ValidationMonitor {
    fn default() -> Self {
        Self::new(MonitorSettings::default())
    }
}

impl ValidationMonitor {
    #[must_use]
    pub fn new(settings: MonitorSettings) -> Self {
        let state = MonitorState::new(&settings);
        Self {
            settings,
            state: Mutex::new(state),
            health_loop: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    fn state(&self) -> MutexGuard<'_, MonitorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn health_loop(&self) -> MutexGuard<'_, Option<LoopHandle>> {
        self.health_loop
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Record one finished validation and raise any alerts it triggers
    pub fn record_validation(&self, event: ValidationEvent) {
        self.record_validation_at(event, Utc::now());
    }

    pub(crate) fn record_validation_at(&self, event: ValidationEvent, at: DateTime<Utc>) {
        let duration_ms = u64::try_from(event.duration.as_millis()).unwrap_or(u64::MAX);
        let mut state = self.state();

        state.total_validations += 1;
        if event.success {
            state.successful_validations += 1;
        }
        state
            .agents
            .entry(event.agent_id.clone())
            .or_insert_with(|| AgentPerformanceStats::new(&event.agent_id, &event.agent_type))
            .record(event.success, duration_ms as f64, at);
        state.recent.push(PerformanceMetric {
            agent_id: event.agent_id.clone(),
            agent_type: event.agent_type.clone(),
            validation_type: event.validation_type.clone(),
            duration_ms,
            success: event.success,
            error_type: event.error_details.clone(),
            timestamp: at,
        });

        debug!(
            agent_id = %event.agent_id,
            validation_type = %event.validation_type,
            success = event.success,
            duration_ms,
            "Recorded validation"
        );

        // A deadline failure already raised its own timeout event
        let timed_out = event.error_details.as_deref() == Some("timeout");
        if event.duration > self.settings.timeout_threshold && !timed_out {
            let message = format!(
                "{} validation by {} took {} ms (threshold {} ms)",
                event.validation_type,
                event.agent_id,
                duration_ms,
                self.settings.timeout_threshold.as_millis()
            );
            state.push_event(
                NewCriticalEvent::new(CriticalEventType::Timeout, Severity::High, message)
                    .with_agent(event.agent_id.clone()),
                at,
            );
        }

        let samples = state.recent.len();
        let rate = state.recent_success_rate();
        let system_error_open = state
            .events
            .iter()
            .any(|e| e.event_type == CriticalEventType::SystemError && !e.resolved);
        if samples >= self.settings.min_samples_for_alert
            && rate < self.settings.success_rate_floor
            && !system_error_open
        {
            let message = format!(
                "Success rate {:.1}% over the last {} validations is below {:.1}%",
                rate * 100.0,
                samples,
                self.settings.success_rate_floor * 100.0
            );
            state.push_event(
                NewCriticalEvent::new(CriticalEventType::SystemError, Severity::Critical, message),
                at,
            );
        }
    }

    /// Record the terminal outcome of a correction loop
    pub fn record_correction(&self, agent_id: &str, succeeded: bool) {
        let mut state = self.state();
        state.total_corrections += 1;
        if succeeded {
            state.successful_corrections += 1;
        }
        debug!(agent_id = %agent_id, succeeded, "Recorded correction outcome");
    }

    /// Store a critical event and return its id
    pub fn record_critical_event(&self, event: NewCriticalEvent) -> String {
        self.state().push_event(event, Utc::now())
    }

    /// Mark an event resolved.
    ///
    /// Returns false when the id is unknown (or already evicted) or the event
    /// was resolved before.
    pub fn resolve_critical_event(&self, id: &str, resolution: &str) -> bool {
        let mut state = self.state();
        let Some(event) = state.events.iter_mut().find(|e| e.id == id) else {
            return false;
        };
        if event.resolved {
            return false;
        }
        event.resolved = true;
        event.resolution_details = Some(resolution.to_string());
        event.resolved_at = Some(Utc::now());
        info!(event_id = %id, "Resolved critical event");
        true
    }

    /// Stored critical events, oldest first
    #[must_use]
    pub fn critical_events(&self, include_resolved: bool) -> Vec<CriticalEvent> {
        self.state()
            .events
            .iter()
            .filter(|e| include_resolved || !e.resolved)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn get_metrics(&self) -> MonitorMetrics {
        self.state().metrics()
    }

    /// Stats, status and a recommendation for one agent
    #[must_use]
    pub fn get_agent_metrics(&self, agent_id: &str) -> Option<AgentHealthReport> {
        let stats = self.state().agents.get(agent_id).cloned()?;
        let (status, recommendation) = health::agent_status(&stats, self.settings.timeout_threshold);
        Some(AgentHealthReport {
            stats,
            status,
            recommendation,
        })
    }

    /// Trends over the last `window_minutes`, limited to what the recent
    /// buffer still holds
    #[must_use]
    pub fn get_system_trends(&self, window_minutes: u32) -> SystemTrends {
        self.system_trends_at(window_minutes, Utc::now())
    }

    pub(crate) fn system_trends_at(&self, window_minutes: u32, now: DateTime<Utc>) -> SystemTrends {
        let state = self.state();
        health::trends(state.recent.iter(), now, window_minutes)
    }

    #[must_use]
    pub fn health_score(&self) -> HealthReport {
        let state = self.state();
        let metrics = state.metrics();
        let unresolved = metrics.critical_events;
        let score = health::score(&metrics, state.recent_success_rate(), unresolved);
        HealthReport {
            score,
            status: health::status_for_score(score),
            metrics,
            unresolved_critical_events: unresolved,
            checked_at: Utc::now(),
        }
    }

    /// Drop all counters, history and events
    pub fn reset(&self) {
        *self.state() = MonitorState::new(&self.settings);
        info!("Validation monitor reset");
    }

    /// Start the background loop on the current tokio runtime.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_monitoring(
        self: &Arc<Self>,
        config: MonitoringConfig,
    ) -> Result<HealthCheckReceiver, MonitorError> {
        if config.metrics_interval.is_zero() {
            return Err(MonitorError::InvalidInterval {
                name: "metrics_interval".to_string(),
            });
        }
        if config.health_check_interval.is_zero() {
            return Err(MonitorError::InvalidInterval {
                name: "health_check_interval".to_string(),
            });
        }

        let mut slot = self.health_loop();
        if let Some(handle) = slot.as_ref()
            && !handle.is_finished()
        {
            return Err(MonitorError::AlreadyRunning);
        }

        let (handle, receiver) = health_loop::spawn(Arc::downgrade(self), config);
        *slot = Some(handle);
        info!(
            metrics_interval_ms = config.metrics_interval.as_millis() as u64,
            health_check_interval_ms = config.health_check_interval.as_millis() as u64,
            "Started validation monitoring"
        );
        Ok(receiver)
    }

    /// Stop the background loop. Returns false if it was not running.
    pub fn stop_monitoring(&self) -> bool {
        let Some(handle) = self.health_loop().take() else {
            return false;
        };
        let was_running = !handle.is_finished();
        handle.stop();
        if was_running {
            info!("Stopped validation monitoring");
        }
        was_running
    }

    #[must_use]
    pub fn is_monitoring(&self) -> bool {
        self.health_loop()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}
