//! Scoring, agent status and trend analysis over monitor snapshots

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::types::{
    AgentPerformanceStats, HealthStatus, MonitorMetrics, PerformanceMetric, SystemTrends,
    TrendDirection,
};

const HEALTHY_SCORE: u8 = 80;
const DEGRADED_SCORE: u8 = 50;

const AGENT_HEALTHY_RATE: f64 = 0.95;
const AGENT_DEGRADED_RATE: f64 = 0.80;

/// Failure-rate change between window halves that counts as a trend
const TREND_DELTA: f64 = 0.05;

/// Health score from 0 to 100.
///
/// Penalties: up to 60 for the rolling failure rate, up to 20 for failed
/// corrections, 10 per unresolved critical event capped at 30.
pub(crate) fn score(metrics: &MonitorMetrics, recent_success_rate: f64, unresolved: usize) -> u8 {
    let failure_penalty = (1.0 - recent_success_rate.clamp(0.0, 1.0)) * 60.0;
    let correction_penalty = (1.0 - metrics.correction_success_rate.clamp(0.0, 1.0)) * 20.0;
    let event_penalty = (unresolved.min(3) * 10) as f64;
    (100.0 - failure_penalty - correction_penalty - event_penalty)
        .clamp(0.0, 100.0)
        .round() as u8
}

pub(crate) fn status_for_score(score: u8) -> HealthStatus {
    if score >= HEALTHY_SCORE {
        HealthStatus::Healthy
    } else if score >= DEGRADED_SCORE {
        HealthStatus::Degraded
    } else {
        HealthStatus::Critical
    }
}

pub(crate) fn agent_status(
    stats: &AgentPerformanceStats,
    timeout_threshold: Duration,
) -> (HealthStatus, String) {
    if stats.total_validations == 0 {
        return (HealthStatus::Healthy, "No validations recorded yet".to_string());
    }

    let rate = stats.success_rate * 100.0;
    let slow = stats.average_duration_ms > timeout_threshold.as_millis() as f64;

    if stats.success_rate < AGENT_DEGRADED_RATE {
        return (
            HealthStatus::Critical,
            format!(
                "Success rate {rate:.1}% is critically low; review this agent's output against its contract before further handoffs"
            ),
        );
    }
    if stats.success_rate < AGENT_HEALTHY_RATE {
        return (
            HealthStatus::Degraded,
            format!("Success rate {rate:.1}% is below 95%; inspect the most frequent validation errors"),
        );
    }
    if slow {
        return (
            HealthStatus::Degraded,
            format!(
                "Average validation time {:.0} ms exceeds the {} ms threshold; check payload sizes and backend latency",
                stats.average_duration_ms,
                timeout_threshold.as_millis()
            ),
        );
    }
    (HealthStatus::Healthy, "Agent is performing within thresholds".to_string())
}

fn failure_rate(metrics: &[&PerformanceMetric]) -> Option<f64> {
    if metrics.is_empty() {
        return None;
    }
    let failed = metrics.iter().filter(|m| !m.success).count();
    Some(failed as f64 / metrics.len() as f64)
}

pub(crate) fn trends<'a>(
    metrics: impl Iterator<Item = &'a PerformanceMetric>,
    now: DateTime<Utc>,
    window_minutes: u32,
) -> SystemTrends {
    let window = ChronoDuration::minutes(i64::from(window_minutes));
    let start = now - window;
    let midpoint = start + window / 2;

    let in_window: Vec<&PerformanceMetric> =
        metrics.filter(|m| m.timestamp >= start && m.timestamp <= now).collect();

    let total = in_window.len() as u64;
    let failed = in_window.iter().filter(|m| !m.success).count() as u64;
    let failure_rate_all = if total == 0 { 0.0 } else { failed as f64 / total as f64 };
    let average_duration_ms = if total == 0 {
        0.0
    } else {
        in_window.iter().map(|m| m.duration_ms as f64).sum::<f64>() / total as f64
    };

    let mut failures_by_error_type = BTreeMap::new();
    let mut failures_by_agent = BTreeMap::new();
    for m in in_window.iter().filter(|m| !m.success) {
        let error_type = m.error_type.clone().unwrap_or_else(|| "unknown".to_string());
        *failures_by_error_type.entry(error_type).or_insert(0) += 1;
        *failures_by_agent.entry(m.agent_id.clone()).or_insert(0) += 1;
    }

    let (older, newer): (Vec<&PerformanceMetric>, Vec<&PerformanceMetric>) =
        in_window.iter().partition(|m| m.timestamp < midpoint);
    let direction = match (failure_rate(&older), failure_rate(&newer)) {
        (Some(before), Some(after)) if after < before - TREND_DELTA => TrendDirection::Improving,
        (Some(before), Some(after)) if after > before + TREND_DELTA => TrendDirection::Degrading,
        _ => TrendDirection::Stable,
    };

    let recommendation = recommend(total, failure_rate_all, direction, &failures_by_error_type);

    SystemTrends {
        window_minutes,
        total_validations: total,
        failed_validations: failed,
        failure_rate: failure_rate_all,
        average_duration_ms,
        failures_by_error_type,
        failures_by_agent,
        direction,
        recommendation,
    }
}

fn recommend(
    total: u64,
    failure_rate: f64,
    direction: TrendDirection,
    by_type: &BTreeMap<String, u64>,
) -> String {
    if total == 0 {
        return "No validations in this window".to_string();
    }
    let top = by_type
        .iter()
        .max_by_key(|(_, count)| **count)
        .map(|(name, _)| name.as_str());

    match (direction, top) {
        (TrendDirection::Degrading, Some(top)) => format!(
            "Failure rate is rising ({:.1}%); most failures are {top}",
            failure_rate * 100.0
        ),
        (TrendDirection::Degrading, None) => "Failure rate is rising".to_string(),
        (_, Some(top)) if failure_rate > 1.0 - AGENT_HEALTHY_RATE => format!(
            "Failure rate {:.1}% is above 5%; focus on {top} errors",
            failure_rate * 100.0
        ),
        (TrendDirection::Improving, _) => "Failure rate is falling; keep monitoring".to_string(),
        _ => "Validation health is stable".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(success_rate: f64, correction_rate: f64) -> MonitorMetrics {
        MonitorMetrics {
            total_validations: 10,
            successful_validations: 0,
            failed_validations: 0,
            success_rate,
            total_corrections: 0,
            successful_corrections: 0,
            correction_success_rate: correction_rate,
            critical_events: 0,
        }
    }

    fn metric(minutes_ago: i64, success: bool, now: DateTime<Utc>) -> PerformanceMetric {
        PerformanceMetric {
            agent_id: "content-agent".to_string(),
            agent_type: "content".to_string(),
            validation_type: "content-to-design".to_string(),
            duration_ms: 100,
            success,
            error_type: (!success).then(|| "missing_field".to_string()),
            timestamp: now - ChronoDuration::minutes(minutes_ago),
        }
    }

    #[test]
    fn test_perfect_health() {
        assert_eq!(score(&metrics(1.0, 1.0), 1.0, 0), 100);
        assert_eq!(status_for_score(100), HealthStatus::Healthy);
    }

    #[test]
    fn test_penalties_accumulate() {
        // 50% failures (-30), half of corrections failed (-10), 5 events (-30)
        let s = score(&metrics(0.5, 0.5), 0.5, 5);
        assert_eq!(s, 30);
        assert_eq!(status_for_score(s), HealthStatus::Critical);
        assert_eq!(status_for_score(79), HealthStatus::Degraded);
        assert_eq!(status_for_score(50), HealthStatus::Degraded);
    }

    #[test]
    fn test_agent_status_thresholds() {
        let mut stats = AgentPerformanceStats::new("a", "content");
        let threshold = Duration::from_millis(1000);
        assert_eq!(agent_status(&stats, threshold).0, HealthStatus::Healthy);

        let now = Utc::now();
        for _ in 0..9 {
            stats.record(true, 10.0, now);
        }
        stats.record(false, 10.0, now);
        assert_eq!(agent_status(&stats, threshold).0, HealthStatus::Degraded);

        for _ in 0..5 {
            stats.record(false, 10.0, now);
        }
        assert_eq!(agent_status(&stats, threshold).0, HealthStatus::Critical);
    }

    #[test]
    fn test_slow_agent_is_degraded() {
        let mut stats = AgentPerformanceStats::new("a", "design");
        stats.record(true, 5000.0, Utc::now());
        let (status, recommendation) = agent_status(&stats, Duration::from_millis(1000));
        assert_eq!(status, HealthStatus::Degraded);
        assert!(recommendation.contains("5000 ms"));
    }

    #[test]
    fn test_trend_degrading() {
        let now = Utc::now();
        let data = vec![
            metric(50, true, now),
            metric(45, true, now),
            metric(40, true, now),
            metric(20, false, now),
            metric(10, false, now),
            metric(5, true, now),
            metric(90, false, now),
        ];
        let trends = trends(data.iter(), now, 60);
        assert_eq!(trends.total_validations, 6);
        assert_eq!(trends.failed_validations, 2);
        assert_eq!(trends.direction, TrendDirection::Degrading);
        assert_eq!(trends.failures_by_error_type.get("missing_field"), Some(&2));
        assert_eq!(trends.failures_by_agent.get("content-agent"), Some(&2));
        assert!(trends.recommendation.contains("missing_field"));
    }

    #[test]
    fn test_trend_improving_and_empty() {
        let now = Utc::now();
        let data = vec![metric(50, false, now), metric(40, false, now), metric(10, true, now)];
        assert_eq!(trends(data.iter(), now, 60).direction, TrendDirection::Improving);

        let empty: Vec<PerformanceMetric> = Vec::new();
        let trends = trends(empty.iter(), now, 60);
        assert_eq!(trends.direction, TrendDirection::Stable);
        assert_eq!(trends.failure_rate, 0.0);
        assert_eq!(trends.recommendation, "No validations in this window");
    }
}
