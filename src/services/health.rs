use crate::services::sbi_mapping::unresolved_reference_count;
use crate::types::error::{PolicyOperation, SessionError};
use crate::types::session::{Health, HealthStatus};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    Success,
    Failure,
    Timeout,
}

impl CallOutcome {
    pub fn of<T>(result: &Result<T, SessionError>) -> Self {
        match result {
            Ok(_) => CallOutcome::Success,
            Err(e) if e.is_timeout() => CallOutcome::Timeout,
            Err(_) => CallOutcome::Failure,
        }
    }
}

/// Monotone PCF call counters at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HealthMetricsSnapshot {
    pub create_requests: u64,
    pub create_failures: u64,
    pub update_requests: u64,
    pub update_failures: u64,
    pub delete_requests: u64,
    pub delete_failures: u64,
    pub timeouts: u64,
}

impl HealthMetricsSnapshot {
    pub fn delta(&self, previous: &Self) -> Self {
        Self {
            create_requests: self.create_requests.saturating_sub(previous.create_requests),
            create_failures: self.create_failures.saturating_sub(previous.create_failures),
            update_requests: self.update_requests.saturating_sub(previous.update_requests),
            update_failures: self.update_failures.saturating_sub(previous.update_failures),
            delete_requests: self.delete_requests.saturating_sub(previous.delete_requests),
            delete_failures: self.delete_failures.saturating_sub(previous.delete_failures),
            timeouts: self.timeouts.saturating_sub(previous.timeouts),
        }
    }

    pub fn total(&self) -> u64 {
        self.create_requests
            + self.create_failures
            + self.update_requests
            + self.update_failures
            + self.delete_requests
            + self.delete_failures
    }

    pub fn failures(&self) -> u64 {
        self.create_failures + self.update_failures + self.delete_failures + self.timeouts
    }
}

#[derive(Debug, Clone)]
pub struct HealthConfig {
    pub failure_ratio_threshold: f64,
    pub minimum_request_threshold: u64,
    pub n7_disabled: bool,
}

#[derive(Default)]
struct OperationCounters {
    requests: AtomicU64,
    failures: AtomicU64,
}

/// Circuit-breaker style health of the PCF link, judged over the window
/// between two consecutive polls.
pub struct HealthTracker {
    config: HealthConfig,
    create: OperationCounters,
    update: OperationCounters,
    delete: OperationCounters,
    timeouts: AtomicU64,
    previous: Mutex<HealthMetricsSnapshot>,
}

impl HealthTracker {
    pub fn new(config: HealthConfig) -> Self {
        Self {
            config,
            create: OperationCounters::default(),
            update: OperationCounters::default(),
            delete: OperationCounters::default(),
            timeouts: AtomicU64::new(0),
            previous: Mutex::new(HealthMetricsSnapshot::default()),
        }
    }

    pub fn report(&self, operation: PolicyOperation, outcome: CallOutcome) {
        let counters = match operation {
            PolicyOperation::Create => &self.create,
            PolicyOperation::Update => &self.update,
            PolicyOperation::Delete => &self.delete,
        };
        match outcome {
            CallOutcome::Success => {
                counters.requests.fetch_add(1, Ordering::Relaxed);
            }
            CallOutcome::Failure => {
                counters.failures.fetch_add(1, Ordering::Relaxed);
            }
            CallOutcome::Timeout => {
                counters.requests.fetch_add(1, Ordering::Relaxed);
                self.timeouts.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn report_create(&self, outcome: CallOutcome) {
        self.report(PolicyOperation::Create, outcome);
    }

    pub fn report_update(&self, outcome: CallOutcome) {
        self.report(PolicyOperation::Update, outcome);
    }

    pub fn report_delete(&self, outcome: CallOutcome) {
        self.report(PolicyOperation::Delete, outcome);
    }

    pub fn snapshot(&self) -> HealthMetricsSnapshot {
        HealthMetricsSnapshot {
            create_requests: self.create.requests.load(Ordering::Relaxed),
            create_failures: self.create.failures.load(Ordering::Relaxed),
            update_requests: self.update.requests.load(Ordering::Relaxed),
            update_failures: self.update.failures.load(Ordering::Relaxed),
            delete_requests: self.delete.requests.load(Ordering::Relaxed),
            delete_failures: self.delete.failures.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
        }
    }

    /// Judges the window since the previous poll and starts a new one.
    pub fn get_health_status(&self) -> HealthStatus {
        let delta = {
            let mut previous = self
                .previous
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let latest = self.snapshot();
            let delta = latest.delta(&previous);
            *previous = latest;
            delta
        };

        let unresolved_references = unresolved_reference_count();

        if self.config.n7_disabled {
            return HealthStatus {
                health: Health::Healthy,
                health_message: "N7 is disabled".to_string(),
                unresolved_references,
            };
        }

        let total = delta.total();
        let failures = delta.failures();
        if total >= self.config.minimum_request_threshold && total > 0 {
            let ratio = failures as f64 / total as f64;
            if ratio >= self.config.failure_ratio_threshold {
                tracing::warn!(
                    "PCF link unhealthy: {} failures in {} requests (ratio {:.2})",
                    failures,
                    total,
                    ratio
                );
                return HealthStatus {
                    health: Health::Unhealthy,
                    health_message: format!(
                        "Metric failure ratio {:.3} exceeds threshold {:.3} over {} requests",
                        ratio, self.config.failure_ratio_threshold, total
                    ),
                    unresolved_references,
                };
            }
        }

        HealthStatus {
            health: Health::Healthy,
            health_message: "All metrics appear healthy".to_string(),
            unresolved_references,
        }
    }
}
