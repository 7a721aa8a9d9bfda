//! Metrics and observability utilities
//!
//! Prometheus metrics with standardized naming conventions.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all SAMIT metrics
pub const METRICS_PREFIX: &str = "samit";

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Workflow metrics
    describe_counter!(
        format!("{}_applications_submitted_total", METRICS_PREFIX),
        Unit::Count,
        "Total job applications submitted"
    );

    describe_counter!(
        format!("{}_status_changes_total", METRICS_PREFIX),
        Unit::Count,
        "Total workflow status changes"
    );

    describe_counter!(
        format!("{}_verifications_decided_total", METRICS_PREFIX),
        Unit::Count,
        "Total organization verification decisions"
    );

    describe_counter!(
        format!("{}_enrollments_created_total", METRICS_PREFIX),
        Unit::Count,
        "Total class enrollments created"
    );

    describe_counter!(
        format!("{}_resumes_uploaded_total", METRICS_PREFIX),
        Unit::Count,
        "Total resumes uploaded"
    );

    describe_counter!(
        format!("{}_job_views_total", METRICS_PREFIX),
        Unit::Count,
        "Total public job detail views"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Record a submitted application
pub fn record_application_submitted() {
    counter!(format!("{}_applications_submitted_total", METRICS_PREFIX)).increment(1);
}

/// Record a workflow status change
pub fn record_status_change(entity: &str, status: &str) {
    counter!(
        format!("{}_status_changes_total", METRICS_PREFIX),
        "entity" => entity.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record a verification decision
pub fn record_verification(status: &str) {
    counter!(
        format!("{}_verifications_decided_total", METRICS_PREFIX),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record a class enrollment
pub fn record_enrollment() {
    counter!(format!("{}_enrollments_created_total", METRICS_PREFIX)).increment(1);
}

/// Record a resume upload
pub fn record_resume_uploaded() {
    counter!(format!("{}_resumes_uploaded_total", METRICS_PREFIX)).increment(1);
}

/// Record a public job detail view
pub fn record_job_view() {
    counter!(format!("{}_job_views_total", METRICS_PREFIX)).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_metrics() {
        let metrics = RequestMetrics::start("GET", "/jobs");
        std::thread::sleep(std::time::Duration::from_millis(10));
        metrics.finish(200);
        // Just verify it runs without panic
    }

    #[test]
    fn test_workflow_recorders() {
        record_application_submitted();
        record_status_change("application", "shortlisted");
        record_verification("verified");
        record_enrollment();
        record_resume_uploaded();
        record_job_view();
    }
}
