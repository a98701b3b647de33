use prometheus::{IntCounter, IntCounterVec, Registry};

/// Counters describing how the request gateway handles credentials.
#[derive(Clone)]
pub struct GatewayMetrics {
    pub registry: Registry,
    pub requests_total: IntCounterVec,
    pub refresh_attempts: IntCounter,
    pub refresh_failures: IntCounter,
    pub requests_queued: IntCounter,
    pub requests_replayed: IntCounter,
    pub session_terminations: IntCounter,
}

impl GatewayMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let requests_total = IntCounterVec::new(
            prometheus::Opts::new(
                "gateway_requests_total",
                "Requests sent through the gateway by outcome",
            ),
            &["outcome"],
        )?;
        let refresh_attempts = IntCounter::new(
            "gateway_refresh_attempts_total",
            "Credential refresh calls issued to the backend",
        )?;
        let refresh_failures = IntCounter::new(
            "gateway_refresh_failures_total",
            "Credential refresh calls that did not yield a new access token",
        )?;
        let requests_queued = IntCounter::new(
            "gateway_requests_queued_total",
            "Requests parked while another caller refreshed credentials",
        )?;
        let requests_replayed = IntCounter::new(
            "gateway_requests_replayed_total",
            "Requests resubmitted with a refreshed access token",
        )?;
        let session_terminations = IntCounter::new(
            "gateway_session_terminations_total",
            "Sessions purged after a terminal authorization failure or logout",
        )?;
        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(refresh_attempts.clone()))?;
        registry.register(Box::new(refresh_failures.clone()))?;
        registry.register(Box::new(requests_queued.clone()))?;
        registry.register(Box::new(requests_replayed.clone()))?;
        registry.register(Box::new(session_terminations.clone()))?;
        Ok(GatewayMetrics {
            registry,
            requests_total,
            refresh_attempts,
            refresh_failures,
            requests_queued,
            requests_replayed,
            session_terminations,
        })
    }

    pub fn record_outcome(&self, outcome: &str) {
        self.requests_total.with_label_values(&[outcome]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_every_counter() {
        let metrics = GatewayMetrics::new().unwrap();
        metrics.record_outcome("ok");
        metrics.refresh_attempts.inc();

        let names: Vec<String> = metrics
            .registry
            .gather()
            .into_iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.contains(&"gateway_requests_total".to_string()));
        assert!(names.contains(&"gateway_refresh_attempts_total".to_string()));
        assert_eq!(metrics.requests_total.with_label_values(&["ok"]).get(), 1);
    }
}
