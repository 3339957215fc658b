use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub orders_total: IntCounterVec,
    pub actions_total: IntCounterVec,
    pub timeline_corrections_total: IntCounter,
    pub notifications_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let orders_total = IntCounterVec::new(
            Opts::new("orders_total", "Order status transitions by new status"),
            &["status"],
        )
        .expect("valid orders_total metric");

        let actions_total = IntCounterVec::new(
            Opts::new("actions_total", "Action handler invocations by outcome"),
            &["action", "outcome"],
        )
        .expect("valid actions_total metric");

        let timeline_corrections_total = IntCounter::new(
            "timeline_corrections_total",
            "Out-of-order step timestamps clamped during timeline reconstruction",
        )
        .expect("valid timeline_corrections_total metric");

        let notifications_total = IntCounterVec::new(
            Opts::new("notifications_total", "Notifications emitted by recipient role"),
            &["recipient"],
        )
        .expect("valid notifications_total metric");

        registry
            .register(Box::new(orders_total.clone()))
            .expect("register orders_total");
        registry
            .register(Box::new(actions_total.clone()))
            .expect("register actions_total");
        registry
            .register(Box::new(timeline_corrections_total.clone()))
            .expect("register timeline_corrections_total");
        registry
            .register(Box::new(notifications_total.clone()))
            .expect("register notifications_total");

        Self {
            registry,
            orders_total,
            actions_total,
            timeline_corrections_total,
            notifications_total,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
