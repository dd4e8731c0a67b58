//! ## lookout-telemetry::metrics
//! **Prometheus registry for the live loop**
//!
//! ### Expectations:
//! - Every counter is registered once in a private `Registry`
//! - Rendered in the text exposition format for `GET /metrics`

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub cycles: IntCounter,
    pub cycle_failures: IntCounter,
    pub flows: IntCounter,
    pub attack_flows: IntCounter,
    pub pipeline_latency: Histogram,
    pub worker_running: IntGauge,
}

impl MetricsRecorder {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let cycles = IntCounter::new("lookout_cycles_total", "Completed capture cycles")?;
        let cycle_failures = IntCounter::new(
            "lookout_cycle_failures_total",
            "Capture cycles aborted by a capture, persistence or pipeline error",
        )?;
        let flows = IntCounter::new("lookout_flows_total", "Flows classified by the live loop")?;
        let attack_flows =
            IntCounter::new("lookout_attack_flows_total", "Flows labelled ATTACK")?;
        let pipeline_latency = Histogram::with_opts(
            HistogramOpts::new(
                "lookout_pipeline_latency_seconds",
                "Detection pipeline wall-clock time",
            )
            .buckets(vec![0.1, 0.5, 1.0, 5.0, 15.0, 60.0]),
        )?;
        let worker_running =
            IntGauge::new("lookout_worker_running", "1 while the live worker is active")?;

        registry.register(Box::new(cycles.clone()))?;
        registry.register(Box::new(cycle_failures.clone()))?;
        registry.register(Box::new(flows.clone()))?;
        registry.register(Box::new(attack_flows.clone()))?;
        registry.register(Box::new(pipeline_latency.clone()))?;
        registry.register(Box::new(worker_running.clone()))?;

        Ok(Self {
            registry,
            cycles,
            cycle_failures,
            flows,
            attack_flows,
            pipeline_latency,
            worker_running,
        })
    }

    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    /// Account for one committed cycle.
    pub fn record_cycle(&self, flows: u64, attacks: u64, pipeline_secs: f64) {
        self.cycles.inc();
        self.flows.inc_by(flows);
        self.attack_flows.inc_by(attacks);
        self.pipeline_latency.observe(pipeline_secs);
    }

    pub fn record_failure(&self) {
        self.cycle_failures.inc();
    }

    pub fn set_running(&self, running: bool) {
        self.worker_running.set(i64::from(running));
    }
}
