//! Prometheus metrics for the prediction endpoint.
//!
//! Each [`ServerMetrics`] owns its own registry so tests can build
//! independent routers without colliding on global registration.

use std::time::Duration;

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder};

/// Outcome label attached to every prediction request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    ClientError,
    ScoringError,
}

impl Outcome {
    fn as_label(&self) -> &'static str {
        match self {
            Outcome::Ok => "ok",
            Outcome::ClientError => "client_error",
            Outcome::ScoringError => "scoring_error",
        }
    }
}

pub struct ServerMetrics {
    registry: Registry,
    predictions: IntCounterVec,
    latency: Histogram,
}

impl ServerMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let predictions = IntCounterVec::new(
            Opts::new("prediction_requests_total", "Prediction requests by outcome"),
            &["outcome"],
        )?;
        let latency = Histogram::with_opts(
            HistogramOpts::new(
                "prediction_latency_seconds",
                "Time spent validating and scoring a prediction request",
            )
            .buckets(vec![0.00005, 0.0001, 0.00025, 0.0005, 0.001, 0.0025, 0.01]),
        )?;

        registry.register(Box::new(predictions.clone()))?;
        registry.register(Box::new(latency.clone()))?;

        Ok(Self {
            registry,
            predictions,
            latency,
        })
    }

    /// Record one finished prediction request.
    pub fn observe(&self, outcome: Outcome, elapsed: Duration) {
        self.predictions
            .with_label_values(&[outcome.as_label()])
            .inc();
        self.latency.observe(elapsed.as_secs_f64());
    }

    /// Number of requests recorded with `outcome`.
    pub fn count(&self, outcome: Outcome) -> u64 {
        self.predictions
            .with_label_values(&[outcome.as_label()])
            .get()
    }

    /// Render all metrics in the Prometheus text exposition format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
