use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Default)]
pub struct AppMetrics {
    generations_total: AtomicU64,
    generation_failures_total: AtomicU64,
    busy_rejections_total: AtomicU64,
    options_generated_total: AtomicU64,
    images_dropped_total: AtomicU64,
    total_latency_millis: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub generations_total: u64,
    pub generation_failures_total: u64,
    pub busy_rejections_total: u64,
    pub options_generated_total: u64,
    pub images_dropped_total: u64,
    pub avg_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_generation(&self) {
        self.generations_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_failure(&self) {
        self.generation_failures_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_busy_rejection(&self) {
        self.busy_rejections_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_options(&self, count: usize) {
        self.options_generated_total
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn add_images_dropped(&self, count: usize) {
        self.images_dropped_total
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_millis
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let generations = self.generations_total.load(Ordering::Relaxed);
        let latency = self.total_latency_millis.load(Ordering::Relaxed);

        MetricsSnapshot {
            generations_total: generations,
            generation_failures_total: self.generation_failures_total.load(Ordering::Relaxed),
            busy_rejections_total: self.busy_rejections_total.load(Ordering::Relaxed),
            options_generated_total: self.options_generated_total.load(Ordering::Relaxed),
            images_dropped_total: self.images_dropped_total.load(Ordering::Relaxed),
            avg_latency_millis: if generations == 0 {
                0.0
            } else {
                latency as f64 / generations as f64
            },
        }
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,smarttrip_agents=info,smarttrip_generation=info",
                service_name
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(std::io::stderr)
            .init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_averages_latency_per_generation() {
        let metrics = AppMetrics::default();
        metrics.inc_generation();
        metrics.inc_generation();
        metrics.observe_latency(Duration::from_millis(30));
        metrics.observe_latency(Duration::from_millis(50));
        metrics.add_images_dropped(3);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.generations_total, 2);
        assert_eq!(snapshot.images_dropped_total, 3);
        assert!((snapshot.avg_latency_millis - 40.0).abs() < f64::EPSILON);
    }
}
