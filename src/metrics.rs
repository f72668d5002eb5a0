use prometheus::{Histogram, HistogramOpts, IntCounter, Opts};
use tracing::warn;

/// Prometheus metrics for the vote ledger.
///
/// Registered on the default registry; a second registration (e.g. two
/// engines in one process) logs a warning and keeps the unregistered
/// handles, which still count but are not scraped twice.
#[derive(Clone)]
pub struct VoteMetrics {
    pub votes_recorded: IntCounter,
    pub votes_removed: IntCounter,
    pub votes_flipped: IntCounter,
    pub karma_applied: IntCounter,
    pub karma_dropped: IntCounter,
    pub vote_latency_seconds: Histogram,
}

impl VoteMetrics {
    pub fn new(service: &str) -> Self {
        let registry = prometheus::default_registry();

        let votes_recorded = IntCounter::with_opts(
            Opts::new("votes_recorded_total", "Total new vote records created")
                .const_label("service", service.to_string()),
        )
        .expect("valid metric opts for votes_recorded_total");

        let votes_removed = IntCounter::with_opts(
            Opts::new(
                "votes_removed_total",
                "Total vote records removed by toggle-off",
            )
            .const_label("service", service.to_string()),
        )
        .expect("valid metric opts for votes_removed_total");

        let votes_flipped = IntCounter::with_opts(
            Opts::new(
                "votes_flipped_total",
                "Total vote records flipped to the opposite direction",
            )
            .const_label("service", service.to_string()),
        )
        .expect("valid metric opts for votes_flipped_total");

        let karma_applied = IntCounter::with_opts(
            Opts::new(
                "karma_adjustments_applied_total",
                "Total karma adjustments applied by background workers",
            )
            .const_label("service", service.to_string()),
        )
        .expect("valid metric opts for karma_adjustments_applied_total");

        let karma_dropped = IntCounter::with_opts(
            Opts::new(
                "karma_adjustments_dropped_total",
                "Total karma adjustments dropped (full queue or store failure)",
            )
            .const_label("service", service.to_string()),
        )
        .expect("valid metric opts for karma_adjustments_dropped_total");

        let vote_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "vote_latency_seconds",
                "Latency of the synchronous vote path",
            )
            .const_label("service", service.to_string()),
        )
        .expect("valid metric opts for vote_latency_seconds");

        for metric in [
            Box::new(votes_recorded.clone()) as Box<dyn prometheus::core::Collector>,
            Box::new(votes_removed.clone()),
            Box::new(votes_flipped.clone()),
            Box::new(karma_applied.clone()),
            Box::new(karma_dropped.clone()),
            Box::new(vote_latency_seconds.clone()),
        ] {
            if let Err(e) = registry.register(metric) {
                warn!("Failed to register vote ledger metric: {}", e);
            }
        }

        Self {
            votes_recorded,
            votes_removed,
            votes_flipped,
            karma_applied,
            karma_dropped,
            vote_latency_seconds,
        }
    }
}
