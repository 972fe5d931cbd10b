// Metrics module
//
// Lightweight counters for bridged operations and isolated domains

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Process-wide bridge counters.
///
/// Uses atomic operations so every continuation, on any thread, can record
/// without locking.
#[derive(Debug)]
pub struct BridgeMetrics {
    /// Bridges whose start function has been invoked
    pub started: AtomicU64,

    /// Results handed to a waiting caller
    pub delivered: AtomicU64,

    /// Results that arrived after the caller stopped waiting
    pub discarded: AtomicU64,

    /// Continuations dropped without ever being resumed
    pub owner_gone: AtomicU64,

    /// Resume attempts rejected because the slot was already filled
    pub double_resumes: AtomicU64,
}

/// Global bridge metrics instance.
pub static BRIDGE_METRICS: BridgeMetrics = BridgeMetrics::new();

impl BridgeMetrics {
    pub const fn new() -> Self {
        Self {
            started: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
            owner_gone: AtomicU64::new(0),
            double_resumes: AtomicU64::new(0),
        }
    }

    pub fn record_started(&self) {
        self.started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_discarded(&self) {
        self.discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_owner_gone(&self) {
        self.owner_gone.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_double_resume(&self) {
        self.double_resumes.fetch_add(1, Ordering::Relaxed);
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!(
            "Bridges: {} started, {} delivered, {} discarded, {} owner gone, {} double resumes rejected",
            self.started.load(Ordering::Relaxed),
            self.delivered.load(Ordering::Relaxed),
            self.discarded.load(Ordering::Relaxed),
            self.owner_gone.load(Ordering::Relaxed),
            self.double_resumes.load(Ordering::Relaxed)
        );
    }
}

impl Default for BridgeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Counters for one isolated domain.
///
/// Readable from anywhere without entering the domain: none of them are part
/// of the isolated state.
#[derive(Debug)]
pub struct DomainMetrics {
    /// Operations accepted into the queue
    pub admitted: AtomicU64,

    /// Operations run to completion
    pub executed: AtomicU64,

    /// Operations that panicked while holding the state
    pub panicked: AtomicU64,

    /// Fire-and-forget posts refused because the queue was full
    pub busy_rejections: AtomicU64,

    /// Total time spent inside operations, in microseconds
    pub busy_time_us: AtomicU64,

    created: Instant,
}

impl DomainMetrics {
    pub fn new() -> Self {
        Self {
            admitted: AtomicU64::new(0),
            executed: AtomicU64::new(0),
            panicked: AtomicU64::new(0),
            busy_rejections: AtomicU64::new(0),
            busy_time_us: AtomicU64::new(0),
            created: Instant::now(),
        }
    }

    pub fn record_admitted(&self) {
        self.admitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_executed(&self, took: Duration) {
        self.executed.fetch_add(1, Ordering::Relaxed);
        self.busy_time_us
            .fetch_add(took.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn record_panicked(&self) {
        self.panicked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_busy_rejection(&self) {
        self.busy_rejections.fetch_add(1, Ordering::Relaxed);
    }

    /// Operations admitted but not yet finished.
    pub fn in_flight(&self) -> u64 {
        let admitted = self.admitted.load(Ordering::Relaxed);
        let finished =
            self.executed.load(Ordering::Relaxed) + self.panicked.load(Ordering::Relaxed);
        admitted.saturating_sub(finished)
    }

    /// Time since the domain was created
    pub fn uptime(&self) -> Duration {
        self.created.elapsed()
    }

    /// Average time per executed operation in microseconds
    pub fn avg_operation_us(&self) -> f64 {
        let total = self.busy_time_us.load(Ordering::Relaxed);
        let count = self.executed.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self, domain: &str) {
        tracing::info!(
            domain,
            "Domain metrics: {} admitted, {} executed, {} panicked, {} busy rejections, avg {:.1}us, uptime {:.2}s",
            self.admitted.load(Ordering::Relaxed),
            self.executed.load(Ordering::Relaxed),
            self.panicked.load(Ordering::Relaxed),
            self.busy_rejections.load(Ordering::Relaxed),
            self.avg_operation_us(),
            self.uptime().as_secs_f64()
        );
    }
}

impl Default for DomainMetrics {
    fn default() -> Self {
        Self::new()
    }
}
