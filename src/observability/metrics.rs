use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Global metrics instance.
pub static METRICS: OnceLock<Metrics> = OnceLock::new();

/// Metrics collector for the expense bot.
#[derive(Debug, Clone)]
pub struct Metrics {
    initialized: bool,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self { initialized: true }
    }

    pub fn record_expense_recorded(&self, shared_by_all: bool) {
        counter!("expenses_recorded_total", "split" => if shared_by_all { "all" } else { "subset" }).increment(1);
    }

    pub fn record_entry_rejected(&self, reason: &str) {
        counter!("expense_entries_rejected_total", "reason" => reason.to_string()).increment(1);
    }

    pub fn record_settlement(&self, member_count: u64, transfer_count: u64, duration_ms: f64) {
        counter!("settlements_computed_total").increment(1);
        histogram!("settlement_member_count").record(member_count as f64);
        histogram!("settlement_transfer_count").record(transfer_count as f64);
        histogram!("settlement_duration_ms").record(duration_ms);
    }

    pub fn record_period_started(&self, deleted_expenses: u64) {
        counter!("periods_started_total").increment(1);
        histogram!("period_deleted_expenses").record(deleted_expenses as f64);
    }

    pub fn record_aliases_updated(&self, count: u64) {
        counter!("aliases_updated_total").increment(count);
    }

    pub fn record_webhook_update(&self, outcome: &str) {
        counter!("webhook_updates_total", "outcome" => outcome.to_string()).increment(1);
    }

    pub fn record_reply_sent(&self, success: bool, duration_ms: f64) {
        counter!("telegram_replies_total", "success" => success.to_string()).increment(1);
        histogram!("telegram_reply_duration_ms").record(duration_ms);
    }
}

/// Timer for measuring operation latency.
pub struct LatencyTimer {
    start: Instant,
}

impl LatencyTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Default for LatencyTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Installs the Prometheus recorder once and returns its handle.
pub fn init_metrics() -> PrometheusHandle {
    let handle = METRICS_HANDLE.get_or_init(|| {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .expect("Failed to install Prometheus recorder");

        describe_metrics();
        handle
    });

    METRICS.get_or_init(Metrics::new);

    handle.clone()
}

fn describe_metrics() {
    describe_counter!("expenses_recorded_total", Unit::Count, "Expense entries stored");
    describe_counter!("expense_entries_rejected_total", Unit::Count, "Expense entries rejected because of unknown initials");
    describe_counter!("settlements_computed_total", Unit::Count, "Period summaries computed");
    describe_histogram!("settlement_member_count", Unit::Count, "Members in a settlement");
    describe_histogram!("settlement_transfer_count", Unit::Count, "Transfers proposed by a settlement");
    describe_histogram!("settlement_duration_ms", Unit::Milliseconds, "Balance and settlement computation latency");

    describe_counter!("periods_started_total", Unit::Count, "Periods reset with /batdau");
    describe_histogram!("period_deleted_expenses", Unit::Count, "Expenses deleted by a period reset");
    describe_counter!("aliases_updated_total", Unit::Count, "Alias pairs written with /setmap");

    describe_counter!("webhook_updates_total", Unit::Count, "Webhook updates by outcome");
    describe_counter!("telegram_replies_total", Unit::Count, "Replies sent through the Bot API");
    describe_histogram!("telegram_reply_duration_ms", Unit::Milliseconds, "Bot API sendMessage latency");
}

/// Returns the global metrics instance.
pub fn get_metrics() -> &'static Metrics {
    METRICS.get_or_init(Metrics::new)
}
