//! Query timing, write volume and pool gauges exported through the `metrics`
//! facade. Every series carries a `table` label so dashboards can split
//! telemetry ingest from registry and weather traffic.

use metrics::{counter, gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Table a named query mostly touches. Weather names are checked before the
/// generic `alert` match since weather advisories live in their own table.
fn table_for(query: &str) -> &'static str {
    if query.contains("weather") {
        "weather"
    } else if query.contains("reading") {
        "readings"
    } else if query.contains("alert") {
        "iot_alerts"
    } else if query.contains("maintenance") {
        "maintenance_logs"
    } else if query.contains("edge") {
        "edge_devices"
    } else if query.contains("device") {
        "devices"
    } else if query.contains("field") {
        "fields"
    } else if query.contains("user") {
        "users"
    } else {
        "other"
    }
}

/// Samples pool occupancy. Called on every scrape of `/metrics`.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();

    gauge!("database_connections_active").set(size.saturating_sub(idle) as f64);
    gauge!("database_connections_idle").set(idle as f64);
    gauge!("database_connections_max").set(f64::from(pool.options().get_max_connections()));
}

/// Times one repository call.
///
/// ```ignore
/// let timer = QueryTimer::new("insert_readings_batch");
/// let rows = insert(&mut tx, &readings).await?;
/// timer.record_rows(rows.len());
/// ```
pub struct QueryTimer {
    query: &'static str,
    table: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query: &'static str) -> Self {
        Self {
            query,
            table: table_for(query),
            start: Instant::now(),
        }
    }

    pub fn record(self) {
        histogram!(
            "database_query_duration_seconds",
            "query" => self.query,
            "table" => self.table
        )
        .record(self.start.elapsed().as_secs_f64());
    }

    /// Records the duration plus the number of rows a bulk write produced.
    pub fn record_rows(self, rows: usize) {
        counter!("database_rows_written_total", "table" => self.table).increment(rows as u64);
        self.record();
    }
}
