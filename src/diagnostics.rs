use dioxus::logger::tracing::debug;

/// Log how long a pass took. Times are wall-clock seconds from the page host,
/// since `std::time::Instant` is unavailable in the browser.
#[inline]
pub fn log_perf(scope: &str, started_at: f64, finished_at: f64, details: &str) {
    let elapsed_ms = ((finished_at - started_at) * 1000.0).max(0.0);
    if details.trim().is_empty() {
        debug!("[perf] {scope} took {elapsed_ms:.1}ms");
    } else {
        debug!("[perf] {scope} took {elapsed_ms:.1}ms | {details}");
    }
}
