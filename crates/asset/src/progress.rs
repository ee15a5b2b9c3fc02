//! Byte-progress reporting for in-flight resource loads.
//!
//! Purely observational: one log line per event, no aggregation, no
//! throttling, no effect on control flow.

/// A single byte-progress observation for a named resource.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgressEvent {
    /// Resource path as requested (may carry a leading separator).
    pub source: String,
    pub loaded: u64,
    /// Total size in bytes; 0 when unknown.
    pub total: u64,
}

const LOG_PREFIX: &str = "loader";

/// Percentage of the resource loaded so far. A zero total yields a
/// non-finite value (NaN or infinity); callers log it as-is.
#[inline]
pub fn percent(loaded: u64, total: u64) -> f64 {
    100.0 * loaded as f64 / total as f64
}

/// Log one status line for the event. Must never panic, even when the
/// total is zero or unknown.
pub fn report(event: &ProgressEvent) {
    let name = event.source.strip_prefix('/').unwrap_or(&event.source);
    log::info!(
        "{}: {} {}% loaded.",
        LOG_PREFIX,
        name,
        percent(event.loaded, event.total)
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_is_loaded_over_total() {
        assert_eq!(percent(50, 200), 25.0);
        assert_eq!(percent(200, 200), 100.0);
        assert_eq!(percent(0, 4), 0.0);
    }

    #[test]
    fn zero_total_is_non_finite_but_does_not_panic() {
        assert!(!percent(0, 0).is_finite());
        assert!(percent(10, 0).is_infinite());
        report(&ProgressEvent {
            source: "/cube.mtl".to_string(),
            loaded: 10,
            total: 0,
        });
    }

    #[test]
    fn report_accepts_leading_separator() {
        // Only the log text changes; just exercise the path handling.
        report(&ProgressEvent {
            source: "/models/cube.obj".to_string(),
            loaded: 1,
            total: 2,
        });
        report(&ProgressEvent {
            source: "cube.obj".to_string(),
            loaded: 2,
            total: 2,
        });
    }
}
