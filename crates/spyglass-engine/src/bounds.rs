//! Bounds resolver: pure clamping of caller-requested bounds
//!
//! Effective limits and time windows are always clamped server-side; a
//! caller can never widen them past configured maximums, only narrow them.

use chrono::{DateTime, Duration, Utc};
use spyglass_domain::RequestControls;

/// Resolve the effective result limit.
///
/// Absent or zero requests mean "use the default"; anything else is clamped
/// into `[1, max]`.
pub fn clamp_limit(requested: Option<u32>, default: u32, max: u32) -> u32 {
    match requested {
        None | Some(0) => default,
        Some(n) => n.clamp(1, max),
    }
}

/// Resolve the effective lower time bound for a query.
///
/// An explicit `since` is clamped to be no older than `now − max_window`.
/// Otherwise the bound is derived from the requested window (default
/// `default_window_hours`, capped at `max_window_hours`). `now` is passed
/// in; this function performs no I/O.
pub fn resolve_since(
    controls: &RequestControls,
    default_window_hours: u32,
    max_window_hours: u32,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    let floor = now - Duration::hours(max_window_hours as i64);

    if let Some(since) = controls.since {
        return since.max(floor);
    }

    let requested = controls
        .time_window_hours
        .filter(|w| *w > 0)
        .unwrap_or(default_window_hours);
    let window_hours = requested.min(max_window_hours);

    now - Duration::hours(window_hours as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_clamp_limit_defaults() {
        assert_eq!(clamp_limit(None, 100, 200), 100);
        assert_eq!(clamp_limit(Some(0), 100, 200), 100);
    }

    #[test]
    fn test_clamp_limit_bounds() {
        assert_eq!(clamp_limit(Some(9999), 100, 200), 200);
        assert_eq!(clamp_limit(Some(50), 100, 200), 50);
        assert_eq!(clamp_limit(Some(1), 100, 200), 1);
    }

    #[test]
    fn test_since_derived_from_default_window() {
        let controls = RequestControls::default();
        let since = resolve_since(&controls, 24, 168, now());
        assert_eq!(since, now() - Duration::hours(24));
    }

    #[test]
    fn test_since_requested_window_capped() {
        let controls = RequestControls {
            time_window_hours: Some(4000),
            ..Default::default()
        };
        let since = resolve_since(&controls, 24, 168, now());
        assert_eq!(since, now() - Duration::hours(168));

        let controls = RequestControls {
            time_window_hours: Some(6),
            ..Default::default()
        };
        let since = resolve_since(&controls, 24, 168, now());
        assert_eq!(since, now() - Duration::hours(6));
    }

    #[test]
    fn test_explicit_since_clamped_to_max_window() {
        let ancient = now() - Duration::hours(10_000);
        let controls = RequestControls {
            since: Some(ancient),
            ..Default::default()
        };
        let since = resolve_since(&controls, 24, 168, now());
        assert_eq!(since, now() - Duration::hours(168));

        let recent = now() - Duration::hours(2);
        let controls = RequestControls {
            since: Some(recent),
            ..Default::default()
        };
        assert_eq!(resolve_since(&controls, 24, 168, now()), recent);
    }
}
