use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use tokio::time::Instant;

/// First interval boundary strictly after `now`, starting from `candidate`.
///
/// Returns the boundary and the number of boundaries at or before `now` that
/// were stepped over. Fixed-rate: boundaries stay aligned to
/// `candidate + k * interval` no matter how late the caller is.
pub fn roll_forward(candidate: Instant, interval: Duration, now: Instant) -> (Instant, u32) {
    if candidate > now {
        return (candidate, 0);
    }
    let behind = now.duration_since(candidate).as_nanos();
    let steps = behind / interval.as_nanos().max(1) + 1;
    let steps = u32::try_from(steps).unwrap_or(u32::MAX);
    match interval.checked_mul(steps) {
        Some(offset) => (candidate + offset, steps),
        // Only reachable with absurd lag; fall back to one interval from now.
        None => (now + interval, steps),
    }
}

/// Project a monotonic deadline onto the wall clock.
pub fn wall_clock(deadline: Instant, now: Instant, wall_now: DateTime<Utc>) -> DateTime<Utc> {
    let delta = |d: Duration| chrono::Duration::from_std(d).unwrap_or(chrono::Duration::zero());
    if deadline >= now {
        wall_now + delta(deadline - now)
    } else {
        wall_now - delta(now - deadline)
    }
}

/// RFC 3339 rendering used in status output.
pub fn format_time(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Human-readable trigger label, e.g. `interval[1:00:00]` or
/// `interval[2 days, 0:00:00]`.
pub fn describe_interval(interval: Duration) -> String {
    let total = interval.as_secs();
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;
    let micros = interval.subsec_micros();

    let mut out = match days {
        0 => String::new(),
        1 => "1 day, ".to_string(),
        n => format!("{n} days, "),
    };
    out.push_str(&format!("{hours}:{minutes:02}:{seconds:02}"));
    if micros > 0 {
        out.push_str(&format!(".{micros:06}"));
    }
    format!("interval[{out}]")
}
