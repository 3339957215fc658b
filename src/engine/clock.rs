use chrono::{DateTime, Duration, Utc};

/// The engine's only wall-clock seam. Step and timestamp resolution never
/// read the clock; it exists solely for relative display labels, so tests
/// can pin "now" and the pure pipeline stays byte-for-byte reproducible.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at construction time, for tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Coarse human label for how long ago something happened. Future
/// instants (clock skew between writer and reader) collapse to "just now".
pub fn relative_label(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now - then;

    if elapsed < Duration::minutes(1) {
        "just now".to_string()
    } else if elapsed < Duration::hours(1) {
        let minutes = elapsed.num_minutes();
        format!("{minutes} minute{} ago", plural(minutes))
    } else if elapsed < Duration::days(1) {
        let hours = elapsed.num_hours();
        format!("{hours} hour{} ago", plural(hours))
    } else if elapsed < Duration::days(30) {
        let days = elapsed.num_days();
        format!("{days} day{} ago", plural(days))
    } else {
        then.format("%b %-d, %Y").to_string()
    }
}

fn plural(n: i64) -> &'static str {
    if n == 1 { "" } else { "s" }
}
