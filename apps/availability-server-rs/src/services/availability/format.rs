/// Renders a minute count as `"{h}h {m}m"`, or `"{m}m"` under an hour.
pub fn humanize(minutes: f64) -> String {
    let total = if minutes.is_finite() && minutes > 0.0 {
        minutes.round() as i64
    } else {
        0
    };
    let hours = total / 60;
    let mins = total % 60;
    if hours > 0 {
        format!("{hours}h {mins}m")
    } else {
        format!("{mins}m")
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
