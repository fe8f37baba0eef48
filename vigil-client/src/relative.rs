use crate::api::Time;

fn plural(n: i64, unit: &str) -> String {
    match n {
        1 => format!("1 {unit} ago"),
        n => format!("{n} {unit}s ago"),
    }
}

/// Short "how long ago" label, as shown next to a comment's author.
///
/// Months are 30 days and years 365 days, never reported as zero. Anything
/// not yet a minute old (including times in the future) is "Just now".
pub fn format_relative(at: Time, now: Time) -> String {
    let elapsed = now - at;
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();
    if minutes < 1 {
        String::from("Just now")
    } else if minutes < 60 {
        format!("{minutes}m ago")
    } else if hours < 24 {
        format!("{hours}h ago")
    } else if days < 7 {
        plural(days, "day")
    } else if days / 7 < 4 {
        plural(days / 7, "week")
    } else if days / 30 < 12 {
        plural((days / 30).max(1), "month")
    } else {
        plural((days / 365).max(1), "year")
    }
}
