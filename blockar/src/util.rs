use std::time::SystemTime;

/// Format a timestamp as RFC 3339, or `-` for the epoch (no time recorded)
pub fn format_time(time: SystemTime) -> String {
    if time == SystemTime::UNIX_EPOCH {
        return "-".into();
    }
    let datetime: chrono::DateTime<chrono::Utc> = time.into();
    datetime.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

/// Format file size in human-readable form
pub fn format_size(bytes: u64) -> String {
    use humansize::{format_size, BINARY};
    format_size(bytes, BINARY)
}
