/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Current UTC date formatted as `YYYYMMDD` (for sequence numbers)
pub fn today_compact() -> String {
    chrono::Utc::now().format("%Y%m%d").to_string()
}
