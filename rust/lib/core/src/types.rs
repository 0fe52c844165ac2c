/// Generate a new random ID (UUIDv4, no dashes).
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string().replace('-', "")
}

/// Get the current time as an RFC 3339 string.
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Milliseconds since the Unix epoch. Embedded in document references.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
