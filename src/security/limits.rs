//! Response size limits.
//!
//! # Responsibilities
//! - Reject upstream responses whose declared `Content-Length` exceeds the ceiling
//! - Enforce the same ceiling while the body is being streamed
//!
//! # Design Decisions
//! - Declared-length violations return 413 before any body byte is written
//! - Streamed violations abort the copy; the status line is already gone by then

use axum::http::{header, HeaderMap};

/// Largest upstream body the relay will forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseLimit {
    max_bytes: u64,
}

impl ResponseLimit {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Whether `bytes` is over the ceiling. Exactly `max_bytes` is allowed.
    pub fn exceeded_by(&self, bytes: u64) -> bool {
        bytes > self.max_bytes
    }

    /// Check the upstream's declared length, if it declared one.
    ///
    /// Returns the offending length on violation.
    pub fn check_declared(&self, headers: &HeaderMap) -> Result<(), u64> {
        match declared_length(headers) {
            Some(len) if self.exceeded_by(len) => Err(len),
            _ => Ok(()),
        }
    }
}

/// Parse `Content-Length`, ignoring absent or malformed values.
pub fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Render a byte count for log lines, e.g. `50.0 MiB`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn with_length(len: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_str(len).unwrap());
        headers
    }

    #[test]
    fn ceiling_is_inclusive() {
        let limit = ResponseLimit::new(52_428_800);
        assert_eq!(limit.check_declared(&with_length("52428800")), Ok(()));
        assert_eq!(limit.check_declared(&with_length("52428801")), Err(52_428_801));
    }

    #[test]
    fn missing_or_garbage_length_passes() {
        let limit = ResponseLimit::new(10);
        assert_eq!(limit.check_declared(&HeaderMap::new()), Ok(()));
        assert_eq!(limit.check_declared(&with_length("lots")), Ok(()));
    }

    #[test]
    fn formats_sizes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1536), "1.5 KiB");
        assert_eq!(format_bytes(52_428_800), "50.0 MiB");
    }
}
