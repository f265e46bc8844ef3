//! Base64url encoding of target URLs.
//!
//! One scheme in both directions: URL-safe alphabet, written without padding.
//! The decoder also accepts canonically padded input so links produced by a
//! padding encoder keep resolving.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::{DecodeError, Engine};

const TARGET_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encode a target URL into the path segment form the relay expects.
pub fn encode_target(url: &str) -> String {
    TARGET_ENGINE.encode(url.as_bytes())
}

/// Extract the encoded part of a request path.
///
/// Drops the leading `/` and everything from the first `.` onward, so
/// `/aHR0cDovL2EuYg.png` yields `aHR0cDovL2EuYg`.
pub fn encoded_segment(path: &str) -> &str {
    let path = path.strip_prefix('/').unwrap_or(path);
    match path.find('.') {
        Some(idx) => &path[..idx],
        None => path,
    }
}

/// Decode the encoded part of a request path into raw bytes.
pub fn decode_segment(path: &str) -> Result<Vec<u8>, DecodeError> {
    TARGET_ENGINE.decode(encoded_segment(path))
}
