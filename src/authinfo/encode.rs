//! RFC 3986 percent-encoding for query values.

// std
use std::borrow::Cow;
// crates.io
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
// self
use crate::error::EncodingError;

/// Everything except the RFC 3986 unreserved set (`ALPHA / DIGIT / - . _ ~`).
///
/// Spaces become `%20` and `+` becomes `%2B`; there is no form-style `+` for space.
pub const QUERY_VALUE: &AsciiSet =
	&NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Percent-encodes a query value.
pub fn encode_value(value: &str) -> String {
	utf8_percent_encode(value, QUERY_VALUE).to_string()
}

/// Reverses [`encode_value`]. `key` is only used to label failures.
pub fn decode_value(key: &str, value: &str) -> Result<String, EncodingError> {
	percent_decode_str(value)
		.decode_utf8()
		.map(Cow::into_owned)
		.map_err(|source| EncodingError::InvalidUtf8 { key: key.to_owned(), source })
}
