//! Crate-level error types shared by the authInfo core, gateway calls, and flows.

// self
use crate::{_prelude::*, auth::IdentifierError, provider::GatewayDescriptorError};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
///
/// Every failure class keeps its own variant so boundary layers can map them to transport
/// responses; see [`Error::is_client_error`].
#[derive(Debug, ThisError)]
pub enum Error {
	/// Missing or invalid configuration or caller input.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Private or public key material could not be parsed.
	#[error(transparent)]
	InvalidKey(#[from] KeyError),
	/// The RSA signing operation failed.
	#[error(transparent)]
	Signing(#[from] SigningError),
	/// Percent-encoded input could not be decoded.
	#[error(transparent)]
	Encoding(#[from] EncodingError),
	/// Gateway answered successfully but the payload violates the expected shape.
	#[error(transparent)]
	Response(#[from] ResponseError),
	/// Temporary upstream failure; callers may retry with backoff.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Provider rejected the grant (bad or used auth code, expired refresh token).
	#[error("Gateway rejected the grant: {reason}.")]
	InvalidGrant {
		/// Provider-supplied reason string.
		reason: String,
	},
	/// Application identity or request signature was rejected.
	#[error("Gateway rejected the client: {reason}.")]
	InvalidClient {
		/// Provider-supplied reason string.
		reason: String,
	},
	/// The token or application lacks the permission for the requested call.
	#[error("Insufficient permissions: {reason}.")]
	InsufficientScope {
		/// Provider-supplied reason string.
		reason: String,
	},
	/// Gateway returned a business error that has no dedicated variant.
	#[error("Gateway returned error {code}: {msg}.")]
	Gateway {
		/// Top-level gateway code (for example `40004`).
		code: String,
		/// Top-level gateway message.
		msg: String,
		/// Detailed provider code (for example `isv.code-invalid`).
		sub_code: Option<String>,
		/// Detailed provider message.
		sub_msg: Option<String>,
	},
	/// The gateway response signature did not verify under the provider public key.
	#[error("Gateway response signature verification failed.")]
	ResponseSignature,
	/// The per-key request limiter denied the call.
	#[error("Too many requests; retry in {retry_after}.")]
	RateLimited {
		/// Time until the oldest counted request leaves the window.
		retry_after: Duration,
	},
}
impl Error {
	/// Returns `true` when the failure was caused by the caller's input rather than by the
	/// server, its keys, or the upstream gateway.
	pub fn is_client_error(&self) -> bool {
		match self {
			Self::Config(err) => err.is_caller_input(),
			Self::Encoding(_) | Self::RateLimited { .. } | Self::InvalidGrant { .. } => true,
			_ => false,
		}
	}

	/// Returns `true` when retrying the same call later may succeed.
	pub fn is_retryable(&self) -> bool {
		matches!(self, Self::Transient(_) | Self::Transport(_) | Self::RateLimited { .. })
	}
}

/// Configuration and input validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// The caller did not provide a merchant partner identifier.
	#[error("The pid parameter is required.")]
	MissingPid,
	/// A caller-supplied identifier failed validation.
	#[error(transparent)]
	InvalidIdentifier(#[from] IdentifierError),
	/// A parameter would be serialized with an empty value.
	#[error("Parameter `{key}` must not be empty.")]
	EmptyParameter {
		/// Parameter name.
		key: &'static str,
	},
	/// A required parameter is absent from the map.
	#[error("Parameter `{key}` is missing.")]
	MissingParameter {
		/// Parameter name.
		key: &'static str,
	},
	/// Gateway descriptor validation failed (including a missing application identifier).
	#[error(transparent)]
	Descriptor(#[from] GatewayDescriptorError),
	/// The clock reading could not be rendered as a gateway timestamp.
	#[error("Gateway timestamp could not be formatted.")]
	Timestamp(#[from] time::error::Format),
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}

	fn is_caller_input(&self) -> bool {
		matches!(self, Self::MissingPid | Self::InvalidIdentifier(_))
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Key material parsing failures.
#[derive(Debug, ThisError)]
pub enum KeyError {
	/// Key material is empty or whitespace.
	#[error("Key material is empty.")]
	Empty,
	/// The key body is not valid base64.
	#[error("Key material is not valid base64.")]
	Base64(#[from] base64::DecodeError),
	/// The PEM document carries a label this crate does not understand.
	#[error("Unsupported PEM label `{label}`.")]
	UnsupportedLabel {
		/// Label found after `-----BEGIN `.
		label: String,
	},
	/// The private key is neither valid PKCS#1 nor PKCS#8.
	#[error("Private key is not a valid RSA key.")]
	Pkcs1(#[from] rsa::pkcs1::Error),
	/// The PKCS#8 document could not be parsed.
	#[error("Private key is not a valid PKCS#8 RSA key.")]
	Pkcs8(#[from] rsa::pkcs8::Error),
	/// The public key is not a valid SubjectPublicKeyInfo document.
	#[error("Public key is not a valid RSA public key.")]
	PublicKey(#[from] rsa::pkcs8::spki::Error),
}

/// Cryptographic failure raised while signing or verifying.
#[derive(Debug, ThisError)]
#[error("RSA operation failed.")]
pub struct SigningError(#[from] pub rsa::Error);

/// Percent-encoding failures.
#[derive(Debug, ThisError)]
pub enum EncodingError {
	/// A percent-decoded value is not valid UTF-8.
	#[error("Value for `{key}` does not decode to UTF-8.")]
	InvalidUtf8 {
		/// Parameter name whose value failed to decode.
		key: String,
		/// Underlying UTF-8 failure.
		#[source]
		source: std::str::Utf8Error,
	},
	/// A segment lacks the `=` separator.
	#[error("Segment `{segment}` is not a key=value pair.")]
	MalformedSegment {
		/// Offending segment.
		segment: String,
	},
}

/// Gateway payloads that parsed but do not carry what the call requires.
#[derive(Debug, ThisError)]
pub enum ResponseError {
	/// The envelope does not contain the expected response node.
	#[error("Gateway response does not contain `{key}`.")]
	MissingNode {
		/// Expected node name.
		key: String,
	},
	/// A required field is absent or empty.
	#[error("Gateway response is missing `{field}`.")]
	MissingField {
		/// Field name.
		field: &'static str,
	},
	/// A duration field is not an integer number of seconds.
	#[error("Gateway field `{field}` is not a valid number of seconds.")]
	InvalidSeconds {
		/// Field name.
		field: &'static str,
	},
	/// A duration field is zero or negative.
	#[error("Gateway field `{field}` must be positive.")]
	NonPositiveSeconds {
		/// Field name.
		field: &'static str,
	},
	/// The response node could not be mapped onto the typed record.
	#[error("Gateway response node has an unexpected shape.")]
	Shape(#[source] serde_path_to_error::Error<serde_json::Error>),
}

/// Temporary failure variants (safe to retry).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// The request exceeded the configured timeout.
	#[error("Request timed out while calling the gateway.")]
	Timeout,
	/// Gateway returned an unexpected but non-fatal response.
	#[error("Gateway returned an unexpected response: {message}.")]
	Gateway {
		/// Summary of the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Gateway responded with malformed JSON.
	#[error("Gateway returned malformed JSON.")]
	ResponseParse {
		/// JSON parsing failure.
		#[source]
		source: serde_json::Error,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the gateway.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the gateway.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn caller_mistakes_are_client_errors() {
		assert!(Error::from(ConfigError::MissingPid).is_client_error());
		assert!(Error::RateLimited { retry_after: Duration::seconds(3) }.is_client_error());
		assert!(
			!Error::from(ConfigError::from(GatewayDescriptorError::MissingAppId)).is_client_error()
		);
		assert!(!Error::from(KeyError::Empty).is_client_error());
		assert!(!Error::ResponseSignature.is_client_error());
	}

	#[test]
	fn only_transient_failures_are_retryable() {
		assert!(Error::from(TransientError::Timeout).is_retryable());
		assert!(!Error::InvalidGrant { reason: "used".into() }.is_retryable());
		assert!(!Error::from(ConfigError::MissingPid).is_retryable());
	}
}
