//! Signed open-platform gateway protocol.
//!
//! Every call posts the common parameters (`app_id`, `method`, `format`, `charset`,
//! `sign_type`, `timestamp`, `version`) plus call-specific fields as a form. The signing
//! content is the same sorted, unescaped canonical string the authInfo core uses, over all
//! non-empty parameters except `sign`. [`GatewayRequest`] builds and signs the form;
//! [`map_gateway_failure`] and [`TransportErrorMapper`] turn failures into [`Error`] values.

pub mod response;

pub use response::*;

// crates.io
use time::macros::{format_description, offset};
// self
use crate::{
	_prelude::*,
	authinfo::canonical_string,
	error::{ConfigError, TransientError},
	http::ResponseMetadata,
	provider::{
		GatewayDescriptor, GatewayErrorContext, GatewayErrorKind, GatewayMethod, GatewayStrategy,
	},
	sign::{self, AppPrivateKey, ProviderPublicKey, SignType},
};
#[cfg(feature = "reqwest")] use crate::error::TransportError;

/// Form parameters for one gateway call, before and after signing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayRequest {
	/// Method being called.
	pub method: GatewayMethod,
	/// All form fields keyed by name.
	pub params: BTreeMap<String, String>,
}
impl GatewayRequest {
	/// Seeds the common parameters for `method` stamped at `timestamp`.
	pub fn new(
		descriptor: &GatewayDescriptor,
		method: GatewayMethod,
		timestamp: OffsetDateTime,
	) -> Result<Self> {
		let mut params = BTreeMap::new();

		params.insert("app_id".into(), descriptor.app_id.to_string());
		params.insert("method".into(), method.as_str().into());
		params.insert("format".into(), descriptor.format.clone());
		params.insert("charset".into(), descriptor.charset.clone());
		params.insert("sign_type".into(), descriptor.sign_type.as_str().into());
		params.insert("timestamp".into(), format_timestamp(timestamp)?);
		params.insert("version".into(), descriptor.version.clone());

		Ok(Self { method, params })
	}

	/// Adds or replaces a call parameter.
	pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.params.insert(key.into(), value.into());

		self
	}

	/// Canonical string the gateway verifies: non-empty parameters except `sign`.
	pub fn signing_content(&self) -> String {
		canonical_string(
			self.params
				.iter()
				.filter(|(k, v)| k.as_str() != "sign" && !v.is_empty())
				.map(|(k, v)| (k.as_str(), v.as_str())),
		)
	}

	/// Signs the request and returns the finished form.
	pub fn sign(
		mut self,
		key: &AppPrivateKey,
		sign_type: SignType,
	) -> Result<Vec<(String, String)>> {
		let signature = sign::sign(&self.signing_content(), key, sign_type)?;

		self.params.insert("sign".into(), sign::base64_signature(&signature));

		Ok(self.params.into_iter().collect())
	}
}

/// Formats `instant` the way the gateway expects: `yyyy-MM-dd HH:mm:ss` in UTC+8.
pub fn format_timestamp(instant: OffsetDateTime) -> Result<String, ConfigError> {
	Ok(instant
		.to_offset(offset!(+8))
		.format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))?)
}

/// Verifies an envelope signature.
///
/// Success nodes must be signed; error nodes are checked only when the gateway signed them,
/// since gateway-level rejections are often unsigned.
pub fn verify_envelope(
	envelope: &GatewayEnvelope,
	key: &ProviderPublicKey,
	sign_type: SignType,
) -> Result<()> {
	match envelope.sign.as_deref() {
		Some(signature) if sign::verify(&envelope.signed_content, signature, key, sign_type) =>
			Ok(()),
		None if envelope.is_error_response() => Ok(()),
		_ => Err(Error::ResponseSignature),
	}
}

/// Maps a failed node into the crate taxonomy using `strategy`.
pub fn map_gateway_failure(
	strategy: &dyn GatewayStrategy,
	method: GatewayMethod,
	failure: GatewayFailure,
	meta: Option<&ResponseMetadata>,
) -> Error {
	let mut ctx = GatewayErrorContext::new(method).with_code(failure.code.clone());

	if let Some(sub_code) = failure.sub_code.as_deref() {
		ctx = ctx.with_sub_code(sub_code);
	}
	if let Some(status) = meta_status(meta) {
		ctx = ctx.with_http_status(status);
	}

	match strategy.classify_gateway_error(&ctx) {
		GatewayErrorKind::InvalidGrant => Error::InvalidGrant { reason: failure.reason() },
		GatewayErrorKind::InvalidClient => Error::InvalidClient { reason: failure.reason() },
		GatewayErrorKind::InsufficientScope =>
			Error::InsufficientScope { reason: failure.reason() },
		GatewayErrorKind::Transient => TransientError::Gateway {
			message: failure.reason(),
			status: meta_status(meta),
			retry_after: meta_retry_after(meta),
		}
		.into(),
		GatewayErrorKind::Rejected => Error::Gateway {
			code: failure.code,
			msg: failure.msg,
			sub_code: failure.sub_code,
			sub_msg: failure.sub_msg,
		},
	}
}

/// Maps a non-2xx HTTP answer whose body carried no usable node.
pub fn map_http_status(
	strategy: &dyn GatewayStrategy,
	method: GatewayMethod,
	meta: &ResponseMetadata,
	body: &[u8],
) -> Error {
	let mut ctx =
		GatewayErrorContext::new(method).with_body_preview(String::from_utf8_lossy(body));

	if let Some(status) = meta.status {
		ctx = ctx.with_http_status(status);
	}

	let message = format!("{method} answered with HTTP {}", meta.status.unwrap_or_default());

	match strategy.classify_gateway_error(&ctx) {
		GatewayErrorKind::Transient => TransientError::Gateway {
			message,
			status: meta.status,
			retry_after: meta.retry_after,
		}
		.into(),
		GatewayErrorKind::InvalidClient => Error::InvalidClient { reason: message },
		GatewayErrorKind::InvalidGrant => Error::InvalidGrant { reason: message },
		GatewayErrorKind::InsufficientScope => Error::InsufficientScope { reason: message },
		GatewayErrorKind::Rejected => Error::Gateway {
			code: meta.status.map(|s| s.to_string()).unwrap_or_default(),
			msg: message,
			sub_code: None,
			sub_msg: ctx.body_preview,
		},
	}
}

/// Maps HTTP transport failures into crate [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an error emitted by the transport into a crate error.
	fn map_transport_error(
		&self,
		strategy: &dyn GatewayStrategy,
		method: GatewayMethod,
		metadata: Option<&ResponseMetadata>,
		error: E,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		_strategy: &dyn GatewayStrategy,
		method: GatewayMethod,
		meta: Option<&ResponseMetadata>,
		err: ReqwestError,
	) -> Error {
		if err.is_builder() {
			return ConfigError::from(err).into();
		}

		// Headers already arrived when the slot holds a status; only the body failed.
		let status = meta_status(meta).or_else(|| err.status().map(|code| code.as_u16()));

		match status {
			Some(status) if err.is_timeout() || err.is_body() || err.is_decode() =>
				TransientError::Gateway {
					message: format!("{method} failed while reading the response body: {err}"),
					status: Some(status),
					retry_after: meta_retry_after(meta),
				}
				.into(),
			None if err.is_timeout() => TransientError::Timeout.into(),
			_ => TransportError::from(err).into(),
		}
	}
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

fn meta_retry_after(meta: Option<&ResponseMetadata>) -> Option<Duration> {
	meta.and_then(|value| value.retry_after)
}
