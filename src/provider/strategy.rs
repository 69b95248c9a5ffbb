//! Gateway strategy hooks that customize signed gateway calls.
//!
//! Implementations decorate outgoing gateway parameters and normalize error mapping
//! without tying flows to any particular HTTP client.

// self
use crate::{_prelude::*, provider::GatewayMethod};

/// Strategy hook that allows deployments to decorate requests and classify errors.
///
/// Implementors are required to be `Send + Sync`, and the hooks use crate-owned data types so
/// downstream crates never depend on reqwest-specific structures. Override only what you
/// need; `augment_request` has a default no-op implementation.
pub trait GatewayStrategy: Send + Sync {
	/// Maps a failed gateway call into the crate taxonomy.
	fn classify_gateway_error(&self, ctx: &GatewayErrorContext) -> GatewayErrorKind;

	/// Adds custom parameters (for example `app_auth_token`) before the request is signed.
	fn augment_request(&self, _method: GatewayMethod, _params: &mut BTreeMap<String, String>) {}
}

/// Canonical gateway error categories used by strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GatewayErrorKind {
	/// The auth code or token was rejected (invalid, used, or expired).
	InvalidGrant,
	/// Application identity or request signature was rejected.
	InvalidClient,
	/// The application or token lacks permission for the call.
	InsufficientScope,
	/// Failure is temporary and may succeed later.
	Transient,
	/// Business rejection without a dedicated category.
	Rejected,
}

/// Context passed to strategies when classifying gateway errors.
///
/// The struct keeps only primitive data (status, gateway codes, body preview) so strategies
/// stay decoupled from any HTTP client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayErrorContext {
	/// Method associated with the failing request.
	pub method: GatewayMethod,
	/// HTTP status code, when available.
	pub http_status: Option<u16>,
	/// Top-level gateway `code`.
	pub code: Option<String>,
	/// Detailed gateway `sub_code`.
	pub sub_code: Option<String>,
	/// Preview of the response body for non-JSON payloads.
	pub body_preview: Option<String>,
	/// Indicates whether the failure originated from the network/transport layer.
	pub network_error: bool,
}
impl GatewayErrorContext {
	const BODY_PREVIEW_LIMIT: usize = 256;

	/// Creates a new context scoped to the provided method.
	pub fn new(method: GatewayMethod) -> Self {
		Self {
			method,
			http_status: None,
			code: None,
			sub_code: None,
			body_preview: None,
			network_error: false,
		}
	}

	/// Convenience constructor for transport-level/network failures.
	pub fn network_failure(method: GatewayMethod) -> Self {
		let mut ctx = Self::new(method);

		ctx.network_error = true;

		ctx
	}

	/// Adds an HTTP status code.
	pub fn with_http_status(mut self, status: u16) -> Self {
		self.http_status = Some(status);

		self
	}

	/// Adds the top-level gateway code.
	pub fn with_code(mut self, code: impl Into<String>) -> Self {
		self.code = Some(code.into());

		self
	}

	/// Adds the detailed gateway sub code.
	pub fn with_sub_code(mut self, sub_code: impl Into<String>) -> Self {
		self.sub_code = Some(sub_code.into());

		self
	}

	/// Adds a body preview for responses that are not JSON.
	pub fn with_body_preview(mut self, body: impl Into<String>) -> Self {
		self.body_preview = Some(truncate_preview(body.into()));

		self
	}
}

/// Default strategy for the open-platform gateway.
///
/// It prioritizes `sub_code`, then the top-level `code`, and finally the HTTP status. Network
/// failures are always transient.
#[derive(Debug, Default)]
pub struct DefaultGatewayStrategy;
impl Display for DefaultGatewayStrategy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("default-gateway-strategy")
	}
}
impl GatewayStrategy for DefaultGatewayStrategy {
	fn classify_gateway_error(&self, ctx: &GatewayErrorContext) -> GatewayErrorKind {
		if ctx.network_error {
			return GatewayErrorKind::Transient;
		}

		if let Some(kind) = ctx.sub_code.as_deref().and_then(classify_sub_code) {
			return kind;
		}
		if let Some(kind) = ctx.code.as_deref().and_then(classify_code) {
			return kind;
		}

		classify_status(ctx.http_status)
	}
}

fn truncate_preview(body: String) -> String {
	if body.chars().count() <= GatewayErrorContext::BODY_PREVIEW_LIMIT {
		return body;
	}

	let mut buf: String = body.chars().take(GatewayErrorContext::BODY_PREVIEW_LIMIT).collect();

	buf.push('…');

	buf
}

fn classify_sub_code(sub_code: &str) -> Option<GatewayErrorKind> {
	let lowered = sub_code.to_ascii_lowercase();

	match lowered.as_str() {
		code if code.starts_with("isp.") => Some(GatewayErrorKind::Transient),
		code if code.starts_with("isv.code-")
			|| code.starts_with("isv.refresh-token-")
			|| code.contains("invalid-auth-token")
			|| code.contains("auth-token-time-out") =>
			Some(GatewayErrorKind::InvalidGrant),
		code if code.contains("invalid-app-id")
			|| code.contains("invalid-signature")
			|| code.contains("missing-signature")
			|| code.contains("app-unauthorized") =>
			Some(GatewayErrorKind::InvalidClient),
		code if code.starts_with("isv.insufficient-") || code.contains("permission") =>
			Some(GatewayErrorKind::InsufficientScope),
		_ => None,
	}
}

fn classify_code(code: &str) -> Option<GatewayErrorKind> {
	match code {
		"20000" => Some(GatewayErrorKind::Transient),
		"20001" => Some(GatewayErrorKind::InvalidGrant),
		"40006" => Some(GatewayErrorKind::InsufficientScope),
		"40001" | "40002" | "40004" => Some(GatewayErrorKind::Rejected),
		_ => None,
	}
}

fn classify_status(status: Option<u16>) -> GatewayErrorKind {
	match status {
		Some(429) => GatewayErrorKind::Transient,
		Some(code) if code >= 500 => GatewayErrorKind::Transient,
		Some(_) => GatewayErrorKind::Rejected,
		None => GatewayErrorKind::Transient,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn classify(ctx: GatewayErrorContext) -> GatewayErrorKind {
		DefaultGatewayStrategy.classify_gateway_error(&ctx)
	}

	#[test]
	fn sub_codes_take_precedence() {
		let ctx = GatewayErrorContext::new(GatewayMethod::OauthToken)
			.with_code("40002")
			.with_sub_code("isv.code-invalid");

		assert_eq!(classify(ctx), GatewayErrorKind::InvalidGrant);
		assert_eq!(
			classify(
				GatewayErrorContext::new(GatewayMethod::OauthToken)
					.with_code("40004")
					.with_sub_code("isv.refresh-token-time-out")
			),
			GatewayErrorKind::InvalidGrant
		);
		assert_eq!(
			classify(
				GatewayErrorContext::new(GatewayMethod::UserInfoShare)
					.with_code("40002")
					.with_sub_code("isv.invalid-signature")
			),
			GatewayErrorKind::InvalidClient
		);
		assert_eq!(
			classify(
				GatewayErrorContext::new(GatewayMethod::UserInfoShare)
					.with_code("20000")
					.with_sub_code("isp.unknow-error")
			),
			GatewayErrorKind::Transient
		);
	}

	#[test]
	fn codes_classify_without_sub_code() {
		let base = GatewayErrorContext::new(GatewayMethod::UserInfoShare);

		assert_eq!(classify(base.clone().with_code("20001")), GatewayErrorKind::InvalidGrant);
		assert_eq!(classify(base.clone().with_code("40006")), GatewayErrorKind::InsufficientScope);
		assert_eq!(classify(base.clone().with_code("40004")), GatewayErrorKind::Rejected);
		assert_eq!(classify(base.with_code("20000")), GatewayErrorKind::Transient);
	}

	#[test]
	fn status_and_network_fallbacks() {
		let base = GatewayErrorContext::new(GatewayMethod::OauthToken);

		assert_eq!(classify(base.clone().with_http_status(503)), GatewayErrorKind::Transient);
		assert_eq!(classify(base.clone().with_http_status(429)), GatewayErrorKind::Transient);
		assert_eq!(classify(base.with_http_status(404)), GatewayErrorKind::Rejected);
		assert_eq!(
			classify(GatewayErrorContext::network_failure(GatewayMethod::OauthToken)),
			GatewayErrorKind::Transient
		);
	}

	#[test]
	fn body_preview_is_truncated() {
		let ctx = GatewayErrorContext::new(GatewayMethod::OauthToken).with_body_preview("x".repeat(300));
		let preview = ctx.body_preview.expect("Preview should be recorded.");

		assert_eq!(preview.chars().count(), GatewayErrorContext::BODY_PREVIEW_LIMIT + 1);
		assert!(preview.ends_with('…'));
	}
}
