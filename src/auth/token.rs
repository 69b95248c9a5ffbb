//! Normalized token record produced by the gateway token endpoint.

// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::ResponseError,
	gateway::{GatewayNode, parse_seconds},
};

/// Access/refresh token pair issued by `alipay.system.oauth.token`.
///
/// The gateway reports lifetimes as relative seconds; `issued_at` anchors them so callers can
/// compute absolute expiries without storing anything else.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
	/// Access token secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Access token lifetime.
	#[serde(with = "seconds")]
	pub expires_in: Duration,
	/// Refresh token secret.
	pub refresh_token: TokenSecret,
	/// Refresh token lifetime.
	#[serde(with = "seconds")]
	pub re_expires_in: Duration,
	/// Legacy 2088-prefixed user identifier, when the application still receives it.
	pub user_id: Option<String>,
	/// Application-scoped user identifier.
	pub open_id: Option<String>,
	/// Authorization start time as reported by the gateway.
	pub auth_start: Option<String>,
	/// Instant the broker received the grant.
	pub issued_at: OffsetDateTime,
}
impl TokenGrant {
	/// Maps a successful token response node onto a grant issued at `issued_at`.
	pub fn from_node(node: &GatewayNode, issued_at: OffsetDateTime) -> Result<Self> {
		let raw: RawTokenNode = node.deserialize()?;
		let access_token =
			non_empty(raw.access_token).ok_or(ResponseError::MissingField { field: "access_token" })?;
		let refresh_token = non_empty(raw.refresh_token)
			.ok_or(ResponseError::MissingField { field: "refresh_token" })?;
		let expires_in = positive_seconds(raw.expires_in.as_ref(), "expires_in")?;
		let re_expires_in = positive_seconds(raw.re_expires_in.as_ref(), "re_expires_in")?;

		Ok(Self {
			access_token: TokenSecret::new(access_token),
			expires_in,
			refresh_token: TokenSecret::new(refresh_token),
			re_expires_in,
			user_id: non_empty(raw.user_id),
			open_id: non_empty(raw.open_id),
			auth_start: non_empty(raw.auth_start),
			issued_at,
		})
	}

	/// Absolute expiry of the access token.
	pub fn expires_at(&self) -> OffsetDateTime {
		self.issued_at.saturating_add(self.expires_in)
	}

	/// Absolute expiry of the refresh token.
	pub fn refresh_expires_at(&self) -> OffsetDateTime {
		self.issued_at.saturating_add(self.re_expires_in)
	}

	/// Returns `true` if the access token has expired at `instant`.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at()
	}

	/// Returns the identifier the gateway keyed this grant to, preferring `open_id`.
	pub fn subject(&self) -> Option<&str> {
		self.open_id.as_deref().or(self.user_id.as_deref())
	}
}
impl Debug for TokenGrant {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenGrant")
			.field("access_token", &"<redacted>")
			.field("expires_in", &self.expires_in)
			.field("refresh_token", &"<redacted>")
			.field("re_expires_in", &self.re_expires_in)
			.field("user_id", &self.user_id)
			.field("open_id", &self.open_id)
			.field("auth_start", &self.auth_start)
			.field("issued_at", &self.issued_at)
			.finish()
	}
}

#[derive(Deserialize)]
struct RawTokenNode {
	#[serde(default)]
	access_token: Option<String>,
	#[serde(default)]
	refresh_token: Option<String>,
	#[serde(default)]
	expires_in: Option<Value>,
	#[serde(default)]
	re_expires_in: Option<Value>,
	#[serde(default)]
	user_id: Option<String>,
	#[serde(default)]
	open_id: Option<String>,
	#[serde(default)]
	auth_start: Option<String>,
}

/// Upper bound on a token lifetime the gateway may report (ten years).
const MAX_LIFETIME_SECS: i64 = 10 * 365 * 24 * 60 * 60;

fn non_empty(value: Option<String>) -> Option<String> {
	value.filter(|v| !v.is_empty())
}

fn positive_seconds(value: Option<&Value>, field: &'static str) -> Result<Duration> {
	let secs = parse_seconds(value.ok_or(ResponseError::MissingField { field })?)
		.ok_or(ResponseError::InvalidSeconds { field })?;

	if secs <= 0 {
		return Err(ResponseError::NonPositiveSeconds { field }.into());
	}
	if secs > MAX_LIFETIME_SECS {
		return Err(ResponseError::InvalidSeconds { field }.into());
	}

	Ok(Duration::seconds(secs))
}

mod seconds {
	// crates.io
	use serde::{Deserializer, Serializer};
	// self
	use crate::_prelude::*;

	pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_i64(value.whole_seconds())
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
	where
		D: Deserializer<'de>,
	{
		i64::deserialize(deserializer).map(Duration::seconds)
	}
}
