// self
use crate::_prelude::*;

/// Gateway methods the broker calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GatewayMethod {
	/// `alipay.system.oauth.token`: code exchange and refresh.
	#[serde(rename = "alipay.system.oauth.token")]
	OauthToken,
	/// `alipay.user.info.share`: profile lookup with an access token.
	#[serde(rename = "alipay.user.info.share")]
	UserInfoShare,
}
impl GatewayMethod {
	/// Wire name sent as `method`.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::OauthToken => "alipay.system.oauth.token",
			Self::UserInfoShare => "alipay.user.info.share",
		}
	}

	/// Envelope key holding a successful response node.
	pub fn response_key(self) -> &'static str {
		match self {
			Self::OauthToken => "alipay_system_oauth_token_response",
			Self::UserInfoShare => "alipay_user_info_share_response",
		}
	}
}
impl Display for GatewayMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// `grant_type` values accepted by [`GatewayMethod::OauthToken`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenGrantType {
	/// Exchange an `auth_code`.
	AuthorizationCode,
	/// Rotate with a `refresh_token`.
	RefreshToken,
}
impl TokenGrantType {
	/// Returns the wire identifier for the grant type.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::AuthorizationCode => "authorization_code",
			Self::RefreshToken => "refresh_token",
		}
	}
}
impl Display for TokenGrantType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
