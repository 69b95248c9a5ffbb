// self
use crate::{_prelude::*, provider::GatewayDescriptorError};

/// Constants the mobile SDK expects inside every authInfo string.
///
/// The defaults match the SDK's quick-login product; they are configurable only so staging
/// environments can point at differently provisioned products.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthInfoProfile {
	/// `apiname`.
	pub apiname: String,
	/// `methodname`.
	pub methodname: String,
	/// `app_name`.
	pub app_name: String,
	/// `biz_type`.
	pub biz_type: String,
	/// `product_id`.
	pub product_id: String,
	/// `scope`.
	pub scope: String,
	/// `auth_type`.
	pub auth_type: String,
}
impl AuthInfoProfile {
	pub(crate) fn validate(&self) -> Result<(), GatewayDescriptorError> {
		let fields = [
			("apiname", &self.apiname),
			("methodname", &self.methodname),
			("app_name", &self.app_name),
			("biz_type", &self.biz_type),
			("product_id", &self.product_id),
			("scope", &self.scope),
			("auth_type", &self.auth_type),
		];

		match fields.into_iter().find(|(_, value)| value.is_empty()) {
			Some((field, _)) => Err(GatewayDescriptorError::EmptyField { field }),
			None => Ok(()),
		}
	}
}
impl Default for AuthInfoProfile {
	fn default() -> Self {
		Self {
			apiname: "com.alipay.account.auth".into(),
			methodname: "alipay.open.auth.sdk.code.get".into(),
			app_name: "mc".into(),
			biz_type: "openservice".into(),
			product_id: "APP_FAST_LOGIN".into(),
			scope: "kuaijie".into(),
			auth_type: "AUTHACCOUNT".into(),
		}
	}
}
