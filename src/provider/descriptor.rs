//! Gateway descriptor data structures shared by the authInfo core and gateway flows.
//!
//! Descriptors are plain data validated once by [`GatewayDescriptorBuilder::build`] and then
//! passed by reference; nothing in the signing path reads ambient configuration.

/// Builder API for assembling gateway descriptors.
pub mod builder;
/// Gateway method names and grant types.
pub mod method;
/// Fixed authInfo constants.
pub mod profile;

pub use builder::*;
pub use method::*;
pub use profile::*;

// self
use crate::{_prelude::*, auth::AppId, sign::SignType};

/// Production open-platform gateway.
pub const DEFAULT_GATEWAY_URL: &str = "https://openapi.alipay.com/gateway.do";
/// Production web authorization page.
pub const DEFAULT_AUTHORIZE_URL: &str = "https://openauth.alipay.com/oauth2/publicAppAuthorize.htm";
/// Scope requested by the web authorization page.
pub const DEFAULT_AUTHORIZE_SCOPE: &str = "auth_user";

/// Endpoint set declared by a gateway descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayEndpoints {
	/// Signed RPC gateway used for token and user-info calls.
	pub gateway: Url,
	/// Browser authorization page used to obtain `auth_code`.
	pub authorize: Url,
}

/// Immutable gateway descriptor consumed by the authInfo core and flows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayDescriptor {
	/// Application identifier issued by the open platform.
	pub app_id: AppId,
	/// Endpoint definitions.
	pub endpoints: GatewayEndpoints,
	/// Scope requested on the authorization page.
	pub scope: String,
	/// Digest used to sign gateway requests and verify responses.
	pub sign_type: SignType,
	/// `charset` common parameter.
	pub charset: String,
	/// `format` common parameter.
	pub format: String,
	/// `version` common parameter.
	pub version: String,
	/// Constants embedded in every authInfo string.
	pub profile: AuthInfoProfile,
}
impl GatewayDescriptor {
	/// Creates a new builder for the provided application identifier.
	pub fn builder(app_id: impl Into<String>) -> GatewayDescriptorBuilder {
		GatewayDescriptorBuilder::new(app_id)
	}
}
