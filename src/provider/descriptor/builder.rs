// self
use crate::{
	_prelude::*,
	auth::{AppId, IdentifierError},
	provider::{
		AuthInfoProfile, DEFAULT_AUTHORIZE_SCOPE, DEFAULT_AUTHORIZE_URL, DEFAULT_GATEWAY_URL,
		GatewayDescriptor, GatewayEndpoints,
	},
	sign::SignType,
};

/// Errors raised while constructing or validating descriptors.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum GatewayDescriptorError {
	/// The application identifier is empty.
	#[error("The application identifier is not configured.")]
	MissingAppId,
	/// The application identifier failed validation.
	#[error(transparent)]
	InvalidAppId(#[from] IdentifierError),
	/// A built-in endpoint constant failed to parse.
	#[error("The {endpoint} endpoint is not a valid URL.")]
	InvalidEndpoint {
		/// Which endpoint failed to parse.
		endpoint: &'static str,
		/// Parser failure.
		#[source]
		source: url::ParseError,
	},
	/// Endpoints must use HTTPS.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// A field that ends up on the wire is empty.
	#[error("Descriptor field `{field}` must not be empty.")]
	EmptyField {
		/// Field name.
		field: &'static str,
	},
}

/// Builder for [`GatewayDescriptor`] values.
#[derive(Debug)]
pub struct GatewayDescriptorBuilder {
	/// Raw application identifier, validated on build.
	pub app_id: String,
	/// Optional gateway override (defaults to production).
	pub gateway_endpoint: Option<Url>,
	/// Optional authorization page override (defaults to production).
	pub authorize_endpoint: Option<Url>,
	/// Scope requested on the authorization page.
	pub scope: String,
	/// Digest used for gateway calls.
	pub sign_type: SignType,
	/// authInfo constants.
	pub profile: AuthInfoProfile,
}
impl GatewayDescriptorBuilder {
	/// Creates a new builder seeded with the provided application identifier.
	pub fn new(app_id: impl Into<String>) -> Self {
		Self {
			app_id: app_id.into(),
			gateway_endpoint: None,
			authorize_endpoint: None,
			scope: DEFAULT_AUTHORIZE_SCOPE.into(),
			sign_type: SignType::default(),
			profile: AuthInfoProfile::default(),
		}
	}

	/// Overrides the gateway endpoint.
	pub fn gateway_endpoint(mut self, url: Url) -> Self {
		self.gateway_endpoint = Some(url);

		self
	}

	/// Overrides the authorization page.
	pub fn authorize_endpoint(mut self, url: Url) -> Self {
		self.authorize_endpoint = Some(url);

		self
	}

	/// Overrides the authorization scope.
	pub fn scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = scope.into();

		self
	}

	/// Overrides the gateway digest.
	pub fn sign_type(mut self, sign_type: SignType) -> Self {
		self.sign_type = sign_type;

		self
	}

	/// Overrides the authInfo constants.
	pub fn profile(mut self, profile: AuthInfoProfile) -> Self {
		self.profile = profile;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<GatewayDescriptor, GatewayDescriptorError> {
		if self.app_id.is_empty() {
			return Err(GatewayDescriptorError::MissingAppId);
		}

		let app_id = AppId::new(&self.app_id)?;
		let gateway = match self.gateway_endpoint {
			Some(url) => url,
			None => parse_default("gateway", DEFAULT_GATEWAY_URL)?,
		};
		let authorize = match self.authorize_endpoint {
			Some(url) => url,
			None => parse_default("authorize", DEFAULT_AUTHORIZE_URL)?,
		};
		let descriptor = GatewayDescriptor {
			app_id,
			endpoints: GatewayEndpoints { gateway, authorize },
			scope: self.scope,
			sign_type: self.sign_type,
			charset: "utf-8".into(),
			format: "JSON".into(),
			version: "1.0".into(),
			profile: self.profile,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl GatewayDescriptor {
	/// Validates invariants for the descriptor.
	fn validate(&self) -> Result<(), GatewayDescriptorError> {
		validate_endpoint("gateway", &self.endpoints.gateway)?;
		validate_endpoint("authorize", &self.endpoints.authorize)?;

		if self.scope.is_empty() {
			return Err(GatewayDescriptorError::EmptyField { field: "scope" });
		}

		self.profile.validate()
	}
}

fn parse_default(endpoint: &'static str, raw: &str) -> Result<Url, GatewayDescriptorError> {
	Url::parse(raw).map_err(|source| GatewayDescriptorError::InvalidEndpoint { endpoint, source })
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), GatewayDescriptorError> {
	if url.scheme() != "https" {
		Err(GatewayDescriptorError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	} else {
		Ok(())
	}
}
