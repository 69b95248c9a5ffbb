#![cfg(feature = "test")]

// self
use alipay_auth_broker::{
	_preludet::*,
	auth::IdentifierError,
	authinfo::{self, ClockTargetIds},
	error::{ConfigError, Error},
	provider::{
		AuthInfoProfile, DefaultGatewayStrategy, GatewayDescriptor, GatewayDescriptorError,
		GatewayErrorContext, GatewayErrorKind, GatewayMethod, GatewayStrategy,
	},
	sign::SignType,
};

fn url(value: &str) -> Url {
	Url::parse(value).expect("Failed to parse mock gateway URL.")
}

#[test]
fn descriptor_rejects_insecure_endpoints_and_bad_identifiers() {
	let err = GatewayDescriptor::builder(TEST_APP_ID)
		.gateway_endpoint(url("http://openapi.example.com/gateway.do"))
		.build()
		.expect_err("Descriptor builder should reject plain HTTP gateways.");

	assert!(matches!(err, GatewayDescriptorError::InsecureEndpoint { endpoint: "gateway", .. }));

	let err = GatewayDescriptor::builder(TEST_APP_ID)
		.authorize_endpoint(url("http://openauth.example.com/authorize"))
		.build()
		.expect_err("Descriptor builder should reject plain HTTP authorize pages.");

	assert!(matches!(err, GatewayDescriptorError::InsecureEndpoint { endpoint: "authorize", .. }));
	assert_eq!(
		GatewayDescriptor::builder("").build().expect_err("Empty app id should fail."),
		GatewayDescriptorError::MissingAppId
	);
	assert!(matches!(
		GatewayDescriptor::builder("2021 0051").build(),
		Err(GatewayDescriptorError::InvalidAppId(IdentifierError::ContainsWhitespace { .. }))
	));
}

#[test]
fn descriptor_rejects_empty_wire_fields() {
	let err = GatewayDescriptor::builder(TEST_APP_ID)
		.scope("")
		.build()
		.expect_err("Empty authorize scope should fail.");

	assert_eq!(err, GatewayDescriptorError::EmptyField { field: "scope" });

	let profile = AuthInfoProfile { product_id: String::new(), ..Default::default() };
	let err = GatewayDescriptor::builder(TEST_APP_ID)
		.profile(profile)
		.build()
		.expect_err("Empty profile constant should fail.");

	assert_eq!(err, GatewayDescriptorError::EmptyField { field: "product_id" });

	let wrapped: Error = ConfigError::from(err).into();

	assert!(!wrapped.is_client_error(), "Descriptor problems are server configuration errors.");
}

#[test]
fn descriptor_defaults_match_the_production_gateway() {
	let descriptor = test_descriptor();

	assert_eq!(descriptor.endpoints.gateway.as_str(), "https://openapi.alipay.com/gateway.do");
	assert_eq!(
		descriptor.endpoints.authorize.as_str(),
		"https://openauth.alipay.com/oauth2/publicAppAuthorize.htm"
	);
	assert_eq!(descriptor.scope, "auth_user");
	assert_eq!(descriptor.sign_type, SignType::Rsa2);
	assert_eq!(
		(descriptor.charset.as_str(), descriptor.format.as_str(), descriptor.version.as_str()),
		("utf-8", "JSON", "1.0")
	);
	assert_eq!(descriptor.profile, AuthInfoProfile::default());
}

#[test]
fn descriptor_loads_from_json_configuration() {
	let json = serde_json::to_string(&test_descriptor()).expect("Descriptor should serialize.");
	let loaded: GatewayDescriptor =
		serde_json::from_str(&json).expect("Serialized descriptor should load back.");

	assert_eq!(loaded, test_descriptor());

	let profile: AuthInfoProfile = serde_json::from_str(r#"{"app_name":"staging"}"#)
		.expect("Partial profile should fill in defaults.");

	assert_eq!(profile.app_name, "staging");
	assert_eq!(profile.apiname, "com.alipay.account.auth");
}

#[test]
fn profile_constants_flow_into_auth_info() {
	let descriptor = GatewayDescriptor::builder(TEST_APP_ID)
		.profile(AuthInfoProfile { app_name: "staging".into(), ..Default::default() })
		.build()
		.expect("Descriptor with custom profile should build.");
	let auth_info = authinfo::generate_auth_info(
		&descriptor,
		TEST_PID,
		Some("test_target_123"),
		true,
		&test_app_key(),
		&ClockTargetIds,
	)
	.expect("authInfo should generate.");

	assert!(auth_info.as_str().contains("&app_name=staging&"));
}

struct SandboxStrategy;
impl GatewayStrategy for SandboxStrategy {
	fn classify_gateway_error(&self, ctx: &GatewayErrorContext) -> GatewayErrorKind {
		match ctx.sub_code.as_deref() {
			Some("isv.app-not-online") => GatewayErrorKind::Transient,
			_ => DefaultGatewayStrategy.classify_gateway_error(ctx),
		}
	}

	fn augment_request(&self, method: GatewayMethod, params: &mut BTreeMap<String, String>) {
		if method == GatewayMethod::UserInfoShare {
			params.insert("app_auth_token".into(), "sandbox-token".into());
		}
	}
}

#[test]
fn custom_strategies_override_selected_codes() {
	let strategy: Arc<dyn GatewayStrategy> = Arc::new(SandboxStrategy);
	let ctx = GatewayErrorContext::new(GatewayMethod::OauthToken)
		.with_code("40004")
		.with_sub_code("isv.app-not-online");

	assert_eq!(strategy.classify_gateway_error(&ctx), GatewayErrorKind::Transient);
	assert_eq!(
		strategy.classify_gateway_error(
			&GatewayErrorContext::new(GatewayMethod::OauthToken).with_sub_code("isv.code-invalid")
		),
		GatewayErrorKind::InvalidGrant
	);

	let mut params = BTreeMap::new();

	strategy.augment_request(GatewayMethod::OauthToken, &mut params);

	assert!(params.is_empty());

	strategy.augment_request(GatewayMethod::UserInfoShare, &mut params);

	assert_eq!(params.get("app_auth_token").map(String::as_str), Some("sandbox-token"));
}
