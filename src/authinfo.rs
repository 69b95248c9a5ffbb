//! authInfo assembly: parameter map, signature, wire string.
//!
//! The final string is the transmission form followed by `&sign=<percent-encoded base64>`,
//! twelve `key=value` segments in total. [`AuthInfoRequest`] and [`AuthInfoResponse`] carry
//! the HTTP-facing contract so any server framework can bind them with serde.

pub mod encode;
pub mod params;

pub use encode::*;
pub use params::*;

// self
use crate::{
	_prelude::*,
	error::EncodingError,
	provider::GatewayDescriptor,
	sign::{self, AppPrivateKey, SignType},
};

/// Echoed as `target_id` when the caller let the broker generate one.
pub const AUTO_GENERATED_TARGET_ID: &str = "auto_generated";

/// Signed authInfo string ready for the native SDK.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthInfo(String);
impl AuthInfo {
	/// Borrows the wire string.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Percent-encoded base64 signature carried in the trailing `sign` segment.
	pub fn encoded_signature(&self) -> Option<&str> {
		self.0.rsplit_once("&sign=").map(|(_, sig)| sig)
	}

	/// Decodes all twelve segments, signature included.
	pub fn parameters(&self) -> Result<Vec<(String, String)>, EncodingError> {
		parse_transmission_form(&self.0)
	}
}
impl AsRef<str> for AuthInfo {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl From<AuthInfo> for String {
	fn from(value: AuthInfo) -> Self {
		value.0
	}
}
impl Debug for AuthInfo {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("AuthInfo").field(&self.0).finish()
	}
}
impl Display for AuthInfo {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Signs a validated map and appends the signature to its transmission form.
pub fn assemble(map: &ParameterMap, key: &AppPrivateKey, sign_type: SignType) -> Result<AuthInfo> {
	map.validate()?;

	let signature = sign::sign(&serialize_for_signing(map), key, sign_type)?;

	Ok(AuthInfo(format!(
		"{}&sign={}",
		serialize_for_transmission(map),
		sign::encode_signature(&signature)
	)))
}

/// Builds, signs, and serializes the authInfo for `pid`.
///
/// Configuration, key, and signing failures propagate as their own [`Error`] variants.
pub fn generate_auth_info(
	descriptor: &GatewayDescriptor,
	pid: &str,
	target_id: Option<&str>,
	use_sha256: bool,
	key: &AppPrivateKey,
	target_ids: &dyn TargetIdSource,
) -> Result<AuthInfo> {
	let sign_type = SignType::from_use_sha256(use_sha256);
	let map = build_parameter_map(descriptor, pid, target_id, sign_type, target_ids)?;

	assemble(&map, key, sign_type)
}

fn default_rsa2() -> bool {
	true
}

/// Inbound authInfo request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthInfoRequest {
	/// Merchant partner identifier; an absent value is reported as a missing pid.
	#[serde(default)]
	pub pid: String,
	/// Caller-chosen correlation id.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub target_id: Option<String>,
	/// Selects `RSA2` (SHA-256) when `true`, `RSA` (SHA-1) otherwise.
	#[serde(default = "default_rsa2")]
	pub rsa2: bool,
}
impl AuthInfoRequest {
	/// Request for `pid` with a generated target id and RSA2.
	pub fn new(pid: impl Into<String>) -> Self {
		Self { pid: pid.into(), target_id: None, rsa2: true }
	}

	/// Sets the correlation id.
	pub fn with_target_id(mut self, target_id: impl Into<String>) -> Self {
		self.target_id = Some(target_id.into());

		self
	}

	/// Selects the digest.
	pub fn with_rsa2(mut self, rsa2: bool) -> Self {
		self.rsa2 = rsa2;

		self
	}

	/// Produces the signed response for this request.
	pub fn respond(
		&self,
		descriptor: &GatewayDescriptor,
		key: &AppPrivateKey,
		target_ids: &dyn TargetIdSource,
	) -> Result<AuthInfoResponse> {
		let auth_info = generate_auth_info(
			descriptor,
			&self.pid,
			self.target_id.as_deref(),
			self.rsa2,
			key,
			target_ids,
		)?;

		Ok(AuthInfoResponse {
			auth_info,
			pid: self.pid.clone(),
			target_id: self
				.target_id
				.clone()
				.unwrap_or_else(|| AUTO_GENERATED_TARGET_ID.to_owned()),
			sign_type: SignType::from_use_sha256(self.rsa2),
		})
	}
}

/// Outbound authInfo response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthInfoResponse {
	/// Signed authInfo string.
	pub auth_info: AuthInfo,
	/// Echoed partner id.
	pub pid: String,
	/// Echoed target id, or [`AUTO_GENERATED_TARGET_ID`].
	pub target_id: String,
	/// Digest label used for the signature.
	pub sign_type: SignType,
}

#[cfg(test)]
mod tests {
	// crates.io
	use base64::{Engine as _, engine::general_purpose::STANDARD};
	// self
	use super::*;
	use crate::{_preludet::*, error::ConfigError};

	fn fixture_auth_info(use_sha256: bool) -> AuthInfo {
		generate_auth_info(
			&test_descriptor(),
			TEST_PID,
			Some("test_target_123"),
			use_sha256,
			&test_app_key(),
			&ClockTargetIds,
		)
		.expect("Fixture authInfo should generate.")
	}

	#[test]
	fn output_has_eleven_parameters_and_one_signature() {
		let auth_info = fixture_auth_info(true);
		let segments: Vec<&str> = auth_info.as_str().split('&').collect();

		assert_eq!(segments.len(), 12);
		assert!(segments.iter().all(|segment| segment.contains('=') && !segment.is_empty()));
		assert_eq!(segments.iter().filter(|segment| segment.starts_with("sign=")).count(), 1);

		for key in AUTH_INFO_KEYS {
			assert!(
				segments.iter().any(|segment| segment.starts_with(&format!("{key}="))),
				"Missing `{key}`."
			);
		}

		assert!(segments[0].starts_with("app_id="));
		assert!(segments[10].starts_with("sign_type="));
		assert!(segments[11].starts_with("sign="));
		assert!(!auth_info.as_str().ends_with('&'));
	}

	#[test]
	fn fixture_example_verifies_under_public_key() {
		let auth_info = fixture_auth_info(true);

		assert!(auth_info.as_str().contains("target_id=test_target_123"));
		assert!(auth_info.as_str().contains("sign_type=RSA2"));

		let params = auth_info.parameters().expect("authInfo should decode.");
		let (_, signature) =
			params.iter().find(|(k, _)| k == "sign").expect("Signature segment should exist.");
		let signing_form =
			params.iter().filter(|(k, _)| k != "sign").map(|(k, v)| (k.as_str(), v.as_str()));

		assert!(STANDARD.decode(signature).is_ok());
		assert!(sign::verify(
			&canonical_string(signing_form),
			signature,
			&test_public_key(),
			SignType::Rsa2
		));
		assert_eq!(signature, TEST_KAT_RSA2.trim());
	}

	#[test]
	fn digest_flag_selects_sign_type_and_signature() {
		let rsa2 = fixture_auth_info(true);
		let rsa = fixture_auth_info(false);

		assert!(rsa.as_str().contains("sign_type=RSA&"));
		assert_ne!(rsa2.encoded_signature(), rsa.encoded_signature());
		assert_eq!(
			rsa.encoded_signature().map(ToOwned::to_owned),
			Some(encode_value(TEST_KAT_RSA.trim()))
		);
	}

	#[test]
	fn generation_is_deterministic_for_fixed_inputs() {
		assert_eq!(fixture_auth_info(true), fixture_auth_info(true));
	}

	#[test]
	fn missing_pid_fails_before_signing() {
		let request: AuthInfoRequest =
			serde_json::from_str("{}").expect("Empty request should parse.");
		let err = request
			.respond(&test_descriptor(), &test_app_key(), &ClockTargetIds)
			.expect_err("Missing pid should fail.");

		assert!(matches!(err, Error::Config(ConfigError::MissingPid)));
		assert!(err.is_client_error());
	}

	#[test]
	fn response_echoes_request() {
		let generated = AuthInfoRequest::new(TEST_PID)
			.respond(&test_descriptor(), &test_app_key(), &FixedTargetIds::new("auth_1_1234"))
			.expect("Generated target should work.");

		assert_eq!(generated.target_id, AUTO_GENERATED_TARGET_ID);
		assert!(generated.auth_info.as_str().contains("target_id=auth_1_1234"));
		assert_eq!(generated.sign_type, SignType::Rsa2);

		let custom = AuthInfoRequest::new(TEST_PID)
			.with_target_id("test_target_123")
			.with_rsa2(false)
			.respond(&test_descriptor(), &test_app_key(), &ClockTargetIds)
			.expect("Custom target should work.");

		assert_eq!(custom.target_id, "test_target_123");
		assert_eq!(custom.pid, TEST_PID);
		assert_eq!(custom.sign_type, SignType::Rsa);
	}

	#[test]
	fn request_defaults_follow_contract() {
		let request: AuthInfoRequest =
			serde_json::from_str(r#"{"pid":"2088102123816631"}"#).expect("Request should parse.");

		assert!(request.rsa2);
		assert_eq!(request.target_id, None);

		let response = request
			.respond(&test_descriptor(), &test_app_key(), &ClockTargetIds)
			.expect("Request should respond.");
		let json = serde_json::to_value(&response).expect("Response should serialize.");

		assert_eq!(json["sign_type"], "RSA2");
		assert_eq!(json["target_id"], AUTO_GENERATED_TARGET_ID);
		assert_eq!(json["auth_info"].as_str(), Some(response.auth_info.as_str()));
	}
}
