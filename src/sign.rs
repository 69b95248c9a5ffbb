//! RSA PKCS#1 v1.5 signing over canonical strings.
//!
//! `RSA2` digests with SHA-256 and `RSA` with SHA-1; both use PKCS#1 v1.5 padding, so a given
//! key and input always produce the same signature bytes.

pub mod key;

pub use key::*;

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use rsa::Pkcs1v15Sign;
use sha1::Sha1;
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, authinfo::encode_value, error::SigningError};

/// Digest selection for signatures, named after the provider's `sign_type` labels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignType {
	/// SHA-1 with RSA (legacy).
	#[serde(rename = "RSA")]
	Rsa,
	/// SHA-256 with RSA.
	#[default]
	#[serde(rename = "RSA2")]
	Rsa2,
}
impl SignType {
	/// Maps the caller-facing `rsa2` flag onto a sign type.
	pub fn from_use_sha256(use_sha256: bool) -> Self {
		if use_sha256 { Self::Rsa2 } else { Self::Rsa }
	}

	/// Wire label sent as `sign_type`.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Rsa => "RSA",
			Self::Rsa2 => "RSA2",
		}
	}

	fn scheme_and_digest(self, content: &[u8]) -> (Pkcs1v15Sign, Vec<u8>) {
		match self {
			Self::Rsa => (Pkcs1v15Sign::new::<Sha1>(), Sha1::digest(content).to_vec()),
			Self::Rsa2 => (Pkcs1v15Sign::new::<Sha256>(), Sha256::digest(content).to_vec()),
		}
	}
}
impl Display for SignType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Signs the UTF-8 bytes of `content` and returns the raw signature.
pub fn sign(
	content: &str,
	key: &AppPrivateKey,
	sign_type: SignType,
) -> Result<Vec<u8>, SigningError> {
	let (scheme, digest) = sign_type.scheme_and_digest(content.as_bytes());

	Ok(key.as_rsa().sign(scheme, &digest)?)
}

/// Parses `material` and signs `content` with it.
///
/// Prefer [`sign`] with a key parsed once at startup; this exists for one-off callers that
/// only hold the configured string.
pub fn sign_with_material(content: &str, material: &str, sign_type: SignType) -> Result<Vec<u8>> {
	let key = AppPrivateKey::from_material(material)?;

	Ok(sign(content, &key, sign_type)?)
}

/// Base64-encodes a signature for use as a form field.
pub fn base64_signature(signature: &[u8]) -> String {
	STANDARD.encode(signature)
}

/// Base64-encodes then percent-encodes a signature for embedding in a query string.
pub fn encode_signature(signature: &[u8]) -> String {
	encode_value(&base64_signature(signature))
}

/// Verifies a base64 signature of `content` under the provider public key.
///
/// Returns `false` for undecodable base64 as well as for a mismatching signature.
pub fn verify(
	content: &str,
	signature_b64: &str,
	key: &ProviderPublicKey,
	sign_type: SignType,
) -> bool {
	let Ok(signature) = STANDARD.decode(signature_b64.trim()) else {
		return false;
	};
	let (scheme, digest) = sign_type.scheme_and_digest(content.as_bytes());

	key.as_rsa().verify(scheme, &digest, &signature).is_ok()
}
