//! RSA key material loading.
//!
//! The open platform hands out private keys as bare base64 PKCS#1 DER (no PEM envelope) and
//! its own public key as bare base64 SubjectPublicKeyInfo. Both loaders accept either the
//! bare form or a complete PEM document.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use rsa::{
	RsaPrivateKey, RsaPublicKey,
	pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey},
	pkcs8::{DecodePrivateKey, DecodePublicKey},
};
// self
use crate::{_prelude::*, error::KeyError};

const PEM_LINE_WIDTH: usize = 64;
const PKCS1_PRIVATE_LABEL: &str = "RSA PRIVATE KEY";
const PKCS8_PRIVATE_LABEL: &str = "PRIVATE KEY";
const SPKI_PUBLIC_LABEL: &str = "PUBLIC KEY";
const PKCS1_PUBLIC_LABEL: &str = "RSA PUBLIC KEY";

/// Application private key used to sign authInfo strings and gateway requests.
///
/// Parsed once and shared read-only; cloning is cheap.
#[derive(Clone)]
pub struct AppPrivateKey(Arc<RsaPrivateKey>);
impl AppPrivateKey {
	/// Parses raw base64 PKCS#1 material or a PEM document.
	///
	/// Raw material is wrapped in a PKCS#1 envelope first. Providers occasionally issue PKCS#8
	/// bodies under the same bare format, so a failed PKCS#1 parse falls back to PKCS#8 DER.
	pub fn from_material(material: &str) -> Result<Self, KeyError> {
		let material = material.trim();

		if material.is_empty() {
			return Err(KeyError::Empty);
		}

		let key = match pem_label(material) {
			Some(PKCS8_PRIVATE_LABEL) => RsaPrivateKey::from_pkcs8_pem(material)?,
			Some(PKCS1_PRIVATE_LABEL) => RsaPrivateKey::from_pkcs1_pem(material)?,
			Some(label) => return Err(KeyError::UnsupportedLabel { label: label.to_owned() }),
			None => parse_bare_private_key(material)?,
		};

		Ok(Self(Arc::new(key)))
	}

	/// Borrows the parsed key.
	pub fn as_rsa(&self) -> &RsaPrivateKey {
		&self.0
	}

	/// Derives the matching public key.
	pub fn public_key(&self) -> ProviderPublicKey {
		ProviderPublicKey(Arc::new(self.0.to_public_key()))
	}
}
impl FromStr for AppPrivateKey {
	type Err = KeyError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::from_material(s)
	}
}
impl Debug for AppPrivateKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("AppPrivateKey").field(&"<redacted>").finish()
	}
}

/// Provider public key used to verify gateway response signatures.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderPublicKey(Arc<RsaPublicKey>);
impl ProviderPublicKey {
	/// Parses raw base64 SubjectPublicKeyInfo material or a PEM document.
	pub fn from_material(material: &str) -> Result<Self, KeyError> {
		let material = material.trim();

		if material.is_empty() {
			return Err(KeyError::Empty);
		}

		let key = match pem_label(material) {
			Some(SPKI_PUBLIC_LABEL) => RsaPublicKey::from_public_key_pem(material)?,
			Some(PKCS1_PUBLIC_LABEL) => RsaPublicKey::from_pkcs1_pem(material)?,
			Some(label) => return Err(KeyError::UnsupportedLabel { label: label.to_owned() }),
			None => RsaPublicKey::from_public_key_der(&decode_body(material)?)?,
		};

		Ok(Self(Arc::new(key)))
	}

	/// Borrows the parsed key.
	pub fn as_rsa(&self) -> &RsaPublicKey {
		&self.0
	}
}
impl FromStr for ProviderPublicKey {
	type Err = KeyError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::from_material(s)
	}
}

/// Wraps bare base64 private key material in a PKCS#1 PEM envelope.
///
/// Material that already carries a PEM header is returned trimmed but otherwise unchanged.
pub fn wrap_private_key_pem(material: &str) -> String {
	let material = material.trim();

	if pem_label(material).is_some() {
		return material.to_owned();
	}

	wrap_pem(PKCS1_PRIVATE_LABEL, &strip_whitespace(material))
}

fn parse_bare_private_key(material: &str) -> Result<RsaPrivateKey, KeyError> {
	let body = strip_whitespace(material);

	match RsaPrivateKey::from_pkcs1_pem(&wrap_pem(PKCS1_PRIVATE_LABEL, &body)) {
		Ok(key) => Ok(key),
		Err(pkcs1_err) => {
			let der = STANDARD.decode(body.as_bytes())?;

			RsaPrivateKey::from_pkcs8_der(&der).map_err(|_| KeyError::Pkcs1(pkcs1_err))
		},
	}
}

fn wrap_pem(label: &str, body: &str) -> String {
	let mut pem = String::with_capacity(body.len() + body.len() / PEM_LINE_WIDTH + 64);

	pem.push_str("-----BEGIN ");
	pem.push_str(label);
	pem.push_str("-----\n");

	// Base64 is ASCII, so byte chunks are valid UTF-8 boundaries.
	for line in body.as_bytes().chunks(PEM_LINE_WIDTH) {
		pem.push_str(std::str::from_utf8(line).unwrap_or_default());
		pem.push('\n');
	}

	pem.push_str("-----END ");
	pem.push_str(label);
	pem.push_str("-----\n");

	pem
}

fn pem_label(material: &str) -> Option<&str> {
	let rest = material.strip_prefix("-----BEGIN ")?;
	let end = rest.find("-----")?;

	Some(&rest[..end])
}

fn decode_body(material: &str) -> Result<Vec<u8>, KeyError> {
	Ok(STANDARD.decode(strip_whitespace(material).as_bytes())?)
}

fn strip_whitespace(material: &str) -> String {
	material.chars().filter(|ch| !ch.is_whitespace()).collect()
}
