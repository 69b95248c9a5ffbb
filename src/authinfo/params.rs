//! authInfo parameter map and its two serializations.
//!
//! The signing form sorts keys and leaves values raw; the transmission form keeps insertion
//! order and percent-encodes values. The mobile SDK verifies the signature against the raw
//! concatenation, so the two must stay different.

// crates.io
use rand::Rng;
// self
use crate::{
	_prelude::*,
	auth::{Pid, TargetId},
	authinfo::{decode_value, encode_value},
	error::{ConfigError, EncodingError},
	provider::GatewayDescriptor,
	sign::SignType,
};

/// Keys every authInfo map carries, in transmission order.
pub const AUTH_INFO_KEYS: [&str; 11] = [
	"app_id",
	"pid",
	"apiname",
	"methodname",
	"app_name",
	"biz_type",
	"product_id",
	"scope",
	"target_id",
	"auth_type",
	"sign_type",
];

/// Supplies `target_id` values when the caller does not provide one.
pub trait TargetIdSource: Send + Sync {
	/// Returns a fresh identifier.
	fn next_target_id(&self) -> TargetId;
}

/// Default source yielding `auth_{epoch_millis}_{1000..=9999}`.
///
/// Uniqueness is probabilistic: two ids minted in the same millisecond collide with
/// probability 1/9000. Callers that need hard uniqueness must pass their own `target_id`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClockTargetIds;
impl TargetIdSource for ClockTargetIds {
	fn next_target_id(&self) -> TargetId {
		let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
		let suffix: u16 = rand::rng().random_range(1000..=9999);

		TargetId::generated(format!("auth_{millis}_{suffix}"))
	}
}

/// Insertion-ordered string map.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParameterMap {
	entries: Vec<(&'static str, String)>,
}
impl ParameterMap {
	/// Creates an empty map.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets `key`, keeping its original position when it is already present.
	pub fn insert(&mut self, key: &'static str, value: impl Into<String>) {
		let value = value.into();

		match self.entries.iter_mut().find(|(k, _)| *k == key) {
			Some((_, slot)) => *slot = value,
			None => self.entries.push((key, value)),
		}
	}

	/// Looks up a value.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.entries.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str())
	}

	/// Iterates in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
		self.entries.iter().map(|(k, v)| (*k, v.as_str()))
	}

	/// Number of entries.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Whether the map is empty.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Checks that every authInfo key is present and no value is empty.
	pub fn validate(&self) -> Result<(), ConfigError> {
		for key in AUTH_INFO_KEYS {
			match self.get(key) {
				None => return Err(ConfigError::MissingParameter { key }),
				Some("") => return Err(ConfigError::EmptyParameter { key }),
				Some(_) => {},
			}
		}
		if let Some((key, _)) = self.entries.iter().find(|(_, v)| v.is_empty()) {
			return Err(ConfigError::EmptyParameter { key });
		}

		Ok(())
	}
}

/// Assembles the authInfo map for `pid`.
///
/// `pid` is checked before anything else so a missing partner id never reaches the signer.
/// When `target_id` is `None` one is drawn from `target_ids`.
pub fn build_parameter_map(
	descriptor: &GatewayDescriptor,
	pid: &str,
	target_id: Option<&str>,
	sign_type: SignType,
	target_ids: &dyn TargetIdSource,
) -> Result<ParameterMap> {
	if pid.is_empty() {
		return Err(ConfigError::MissingPid.into());
	}

	let pid = Pid::new(pid).map_err(ConfigError::from)?;
	let target_id = match target_id {
		Some(raw) => TargetId::new(raw).map_err(ConfigError::from)?,
		None => target_ids.next_target_id(),
	};
	let profile = &descriptor.profile;
	let mut map = ParameterMap::new();

	map.insert("app_id", &*descriptor.app_id);
	map.insert("pid", String::from(pid));
	map.insert("apiname", profile.apiname.as_str());
	map.insert("methodname", profile.methodname.as_str());
	map.insert("app_name", profile.app_name.as_str());
	map.insert("biz_type", profile.biz_type.as_str());
	map.insert("product_id", profile.product_id.as_str());
	map.insert("scope", profile.scope.as_str());
	map.insert("target_id", String::from(target_id));
	map.insert("auth_type", profile.auth_type.as_str());
	map.insert("sign_type", sign_type.as_str());

	Ok(map)
}

/// Sorted, unescaped `k=v&k=v` form used as signing input.
pub fn serialize_for_signing(map: &ParameterMap) -> String {
	canonical_string(map.iter())
}

/// Insertion-ordered, percent-encoded `k=v&k=v` form sent to the client.
pub fn serialize_for_transmission(map: &ParameterMap) -> String {
	map.iter().map(|(k, v)| format!("{k}={}", encode_value(v))).collect::<Vec<_>>().join("&")
}

/// Sorts pairs by key codepoint and joins them unescaped.
pub fn canonical_string<'k, 'v, I>(pairs: I) -> String
where
	I: IntoIterator<Item = (&'k str, &'v str)>,
{
	let mut pairs: Vec<(&'k str, &'v str)> = pairs.into_iter().collect();

	pairs.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));

	pairs.into_iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&")
}

/// Splits a transmission-form string into decoded `(key, value)` pairs, preserving order.
pub fn parse_transmission_form(form: &str) -> Result<Vec<(String, String)>, EncodingError> {
	form.split('&')
		.map(|segment| {
			let (key, value) = segment
				.split_once('=')
				.ok_or_else(|| EncodingError::MalformedSegment { segment: segment.to_owned() })?;

			Ok((key.to_owned(), decode_value(key, value)?))
		})
		.collect()
}
