//! Gateway response envelopes.
//!
//! The gateway wraps every answer as `{"<method>_response": <node>, "sign": "..."}` (or
//! `error_response` for gateway-level rejections). Some SDK layers hand the node over as a
//! JSON string instead of an object; [`GatewayPayload`] captures both shapes and
//! [`parse_envelope`] is the single place that normalizes them.

// crates.io
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, value::RawValue};
// self
use crate::{
	_prelude::*,
	error::{ResponseError, TransientError},
	provider::GatewayMethod,
};

const ERROR_RESPONSE_KEY: &str = "error_response";
const SUCCESS_CODE: &str = "10000";

/// A response node as it may arrive on the wire.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum GatewayPayload {
	/// Node delivered as a JSON object.
	Object(Map<String, Value>),
	/// Node delivered as a string containing a JSON object.
	Encoded(String),
}
impl GatewayPayload {
	/// Normalizes either shape into a [`GatewayNode`].
	pub fn into_node(self) -> Result<GatewayNode, ResponseError> {
		match self {
			Self::Object(fields) => Ok(GatewayNode { fields }),
			Self::Encoded(text) => {
				let fields = serde_path_to_error::deserialize(
					&mut serde_json::Deserializer::from_str(&text),
				)
				.map_err(ResponseError::Shape)?;

				Ok(GatewayNode { fields })
			},
		}
	}
}

/// Normalized response node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GatewayNode {
	fields: Map<String, Value>,
}
impl GatewayNode {
	/// Wraps a JSON object; returns `None` for any other value.
	pub fn from_value(value: Value) -> Option<Self> {
		match value {
			Value::Object(fields) => Some(Self { fields }),
			_ => None,
		}
	}

	/// Raw field access.
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.fields.get(key)
	}

	/// Non-empty textual field; numbers are rendered as text.
	pub fn text(&self, key: &str) -> Option<String> {
		match self.fields.get(key)? {
			Value::String(s) if !s.is_empty() => Some(s.clone()),
			Value::Number(n) => Some(n.to_string()),
			_ => None,
		}
	}

	/// Maps the node onto a typed record, reporting the failing path on mismatch.
	pub fn deserialize<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		serde_path_to_error::deserialize(Value::Object(self.fields.clone()))
			.map_err(|e| ResponseError::Shape(e).into())
	}

	/// Classifies the node by its `code`.
	///
	/// `10000` is success. The token method omits `code` on success, so a node without `code`
	/// that carries an `access_token` also counts as success.
	pub fn status(&self) -> NodeStatus {
		match self.text("code") {
			Some(code) if code == SUCCESS_CODE => NodeStatus::Success,
			Some(code) => NodeStatus::Failure(GatewayFailure {
				msg: self.text("msg").unwrap_or_default(),
				sub_code: self.text("sub_code"),
				sub_msg: self.text("sub_msg"),
				code,
			}),
			None if self.text("access_token").is_some() => NodeStatus::Success,
			None => NodeStatus::Unknown,
		}
	}
}

/// Outcome encoded in a response node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeStatus {
	/// Business call succeeded.
	Success,
	/// Gateway or business rejection.
	Failure(GatewayFailure),
	/// Neither a code nor a success marker is present.
	Unknown,
}

/// Error fields carried by a failed node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayFailure {
	/// Top-level code.
	pub code: String,
	/// Top-level message.
	pub msg: String,
	/// Detailed code.
	pub sub_code: Option<String>,
	/// Detailed message.
	pub sub_msg: Option<String>,
}
impl GatewayFailure {
	/// Most specific human-readable reason available.
	pub fn reason(&self) -> String {
		match (&self.sub_code, &self.sub_msg) {
			(Some(code), Some(msg)) => format!("{code}: {msg}"),
			(Some(code), None) => code.clone(),
			(None, Some(msg)) => msg.clone(),
			(None, None) => format!("{}: {}", self.code, self.msg),
		}
	}
}

/// Parsed envelope with the material needed to verify its signature.
#[derive(Clone, Debug, PartialEq)]
pub struct GatewayEnvelope {
	/// Key the node was found under.
	pub node_key: String,
	/// Normalized node.
	pub node: GatewayNode,
	/// Exact node text the gateway signed.
	pub signed_content: String,
	/// Base64 signature, when present.
	pub sign: Option<String>,
}
impl GatewayEnvelope {
	/// Whether the node came from `error_response`.
	pub fn is_error_response(&self) -> bool {
		self.node_key == ERROR_RESPONSE_KEY
	}
}

/// Splits a response body into node, signature, and signed text for `method`.
///
/// Malformed JSON is transient (the gateway occasionally serves HTML error pages); a
/// well-formed body without the expected node is a response-shape error.
pub fn parse_envelope(
	body: &[u8],
	method: GatewayMethod,
	status: Option<u16>,
) -> Result<GatewayEnvelope> {
	let mut envelope: HashMap<String, Box<RawValue>> = serde_json::from_slice(body)
		.map_err(|source| TransientError::ResponseParse { source, status })?;
	let sign = envelope
		.remove("sign")
		.and_then(|raw| serde_json::from_str::<String>(raw.get()).ok())
		.filter(|sign| !sign.is_empty());
	let (node_key, raw) = match envelope.remove_entry(method.response_key()) {
		Some(entry) => entry,
		None => envelope.remove_entry(ERROR_RESPONSE_KEY).ok_or_else(|| {
			ResponseError::MissingNode { key: method.response_key().to_owned() }
		})?,
	};
	let payload: GatewayPayload =
		serde_path_to_error::deserialize(&mut serde_json::Deserializer::from_str(raw.get()))
			.map_err(ResponseError::Shape)?;
	let signed_content = match &payload {
		GatewayPayload::Object(_) => raw.get().to_owned(),
		GatewayPayload::Encoded(text) => text.clone(),
	};

	Ok(GatewayEnvelope { node_key, node: payload.into_node()?, signed_content, sign })
}

/// Parses a whole number of seconds from a number, a numeric string, or a single-element
/// array holding either.
pub fn parse_seconds(value: &Value) -> Option<i64> {
	match value {
		Value::Number(n) => n.as_i64().or_else(|| {
			n.as_f64().filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64).map(|f| f as i64)
		}),
		Value::String(s) => s.trim().parse().ok(),
		Value::Array(items) if items.len() == 1 => parse_seconds(&items[0]),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	#[test]
	fn seconds_accept_numbers_strings_and_singletons() {
		assert_eq!(parse_seconds(&json!(7200)), Some(7200));
		assert_eq!(parse_seconds(&json!(" 7200 ")), Some(7200));
		assert_eq!(parse_seconds(&json!(["7200"])), Some(7200));
		assert_eq!(parse_seconds(&json!([7200])), Some(7200));
		assert_eq!(parse_seconds(&json!(7200.0)), Some(7200));
		assert_eq!(parse_seconds(&json!(7200.5)), None);
		assert_eq!(parse_seconds(&json!([1, 2])), None);
		assert_eq!(parse_seconds(&json!("soon")), None);
		assert_eq!(parse_seconds(&json!(null)), None);
	}

	#[test]
	fn object_and_encoded_nodes_normalize_identically() {
		let object = br#"{"alipay_user_info_share_response":{"code":"10000","msg":"Success","user_id":"2088"},"sign":"c2ln"}"#;
		let encoded = br#"{"alipay_user_info_share_response":"{\"code\":\"10000\",\"msg\":\"Success\",\"user_id\":\"2088\"}"}"#;
		let a = parse_envelope(object, GatewayMethod::UserInfoShare, Some(200))
			.expect("Object node should parse.");
		let b = parse_envelope(encoded, GatewayMethod::UserInfoShare, Some(200))
			.expect("Encoded node should parse.");

		assert_eq!(a.node, b.node);
		assert_eq!(a.node.status(), NodeStatus::Success);
		assert_eq!(a.sign.as_deref(), Some("c2ln"));
		assert_eq!(b.sign, None);
		assert_eq!(a.signed_content, r#"{"code":"10000","msg":"Success","user_id":"2088"}"#);
		assert_eq!(b.signed_content, a.signed_content);
	}

	#[test]
	fn token_node_without_code_is_success() {
		let body = br#"{"alipay_system_oauth_token_response":{"access_token":"a","expires_in":"1"}}"#;
		let envelope =
			parse_envelope(body, GatewayMethod::OauthToken, None).expect("Body should parse.");

		assert_eq!(envelope.node.status(), NodeStatus::Success);
		assert!(!envelope.is_error_response());
	}

	#[test]
	fn error_response_is_reported_as_failure() {
		let body = br#"{"error_response":{"code":"40002","msg":"Invalid Arguments","sub_code":"isv.code-invalid","sub_msg":"auth code is invalid"}}"#;
		let envelope =
			parse_envelope(body, GatewayMethod::OauthToken, None).expect("Body should parse.");

		assert!(envelope.is_error_response());

		let NodeStatus::Failure(failure) = envelope.node.status() else {
			panic!("Error node should classify as failure.");
		};

		assert_eq!(failure.code, "40002");
		assert_eq!(failure.sub_code.as_deref(), Some("isv.code-invalid"));
		assert_eq!(failure.reason(), "isv.code-invalid: auth code is invalid");
	}

	#[test]
	fn unexpected_bodies_map_to_distinct_errors() {
		let err = parse_envelope(b"<html>busy</html>", GatewayMethod::OauthToken, Some(502))
			.expect_err("HTML should fail.");

		assert!(matches!(
			err,
			Error::Transient(TransientError::ResponseParse { status: Some(502), .. })
		));

		let err = parse_envelope(br#"{"other":{}}"#, GatewayMethod::OauthToken, Some(200))
			.expect_err("Missing node should fail.");

		assert!(matches!(err, Error::Response(ResponseError::MissingNode { .. })));

		let err = parse_envelope(
			br#"{"alipay_system_oauth_token_response":42}"#,
			GatewayMethod::OauthToken,
			Some(200),
		)
		.expect_err("Scalar node should fail.");

		assert!(matches!(err, Error::Response(ResponseError::Shape(_))));
	}

	#[test]
	fn node_without_code_or_token_is_unknown() {
		let node = GatewayNode::from_value(json!({ "msg": "?" })).expect("Object should wrap.");

		assert_eq!(node.status(), NodeStatus::Unknown);
		assert!(GatewayNode::from_value(json!([1])).is_none());
	}
}
