//! Alipay OAuth bridge: signed `authInfo` strings for the native client SDK, gateway token
//! exchange and refresh, user-info lookups, and a per-key request limiter.
//!
//! The heart of the crate is [`authinfo`]: it assembles the fixed authInfo parameter map,
//! serializes it twice (sorted and unescaped for signing, insertion-ordered and
//! percent-encoded for transmission), signs the first form with RSA PKCS#1 v1.5 through
//! [`sign`], and appends the encoded signature to the second form. Everything else in the
//! crate ([`gateway`], [`flows`], [`rate_limit`]) is request/response plumbing around that
//! routine.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod authinfo;
pub mod error;
pub mod flows;
pub mod gateway;
pub mod http;
pub mod obs;
pub mod provider;
pub mod rate_limit;
pub mod sign;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and fixtures for integration tests; enabled via `cfg(test)` or
	//! the `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		authinfo::TargetIdSource,
		auth::TargetId,
		provider::GatewayDescriptor,
		sign::{AppPrivateKey, ProviderPublicKey},
	};
	#[cfg(feature = "reqwest")]
	use crate::{
		flows::Broker, gateway::ReqwestTransportErrorMapper, http::ReqwestHttpClient,
		provider::{DefaultGatewayStrategy, GatewayStrategy},
	};

	/// Application identifier used by fixtures.
	pub const TEST_APP_ID: &str = "2021005194600693";
	/// Merchant partner identifier used by fixtures.
	pub const TEST_PID: &str = "2088102123816631";
	/// Raw base64 PKCS#1 private key (no PEM envelope), as the provider issues it.
	pub const TEST_APP_PRIVATE_KEY: &str = include_str!("../tests/fixtures/app_private_key.txt");
	/// The same private key encoded as a PKCS#8 PEM document.
	pub const TEST_APP_PRIVATE_KEY_PKCS8_PEM: &str =
		include_str!("../tests/fixtures/app_private_key_pkcs8.pem");
	/// Raw base64 SubjectPublicKeyInfo matching [`TEST_APP_PRIVATE_KEY`].
	pub const TEST_PUBLIC_KEY: &str = include_str!("../tests/fixtures/alipay_public_key.txt");
	/// Known RSA2 signature (base64) of the fixture signing string.
	pub const TEST_KAT_RSA2: &str = include_str!("../tests/fixtures/kat_rsa2.txt");
	/// Known RSA signature (base64) of the fixture signing string.
	pub const TEST_KAT_RSA: &str = include_str!("../tests/fixtures/kat_rsa.txt");

	/// Target id source that always yields the same identifier.
	#[derive(Clone, Debug)]
	pub struct FixedTargetIds(pub TargetId);
	impl FixedTargetIds {
		/// Builds a source from a literal identifier.
		pub fn new(value: &str) -> Self {
			Self(TargetId::new(value).expect("Fixed target id fixture should be valid."))
		}
	}
	impl TargetIdSource for FixedTargetIds {
		fn next_target_id(&self) -> TargetId {
			self.0.clone()
		}
	}

	/// Parses the fixture private key.
	pub fn test_app_key() -> AppPrivateKey {
		AppPrivateKey::from_material(TEST_APP_PRIVATE_KEY)
			.expect("Fixture private key should parse.")
	}

	/// Parses the fixture public key.
	pub fn test_public_key() -> ProviderPublicKey {
		ProviderPublicKey::from_material(TEST_PUBLIC_KEY).expect("Fixture public key should parse.")
	}

	/// Descriptor for the fixture application pointed at the production endpoints.
	pub fn test_descriptor() -> GatewayDescriptor {
		GatewayDescriptor::builder(TEST_APP_ID)
			.build()
			.expect("Fixture descriptor should build successfully.")
	}

	/// Descriptor for the fixture application pointed at a mock gateway.
	pub fn test_descriptor_for(gateway: &str) -> GatewayDescriptor {
		GatewayDescriptor::builder(TEST_APP_ID)
			.gateway_endpoint(Url::parse(gateway).expect("Mock gateway URL should parse."))
			.build()
			.expect("Mock descriptor should build successfully.")
	}

	/// Broker type alias used by reqwest-backed integration tests.
	#[cfg(feature = "reqwest")]
	pub type ReqwestTestBroker = Broker<ReqwestHttpClient, ReqwestTransportErrorMapper>;

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	#[cfg(feature = "reqwest")]
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Constructs a [`Broker`] for the fixture application whose gateway lives at `gateway`.
	#[cfg(feature = "reqwest")]
	pub fn build_reqwest_test_broker(gateway: &str) -> ReqwestTestBroker {
		let strategy: Arc<dyn GatewayStrategy> = Arc::new(DefaultGatewayStrategy);

		Broker::with_http_client(
			test_descriptor_for(gateway),
			strategy,
			test_app_key(),
			test_reqwest_http_client(),
			Arc::new(ReqwestTransportErrorMapper),
		)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap, VecDeque},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tokio as _};
