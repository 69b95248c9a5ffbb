//! High-level flow orchestrators powered by the broker facade.

pub mod auth_code;
pub mod auth_info;
pub mod common;
pub mod refresh;
pub mod user_info;

pub use auth_code::*;

// self
use crate::{
	_prelude::*,
	authinfo::{ClockTargetIds, TargetIdSource},
	gateway::TransportErrorMapper,
	http::GatewayHttpClient,
	provider::{GatewayDescriptor, GatewayStrategy},
	rate_limit::RateLimiter,
	sign::{AppPrivateKey, ProviderPublicKey},
};
#[cfg(feature = "reqwest")]
use crate::{gateway::ReqwestTransportErrorMapper, http::ReqwestHttpClient};

#[cfg(feature = "reqwest")]
/// Broker specialized for the crate's default reqwest transport stack.
pub type ReqwestBroker = Broker<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Coordinates authInfo issuance and gateway flows for a single application.
///
/// The broker owns the descriptor, the parsed key pair, the HTTP client, and the limiter so
/// individual flows only describe their gateway parameters. Everything it holds is read-only
/// after construction except the limiter, which synchronizes internally; clones share state.
#[derive(Clone)]
pub struct Broker<C, M>
where
	C: ?Sized + GatewayHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every outbound gateway request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Gateway descriptor that defines endpoints, common parameters, and authInfo constants.
	pub descriptor: GatewayDescriptor,
	/// Strategy responsible for request decoration and error classification.
	pub strategy: Arc<dyn GatewayStrategy>,
	/// Limiter consulted by [`Broker::auth_info`].
	pub rate_limiter: Arc<RateLimiter>,
	app_key: AppPrivateKey,
	provider_key: Option<ProviderPublicKey>,
	target_ids: Arc<dyn TargetIdSource>,
}
impl<C, M> Broker<C, M>
where
	C: ?Sized + GatewayHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a broker that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		descriptor: GatewayDescriptor,
		strategy: Arc<dyn GatewayStrategy>,
		app_key: AppPrivateKey,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			descriptor,
			strategy,
			rate_limiter: Default::default(),
			app_key,
			provider_key: None,
			target_ids: Arc::new(ClockTargetIds),
		}
	}

	/// Enables response signature verification with the provider public key.
	pub fn with_provider_key(mut self, key: ProviderPublicKey) -> Self {
		self.provider_key = Some(key);

		self
	}

	/// Replaces the default 5-per-minute limiter, for example to share one across brokers.
	pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
		self.rate_limiter = limiter;

		self
	}

	/// Replaces the generator used when a request carries no `target_id`.
	pub fn with_target_ids(mut self, source: Arc<dyn TargetIdSource>) -> Self {
		self.target_ids = source;

		self
	}

	/// Whether gateway responses are signature-checked.
	pub fn verifies_responses(&self) -> bool {
		self.provider_key.is_some()
	}
}
#[cfg(feature = "reqwest")]
impl Broker<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a new broker for the provided descriptor and application key.
	///
	/// The broker provisions its own reqwest-backed transport (10 second request timeout) so
	/// callers do not need to pass HTTP handles explicitly. Use [`Broker::with_provider_key`]
	/// to verify gateway response signatures.
	pub fn new(
		descriptor: GatewayDescriptor,
		strategy: Arc<dyn GatewayStrategy>,
		app_key: AppPrivateKey,
	) -> Self {
		Self::with_http_client(
			descriptor,
			strategy,
			app_key,
			ReqwestHttpClient::default(),
			Arc::new(ReqwestTransportErrorMapper),
		)
	}
}
impl<C, M> Debug for Broker<C, M>
where
	C: ?Sized + GatewayHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Broker")
			.field("descriptor", &self.descriptor)
			.field("app_key", &self.app_key)
			.field("verifies_responses", &self.provider_key.is_some())
			.field("rate_limiter", &self.rate_limiter)
			.finish()
	}
}
