//! Transport primitives for gateway calls.
//!
//! The module exposes [`GatewayHttpClient`] alongside [`ResponseMetadata`] and
//! [`ResponseMetadataSlot`] so downstream crates can plug in custom HTTP clients without
//! losing the broker's error classification. Implementations call
//! [`ResponseMetadataSlot::take`] before dispatching a request and
//! [`ResponseMetadataSlot::store`] once an HTTP status or retry hint is known.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
#[cfg(feature = "reqwest")] use reqwest::header::{HeaderMap, RETRY_AFTER};
#[cfg(feature = "reqwest")] use time::format_description::well_known::Rfc2822;
// self
use crate::_prelude::*;

/// Boxed future returned by [`GatewayHttpClient::post_form`].
pub type PostFuture<'a, E> = Pin<Box<dyn Future<Output = Result<GatewayHttpResponse, E>> + 'a + Send>>;

/// Raw HTTP answer handed back to the gateway parser.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayHttpResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response body bytes.
	pub body: Vec<u8>,
}
impl GatewayHttpResponse {
	/// Whether the status is in the 2xx range.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Abstraction over HTTP transports able to POST a gateway form.
///
/// The trait is the crate's only dependency on an HTTP stack. Implementations must be
/// `Send + Sync + 'static` so they can be shared across broker clones, and the returned future
/// must be `Send` so flows can run on multi-threaded executors. Implementations are expected
/// to bound each request with a timeout and surface it as a transport error; the crate never
/// retries.
pub trait GatewayHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Posts `form` as `application/x-www-form-urlencoded` to `url`.
	///
	/// # Metadata Contract
	///
	/// - Call [`ResponseMetadataSlot::take`] before submitting the request.
	/// - Once a response (successful or not) provides status headers, save them with
	///   [`ResponseMetadataSlot::store`].
	fn post_form<'a>(
		&'a self,
		url: &'a Url,
		form: &'a [(String, String)],
		slot: ResponseMetadataSlot,
	) -> PostFuture<'a, Self::TransportError>;
}

/// Captures metadata from the most recent HTTP response for downstream error mapping.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadata {
	/// HTTP status code returned by the gateway, if available.
	pub status: Option<u16>,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
}

/// Thread-safe slot for sharing [`ResponseMetadata`] between transport and error layers.
///
/// The broker creates a fresh slot for each gateway call and reads the captured metadata
/// immediately after the transport resolves.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Stores new metadata for the current request.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Returns the captured metadata, if any, consuming it from the slot.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// Thin wrapper around [`ReqwestClient`] that applies a per-request timeout.
///
/// The gateway answers directly; configure any custom client to disable redirect following.
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct ReqwestHttpClient {
	client: ReqwestClient,
	timeout: Duration,
}
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Timeout applied when none is configured.
	pub const DEFAULT_TIMEOUT: Duration = Duration::seconds(10);

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self { client, timeout: Self::DEFAULT_TIMEOUT }
	}

	/// Overrides the per-request timeout; non-positive values fall back to the default.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = if timeout.is_positive() { timeout } else { Self::DEFAULT_TIMEOUT };

		self
	}

	/// Effective per-request timeout.
	pub fn timeout(&self) -> Duration {
		self.timeout
	}
}
#[cfg(feature = "reqwest")]
impl Default for ReqwestHttpClient {
	fn default() -> Self {
		Self::with_client(ReqwestClient::default())
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.client
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.client
	}
}
#[cfg(feature = "reqwest")]
impl GatewayHttpClient for ReqwestHttpClient {
	type TransportError = ReqwestError;

	fn post_form<'a>(
		&'a self,
		url: &'a Url,
		form: &'a [(String, String)],
		slot: ResponseMetadataSlot,
	) -> PostFuture<'a, Self::TransportError> {
		Box::pin(async move {
			slot.take();

			let response = self
				.client
				.post(url.clone())
				.timeout(self.timeout.unsigned_abs())
				.form(form)
				.send()
				.await?;
			let status = response.status().as_u16();
			let retry_after = parse_retry_after(response.headers());

			slot.store(ResponseMetadata { status: Some(status), retry_after });

			let body = response.bytes().await?.to_vec();

			Ok(GatewayHttpResponse { status, body })
		})
	}
}

#[cfg(feature = "reqwest")]
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u32>() {
		return Some(Duration::seconds(secs.into()));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}
