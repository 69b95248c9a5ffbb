//! Rate-limited authInfo issuance.
//!
//! [`Broker::auth_info`] is the request-shaped entry point: it charges the caller's key
//! against the limiter and then runs the authInfo core with the broker's descriptor and
//! application key. [`Broker::generate_auth_info`] skips the limiter for trusted callers.

// self
use crate::{
	_prelude::*,
	authinfo::{self, AuthInfo, AuthInfoRequest, AuthInfoResponse},
	flows::Broker,
	gateway::TransportErrorMapper,
	http::GatewayHttpClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	rate_limit::RateLimitDecision,
};

impl<C, M> Broker<C, M>
where
	C: ?Sized + GatewayHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Issues a signed authInfo for `request` on behalf of `client_key`.
	///
	/// `client_key` identifies the caller for rate limiting (usually its address). A denied
	/// call returns [`Error::RateLimited`] without touching the key material; an allowed call
	/// is counted even if the request itself turns out to be invalid.
	pub fn auth_info(&self, client_key: &str, request: &AuthInfoRequest) -> Result<AuthInfoResponse> {
		const KIND: FlowKind = FlowKind::AuthInfo;

		let _span = FlowSpan::new(KIND, "auth_info").entered();

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = match self.rate_limiter.evaluate(client_key) {
			RateLimitDecision::Allow =>
				request.respond(&self.descriptor, &self.app_key, self.target_ids.as_ref()),
			RateLimitDecision::Delay(directive) =>
				Err(Error::RateLimited { retry_after: directive.recommended_backoff }),
		};

		match &result {
			Ok(response) => obs::flow_info(KIND, &format!("authInfo issued ({})", response.sign_type)),
			Err(err) => obs::flow_warn(KIND, err),
		}

		obs::record_result(KIND, &result);

		result
	}

	/// Builds, signs, and serializes an authInfo without consulting the limiter.
	pub fn generate_auth_info(
		&self,
		pid: &str,
		target_id: Option<&str>,
		use_sha256: bool,
	) -> Result<AuthInfo> {
		authinfo::generate_auth_info(
			&self.descriptor,
			pid,
			target_id,
			use_sha256,
			&self.app_key,
			self.target_ids.as_ref(),
		)
	}
}
