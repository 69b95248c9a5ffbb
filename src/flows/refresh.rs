//! Refresh token rotation.
//!
//! The gateway issues a new refresh token with every refresh; callers must persist the
//! returned grant and discard the old one. The broker keeps no token state of its own.

// self
use crate::{
	_prelude::*,
	auth::TokenGrant,
	flows::{Broker, common},
	gateway::TransportErrorMapper,
	http::GatewayHttpClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::{GatewayMethod, TokenGrantType},
};

impl<C, M> Broker<C, M>
where
	C: ?Sized + GatewayHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Trades `refresh_token` for a fresh grant.
	///
	/// Expired or revoked refresh tokens surface as [`Error::InvalidGrant`].
	pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenGrant> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "refresh_access_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				common::require_non_empty("refresh_token", refresh_token)?;

				let node = common::call_gateway(
					self,
					GatewayMethod::OauthToken,
					&[
						("grant_type", TokenGrantType::RefreshToken.as_str()),
						("refresh_token", refresh_token),
					],
				)
				.await?;

				TokenGrant::from_node(&node, OffsetDateTime::now_utc())
			})
			.await;

		if let Err(err) = &result {
			obs::flow_warn(KIND, err);
		}

		obs::record_result(KIND, &result);

		result
	}

	/// Refreshes `grant` if its access token expires within `window` of `now`.
	///
	/// Returns `None` when the grant is still fresh enough.
	pub async fn refresh_if_expiring(
		&self,
		grant: &TokenGrant,
		window: Duration,
		now: OffsetDateTime,
	) -> Result<Option<TokenGrant>> {
		if grant.expires_at() - now > window {
			return Ok(None);
		}

		self.refresh_access_token(grant.refresh_token.expose()).await.map(Some)
	}
}
