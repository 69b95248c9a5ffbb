//! Profile lookup with an access token.

// self
use crate::{
	_prelude::*,
	auth::UserProfile,
	flows::{Broker, common},
	gateway::TransportErrorMapper,
	http::GatewayHttpClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::GatewayMethod,
};

impl<C, M> Broker<C, M>
where
	C: ?Sized + GatewayHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Fetches the profile of the user who granted `access_token`.
	pub async fn fetch_user_info(&self, access_token: &str) -> Result<UserProfile> {
		const KIND: FlowKind = FlowKind::UserInfo;

		let span = FlowSpan::new(KIND, "fetch_user_info");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.fetch_user_info_inner(access_token)).await;

		if let Err(err) = &result {
			obs::flow_warn(KIND, err);
		}

		obs::record_result(KIND, &result);

		result
	}

	pub(super) async fn fetch_user_info_inner(&self, access_token: &str) -> Result<UserProfile> {
		common::require_non_empty("auth_token", access_token)?;

		let node =
			common::call_gateway(self, GatewayMethod::UserInfoShare, &[("auth_token", access_token)])
				.await?;

		UserProfile::from_node(&node)
	}
}
