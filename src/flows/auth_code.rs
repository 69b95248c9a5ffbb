//! Browser authorization, auth code exchange, and the combined login flow.
//!
//! [`Broker::authorize_url`] sends users to the web authorization page; the page redirects
//! back with `auth_code`, which [`Broker::exchange_code`] trades for a [`TokenGrant`]. Mobile
//! clients obtain the same `auth_code` through the native SDK after receiving an authInfo.
//! [`Broker::login`] chains the exchange with a profile lookup.

// self
use crate::{
	_prelude::*,
	auth::{TokenGrant, UserProfile},
	flows::{Broker, common},
	gateway::TransportErrorMapper,
	http::GatewayHttpClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::{GatewayMethod, TokenGrantType},
};

/// Result of [`Broker::login`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginOutcome {
	/// Profile of the user who authorized the application.
	pub user: UserProfile,
	/// Token grant obtained from the auth code.
	pub token: TokenGrant,
}

impl<C, M> Broker<C, M>
where
	C: ?Sized + GatewayHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Builds the web authorization URL the user should visit.
	///
	/// Query values are form-encoded exactly once; `state` is omitted when `None`.
	pub fn authorize_url(&self, redirect_uri: &Url, state: Option<&str>) -> Url {
		let mut url = self.descriptor.endpoints.authorize.clone();

		{
			let mut query = url.query_pairs_mut();

			query
				.append_pair("app_id", &self.descriptor.app_id)
				.append_pair("scope", &self.descriptor.scope)
				.append_pair("redirect_uri", redirect_uri.as_str());

			if let Some(state) = state {
				query.append_pair("state", state);
			}
		}

		url
	}

	/// Exchanges an `auth_code` for a token grant.
	pub async fn exchange_code(&self, auth_code: &str) -> Result<TokenGrant> {
		const KIND: FlowKind = FlowKind::AuthorizationCode;

		let span = FlowSpan::new(KIND, "exchange_code");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.exchange_code_inner(auth_code)).await;

		if let Err(err) = &result {
			obs::flow_warn(KIND, err);
		}

		obs::record_result(KIND, &result);

		result
	}

	/// Exchanges `auth_code` and fetches the authorizing user's profile.
	///
	/// Any failure in either step fails the whole flow; no partial outcome is returned.
	pub async fn login(&self, auth_code: &str) -> Result<LoginOutcome> {
		const KIND: FlowKind = FlowKind::Login;

		let span = FlowSpan::new(KIND, "login");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let token = self.exchange_code_inner(auth_code).await?;
				let user = self.fetch_user_info_inner(token.access_token.expose()).await?;

				obs::flow_info(KIND, "login completed");

				Ok(LoginOutcome { user, token })
			})
			.await;

		if let Err(err) = &result {
			obs::flow_warn(KIND, err);
		}

		obs::record_result(KIND, &result);

		result
	}

	async fn exchange_code_inner(&self, auth_code: &str) -> Result<TokenGrant> {
		common::require_non_empty("code", auth_code)?;

		let node = common::call_gateway(
			self,
			GatewayMethod::OauthToken,
			&[("grant_type", TokenGrantType::AuthorizationCode.as_str()), ("code", auth_code)],
		)
		.await?;

		TokenGrant::from_node(&node, OffsetDateTime::now_utc())
	}
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// self
	use crate::_preludet::*;

	#[test]
	fn authorize_url_encodes_once() {
		let broker = build_reqwest_test_broker("https://127.0.0.1/gateway.do");
		let redirect = Url::parse("https://app.example.com/callback?from=login")
			.expect("Redirect should parse.");
		let url = broker.authorize_url(&redirect, Some("xyz 1"));

		assert_eq!(url.host_str(), Some("openauth.alipay.com"));

		let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

		assert_eq!(
			pairs,
			vec![
				("app_id".into(), TEST_APP_ID.into()),
				("scope".into(), "auth_user".into()),
				("redirect_uri".into(), "https://app.example.com/callback?from=login".into()),
				("state".into(), "xyz 1".into()),
			]
		);
		assert!(
			url.as_str()
				.contains("redirect_uri=https%3A%2F%2Fapp.example.com%2Fcallback%3Ffrom%3Dlogin")
		);
		assert!(
			!broker.authorize_url(&redirect, None).as_str().contains("state="),
			"Absent state should be omitted."
		);
	}
}
