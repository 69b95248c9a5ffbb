//! Runs the auth-code login flow against a local mock gateway: code exchange, then the user
//! profile lookup.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use alipay_auth_broker::{
	flows::Broker,
	gateway::ReqwestTransportErrorMapper,
	http::ReqwestHttpClient,
	provider::{DefaultGatewayStrategy, GatewayDescriptor, GatewayStrategy},
	reqwest::Client,
	sign::AppPrivateKey,
};

const APP_KEY: &str = include_str!("../tests/fixtures/app_private_key.txt");

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/gateway.do")
				.form_urlencoded_tuple("method", "alipay.system.oauth.token");
			then.status(200).header("content-type", "application/json").body(
				r#"{"alipay_system_oauth_token_response":{"access_token":"demo-access","expires_in":"1296000","refresh_token":"demo-refresh","re_expires_in":"2592000","open_id":"074aDemo"}}"#,
			);
		})
		.await;
	let user_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/gateway.do")
				.form_urlencoded_tuple("method", "alipay.user.info.share");
			then.status(200).header("content-type", "application/json").body(
				r#"{"alipay_user_info_share_response":{"code":"10000","msg":"Success","open_id":"074aDemo","nick_name":"demo-user"}}"#,
			);
		})
		.await;
	let descriptor = GatewayDescriptor::builder("2021005194600693")
		.gateway_endpoint(Url::parse(&server.url("/gateway.do"))?)
		.build()?;
	let http_client = ReqwestHttpClient::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()?,
	);
	let strategy: Arc<dyn GatewayStrategy> = Arc::new(DefaultGatewayStrategy);
	let broker = <Broker<ReqwestHttpClient, ReqwestTransportErrorMapper>>::with_http_client(
		descriptor,
		strategy,
		AppPrivateKey::from_material(APP_KEY)?,
		http_client,
		Arc::new(ReqwestTransportErrorMapper),
	);

	println!(
		"Send browsers to: {}",
		broker.authorize_url(&Url::parse("https://app.example.com/callback")?, Some("demo"))
	);

	let outcome = broker.login("demo-auth-code").await?;

	println!(
		"Logged in {} ({}); access token valid until {}.",
		outcome.user.display_name(),
		outcome.user.subject(),
		outcome.token.expires_at()
	);

	token_mock.assert_async().await;
	user_mock.assert_async().await;

	Ok(())
}
