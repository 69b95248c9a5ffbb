//! Issues a rate-limited authInfo string the way an HTTP handler would, using the checked-in
//! fixture key unless `ALIPAY_APP_PRIVATE_KEY` and `ALIPAY_APP_ID` are set.

// std
use std::{env, sync::Arc};
// crates.io
use color_eyre::Result;
// self
use alipay_auth_broker::{
	authinfo::AuthInfoRequest,
	flows::ReqwestBroker,
	provider::{DefaultGatewayStrategy, GatewayDescriptor, GatewayStrategy},
	sign::AppPrivateKey,
};

const FIXTURE_APP_ID: &str = "2021005194600693";
const FIXTURE_KEY: &str = include_str!("../tests/fixtures/app_private_key.txt");

fn main() -> Result<()> {
	color_eyre::install()?;

	let app_id = env::var("ALIPAY_APP_ID").unwrap_or_else(|_| FIXTURE_APP_ID.into());
	let material = env::var("ALIPAY_APP_PRIVATE_KEY").unwrap_or_else(|_| FIXTURE_KEY.into());
	let descriptor = GatewayDescriptor::builder(app_id).build()?;
	let strategy: Arc<dyn GatewayStrategy> = Arc::new(DefaultGatewayStrategy);
	let broker = ReqwestBroker::new(descriptor, strategy, AppPrivateKey::from_material(&material)?);
	let request: AuthInfoRequest = serde_json::from_str(r#"{"pid":"2088102123816631"}"#)?;

	for attempt in 1..=6 {
		match broker.auth_info("127.0.0.1", &request) {
			Ok(response) => println!("#{attempt}: {}", serde_json::to_string(&response)?),
			Err(err) if err.is_client_error() => println!("#{attempt}: rejected ({err})"),
			Err(err) => return Err(err.into()),
		}
	}

	Ok(())
}
