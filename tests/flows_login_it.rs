#![cfg(all(feature = "reqwest", feature = "test"))]

// crates.io
use httpmock::prelude::*;
// self
use alipay_auth_broker::{
	_preludet::*,
	auth::Gender,
	error::{Error, ResponseError},
	sign::{self, SignType},
};

const TOKEN_NODE: &str = r#"{"access_token":"authusrB4f3a","expires_in":1296000,"re_expires_in":2592000,"refresh_token":"authusrR8c2d","open_id":"074a1CcTG1Lelx"}"#;
const USER_NODE: &str = r#"{"code":"10000","msg":"Success","open_id":"074a1CcTG1Lelx","nick_name":"支付宝小二","avatar":"https://tfs.alipayobjects.com/images/partner/T1uIxXXbpXXXXXXXX","gender":"f","city":"杭州市","province":"浙江省","country_code":"CN","user_type":"2","user_status":"T","is_certified":"T","is_student_certified":"F"}"#;

fn signed_body(response_key: &str, node: &str) -> String {
	let signature = sign::sign(node, &test_app_key(), SignType::Rsa2)
		.expect("Fixture node should sign successfully.");

	format!(r#"{{"{response_key}":{node},"sign":"{}"}}"#, sign::base64_signature(&signature))
}

#[tokio::test]
async fn login_exchanges_the_code_then_fetches_the_profile() {
	let server = MockServer::start_async().await;
	let broker =
		build_reqwest_test_broker(&server.url("/gateway.do")).with_provider_key(test_public_key());
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/gateway.do")
				.form_urlencoded_tuple("method", "alipay.system.oauth.token")
				.form_urlencoded_tuple("code", "auth-code-1");
			then.status(200)
				.body(signed_body("alipay_system_oauth_token_response", TOKEN_NODE));
		})
		.await;
	let user_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/gateway.do")
				.form_urlencoded_tuple("method", "alipay.user.info.share")
				.form_urlencoded_tuple("auth_token", "authusrB4f3a");
			then.status(200).body(signed_body("alipay_user_info_share_response", USER_NODE));
		})
		.await;
	let outcome = broker.login("auth-code-1").await.expect("Login should succeed.");

	token_mock.assert_async().await;
	user_mock.assert_async().await;

	assert_eq!(outcome.token.access_token.expose(), "authusrB4f3a");
	assert_eq!(outcome.user.subject(), "074a1CcTG1Lelx");
	assert_eq!(outcome.user.display_name(), "支付宝小二");
	assert_eq!(outcome.user.gender(), Some(Gender::Female));
	assert_eq!(outcome.user.city.as_deref(), Some("杭州市"));
	assert!(outcome.user.is_certified());
	assert_eq!(outcome.token.subject(), outcome.user.open_id.as_deref());
}

#[tokio::test]
async fn login_fails_as_a_whole_when_the_profile_lookup_fails() {
	let server = MockServer::start_async().await;
	let broker = build_reqwest_test_broker(&server.url("/gateway.do"));
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/gateway.do")
				.form_urlencoded_tuple("method", "alipay.system.oauth.token");
			then.status(200)
				.body(signed_body("alipay_system_oauth_token_response", TOKEN_NODE));
		})
		.await;
	let user_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/gateway.do")
				.form_urlencoded_tuple("method", "alipay.user.info.share");
			then.status(200).body(
				r#"{"alipay_user_info_share_response":{"code":"40006","msg":"Insufficient Permissions","sub_code":"isv.insufficient-isv-permissions","sub_msg":"ISV权限不足"}}"#,
			);
		})
		.await;
	let err = broker.login("auth-code-2").await.expect_err("Profile failure should fail login.");

	token_mock.assert_async().await;
	user_mock.assert_async().await;

	assert!(matches!(err, Error::InsufficientScope { .. }));
}

#[tokio::test]
async fn user_info_business_errors_keep_their_codes() {
	let server = MockServer::start_async().await;
	let broker = build_reqwest_test_broker(&server.url("/gateway.do"));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/gateway.do");
			then.status(200).body(
				r#"{"alipay_user_info_share_response":{"code":"40004","msg":"Business Failed","sub_code":"isv.user-not-exist","sub_msg":"用户不存在"}}"#,
			);
		})
		.await;
	let err = broker.fetch_user_info("authusrB4f3a").await.expect_err("Lookup should fail.");

	mock.assert_async().await;

	match err {
		Error::Gateway { code, sub_code, sub_msg, .. } => {
			assert_eq!(code, "40004");
			assert_eq!(sub_code.as_deref(), Some("isv.user-not-exist"));
			assert_eq!(sub_msg.as_deref(), Some("用户不存在"));
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}
}

#[tokio::test]
async fn profiles_without_identifiers_are_rejected() {
	let server = MockServer::start_async().await;
	let broker = build_reqwest_test_broker(&server.url("/gateway.do"));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/gateway.do");
			then.status(200).body(
				r#"{"alipay_user_info_share_response":{"code":"10000","msg":"Success","nick_name":"anon"}}"#,
			);
		})
		.await;
	let err = broker.fetch_user_info("authusrB4f3a").await.expect_err("Anonymous node should fail.");

	mock.assert_async().await;

	assert!(matches!(err, Error::Response(ResponseError::MissingField { field: "user_id" })));
}

#[tokio::test]
async fn response_signatures_are_verified_when_the_provider_key_is_set() {
	let server = MockServer::start_async().await;
	let broker =
		build_reqwest_test_broker(&server.url("/gateway.do")).with_provider_key(test_public_key());
	let tampered = signed_body("alipay_user_info_share_response", USER_NODE)
		.replace("\"city\":\"杭州市\"", "\"city\":\"上海市\"");
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/gateway.do");
			then.status(200).body(tampered);
		})
		.await;

	assert!(broker.verifies_responses());

	let err = broker.fetch_user_info("authusrB4f3a").await.expect_err("Tampered node should fail.");

	mock.assert_async().await;

	assert!(matches!(err, Error::ResponseSignature));
	assert!(!err.is_client_error());
}

#[tokio::test]
async fn unsigned_success_nodes_fail_verification() {
	let server = MockServer::start_async().await;
	let broker =
		build_reqwest_test_broker(&server.url("/gateway.do")).with_provider_key(test_public_key());
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/gateway.do");
			then.status(200).body(format!(r#"{{"alipay_user_info_share_response":{USER_NODE}}}"#));
		})
		.await;
	let err = broker.fetch_user_info("authusrB4f3a").await.expect_err("Unsigned node should fail.");

	mock.assert_async().await;

	assert!(matches!(err, Error::ResponseSignature));
}
