//! Shared gateway call pipeline: build, sign, post, parse, verify, classify.

// self
use crate::{
	_prelude::*,
	error::{ConfigError, ResponseError},
	flows::Broker,
	gateway::{
		self, GatewayNode, GatewayRequest, NodeStatus, TransportErrorMapper, map_gateway_failure,
		map_http_status, parse_envelope,
	},
	http::{GatewayHttpClient, ResponseMetadata, ResponseMetadataSlot},
	provider::GatewayMethod,
};

/// Performs one signed gateway call and returns the successful response node.
///
/// Transport errors go through the broker's mapper; unparseable non-2xx answers are
/// classified by HTTP status; failed nodes are classified by the strategy. When the broker
/// holds the provider key the response signature is checked before the node is inspected.
pub(crate) async fn call_gateway<C, M>(
	broker: &Broker<C, M>,
	method: GatewayMethod,
	params: &[(&str, &str)],
) -> Result<GatewayNode>
where
	C: ?Sized + GatewayHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	let mut request = GatewayRequest::new(&broker.descriptor, method, OffsetDateTime::now_utc())?;

	for (key, value) in params {
		request = request.param(*key, *value);
	}

	broker.strategy.augment_request(method, &mut request.params);

	let form = request.sign(&broker.app_key, broker.descriptor.sign_type)?;
	let slot = ResponseMetadataSlot::default();
	let response = match broker
		.http_client
		.post_form(&broker.descriptor.endpoints.gateway, &form, slot.clone())
		.await
	{
		Ok(response) => response,
		Err(err) => {
			let meta = slot.take();

			return Err(broker.transport_mapper.map_transport_error(
				broker.strategy.as_ref(),
				method,
				meta.as_ref(),
				err,
			));
		},
	};
	let meta = slot
		.take()
		.unwrap_or(ResponseMetadata { status: Some(response.status), retry_after: None });
	let envelope = match parse_envelope(&response.body, method, Some(response.status)) {
		Ok(envelope) => envelope,
		Err(_) if !response.is_success() =>
			return Err(map_http_status(broker.strategy.as_ref(), method, &meta, &response.body)),
		Err(err) => return Err(err),
	};

	if let Some(key) = &broker.provider_key {
		gateway::verify_envelope(&envelope, key, broker.descriptor.sign_type)?;
	}

	match envelope.node.status() {
		NodeStatus::Success => Ok(envelope.node),
		NodeStatus::Failure(failure) =>
			Err(map_gateway_failure(broker.strategy.as_ref(), method, failure, Some(&meta))),
		NodeStatus::Unknown if !response.is_success() =>
			Err(map_http_status(broker.strategy.as_ref(), method, &meta, &response.body)),
		NodeStatus::Unknown => Err(ResponseError::MissingField { field: "code" }.into()),
	}
}

/// Rejects blank caller-supplied gateway parameters before anything is signed.
pub(crate) fn require_non_empty(key: &'static str, value: &str) -> Result<()> {
	if value.trim().is_empty() {
		return Err(ConfigError::EmptyParameter { key }.into());
	}

	Ok(())
}
