//! Optional observability helpers for broker flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `alipay_auth_broker.flow` with the `flow`
//!   and `stage` (call site) fields, plus events for issued authInfo strings, limiter denials,
//!   and gateway failures. Secrets never reach these events.
//! - Enable `metrics` to increment the `alipay_auth_broker_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Flow kinds observed by the broker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Signed authInfo issuance.
	AuthInfo,
	/// Auth code exchange for a token grant.
	AuthorizationCode,
	/// Refresh token flow.
	Refresh,
	/// User info lookup.
	UserInfo,
	/// Code exchange followed by user info.
	Login,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::AuthInfo => "auth_info",
			FlowKind::AuthorizationCode => "authorization_code",
			FlowKind::Refresh => "refresh",
			FlowKind::UserInfo => "user_info",
			FlowKind::Login => "login",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a broker helper.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
	/// Request denied by the rate limiter before any work happened.
	Limited,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
			FlowOutcome::Limited => "limited",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records the terminal outcome of `result` for `kind`.
pub fn record_result<T>(kind: FlowKind, result: &Result<T>) {
	let outcome = match result {
		Ok(_) => FlowOutcome::Success,
		Err(Error::RateLimited { .. }) => FlowOutcome::Limited,
		Err(_) => FlowOutcome::Failure,
	};

	record_flow_outcome(kind, outcome);
}
