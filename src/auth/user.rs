//! Normalized user profile returned by `alipay.user.info.share`.

// self
use crate::{_prelude::*, error::ResponseError, gateway::GatewayNode};

/// Gender values reported by the gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gender {
	/// `m`
	Male,
	/// `f`
	Female,
}

/// User profile fields shared with the application.
///
/// Every field is optional on the wire; which ones are populated depends on the scopes the
/// user granted. At least one of `user_id`/`open_id` is guaranteed after
/// [`UserProfile::from_node`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
	/// Legacy 2088-prefixed user identifier.
	pub user_id: Option<String>,
	/// Application-scoped user identifier.
	pub open_id: Option<String>,
	/// Display nickname.
	pub nick_name: Option<String>,
	/// Avatar URL.
	pub avatar: Option<String>,
	/// `m` or `f`.
	pub gender: Option<String>,
	/// City name.
	pub city: Option<String>,
	/// Province name.
	pub province: Option<String>,
	/// Country code.
	pub country_code: Option<String>,
	/// `T`/`F` student certification flag.
	pub is_student_certified: Option<String>,
	/// `1` company account, `2` personal account.
	pub user_type: Option<String>,
	/// `Q` quick-registered, `T` certified, `B` blocked, `W` unactivated.
	pub user_status: Option<String>,
	/// `T`/`F` real-name certification flag.
	pub is_certified: Option<String>,
	/// `T`/`F` grade-A certification flag.
	pub is_certify_grade_a: Option<String>,
}
impl UserProfile {
	/// Maps a successful user-info node onto a profile.
	pub fn from_node(node: &GatewayNode) -> Result<Self> {
		let mut profile: UserProfile = node.deserialize()?;

		for field in [
			&mut profile.user_id,
			&mut profile.open_id,
			&mut profile.nick_name,
			&mut profile.avatar,
			&mut profile.gender,
		] {
			if field.as_deref().is_some_and(str::is_empty) {
				*field = None;
			}
		}

		if profile.user_id.is_none() && profile.open_id.is_none() {
			return Err(ResponseError::MissingField { field: "user_id" }.into());
		}

		Ok(profile)
	}

	/// Identifier for the user, preferring `open_id`.
	pub fn subject(&self) -> &str {
		self.open_id.as_deref().or(self.user_id.as_deref()).unwrap_or_default()
	}

	/// Nickname when shared, otherwise the subject identifier.
	pub fn display_name(&self) -> &str {
		self.nick_name.as_deref().unwrap_or_else(|| self.subject())
	}

	/// Parsed gender, if reported.
	pub fn gender(&self) -> Option<Gender> {
		match self.gender.as_deref()? {
			g if g.eq_ignore_ascii_case("m") => Some(Gender::Male),
			g if g.eq_ignore_ascii_case("f") => Some(Gender::Female),
			_ => None,
		}
	}

	/// Returns `true` when the account passed real-name certification.
	pub fn is_certified(&self) -> bool {
		self.is_certified.as_deref() == Some("T")
	}
}
