//! Registry configuration.

use serde::Deserialize;

/// Handling of a contribution id that already exists in the same sub-scope.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
	/// Fail the registration with [`crate::RegistryError::DuplicateContribution`].
	#[default]
	Reject,
	/// Remove the existing contribution and its rules, keep the incoming one.
	///
	/// The replaced handle becomes orphaned and the replacement is recorded as a
	/// [`crate::Collision`].
	LastWins,
}

/// Options accepted by [`crate::Registry::with_options`].
///
/// Deserializable so embedders can read it from their own configuration files.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryOptions {
	pub duplicate_policy: DuplicatePolicy,
}

impl RegistryOptions {
	pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
		self.duplicate_policy = policy;
		self
	}
}
