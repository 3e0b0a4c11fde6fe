//! Records of contribution id conflicts resolved under [`DuplicatePolicy::LastWins`].
//!
//! [`DuplicatePolicy::LastWins`]: crate::DuplicatePolicy::LastWins

use std::sync::Arc;

use crate::store::ContributionHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
	pub definition: Arc<str>,
	/// Sub-scope in which both contributions claimed the id.
	pub scope: Arc<str>,
	pub id: Arc<str>,
	/// Handle of the removed contribution.
	pub replaced: ContributionHandle,
	pub replaced_owner: Arc<str>,
	/// Handle of the contribution that won.
	pub incoming: ContributionHandle,
	pub incoming_owner: Arc<str>,
}
